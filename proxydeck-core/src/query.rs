//! Remote-backed list view synchronization.
//!
//! [`QuerySync`] owns the current page/sort/search/filter state and the
//! last page of rows it fetched. Every state change yields at most one
//! [`FetchRequest`]; the caller performs the listing and feeds the
//! response back through [`QuerySync::apply_success`]. Requests carry a
//! monotonically increasing sequence so that a slow response from an
//! older request can never overwrite a newer one.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::Error;
use crate::models::proxies::{PaginationMeta, Protocol, ProxyPage, ProxyRecord, ProxyStatus};
use crate::selection::SelectionLedger;

/// Quiet period before a changed search value is actually sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// The full query the remote store is asked to satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    /// 1-based; never 0.
    pub page: u32,
    pub page_size: u32,
    pub sort: Option<(String, SortDirection)>,
    /// Debounced search value. The raw input lives on [`QuerySync`]
    /// until the quiet period elapses.
    pub search: String,
    pub status_filter: Option<ProxyStatus>,
    pub protocol_filter: Option<Protocol>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            search: String::new(),
            status_filter: None,
            protocol_filter: None,
        }
    }
}

/// A fetch the caller must perform, stamped with its issue sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub state: QueryState,
}

#[derive(Debug, Default)]
pub struct QuerySync {
    state: QueryState,
    pending_search: String,
    pending_since: Option<Instant>,
    latest_issued: u64,
    rows: Vec<ProxyRecord>,
    pagination: PaginationMeta,
    selection: SelectionLedger,
}

impl QuerySync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn rows(&self) -> &[ProxyRecord] {
        &self.rows
    }

    pub fn pagination(&self) -> &PaginationMeta {
        &self.pagination
    }

    /// Row selection for the currently displayed page. Cleared whenever
    /// a fetch is applied, since positions are only meaningful against
    /// the rows they were picked from.
    pub fn selection(&self) -> &SelectionLedger {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionLedger {
        &mut self.selection
    }

    /// Resolves the current selection against the current rows.
    pub fn selected_ids(&self) -> Vec<i64> {
        self.selection.resolve_ids(&self.rows)
    }

    /// Raw search input, for display while the debounce is pending.
    pub fn pending_search(&self) -> &str {
        &self.pending_search
    }

    /// Issues a fetch for the current state without changing it.
    pub fn refresh(&mut self) -> FetchRequest {
        self.issue()
    }

    pub fn set_page(&mut self, page: u32) -> Option<FetchRequest> {
        let page = page.max(1);
        if page == self.state.page {
            return None;
        }
        self.state.page = page;
        Some(self.issue())
    }

    /// Changing the page size invalidates the current page position.
    pub fn set_page_size(&mut self, page_size: u32) -> Option<FetchRequest> {
        if page_size == 0 || page_size == self.state.page_size {
            return None;
        }
        self.state.page_size = page_size;
        self.state.page = 1;
        Some(self.issue())
    }

    /// Sorting reorders the same result set; the page position stays.
    pub fn set_sort(&mut self, sort: Option<(String, SortDirection)>) -> Option<FetchRequest> {
        if sort == self.state.sort {
            return None;
        }
        self.state.sort = sort;
        Some(self.issue())
    }

    pub fn set_status_filter(&mut self, filter: Option<ProxyStatus>) -> Option<FetchRequest> {
        if filter == self.state.status_filter {
            return None;
        }
        self.state.status_filter = filter;
        self.state.page = 1;
        Some(self.issue())
    }

    pub fn set_protocol_filter(&mut self, filter: Option<Protocol>) -> Option<FetchRequest> {
        if filter == self.state.protocol_filter {
            return None;
        }
        self.state.protocol_filter = filter;
        self.state.page = 1;
        Some(self.issue())
    }

    /// Records a keystroke. Never fetches directly; the changed value is
    /// promoted by [`QuerySync::poll_search`] once it has been stable
    /// for [`SEARCH_DEBOUNCE`].
    pub fn search_input(&mut self, text: &str, now: Instant) {
        if text != self.pending_search {
            self.pending_search = text.to_string();
            self.pending_since = Some(now);
        }
    }

    /// Promotes the pending search value if its quiet period elapsed.
    /// Resets the page only when the debounced value actually changed.
    pub fn poll_search(&mut self, now: Instant) -> Option<FetchRequest> {
        let since = self.pending_since?;
        if now.duration_since(since) < SEARCH_DEBOUNCE {
            return None;
        }
        self.pending_since = None;
        if self.pending_search == self.state.search {
            return None;
        }
        self.state.search = self.pending_search.clone();
        self.state.page = 1;
        Some(self.issue())
    }

    /// Applies a resolved listing. Rows and pagination are replaced
    /// together, and only for the most recently issued request; stale
    /// responses are discarded. Applying also clears the selection,
    /// which referred to the replaced rows. Returns whether the page
    /// was applied.
    pub fn apply_success(&mut self, seq: u64, page: ProxyPage) -> bool {
        if seq != self.latest_issued {
            debug!(seq, latest = self.latest_issued, "discarding stale list response");
            return false;
        }
        self.rows = page.proxies;
        self.pagination = page.pagination;
        self.selection.clear();
        true
    }

    /// A failed fetch keeps the previous rows and pagination intact.
    /// Returns false when the failure belonged to a superseded request.
    pub fn apply_failure(&mut self, seq: u64, err: &Error) -> bool {
        if seq != self.latest_issued {
            debug!(seq, latest = self.latest_issued, "ignoring stale fetch failure");
            return false;
        }
        warn!("list fetch failed, keeping previous page: {err}");
        true
    }

    fn issue(&mut self) -> FetchRequest {
        self.latest_issued += 1;
        debug!(seq = self.latest_issued, page = self.state.page, "issuing list fetch");
        FetchRequest {
            seq: self.latest_issued,
            state: self.state.clone(),
        }
    }
}
