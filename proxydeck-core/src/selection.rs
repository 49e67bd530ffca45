//! Row selection for the currently displayed page.
//!
//! Selection tracks *positions* within the page; deletion targets
//! *identity*. Positions are resolved to stable remote ids at the
//! moment a bulk action is invoked, not at selection time.

use std::collections::BTreeSet;

use crate::models::proxies::ProxyRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionLedger {
    rows: BTreeSet<usize>,
}

impl SelectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, pos: usize) {
        if !self.rows.remove(&pos) {
            self.rows.insert(pos);
        }
    }

    pub fn select(&mut self, pos: usize) {
        self.rows.insert(pos);
    }

    pub fn select_all(&mut self, row_count: usize) {
        self.rows = (0..row_count).collect();
    }

    pub fn is_selected(&self, pos: usize) -> bool {
        self.rows.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cleared when the page's row set changes or a bulk delete of the
    /// selection succeeds.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Resolves selected positions against the current page. Positions
    /// beyond the page are ignored.
    pub fn resolve_ids(&self, rows: &[ProxyRecord]) -> Vec<i64> {
        self.rows
            .iter()
            .filter_map(|pos| rows.get(*pos).map(|r| r.id))
            .collect()
    }
}
