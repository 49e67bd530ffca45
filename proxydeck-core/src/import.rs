//! Bulk import of parsed proxy specifications.
//!
//! Specs are submitted to the remote store strictly one at a time.
//! Sequential submission keeps the store's duplicate detection
//! consistent within a batch (a duplicate created by an earlier item is
//! visible to later ones) and keeps progress monotonic. Do not
//! parallelize this loop without re-deriving that guarantee.

use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::client::ProxyStore;
use crate::error::Error;
use crate::models::proxies::{ImportOutcome, ImportStatus, ProxySpec};

/// Delay before the single post-import page refresh, letting the remote
/// store settle instead of refetching per item.
pub const REFRESH_SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Idle,
    Running,
    Complete,
}

/// Running counters, emitted after every submitted item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportProgress {
    pub current: usize,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Drives one batch to completion. A fresh orchestrator is created per
/// batch; discarding it is the only way to abandon a running import.
#[derive(Debug)]
pub struct ImportOrchestrator {
    phase: ImportPhase,
    progress: ImportProgress,
    outcomes: Vec<ImportOutcome>,
}

impl Default for ImportOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportOrchestrator {
    pub fn new() -> Self {
        Self {
            phase: ImportPhase::Idle,
            progress: ImportProgress::default(),
            outcomes: Vec::new(),
        }
    }

    pub fn phase(&self) -> ImportPhase {
        self.phase
    }

    pub fn progress(&self) -> ImportProgress {
        self.progress
    }

    pub fn outcomes(&self) -> &[ImportOutcome] {
        &self.outcomes
    }

    /// Submits the batch in order. Each item's outcome and the updated
    /// counters reach `on_progress` before the next submission starts.
    /// A failed item never aborts the batch, and a duplicate is a skip,
    /// not a failure. No retries; the caller may re-run a fresh batch
    /// of the failed addresses.
    pub async fn run<S, F>(
        &mut self,
        store: &S,
        specs: &[ProxySpec],
        mut on_progress: F,
    ) -> &[ImportOutcome]
    where
        S: ProxyStore + ?Sized,
        F: FnMut(&ImportProgress, &ImportOutcome),
    {
        self.phase = ImportPhase::Running;
        self.progress = ImportProgress {
            total: specs.len(),
            ..ImportProgress::default()
        };
        self.outcomes.clear();

        for spec in specs {
            let outcome = match store.create(spec).await {
                Ok(record) => {
                    debug!(address = %record.address, "imported proxy");
                    self.progress.success += 1;
                    ImportOutcome {
                        address: spec.address.clone(),
                        status: ImportStatus::Success,
                        error: None,
                    }
                }
                Err(Error::Duplicate) => {
                    self.progress.skipped += 1;
                    ImportOutcome {
                        address: spec.address.clone(),
                        status: ImportStatus::Skipped,
                        error: Some("already exists (skipped)".into()),
                    }
                }
                Err(e) => {
                    self.progress.failed += 1;
                    ImportOutcome {
                        address: spec.address.clone(),
                        status: ImportStatus::Failed,
                        error: Some(e.to_string()),
                    }
                }
            };

            self.progress.current += 1;
            on_progress(&self.progress, &outcome);
            self.outcomes.push(outcome);
        }

        self.phase = ImportPhase::Complete;
        info!(
            total = self.progress.total,
            success = self.progress.success,
            skipped = self.progress.skipped,
            failed = self.progress.failed,
            "import complete"
        );
        &self.outcomes
    }

    /// Runs the batch, then performs exactly one deferred refresh of the
    /// caller's current page once the store has settled.
    pub async fn run_then_refresh<S, F>(
        &mut self,
        store: &S,
        specs: &[ProxySpec],
        on_progress: F,
        refresh: BoxFuture<'_, ()>,
    ) where
        S: ProxyStore + ?Sized,
        F: FnMut(&ImportProgress, &ImportOutcome),
    {
        self.run(store, specs, on_progress).await;
        tokio::time::sleep(REFRESH_SETTLE_DELAY).await;
        refresh.await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::FutureExt;

    use super::*;
    use crate::models::proxies::{
        ExportFormat, PaginationMeta, Protocol, ProxyPage, ProxyPatch, ProxyRecord, ProxyStatus,
        TestReport,
    };
    use crate::parse::parse_batch;
    use crate::query::QueryState;

    /// In-memory store with duplicate detection on address.
    #[derive(Default)]
    struct MemoryStore {
        addresses: Mutex<Vec<String>>,
        fail_addresses: Vec<String>,
    }

    impl MemoryStore {
        fn with_existing(addresses: &[&str]) -> Self {
            Self {
                addresses: Mutex::new(addresses.iter().map(|a| a.to_string()).collect()),
                fail_addresses: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ProxyStore for MemoryStore {
        async fn list(&self, _query: &QueryState) -> Result<ProxyPage, Error> {
            Ok(ProxyPage {
                proxies: Vec::new(),
                pagination: PaginationMeta::default(),
            })
        }

        async fn create(&self, spec: &ProxySpec) -> Result<ProxyRecord, Error> {
            if self.fail_addresses.contains(&spec.address) {
                return Err(Error::Api {
                    status: 500,
                    message: "insert failed".into(),
                });
            }
            let mut addresses = self.addresses.lock().unwrap();
            if addresses.contains(&spec.address) {
                return Err(Error::Duplicate);
            }
            addresses.push(spec.address.clone());
            Ok(ProxyRecord {
                id: addresses.len() as i64,
                address: spec.address.clone(),
                protocol: spec.protocol,
                username: spec.username.clone(),
                label: spec.label.clone(),
                status: ProxyStatus::Idle,
                requests: 0,
                success_rate: 0.0,
                avg_response_time: 0,
                last_check: None,
            })
        }

        async fn update(&self, _id: i64, _patch: &ProxyPatch) -> Result<ProxyRecord, Error> {
            unimplemented!()
        }

        async fn delete(&self, _id: i64) -> Result<(), Error> {
            unimplemented!()
        }

        async fn bulk_delete(&self, _ids: &[i64]) -> Result<(), Error> {
            unimplemented!()
        }

        async fn test(&self, _id: i64) -> Result<TestReport, Error> {
            unimplemented!()
        }

        async fn export(&self, _format: ExportFormat) -> Result<Vec<u8>, Error> {
            unimplemented!()
        }

        async fn reload_pool(&self) -> Result<(), Error> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_duplicate_is_skipped_not_failed() {
        let store = MemoryStore::with_existing(&["2.2.2.2:80"]);
        let specs = parse_batch("1.1.1.1:80\n2.2.2.2:80\n3.3.3.3:80");
        let mut orch = ImportOrchestrator::new();

        let outcomes = orch.run(&store, &specs, |_, _| {}).await.to_vec();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, ImportStatus::Success);
        assert_eq!(outcomes[1].status, ImportStatus::Skipped);
        assert_eq!(outcomes[2].status, ImportStatus::Success);
        assert_eq!(
            outcomes.iter().map(|o| o.address.as_str()).collect::<Vec<_>>(),
            vec!["1.1.1.1:80", "2.2.2.2:80", "3.3.3.3:80"]
        );

        let progress = orch.progress();
        assert_eq!(progress.success, 2);
        assert_eq!(progress.skipped, 1);
        assert_eq!(progress.failed, 0);
        assert_eq!(orch.phase(), ImportPhase::Complete);
    }

    #[tokio::test]
    async fn test_duplicate_within_batch_is_detected() {
        let store = MemoryStore::default();
        let specs = parse_batch("1.1.1.1:80\n1.1.1.1:80");
        let mut orch = ImportOrchestrator::new();

        orch.run(&store, &specs, |_, _| {}).await;

        assert_eq!(orch.progress().success, 1);
        assert_eq!(orch.progress().skipped, 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let store = MemoryStore {
            addresses: Mutex::new(Vec::new()),
            fail_addresses: vec!["2.2.2.2:80".into()],
        };
        let specs = parse_batch("1.1.1.1:80\n2.2.2.2:80\n3.3.3.3:80");
        let mut orch = ImportOrchestrator::new();

        let outcomes = orch.run(&store, &specs, |_, _| {}).await.to_vec();

        assert_eq!(outcomes[1].status, ImportStatus::Failed);
        assert!(outcomes[1].error.as_deref().unwrap().contains("insert failed"));
        assert_eq!(outcomes[2].status, ImportStatus::Success);
        assert_eq!(orch.progress().failed, 1);
        assert_eq!(orch.progress().success, 2);
    }

    #[tokio::test]
    async fn test_progress_emitted_per_item_before_next_submission() {
        let store = MemoryStore::default();
        let specs = parse_batch("1.1.1.1:80\n2.2.2.2:80\n3.3.3.3:80");
        let mut orch = ImportOrchestrator::new();

        let mut snapshots = Vec::new();
        orch.run(&store, &specs, |p, o| snapshots.push((*p, o.address.clone())))
            .await;

        assert_eq!(snapshots.len(), 3);
        for (i, (p, _)) in snapshots.iter().enumerate() {
            assert_eq!(p.current, i + 1);
            assert_eq!(p.total, 3);
        }
        assert_eq!(snapshots[2].0.success, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_refresh_after_settle_delay() {
        let store = MemoryStore::default();
        let specs = parse_batch("1.1.1.1:80");
        let mut orch = ImportOrchestrator::new();

        let refreshed = Mutex::new(0u32);
        orch.run_then_refresh(
            &store,
            &specs,
            |_, _| {},
            async {
                *refreshed.lock().unwrap() += 1;
            }
            .boxed(),
        )
        .await;

        assert_eq!(*refreshed.lock().unwrap(), 1);
        assert_eq!(orch.phase(), ImportPhase::Complete);
    }
}
