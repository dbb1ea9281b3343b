//! Single-flight catalog rebuilds.

use crate::catalog::CatalogBuilder;
use crate::classify::ClassificationTable;
use crate::error::Result;
use crate::index::ModelIndex;
use async_trait::async_trait;
use modeldex_api::models::{BuildSummary, RescanTrigger};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[async_trait]
pub trait RescanJob: Send + Sync {
    async fn run(&self) -> Result<BuildSummary>;
}

/// Rebuilds the catalog file, then refreshes the classification table and
/// drops the cached catalog.
pub struct CatalogRescan {
    builder: Arc<CatalogBuilder>,
    catalog_path: PathBuf,
    table: ClassificationTable,
    index: Arc<ModelIndex>,
}

impl CatalogRescan {
    pub fn new(
        builder: Arc<CatalogBuilder>,
        catalog_path: impl Into<PathBuf>,
        table: ClassificationTable,
        index: Arc<ModelIndex>,
    ) -> Self {
        Self {
            builder,
            catalog_path: catalog_path.into(),
            table,
            index,
        }
    }
}

#[async_trait]
impl RescanJob for CatalogRescan {
    async fn run(&self) -> Result<BuildSummary> {
        let builder = self.builder.clone();
        let path = self.catalog_path.clone();
        let build = tokio::task::spawn_blocking(move || builder.build_and_save(&path)).await??;

        self.table.replace(build.classifications());
        self.index.invalidate().await;
        Ok(build.summary)
    }
}

#[derive(Default)]
struct RescanState {
    running: bool,
    pending: bool,
}

/// Runs at most one rebuild at a time. Requests arriving while a rebuild is
/// in flight collapse into one follow-up run.
pub struct RescanCoordinator {
    job: Arc<dyn RescanJob>,
    state: Mutex<RescanState>,
    run_lock: tokio::sync::Mutex<()>,
    idle: Notify,
}

impl RescanCoordinator {
    pub fn new(job: Arc<dyn RescanJob>) -> Arc<Self> {
        Arc::new(Self {
            job,
            state: Mutex::new(RescanState::default()),
            run_lock: tokio::sync::Mutex::new(()),
            idle: Notify::new(),
        })
    }

    /// Start a background rebuild, or mark one pending if a rebuild is
    /// already running.
    pub fn trigger(self: &Arc<Self>) -> RescanTrigger {
        {
            let mut state = self.lock_state();
            if state.running {
                state.pending = true;
                tracing::debug!("Rescan already running, scheduling follow-up");
                return RescanTrigger::Deferred;
            }
            state.running = true;
            state.pending = false;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move { this.drive().await });
        RescanTrigger::Started
    }

    /// Run a rebuild inline, waiting for any background run to finish first.
    pub async fn run_now(&self) -> Result<BuildSummary> {
        let _guard = self.run_lock.lock().await;
        self.job.run().await
    }

    pub fn is_running(&self) -> bool {
        self.lock_state().running
    }

    /// Resolve once no background rebuild is running or pending.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    async fn drive(&self) {
        loop {
            {
                let _guard = self.run_lock.lock().await;
                match self.job.run().await {
                    Ok(summary) => tracing::info!(
                        "Rescan finished: {} collections, {} models in {} ms",
                        summary.collections.len(),
                        summary.models,
                        summary.duration_ms
                    ),
                    Err(e) => tracing::error!("Rescan failed: {}", e),
                }
            }

            let mut state = self.lock_state();
            if state.pending {
                state.pending = false;
                continue;
            }
            state.running = false;
            break;
        }
        self.idle.notify_waiters();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RescanState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingJob {
        runs: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        fail: bool,
    }

    impl CountingJob {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl RescanJob for CountingJob {
        async fn run(&self) -> Result<BuildSummary> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CatalogError::Internal("boom".into()));
            }
            Ok(BuildSummary::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_during_run_collapse_into_one_follow_up() {
        let job = CountingJob::new(false);
        let coordinator = RescanCoordinator::new(job.clone());

        assert_eq!(coordinator.trigger(), RescanTrigger::Started);
        tokio::task::yield_now().await;
        assert_eq!(coordinator.trigger(), RescanTrigger::Deferred);
        assert_eq!(coordinator.trigger(), RescanTrigger::Deferred);
        assert_eq!(coordinator.trigger(), RescanTrigger::Deferred);

        coordinator.wait_idle().await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 2);
        assert_eq!(job.max_active.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_releases_the_flag() {
        let job = CountingJob::new(true);
        let coordinator = RescanCoordinator::new(job.clone());

        assert_eq!(coordinator.trigger(), RescanTrigger::Started);
        coordinator.wait_idle().await;
        assert_eq!(coordinator.trigger(), RescanTrigger::Started);
        coordinator.wait_idle().await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_now_does_not_overlap_background_run() {
        let job = CountingJob::new(false);
        let coordinator = RescanCoordinator::new(job.clone());

        coordinator.trigger();
        tokio::task::yield_now().await;
        coordinator.run_now().await.unwrap();
        coordinator.wait_idle().await;
        assert_eq!(job.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(job.runs.load(Ordering::SeqCst), 2);
    }
}
