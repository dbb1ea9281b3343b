use crate::ApiResult;
use crate::models::{BuildSummary, RescanTrigger};
use async_trait::async_trait;

pub trait CatalogWatchHandle: Send + Sync {
    fn stop(&self);
}

#[async_trait]
pub trait CatalogLifecycle: Send + Sync {
    /// Request a rebuild of the persisted catalog.
    ///
    /// Returns immediately; at most one rebuild runs at a time and a request
    /// arriving mid-run schedules a single follow-up.
    async fn rescan(&self) -> ApiResult<RescanTrigger>;

    /// Rebuild the catalog inline and wait for the report.
    async fn rebuild(&self) -> ApiResult<BuildSummary>;

    /// Drop the cached catalog so the next lookup reloads it from disk.
    async fn invalidate(&self);

    /// Watch the asset root and rescan after bursts of changes settle.
    async fn start_watch(&self) -> ApiResult<std::sync::Arc<dyn CatalogWatchHandle>>;
}
