use super::EngineHandle;
use async_trait::async_trait;
use modeldex_api::lifecycle::{CatalogLifecycle, CatalogWatchHandle};
use modeldex_api::models::{BuildSummary, RescanTrigger};
use modeldex_api::ApiResult;
use std::sync::Arc;

#[async_trait]
impl CatalogLifecycle for EngineHandle {
    async fn rescan(&self) -> ApiResult<RescanTrigger> {
        Ok(self.engine.rescan())
    }

    async fn rebuild(&self) -> ApiResult<BuildSummary> {
        Ok(self.engine.rebuild().await?)
    }

    async fn invalidate(&self) {
        self.engine.invalidate().await
    }

    async fn start_watch(&self) -> ApiResult<Arc<dyn CatalogWatchHandle>> {
        let watcher = self.engine.start_watch()?;
        Ok(watcher)
    }
}
