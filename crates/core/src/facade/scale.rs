use super::EngineHandle;
use async_trait::async_trait;
use modeldex_api::models::ScaleOverride;
use modeldex_api::{ApiResult, ScaleService};

#[async_trait]
impl ScaleService for EngineHandle {
    async fn scale_for(&self, id: &str) -> ApiResult<Option<ScaleOverride>> {
        Ok(self.engine.scales().get(id).await?)
    }

    async fn scales(&self) -> ApiResult<Vec<(String, ScaleOverride)>> {
        Ok(self.engine.scales().all().await?.into_iter().collect())
    }

    async fn set_scale(&self, id: &str, scale: ScaleOverride) -> ApiResult<ScaleOverride> {
        Ok(self.engine.scales().set(id, scale).await?)
    }

    async fn remove_scale(&self, id: &str) -> ApiResult<bool> {
        Ok(self.engine.scales().remove(id).await?)
    }
}
