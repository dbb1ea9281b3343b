use super::EngineHandle;
use async_trait::async_trait;
use modeldex_api::models::{
    Catalog, ConfigLookup, ModelId, ModelResponse, RandomPick, Resolution, ScaleOverride,
};
use modeldex_api::{ApiResult, ModelLookup, ResourcePathService};

#[async_trait]
impl ModelLookup for EngineHandle {
    async fn get_model(&self, id: &ModelId) -> ApiResult<ModelResponse> {
        Ok(self.engine.model(*id).await?)
    }

    async fn get_model_scaled(
        &self,
        id: &ModelId,
        scale: &ScaleOverride,
    ) -> ApiResult<ModelResponse> {
        Ok(self.engine.model_scaled(*id, scale).await?)
    }

    async fn list(&self) -> ApiResult<Catalog> {
        Ok(self.engine.catalog().await.as_ref().clone())
    }

    async fn random_model(&self, current: Option<usize>) -> ApiResult<RandomPick> {
        Ok(self.engine.random_model(current).await?)
    }

    async fn config_for_path(&self, path: &str) -> ApiResult<ConfigLookup> {
        Ok(self.engine.config_for_path(path).await?)
    }

    async fn texture_cache(&self, model_path: &str) -> ApiResult<Vec<Vec<String>>> {
        Ok(self.engine.texture_cache(model_path).await?)
    }
}

impl ResourcePathService for EngineHandle {
    fn resolve_request(&self, path: &str) -> Resolution {
        self.engine.resolve_request(path)
    }
}
