use crate::ApiResult;
use crate::models::{Catalog, ConfigLookup, ModelId, ModelResponse, RandomPick, ScaleOverride};
use async_trait::async_trait;

/// Id-addressed access to the catalog and the descriptors it points at.
#[async_trait]
pub trait ModelLookup: Send + Sync {
    /// Load the descriptor for `id`, projected for serving, with any persisted
    /// scale override applied.
    async fn get_model(&self, id: &ModelId) -> ApiResult<ModelResponse>;

    /// Like [`ModelLookup::get_model`] but overlays `scale` without persisting it.
    async fn get_model_scaled(&self, id: &ModelId, scale: &ScaleOverride)
        -> ApiResult<ModelResponse>;

    /// The catalog as currently cached.
    async fn list(&self) -> ApiResult<Catalog>;

    /// Pick a model other than `current` (1-based) when more than one exists.
    async fn random_model(&self, current: Option<usize>) -> ApiResult<RandomPick>;

    /// Look up the descriptor for a collection-relative model path.
    async fn config_for_path(&self, path: &str) -> ApiResult<ConfigLookup>;

    /// Texture groups for a Cubism 2 model directory; empty for other versions.
    async fn texture_cache(&self, model_path: &str) -> ApiResult<Vec<Vec<String>>>;
}

#[async_trait]
pub trait ScaleService: Send + Sync {
    async fn scale_for(&self, id: &str) -> ApiResult<Option<ScaleOverride>>;

    async fn scales(&self) -> ApiResult<Vec<(String, ScaleOverride)>>;

    /// Persist `scale` for `id`, stamping it with the current time.
    async fn set_scale(&self, id: &str, scale: ScaleOverride) -> ApiResult<ScaleOverride>;

    /// Returns whether an override existed.
    async fn remove_scale(&self, id: &str) -> ApiResult<bool>;
}

/// Request-time repair of inbound asset paths.
pub trait ResourcePathService: Send + Sync {
    fn resolve_request(&self, path: &str) -> crate::models::Resolution;
}
