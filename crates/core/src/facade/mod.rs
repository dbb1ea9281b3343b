use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::error::Result;
use crate::runtime::CatalogEngine as InternalEngine;

mod lifecycle;
mod lookup;
mod scale;

/// Engine handle - unified interface for all clients
///
/// Implements the service traits of `modeldex-api` on top of the internal
/// engine and converts its errors into [`modeldex_api::ApiError`].
#[derive(Clone)]
pub struct EngineHandle {
    pub(crate) engine: Arc<InternalEngine>,
}

impl EngineHandle {
    /// Create a handle with the default rule set and handlers for `config`.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        Ok(Self {
            engine: Arc::new(InternalEngine::builder(config).build()?),
        })
    }

    /// Create a handle from an existing engine (useful for testing)
    pub fn from_engine(engine: Arc<InternalEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<InternalEngine> {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeldex_api::{ApiError, CatalogLifecycle, ModelLookup, ResourcePathService, ScaleService};
    use modeldex_api::models::{ModelId, Resolution, ScaleOverride};
    use std::fs;
    use std::path::Path;

    fn handle_in(dir: &Path) -> EngineHandle {
        let mut config = CatalogConfig::with_asset_root(dir.join("models"));
        config.catalog_path = dir.join("model_list.json");
        config.scale_store_path = dir.join("model_scale_config.json");
        EngineHandle::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_errors_map_to_api_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("models/Bad")).unwrap();
        fs::write(dir.path().join("models/Bad/index.json"), "{").unwrap();
        let handle = handle_in(dir.path());

        handle.rebuild().await.unwrap();
        assert!(matches!(
            handle.get_model(&ModelId::new(0)).await,
            Err(ApiError::BadConfiguration { .. })
        ));
        assert!(matches!(
            handle.get_model(&ModelId::new(9)).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_scale_round_trip_through_handle() {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle_in(dir.path());

        let saved = handle.set_scale("3", ScaleOverride::scale(1.5)).await.unwrap();
        assert!(saved.timestamp.is_some());
        assert_eq!(handle.scale_for("3").await.unwrap().and_then(|s| s.scale), Some(1.5));
        assert_eq!(handle.scales().await.unwrap().len(), 1);
        assert!(handle.remove_scale("3").await.unwrap());
        assert!(!handle.remove_scale("3").await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_request_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle_in(dir.path());
        assert_eq!(
            handle.resolve_request("/model/A/index.json"),
            Resolution::Passthrough
        );
        assert!(handle.list().await.unwrap().is_empty());
    }
}
