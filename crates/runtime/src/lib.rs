use modeldex_api::{ApiResult, ModelCatalogEngine};
use modeldex_core::{CatalogConfig, EngineHandle};
use std::path::Path;
use std::sync::Arc;

/// Bootstraps a catalog engine with the default classifiers, rewrite rules
/// and descriptor handlers for `config`.
pub fn build_default_engine(config: CatalogConfig) -> ApiResult<Arc<dyn ModelCatalogEngine>> {
    tracing::info!(
        "Serving models from {} (catalog {})",
        config.asset_root.display(),
        config.catalog_path.display()
    );
    let handle = EngineHandle::new(config)?;
    Ok(Arc::new(handle))
}

/// Load the config file when given, apply environment overrides and build
/// the engine.
pub fn build_engine_from_file(path: Option<&Path>) -> ApiResult<Arc<dyn ModelCatalogEngine>> {
    let config = match path {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };
    build_default_engine(config.with_env_overrides())
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module; keep the guard alive.
pub fn init_logging(component: &str) -> Option<impl Drop> {
    Some(modeldex_core::logging::init_logging(component, false))
}
