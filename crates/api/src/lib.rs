pub mod error;
pub mod lifecycle;
pub mod lookup;
pub mod models;

pub use error::{ApiError, ApiResult};
pub use lifecycle::{CatalogLifecycle, CatalogWatchHandle};
pub use lookup::{ModelLookup, ResourcePathService, ScaleService};
pub use models::*;

/// Composite trait representing the full catalog engine API.
/// This allows clients to depend on a single trait instead of multiple individual ones.
pub trait ModelCatalogEngine:
    ModelLookup + ScaleService + ResourcePathService + CatalogLifecycle
{
}

impl<T> ModelCatalogEngine for T where
    T: ModelLookup + ScaleService + ResourcePathService + CatalogLifecycle
{
}
