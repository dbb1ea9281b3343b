pub mod error;
pub mod logging;
pub mod util;

pub mod catalog;
pub mod classify;
pub mod config;
pub mod facade;
pub mod index;
pub mod projector;
pub mod resolver;
pub mod runtime;
pub mod scale;

pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use facade::EngineHandle;
