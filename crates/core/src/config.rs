//! Configuration for the catalog engine.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ASSET_ROOT_ENV: &str = "MODELDEX_ASSET_ROOT";
pub const CATALOG_PATH_ENV: &str = "MODELDEX_CATALOG_PATH";
pub const SCALE_PATH_ENV: &str = "MODELDEX_SCALE_PATH";

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding one sub-directory per collection
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,

    /// Where the built catalog is persisted
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Where scale overrides are persisted
    #[serde(default = "default_scale_store_path")]
    pub scale_store_path: PathBuf,

    /// URL prefix under which the asset root is served
    #[serde(default = "default_public_root")]
    pub public_root: String,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Quiet period before a burst of filesystem events triggers a rescan
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Recognised model config file names, in lookup order
    #[serde(default = "default_config_file_names")]
    pub config_file_names: Vec<String>,

    #[serde(default = "default_max_nested_depth")]
    pub max_nested_depth: usize,

    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            catalog_path: default_catalog_path(),
            scale_store_path: default_scale_store_path(),
            public_root: default_public_root(),
            cache_ttl_secs: default_cache_ttl_secs(),
            debounce_ms: default_debounce_ms(),
            config_file_names: default_config_file_names(),
            max_nested_depth: default_max_nested_depth(),
            manifest: ManifestConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Configuration rooted at `asset_root`, everything else defaulted.
    pub fn with_asset_root(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply `MODELDEX_*` environment overrides on top of this config.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = env_path(ASSET_ROOT_ENV) {
            self.asset_root = dir;
        }
        if let Some(path) = env_path(CATALOG_PATH_ENV) {
            self.catalog_path = path;
        }
        if let Some(path) = env_path(SCALE_PATH_ENV) {
            self.scale_store_path = path;
        }
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// `public_root` without a trailing slash.
    pub fn public_prefix(&self) -> &str {
        self.public_root.trim_end_matches('/')
    }
}

/// Settings for manifest-backed collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Manifest location relative to the collection directory
    #[serde(default = "default_manifest_path")]
    pub relative_path: String,

    /// URL prefix the manifest entries are mirrored from
    #[serde(default = "default_mirror_base_url")]
    pub mirror_base_url: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            relative_path: default_manifest_path(),
            mirror_base_url: default_mirror_base_url(),
        }
    }
}

/// Collection-specific path repair settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Collection name -> directory shared by all of its models
    #[serde(default = "default_shared_directory")]
    pub shared_directory: BTreeMap<String, String>,

    /// Collections whose references climb out of an omitted directory level
    #[serde(default = "default_nested_traversal")]
    pub nested_traversal: Vec<String>,

    /// Collection name -> subdirectory direct child requests must live under
    #[serde(default = "default_required_subdirectory")]
    pub required_subdirectory: BTreeMap<String, String>,

    #[serde(default = "default_texture_cache_file")]
    pub texture_cache_file: String,

    /// Segments clients append after a model file name
    #[serde(default = "default_placeholder_segments")]
    pub placeholder_segments: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            shared_directory: default_shared_directory(),
            nested_traversal: default_nested_traversal(),
            required_subdirectory: default_required_subdirectory(),
            texture_cache_file: default_texture_cache_file(),
            placeholder_segments: default_placeholder_segments(),
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let value = std::env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn default_asset_root() -> PathBuf {
    PathBuf::from("models")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("config/model_list.json")
}

fn default_scale_store_path() -> PathBuf {
    PathBuf::from("config/model_scale_config.json")
}

fn default_public_root() -> String {
    "/model".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_config_file_names() -> Vec<String> {
    vec!["index.json".to_string(), "model.json".to_string()]
}

fn default_max_nested_depth() -> usize {
    3
}

fn default_manifest_path() -> String {
    "assets/model.index".to_string()
}

fn default_mirror_base_url() -> String {
    "https://raw.githubusercontent.com/zenghongtu/live2d-model-assets/master/".to_string()
}

fn default_shared_directory() -> BTreeMap<String, String> {
    BTreeMap::from([("HyperdimensionNeptunia".to_string(), "general".to_string())])
}

fn default_nested_traversal() -> Vec<String> {
    vec!["KantaiCollection".to_string()]
}

fn default_required_subdirectory() -> BTreeMap<String, String> {
    BTreeMap::from([("KantaiCollection".to_string(), "murakumo".to_string())])
}

fn default_texture_cache_file() -> String {
    "textures.cache".to_string()
}

fn default_placeholder_segments() -> Vec<String> {
    vec!["index.json".to_string(), "undefined".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: CatalogConfig =
            serde_json::from_str(r#"{"asset_root": "/srv/models", "cache_ttl_secs": 10}"#).unwrap();
        assert_eq!(config.asset_root, PathBuf::from("/srv/models"));
        assert_eq!(config.cache_ttl(), Duration::from_secs(10));
        assert_eq!(config.debounce(), Duration::from_millis(2000));
        assert_eq!(config.max_nested_depth, 3);
        assert_eq!(config.manifest.relative_path, "assets/model.index");
        assert_eq!(
            config.resolver.required_subdirectory.get("KantaiCollection"),
            Some(&"murakumo".to_string())
        );
    }

    #[test]
    fn test_public_prefix_trims_trailing_slash() {
        let mut config = CatalogConfig::default();
        config.public_root = "/model/".to_string();
        assert_eq!(config.public_prefix(), "/model");
    }
}
