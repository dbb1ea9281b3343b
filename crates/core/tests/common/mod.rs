#![allow(dead_code)]

use modeldex_core::CatalogConfig;
use std::fs;
use std::path::{Path, PathBuf};

pub const MIRROR: &str = "https://raw.githubusercontent.com/zenghongtu/live2d-model-assets/master/";

/// Temporary asset tree with its catalog and scale files next to it.
pub struct Fixture {
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("models")).unwrap();
        Self { dir }
    }

    pub fn models(&self) -> PathBuf {
        self.dir.path().join("models")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.path().join("config/model_list.json")
    }

    pub fn config(&self) -> CatalogConfig {
        let mut config = CatalogConfig::with_asset_root(self.models());
        config.catalog_path = self.catalog_path();
        config.scale_store_path = self.dir.path().join("config/model_scale_config.json");
        config
    }

    pub fn write(&self, relative: &str, body: &str) -> PathBuf {
        let path = self.models().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    pub fn mkdir(&self, relative: &str) {
        fs::create_dir_all(self.models().join(relative)).unwrap();
    }

    pub fn persisted(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.catalog_path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}

pub fn mirror_url(relative: &str) -> String {
    format!("{MIRROR}{relative}")
}

pub fn exists(root: &Path, relative: &str) -> bool {
    root.join(relative).exists()
}
