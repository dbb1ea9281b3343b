//! Persisted per-model scale overrides.

use crate::error::Result;
use modeldex_api::models::{SCALE_PRESETS, ScaleOverride, ScalePreset};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

type ScaleMap = BTreeMap<String, ScaleOverride>;

/// JSON file of overrides keyed by external model id, cached after first read.
pub struct ScaleStore {
    path: PathBuf,
    cache: Mutex<Option<ScaleMap>>,
}

impl ScaleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<ScaleOverride>> {
        let mut cache = self.cache.lock().await;
        Ok(self.loaded(&mut cache).await.get(id).cloned())
    }

    pub async fn all(&self) -> Result<ScaleMap> {
        let mut cache = self.cache.lock().await;
        Ok(self.loaded(&mut cache).await.clone())
    }

    /// Store `scale` for `id`, stamped with the current time, and persist.
    pub async fn set(&self, id: &str, mut scale: ScaleOverride) -> Result<ScaleOverride> {
        scale.timestamp = Some(chrono::Utc::now().to_rfc3339());

        let mut cache = self.cache.lock().await;
        let mut updated = self.loaded(&mut cache).await.clone();
        updated.insert(id.to_string(), scale.clone());
        self.persist(&updated).await?;
        *cache = Some(updated);

        tracing::info!("Saved scale override for model {}", id);
        Ok(scale)
    }

    /// Drop the override for `id`. Returns whether one existed.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut cache = self.cache.lock().await;
        let mut updated = self.loaded(&mut cache).await.clone();
        if updated.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(&updated).await?;
        *cache = Some(updated);

        tracing::info!("Removed scale override for model {}", id);
        Ok(true)
    }

    /// Forget cached overrides; the next access re-reads the file.
    pub async fn clear_cache(&self) {
        *self.cache.lock().await = None;
    }

    pub fn presets(&self) -> &'static [ScalePreset] {
        &SCALE_PRESETS
    }

    async fn loaded<'a>(&self, cache: &'a mut Option<ScaleMap>) -> &'a ScaleMap {
        if cache.is_none() {
            *cache = Some(self.read().await);
        }
        cache.get_or_insert_with(ScaleMap::new)
    }

    async fn read(&self) -> ScaleMap {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ScaleMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read scale overrides {}: {}", self.path.display(), e);
                return ScaleMap::new();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed scale overrides {}: {}", self.path.display(), e);
            ScaleMap::new()
        })
    }

    async fn persist(&self, scales: &ScaleMap) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(scales)?;
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_persists_with_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config/model_scale_config.json");
        let store = ScaleStore::new(&path);

        let saved = store.set("3", ScaleOverride::scale(1.5)).await.unwrap();
        let stamp = saved.timestamp.clone().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());

        let reopened = ScaleStore::new(&path);
        assert_eq!(reopened.get("3").await.unwrap(), Some(saved));
        assert_eq!(reopened.get("4").await.unwrap(), None);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["3"]["scale"], serde_json::json!(1.5));
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScaleStore::new(dir.path().join("scales.json"));
        store.set("1", ScaleOverride::scale(0.5)).await.unwrap();
        assert!(store.remove("1").await.unwrap());
        assert!(!store.remove("1").await.unwrap());
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scales.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let store = ScaleStore::new(&path);
        assert!(store.all().await.unwrap().is_empty());
        assert_eq!(store.presets().len(), 5);
    }
}
