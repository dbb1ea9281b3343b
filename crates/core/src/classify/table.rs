use super::StructuralClassifier;
use crate::config::CatalogConfig;
use modeldex_api::models::Classification;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Collection name -> latest classification.
///
/// Refreshed wholesale after every rescan; collections seen before the first
/// rescan are classified on demand and remembered.
#[derive(Clone)]
pub struct ClassificationTable {
    entries: Arc<RwLock<HashMap<String, Classification>>>,
    classifier: Arc<StructuralClassifier>,
    asset_root: PathBuf,
}

impl ClassificationTable {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            classifier: Arc::new(StructuralClassifier::new(config)),
            asset_root: config.asset_root.clone(),
        }
    }

    /// Cached classification only.
    pub fn get(&self, collection: &str) -> Option<Classification> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(collection).cloned()
    }

    /// Cached classification, classifying the collection directory on a miss.
    pub fn lookup(&self, collection: &str) -> Option<Classification> {
        if let Some(found) = self.get(collection) {
            return Some(found);
        }
        if collection.is_empty()
            || collection.starts_with('.')
            || collection.contains(['/', '\\'])
        {
            return None;
        }

        let dir = self.asset_root.join(collection);
        if !dir.is_dir() {
            return None;
        }
        let classification = self.classifier.classify(&dir);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(collection.to_string(), classification.clone());
        Some(classification)
    }

    /// Replace every entry with the results of a fresh build.
    pub fn replace(&self, fresh: HashMap<String, Classification>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *entries = fresh;
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
