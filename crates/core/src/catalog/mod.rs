//! Catalog construction.
//!
//! The builder walks the asset root, classifies each collection and dispatches
//! to the strategy of the detected structure. A collection that fails or yields
//! nothing falls back to standard handling, then to a bounded nested walk, so
//! one malformed collection never aborts the build.

pub mod manifest;
mod storage;
mod strategy;

pub use storage::{load_catalog, save_catalog};
pub use strategy::{CollectionContext, EntryList};

use crate::classify::{ConfigProbe, StructuralClassifier};
use crate::config::CatalogConfig;
use crate::error::Result;
use crate::util::{is_hidden, sorted_subdirectories};
use modeldex_api::models::{
    BuildSummary, Catalog, Classification, ClassificationMetadata, CollectionReport, StructureType,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Output of one build.
#[derive(Debug, Clone)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    pub summary: BuildSummary,
}

impl CatalogBuild {
    /// Collection name -> classification, as consumed by the resolver and projector.
    pub fn classifications(&self) -> HashMap<String, Classification> {
        self.summary
            .collections
            .iter()
            .map(|c| (c.name.clone(), c.classification.clone()))
            .collect()
    }
}

pub struct CatalogBuilder {
    asset_root: PathBuf,
    classifier: StructuralClassifier,
    probe: ConfigProbe,
    mirror_base_url: String,
    max_nested_depth: usize,
}

impl CatalogBuilder {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            asset_root: config.asset_root.clone(),
            classifier: StructuralClassifier::new(config),
            probe: ConfigProbe::from_config(config),
            mirror_base_url: config.manifest.mirror_base_url.clone(),
            max_nested_depth: config.max_nested_depth,
        }
    }

    pub fn classifier(&self) -> &StructuralClassifier {
        &self.classifier
    }

    /// Build the catalog from the current contents of the asset root.
    /// A missing asset root yields an empty catalog.
    pub fn build(&self) -> Result<CatalogBuild> {
        let started = Instant::now();
        let mut catalog = Catalog::new();
        let mut summary = BuildSummary::default();

        if !self.asset_root.is_dir() {
            tracing::warn!(
                "Asset root {} does not exist, building an empty catalog",
                self.asset_root.display()
            );
            return Ok(CatalogBuild { catalog, summary });
        }

        for (name, dir) in sorted_subdirectories(&self.asset_root)? {
            if is_hidden(Path::new(&name)) {
                continue;
            }
            let (entries, report) = self.build_collection(&name, &dir);
            tracing::debug!(
                "{}: {} via {} ({} entries, {} local, {} remote{})",
                name,
                report.classification.structure,
                report.classification.handler_id,
                report.entries,
                report.local,
                report.remote,
                if report.fell_back { ", fell back" } else { "" }
            );
            catalog.extend(entries);
            summary.collections.push(report);
        }

        summary.entries = catalog.models.len();
        summary.models = catalog.model_count();
        summary.duration_ms = started.elapsed().as_millis();

        tracing::info!(
            "Built catalog: {} collections, {} entries, {} models ({} local, {} remote) in {} ms",
            summary.collections.len(),
            summary.entries,
            summary.models,
            summary.local_count(),
            summary.remote_count(),
            summary.duration_ms
        );

        Ok(CatalogBuild { catalog, summary })
    }

    /// Entries and report for one collection directory.
    pub fn build_collection(&self, name: &str, dir: &Path) -> (EntryList, CollectionReport) {
        let classification = self.classifier.classify(dir);
        let ctx = CollectionContext {
            name,
            dir,
            probe: &self.probe,
        };

        let mut fell_back = false;
        let mut entries = match self.dispatch(&ctx, &classification) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "{} strategy failed for {}: {}",
                    classification.structure,
                    name,
                    e
                );
                Vec::new()
            }
        };

        if entries.is_empty() && classification.structure != StructureType::StandardSingle {
            fell_back = true;
            entries = strategy::standard_entries(&ctx).unwrap_or_else(|e| {
                tracing::warn!("Standard scan failed for {}: {}", name, e);
                Vec::new()
            });
        }

        if entries.is_empty() {
            entries = strategy::nested_entries(&ctx, self.max_nested_depth);
            fell_back |= !entries.is_empty();
        }

        if entries.is_empty() {
            tracing::debug!("No models found in {}", dir.display());
        }

        let (local, remote) = entries
            .iter()
            .flat_map(|(entry, _)| entry.locators())
            .fold((0, 0), |(l, r), loc| {
                if loc.is_remote() { (l, r + 1) } else { (l + 1, r) }
            });

        let report = CollectionReport {
            name: name.to_string(),
            classification,
            entries: entries.len(),
            local,
            remote,
            fell_back,
        };
        (entries, report)
    }

    fn dispatch(
        &self,
        ctx: &CollectionContext<'_>,
        classification: &Classification,
    ) -> Result<EntryList> {
        match (&classification.structure, &classification.metadata) {
            (
                StructureType::IndexedManifest,
                ClassificationMetadata::Manifest { manifest_path, .. },
            ) => strategy::manifest_entries(ctx, manifest_path, &self.mirror_base_url),
            (
                StructureType::MultiDirectoryGroup,
                ClassificationMetadata::MultiDirectory { model_dirs, .. },
            ) => Ok(strategy::multi_directory_entries(ctx, model_dirs)),
            (StructureType::NestedHierarchy, _) => {
                Ok(strategy::nested_entries(ctx, self.max_nested_depth))
            }
            _ => strategy::standard_entries(ctx),
        }
    }

    /// Build and persist to `path`.
    pub fn build_and_save(&self, path: &Path) -> Result<CatalogBuild> {
        let build = self.build()?;
        save_catalog(&build.catalog, path)?;
        Ok(build)
    }
}
