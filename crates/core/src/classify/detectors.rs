use super::{ConfigProbe, Detection, StructureDetector};
use crate::util::sorted_subdirectories;
use modeldex_api::models::{ClassificationMetadata, StructureType};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A collection shipping a newline-delimited URL manifest.
pub struct ManifestDetector {
    relative_path: String,
}

impl ManifestDetector {
    pub fn new(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }
}

impl StructureDetector for ManifestDetector {
    fn structure(&self) -> StructureType {
        StructureType::IndexedManifest
    }

    fn detect(&self, dir: &Path) -> std::io::Result<Option<Detection>> {
        let manifest_path = dir.join(&self.relative_path);
        if !manifest_path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&manifest_path)?;
        let url_count = content
            .lines()
            .filter(|line| !line.trim().is_empty() && line.starts_with("http"))
            .count();
        let has_assets_dir = manifest_path.parent().is_some_and(Path::is_dir);

        Ok(Some(Detection {
            confidence: 0.95,
            metadata: ClassificationMetadata::Manifest {
                manifest_path,
                url_count,
                has_assets_dir,
            },
        }))
    }
}

/// Several sibling model directories, at least half of them carrying a config.
pub struct MultiDirectoryDetector {
    probe: ConfigProbe,
}

impl MultiDirectoryDetector {
    pub fn new(probe: ConfigProbe) -> Self {
        Self { probe }
    }
}

impl StructureDetector for MultiDirectoryDetector {
    fn structure(&self) -> StructureType {
        StructureType::MultiDirectoryGroup
    }

    fn detect(&self, dir: &Path) -> std::io::Result<Option<Detection>> {
        let subdirs = sorted_subdirectories(dir)?;
        if subdirs.len() < 2 {
            return Ok(None);
        }

        let model_dirs: Vec<String> = subdirs
            .iter()
            .filter(|(_, path)| self.probe.has_config(path))
            .map(|(name, _)| name.clone())
            .collect();

        let ratio = model_dirs.len() as f32 / subdirs.len() as f32;
        if ratio < 0.5 {
            return Ok(None);
        }

        Ok(Some(Detection {
            confidence: ratio.min(0.9),
            metadata: ClassificationMetadata::MultiDirectory {
                total_dirs: subdirs.len(),
                model_dirs,
            },
        }))
    }
}

/// Result of a bounded recursive walk for config-bearing directories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedScan {
    /// Config-bearing directories relative to the scanned root; the root itself
    /// appears as an empty path.
    pub model_dirs: Vec<PathBuf>,
    /// Deepest directory level the walk reached.
    pub max_depth: usize,
}

/// Walk `dir` down to `max_depth` levels. Config files are looked for in every
/// directory above the limit; the deepest level only counts towards `max_depth`.
/// Unreadable entries are skipped.
pub fn scan_nested(dir: &Path, probe: &ConfigProbe, max_depth: usize) -> NestedScan {
    let mut scan = NestedScan::default();

    for entry in WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let depth = entry.depth();
        scan.max_depth = scan.max_depth.max(depth);
        if depth < max_depth && probe.has_config(entry.path()) {
            if let Ok(relative) = entry.path().strip_prefix(dir) {
                scan.model_dirs.push(relative.to_path_buf());
            }
        }
    }

    scan
}

/// Models spread over at least two directory levels.
pub struct NestedHierarchyDetector {
    probe: ConfigProbe,
    max_depth: usize,
}

impl NestedHierarchyDetector {
    pub fn new(probe: ConfigProbe, max_depth: usize) -> Self {
        Self { probe, max_depth }
    }
}

impl StructureDetector for NestedHierarchyDetector {
    fn structure(&self) -> StructureType {
        StructureType::NestedHierarchy
    }

    fn detect(&self, dir: &Path) -> std::io::Result<Option<Detection>> {
        let scan = scan_nested(dir, &self.probe, self.max_depth);
        if scan.model_dirs.len() < 2 || scan.max_depth < 2 {
            return Ok(None);
        }

        Ok(Some(Detection {
            confidence: 0.8,
            metadata: ClassificationMetadata::Nested {
                model_count: scan.model_dirs.len(),
                max_depth: scan.max_depth,
            },
        }))
    }
}

/// A config file directly inside the collection.
pub struct StandardSingleDetector {
    probe: ConfigProbe,
}

impl StandardSingleDetector {
    pub fn new(probe: ConfigProbe) -> Self {
        Self { probe }
    }
}

impl StructureDetector for StandardSingleDetector {
    fn structure(&self) -> StructureType {
        StructureType::StandardSingle
    }

    fn detect(&self, dir: &Path) -> std::io::Result<Option<Detection>> {
        Ok(self.probe.find_in(dir).map(|name| Detection {
            confidence: 0.7,
            metadata: ClassificationMetadata::Standard {
                config_file: Some(name.to_string()),
            },
        }))
    }
}
