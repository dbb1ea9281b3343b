use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How a Collection's directory tree is organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureType {
    /// A manifest file lists absolute URLs of mirrored model files.
    IndexedManifest,
    /// Several sibling subdirectories, each an independent model.
    MultiDirectoryGroup,
    /// Model directories nested two or more levels deep.
    NestedHierarchy,
    /// A single model (or a handful of immediate sub-models).
    StandardSingle,
}

impl StructureType {
    /// Detection order. The first positive detector wins.
    pub const PRIORITY: [StructureType; 4] = [
        StructureType::IndexedManifest,
        StructureType::MultiDirectoryGroup,
        StructureType::NestedHierarchy,
        StructureType::StandardSingle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StructureType::IndexedManifest => "indexed-manifest",
            StructureType::MultiDirectoryGroup => "multi-directory-group",
            StructureType::NestedHierarchy => "nested-hierarchy",
            StructureType::StandardSingle => "standard-single",
        }
    }

    pub fn handler_id(&self) -> &'static str {
        match self {
            StructureType::IndexedManifest => "manifest-handler",
            StructureType::MultiDirectoryGroup => "multi-directory-handler",
            StructureType::NestedHierarchy => "nested-hierarchy-handler",
            StructureType::StandardSingle => "standard-handler",
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence collected by the detector that fired.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ClassificationMetadata {
    Manifest {
        manifest_path: PathBuf,
        url_count: usize,
        has_assets_dir: bool,
    },
    MultiDirectory {
        total_dirs: usize,
        model_dirs: Vec<String>,
    },
    Nested {
        model_count: usize,
        max_depth: usize,
    },
    Standard {
        config_file: Option<String>,
    },
}

/// Result of classifying one Collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub structure: StructureType,
    pub confidence: f32,
    pub handler_id: &'static str,
    pub metadata: ClassificationMetadata,
    /// `false` only for the fallback produced when no detector fired; such a
    /// Collection has not been shown to contain a model config.
    pub verified: bool,
}

impl Classification {
    pub fn detected(
        structure: StructureType,
        confidence: f32,
        metadata: ClassificationMetadata,
    ) -> Self {
        Self {
            structure,
            confidence: confidence.clamp(0.0, 1.0),
            handler_id: structure.handler_id(),
            metadata,
            verified: true,
        }
    }

    pub fn unverified_default() -> Self {
        Self {
            structure: StructureType::StandardSingle,
            confidence: 0.5,
            handler_id: StructureType::StandardSingle.handler_id(),
            metadata: ClassificationMetadata::Standard { config_file: None },
            verified: false,
        }
    }
}
