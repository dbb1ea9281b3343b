//! Structural classification of collection directories.
//!
//! Detectors run in a fixed priority order and the first one that reports a
//! positive detection decides the structure type, regardless of how the
//! confidence of later detectors would compare.

mod detectors;
mod table;

pub use detectors::{
    ManifestDetector, MultiDirectoryDetector, NestedHierarchyDetector, NestedScan,
    StandardSingleDetector, scan_nested,
};
pub use table::ClassificationTable;

use crate::config::CatalogConfig;
use modeldex_api::models::{Classification, ClassificationMetadata, StructureType};
use std::path::Path;

/// Positive result of a single detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub confidence: f32,
    pub metadata: ClassificationMetadata,
}

pub trait StructureDetector: Send + Sync {
    fn structure(&self) -> StructureType;

    /// `Ok(None)` means "not this structure". I/O errors are reported so the
    /// classifier can log them; they never stop the remaining detectors.
    fn detect(&self, dir: &Path) -> std::io::Result<Option<Detection>>;
}

/// Looks for recognised model config files in a directory.
#[derive(Debug, Clone)]
pub struct ConfigProbe {
    names: Vec<String>,
}

impl ConfigProbe {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.config_file_names.clone())
    }

    /// Name of the first config file present in `dir`.
    pub fn find_in(&self, dir: &Path) -> Option<&str> {
        self.names
            .iter()
            .find(|name| dir.join(name.as_str()).is_file())
            .map(String::as_str)
    }

    pub fn has_config(&self, dir: &Path) -> bool {
        self.find_in(dir).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

pub struct StructuralClassifier {
    detectors: Vec<Box<dyn StructureDetector>>,
}

impl StructuralClassifier {
    /// Classifier with one detector per structure, in [`StructureType::PRIORITY`] order.
    pub fn new(config: &CatalogConfig) -> Self {
        let probe = ConfigProbe::from_config(config);
        let detectors = StructureType::PRIORITY
            .iter()
            .map(|structure| -> Box<dyn StructureDetector> {
                match structure {
                    StructureType::IndexedManifest => Box::new(ManifestDetector::new(
                        config.manifest.relative_path.clone(),
                    )),
                    StructureType::MultiDirectoryGroup => {
                        Box::new(MultiDirectoryDetector::new(probe.clone()))
                    }
                    StructureType::NestedHierarchy => Box::new(NestedHierarchyDetector::new(
                        probe.clone(),
                        config.max_nested_depth,
                    )),
                    StructureType::StandardSingle => {
                        Box::new(StandardSingleDetector::new(probe.clone()))
                    }
                }
            })
            .collect();
        Self::with_detectors(detectors)
    }

    /// Structures in the order their detectors are consulted.
    pub fn order(&self) -> Vec<StructureType> {
        self.detectors.iter().map(|d| d.structure()).collect()
    }

    /// Classifier over an explicit detector list, consulted in order.
    pub fn with_detectors(detectors: Vec<Box<dyn StructureDetector>>) -> Self {
        Self { detectors }
    }

    pub fn classify(&self, dir: &Path) -> Classification {
        for detector in &self.detectors {
            match detector.detect(dir) {
                Ok(Some(detection)) => {
                    tracing::debug!(
                        "{} classified as {} (confidence {:.2})",
                        dir.display(),
                        detector.structure(),
                        detection.confidence
                    );
                    return Classification::detected(
                        detector.structure(),
                        detection.confidence,
                        detection.metadata,
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        "{} detector failed on {}: {}",
                        detector.structure(),
                        dir.display(),
                        e
                    );
                }
            }
        }

        tracing::debug!(
            "No detector fired for {}, assuming unverified {}",
            dir.display(),
            StructureType::StandardSingle
        );
        Classification::unverified_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixed(StructureType, Option<f32>);

    impl StructureDetector for Fixed {
        fn structure(&self) -> StructureType {
            self.0
        }

        fn detect(&self, _dir: &Path) -> std::io::Result<Option<Detection>> {
            Ok(self.1.map(|confidence| Detection {
                confidence,
                metadata: ClassificationMetadata::Standard { config_file: None },
            }))
        }
    }

    #[test]
    fn test_standard_detectors_follow_priority() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig::with_asset_root(dir.path());
        let classifier = StructuralClassifier::new(&config);
        assert_eq!(classifier.order(), StructureType::PRIORITY.to_vec());
    }

    struct Failing;

    impl StructureDetector for Failing {
        fn structure(&self) -> StructureType {
            StructureType::IndexedManifest
        }

        fn detect(&self, _dir: &Path) -> std::io::Result<Option<Detection>> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_first_positive_detector_wins_over_higher_confidence() {
        let classifier = StructuralClassifier::with_detectors(vec![
            Box::new(Fixed(StructureType::NestedHierarchy, None)),
            Box::new(Fixed(StructureType::MultiDirectoryGroup, Some(0.5))),
            Box::new(Fixed(StructureType::StandardSingle, Some(0.99))),
        ]);
        let result = classifier.classify(Path::new("/nowhere"));
        assert_eq!(result.structure, StructureType::MultiDirectoryGroup);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_failing_detector_does_not_stop_others() {
        let classifier = StructuralClassifier::with_detectors(vec![
            Box::new(Failing),
            Box::new(Fixed(StructureType::StandardSingle, Some(0.7))),
        ]);
        let result = classifier.classify(Path::new("/nowhere"));
        assert_eq!(result.structure, StructureType::StandardSingle);
        assert!(result.verified);
    }

    #[test]
    fn test_empty_directory_falls_back_to_unverified_standard() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = StructuralClassifier::new(&CatalogConfig::default());
        let result = classifier.classify(dir.path());
        assert_eq!(result.structure, StructureType::StandardSingle);
        assert_eq!(result.confidence, 0.5);
        assert!(!result.verified);
    }

    #[test]
    fn test_manifest_takes_priority_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(
            dir.path().join("assets/model.index"),
            "https://example.com/a/b/c/model.json\n",
        )
        .unwrap();
        fs::write(dir.path().join("index.json"), "{}").unwrap();

        let classifier = StructuralClassifier::new(&CatalogConfig::default());
        let result = classifier.classify(dir.path());
        assert_eq!(result.structure, StructureType::IndexedManifest);
        assert_eq!(result.handler_id, "manifest-handler");
    }
}
