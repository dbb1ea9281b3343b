use crate::classify::ConfigProbe;
use crate::error::{CatalogError, Result};
use crate::util::{join_relative, sorted_subdirectories, to_slash};
use modeldex_api::models::ResourceDescriptor;
use std::path::{Path, PathBuf};

/// A descriptor file found for a local locator.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedDescriptor {
    pub file: PathBuf,
    /// Directory holding `file`, relative to the asset root.
    pub base_path: String,
}

/// Finds the descriptor file a local locator refers to.
pub struct DescriptorLocator {
    asset_root: PathBuf,
    probe: ConfigProbe,
}

impl DescriptorLocator {
    pub fn new(asset_root: impl Into<PathBuf>, probe: ConfigProbe) -> Self {
        Self {
            asset_root: asset_root.into(),
            probe,
        }
    }

    /// Lookup order for a directory locator: its own config files, then the
    /// owning collection's (nested locators), then the first config-bearing
    /// immediate subdirectory (top-level locators). A locator naming a `.json`
    /// file is used as is.
    pub fn locate(&self, locator: &str) -> Result<LocatedDescriptor> {
        let relative = locator.trim_matches('/');
        let target = join_relative(&self.asset_root, relative)
            .ok_or_else(|| CatalogError::NotFound(format!("invalid model path: {locator}")))?;

        if relative.ends_with(".json") {
            if target.is_file() {
                return Ok(self.located(target));
            }
            return Err(CatalogError::NotFound(format!("model file {locator}")));
        }

        if let Some(found) = self.config_in(&target) {
            return Ok(found);
        }

        match relative.split_once('/') {
            Some((collection, _)) => {
                if let Some(found) = self.config_in(&self.asset_root.join(collection)) {
                    tracing::debug!("{} falls back to collection config", locator);
                    return Ok(found);
                }
            }
            None => {
                if let Ok(subdirs) = sorted_subdirectories(&target) {
                    for (_, dir) in subdirs {
                        if let Some(found) = self.config_in(&dir) {
                            tracing::debug!("{} falls back to {}", locator, found.base_path);
                            return Ok(found);
                        }
                    }
                }
            }
        }

        Err(CatalogError::NotFound(format!("model config for {locator}")))
    }

    fn config_in(&self, dir: &Path) -> Option<LocatedDescriptor> {
        self.probe
            .find_in(dir)
            .map(|name| self.located(dir.join(name)))
    }

    fn located(&self, file: PathBuf) -> LocatedDescriptor {
        let base_path = file
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.asset_root).ok())
            .map(to_slash)
            .unwrap_or_default();
        LocatedDescriptor { file, base_path }
    }
}

/// Parse a descriptor file. Parse failures are reported as
/// [`CatalogError::ConfigParse`].
pub fn read_descriptor(path: &Path) -> Result<ResourceDescriptor> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| CatalogError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn locator(root: &Path) -> DescriptorLocator {
        DescriptorLocator::new(
            root,
            ConfigProbe::new(vec!["index.json".to_string(), "model.json".to_string()]),
        )
    }

    #[test]
    fn test_directory_prefers_index_json() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Pio/index.json", "{}");
        write(dir.path(), "Pio/model.json", "{}");
        let found = locator(dir.path()).locate("Pio").unwrap();
        assert_eq!(found.file, dir.path().join("Pio/index.json"));
        assert_eq!(found.base_path, "Pio");
    }

    #[test]
    fn test_nested_locator_falls_back_to_collection() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Kan/model.json", "{}");
        fs::create_dir_all(dir.path().join("Kan/murakumo")).unwrap();
        let found = locator(dir.path()).locate("Kan/murakumo").unwrap();
        assert_eq!(found.base_path, "Kan");
    }

    #[test]
    fn test_top_level_locator_falls_back_to_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Tia/aaa")).unwrap();
        write(dir.path(), "Tia/tia/index.json", "{}");
        let found = locator(dir.path()).locate("Tia").unwrap();
        assert_eq!(found.base_path, "Tia/tia");
    }

    #[test]
    fn test_file_locator_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m/assets/moc/a/a.model.json", "{}");
        let l = locator(dir.path());
        assert_eq!(
            l.locate("m/assets/moc/a/a.model.json").unwrap().base_path,
            "m/assets/moc/a"
        );
        assert!(matches!(l.locate("nope"), Err(CatalogError::NotFound(_))));
        assert!(matches!(l.locate("../etc"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_read_descriptor_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad/index.json", "{ nope");
        let err = read_descriptor(&dir.path().join("bad/index.json")).unwrap_err();
        assert!(matches!(err, CatalogError::ConfigParse { .. }));
    }
}
