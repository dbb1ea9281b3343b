//! Per-structure entry extraction.
//!
//! Every strategy returns `(entry, message)` pairs for a single collection.
//! Locators are relative to the asset root and start with the collection name.

use super::manifest::{local_mirror, parse_manifest};
use crate::classify::{ConfigProbe, scan_nested};
use crate::error::{CatalogError, Result};
use crate::util::{sorted_subdirectories, to_slash};
use modeldex_api::models::{CatalogEntry, Locator};
use std::path::Path;

pub type EntryList = Vec<(CatalogEntry, String)>;

/// The collection being built.
pub struct CollectionContext<'a> {
    pub name: &'a str,
    pub dir: &'a Path,
    pub probe: &'a ConfigProbe,
}

impl CollectionContext<'_> {
    fn locator(&self, relative: &str) -> Locator {
        if relative.is_empty() {
            Locator::local(self.name)
        } else {
            Locator::local(format!("{}/{}", self.name, relative))
        }
    }

    fn series_message(&self) -> String {
        format!("{} series", self.name)
    }

    fn single_message(&self) -> String {
        format!("model from {}", self.name)
    }

    /// One entry from `locators`: a single model or a `<collection> series` group.
    fn collect(&self, locators: Vec<Locator>) -> EntryList {
        let single = locators.len() == 1;
        match CatalogEntry::from_locators(locators) {
            Some(entry) if single => vec![(entry, self.single_message())],
            Some(entry) => vec![(entry, self.series_message())],
            None => Vec::new(),
        }
    }
}

/// One entry per manifest series. Mirrored files present on disk become local
/// locators, everything else stays remote.
pub fn manifest_entries(
    ctx: &CollectionContext<'_>,
    manifest_path: &Path,
    mirror_base: &str,
) -> Result<EntryList> {
    let content = std::fs::read_to_string(manifest_path)?;
    let series = parse_manifest(&content);
    if series.is_empty() {
        return Err(CatalogError::MalformedManifest {
            path: manifest_path.to_path_buf(),
            reason: "no http(s) URLs".to_string(),
        });
    }

    let mut entries = Vec::with_capacity(series.len());
    for s in series {
        let locators: Vec<Locator> = s
            .urls
            .iter()
            .map(|u| match local_mirror(&u.raw, mirror_base, ctx.dir) {
                Some((relative, _)) => ctx.locator(&relative),
                None => Locator::remote(u.raw.clone()),
            })
            .collect();

        let message = if locators.len() == 1 {
            format!("model from {}", s.key)
        } else {
            format!("models from {}", s.key)
        };
        if let Some(entry) = CatalogEntry::from_locators(locators) {
            entries.push((entry, message));
        }
    }
    Ok(entries)
}

/// The model-bearing subdirectories found by the classifier.
pub fn multi_directory_entries(ctx: &CollectionContext<'_>, model_dirs: &[String]) -> EntryList {
    ctx.collect(model_dirs.iter().map(|dir| ctx.locator(dir)).collect())
}

/// Every config-bearing directory down to `max_depth`.
pub fn nested_entries(ctx: &CollectionContext<'_>, max_depth: usize) -> EntryList {
    let scan = scan_nested(ctx.dir, ctx.probe, max_depth);
    ctx.collect(
        scan.model_dirs
            .iter()
            .map(|relative| ctx.locator(&to_slash(relative)))
            .collect(),
    )
}

/// The collection's own config, else its immediate config-bearing subdirectories.
pub fn standard_entries(ctx: &CollectionContext<'_>) -> Result<EntryList> {
    if ctx.probe.has_config(ctx.dir) {
        return Ok(vec![(
            CatalogEntry::Single(ctx.locator("")),
            ctx.single_message(),
        )]);
    }

    let model_dirs: Vec<String> = sorted_subdirectories(ctx.dir)?
        .into_iter()
        .filter(|(_, path)| ctx.probe.has_config(path))
        .map(|(name, _)| name)
        .collect();

    Ok(match model_dirs.as_slice() {
        [] => Vec::new(),
        [only] => vec![(
            CatalogEntry::Single(ctx.locator(only)),
            format!("{} model from {}", only, ctx.name),
        )],
        _ => ctx.collect(model_dirs.iter().map(|dir| ctx.locator(dir)).collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn probe() -> ConfigProbe {
        ConfigProbe::new(vec!["index.json".to_string(), "model.json".to_string()])
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_standard_single_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "shizuku/index.json");
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        let probe = probe();
        let ctx = CollectionContext {
            name: "Shizuku",
            dir: dir.path(),
            probe: &probe,
        };
        let entries = standard_entries(&ctx).unwrap();
        assert_eq!(
            entries,
            vec![(
                CatalogEntry::Single(Locator::local("Shizuku/shizuku")),
                "shizuku model from Shizuku".to_string()
            )]
        );
    }

    #[test]
    fn test_standard_prefers_own_config() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "model.json");
        touch(dir.path(), "alt/index.json");
        let probe = probe();
        let ctx = CollectionContext {
            name: "Pio",
            dir: dir.path(),
            probe: &probe,
        };
        let entries = standard_entries(&ctx).unwrap();
        assert_eq!(entries[0].0, CatalogEntry::Single(Locator::local("Pio")));
    }

    #[test]
    fn test_nested_entries_are_collection_relative() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/one/index.json");
        touch(dir.path(), "a/two/index.json");
        let probe = probe();
        let ctx = CollectionContext {
            name: "Kan",
            dir: dir.path(),
            probe: &probe,
        };
        let entries = nested_entries(&ctx, 3);
        assert_eq!(
            entries,
            vec![(
                CatalogEntry::Group(vec![
                    Locator::local("Kan/a/one"),
                    Locator::local("Kan/a/two")
                ]),
                "Kan series".to_string()
            )]
        );
    }

    #[test]
    fn test_empty_manifest_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "assets/model.index");
        let probe = probe();
        let ctx = CollectionContext {
            name: "assets-master",
            dir: dir.path(),
            probe: &probe,
        };
        let err = manifest_entries(&ctx, &dir.path().join("assets/model.index"), "https://x/")
            .unwrap_err();
        assert!(matches!(err, CatalogError::MalformedManifest { .. }));
    }
}
