//! Path rewrite rules.
//!
//! A rule only proposes a candidate; the resolver commits it after checking the
//! rewritten file exists.

use modeldex_api::models::StructureType;
use regex::Regex;

pub trait RewriteRule: Send + Sync {
    fn name(&self) -> &str;

    /// Candidate rewrite of an asset-root relative path.
    fn candidate(&self, path: &str) -> Option<String>;
}

/// Which requests a rule is consulted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleScope {
    /// Paths whose first segment is this collection.
    Collection(String),
    /// Paths inside any collection classified with this structure.
    Structure(StructureType),
    Any,
}

impl RuleScope {
    /// `structure` is only called for structure-scoped rules, since looking
    /// up an unseen collection classifies it on disk.
    pub fn applies_to(
        &self,
        collection: Option<&str>,
        structure: impl FnOnce() -> Option<StructureType>,
    ) -> bool {
        match self {
            RuleScope::Collection(name) => collection == Some(name.as_str()),
            RuleScope::Structure(wanted) => structure() == Some(*wanted),
            RuleScope::Any => true,
        }
    }
}

/// Collapse `..` segments with a stack, never climbing above the root. Empty
/// and `.` segments are dropped.
pub fn collapse_segments(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack.join("/")
}

pub fn has_parent_segment(path: &str) -> bool {
    path.split('/').any(|s| s == "..")
}

/// Models of a collection share one sibling directory (e.g. `general`) that
/// their references climb to with the wrong number of `..`.
pub struct SharedDirectoryRule {
    name: String,
    from_motions: Regex,
    from_model: Regex,
    collection: String,
    shared: String,
}

impl SharedDirectoryRule {
    pub fn new(collection: &str, shared: &str) -> Result<Self, regex::Error> {
        let c = regex::escape(collection);
        let s = regex::escape(shared);
        Ok(Self {
            name: format!("shared-directory:{collection}"),
            from_motions: Regex::new(&format!(r"^{c}/[^/]+/motions/\.\./\.\./{s}/(.+)$"))?,
            from_model: Regex::new(&format!(r"^{c}/[^/]+/\.\./{s}/(.+)$"))?,
            collection: collection.to_string(),
            shared: shared.to_string(),
        })
    }
}

impl RewriteRule for SharedDirectoryRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidate(&self, path: &str) -> Option<String> {
        let caps = self
            .from_motions
            .captures(path)
            .or_else(|| self.from_model.captures(path))?;
        Some(format!("{}/{}/{}", self.collection, self.shared, &caps[1]))
    }
}

/// References two levels deep that climb `../../` expecting to land in the
/// collection root.
pub struct NestedTraversalRule {
    name: String,
    pattern: Regex,
    collection: String,
}

impl NestedTraversalRule {
    pub fn new(collection: &str) -> Result<Self, regex::Error> {
        let c = regex::escape(collection);
        Ok(Self {
            name: format!("nested-traversal:{collection}"),
            pattern: Regex::new(&format!(r"^{c}/[^/]+/[^/]+/\.\./\.\./(.+)$"))?,
            collection: collection.to_string(),
        })
    }
}

impl RewriteRule for NestedTraversalRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidate(&self, path: &str) -> Option<String> {
        let caps = self.pattern.captures(path)?;
        Some(format!("{}/{}", self.collection, &caps[1]))
    }
}

/// The collection is served as if its only model lived at the root; insert the
/// real model subdirectory.
pub struct RequiredSubdirectoryRule {
    name: String,
    collection: String,
    subdirectory: String,
}

impl RequiredSubdirectoryRule {
    pub fn new(collection: &str, subdirectory: &str) -> Self {
        Self {
            name: format!("required-subdirectory:{collection}"),
            collection: collection.to_string(),
            subdirectory: subdirectory.to_string(),
        }
    }
}

impl RewriteRule for RequiredSubdirectoryRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidate(&self, path: &str) -> Option<String> {
        let rest = path
            .strip_prefix(self.collection.as_str())?
            .strip_prefix('/')
            .filter(|r| !r.is_empty())?;
        let marker = format!("/{}/", self.subdirectory);
        if format!("/{rest}").contains(&marker) {
            return None;
        }
        Some(format!("{}/{}/{}", self.collection, self.subdirectory, rest))
    }
}

pub struct CollapseRule;

impl RewriteRule for CollapseRule {
    fn name(&self) -> &str {
        "collapse"
    }

    fn candidate(&self, path: &str) -> Option<String> {
        has_parent_segment(path).then(|| collapse_segments(path))
    }
}

/// A model file name used as if it were a directory: `<dir>/<x.model.json>/<file>`.
/// Placeholder segments are left for the redirect check.
pub struct MisplacedConfigRule {
    pattern: Regex,
    placeholders: Vec<String>,
}

impl MisplacedConfigRule {
    pub fn new(placeholders: Vec<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"^(.+)/[^/]*model3?\.json/(.+)$")?,
            placeholders,
        })
    }
}

impl RewriteRule for MisplacedConfigRule {
    fn name(&self) -> &str {
        "misplaced-config-segment"
    }

    fn candidate(&self, path: &str) -> Option<String> {
        let caps = self.pattern.captures(path)?;
        if self.placeholders.iter().any(|p| p == &caps[2]) {
            return None;
        }
        Some(format!("{}/{}", &caps[1], &caps[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_matching() {
        let kantai = RuleScope::Collection("KantaiCollection".to_string());
        assert!(kantai.applies_to(Some("KantaiCollection"), || None));
        assert!(!kantai.applies_to(Some("Pio"), || None));
        assert!(!kantai.applies_to(None, || None));

        let nested = RuleScope::Structure(StructureType::NestedHierarchy);
        assert!(nested.applies_to(Some("Potion"), || Some(StructureType::NestedHierarchy)));
        assert!(!nested.applies_to(Some("Pio"), || Some(StructureType::StandardSingle)));
        assert!(!nested.applies_to(Some("missing"), || None));

        assert!(RuleScope::Any.applies_to(None, || unreachable!()));
        assert!(!kantai.applies_to(Some("Pio"), || unreachable!()));
    }

    #[test]
    fn test_collapse() {
        assert_eq!(collapse_segments("a/b/../c"), "a/c");
        assert_eq!(collapse_segments("a/../../../b"), "b");
        assert_eq!(collapse_segments("../.."), "");
        assert_eq!(collapse_segments("./a//b/"), "a/b");
        let once = collapse_segments("x/y/../../z/./w/..");
        assert_eq!(collapse_segments(&once), once);
    }

    #[test]
    fn test_shared_directory_patterns() {
        let rule = SharedDirectoryRule::new("HyperdimensionNeptunia", "general").unwrap();
        assert_eq!(
            rule.candidate("HyperdimensionNeptunia/blanc_classic/motions/../../general/mtn/idle_00.mtn"),
            Some("HyperdimensionNeptunia/general/mtn/idle_00.mtn".to_string())
        );
        assert_eq!(
            rule.candidate("HyperdimensionNeptunia/blanc_classic/../general/pose.json"),
            Some("HyperdimensionNeptunia/general/pose.json".to_string())
        );
        assert_eq!(rule.candidate("HyperdimensionNeptunia/blanc_classic/pose.json"), None);
    }

    #[test]
    fn test_nested_traversal_pattern() {
        let rule = NestedTraversalRule::new("KantaiCollection").unwrap();
        assert_eq!(
            rule.candidate("KantaiCollection/murakumo/motions/../../1/1.mtn"),
            Some("KantaiCollection/1/1.mtn".to_string())
        );
        assert_eq!(rule.candidate("KantaiCollection/murakumo/../1.mtn"), None);
    }

    #[test]
    fn test_required_subdirectory() {
        let rule = RequiredSubdirectoryRule::new("KantaiCollection", "murakumo");
        assert_eq!(
            rule.candidate("KantaiCollection/textures.1024/00.png"),
            Some("KantaiCollection/murakumo/textures.1024/00.png".to_string())
        );
        assert_eq!(rule.candidate("KantaiCollection/murakumo/model.moc"), None);
        assert_eq!(rule.candidate("KantaiCollectionX/model.moc"), None);
        assert_eq!(rule.candidate("KantaiCollection/"), None);
    }

    #[test]
    fn test_misplaced_config_segment() {
        let rule = MisplacedConfigRule::new(vec!["index.json".into(), "undefined".into()]).unwrap();
        assert_eq!(
            rule.candidate("Potion/Tia/tia.model.json/textures/00.png"),
            Some("Potion/Tia/textures/00.png".to_string())
        );
        assert_eq!(rule.candidate("Potion/Tia/tia.model.json/index.json"), None);
        assert_eq!(rule.candidate("Potion/Tia/textures/00.png"), None);
    }

    #[test]
    fn test_scope() {
        assert!(RuleScope::Any.applies_to(None, || None));
        assert!(RuleScope::Collection("a".into()).applies_to(Some("a"), || None));
        assert!(!RuleScope::Collection("a".into()).applies_to(Some("b"), || None));
    }
}
