//! Request-time repair of asset paths.
//!
//! Clients resolve descriptor references against the directory they fetched
//! the descriptor from, which for several collection layouts yields paths that
//! do not exist on disk. The resolver maps such a path to the file the author
//! meant, committing a rewrite only after verifying the target exists.

mod rules;

pub use rules::{
    CollapseRule, MisplacedConfigRule, NestedTraversalRule, RequiredSubdirectoryRule,
    RewriteRule, RuleScope, SharedDirectoryRule, collapse_segments, has_parent_segment,
};

use crate::classify::ClassificationTable;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::util::join_relative;
use modeldex_api::models::{Resolution, StructureType};
use regex::Regex;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

/// Ordered rule list; earlier rules win.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<(RuleScope, Box<dyn RewriteRule>)>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection-specific rules from `config`, followed by the generic ones.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let resolver = &config.resolver;
        let mut registry = Self::new();

        for (collection, shared) in &resolver.shared_directory {
            registry.register(
                RuleScope::Collection(collection.clone()),
                SharedDirectoryRule::new(collection, shared).map_err(regex_error)?,
            );
        }
        for collection in &resolver.nested_traversal {
            registry.register(
                RuleScope::Collection(collection.clone()),
                NestedTraversalRule::new(collection).map_err(regex_error)?,
            );
        }
        for (collection, subdirectory) in &resolver.required_subdirectory {
            registry.register(
                RuleScope::Collection(collection.clone()),
                RequiredSubdirectoryRule::new(collection, subdirectory),
            );
        }
        registry.register(RuleScope::Any, CollapseRule);
        registry.register(
            RuleScope::Any,
            MisplacedConfigRule::new(resolver.placeholder_segments.clone()).map_err(regex_error)?,
        );

        Ok(registry)
    }

    pub fn register(&mut self, scope: RuleScope, rule: impl RewriteRule + 'static) {
        self.rules.push((scope, Box::new(rule)));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn applicable<'a>(
        &'a self,
        collection: Option<&'a str>,
        structure: impl Fn() -> Option<StructureType> + 'a,
    ) -> impl Iterator<Item = &'a dyn RewriteRule> + 'a {
        self.rules
            .iter()
            .filter(move |(scope, _)| scope.applies_to(collection, &structure))
            .map(|(_, rule)| rule.as_ref())
    }
}

fn regex_error(e: regex::Error) -> CatalogError {
    CatalogError::Internal(format!("invalid rewrite pattern: {e}"))
}

pub struct PathResolver {
    asset_root: PathBuf,
    public_prefix: String,
    manifest_dir: String,
    texture_cache_file: String,
    registry: RuleRegistry,
    placeholder: Regex,
    classifications: ClassificationTable,
}

impl PathResolver {
    pub fn new(config: &CatalogConfig, classifications: ClassificationTable) -> Result<Self> {
        Self::with_registry(config, classifications, RuleRegistry::from_config(config)?)
    }

    pub fn with_registry(
        config: &CatalogConfig,
        classifications: ClassificationTable,
        registry: RuleRegistry,
    ) -> Result<Self> {
        let placeholders = config
            .resolver
            .placeholder_segments
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let placeholder = Regex::new(&format!(r"^(.*model3?\.json)/(?:{placeholders})$"))
            .map_err(regex_error)?;

        let manifest_dir = Path::new(&config.manifest.relative_path)
            .parent()
            .map(crate::util::to_slash)
            .unwrap_or_default();

        Ok(Self {
            asset_root: config.asset_root.clone(),
            public_prefix: config.public_prefix().to_string(),
            manifest_dir,
            texture_cache_file: config.resolver.texture_cache_file.clone(),
            registry,
            placeholder,
            classifications,
        })
    }

    /// Decide how to serve an inbound request path. The path may carry the
    /// public prefix (`/model/...`) or already be asset-root relative.
    pub fn resolve(&self, request: &str) -> Resolution {
        let path = self.to_relative(request);
        let collection = path.split('/').next().filter(|s| !s.is_empty());

        if self.is_manifest_asset(path, collection) {
            tracing::debug!("{} is a manifest asset, leaving untouched", path);
            return Resolution::Passthrough;
        }

        let rewritten = self.rewrite(path, collection);
        let effective = rewritten.as_deref().unwrap_or(path);

        if self.is_texture_cache(effective) && !self.exists(effective) {
            tracing::debug!("{} absent, answering empty", effective);
            return Resolution::SoftEmpty;
        }

        if let Some(target) = rewritten {
            return Resolution::Rewrite(target);
        }

        if let Some(target) = self.placeholder_redirect(path) {
            tracing::debug!("Redirecting {} -> {}", path, target);
            return Resolution::Redirect(target);
        }

        Resolution::Passthrough
    }

    /// `<dir>/<x.model.json>/<placeholder>` -> `<dir>/<x.model.json>`.
    pub fn placeholder_redirect(&self, path: &str) -> Option<String> {
        let path = self.to_relative(path);
        self.placeholder
            .captures(path)
            .map(|caps| caps[1].to_string())
    }

    fn rewrite(&self, path: &str, collection: Option<&str>) -> Option<String> {
        let structure = OnceCell::new();
        let structure_of = || {
            *structure.get_or_init(|| {
                collection
                    .and_then(|c| self.classifications.lookup(c))
                    .map(|c| c.structure)
            })
        };

        for rule in self.registry.applicable(collection, structure_of) {
            let Some(candidate) = rule.candidate(path) else {
                continue;
            };
            // Rules may keep `..` segments; the committed path never does.
            let candidate = collapse_segments(&candidate);
            if candidate.is_empty() || candidate == path {
                continue;
            }
            if self.exists(&candidate) {
                tracing::debug!("{}: {} -> {}", rule.name(), path, candidate);
                return Some(candidate);
            }
            tracing::debug!(
                "{}: candidate {} for {} does not exist",
                rule.name(),
                candidate,
                path
            );
        }
        None
    }

    fn is_manifest_asset(&self, path: &str, collection: Option<&str>) -> bool {
        let Some(collection) = collection else {
            return false;
        };
        if self.manifest_dir.is_empty() {
            return false;
        }
        let prefix = format!("{}/{}/", collection, self.manifest_dir);
        path.starts_with(&prefix)
            && self
                .classifications
                .lookup(collection)
                .is_some_and(|c| c.structure == StructureType::IndexedManifest)
    }

    fn is_texture_cache(&self, path: &str) -> bool {
        path.rsplit('/').next() == Some(self.texture_cache_file.as_str())
    }

    fn exists(&self, relative: &str) -> bool {
        join_relative(&self.asset_root, relative).is_some_and(|p| p.exists())
    }

    fn to_relative<'a>(&self, request: &'a str) -> &'a str {
        let stripped = match request.strip_prefix(self.public_prefix.as_str()) {
            Some(rest)
                if !self.public_prefix.is_empty() && (rest.is_empty() || rest.starts_with('/')) =>
            {
                rest
            }
            _ => request,
        };
        stripped.trim_start_matches('/')
    }
}
