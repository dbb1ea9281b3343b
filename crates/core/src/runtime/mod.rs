//! Catalog engine: ties the index, resolver, projector and scale store
//! together behind one stateful service.

use crate::catalog::CatalogBuilder;
use crate::classify::{ClassificationTable, ConfigProbe};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::index::ModelIndex;
use crate::projector::{ConfigProjector, DescriptorHandler, overlay_scale};
use crate::resolver::{PathResolver, RuleRegistry};
use crate::scale::ScaleStore;
use modeldex_api::models::{
    BuildSummary, Catalog, ConfigLookup, Locator, ModelId, ModelResponse, RandomPick,
    RemoteModel, RescanTrigger, Resolution, ResourceDescriptor, ScaleOverride, StructureType,
};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod descriptor;
mod rescan;
mod watch;

pub use descriptor::{DescriptorLocator, LocatedDescriptor, read_descriptor};
pub use rescan::{CatalogRescan, RescanCoordinator, RescanJob};
pub use watch::{CatalogWatcher, run_debounce};

const REMOTE_MESSAGE: &str = "remote model";
const RANDOM_MESSAGE: &str = "random model";

/// Model catalog engine
///
/// Owns the cached catalog and the per-request services. Rescans swap a new
/// catalog in without blocking readers.
pub struct CatalogEngine {
    config: Arc<CatalogConfig>,
    index: Arc<ModelIndex>,
    classifications: ClassificationTable,
    resolver: PathResolver,
    projector: ConfigProjector,
    descriptors: Arc<DescriptorLocator>,
    scales: ScaleStore,
    rescan: Arc<RescanCoordinator>,
    /// Parent token of every watcher started by this engine
    cancel_token: CancellationToken,
}

pub struct CatalogEngineBuilder {
    config: CatalogConfig,
    rules: Option<RuleRegistry>,
    handlers: Vec<(StructureType, Box<dyn DescriptorHandler>)>,
}

impl CatalogEngineBuilder {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            rules: None,
            handlers: Vec::new(),
        }
    }

    /// Replace the rewrite rules derived from the config.
    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_handler(
        mut self,
        structure: StructureType,
        handler: impl DescriptorHandler + 'static,
    ) -> Self {
        self.handlers.push((structure, Box::new(handler)));
        self
    }

    pub fn build(self) -> Result<CatalogEngine> {
        let config = self.config;
        let classifications = ClassificationTable::new(&config);

        let resolver = match self.rules {
            Some(rules) => PathResolver::with_registry(&config, classifications.clone(), rules)?,
            None => PathResolver::new(&config, classifications.clone())?,
        };

        let mut projector = ConfigProjector::new(&config, classifications.clone());
        for (structure, handler) in self.handlers {
            projector.register_boxed(structure, handler);
        }

        let index = Arc::new(ModelIndex::new(&config.catalog_path, config.cache_ttl()));
        let builder = Arc::new(CatalogBuilder::new(&config));
        let job = CatalogRescan::new(
            builder,
            &config.catalog_path,
            classifications.clone(),
            index.clone(),
        );

        Ok(CatalogEngine {
            descriptors: Arc::new(DescriptorLocator::new(
                &config.asset_root,
                ConfigProbe::from_config(&config),
            )),
            scales: ScaleStore::new(&config.scale_store_path),
            rescan: RescanCoordinator::new(Arc::new(job)),
            cancel_token: CancellationToken::new(),
            config: Arc::new(config),
            index,
            classifications,
            resolver,
            projector,
        })
    }
}

impl Drop for CatalogEngine {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl CatalogEngine {
    pub fn builder(config: CatalogConfig) -> CatalogEngineBuilder {
        CatalogEngineBuilder::new(config)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn asset_root(&self) -> &Path {
        &self.config.asset_root
    }

    pub fn classifications(&self) -> &ClassificationTable {
        &self.classifications
    }

    pub fn scales(&self) -> &ScaleStore {
        &self.scales
    }

    pub async fn catalog(&self) -> Arc<Catalog> {
        self.index.catalog().await
    }

    /// Descriptor for `id` with the persisted scale for that id overlaid.
    pub async fn model(&self, id: ModelId) -> Result<ModelResponse> {
        let scale = self.scales.get(&id.model.to_string()).await?;
        self.load_model(id, scale.as_ref()).await
    }

    /// Descriptor for `id` with `scale` overlaid; nothing is persisted.
    pub async fn model_scaled(&self, id: ModelId, scale: &ScaleOverride) -> Result<ModelResponse> {
        self.load_model(id, Some(scale)).await
    }

    async fn load_model(&self, id: ModelId, scale: Option<&ScaleOverride>) -> Result<ModelResponse> {
        let catalog = self.index.catalog().await;
        let locator = catalog
            .resolve(id.model)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("model {id}")))?;

        if id.texture != 0 {
            tracing::debug!("Texture variant {} requested for {}", id.texture, locator);
        }

        match locator {
            Locator::Remote(url) => Ok(ModelResponse::Remote(RemoteModel {
                model: url,
                textures: Vec::new(),
                message: REMOTE_MESSAGE.to_string(),
            })),
            Locator::Local(ref path) => {
                let mut descriptor = self.projected_descriptor(path, &locator).await?;
                if let Some(scale) = scale {
                    overlay_scale(&mut descriptor, scale);
                }
                Ok(ModelResponse::Local(descriptor))
            }
        }
    }

    /// Uniform pick of a 1-based id, different from `current` whenever more
    /// than one model exists.
    pub async fn random_model(&self, current: Option<usize>) -> Result<RandomPick> {
        let catalog = self.index.catalog().await;
        let count = catalog.model_count();
        if count == 0 {
            return Err(CatalogError::NotFound("catalog is empty".into()));
        }

        let id = {
            let mut rng = rand::thread_rng();
            match current {
                Some(current) if count > 1 && (1..=count).contains(&current) => {
                    let pick = rng.gen_range(1..count);
                    if pick >= current { pick + 1 } else { pick }
                }
                _ => rng.gen_range(1..=count),
            }
        };

        let name = catalog
            .resolve(id - 1)
            .cloned()
            .ok_or_else(|| CatalogError::Internal(format!("id {id} outside catalog")))?;
        let message = catalog
            .message_for(id - 1)
            .unwrap_or(RANDOM_MESSAGE)
            .to_string();

        Ok(RandomPick { id, name, message })
    }

    /// Descriptor for an asset-root relative model path. A placeholder
    /// segment after a model config answers with a redirect to the config.
    pub async fn config_for_path(&self, path: &str) -> Result<ConfigLookup> {
        if let Some(target) = self.resolver.placeholder_redirect(path) {
            return Ok(ConfigLookup::Redirect(target));
        }

        let path = self.strip_placeholder(path.trim_matches('/'));
        let locator = Locator::parse(path);
        if locator.is_remote() {
            return Err(CatalogError::NotFound(format!("no local config for {path}")));
        }

        let descriptor = self.projected_descriptor(path, &locator).await?;
        Ok(ConfigLookup::Descriptor(descriptor))
    }

    /// Cubism 2 texture list as one single-texture group per texture.
    /// Descriptors declaring another version yield no groups.
    pub async fn texture_cache(&self, model_path: &str) -> Result<Vec<Vec<String>>> {
        let (descriptor, _) = self.read_local(model_path.trim_matches('/')).await?;
        let cubism2 = match descriptor.extra.get("Version") {
            None => true,
            Some(version) => version.as_i64() == Some(2),
        };
        if !cubism2 {
            return Ok(Vec::new());
        }
        Ok(descriptor
            .texture_paths()
            .into_iter()
            .map(|t| vec![t.to_string()])
            .collect())
    }

    pub fn resolve_request(&self, path: &str) -> Resolution {
        self.resolver.resolve(path)
    }

    pub fn rescan(&self) -> RescanTrigger {
        self.rescan.trigger()
    }

    pub async fn rebuild(&self) -> Result<BuildSummary> {
        self.rescan.run_now().await
    }

    /// Resolve once background rescans have drained.
    pub async fn wait_for_rescan(&self) {
        self.rescan.wait_idle().await
    }

    pub async fn invalidate(&self) {
        self.index.invalidate().await;
        self.scales.clear_cache().await;
    }

    /// Watch the asset root; changes trigger a debounced rescan.
    pub fn start_watch(&self) -> Result<Arc<CatalogWatcher>> {
        watch::start_watch(
            &self.config.asset_root,
            self.config.debounce(),
            self.rescan.clone(),
            self.cancel_token.child_token(),
        )
    }

    async fn projected_descriptor(&self, path: &str, locator: &Locator) -> Result<ResourceDescriptor> {
        let (descriptor, base_path) = self.read_local(path).await?;
        Ok(self.projector.apply(descriptor, &base_path, locator))
    }

    async fn read_local(&self, path: &str) -> Result<(ResourceDescriptor, String)> {
        let descriptors = self.descriptors.clone();
        let path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(ResourceDescriptor, String)> {
            let located = descriptors.locate(&path)?;
            tracing::debug!("Reading descriptor {}", located.file.display());
            let descriptor = read_descriptor(&located.file)?;
            Ok((descriptor, located.base_path))
        })
        .await?
    }

    fn strip_placeholder<'a>(&self, path: &'a str) -> &'a str {
        match path.rsplit_once('/') {
            Some((head, last))
                if self
                    .config
                    .resolver
                    .placeholder_segments
                    .iter()
                    .any(|p| p == last) =>
            {
                head
            }
            _ => path,
        }
    }
}
