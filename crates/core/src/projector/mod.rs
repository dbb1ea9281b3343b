//! Projection of a loaded descriptor for serving.

mod handlers;

pub use handlers::{DescriptorHandler, HandlerContext, ManifestHandler, MultiDirectoryHandler};

use crate::classify::ClassificationTable;
use crate::config::CatalogConfig;
use crate::resolver::has_parent_segment;
use indexmap::IndexMap;
use modeldex_api::models::{
    Locator, MotionEntry, ResourceDescriptor, ScaleOverride, StructureType,
};
use serde_json::{Number, Value};
use std::collections::HashMap;

/// Motion group that receives entries filed under an empty group name.
pub const DEFAULT_MOTION_GROUP: &str = "tap";

pub struct ConfigProjector {
    public_prefix: String,
    classifications: ClassificationTable,
    handlers: HashMap<StructureType, Box<dyn DescriptorHandler>>,
}

impl ConfigProjector {
    pub fn new(config: &CatalogConfig, classifications: ClassificationTable) -> Self {
        let mut projector = Self {
            public_prefix: config.public_prefix().to_string(),
            classifications,
            handlers: HashMap::new(),
        };
        projector.register(StructureType::IndexedManifest, ManifestHandler);
        projector.register(StructureType::MultiDirectoryGroup, MultiDirectoryHandler::new());
        projector
    }

    pub fn register(&mut self, structure: StructureType, handler: impl DescriptorHandler + 'static) {
        self.register_boxed(structure, Box::new(handler));
    }

    /// Replaces any handler already registered for `structure`.
    pub fn register_boxed(&mut self, structure: StructureType, handler: Box<dyn DescriptorHandler>) {
        self.handlers.insert(structure, handler);
    }

    /// Normalize motions and apply the owning collection's handler, if any.
    ///
    /// `base_path` is the directory holding the descriptor, relative to the
    /// asset root.
    pub fn apply(
        &self,
        mut descriptor: ResourceDescriptor,
        base_path: &str,
        locator: &Locator,
    ) -> ResourceDescriptor {
        normalize_motions(&mut descriptor);

        let Some(collection) = locator.collection() else {
            return descriptor;
        };
        let handler = self
            .classifications
            .lookup(collection)
            .and_then(|c| self.handlers.get(&c.structure));

        match handler {
            Some(handler) => {
                tracing::debug!("Projecting {} with {}", locator, handler.id());
                handler.rewrite(
                    &mut descriptor,
                    &HandlerContext {
                        collection,
                        base_path,
                        public_prefix: &self.public_prefix,
                    },
                );
            }
            None => {
                // Author-relative references are resolved by the client against
                // the descriptor URL and repaired by the path resolver on fetch.
                if descriptor.references().iter().any(|r| has_parent_segment(r)) {
                    tracing::debug!(
                        "{} has parent-relative references, leaving them to the resolver",
                        locator
                    );
                }
            }
        }

        descriptor
    }
}

/// Fold the empty-named motion group into [`DEFAULT_MOTION_GROUP`] and drop
/// empty groups.
pub fn normalize_motions(descriptor: &mut ResourceDescriptor) {
    let Some(motions) = descriptor.motions.take() else {
        return;
    };

    let mut cleaned: IndexMap<String, Vec<MotionEntry>> = IndexMap::with_capacity(motions.len());
    for (name, entries) in motions {
        if entries.is_empty() {
            continue;
        }
        let key = if name.trim().is_empty() {
            DEFAULT_MOTION_GROUP.to_string()
        } else {
            name
        };
        cleaned.entry(key).or_default().extend(entries);
    }
    descriptor.motions = Some(cleaned);
}

/// Merge the fields `scale` sets into the descriptor's layout block, keeping
/// every other layout field.
pub fn overlay_scale(descriptor: &mut ResourceDescriptor, scale: &ScaleOverride) {
    if scale.is_empty() {
        return;
    }
    let layout = descriptor.layout.get_or_insert_with(Default::default);
    if let Some(value) = scale.scale.and_then(Number::from_f64) {
        layout.insert("scale".to_string(), Value::Number(value));
    }
    if let Some(width) = scale.width {
        layout.insert("width".to_string(), Value::from(width));
    }
    if let Some(height) = scale.height {
        layout.insert("height".to_string(), Value::from(height));
    }
}
