use super::descriptor::ResourceDescriptor;
use super::locator::Locator;
use super::structure::Classification;
use serde::Serialize;

/// Answer to a get-by-id request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelResponse {
    /// The catalog points at a remote URI; the client loads it directly.
    Remote(RemoteModel),
    Local(ResourceDescriptor),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteModel {
    pub model: String,
    pub textures: Vec<String>,
    pub message: String,
}

/// A randomly chosen model. `id` is 1-based, as exchanged with clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomPick {
    pub id: usize,
    pub name: Locator,
    pub message: String,
}

/// Answer to a nested-path config lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLookup {
    Descriptor(ResourceDescriptor),
    /// The request carried a placeholder after a model file; fetch this path instead.
    Redirect(String),
}

/// Request-time decision for an inbound resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Serve the path as requested.
    Passthrough,
    /// Serve this asset-root relative path instead.
    Rewrite(String),
    /// Answer with an explicit empty result instead of not-found.
    SoftEmpty,
    /// Redirect the client to this asset-root relative path.
    Redirect(String),
}

impl Resolution {
    pub fn is_rewrite(&self) -> bool {
        matches!(self, Resolution::Rewrite(_))
    }
}

/// Result of asking for a rescan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RescanTrigger {
    /// A rescan started now.
    Started,
    /// A rescan was already running; one follow-up is scheduled.
    Deferred,
}

/// Per-collection outcome of a catalog build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionReport {
    pub name: String,
    pub classification: Classification,
    pub entries: usize,
    pub local: usize,
    pub remote: usize,
    /// The classified strategy failed or produced nothing and a fallback ran.
    pub fell_back: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    pub collections: Vec<CollectionReport>,
    pub entries: usize,
    pub models: usize,
    pub duration_ms: u128,
}

impl BuildSummary {
    pub fn local_count(&self) -> usize {
        self.collections.iter().map(|c| c.local).sum()
    }

    pub fn remote_count(&self) -> usize {
        self.collections.iter().map(|c| c.remote).sum()
    }
}
