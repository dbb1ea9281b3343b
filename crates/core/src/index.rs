//! Cached, id-addressable view of the persisted catalog.

use crate::catalog::load_catalog;
use crate::error::Result;
use modeldex_api::models::{Catalog, Locator};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct CachedCatalog {
    catalog: Arc<Catalog>,
    loaded_at: Instant,
}

/// Holds the last loaded catalog and reloads it once the TTL has elapsed or
/// after [`ModelIndex::invalidate`].
///
/// A reload builds a fresh `Arc` and swaps it in under the write lock, so a
/// reader holding the previous snapshot keeps a consistent catalog. Every
/// invalidation bumps `generation`; a reload that read the file before the
/// bump is discarded and reads again.
pub struct ModelIndex {
    path: PathBuf,
    ttl: Duration,
    current: RwLock<Option<Arc<CachedCatalog>>>,
    generation: AtomicU64,
}

impl ModelIndex {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Current catalog snapshot, reloading from disk if stale.
    pub async fn catalog(&self) -> Arc<Catalog> {
        {
            let guard = self.current.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.loaded_at.elapsed() < self.ttl {
                    return cached.catalog.clone();
                }
            }
        }
        self.reload().await
    }

    /// Reload from disk unconditionally. A missing or unreadable catalog is
    /// served as empty until the next reload.
    pub async fn reload(&self) -> Arc<Catalog> {
        loop {
            let generation = self.generation();
            let catalog = self.load_or_empty().await;
            match self.commit(generation, catalog).await {
                Some(snapshot) => return snapshot,
                None => tracing::debug!("Catalog invalidated during reload, reading again"),
            }
        }
    }

    /// Number of invalidations so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `catalog` as read at `generation`. Returns `None` without
    /// storing anything if the index was invalidated since.
    pub async fn commit(&self, generation: u64, catalog: Catalog) -> Option<Arc<Catalog>> {
        let mut current = self.current.write().await;
        if self.generation() != generation {
            return None;
        }
        let cached = Arc::new(CachedCatalog {
            catalog: Arc::new(catalog),
            loaded_at: Instant::now(),
        });
        let snapshot = cached.catalog.clone();
        *current = Some(cached);
        Some(snapshot)
    }

    async fn load_or_empty(&self) -> Catalog {
        match self.read_from_disk().await {
            Ok(Some(catalog)) => {
                tracing::debug!(
                    "Loaded catalog from {} ({} entries)",
                    self.path.display(),
                    catalog.models.len()
                );
                catalog
            }
            Ok(None) => {
                tracing::debug!("Catalog {} does not exist yet", self.path.display());
                Catalog::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load catalog {}: {}", self.path.display(), e);
                Catalog::default()
            }
        }
    }

    async fn read_from_disk(&self) -> Result<Option<Catalog>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_catalog(&path)).await?
    }

    /// Forget the cached catalog. Reloads already in flight will not store
    /// what they read.
    pub async fn invalidate(&self) {
        let mut current = self.current.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        *current = None;
        tracing::debug!("Catalog cache invalidated");
    }

    pub async fn resolve(&self, id: usize) -> Option<Locator> {
        self.catalog().await.resolve(id).cloned()
    }

    pub async fn flatten(&self) -> Vec<Locator> {
        self.catalog().await.flatten().into_iter().cloned().collect()
    }
}
