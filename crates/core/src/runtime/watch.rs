use super::rescan::RescanCoordinator;
use crate::error::Result;
use crate::util::is_hidden;
use modeldex_api::CatalogWatchHandle;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }
}

/// Handle returned by [`start_watch`]; stopping it ends the watcher task.
pub struct CatalogWatcher {
    token: CancellationToken,
}

impl CatalogWatcher {
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl CatalogWatchHandle for CatalogWatcher {
    fn stop(&self) {
        self.token.cancel();
    }
}

/// Collect filesystem events and call `on_settle` once no event has arrived
/// for `window`. Each new event restarts the window. Events touching only
/// hidden paths are ignored.
pub async fn run_debounce<F>(
    mut rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    window: Duration,
    cancel: CancellationToken,
    mut on_settle: F,
) where
    F: FnMut(usize),
{
    let mut pending: HashSet<PathBuf> = HashSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => {
                match event {
                    Some(Ok(event)) => {
                        pending.extend(event.paths.into_iter().filter(|p| !is_hidden(p)));
                    }
                    Some(Err(e)) => tracing::warn!("Watch error: {}", e),
                    None => break,
                }
            }
            _ = tokio::time::sleep(window), if !pending.is_empty() => {
                let changed = pending.len();
                pending.clear();
                on_settle(changed);
            }
        }
    }
}

/// Watch `root` recursively and trigger a rescan after changes settle.
/// The asset root is created if missing.
pub fn start_watch(
    root: &Path,
    window: Duration,
    coordinator: Arc<RescanCoordinator>,
    token: CancellationToken,
) -> Result<Arc<CatalogWatcher>> {
    std::fs::create_dir_all(root)?;
    let FsWatcher { _watcher: watcher, rx } = FsWatcher::new(root)?;

    let cancel = token.clone();
    let root = root.to_path_buf();

    tokio::spawn(async move {
        let _watcher = watcher;
        tracing::info!("Started watching {}", root.display());
        run_debounce(rx, window, cancel, |changed| {
            tracing::info!("Detected {} changed paths, rescanning", changed);
            coordinator.trigger();
        })
        .await;
        tracing::info!("Watcher task ended for {}", root.display());
    });

    Ok(Arc::new(CatalogWatcher { token }))
}
