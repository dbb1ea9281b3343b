mod common;

use async_trait::async_trait;
use common::Fixture;
use modeldex_api::models::{BuildSummary, RescanTrigger};
use modeldex_api::{CatalogLifecycle, ModelLookup};
use modeldex_core::EngineHandle;
use modeldex_core::runtime::{RescanCoordinator, RescanJob, run_debounce};
use notify::{Event, EventKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct SlowJob {
    runs: AtomicUsize,
}

#[async_trait]
impl RescanJob for SlowJob {
    async fn run(&self) -> modeldex_core::Result<BuildSummary> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(BuildSummary::default())
    }
}

fn change(path: &str) -> notify::Result<Event> {
    Ok(Event::new(EventKind::Any).add_path(PathBuf::from(path)))
}

#[tokio::test(start_paused = true)]
async fn test_changes_within_window_run_one_rescan() {
    let job = Arc::new(SlowJob {
        runs: AtomicUsize::new(0),
    });
    let coordinator = RescanCoordinator::new(job.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let trigger = coordinator.clone();
    tokio::spawn(run_debounce(
        rx,
        Duration::from_secs(2),
        cancel.clone(),
        move |_| {
            trigger.trigger();
        },
    ));

    tx.send(change("/models/A/index.json")).unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;
    tx.send(change("/models/A/textures/0.png")).unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    coordinator.wait_idle().await;
    assert_eq!(job.runs.load(Ordering::SeqCst), 1);

    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_trigger_during_run_defers_exactly_one_follow_up() {
    let job = Arc::new(SlowJob {
        runs: AtomicUsize::new(0),
    });
    let coordinator = RescanCoordinator::new(job.clone());

    assert_eq!(coordinator.trigger(), RescanTrigger::Started);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(coordinator.is_running());
    assert_eq!(coordinator.trigger(), RescanTrigger::Deferred);
    assert_eq!(coordinator.trigger(), RescanTrigger::Deferred);

    coordinator.wait_idle().await;
    assert_eq!(job.runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_engine_rescan_picks_up_new_collections() {
    let fx = Fixture::new();
    fx.write("A/index.json", "{}");
    let handle = EngineHandle::new(fx.config()).unwrap();

    assert!(handle.list().await.unwrap().is_empty());
    assert_eq!(handle.rescan().await.unwrap(), RescanTrigger::Started);
    handle.engine().wait_for_rescan().await;
    assert_eq!(handle.list().await.unwrap().model_count(), 1);

    fx.write("B/index.json", "{}");
    handle.rescan().await.unwrap();
    handle.engine().wait_for_rescan().await;
    let catalog = handle.list().await.unwrap();
    assert_eq!(catalog.model_count(), 2);
    assert_eq!(catalog.messages, vec!["model from A", "model from B"]);
}

#[tokio::test]
async fn test_watch_creates_asset_root_and_stops() {
    let fx = Fixture::new();
    let mut config = fx.config();
    config.asset_root = fx.dir.path().join("later");
    let handle = EngineHandle::new(config).unwrap();

    let watcher = handle.start_watch().await.unwrap();
    assert!(fx.dir.path().join("later").is_dir());
    watcher.stop();
}
