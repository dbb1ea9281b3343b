use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_DIR_ENV: &str = "MODELDEX_LOG_DIR";

/// Directory for rolling log files, honouring `MODELDEX_LOG_DIR`.
pub fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".modeldex/logs")
}

pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    let (guard, installed) = install(&log_dir(), component, to_stderr);
    if let Err(e) = installed {
        eprintln!("modeldex: logging for {component} not installed: {e}");
    }
    guard
}

/// Build the subscriber and try to make it the global default. Fails when a
/// global subscriber is already set; the guard is returned either way.
fn install(
    log_dir: &Path,
    component: &str,
    to_stderr: bool,
) -> (WorkerGuard, Result<(), TryInitError>) {
    let _ = std::fs::create_dir_all(log_dir);

    // Files roll daily and are prefixed with the component, e.g. server.2026-01-21
    let file_appender = tracing_appender::rolling::daily(log_dir, component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    let installed = if to_stderr {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        registry.with(stderr_layer).try_init()
    } else {
        registry.try_init()
    };

    (guard, installed)
}
