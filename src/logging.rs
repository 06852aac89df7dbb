use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

use crate::errors::RestoreError;

pub const LOG_FILE_PREFIX: &str = "restore-panel.log";

/// Routes tracing output to a daily rolling file; the terminal belongs to the UI.
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard, RestoreError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        RestoreError::Configuration(format!(
            "cannot create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let file_appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| RestoreError::Configuration(format!("logging already initialised: {}", e)))?;

    Ok(guard)
}
