//! File logging for headless sessions.
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log to stderr and to `<cache>/logs/<session>/headless.log`.
pub fn setup_logging(session_id: &Option<String>) -> Result<()> {
    let session_id = session_id.clone().unwrap_or_else(|| {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        format!("session_{}", timestamp)
    });

    let session_log_dir = log_directory().join(&session_id);
    std::fs::create_dir_all(&session_log_dir)?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "headless.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // The writer must outlive main.
    std::mem::forget(guard);

    tracing::info!("Logging initialized: session={}", session_id);
    tracing::info!("Log file: {}/headless.log", session_log_dir.display());
    Ok(())
}

fn log_directory() -> PathBuf {
    directories::ProjectDirs::from("", "", "combat")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("combat").join("logs"))
}
