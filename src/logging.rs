use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Where log output may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// Full-screen UI owns the terminal; only the log file is written.
    FileOnly,
    /// Scripting commands also log to stderr.
    StderrAndFile,
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over `level`. The returned guard flushes the file writer
/// when dropped and must be held until exit.
pub fn init_logging(level: &str, log_file: Option<&Path>, sink: Sink) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("failed to create log filter from `{}`: {}", level, e))?;

    let console_layer = match sink {
        Sink::StderrAndFile => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .boxed(),
        ),
        Sink::FileOnly => None,
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("log file path has no file name: {}", path.display()))?;

            let appender = rolling::never(dir, file_name);
            let (writer, guard) = non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {}", e))?;

    info!("logging initialized");
    Ok(guard)
}
