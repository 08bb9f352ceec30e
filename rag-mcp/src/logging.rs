//! Subscriber setup for the `rag-mcp` binary.

use rag_mcp_retriever::registry::STATE_DIR_NAME;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "rag_mcp";
pub const LOG_FILE_SUFFIX: &str = "log";
/// Rotated files kept on disk, one per day.
pub const LOG_RETENTION_FILES: usize = 7;

/// `~/.rag_mcp/logs`, if a home directory is known.
pub fn log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(STATE_DIR_NAME).join(LOG_DIR_NAME))
}

/// Daily `rag_mcp.<date>.log` files in `dir`; only the newest [`LOG_RETENTION_FILES`]
/// are kept.
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(LOG_RETENTION_FILES)
        .build(dir)
}

fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}

/// Log to stderr and to a daily-rotated file under [`log_dir`].
///
/// Stdout carries the MCP protocol and is never written to. The returned guard flushes
/// the file writer on drop and must be held for the life of the process. Without a
/// usable log directory only the stderr layer is installed.
pub fn init_logging() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    let file_writer = log_dir().and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        let appender = file_appender(&dir).ok()?;
        Some(tracing_appender::non_blocking(appender))
    });

    match file_writer {
        Some((writer, guard)) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter());
            let _ = tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
            None
        }
    }
}
