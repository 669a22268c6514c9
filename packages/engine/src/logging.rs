use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "viva.log";

/// Keeps the background log writer alive; drop it to flush
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

fn log_dir() -> PathBuf {
    std::env::var("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./logs"))
}

/// Install the global subscriber.
///
/// Logs go to stdout and, with `ENABLE_FILE_LOGS`, to a daily file under
/// `LOG_DIR`. A second call in the same process leaves the first subscriber
/// in place.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut guard = None;
    let file_layer = if file_logging_enabled() {
        let dir = log_dir();
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX);
                let (writer, worker) = tracing_appender::non_blocking(appender);
                guard = Some(FileLogGuard { _guard: worker });
                Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
            }
            Err(err) => {
                eprintln!("failed to create log directory {}: {err}", dir.display());
                None
            }
        }
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        guard
    } else {
        None
    }
}
