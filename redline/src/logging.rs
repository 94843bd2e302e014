//! File logging. The terminal UI owns stderr, so everything goes to
//! `<log_dir>/redline.log`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "redline.log";

/// Installs the global subscriber. Keep the guard alive until exit or the
/// tail of the log is lost.
pub fn init(log_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("REDLINE_LOG")
                .unwrap_or_else(|_| "redline=info,redline_core=info,warn".into()),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    guard
}
