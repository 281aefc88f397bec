//! Tracing subscriber setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name prefix inside `--log-dir`; a date suffix is appended daily.
const LOG_FILE_PREFIX: &str = "tilegrab.log";

/// Filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "tilegrab=debug,tower_http=debug"
    } else {
        "tilegrab=info,tower_http=info"
    }
}

/// Installs the global subscriber: the console always, plus a daily-rotated file
/// when `log_dir` is given.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    guard
}
