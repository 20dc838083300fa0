//! Logging setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix of the daily rolling log.
pub const LOG_FILE_PREFIX: &str = "supertrend.log";

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Console output goes to stderr
/// so that reports printed on stdout stay machine-readable. With `log_dir`
/// set, events are also written to a daily rolling file without ANSI
/// colors; keep the returned guard alive until exit so buffered lines are
/// flushed.
pub fn setup_logging(
    level: &str,
    json: bool,
    log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>, TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let pretty_layer = (!json).then(|| fmt::layer().pretty().with_writer(std::io::stderr));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
