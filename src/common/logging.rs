//! Logging and tracing configuration
//!
//! Logs are controlled by the `RUST_LOG` environment variable. Default level
//! is INFO for this crate, WARN for dependencies. A run can additionally be
//! logged to a file, which records every request and check at DEBUG.

use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use super::paths;

fn cli_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storefront=info,warn"))
}

/// Initialize tracing for the CLI (stderr logging)
///
/// When `log_file` is set, a second non-blocking layer writes full detail to
/// that file. The returned guard must be held until the process exits so the
/// file writer flushes.
pub fn init_cli(verbose: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let (subscriber, guard) = cli_subscriber(verbose, log_file);
    subscriber.init();
    guard
}

fn cli_subscriber(
    verbose: bool,
    log_file: Option<&Path>,
) -> (impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>) {
    let filter = if verbose {
        EnvFilter::new("storefront=debug,warn")
    } else {
        cli_filter()
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(filter);

    let (file_layer, guard) = match log_file.map(file_writer) {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new("storefront=debug,info"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer);
    (subscriber, guard)
}

fn file_writer(log_file: &Path) -> (NonBlocking, WorkerGuard) {
    let dir = match log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
    }
    let file_name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "storefront.log".into());

    let appender = tracing_appender::rolling::never(dir, file_name);
    tracing_appender::non_blocking(appender)
}

/// Default location for run logs
pub fn default_log_file() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join("runs.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_records_debug_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");

        let (subscriber, guard) = cli_subscriber(false, Some(&path));
        assert!(guard.is_some());
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(request = "GET /api/brandsList", "Row passed");
        });
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Row passed"), "{}", contents);
        assert!(contents.contains("GET /api/brandsList"));
    }

    #[test]
    fn test_stderr_only_without_log_file() {
        let (subscriber, guard) = cli_subscriber(true, None);
        assert!(guard.is_none());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("stderr only");
        });
    }
}
