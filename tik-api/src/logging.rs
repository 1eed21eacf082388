/// Logging setup
///
/// Console output is always on and filtered by `RUST_LOG`. When a log
/// directory is configured, four daily-rotating JSON files are written too:
///
/// | File         | Content                              |
/// |--------------|--------------------------------------|
/// | `app.log`    | INFO and above                       |
/// | `errors.log` | ERROR only                           |
/// | `access.log` | `tower_http` request/response traces |
/// | `debug.log`  | DEBUG and above                      |
///
/// The returned guards flush the non-blocking writers when dropped and must
/// be kept alive until shutdown.

use std::path::Path;
use tracing::Subscriber;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling,
};
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    fmt::{
        self,
        format::{Format, Json, JsonFields},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const DEFAULT_FILTER: &str = "tik_api=info,tik_shared=info,tower_http=info";

/// Installs the global subscriber
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<Vec<WorkerGuard>> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let console = fmt::layer().with_filter(console_filter);

    let mut guards = Vec::new();

    let files = log_dir.map(|dir| {
        let app = json_file(dir, "app.log", &mut guards).with_filter(LevelFilter::INFO);
        let errors = json_file(dir, "errors.log", &mut guards).with_filter(LevelFilter::ERROR);
        let access = json_file(dir, "access.log", &mut guards)
            .with_filter(filter_fn(|metadata| metadata.target().starts_with("tower_http")));
        let debug = json_file(dir, "debug.log", &mut guards).with_filter(LevelFilter::DEBUG);

        app.and_then(errors).and_then(access).and_then(debug)
    });

    tracing_subscriber::registry()
        .with(console)
        .with(files)
        .try_init()?;

    Ok(guards)
}

fn json_file<S>(
    dir: &Path,
    file_name: &str,
    guards: &mut Vec<WorkerGuard>,
) -> fmt::Layer<S, JsonFields, Format<Json>, NonBlocking>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, file_name));
    guards.push(guard);

    fmt::layer().json().with_writer(writer)
}
