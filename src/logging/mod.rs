pub mod config;
pub mod middleware;
pub mod paths;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

pub use config::LogConfig;
pub use middleware::{access_log_middleware, request_id_middleware, AccessLogSettings, RequestId};

/// Keeps the background log writers alive; drop only at process exit
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Initialize logging
///
/// Sets up:
/// - Console logging filtered by `RUST_LOG`
/// - Access log file (JSON, target `access_log`) for HTTP request tracking
/// - Application log file (JSON) for server events
/// - Daily rotation of both files
pub fn init_logging(config: &LogConfig) -> Result<LogGuards, Box<dyn std::error::Error>> {
    let console_filter =
        EnvFilter::try_new(&config.console_log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(console_filter);

    if !config.files_enabled {
        tracing_subscriber::registry().with(console_layer).try_init()?;
        tracing::info!("Logging initialized (console only)");
        return Ok(LogGuards { _guards: Vec::new() });
    }

    let log_dir = paths::get_log_directory(config.custom_log_dir.as_deref())?;

    let access_appender = tracing_appender::rolling::daily(&log_dir, "access.log");
    let app_appender = tracing_appender::rolling::daily(&log_dir, "application.log");

    // Non-blocking writers keep file I/O off the request path
    let (access_writer, access_guard) = tracing_appender::non_blocking(access_appender);
    let (app_writer, app_guard) = tracing_appender::non_blocking(app_appender);

    let access_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(access_writer)
        .with_filter(Targets::new().with_target("access_log", tracing::Level::INFO));

    let app_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(app_writer)
        .with_filter(
            EnvFilter::try_new(&config.file_log_level)
                .unwrap_or_else(|_| EnvFilter::new("debug"))
                .add_directive("access_log=off".parse()?),
        );

    tracing_subscriber::registry()
        .with(console_layer)
        .with(access_layer)
        .with(app_layer)
        .try_init()?;

    tracing::info!(log_dir = ?log_dir, "Logging initialized - access: access.log, application: application.log");

    Ok(LogGuards {
        _guards: vec![access_guard, app_guard],
    })
}

/// Log platform-specific information on startup
pub fn log_platform_info() {
    tracing::info!(
        platform = std::env::consts::OS,
        architecture = std::env::consts::ARCH,
        version = env!("CARGO_PKG_VERSION"),
        "Server starting on platform"
    );
}
