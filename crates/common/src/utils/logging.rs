use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Human-readable output for local runs of the record handler.
/// - `RUST_LOG` wins when set; otherwise `info`, which shows startup,
///   registered routes, saves/updates/deletes and one line per HTTP request
/// - Compact lines without targets, on stdout
pub fn init_logging_compact() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event, for deployments that ship stdout to a log store.
/// - `RUST_LOG` wins when set
/// - Default filter also turns on `server::dispatcher` at debug, so each
///   route match and rejected payload is recorded with its method and path
/// - Store failures are logged at warn with the operation name either way
pub fn init_logging_json() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,server::dispatcher=debug"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Called once by the server binary after `.env` is loaded: `LOG_FORMAT=json`
/// selects [`init_logging_json`], anything else [`init_logging_compact`].
pub fn init_logging_from_env() {
    match std::env::var("LOG_FORMAT") {
        Ok(v) if v.eq_ignore_ascii_case("json") => init_logging_json(),
        _ => init_logging_compact(),
    }
}
