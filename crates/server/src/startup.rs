use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::errors::StartupError;
use crate::routes;
use service::{file::record_store::JsonFileRecordStore, runtime, ItemService};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load configuration from `CONFIG_PATH`/`config.toml`, or from env vars when
/// no file is readable. Either way the result is normalized and validated.
pub fn load_config() -> Result<AppConfig, StartupError> {
    let mut cfg = match configs::load_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config file unavailable; using environment and defaults");
            AppConfig::from_env()
        }
    };
    cfg.normalize_and_validate()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(cfg)
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))
}

/// Open the table, wire the dispatcher, and build the router.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    runtime::ensure_env(&cfg.store.data_dir).await?;

    let table_file = cfg.store.table_file();
    let store = JsonFileRecordStore::open(&cfg.store.table_name, &table_file).await?;
    let records = store.len().await;
    info!(table = %cfg.store.table_name, file = %table_file.display(), records, "record store opened");

    let dispatcher = Arc::new(Dispatcher::from_config(ItemService::new(store), &cfg.routes));
    for route in dispatcher.routes() {
        info!(method = %route.method, path = %route.path, action = ?route.action, "route registered");
    }

    Ok(routes::build_router(dispatcher, &cfg.server.invoke_path, build_cors()))
}

/// Build the app from `cfg` and serve until the listener fails.
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;
    let addr = bind_addr(&cfg)?;
    info!(%addr, invoke_path = %cfg.server.invoke_path, "starting record handler");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Public entry: load configuration, build the app and run the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    let cfg = load_config()?;
    run_with_config(cfg).await
}
