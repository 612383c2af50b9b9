//! HTTP serving boundary: `GET /health` and `POST /predict`.

mod error;
pub mod handlers;

pub use error::{ServerError, Violation};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};

use flightdelay::models::DelayModel;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8012,
            models_dir: PathBuf::from("models"),
        }
    }
}

/// State shared by every request.
pub struct AppState {
    pub model: Arc<DelayModel>,
}

impl AppState {
    pub fn new(model: DelayModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .with_state(state)
}

/// Serve until ctrl+c.
///
/// A missing artifact does not stop the server from starting; each
/// prediction retries loading `latest.json` until one exists.
pub async fn run_server(config: ServeConfig) -> anyhow::Result<()> {
    let model = DelayModel::new(&config.models_dir);
    if let Err(e) = model.load_latest() {
        log::warn!("No model loaded at startup: {}", e);
    }
    let state = Arc::new(AppState::new(model));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!(
        "Serving delay predictions on http://{} (models in {})",
        addr,
        config.models_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received, stopping server gracefully");
}
