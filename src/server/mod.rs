//! HTTP API: routes, shared state and the server loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::assets::RenderAssets;
use crate::catalog::load::load_or_empty;
use crate::config::AppConfig;
use crate::foundation::error::WheelResult;
use crate::session::{SessionManager, retention};

/// Error mapping at the HTTP boundary.
pub mod error;
/// Route handlers.
pub mod handlers;

pub use error::{AppError, AppResult};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Session registry, which also owns the catalog.
    pub sessions: SessionManager,
}

impl AppState {
    /// Load the catalog and render assets described by `config`.
    pub fn from_config(config: &AppConfig) -> WheelResult<Self> {
        let catalog = load_or_empty(&config.catalog_path);
        tracing::info!(
            entries = catalog.len(),
            path = %config.catalog_path.display(),
            "catalog loaded"
        );
        let assets = RenderAssets::load(&config.assets, config.session.video.canvas)?;
        let sessions = SessionManager::new(catalog, Arc::new(assets), config.session.clone())?;
        Ok(Self { sessions })
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/g1000-data", get(handlers::catalog))
        .route("/search", get(handlers::search))
        .route("/generate-wheel", post(handlers::generate_wheel))
        .route("/status/{session_id}", get(handlers::status))
        .route("/progress/{session_id}", get(handlers::progress))
        .route("/download/{session_id}", get(handlers::download))
        .route("/session/{session_id}", delete(handlers::delete_session));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Serve until SIGINT/SIGTERM, then cancel running sessions and stop the retention task.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let sessions = state.sessions.clone();

    let retention_cancel = sessions.shutdown_token().child_token();
    let retention_handle = tokio::spawn(retention::run(
        sessions.clone(),
        retention::sweep_interval(config.session.ttl),
        retention_cancel.clone(),
    ));

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("invalid HOST '{}'", config.host))?;
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped accepting connections");
    sessions.shutdown();
    retention_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
