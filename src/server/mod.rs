//! HTTP API for the dashboard.
//!
//! Routes live under `/api` and share the [`Runtime`] as axum state. Every failure is
//! rendered as a JSON `{ "error": .. }` body by [`error::ApiError`].

pub mod error;
pub mod routes;

use anyhow::Context;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

use crate::{base::types::Void, runtime::Runtime};

use routes::{chat, emails, fees};

/// Build the API router over `runtime`.
pub fn router(runtime: Runtime) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // Fees.
        .route("/api/destinations", get(fees::destinations))
        .route("/api/fees/estimate", post(fees::estimate))
        .route("/api/locations/custom", post(fees::custom_location))
        .route("/api/locations/search", get(fees::search_locations))
        // Inbox.
        .route("/api/emails", get(emails::sync))
        .route("/api/emails/stored", get(emails::stored))
        .route("/api/emails/events", get(emails::events))
        .route("/api/emails/{id}/seen", post(emails::mark_seen))
        .route("/api/reply", post(emails::draft_reply))
        .route("/api/send", post(emails::send))
        .route("/api/summarize", post(emails::summarize))
        .route("/api/dashboard/summary", get(emails::dashboard_summary))
        // Sales assistant.
        .route("/api/chat/greeting", get(chat::greeting))
        .route("/api/chat", post(chat::chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(runtime)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM.
#[instrument(name = "server::serve", skip_all, fields(address = %runtime.config.bind_address))]
pub async fn serve(runtime: Runtime) -> Void {
    let address = runtime.config.bind_address.clone();

    let listener = TcpListener::bind(&address).await.with_context(|| format!("Failed to bind `{address}`"))?;
    info!("Server running on {address}");

    axum::serve(listener, router(runtime)).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server shut down.");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                warn!("Failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
