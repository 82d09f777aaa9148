//! Library root for `dispatch-desk`.
//!
//! Dispatch-desk is the backend of a delivery business dashboard designed to:
//! - Estimate delivery fees from a home base to named or custom destinations
//! - Sync, classify and answer the business inbox with OpenAI assistance
//! - Back a sales assistant chat
//!
//! The service exposes an axum HTTP API, stores inbox state in SurrealDB,
//! reads mail over IMAP and sends it over SMTP. The architecture is built around
//! extensible traits that allow for different implementations of each service.

pub mod base;
pub mod interaction;
pub mod prelude;
pub mod pricing;
pub mod runtime;
pub mod server;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the dispatch-desk runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with database, LLM, mail and geocoding clients
/// - Starts the inbox poller and the HTTP server
pub async fn start(config: Config) -> Void {
    info!("Starting dispatch-desk ...");

    // Start the crypto provider; it may already be installed by a dependency.
    let _ = crypto::ring::default_provider().install_default();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
