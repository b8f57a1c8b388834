//! Server execution logic.
//!
//! Wires the validated configuration into a relay and serves it until a
//! shutdown signal arrives.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

use webhook_relay::config::ValidatedConfig;
use webhook_relay::forward::{Forwarder, ReqwestClient};
use webhook_relay::relay::{
    DistributionStrategy, Relay, RelayMode, RetentionQueue, SecondaryRegistry,
};
use webhook_relay::server::{AppState, build_router};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to build the outbound HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Failed to bind the listen address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The server stopped with an error.
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

/// Builds the distribution strategy selected by the configuration.
///
/// Fan-out starts with the configured secondaries registered; retention
/// starts with an empty queue.
pub fn build_strategy(config: &ValidatedConfig) -> DistributionStrategy {
    match config.mode {
        RelayMode::FanOut => DistributionStrategy::fan_out(Arc::new(
            SecondaryRegistry::with_endpoints(config.secondaries.iter().cloned()),
        )),
        RelayMode::Retention => DistributionStrategy::retention(Arc::new(RetentionQueue::new())),
    }
}

/// Executes the server until shutdown.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be created
/// - The listen address cannot be bound
/// - The server fails while running
///
/// Excluded from coverage - requires a real listener and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let client = ReqwestClient::for_relay().map_err(RunError::HttpClient)?;
    let strategy = build_strategy(&config);
    let relay = Relay::new(
        Forwarder::new(client),
        config.production_url.clone(),
        strategy,
    );

    if !config.secondaries.is_empty() && config.mode == RelayMode::Retention {
        tracing::warn!(
            count = config.secondaries.len(),
            "Secondary destinations are ignored in retention mode"
        );
    }

    let router = build_router(AppState::new(Arc::new(relay), config.poll_secret));

    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|source| RunError::Bind {
            addr: config.listen,
            source,
        })?;

    tracing::info!(
        listen = %config.listen,
        mode = %config.mode,
        production = %config.production_url,
        "Webhook relay listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(RunError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Returns a future that completes when a shutdown signal is received.
///
/// If a handler cannot be installed, that signal source is logged and
/// ignored rather than triggering shutdown.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received, stopping...");
}
