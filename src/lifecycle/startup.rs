//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (metrics exporter, signal handler)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last (traffic only when ready)

use thiserror::Error;

use crate::config::{DevConfig, ValidationError};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::{bind_listener, ListenerError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid route table: {0}")]
    Routes(#[from] ValidationError),

    #[error("invalid observability.metricsAddress {0:?}")]
    MetricsAddress(String),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the development server until a stop signal arrives.
pub async fn start_dev_server(config: DevConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);
    run_dev_server(config, &shutdown).await
}

/// Run the development server until `shutdown` is triggered.
pub async fn run_dev_server(config: DevConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let server = HttpServer::new(config)?;
    let listener = bind_listener(&server.config().server).await?;
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
