//! TCP listener for the development server.
//!
//! # Responsibilities
//! - Resolve the bind address from `server.host`
//! - Bind `server.port`, or the next free port unless `strictPort` is set
//! - Report bind failures with the address that was tried

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;

use crate::config::ServerOptions;

/// How many ports above `server.port` are tried when it is taken.
pub const PORT_FALLBACK_ATTEMPTS: u16 = 10;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// `server.host` is not an IP address.
    InvalidHost(String),
    /// Failed to bind to address.
    Bind(SocketAddr, std::io::Error),
    /// Every candidate port was in use.
    PortsExhausted { first: u16, last: u16 },
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::InvalidHost(host) => write!(f, "Invalid server.host: {}", host),
            ListenerError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
            ListenerError::PortsExhausted { first, last } => {
                write!(f, "Ports {} through {} are all in use", first, last)
            }
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind the dev server listener.
pub async fn bind_listener(server: &ServerOptions) -> Result<TcpListener, ListenerError> {
    let ip: IpAddr = server
        .host
        .bind_ip()
        .map_err(|e| ListenerError::InvalidHost(e.to_string()))?;

    let first = server.port;
    let last = if server.strict_port {
        first
    } else {
        first.saturating_add(PORT_FALLBACK_ATTEMPTS)
    };

    for port in first..=last {
        let addr = SocketAddr::new(ip, port);
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if port != first {
                    tracing::warn!(requested = first, bound = port, "Port in use, using next free port");
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse && !server.strict_port => {
                tracing::debug!(port, "Port in use");
            }
            Err(e) => return Err(ListenerError::Bind(addr, e)),
        }
    }

    Err(ListenerError::PortsExhausted { first, last })
}
