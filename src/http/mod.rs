//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing)
//!     → request.rs (validate, assign request ID)
//!     → [routing table decides: proxy or local]
//!     → request.rs (rewrite URI / Host for the backend)
//!     → response.rs (relay, strip hop-by-hop headers, map errors)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ForwardError;
pub use server::HttpServer;
