//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! server.host + server.port (+ strictPort)
//!     → listener.rs (resolve address, bind with port fallback)
//!     → Hand off to HTTP layer
//! ```

pub mod listener;

pub use listener::{bind_listener, ListenerError};
