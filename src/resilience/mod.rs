//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (enforce request deadline)
//!     → On failure: gateway error back to the client
//! ```
//!
//! # Design Decisions
//! - Every backend call has a deadline
//! - No retries: a dev proxy surfaces backend failures as they happen

pub mod timeouts;

pub use timeouts::with_deadline;
