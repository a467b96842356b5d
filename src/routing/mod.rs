//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate prefix conditions)
//!     → Return: matched RouteEntry or None (served locally)
//!
//! Route Compilation (at startup):
//!     server.proxy
//!     → origin.rs (validate targets)
//!     → Compile prefix matchers
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Longest prefix wins

pub mod matcher;
pub mod origin;
pub mod router;

pub use origin::Origin;
pub use router::{RouteEntry, RouteTable};
