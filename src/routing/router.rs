//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (the table holds a handful of entries)
//! - Longest prefix wins; equal lengths keep table order
//! - Explicit None rather than silent default

use axum::body::Body;
use axum::http::Request;

use crate::config::schema::ServerOptions;
use crate::config::validation::ValidationError;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};
use crate::routing::origin::Origin;

/// One compiled proxy rule.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    matcher: PathPrefixMatcher,
    target: Origin,
    rewrite_host: bool,
}

impl RouteEntry {
    pub fn new(prefix: impl Into<String>, target: Origin, rewrite_host: bool) -> Self {
        Self {
            matcher: PathPrefixMatcher::new(prefix),
            target,
            rewrite_host,
        }
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn target(&self) -> &Origin {
        &self.target
    }

    /// Whether the forwarded Host header is replaced with the target authority.
    pub fn rewrite_host(&self) -> bool {
        self.rewrite_host
    }
}

/// Immutable table of proxy routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteEntry>) -> Self {
        Self { routes }
    }

    /// Compile the `server.proxy` section.
    pub fn from_config(server: &ServerOptions) -> Result<Self, ValidationError> {
        let routes = server
            .proxy
            .iter()
            .map(|(prefix, rule)| {
                let target = Origin::parse(rule.target()).map_err(|reason| {
                    ValidationError::InvalidTarget {
                        prefix: prefix.clone(),
                        target: rule.target().to_string(),
                        reason,
                    }
                })?;
                Ok(RouteEntry::new(prefix.clone(), target, rule.change_origin()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(routes))
    }

    /// Find the entry with the longest prefix of `path`.
    pub fn match_path(&self, path: &str) -> Option<&RouteEntry> {
        self.most_specific(|route| route.matcher.matches_path(path))
    }

    /// Find the entry for `req`; the query string is ignored.
    pub fn match_request(&self, req: &Request<Body>) -> Option<&RouteEntry> {
        self.most_specific(|route| route.matcher.matches(req))
    }

    // Equal specificity keeps the earlier entry.
    fn most_specific<F>(&self, matches: F) -> Option<&RouteEntry>
    where
        F: Fn(&RouteEntry) -> bool,
    {
        let mut best: Option<&RouteEntry> = None;
        for route in self.routes.iter().filter(|route| matches(route)) {
            let better = match best {
                None => true,
                Some(current) => route.matcher.specificity() > current.matcher.specificity(),
            };
            if better {
                best = Some(route);
            }
        }
        best
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
