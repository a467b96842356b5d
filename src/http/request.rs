//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Validate request line and headers before forwarding
//! - Prepare request for forwarding to backend
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied x-request-id is kept
//! - The request body is never buffered; it streams to the backend

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Request, Version};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

use crate::http::response::{strip_hop_by_hop, ForwardError};
use crate::routing::RouteEntry;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a fresh UUID v4 for requests that arrive without an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Layer that stamps `x-request-id` on incoming requests.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuidV4> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4)
}

/// Layer that copies `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Read access to the request id header.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Reject requests that cannot be forwarded faithfully.
pub fn validate_request<B>(req: &Request<B>) -> Result<(), ForwardError> {
    let path = req.uri().path();
    if !path.starts_with('/') {
        return Err(ForwardError::InvalidRequest(format!(
            "request target {:?} is not an absolute path",
            path
        )));
    }

    if let Some(host) = req.headers().get(header::HOST) {
        let valid = !host.is_empty()
            && host
                .as_bytes()
                .iter()
                .all(|b| b.is_ascii_graphic());
        if !valid {
            return Err(ForwardError::InvalidRequest("malformed Host header".to_string()));
        }
    }

    if let Some(length) = req.headers().get(header::CONTENT_LENGTH) {
        let parsed = length
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok());
        if parsed.is_none() {
            return Err(ForwardError::InvalidRequest("malformed Content-Length header".to_string()));
        }
    }

    Ok(())
}

/// Rewrite a client request so it can be sent to the route's target.
///
/// Method, path, query, headers and body are kept; only the URI authority,
/// hop-by-hop headers and (when the route asks for it) Host change.
pub fn build_upstream_request(
    req: Request<Body>,
    route: &RouteEntry,
) -> Result<Request<Body>, ForwardError> {
    let (mut parts, body) = req.into_parts();

    // HTTP/2 clients carry the host in :authority, not a Host header.
    if !parts.headers.contains_key(header::HOST) {
        if let Some(authority) = parts.uri.authority() {
            let host = HeaderValue::from_str(authority.as_str())
                .map_err(|e| ForwardError::InvalidRequest(e.to_string()))?;
            parts.headers.insert(header::HOST, host);
        }
    }

    parts.uri = route
        .target()
        .uri_for(parts.uri.path_and_query())
        .map_err(|e| ForwardError::InvalidRequest(e.to_string()))?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);

    if route.rewrite_host() {
        let host = HeaderValue::from_str(route.target().authority())
            .map_err(|e| ForwardError::InvalidRequest(e.to_string()))?;
        parts.headers.insert(header::HOST, host);
    }

    Ok(Request::from_parts(parts, body))
}
