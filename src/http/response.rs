//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay backend responses to the client
//! - Strip hop-by-hop headers
//! - Map forwarding failures to gateway status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Backend timeouts result in 504 Gateway Timeout
//! - Every other upstream failure results in 502 Bad Gateway
//! - A client body cut off by the size limit results in 413, not 502

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

const PROXY_CONNECTION: &str = "proxy-connection";

/// Why a request could not be forwarded.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The request was rejected before any upstream contact.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The client body grew past `server.maxBodySize` while streaming.
    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,

    /// Connecting to or exchanging with the backend failed.
    #[error("upstream request failed: {0}")]
    Connect(String),

    /// The backend did not answer within the deadline.
    #[error("upstream timed out after {0} seconds")]
    Timeout(u64),
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ForwardError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ForwardError::Connect(_) => StatusCode::BAD_GATEWAY,
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidRequest(_) => "invalid_request",
            ForwardError::PayloadTooLarge => "payload_too_large",
            ForwardError::Connect(_) => "connect",
            ForwardError::Timeout(_) => "timeout",
        }
    }

    /// Whether the backend, rather than the client, is at fault.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ForwardError::Connect(_) | ForwardError::Timeout(_))
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let body = match &self {
            ForwardError::InvalidRequest(reason) => format!("Bad request: {reason}"),
            ForwardError::PayloadTooLarge => "Request body too large".to_string(),
            ForwardError::Connect(_) => "Upstream request failed".to_string(),
            ForwardError::Timeout(_) => "Upstream timed out".to_string(),
        };
        (self.status(), body).into_response()
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(PROXY_CONNECTION);
}

/// Turn a backend response into the client response, streaming the body.
pub fn relay<B>(response: axum::http::Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
