//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (request ID, tracing, body limit)
//! - Bind server to listener
//! - Dispatch requests to the route table
//! - Forward matched requests to their backend origin
//! - Serve unmatched requests from the local asset root

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::{
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::{DevConfig, ValidationError};
use crate::http::request::{
    build_upstream_request, propagate_request_id_layer, set_request_id_layer, validate_request,
    RequestIdExt,
};
use crate::http::response::{relay, ForwardError};
use crate::observability::metrics::{self, LOCAL_ROUTE};
use crate::resilience::with_deadline;
use crate::routing::{RouteEntry, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub client: Client<HttpConnector, Body>,
    pub local: ServeDir<ServeFile>,
    pub request_timeout_secs: u64,
}

/// Development HTTP server: proxy table in front of the local asset root.
pub struct HttpServer {
    router: Router,
    config: Arc<DevConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: DevConfig) -> Result<Self, ValidationError> {
        let routes = Arc::new(RouteTable::from_config(&config.server)?);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let root = Path::new(&config.server.root);
        let local = ServeDir::new(root).fallback(ServeFile::new(root.join("index.html")));

        for route in routes.routes() {
            tracing::info!(
                prefix = %route.prefix(),
                target = %route.target(),
                rewrite_host = route.rewrite_host(),
                "Proxy route registered"
            );
        }

        let state = AppState {
            routes,
            client,
            local,
            request_timeout_secs: config.timeouts.request_secs,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config: Arc::new(config),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &DevConfig, state: AppState) -> Router {
        let mut router = Router::new().fallback(dispatch).with_state(state);

        if let Some(limit) = config.server.max_body_size {
            router = router.layer(RequestBodyLimitLayer::new(limit));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        request_id = %req.request_id(),
                    )
                }))
                .layer(propagate_request_id_layer()),
        )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.server.proxy.len(),
            root = %self.config.server.root,
            "Dev server listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Dev server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DevConfig {
        &self.config
    }

    /// The assembled router, for serving without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Entry point for every request: validate, match, then forward or serve locally.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    if let Err(e) = validate_request(&request) {
        tracing::warn!(request_id = %request_id, path = %path, error = %e, "Rejected malformed request");
        metrics::record_request(&method, e.status().as_u16(), "invalid", start_time);
        return e.into_response();
    }

    let Some(route) = state.routes.match_request(&request) else {
        let response = serve_local(&state, request).await;
        metrics::record_request(&method, response.status().as_u16(), LOCAL_ROUTE, start_time);
        return response;
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        prefix = %route.prefix(),
        target = %route.target(),
        "Proxying request"
    );

    match forward(&state, route, request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), route.prefix(), start_time);
            response
        }
        Err(e) if e.is_upstream() => {
            tracing::error!(
                request_id = %request_id,
                prefix = %route.prefix(),
                target = %route.target(),
                error = %e,
                "Proxy error"
            );
            metrics::record_upstream_error(e.kind());
            metrics::record_request(&method, e.status().as_u16(), route.prefix(), start_time);
            e.into_response()
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Rejected request");
            metrics::record_request(&method, e.status().as_u16(), route.prefix(), start_time);
            e.into_response()
        }
    }
}

/// Send the request to the route's target and stream the answer back.
async fn forward(
    state: &AppState,
    route: &RouteEntry,
    request: Request<Body>,
) -> Result<Response, ForwardError> {
    let upstream = build_upstream_request(request, route)?;
    let response = with_deadline(state.request_timeout_secs, state.client.request(upstream)).await?;
    Ok(relay(response))
}

/// Static asset or single-page-app fallback.
async fn serve_local(state: &AppState, request: Request<Body>) -> Response {
    match state.local.clone().oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
