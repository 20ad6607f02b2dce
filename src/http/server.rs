//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Resolve every request and turn the target into a response
//! - Forward rewritten and unresolved requests to the upstream
//! - Stop accepting on shutdown and drain in-flight requests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RedirectConfig;
use crate::http::request::{request_id, request_id_header, UuidRequestId, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::Resolver;
use crate::rules::ActionType;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub client: Client<HttpConnector, Body>,
    /// Upstream authority (`host:port`), if configured.
    pub upstream: Option<Arc<str>>,
}

/// HTTP front end of the resolver.
pub struct HttpServer {
    router: Router,
    config: RedirectConfig,
}

impl HttpServer {
    /// Create a new HTTP server around a resolver.
    pub fn new(config: RedirectConfig, resolver: Arc<Resolver>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            resolver,
            client,
            upstream: config.upstream.address.as_deref().map(Arc::from),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RedirectConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = ?self.config.upstream.address,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RedirectConfig {
        &self.config
    }
}

/// Resolve the request and redirect, forward or pass it through.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(request.headers()).to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let resolved = state.resolver.resolve_request(&path, query.as_deref());

    let response = match resolved {
        Some(target) => {
            tracing::info!(
                request_id = %request_id,
                path = %path,
                action = target.action.label(),
                target = %target.url,
                "Request resolved"
            );
            match target.action {
                ActionType::Redirect => response::redirect(StatusCode::FOUND, &target.url),
                ActionType::PermanentRedirect => {
                    response::redirect(StatusCode::MOVED_PERMANENTLY, &target.url)
                }
                ActionType::Forward => {
                    let path_and_query = with_query(&target.url, query.as_deref());
                    forward(&state, request, &path_and_query, &request_id).await
                }
            }
        }
        None => match state.upstream {
            Some(_) => {
                let path_and_query = with_query(&path, query.as_deref());
                forward(&state, request, &path_and_query, &request_id).await
            }
            None => {
                tracing::debug!(request_id = %request_id, path = %path, "No rule and no upstream");
                response::not_found()
            }
        },
    };

    metrics::record_http_request(response.status().as_u16());
    response
}

/// Append the original query unless the target carries its own.
fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() && !path.contains('?') => format!("{}?{}", path, q),
        _ => path.to_string(),
    }
}

/// Send the request to the upstream at `path_and_query`.
async fn forward(
    state: &AppState,
    request: Request<Body>,
    path_and_query: &str,
    request_id: &str,
) -> Response {
    let Some(upstream) = state.upstream.as_deref() else {
        tracing::warn!(request_id = %request_id, target = %path_and_query, "Forward without upstream");
        return response::bad_gateway("No upstream configured");
    };

    let uri = match format!("http://{}{}", upstream, path_and_query).parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, target = %path_and_query, error = %e, "Invalid forward URI");
            return response::bad_gateway("Invalid forward target");
        }
    };

    let (mut parts, body) = request.into_parts();
    parts.uri = uri;
    if let Ok(value) = HeaderValue::from_str(request_id) {
        parts.headers.insert(X_REQUEST_ID, value);
    }

    tracing::debug!(request_id = %request_id, upstream = %upstream, target = %path_and_query, "Forwarding request");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(upstream_response) => {
            let (parts, body) = upstream_response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream, error = %e, "Upstream error");
            response::bad_gateway("Upstream request failed")
        }
    }
}
