//! HTTP server implementation using axum.
//!
//! The API has a single fallback handler; paths are resolved through the
//! [`RouteTable`] built by [`api_routes`] rather than axum's router.

use crate::error::{RouteError, ServerError};
use crate::routing::RouteTable;
use crate::server::AppState;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;

/// Path of the JSON envelope endpoint.
pub const ENVELOPE_PATH: &str = "/api";

/// Prefix of the versioned endpoints.
pub const VERSIONED_PREFIX: &str = "/api/v1/";

/// What a matched route is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `POST /api` with the call named in a JSON envelope
    Envelope,
    /// `POST /api/v1/.../<call>` with the call named by the last segment
    Versioned,
}

/// Route table of the download API.
///
/// Versioned paths deeper than two segments are not listed; they are
/// recognised by [`is_versioned_path`].
///
/// # Errors
///
/// Returns `RouteError` if a pattern fails to compile.
pub fn api_routes() -> Result<RouteTable<Endpoint>, RouteError> {
    let mut routes = RouteTable::new();
    routes
        .add("POST /api", Endpoint::Envelope)?
        .add("POST /api/v1/@call", Endpoint::Versioned)?
        .add("POST /api/v1/@resource/@call", Endpoint::Versioned)?;
    Ok(routes)
}

/// Whether `path` lies under the versioned API prefix.
#[must_use]
pub fn is_versioned_path(path: &str) -> bool {
    path.starts_with(VERSIONED_PREFIX)
}

/// Call name of a versioned path: its last non-empty segment.
#[must_use]
pub fn versioned_call(path: &str) -> Option<&str> {
    path.strip_prefix(VERSIONED_PREFIX)?
        .split('/')
        .rfind(|segment| !segment.is_empty())
}

/// Create HTTP router serving the API.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handlers::handle_request)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start HTTP server.
///
/// # Errors
///
/// Returns `ServerError` if the server fails to bind or encounters a runtime error.
pub async fn start_server(bind_addr: SocketAddr, state: Arc<AppState>) -> Result<(), ServerError> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::HttpBindFailed {
            addr: bind_addr,
            source,
        })?;

    tracing::info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Shutdown(format!("HTTP server error: {e}")))?;

    Ok(())
}
