//! Server state management and orchestration.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::{Endpoint, api_routes};
use crate::routing::RouteTable;
use crate::service::BuildCatalogService;
use std::sync::Arc;

/// Shared application state for HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// Build catalog service
    service: BuildCatalogService,

    /// API route table
    routes: RouteTable<Endpoint>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Sources are lazy, so no build list is read here.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the route table cannot be built.
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        tracing::info!(
            "Using {:?} build source ({:?})",
            config.source,
            config.source_mode
        );

        Self::with_service(BuildCatalogService::from_config(config))
    }

    /// Create application state around an existing service.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the route table cannot be built.
    pub fn with_service(service: BuildCatalogService) -> Result<Self, ServerError> {
        Ok(Self {
            service,
            routes: api_routes()?,
        })
    }

    /// Get the build catalog service.
    #[must_use]
    pub const fn service(&self) -> &BuildCatalogService {
        &self.service
    }

    /// Get the API route table.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable<Endpoint> {
        &self.routes
    }
}

/// Server orchestration.
pub struct Server {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl Server {
    /// Create new server with configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the application state cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let state = AppState::new(&config)?;

        tracing::info!(
            "Server initialized with {} routes",
            state.routes().len()
        );

        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    /// Run the HTTP server until Ctrl-C or an error.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the shutdown signal cannot
    /// be awaited.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting CM download API");
        tracing::info!("HTTP server binding to: {}", self.config.http_bind);

        let http_bind = self.config.http_bind;
        let http_server = tokio::spawn(crate::http::start_server(http_bind, self.state));

        tokio::select! {
            result = http_server => {
                return match result {
                    Ok(served) => served,
                    Err(e) => Err(ServerError::Shutdown(format!("HTTP server task failed: {e}"))),
                };
            }
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|e| {
                    ServerError::Shutdown(format!("Failed to listen for shutdown signal: {e}"))
                })?;
            }
        }

        tracing::info!("Shutdown signal received, stopping server");
        Ok(())
    }

    /// Get shared application state (for testing).
    #[cfg(test)]
    #[must_use]
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}
