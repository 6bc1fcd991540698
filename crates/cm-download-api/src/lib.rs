//! CM download API server.
//!
//! Serves the build catalog produced by [`cm_buildlist`] to update clients
//! over a small JSON API:
//! - `POST /api` with `{"method": "get_all_builds", "params": {"device": ".."}}`
//! - `POST /api/v1/<resource>/<call>` naming the call in the path
//!
//! # Architecture
//!
//! - `config`: CLI and environment configuration
//! - `routing`: `"METHODS /path/@param"` route patterns and the route table
//! - `service`: shared or per-request build source composition
//! - `api`: call allow-list and JSON envelopes
//! - `http`: axum server and the dispatching handler
//! - `server`: application state and orchestration
//!
//! # Example
//!
//! ```no_run
//! use cm_download_api::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = ServerConfig::from_args();
//!     config.validate()?;
//!
//!     let server = Server::new(config)?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod routing;
pub mod server;
pub mod service;

pub use api::{ApiCall, ApiParams, ApiRequest, ApiResponse, CallResponse, DeltaResponse};
pub use config::{ServerConfig, SourceKind, SourceMode};
pub use error::{ConfigError, RouteError, ServerError};
pub use routing::{RouteMatch, RoutePattern, RouteTable};
pub use server::{AppState, Server};
pub use service::{BuildCatalogService, SourceSpec};
