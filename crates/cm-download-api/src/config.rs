//! Server configuration management.
//!
//! Configuration is loaded from CLI arguments, `CM_DOWNLOAD_*` environment
//! variables and defaults, then checked with [`ServerConfig::validate`].
//!
//! # Example
//!
//! ```no_run
//! use cm_download_api::ServerConfig;
//!
//! let config = ServerConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("HTTP server will bind to: {}", config.http_bind);
//! println!("Build source: {:?}", config.source_spec());
//! ```

use crate::error::ConfigError;
use crate::service::SourceSpec;
use clap::{Parser, ValueEnum};
use cm_buildlist::FileFormat;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Which backing store answers build queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// A single structured build list file
    File,
    /// A download directory tree of build artifacts
    Folder,
}

/// How the build source is shared between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceMode {
    /// One source instance for the process; its cache is reused
    Shared,
    /// A fresh source for every request
    PerRequest,
}

/// Server configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cm-download-api",
    about = "JSON download API serving build catalogs to update clients",
    version
)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "CM_DOWNLOAD_HTTP_BIND", default_value = "0.0.0.0:8080")]
    pub http_bind: SocketAddr,

    /// Build source backend
    #[arg(long, env = "CM_DOWNLOAD_SOURCE", value_enum, default_value_t = SourceKind::File)]
    pub source: SourceKind,

    /// Whether the build source is shared across requests
    #[arg(long, env = "CM_DOWNLOAD_SOURCE_MODE", value_enum, default_value_t = SourceMode::Shared)]
    pub source_mode: SourceMode,

    /// Build list file (file source)
    #[arg(long, env = "CM_DOWNLOAD_BUILDS_FILE", default_value = "/var/lib/cm/builds.yaml")]
    pub builds_file: PathBuf,

    /// Build list format, inferred from the extension when omitted
    #[arg(long, env = "CM_DOWNLOAD_BUILDS_FORMAT")]
    pub builds_format: Option<FileFormat>,

    /// Root of the download tree (folder source)
    #[arg(long, env = "CM_DOWNLOAD_ROOT", default_value = "/var/www/cm")]
    pub download_root: PathBuf,

    /// Public URL prefix of the download tree (folder source)
    #[arg(
        long,
        env = "CM_DOWNLOAD_BASE_URL",
        default_value = "http://cm.example.net/get"
    )]
    pub download_base_url: String,
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Describe the configured build source.
    #[must_use]
    pub fn source_spec(&self) -> SourceSpec {
        match self.source {
            SourceKind::File => SourceSpec::File {
                path: self.builds_file.clone(),
                format: self.builds_format,
            },
            SourceKind::Folder => SourceSpec::Folder {
                root: self.download_root.clone(),
                base_url: self.download_base_url.clone(),
            },
        }
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the file source is selected and the builds file doesn't exist
    /// - the folder source is selected and the download root is not a directory
    /// - the folder source is selected with an empty base URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.source {
            SourceKind::File => {
                if !self.builds_file.is_file() {
                    return Err(ConfigError::MissingRequired(format!(
                        "builds file not found: {}",
                        self.builds_file.display()
                    )));
                }
            }
            SourceKind::Folder => {
                if !self.download_root.is_dir() {
                    return Err(ConfigError::MissingRequired(format!(
                        "download root not found: {}",
                        self.download_root.display()
                    )));
                }
                if self.download_base_url.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        name: "download base URL",
                        reason: "must not be empty".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
