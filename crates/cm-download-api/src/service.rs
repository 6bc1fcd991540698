//! Build catalog service used by the API layer.
//!
//! The service owns the decision of whether one build source instance is
//! shared by every request (its lazy cache is then populated once per
//! process) or a fresh instance is created per request.

use crate::config::{ServerConfig, SourceMode};
use cm_buildlist::{Build, BuildListError, BuildSource, FileBuildSource, FileFormat, FolderBuildSource};
use std::path::PathBuf;
use std::sync::Arc;

/// Recipe for constructing a build source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Structured build list file
    File {
        /// Build list path
        path: PathBuf,
        /// Explicit format, otherwise inferred from the extension
        format: Option<FileFormat>,
    },
    /// Download directory tree
    Folder {
        /// Root directory holding one subdirectory per device
        root: PathBuf,
        /// Public URL prefix of `root`
        base_url: String,
    },
}

impl SourceSpec {
    /// Construct a new, unpopulated source.
    #[must_use]
    pub fn create(&self) -> Arc<dyn BuildSource> {
        match self {
            Self::File {
                path,
                format: Some(format),
            } => Arc::new(FileBuildSource::with_format(path.clone(), *format)),
            Self::File { path, format: None } => Arc::new(FileBuildSource::new(path.clone())),
            Self::Folder { root, base_url } => {
                Arc::new(FolderBuildSource::new(root.clone(), base_url.clone()))
            }
        }
    }
}

#[derive(Debug)]
enum Provider {
    Shared(Arc<dyn BuildSource>),
    PerRequest(SourceSpec),
}

/// Resolves build lists for API calls.
#[derive(Debug)]
pub struct BuildCatalogService {
    provider: Provider,
}

impl BuildCatalogService {
    /// Serve every request from the same source instance.
    #[must_use]
    pub fn shared(source: Arc<dyn BuildSource>) -> Self {
        Self {
            provider: Provider::Shared(source),
        }
    }

    /// Build a fresh source from `spec` for every request.
    #[must_use]
    pub const fn per_request(spec: SourceSpec) -> Self {
        Self {
            provider: Provider::PerRequest(spec),
        }
    }

    /// Compose the service described by the configuration.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        let spec = config.source_spec();
        match config.source_mode {
            SourceMode::Shared => Self::shared(spec.create()),
            SourceMode::PerRequest => Self::per_request(spec),
        }
    }

    /// Whether requests share one source instance.
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        matches!(self.provider, Provider::Shared(_))
    }

    /// The source answering the next request.
    #[must_use]
    pub fn source(&self) -> Arc<dyn BuildSource> {
        match &self.provider {
            Provider::Shared(source) => Arc::clone(source),
            Provider::PerRequest(spec) => spec.create(),
        }
    }

    /// All builds for `device`, with `channel` passed through to the source.
    ///
    /// # Errors
    ///
    /// Returns `BuildListError` if the backing store cannot be loaded.
    pub fn all_builds(&self, device: &str, channel: &str) -> Result<Vec<Build>, BuildListError> {
        let builds = self.source().get_builds(device, channel)?;
        tracing::debug!("Resolved {} builds for device {}", builds.len(), device);
        Ok(builds)
    }
}
