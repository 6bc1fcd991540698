//! Build list resolution for the CM download API.
//!
//! This crate answers "which builds exist for device X" from one of two
//! backing stores:
//! - [`FileBuildSource`]: a single JSON, YAML, CSV or XML build list, parsed
//!   once on first use
//! - [`FolderBuildSource`]: a live download directory whose artifacts are
//!   inspected (mtime, `.md5sum` sidecar, `system/build.prop` inside the zip)
//!
//! Both implement [`BuildSource`] and cache what they load, so a single
//! instance can be shared between concurrent requests.
//!
//! # Example
//!
//! ```no_run
//! use cm_buildlist::{BuildSource, FileBuildSource, DEFAULT_CHANNEL};
//!
//! let source = FileBuildSource::new("/var/lib/cm/builds.yaml");
//! for build in source.get_builds("shamu", DEFAULT_CHANNEL)? {
//!     println!("{:?} {:?}", build.filename, build.md5sum);
//! }
//! # Ok::<(), cm_buildlist::BuildListError>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod build;
pub mod catalog;
pub mod error;
pub mod file;
pub mod folder;
pub mod source;

pub use build::{Build, DEFAULT_CHANNEL, incremental_for};
pub use catalog::BuildCatalog;
pub use error::BuildListError;
pub use file::{FileBuildSource, FileFormat, ParseFormatError};
pub use folder::FolderBuildSource;
pub use source::BuildSource;
