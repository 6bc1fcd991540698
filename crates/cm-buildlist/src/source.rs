//! The build source capability shared by all catalog backends.

use crate::build::Build;
use crate::error::BuildListError;
use std::fmt::Debug;

/// Answers "which builds exist for this device on this channel".
///
/// Implementations populate lazily and cache what they found, so they must
/// be safe to share between concurrent requests.
pub trait BuildSource: Send + Sync + Debug {
    /// Return the builds for `device`.
    ///
    /// An unknown device yields an empty list. `channel` does not filter the
    /// result; sources that derive builds from artifacts stamp it on each
    /// build.
    ///
    /// # Errors
    ///
    /// Returns `BuildListError` if the backing store cannot be read or has an
    /// unsupported format.
    fn get_builds(&self, device: &str, channel: &str) -> Result<Vec<Build>, BuildListError>;
}
