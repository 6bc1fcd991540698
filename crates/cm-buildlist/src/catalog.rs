//! Device to build list mapping.

use crate::build::Build;
use std::collections::HashMap;

/// In-memory catalog of builds, indexed by device codename.
///
/// Device codenames are case-sensitive. Builds keep the order in which the
/// source produced them.
#[derive(Debug, Clone)]
pub struct BuildCatalog {
    /// Builds indexed by device codename
    builds_by_device: HashMap<String, Vec<Build>>,

    /// Total number of builds
    total_builds: usize,
}

impl BuildCatalog {
    /// Create a catalog from already grouped builds.
    #[must_use]
    pub fn new(builds_by_device: HashMap<String, Vec<Build>>) -> Self {
        let total_builds = builds_by_device.values().map(Vec::len).sum();
        Self {
            builds_by_device,
            total_builds,
        }
    }

    /// Group `(device, build)` pairs into a catalog, keeping per-device order.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, Build)>,
    {
        let mut builds_by_device: HashMap<String, Vec<Build>> = HashMap::new();
        for (device, build) in pairs {
            builds_by_device.entry(device).or_default().push(build);
        }
        Self::new(builds_by_device)
    }

    /// Builds for a device, empty if the device is unknown.
    #[must_use]
    pub fn builds(&self, device: &str) -> &[Build] {
        self.builds_by_device
            .get(device)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All device codenames in the catalog.
    pub fn devices(&self) -> Vec<&str> {
        self.builds_by_device.keys().map(String::as_str).collect()
    }

    /// Number of devices in the catalog.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.builds_by_device.len()
    }

    /// Total number of builds across all devices.
    #[must_use]
    pub const fn total_builds(&self) -> usize {
        self.total_builds
    }

    /// Whether the catalog holds no builds at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_builds == 0
    }
}

impl Default for BuildCatalog {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}
