//! Build lists derived from a live download directory.
//!
//! The directory tree is expected to look like this:
//!
//! ```text
//! <root>/
//!   shamu/
//!     cm-13.0-20160715-UNOFFICIAL-shamu.zip
//!     cm-13.0-20160715-UNOFFICIAL-shamu.zip.md5sum
//!     cm-13.0-20160715-UNOFFICIAL-shamu.changes
//!   titan/
//!     ...
//! ```
//!
//! Metadata comes from the artifacts themselves: the modification time, the
//! `md5sum`-style sidecar and the `system/build.prop` inside the zip.

use crate::build::{Build, loose_int_from_str};
use crate::error::{BuildListError, InspectError};
use crate::source::BuildSource;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::UNIX_EPOCH;
use zip::ZipArchive;

/// File name prefix of build artifacts.
pub const BUILD_PREFIX: &str = "cm-";

/// Archive entry holding the build properties.
pub const BUILD_PROP_PATH: &str = "system/build.prop";

const BUILD_SUFFIX: &str = ".zip";
const CHANGES_SUFFIX: &str = ".changes";
const MD5SUM_SUFFIX: &str = ".md5sum";

#[allow(clippy::expect_used)]
static MD5SUM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-f]{32}) ").expect("md5sum pattern is valid"));

#[allow(clippy::expect_used)]
static SDK_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ro\.build\.version\.sdk=([0-9]+)").expect("sdk pattern is valid")
});

/// Build source scanning `<root>/<device>` for build artifacts.
///
/// Each device is scanned once, on its first query, and the result is kept
/// for the lifetime of the source even if the directory changes afterwards.
/// The channel of that first query is stamped on the cached builds.
#[derive(Debug)]
pub struct FolderBuildSource {
    root: PathBuf,
    base_url: String,
    builds_by_device: Mutex<HashMap<String, Arc<[Build]>>>,
}

impl FolderBuildSource {
    /// Create a source for a download root served at `base_url`.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            root: root.into(),
            base_url,
            builds_by_device: Mutex::new(HashMap::new()),
        }
    }

    /// Filesystem root of the download tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Base URL the download root is served at, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether `device` has already been scanned.
    #[must_use]
    pub fn is_scanned(&self, device: &str) -> bool {
        self.builds_by_device.lock().contains_key(device)
    }

    fn url_for(&self, device: &str, filename: &str) -> String {
        format!("{}/{device}/{filename}", self.base_url)
    }

    /// List and inspect the artifacts of one device, sorted by file name.
    fn scan_device(&self, device: &str, channel: &str) -> Result<Vec<Build>, BuildListError> {
        if !is_plain_name(device) {
            tracing::debug!("Refusing to scan device with path-like name {device:?}");
            return Ok(Vec::new());
        }

        let dir = self.root.join(device);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let read_dir_failed = |source| BuildListError::ReadDirFailed {
            path: dir.clone(),
            source,
        };

        let mut filenames = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(read_dir_failed)? {
            let entry = entry.map_err(read_dir_failed)?;
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if is_build_filename(&filename) && entry.path().is_file() {
                filenames.push(filename);
            }
        }
        filenames.sort();

        let builds: Vec<Build> = filenames
            .iter()
            .map(|filename| self.inspect_artifact(device, &dir.join(filename), filename, channel))
            .collect();

        tracing::debug!("Found {} builds for {device} in {}", builds.len(), dir.display());
        Ok(builds)
    }

    /// Derive a build from one artifact. Failures only degrade fields.
    fn inspect_artifact(&self, device: &str, path: &Path, filename: &str, channel: &str) -> Build {
        let api_level = read_api_level(path).unwrap_or_else(|err| {
            tracing::warn!("Could not read API level from {}: {err}", path.display());
            0
        });

        Build {
            url: Some(self.url_for(device, filename)),
            filename: Some(filename.to_string()),
            timestamp: modified_timestamp(path),
            md5sum: read_md5sum(path),
            incremental: None,
            changes: Some(self.url_for(device, &changes_filename(filename))),
            channel: Some(channel.to_string()),
            api_level: Some(api_level),
        }
        .with_derived_incremental()
    }
}

impl BuildSource for FolderBuildSource {
    fn get_builds(&self, device: &str, channel: &str) -> Result<Vec<Build>, BuildListError> {
        let mut cache = self.builds_by_device.lock();
        if let Some(builds) = cache.get(device) {
            return Ok(builds.to_vec());
        }

        let builds: Arc<[Build]> = self.scan_device(device, channel)?.into();
        cache.insert(device.to_string(), Arc::clone(&builds));
        Ok(builds.to_vec())
    }
}

/// Whether a directory entry name looks like a build artifact.
#[must_use]
pub fn is_build_filename(filename: &str) -> bool {
    filename.starts_with(BUILD_PREFIX) && filename.ends_with(BUILD_SUFFIX)
}

/// A device name must stay inside the download root.
fn is_plain_name(device: &str) -> bool {
    let mut components = Path::new(device).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !device.contains(['/', '\\'])
}

fn changes_filename(filename: &str) -> String {
    let stem = filename.strip_suffix(BUILD_SUFFIX).unwrap_or(filename);
    format!("{stem}{CHANGES_SUFFIX}")
}

fn modified_timestamp(path: &Path) -> Option<i64> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let seconds = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(seconds).ok()
}

/// Extract the checksum from the first line of an `md5sum` output line.
fn parse_md5sum_line(line: &str) -> Option<String> {
    MD5SUM_LINE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read `<artifact>.md5sum`; a missing or unrecognized sidecar means unknown.
fn read_md5sum(path: &Path) -> Option<String> {
    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(MD5SUM_SUFFIX);

    let contents = std::fs::read_to_string(PathBuf::from(sidecar)).ok()?;
    parse_md5sum_line(contents.lines().next()?)
}

/// Read the platform API level from `system/build.prop` inside the archive.
///
/// The property file is extracted to an anonymous scratch file, which the
/// OS removes once it is dropped, whatever the outcome.
fn read_api_level(path: &Path) -> Result<i64, InspectError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entry = archive.by_name(BUILD_PROP_PATH)?;

    let mut scratch = tempfile::tempfile()?;
    std::io::copy(&mut entry, &mut scratch)?;
    scratch.rewind()?;

    let mut raw = Vec::new();
    scratch.read_to_end(&mut raw)?;
    let properties = String::from_utf8_lossy(&raw);

    SDK_VERSION
        .captures(&properties)
        .and_then(|caps| caps.get(1))
        .map(|m| loose_int_from_str(m.as_str()))
        .ok_or(InspectError::MissingProperty(BUILD_PROP_PATH))
}
