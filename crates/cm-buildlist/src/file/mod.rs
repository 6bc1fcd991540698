//! Build lists backed by a single structured file.
//!
//! Supported formats are JSON, YAML, CSV and XML. The JSON and YAML layouts
//! map device codenames to lists of build records:
//!
//! ```json
//! {
//!   "shamu": [
//!     {
//!       "url": "http://cm.example.net/get/shamu/cm-13.0-20160925-UNOFFICIAL-shamu.zip",
//!       "filename": "cm-13.0-20160925-UNOFFICIAL-shamu.zip",
//!       "timestamp": 1474932005,
//!       "md5sum": "96b3004abbaab6b3c90cde34a85be4b1",
//!       "changes": "http://cm.example.net/get/shamu/cm-13.0-20160925-UNOFFICIAL-shamu.changes",
//!       "channel": "nightly",
//!       "api_level": 23
//!     }
//!   ]
//! }
//! ```
//!
//! CSV and XML layouts are described in their loaders. JSON, YAML and CSV
//! decoding errors are hard errors; malformed XML yields an empty catalog.
//! The incremental identifier is always derived from the checksum, whatever
//! the file says.

mod csv_format;
mod xml_format;

use crate::build::Build;
use crate::catalog::BuildCatalog;
use crate::error::BuildListError;
use crate::source::BuildSource;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Structured build list file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// JSON object of device → record list
    Json,
    /// YAML mapping of device → record list
    Yaml,
    /// Headerless CSV, one build per row
    Csv,
    /// `<builds><device name=".."><build .../></device></builds>`
    Xml,
}

impl FileFormat {
    /// All supported formats.
    pub const ALL: [Self; 4] = [Self::Json, Self::Yaml, Self::Csv, Self::Xml];

    /// File extension associated with the format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }

    /// Look up a format by file extension (exact, without the dot).
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.extension() == extension)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Unknown build list format name.
#[derive(Debug, Clone, Error)]
#[error("unknown build list format '{0}' (expected json, yaml, csv or xml)")]
pub struct ParseFormatError(String);

impl FromStr for FileFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(&s.to_ascii_lowercase()).ok_or_else(|| ParseFormatError(s.to_string()))
    }
}

/// Build source reading one structured file.
///
/// The file is parsed on the first query and the resulting catalog is kept
/// for the lifetime of the source. Later changes to the file are not seen.
#[derive(Debug)]
pub struct FileBuildSource {
    path: PathBuf,
    format: Option<FileFormat>,
    catalog: Mutex<Option<Arc<BuildCatalog>>>,
}

impl FileBuildSource {
    /// Create a source whose format is inferred from the file extension.
    ///
    /// Nothing is read until builds are first requested.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
            catalog: Mutex::new(None),
        }
    }

    /// Create a source with an explicit format, ignoring the extension.
    pub fn with_format(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            format: Some(format),
            ..Self::new(path)
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the catalog has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.catalog.lock().is_some()
    }

    /// Return the catalog, loading the file on first use.
    ///
    /// Concurrent first calls load the file once; the others wait for it.
    ///
    /// # Errors
    ///
    /// Returns `BuildListError` if the format is unsupported, the file cannot
    /// be read or (except for XML) cannot be decoded. A failed load is not
    /// cached.
    pub fn catalog(&self) -> Result<Arc<BuildCatalog>, BuildListError> {
        let mut slot = self.catalog.lock();
        if let Some(catalog) = slot.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let catalog = Arc::new(self.load()?);
        tracing::info!(
            "Loaded {} builds for {} devices from {}",
            catalog.total_builds(),
            catalog.device_count(),
            self.path.display()
        );

        *slot = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    fn resolve_format(&self) -> Result<FileFormat, BuildListError> {
        if let Some(format) = self.format {
            return Ok(format);
        }

        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| BuildListError::UnsupportedFormat {
                path: self.path.clone(),
                reason: "no file extension".to_string(),
            })?;

        FileFormat::from_extension(extension).ok_or_else(|| BuildListError::UnsupportedFormat {
            path: self.path.clone(),
            reason: format!("unknown extension '{extension}'"),
        })
    }

    fn load(&self) -> Result<BuildCatalog, BuildListError> {
        let format = self.resolve_format()?;
        tracing::debug!("Loading {format} build list from {}", self.path.display());

        let text = std::fs::read_to_string(&self.path).map_err(|source| {
            BuildListError::LoadFailed {
                path: self.path.clone(),
                source,
            }
        })?;

        let pairs = match format {
            FileFormat::Json => parse_json(&text)?,
            FileFormat::Yaml => parse_yaml(&text)?,
            FileFormat::Csv => csv_format::parse(&text)?,
            FileFormat::Xml => xml_format::parse(&text),
        };

        Ok(BuildCatalog::from_pairs(
            pairs
                .into_iter()
                .map(|(device, build)| (device, build.with_derived_incremental())),
        ))
    }
}

impl BuildSource for FileBuildSource {
    fn get_builds(&self, device: &str, _channel: &str) -> Result<Vec<Build>, BuildListError> {
        Ok(self.catalog()?.builds(device).to_vec())
    }
}

fn parse_json(text: &str) -> Result<Vec<(String, Build)>, BuildListError> {
    let data: HashMap<String, Vec<Value>> = serde_json::from_str(text)?;

    let mut pairs = Vec::new();
    for (device, records) in data {
        for record in records {
            pairs.push((device.clone(), Build::from_record(record)?));
        }
    }
    Ok(pairs)
}

fn parse_yaml(text: &str) -> Result<Vec<(String, Build)>, BuildListError> {
    let data: HashMap<String, Vec<Build>> = serde_yaml::from_str(text)?;

    Ok(data
        .into_iter()
        .flat_map(|(device, builds)| builds.into_iter().map(move |b| (device.clone(), b)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("yaml"), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_extension("csv"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("xml"), Some(FileFormat::Xml));
        assert_eq!(FileFormat::from_extension("yml"), None);
        assert_eq!(FileFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<FileFormat>().unwrap(), FileFormat::Json);
        assert!("toml".parse::<FileFormat>().is_err());
    }

    #[test]
    fn test_unsupported_extension_fails_lazily() {
        let file = file_with(".txt", "{}");
        let source = FileBuildSource::new(file.path());
        assert!(!source.is_loaded());

        let err = source.get_builds("shamu", "nightly").unwrap_err();
        assert!(matches!(err, BuildListError::UnsupportedFormat { .. }));
        assert!(!source.is_loaded());
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let file = file_with(".txt", r#"{"shamu": [{"md5sum": "96b3004abbaab6b3c90cde34a85be4b1"}]}"#);
        let source = FileBuildSource::with_format(file.path(), FileFormat::Json);
        let builds = source.get_builds("shamu", "nightly").unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].incremental.as_deref(), Some("bbc3264f62"));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let source = FileBuildSource::new("/nonexistent/cm/builds.json");
        let err = source.get_builds("shamu", "nightly").unwrap_err();
        assert!(matches!(err, BuildListError::LoadFailed { .. }));
    }

    #[test]
    fn test_invalid_json_is_hard_error() {
        let file = file_with(".json", "{ not json");
        let source = FileBuildSource::new(file.path());
        let err = source.get_builds("shamu", "nightly").unwrap_err();
        assert!(matches!(err, BuildListError::InvalidJson(_)));
    }

    #[test]
    fn test_invalid_yaml_is_hard_error() {
        let file = file_with(".yaml", "shamu: [unterminated");
        let source = FileBuildSource::new(file.path());
        let err = source.get_builds("shamu", "nightly").unwrap_err();
        assert!(matches!(err, BuildListError::InvalidYaml(_)));
    }

    #[test]
    fn test_yaml_scalars_are_typed() {
        let file = file_with(
            ".yaml",
            "shamu:\n- filename: cm-13.0-20160925-UNOFFICIAL-shamu.zip\n  timestamp: 1474932005\n  md5sum: 96b3004abbaab6b3c90cde34a85be4b1\n  api_level: 23\n",
        );
        let builds = FileBuildSource::new(file.path()).get_builds("shamu", "nightly").unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].timestamp, Some(1_474_932_005));
        assert_eq!(builds[0].api_level, Some(23));
    }

    #[test]
    fn test_channel_does_not_filter() {
        let file = file_with(
            ".json",
            r#"{"shamu": [{"channel": "nightly"}, {"channel": "stable"}]}"#,
        );
        let source = FileBuildSource::new(file.path());
        assert_eq!(source.get_builds("shamu", "stable").unwrap().len(), 2);
        assert_eq!(source.get_builds("shamu", "nightly").unwrap().len(), 2);
    }

    #[test]
    fn test_catalog_is_loaded_once() {
        let file = file_with(".json", r#"{"shamu": [{"filename": "cm-a.zip"}]}"#);
        let source = FileBuildSource::new(file.path());
        assert_eq!(source.get_builds("shamu", "nightly").unwrap().len(), 1);

        std::fs::write(file.path(), r#"{"shamu": [{"filename": "cm-a.zip"}, {"filename": "cm-b.zip"}]}"#)
            .unwrap();
        assert_eq!(source.get_builds("shamu", "nightly").unwrap().len(), 1);

        let first = source.catalog().unwrap();
        let second = source.catalog().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
