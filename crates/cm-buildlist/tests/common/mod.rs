//! Shared fixtures for build source integration tests.

#![allow(dead_code)]

use cm_buildlist::{Build, DEFAULT_CHANNEL, FileFormat, incremental_for};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

pub const URL_BASE: &str = "http://example.com/get";
pub const DEVICE1: &str = "shamu";
pub const DEVICE2: &str = "titan";
pub const API_LEVEL: i64 = 23;

/// Fixture builds as `(device, date, seconds into the day)`.
const BUILDS: [(&str, &str, u64); 5] = [
    (DEVICE1, "20160102", 3_600),
    (DEVICE1, "20160105", 40_000),
    (DEVICE1, "20160106", 86_399),
    (DEVICE2, "20160102", 12),
    (DEVICE2, "20160103", 50_505),
];

/// Unix timestamps of midnight UTC for the fixture dates.
fn midnight(date: &str) -> u64 {
    match date {
        "20160102" => 1_451_692_800,
        "20160103" => 1_451_779_200,
        "20160105" => 1_451_952_000,
        "20160106" => 1_452_038_400,
        other => panic!("no fixture date {other}"),
    }
}

pub fn build_filename(device: &str, date: &str) -> String {
    format!("cm-13.0-{date}-UNOFFICIAL-suffix-{device}.zip")
}

fn expected_build(device: &str, filename: &str, timestamp: u64, md5sum: &str) -> Build {
    Build {
        url: Some(format!("{URL_BASE}/{device}/{filename}")),
        filename: Some(filename.to_string()),
        timestamp: Some(i64::try_from(timestamp).unwrap()),
        md5sum: Some(md5sum.to_string()),
        incremental: Some(incremental_for(md5sum)),
        changes: Some(format!(
            "{URL_BASE}/{device}/{}",
            filename.replace(".zip", ".changes")
        )),
        channel: Some(DEFAULT_CHANNEL.to_string()),
        api_level: Some(API_LEVEL),
    }
}

/// Sort builds by checksum so lists compare independently of order.
pub fn sorted_by_md5sum(mut builds: Vec<Build>) -> Vec<Build> {
    builds.sort_by(|a, b| a.md5sum.cmp(&b.md5sum));
    builds
}

/// Build list files with the same builds in every supported format.
pub struct FileFixture {
    dir: TempDir,
    builds: BTreeMap<String, Vec<Build>>,
}

impl FileFixture {
    pub fn new() -> Self {
        let mut builds: BTreeMap<String, Vec<Build>> = BTreeMap::new();
        for (device, date, offset) in BUILDS {
            let filename = build_filename(device, date);
            let md5sum = format!("{:x}", md5::compute(filename.as_bytes()));
            builds
                .entry(device.to_string())
                .or_default()
                .push(expected_build(device, &filename, midnight(date) + offset, &md5sum));
        }

        let fixture = Self {
            dir: TempDir::new().unwrap(),
            builds,
        };
        for format in FileFormat::ALL {
            fixture.save(format);
        }
        fixture
    }

    pub fn devices(&self) -> Vec<&str> {
        self.builds.keys().map(String::as_str).collect()
    }

    pub fn builds(&self, device: &str) -> Vec<Build> {
        self.builds.get(device).cloned().unwrap_or_default()
    }

    pub fn path(&self, format: FileFormat) -> PathBuf {
        self.dir.path().join(format!("builds.{}", format.extension()))
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    fn records(&self) -> BTreeMap<&str, Vec<serde_json::Map<String, serde_json::Value>>> {
        self.builds
            .iter()
            .map(|(device, builds)| (device.as_str(), builds.iter().map(Build::to_record).collect()))
            .collect()
    }

    fn save(&self, format: FileFormat) {
        let path = self.path(format);
        match format {
            FileFormat::Json => {
                std::fs::write(path, serde_json::to_string_pretty(&self.records()).unwrap()).unwrap();
            }
            FileFormat::Yaml => {
                std::fs::write(path, serde_yaml::to_string(&self.records()).unwrap()).unwrap();
            }
            FileFormat::Csv => {
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_path(path)
                    .unwrap();
                for (device, builds) in &self.builds {
                    for build in builds {
                        writer
                            .write_record([
                                device.clone(),
                                text(build.url.as_ref()),
                                text(build.filename.as_ref()),
                                number(build.timestamp),
                                text(build.md5sum.as_ref()),
                                text(build.incremental.as_ref()),
                                text(build.changes.as_ref()),
                                text(build.channel.as_ref()),
                                number(build.api_level),
                            ])
                            .unwrap();
                    }
                }
                writer.flush().unwrap();
            }
            FileFormat::Xml => {
                let mut xml = String::from("<?xml version=\"1.0\"?>\n<builds>\n");
                for (device, builds) in &self.builds {
                    xml.push_str(&format!("  <device name=\"{}\">\n", quick_xml::escape::escape(device)));
                    for build in builds {
                        xml.push_str("    <build");
                        for (name, value) in build.to_record() {
                            let value = match value {
                                serde_json::Value::String(s) => s,
                                other => other.to_string(),
                            };
                            xml.push_str(&format!(" {name}=\"{}\"", quick_xml::escape::escape(&value)));
                        }
                        xml.push_str("/>\n");
                    }
                    xml.push_str("  </device>\n");
                }
                xml.push_str("</builds>\n");
                std::fs::write(path, xml).unwrap();
            }
        }
    }
}

fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn number(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// A download tree with real zip artifacts, sidecars and distractors.
pub struct FolderFixture {
    root: TempDir,
    builds: BTreeMap<String, Vec<Build>>,
}

impl FolderFixture {
    pub fn new() -> Self {
        let mut fixture = Self {
            root: TempDir::new().unwrap(),
            builds: BTreeMap::new(),
        };
        for (device, date, offset) in BUILDS {
            fixture.create_build(device, date, midnight(date) + offset);
        }
        fixture
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn devices(&self) -> Vec<&str> {
        self.builds.keys().map(String::as_str).collect()
    }

    pub fn builds(&self, device: &str) -> Vec<Build> {
        self.builds.get(device).cloned().unwrap_or_default()
    }

    pub fn device_dir(&self, device: &str) -> PathBuf {
        let dir = self.root.path().join(device);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Write a zip archive containing the given entries.
    pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    pub fn set_mtime(path: &Path, timestamp: u64) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(timestamp))
            .unwrap();
    }

    fn create_build(&mut self, device: &str, date: &str, timestamp: u64) {
        let filename = build_filename(device, date);
        let path = self.device_dir(device).join(&filename);
        let build_prop = format!(
            "# begin build properties\n# this is a fake build.prop file\nro.build.version.sdk={API_LEVEL}\n"
        );
        Self::write_zip(&path, &[("system/build.prop", &build_prop)]);

        let md5sum = format!("{:x}", md5::compute(std::fs::read(&path).unwrap()));
        let mut sidecar = path.clone().into_os_string();
        sidecar.push(".md5sum");
        std::fs::write(sidecar, format!("{md5sum}  {filename}")).unwrap();

        Self::set_mtime(&path, timestamp);

        self.builds
            .entry(device.to_string())
            .or_default()
            .push(expected_build(device, &filename, timestamp, &md5sum));
    }
}
