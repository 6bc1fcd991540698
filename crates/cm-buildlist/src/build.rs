//! Build artifact records.
//!
//! A [`Build`] is the flat record served to update clients. Every field is
//! optional so that partially described builds round-trip as `null` values
//! instead of being rejected.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Release channel used when the caller does not name one.
pub const DEFAULT_CHANNEL: &str = "nightly";

/// Number of hex characters kept for the incremental identifier.
const INCREMENTAL_LEN: usize = 10;

/// A single published build artifact with its metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Build {
    /// Absolute download URL
    pub url: Option<String>,

    /// Artifact file name (e.g. "cm-13.0-20160925-UNOFFICIAL-shamu.zip")
    pub filename: Option<String>,

    /// Unix timestamp in seconds (artifact mtime or declared build time)
    #[serde(deserialize_with = "loose_int")]
    pub timestamp: Option<i64>,

    /// MD5 checksum of the artifact (32 lowercase hex characters)
    pub md5sum: Option<String>,

    /// Placeholder incremental identifier derived from `md5sum`
    pub incremental: Option<String>,

    /// Changelog URL
    pub changes: Option<String>,

    /// Release channel (e.g. "nightly")
    pub channel: Option<String>,

    /// Platform API level, 0 when it could not be determined
    #[serde(deserialize_with = "loose_int")]
    pub api_level: Option<i64>,
}

impl Build {
    /// Create a build from a flat record.
    ///
    /// Fields missing from the record stay `None`. Integer fields accept
    /// numbers as well as numeric strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is not an object or a field has an
    /// incompatible type.
    pub fn from_record(record: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(record)
    }

    /// Flatten the build into a record with all eight fields present.
    #[must_use]
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("url".to_string(), opt_string(self.url.as_ref()));
        record.insert("filename".to_string(), opt_string(self.filename.as_ref()));
        record.insert("timestamp".to_string(), self.timestamp.map_or(Value::Null, Value::from));
        record.insert("md5sum".to_string(), opt_string(self.md5sum.as_ref()));
        record.insert("incremental".to_string(), opt_string(self.incremental.as_ref()));
        record.insert("changes".to_string(), opt_string(self.changes.as_ref()));
        record.insert("channel".to_string(), opt_string(self.channel.as_ref()));
        record.insert("api_level".to_string(), self.api_level.map_or(Value::Null, Value::from));
        record
    }

    /// Replace `incremental` with the value derived from `md5sum`.
    ///
    /// An unknown checksum derives from the empty string, so every build
    /// carries an incremental identifier.
    #[must_use]
    pub fn with_derived_incremental(mut self) -> Self {
        self.incremental = Some(incremental_for(self.md5sum.as_deref().unwrap_or_default()));
        self
    }
}

fn opt_string(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.clone()))
}

/// Derive the incremental identifier for a checksum.
///
/// This is the first ten hex characters of `md5(md5sum)`. It stands in for a
/// real delta-update key and only groups builds by checksum.
#[must_use]
pub fn incremental_for(md5sum: &str) -> String {
    let digest = format!("{:x}", md5::compute(md5sum.as_bytes()));
    digest[..INCREMENTAL_LEN].to_string()
}

/// Loosely coerce text to an integer.
///
/// Leading whitespace and an optional sign are accepted, parsing stops at the
/// first non-digit, and text without leading digits yields 0.
pub(crate) fn loose_int_from_str(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });

    if negative { -value } else { value }
}

/// Deserialize an optional integer from a number or a numeric string.
fn loose_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LooseInt;

    impl<'de> Visitor<'de> for LooseInt {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer, a numeric string or null")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v as i64))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(i64::from(v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(loose_int_from_str(v)))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(LooseInt)
        }
    }

    deserializer.deserialize_any(LooseInt)
}
