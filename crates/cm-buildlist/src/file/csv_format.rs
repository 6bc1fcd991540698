//! Headerless CSV build lists.
//!
//! Each row describes one build, in this fixed column order:
//!
//! ```text
//! device,url,filename,timestamp,md5sum,incremental,changes,channel,api_level
//! ```
//!
//! The `incremental` column is ignored. Rows with the wrong number of columns
//! are skipped.

use crate::build::{Build, loose_int_from_str};

/// Number of columns in a build row.
const COLUMNS: usize = 9;

pub(super) fn parse(text: &str) -> Result<Vec<(String, Build)>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut pairs = Vec::new();
    for record in reader.records() {
        let row = record?;
        if row.len() != COLUMNS {
            tracing::warn!(
                line = row.position().map_or(0, csv::Position::line),
                columns = row.len(),
                "Skipping CSV build row with wrong column count"
            );
            continue;
        }

        let build = Build {
            url: text_field(&row[1]),
            filename: text_field(&row[2]),
            timestamp: Some(loose_int_from_str(&row[3])),
            md5sum: text_field(&row[4]),
            incremental: None,
            changes: text_field(&row[6]),
            channel: text_field(&row[7]),
            api_level: Some(loose_int_from_str(&row[8])),
        };
        pairs.push((row[0].to_string(), build));
    }

    Ok(pairs)
}

/// Empty cells mean the value is unknown.
fn text_field(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "shamu,http://example.com/get/shamu/cm-13.0-20160102-UNOFFICIAL-shamu.zip,cm-13.0-20160102-UNOFFICIAL-shamu.zip,1451700000,96b3004abbaab6b3c90cde34a85be4b1,deadbeef00,http://example.com/get/shamu/cm-13.0-20160102-UNOFFICIAL-shamu.changes,nightly,23";

    #[test]
    fn test_parse_row() {
        let pairs = parse(ROW).unwrap();
        assert_eq!(pairs.len(), 1);

        let (device, build) = &pairs[0];
        assert_eq!(device, "shamu");
        assert_eq!(build.filename.as_deref(), Some("cm-13.0-20160102-UNOFFICIAL-shamu.zip"));
        assert_eq!(build.timestamp, Some(1_451_700_000));
        assert_eq!(build.md5sum.as_deref(), Some("96b3004abbaab6b3c90cde34a85be4b1"));
        assert_eq!(build.incremental, None);
        assert_eq!(build.channel.as_deref(), Some("nightly"));
        assert_eq!(build.api_level, Some(23));
    }

    #[test]
    fn test_skips_rows_with_wrong_column_count() {
        let text = format!("shamu,too,short\n{ROW}\n{ROW},extra\n\n");
        let pairs = parse(&text).unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_non_numeric_integers_become_zero() {
        let text = "titan,u,f,yesterday,96b3004abbaab6b3c90cde34a85be4b1,,c,nightly,unknown";
        let pairs = parse(text).unwrap();
        assert_eq!(pairs[0].1.timestamp, Some(0));
        assert_eq!(pairs[0].1.api_level, Some(0));
    }

    #[test]
    fn test_quoted_fields() {
        let text = "\"shamu\",\"http://example.com/a,b.zip\",\"a,b.zip\",1,\"\",\"\",\"\",nightly,23";
        let pairs = parse(text).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1.filename.as_deref(), Some("a,b.zip"));
        assert_eq!(pairs[0].1.md5sum, None);
    }
}
