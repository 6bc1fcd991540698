//! XML build lists.
//!
//! ```xml
//! <builds>
//!   <device name="shamu">
//!     <build url="http://..." filename="cm-13.0-20160925-UNOFFICIAL-shamu.zip"
//!            timestamp="1474932005" md5sum="96b3004abbaab6b3c90cde34a85be4b1"
//!            changes="http://..." channel="nightly" api_level="23" />
//!   </device>
//! </builds>
//! ```
//!
//! A document that fails to parse produces no builds at all rather than an
//! error.

use crate::build::{Build, loose_int_from_str};
use quick_xml::Reader;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

#[derive(Debug, Error)]
enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),

    #[error(transparent)]
    Attribute(#[from] AttrError),

    #[error("unexpected closing tag")]
    UnbalancedEnd,

    #[error("{0} element(s) left open at end of document")]
    Unclosed(usize),

    #[error("more than one root element")]
    MultipleRoots,
}

pub(super) fn parse(text: &str) -> Vec<(String, Build)> {
    match parse_document(text) {
        Ok(pairs) => pairs,
        Err(err) => {
            tracing::warn!("Ignoring malformed XML build list: {err}");
            Vec::new()
        }
    }
}

fn parse_document(text: &str) -> Result<Vec<(String, Build)>, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut depth = 0_usize;
    let mut roots = 0_usize;
    let mut device: Option<String> = None;
    let mut pairs = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                roots += usize::from(depth == 0);
                open_element(&element, depth, &mut device, &mut pairs)?;
                depth += 1;
            }
            Event::Empty(element) => {
                roots += usize::from(depth == 0);
                open_element(&element, depth, &mut device, &mut pairs)?;
                if depth == 1 {
                    device = None;
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or(XmlError::UnbalancedEnd)?;
                if depth == 1 {
                    device = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }

        if roots > 1 {
            return Err(XmlError::MultipleRoots);
        }
    }

    if depth != 0 {
        return Err(XmlError::Unclosed(depth));
    }

    Ok(pairs)
}

/// Handle an opening (or self-closing) tag at `depth` below the document.
///
/// `<device>` elements are direct children of the root and `<build>`
/// elements direct children of a device; anything else is ignored.
fn open_element(
    element: &BytesStart<'_>,
    depth: usize,
    device: &mut Option<String>,
    pairs: &mut Vec<(String, Build)>,
) -> Result<(), XmlError> {
    match (depth, element.name().as_ref()) {
        (1, b"device") => {
            let mut name = String::new();
            for attr in element.attributes() {
                let attr = attr?;
                if attr.key.as_ref() == b"name" {
                    name = attr.unescape_value()?.into_owned();
                }
            }
            *device = Some(name);
        }
        (2, b"build") => {
            if let Some(device) = device.as_ref() {
                pairs.push((device.clone(), build_from_attributes(element)?));
            }
        }
        _ => {}
    }
    Ok(())
}

fn build_from_attributes(element: &BytesStart<'_>) -> Result<Build, XmlError> {
    let mut build = Build::default();
    for attr in element.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"url" => build.url = Some(value),
            b"filename" => build.filename = Some(value),
            b"timestamp" => build.timestamp = Some(loose_int_from_str(&value)),
            b"md5sum" => build.md5sum = Some(value),
            b"changes" => build.changes = Some(value),
            b"channel" => build.channel = Some(value),
            b"api_level" => build.api_level = Some(loose_int_from_str(&value)),
            // incremental is derived from md5sum, never read
            _ => {}
        }
    }
    Ok(build)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0"?>
<builds>
  <device name="shamu">
    <build url="http://example.com/get/shamu/cm-a.zip" filename="cm-a.zip"
           timestamp="1451700000" md5sum="96b3004abbaab6b3c90cde34a85be4b1"
           incremental="fromfile00" changes="http://example.com/get/shamu/cm-a.changes"
           channel="nightly" api_level="23"/>
    <build filename="cm-b.zip" md5sum="d41d8cd98f00b204e9800998ecf8427e"/>
  </device>
  <device name="titan">
    <build filename="cm-c.zip" timestamp="12x" api_level="22"/>
  </device>
  <device name="empty"/>
</builds>"#;

    #[test]
    fn test_parse_document() {
        let pairs = parse(DOCUMENT);
        assert_eq!(pairs.len(), 3);

        let (device, first) = &pairs[0];
        assert_eq!(device, "shamu");
        assert_eq!(first.filename.as_deref(), Some("cm-a.zip"));
        assert_eq!(first.timestamp, Some(1_451_700_000));
        assert_eq!(first.api_level, Some(23));
        assert_eq!(first.incremental, None);

        assert_eq!(pairs[1].0, "shamu");
        assert_eq!(pairs[1].1.url, None);
        assert_eq!(pairs[2].0, "titan");
        assert_eq!(pairs[2].1.timestamp, Some(12));
    }

    #[test]
    fn test_nested_builds_outside_devices_are_ignored() {
        let text = r#"<builds><build filename="orphan.zip"/><device name="shamu"><group><build filename="deep.zip"/></group></device></builds>"#;
        assert!(parse(text).is_empty());
    }

    #[test]
    fn test_escaped_attribute_values() {
        let text = r#"<builds><device name="shamu"><build url="http://example.com/get?a=1&amp;b=2"/></device></builds>"#;
        let pairs = parse(text);
        assert_eq!(pairs[0].1.url.as_deref(), Some("http://example.com/get?a=1&b=2"));
    }

    #[test]
    fn test_malformed_documents_yield_nothing() {
        for text in [
            r#"<builds><device name="shamu"><build filename="a.zip"/></builds>"#,
            r#"<builds><device name="shamu"><build filename="a.zip"/></device>"#,
            r#"<builds></builds><builds></builds>"#,
            r#"<builds><device name="shamu"><build filename="a.zip" filename="b.zip"/></device></builds>"#,
        ] {
            assert!(parse(text).is_empty(), "expected no builds for {text}");
        }
    }
}
