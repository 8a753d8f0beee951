//! Media type detection.
//!
//! [`Detector`] is composed per request. With a surviving content-type hint
//! the hint-priority variant answers immediately and never reads a byte;
//! otherwise detection falls through to [`SniffingDetector`], which looks at
//! the content itself.

use crate::core::hints::HintBag;
use crate::core::io::DocumentSource;
use crate::core::mime::{self, HTML_MIME_TYPE, OCTET_STREAM_MIME_TYPE, PLAIN_TEXT_MIME_TYPE, XML_MIME_TYPE};
use crate::Result;

/// Number of leading bytes inspected by the sniffing heuristics.
const SNIFF_WINDOW: usize = 8 * 1024;

/// Media type detector for one request.
#[derive(Debug, Clone)]
pub enum Detector {
    /// Return `hint` verbatim when present, otherwise delegate to `fallback`.
    HintPriority { hint: Option<String>, fallback: Box<Detector> },
    /// Classify by content, then by resource name.
    Sniffing(SniffingDetector),
}

impl Detector {
    pub fn sniffing() -> Self {
        Detector::Sniffing(SniffingDetector::default())
    }

    /// Compose the detector for a request.
    ///
    /// With `trust_hints` disabled the hint is ignored and every request is
    /// sniffed.
    pub fn for_hints(hints: &HintBag, trust_hints: bool) -> Self {
        if !trust_hints {
            return Self::sniffing();
        }
        Detector::HintPriority {
            hint: hints.content_type().map(str::to_string),
            fallback: Box::new(Self::sniffing()),
        }
    }

    /// Resolve the media type. Never returns an empty string.
    pub fn detect(&self, source: &mut DocumentSource, hints: &HintBag) -> Result<String> {
        match self {
            Detector::HintPriority { hint: Some(hint), .. } => {
                tracing::debug!(mime_type = %hint, "Content type taken from hint");
                Ok(hint.clone())
            }
            Detector::HintPriority { hint: None, fallback } => fallback.detect(source, hints),
            Detector::Sniffing(sniffer) => {
                let content = source.bytes()?;
                Ok(sniffer.sniff(content, hints.resource_name()))
            }
        }
    }

    /// Resolve the media type for bytes already in memory.
    pub fn detect_bytes(&self, content: &[u8], hints: &HintBag) -> String {
        match self {
            Detector::HintPriority { hint: Some(hint), .. } => hint.clone(),
            Detector::HintPriority { hint: None, fallback } => fallback.detect_bytes(content, hints),
            Detector::Sniffing(sniffer) => sniffer.sniff(content, hints.resource_name()),
        }
    }
}

/// Content sniffer.
///
/// Order of evidence:
/// 1. leading markup (`<?xml`, `<!DOCTYPE html`, `<html`)
/// 2. magic numbers (`infer`)
/// 3. resource name extension
/// 4. a text heuristic over the leading bytes
///
/// Falls back to `application/octet-stream`.
#[derive(Debug, Clone)]
pub struct SniffingDetector {
    window: usize,
}

impl Default for SniffingDetector {
    fn default() -> Self {
        Self { window: SNIFF_WINDOW }
    }
}

impl SniffingDetector {
    pub fn sniff(&self, content: &[u8], resource_name: Option<&str>) -> String {
        let sample = &content[..content.len().min(self.window)];

        if let Some(markup) = sniff_markup(sample) {
            tracing::debug!(mime_type = markup, "Content type from leading markup");
            return markup.to_string();
        }

        if let Some(kind) = infer::get(sample) {
            tracing::debug!(mime_type = kind.mime_type(), "Content type from magic number");
            return kind.mime_type().to_string();
        }

        if let Some(by_name) = resource_name.and_then(mime::mime_from_resource_name) {
            tracing::debug!(mime_type = %by_name, "Content type from resource name");
            return by_name;
        }

        if looks_like_text(sample) {
            tracing::debug!("Content type from text heuristic");
            return PLAIN_TEXT_MIME_TYPE.to_string();
        }

        tracing::debug!("No signature matched, falling back to octet-stream");
        OCTET_STREAM_MIME_TYPE.to_string()
    }
}

fn sniff_markup(sample: &[u8]) -> Option<&'static str> {
    let sample = sample.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(sample);
    let start = sample.iter().position(|b| !b.is_ascii_whitespace())?;
    let head: Vec<u8> = sample[start..sample.len().min(start + 256)]
        .iter()
        .map(u8::to_ascii_lowercase)
        .collect();

    if head.starts_with(b"<!doctype html") || head.starts_with(b"<html") {
        return Some(HTML_MIME_TYPE);
    }
    if head.starts_with(b"<?xml") {
        let text = String::from_utf8_lossy(&head);
        if text.contains("<html") || text.contains("<!doctype html") {
            return Some(HTML_MIME_TYPE);
        }
        return Some(XML_MIME_TYPE);
    }
    None
}

/// BOM-marked text, BOM-less UTF-16, or bytes free of NULs and with few
/// control characters.
fn looks_like_text(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    if encoding_rs::Encoding::for_bom(sample).is_some() {
        return true;
    }
    if crate::core::charset::utf16_without_bom(sample).is_some() {
        return true;
    }
    if sample.contains(&0) {
        return false;
    }

    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C | 0x1B))
        .count();
    control * 20 <= sample.len()
}
