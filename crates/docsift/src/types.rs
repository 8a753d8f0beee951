//! Result and metadata types shared by the extraction entry points.

use crate::{DocsiftError, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known metadata keys.
pub mod keys {
    pub const RESOURCE_NAME: &str = "resourceName";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const TITLE: &str = "dc:title";
    pub const SUBTITLE: &str = "subtitle";
    pub const ALTERNATIVE_TITLE: &str = "dcterms:alternative";
    pub const LANGUAGE: &str = "dc:language";
    pub const IMAGE_WIDTH: &str = "tiff:ImageWidth";
    pub const IMAGE_LENGTH: &str = "tiff:ImageLength";
    pub const EMBEDDED_UNSUPPORTED: &str = "X-Docsift-Unsupported-Member";
}

/// Document metadata: each name maps to one or more values, in insertion order.
///
/// Serializes as a JSON object whose values are always arrays, e.g.
/// `{"resourceName": ["file.txt"], "Content-Encoding": ["ISO-8859-1"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: IndexMap<String, Vec<String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values for `name` with a single value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), vec![value.into()]);
    }

    /// Append a value for `name`, keeping existing ones.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    /// First value recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.fields.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_map(self) -> IndexMap<String, Vec<String>> {
        self.fields
    }

    /// Title as shown in markup output.
    ///
    /// `dc:title`, followed by `: <subtitle>` and ` (<alternative title>)` when
    /// those are present and differ from the title.
    pub fn expanded_title(&self) -> Option<String> {
        let title = self.get(keys::TITLE).map(str::trim).filter(|t| !t.is_empty());
        let subtitle = self.get(keys::SUBTITLE).map(str::trim).filter(|t| !t.is_empty());
        let alternative = self
            .get(keys::ALTERNATIVE_TITLE)
            .map(str::trim)
            .filter(|t| !t.is_empty() && Some(*t) != title);

        let mut expanded = match (title, subtitle) {
            (Some(title), Some(subtitle)) => format!("{}: {}", title, subtitle),
            (Some(title), None) => title.to_string(),
            (None, Some(subtitle)) => subtitle.to_string(),
            (None, None) => String::new(),
        };

        if let Some(alternative) = alternative {
            if expanded.is_empty() {
                expanded.push_str(alternative);
            } else {
                expanded.push_str(&format!(" ({})", alternative));
            }
        }

        (!expanded.is_empty()).then_some(expanded)
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Plain-text rendition of a document together with the encoding the caller
/// asked the bytes to be rendered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextExtraction {
    pub content: String,
    pub output_encoding: String,
}

impl TextExtraction {
    /// Render the text in `output_encoding`.
    ///
    /// Characters the target encoding cannot represent become numeric
    /// character references.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_text(&self.content, &self.output_encoding)
    }
}

/// Combined text and metadata from a single decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub content: String,
    pub output_encoding: String,
    pub mime_type: String,
    pub metadata: Metadata,
}

impl ExtractionResult {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_text(&self.content, &self.output_encoding)
    }
}

/// Resolve an output-encoding label, e.g. `"utf-8"` or `"latin1"`.
pub fn resolve_output_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DocsiftError::validation(format!("Unknown output encoding '{}'", label)))
}

fn encode_text(content: &str, label: &str) -> Result<Vec<u8>> {
    let encoding = resolve_output_encoding(label)?;

    // encoding_rs only decodes UTF-16; its encoders fall back to UTF-8.
    if encoding == UTF_16LE {
        return Ok(content.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(content.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }

    let (bytes, _, unmappable) = encoding.encode(content);
    if unmappable {
        tracing::debug!(encoding = encoding.name(), "Unmappable characters replaced with references");
    }
    Ok(bytes.into_owned())
}

/// Serialization used by markup extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupFormat {
    #[default]
    Xml,
    Html,
}

impl fmt::Display for MarkupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupFormat::Xml => f.write_str("xml"),
            MarkupFormat::Html => f.write_str("html"),
        }
    }
}

impl FromStr for MarkupFormat {
    type Err = DocsiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" | "xhtml" => Ok(MarkupFormat::Xml),
            "html" => Ok(MarkupFormat::Html),
            other => Err(DocsiftError::validation(format!(
                "Unknown markup format '{}', expected 'xml' or 'html'",
                other
            ))),
        }
    }
}

/// Language identification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDetection {
    /// ISO 639-1 code where one exists, ISO 639-3 otherwise; `und` when undetermined.
    pub language: String,
    pub reasonably_certain: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serializes_values_as_lists() {
        let mut metadata = Metadata::new();
        metadata.set(keys::RESOURCE_NAME, "file.txt");
        metadata.add("dc:creator", "Ada");
        metadata.add("dc:creator", "Grace");

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["resourceName"], serde_json::json!(["file.txt"]));
        assert_eq!(json["dc:creator"], serde_json::json!(["Ada", "Grace"]));
    }

    #[test]
    fn test_metadata_set_replaces() {
        let mut metadata = Metadata::new();
        metadata.add(keys::CONTENT_TYPE, "text/plain");
        metadata.set(keys::CONTENT_TYPE, "text/plain; charset=UTF-8");
        assert_eq!(metadata.get_all(keys::CONTENT_TYPE), ["text/plain; charset=UTF-8"]);
    }

    #[test]
    fn test_metadata_preserves_insertion_order() {
        let mut metadata = Metadata::new();
        metadata.set("b", "1");
        metadata.set("a", "2");
        assert_eq!(metadata.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_expanded_title() {
        let mut metadata = Metadata::new();
        assert_eq!(metadata.expanded_title(), None);

        metadata.set(keys::TITLE, "Annual Report");
        assert_eq!(metadata.expanded_title().as_deref(), Some("Annual Report"));

        metadata.set(keys::SUBTITLE, "2024");
        assert_eq!(metadata.expanded_title().as_deref(), Some("Annual Report: 2024"));

        metadata.set(keys::ALTERNATIVE_TITLE, "AR24");
        assert_eq!(metadata.expanded_title().as_deref(), Some("Annual Report: 2024 (AR24)"));
    }

    #[test]
    fn test_expanded_title_skips_duplicate_alternative() {
        let mut metadata = Metadata::new();
        metadata.set(keys::TITLE, "Same");
        metadata.set(keys::ALTERNATIVE_TITLE, "Same");
        assert_eq!(metadata.expanded_title().as_deref(), Some("Same"));
    }

    #[test]
    fn test_to_bytes_latin1() {
        let text = TextExtraction {
            content: "caf\u{e9}".to_string(),
            output_encoding: "ISO-8859-1".to_string(),
        };
        assert_eq!(text.to_bytes().unwrap(), vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_to_bytes_utf16le() {
        let text = TextExtraction {
            content: "hi".to_string(),
            output_encoding: "UTF-16LE".to_string(),
        };
        assert_eq!(text.to_bytes().unwrap(), vec![b'h', 0, b'i', 0]);
    }

    #[test]
    fn test_unknown_output_encoding() {
        let err = resolve_output_encoding("klingon-8").unwrap_err();
        assert!(matches!(err, DocsiftError::Validation { .. }));
    }

    #[test]
    fn test_markup_format_from_str() {
        assert_eq!("HTML".parse::<MarkupFormat>().unwrap(), MarkupFormat::Html);
        assert_eq!("xml".parse::<MarkupFormat>().unwrap(), MarkupFormat::Xml);
        assert!("pdf".parse::<MarkupFormat>().is_err());
    }

    #[test]
    fn test_language_detection_serializes_camel_case() {
        let detection = LanguageDetection {
            language: "en".to_string(),
            reasonably_certain: true,
        };
        let json = serde_json::to_value(&detection).unwrap();
        assert_eq!(json["reasonablyCertain"], serde_json::json!(true));
    }
}
