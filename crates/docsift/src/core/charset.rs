//! Character encoding resolution.
//!
//! Evidence is consulted strongest first:
//!
//! 1. byte order mark
//! 2. `charset` parameter on the content-type hint
//! 3. type-dependent rules: JSON is UTF-8, XML and HTML may declare their
//!    encoding in the first kilobyte
//! 4. BOM-less UTF-16 recognized by its NUL-byte pattern
//! 5. statistical detection (`chardetng`)
//!
//! `windows-1252` is reported as `ISO-8859-1` when the bytes never use the
//! C1 range (0x80-0x9F), where the two encodings agree.

use crate::core::hints::HintBag;
use crate::core::io::DocumentSource;
use crate::core::mime;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

/// How far into the document declared encodings are looked for.
const DECLARATION_WINDOW: usize = 1024;

pub const LATIN1_NAME: &str = "ISO-8859-1";

/// A resolved character encoding and the name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCharset {
    encoding: &'static Encoding,
    name: String,
}

impl DetectedCharset {
    fn new(encoding: &'static Encoding, content: &[u8]) -> Self {
        let name = if encoding == WINDOWS_1252 && !content.iter().any(|b| (0x80..=0x9F).contains(b)) {
            LATIN1_NAME.to_string()
        } else {
            encoding.name().to_string()
        };
        Self { encoding, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode `content`, dropping a BOM that matches the encoding.
    pub fn decode(&self, content: &[u8]) -> String {
        let (text, had_errors) = self.encoding.decode_with_bom_removal(content);
        if had_errors {
            tracing::debug!(charset = %self.name, "Malformed sequences replaced while decoding");
        }
        text.into_owned()
    }
}

/// Resolve the charset of an opened stream.
///
/// An unreadable or empty stream yields `None` rather than an error.
pub fn detect_charset(source: &mut DocumentSource, hints: &HintBag) -> Option<DetectedCharset> {
    match source.bytes() {
        Ok(content) => detect_charset_bytes(content, hints),
        Err(e) => {
            tracing::debug!(error = %e, "Charset undecidable: stream could not be read");
            None
        }
    }
}

/// Resolve the charset of in-memory content.
pub fn detect_charset_bytes(content: &[u8], hints: &HintBag) -> Option<DetectedCharset> {
    if content.is_empty() {
        return None;
    }

    let (encoding, reason) = resolve(content, hints);
    let detected = DetectedCharset::new(encoding, content);
    tracing::debug!(charset = detected.name(), reason, "Resolved charset");
    Some(detected)
}

fn resolve(content: &[u8], hints: &HintBag) -> (&'static Encoding, &'static str) {
    if let Some((encoding, _)) = Encoding::for_bom(content) {
        return (encoding, "byte order mark");
    }

    let hinted_type = hints.content_type().unwrap_or_default();

    if let Some(encoding) = mime::charset_param(hinted_type).and_then(|label| Encoding::for_label(label.as_bytes())) {
        return (encoding, "content-type parameter");
    }

    if mime::is_json_type(hinted_type) {
        return (UTF_8, "JSON default");
    }

    let head = &content[..content.len().min(DECLARATION_WINDOW)];
    let markup = mime::is_xml_type(hinted_type) || mime::is_html_type(hinted_type) || starts_with_markup(head);
    if markup {
        if let Some(encoding) = declared_encoding(head) {
            return (encoding, "declared in markup");
        }
        if mime::is_xml_type(hinted_type) && std::str::from_utf8(content).is_ok() {
            return (UTF_8, "XML default");
        }
    }

    if let Some(encoding) = utf16_without_bom(content) {
        return (encoding, "UTF-16 byte pattern");
    }

    if content.is_ascii() {
        return (WINDOWS_1252, "ASCII only");
    }

    let mut detector = EncodingDetector::new();
    detector.feed(content, true);
    (detector.guess(None, true), "statistical")
}

fn starts_with_markup(head: &[u8]) -> bool {
    head.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'<')
}

/// Encoding named by `<?xml ... encoding="..."?>`, `<meta charset="...">` or
/// `<meta http-equiv="Content-Type" content="...; charset=...">`.
fn declared_encoding(head: &[u8]) -> Option<&'static Encoding> {
    let text: String = head.iter().map(|&b| (b as char).to_ascii_lowercase()).collect();

    let label = if text.trim_start().starts_with("<?xml") {
        let declaration_end = text.find("?>").unwrap_or(text.len());
        attribute_value(&text[..declaration_end], "encoding=")
    } else {
        None
    };

    let label = label.or_else(|| {
        text.find("<meta")
            .and_then(|start| attribute_value(&text[start..], "charset="))
    })?;

    let encoding = Encoding::for_label(label.as_bytes())?;
    // A page that declares UTF-16 yet reached us without a BOM is ASCII-compatible.
    if encoding == UTF_16LE || encoding == UTF_16BE {
        return Some(UTF_8);
    }
    Some(encoding)
}

fn attribute_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let start = text.find(key)? + key.len();
    let rest = text[start..].trim_start_matches(['"', '\'', ' ']);
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
        .unwrap_or(rest.len());
    let value = &rest[..end];
    (!value.is_empty()).then_some(value)
}

/// Recognize BOM-less UTF-16 from mostly-ASCII text: nine in ten code units
/// must have a zero high byte and a printable low byte.
pub(crate) fn utf16_without_bom(content: &[u8]) -> Option<&'static Encoding> {
    let sample = &content[..content.len().min(4096)];
    let units = sample.len() / 2;
    if units < 2 {
        return None;
    }

    let texty = |b: u8| b.is_ascii_graphic() || matches!(b, b' ' | b'\t' | b'\r' | b'\n');
    let (mut little, mut big) = (0usize, 0usize);
    for pair in sample.chunks_exact(2) {
        if pair[1] == 0 && texty(pair[0]) {
            little += 1;
        }
        if pair[0] == 0 && texty(pair[1]) {
            big += 1;
        }
    }

    if little * 10 >= units * 9 {
        Some(UTF_16LE)
    } else if big * 10 >= units * 9 {
        Some(UTF_16BE)
    } else {
        None
    }
}
