//! Media type constants, parsing helpers and the type normalizer.
//!
//! Media types arrive from three places: an explicit caller override, a
//! header declared by a remote endpoint, and the resource name. Before any of
//! them is allowed to short-circuit sniffing it goes through
//! [`normalize_content_type`], which drops hints that carry no information.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";
pub const UNKNOWN_CONTENT_MIME_TYPE: &str = "content/unknown";

pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const HTML_MIME_TYPE: &str = "text/html";
pub const XHTML_MIME_TYPE: &str = "application/xhtml+xml";
pub const XML_MIME_TYPE: &str = "application/xml";
pub const XML_TEXT_MIME_TYPE: &str = "text/xml";
pub const SVG_MIME_TYPE: &str = "image/svg+xml";
pub const JSON_MIME_TYPE: &str = "application/json";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const ZIP_MIME_TYPE: &str = "application/zip";
pub const TAR_MIME_TYPE: &str = "application/x-tar";
pub const GZIP_MIME_TYPE: &str = "application/gzip";

/// Extension to media type mapping, consulted before `mime_guess`.
static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("txt", PLAIN_TEXT_MIME_TYPE);
    m.insert("text", PLAIN_TEXT_MIME_TYPE);
    m.insert("log", PLAIN_TEXT_MIME_TYPE);
    m.insert("md", MARKDOWN_MIME_TYPE);
    m.insert("markdown", MARKDOWN_MIME_TYPE);
    m.insert("csv", CSV_MIME_TYPE);
    m.insert("tsv", "text/tab-separated-values");
    m.insert("json", JSON_MIME_TYPE);

    m.insert("html", HTML_MIME_TYPE);
    m.insert("htm", HTML_MIME_TYPE);
    m.insert("xhtml", XHTML_MIME_TYPE);
    m.insert("xml", XML_MIME_TYPE);
    m.insert("svg", SVG_MIME_TYPE);
    m.insert("rss", "application/rss+xml");
    m.insert("atom", "application/atom+xml");

    m.insert("pdf", PDF_MIME_TYPE);
    m.insert("docx", DOCX_MIME_TYPE);
    m.insert("doc", "application/msword");
    m.insert("rtf", "application/rtf");

    m.insert("bmp", "image/bmp");
    m.insert("gif", "image/gif");
    m.insert("jpg", "image/jpeg");
    m.insert("jpeg", "image/jpeg");
    m.insert("png", "image/png");
    m.insert("tiff", "image/tiff");
    m.insert("tif", "image/tiff");
    m.insert("webp", "image/webp");

    m.insert("zip", ZIP_MIME_TYPE);
    m.insert("tar", TAR_MIME_TYPE);
    m.insert("gz", GZIP_MIME_TYPE);
    m.insert("7z", "application/x-7z-compressed");

    m
});

/// Base type of a media type string: lowercased, parameters and whitespace removed.
///
/// `"Text/HTML; charset=UTF-8"` becomes `"text/html"`.
pub fn base_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Subtype of a media type string, lowercased, without parameters.
pub fn subtype(content_type: &str) -> Option<String> {
    let base = base_type(content_type);
    base.split_once('/').map(|(_, sub)| sub.to_string()).filter(|s| !s.is_empty())
}

/// Value of the `charset` parameter, if present.
pub fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'').trim();
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// The media type with any `charset` parameter removed. Other parameters are
/// kept in order.
pub fn without_charset_param(content_type: &str) -> String {
    let mut parts = content_type.split(';');
    let mut result = parts.next().unwrap_or_default().trim().to_string();
    for param in parts {
        let param = param.trim();
        let is_charset = param
            .split_once('=')
            .is_some_and(|(key, _)| key.trim().eq_ignore_ascii_case("charset"));
        if !param.is_empty() && !is_charset {
            result.push_str("; ");
            result.push_str(param);
        }
    }
    result
}

/// Drop uninformative content-type hints.
///
/// Returns `None` for a generic XML wrapper (`*/xml`), for
/// `application/octet-stream`, for the `content/unknown` placeholder some
/// network layers report, and for blank input. Anything else is returned
/// unchanged, parameters included.
///
/// The function is idempotent.
pub fn normalize_content_type(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }

    let base = base_type(trimmed);
    if subtype(&base).as_deref() == Some("xml") {
        return None;
    }
    if base == OCTET_STREAM_MIME_TYPE || base == UNKNOWN_CONTENT_MIME_TYPE {
        return None;
    }

    Some(trimmed.to_string())
}

/// Media type implied by a resource name, if any.
///
/// The extension table is consulted first, then `mime_guess`.
pub fn mime_from_resource_name(name: &str) -> Option<String> {
    let path = Path::new(name);
    let extension = path.extension().and_then(|ext| ext.to_str()).map(|s| s.to_lowercase())?;

    if let Some(mime_type) = EXT_TO_MIME.get(extension.as_str()) {
        return Some(mime_type.to_string());
    }

    mime_guess::from_ext(&extension)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .filter(|mime| mime != OCTET_STREAM_MIME_TYPE)
}

/// True for types handled as XML markup (`text/xml`, `application/xml`, `*+xml`).
pub fn is_xml_type(content_type: &str) -> bool {
    let base = base_type(content_type);
    base == XML_MIME_TYPE || base == XML_TEXT_MIME_TYPE || base.ends_with("+xml")
}

pub fn is_html_type(content_type: &str) -> bool {
    let base = base_type(content_type);
    base == HTML_MIME_TYPE || base == XHTML_MIME_TYPE
}

/// True for JSON types, whose encoding is UTF-8 unless a BOM says otherwise.
pub fn is_json_type(content_type: &str) -> bool {
    let base = base_type(content_type);
    base == JSON_MIME_TYPE || base.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type_strips_parameters() {
        assert_eq!(base_type("Text/HTML; charset=UTF-8"), "text/html");
        assert_eq!(base_type("  application/pdf "), "application/pdf");
    }

    #[test]
    fn test_charset_param() {
        assert_eq!(charset_param("text/plain; charset=ISO-8859-1").as_deref(), Some("ISO-8859-1"));
        assert_eq!(charset_param("text/plain;CHARSET=\"utf-8\"").as_deref(), Some("utf-8"));
        assert_eq!(charset_param("text/plain"), None);
        assert_eq!(charset_param("text/plain; charset="), None);
    }

    #[test]
    fn test_without_charset_param() {
        assert_eq!(without_charset_param("text/plain; charset=UTF-8"), "text/plain");
        assert_eq!(
            without_charset_param("text/html;Charset=\"utf-8\"; level=1"),
            "text/html; level=1"
        );
        assert_eq!(without_charset_param("application/json"), "application/json");
    }

    #[test]
    fn test_normalize_drops_generic_xml() {
        assert_eq!(normalize_content_type("application/xml"), None);
        assert_eq!(normalize_content_type("text/xml; charset=UTF-8"), None);
    }

    #[test]
    fn test_normalize_drops_placeholders() {
        assert_eq!(normalize_content_type("application/octet-stream"), None);
        assert_eq!(normalize_content_type("APPLICATION/OCTET-STREAM"), None);
        assert_eq!(normalize_content_type("content/unknown"), None);
        assert_eq!(normalize_content_type("   "), None);
    }

    #[test]
    fn test_normalize_keeps_informative_types() {
        assert_eq!(normalize_content_type("text/html").as_deref(), Some("text/html"));
        assert_eq!(
            normalize_content_type("application/xhtml+xml").as_deref(),
            Some("application/xhtml+xml")
        );
        assert_eq!(
            normalize_content_type("text/plain; charset=UTF-8").as_deref(),
            Some("text/plain; charset=UTF-8")
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for candidate in [
            "application/xml",
            "application/octet-stream",
            "content/unknown",
            "text/plain",
            "image/svg+xml",
            "application/zip",
        ] {
            let once = normalize_content_type(candidate);
            let twice = once.as_deref().and_then(normalize_content_type);
            assert_eq!(once, twice, "not idempotent for {}", candidate);
        }
    }

    #[test]
    fn test_mime_from_resource_name() {
        assert_eq!(mime_from_resource_name("file.txt").as_deref(), Some("text/plain"));
        assert_eq!(mime_from_resource_name("INDEX.HTML").as_deref(), Some("text/html"));
        assert_eq!(mime_from_resource_name("archive.zip").as_deref(), Some("application/zip"));
        assert_eq!(mime_from_resource_name("noextension"), None);
    }

    #[test]
    fn test_mime_guess_fallback() {
        assert_eq!(
            mime_from_resource_name("slides.odp").as_deref(),
            Some("application/vnd.oasis.opendocument.presentation")
        );
    }

    #[test]
    fn test_type_predicates() {
        assert!(is_xml_type("image/svg+xml"));
        assert!(is_xml_type("text/xml"));
        assert!(!is_xml_type("text/html"));
        assert!(is_html_type("application/xhtml+xml; charset=UTF-8"));
        assert!(is_json_type("application/ld+json"));
    }
}
