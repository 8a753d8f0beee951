//! Public extraction entry points.
//!
//! Every entry point takes an [`ExtractionRequest`] and the process-level
//! [`DocsiftConfig`]. The pipeline is blocking; with the `tokio-runtime`
//! feature each entry point has an `_async` twin that runs it on the
//! blocking thread pool.
//!
//! ```rust,no_run
//! use docsift::{DocsiftConfig, ExtractionRequest, extract_text};
//!
//! let config = DocsiftConfig::default();
//! let request = ExtractionRequest::new("report.html").with_option("outputEncoding", "UTF-8".into());
//! let text = extract_text(&request, &config)?;
//! println!("{}", text.content);
//! # Ok::<(), docsift::DocsiftError>(())
//! ```

use crate::core::charset;
use crate::core::config::DocsiftConfig;
use crate::core::io::Locator;
use crate::core::mime;
use crate::core::pipeline::{Pipeline, open_source, prepare};
use crate::handlers::{
    BodyContentHandler, DiscardContentHandler, MarkupContentHandler, RichTextDecorator, TextContentHandler,
};
use crate::types::{ExtractionResult, MarkupFormat, Metadata, TextExtraction};
use crate::Result;
use serde_json::{Map, Value};

/// One extraction call: what to read and how.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub locator: Locator,
    /// Content-type override; takes precedence over `contentType` in `options`.
    pub content_type: Option<String>,
    /// Output encoding; takes precedence over `outputEncoding` in `options`.
    pub output_encoding: Option<String>,
    /// Untyped option set, parsed before the locator is opened.
    pub options: Map<String, Value>,
}

impl ExtractionRequest {
    pub fn new(locator: impl Into<Locator>) -> Self {
        Self {
            locator: locator.into(),
            content_type: None,
            output_encoding: None,
            options: Map::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_output_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.output_encoding = Some(encoding.into());
        self
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Plain text of the document body.
///
/// Images with alt text and named anchors contribute `[image: ...]` and
/// `[bookmark: ...]` markers.
///
/// # Errors
///
/// - `DocsiftError::Validation` for malformed options, before any I/O
/// - `DocsiftError::Io` / `DocsiftError::Network` when the locator cannot be read
/// - `DocsiftError::UnsupportedFormat` when no decoder handles the resolved type
/// - `DocsiftError::Encrypted`, `DocsiftError::Parsing` from the decoder
#[tracing::instrument(skip(request, config), fields(locator = %request.locator))]
pub fn extract_text(request: &ExtractionRequest, config: &DocsiftConfig) -> Result<TextExtraction> {
    let mut text = TextContentHandler::new();
    let decoded = {
        let mut handler = BodyContentHandler::new(RichTextDecorator::new(&mut text));
        Pipeline::new(config).run(request, &mut handler)?
    };

    Ok(TextExtraction {
        content: text.into_text(),
        output_encoding: decoded.output_encoding,
    })
}

/// The document serialized as XHTML or HTML, head metadata included.
#[tracing::instrument(skip(request, config), fields(locator = %request.locator))]
pub fn extract_markup(request: &ExtractionRequest, format: MarkupFormat, config: &DocsiftConfig) -> Result<String> {
    let mut markup = MarkupContentHandler::new(format);
    Pipeline::new(config).run(request, &mut markup)?;
    Ok(markup.into_string())
}

/// Metadata only; decoded content is discarded.
#[tracing::instrument(skip(request, config), fields(locator = %request.locator))]
pub fn extract_metadata(request: &ExtractionRequest, config: &DocsiftConfig) -> Result<Metadata> {
    let mut discard = DiscardContentHandler;
    let decoded = Pipeline::new(config).run(request, &mut discard)?;
    Ok(decoded.metadata)
}

/// Text, metadata and resolved type from a single decode.
#[tracing::instrument(skip(request, config), fields(locator = %request.locator))]
pub fn extract(request: &ExtractionRequest, config: &DocsiftConfig) -> Result<ExtractionResult> {
    let mut text = TextContentHandler::new();
    let decoded = {
        let mut handler = BodyContentHandler::new(RichTextDecorator::new(&mut text));
        Pipeline::new(config).run(request, &mut handler)?
    };

    Ok(ExtractionResult {
        content: text.into_text(),
        output_encoding: decoded.output_encoding,
        mime_type: decoded.mime_type,
        metadata: decoded.metadata,
    })
}

/// Media type of the document. Never empty: undecidable content is
/// `application/octet-stream`.
///
/// A surviving content-type hint is returned as is, without reading the
/// content.
#[tracing::instrument(skip(request, config), fields(locator = %request.locator))]
pub fn detect_content_type(request: &ExtractionRequest, config: &DocsiftConfig) -> Result<String> {
    let prepared = prepare(request, config)?;
    let (mut source, hints) = open_source(&request.locator, prepared.explicit_content_type.as_deref(), config)?;
    Pipeline::new(config).detector(&hints).detect(&mut source, &hints)
}

/// Character encoding of the document, or `None` when undecidable (empty or
/// unreadable content).
#[tracing::instrument(skip(request, config), fields(locator = %request.locator))]
pub fn detect_charset(request: &ExtractionRequest, config: &DocsiftConfig) -> Result<Option<String>> {
    let prepared = prepare(request, config)?;
    let (mut source, hints) = open_source(&request.locator, prepared.explicit_content_type.as_deref(), config)?;
    Ok(charset::detect_charset(&mut source, &hints).map(|detected| detected.name().to_string()))
}

/// `type; charset=cs`, or just the type when the charset is undecidable.
///
/// Equals [`detect_content_type`] and [`detect_charset`] joined with
/// `"; charset="` for the same request. A `charset` parameter already on the
/// detected type is replaced rather than repeated.
#[tracing::instrument(skip(request, config), fields(locator = %request.locator))]
pub fn detect_content_type_and_charset(request: &ExtractionRequest, config: &DocsiftConfig) -> Result<String> {
    let prepared = prepare(request, config)?;
    let (mut source, hints) = open_source(&request.locator, prepared.explicit_content_type.as_deref(), config)?;

    let mime_type = Pipeline::new(config).detector(&hints).detect(&mut source, &hints)?;
    match charset::detect_charset(&mut source, &hints) {
        Some(detected) => Ok(format!(
            "{}; charset={}",
            mime::without_charset_param(&mime_type),
            detected.name()
        )),
        None => Ok(mime_type),
    }
}

#[cfg(feature = "tokio-runtime")]
mod nonblocking {
    use super::*;
    use crate::DocsiftError;
    use crate::types::LanguageDetection;

    async fn blocking<T, F>(task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(task)
            .await
            .map_err(|e| DocsiftError::Other(format!("Extraction task failed: {}", e)))?
    }

    pub async fn extract_text_async(request: ExtractionRequest, config: DocsiftConfig) -> Result<TextExtraction> {
        blocking(move || extract_text(&request, &config)).await
    }

    pub async fn extract_markup_async(
        request: ExtractionRequest,
        format: MarkupFormat,
        config: DocsiftConfig,
    ) -> Result<String> {
        blocking(move || extract_markup(&request, format, &config)).await
    }

    pub async fn extract_metadata_async(request: ExtractionRequest, config: DocsiftConfig) -> Result<Metadata> {
        blocking(move || extract_metadata(&request, &config)).await
    }

    pub async fn extract_async(request: ExtractionRequest, config: DocsiftConfig) -> Result<ExtractionResult> {
        blocking(move || extract(&request, &config)).await
    }

    pub async fn detect_content_type_async(request: ExtractionRequest, config: DocsiftConfig) -> Result<String> {
        blocking(move || detect_content_type(&request, &config)).await
    }

    pub async fn detect_charset_async(request: ExtractionRequest, config: DocsiftConfig) -> Result<Option<String>> {
        blocking(move || detect_charset(&request, &config)).await
    }

    pub async fn detect_content_type_and_charset_async(
        request: ExtractionRequest,
        config: DocsiftConfig,
    ) -> Result<String> {
        blocking(move || detect_content_type_and_charset(&request, &config)).await
    }

    pub async fn detect_language_async(text: String) -> Result<LanguageDetection> {
        blocking(move || Ok(crate::language_detection::detect_language(&text))).await
    }
}

#[cfg(feature = "tokio-runtime")]
pub use nonblocking::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocsiftError;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, content: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_builder_fields() {
        let request = ExtractionRequest::new("https://example.com/a.txt")
            .with_content_type("text/plain")
            .with_output_encoding("UTF-16LE")
            .with_option("password", json!("secret"));

        assert!(request.locator.is_network());
        assert_eq!(request.content_type.as_deref(), Some("text/plain"));
        assert_eq!(request.output_encoding.as_deref(), Some("UTF-16LE"));
        assert_eq!(request.options.get("password"), Some(&json!("secret")));
    }

    #[test]
    fn test_detect_content_type_honors_override() {
        let file = temp_file(".txt", b"plain words");
        let config = DocsiftConfig::default();
        let request = ExtractionRequest::new(file.path()).with_content_type("application/pdf");

        assert_eq!(detect_content_type(&request, &config).unwrap(), "application/pdf");
    }

    #[test]
    fn test_detect_charset_empty_file_is_undecidable() {
        let file = temp_file(".txt", b"");
        let config = DocsiftConfig::default();
        let request = ExtractionRequest::new(file.path());

        assert_eq!(detect_charset(&request, &config).unwrap(), None);
        assert_eq!(
            detect_content_type_and_charset(&request, &config).unwrap(),
            detect_content_type(&request, &config).unwrap()
        );
    }

    #[test]
    fn test_malformed_option_fails_before_open() {
        let config = DocsiftConfig::default();
        let request = ExtractionRequest::new("/definitely/not/here.txt").with_option("spacingTolerance", json!("abc"));

        let err = extract_text(&request, &config).unwrap_err();
        assert!(matches!(err, DocsiftError::Validation { .. }));
        assert!(!err.is_resource_error());
    }
}
