//! Plain text and other character-data formats.

use crate::core::charset::detect_charset_bytes;
use crate::core::context::ParseContext;
use crate::core::hints::HintBag;
use crate::core::mime;
use crate::handlers::{ContentHandler, XhtmlWriter};
use crate::plugins::{DocumentDecoder, Plugin};
use crate::types::{Metadata, keys};
use crate::Result;

/// Decoder for text formats rendered verbatim: plain text, CSV/TSV,
/// Markdown source and JSON.
///
/// The whole document becomes one paragraph. `Content-Type` gains the
/// detected charset and `Content-Encoding` names it.
pub struct PlainTextDecoder;

impl PlainTextDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PlainTextDecoder {
    fn name(&self) -> &str {
        "plain-text-decoder"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Decodes plain text, CSV, Markdown and JSON with charset detection"
    }

    fn author(&self) -> &str {
        "docsift developers"
    }
}

impl DocumentDecoder for PlainTextDecoder {
    fn decode(
        &self,
        content: &[u8],
        mime_type: &str,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        _ctx: &ParseContext<'_>,
    ) -> Result<()> {
        let text = match detect_charset_bytes(content, &HintBag::resolved(mime_type)) {
            Some(charset) => {
                metadata.set(
                    keys::CONTENT_TYPE,
                    format!("{}; charset={}", mime::base_type(mime_type), charset.name()),
                );
                metadata.set(keys::CONTENT_ENCODING, charset.name());
                charset.decode(content)
            }
            None => String::new(),
        };

        let mut writer = XhtmlWriter::new(handler);
        writer.start_document(metadata)?;
        if !text.is_empty() {
            writer.element("p", &text)?;
        }
        writer.end_document()
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[
            mime::PLAIN_TEXT_MIME_TYPE,
            mime::CSV_MIME_TYPE,
            "text/tab-separated-values",
            mime::MARKDOWN_MIME_TYPE,
            "text/x-markdown",
            mime::JSON_MIME_TYPE,
        ]
    }
}
