//! Per-request state handed to decoders.

use crate::core::config::DocsiftConfig;
use crate::core::decoder_config::DecoderConfig;
use crate::core::hints::HintBag;
use crate::handlers::{BodyContentHandler, ContentHandler, EmbeddedContentHandler};
use crate::types::Metadata;
use crate::{DocsiftError, Result};

/// Decodes embedded members on behalf of container decoders.
///
/// Implemented by the extraction pipeline, which detects the member's type
/// and dispatches to the registry just as it does for top-level documents.
pub trait EmbeddedParser: Send + Sync {
    /// Decode one member into `handler`. Returns the member's media type.
    fn parse_embedded(
        &self,
        content: &[u8],
        hints: &HintBag,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        ctx: &ParseContext<'_>,
    ) -> Result<String>;
}

/// Decoder settings plus the embedded-document recursion state for one
/// request.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    config: &'a DecoderConfig,
    depth: usize,
    max_depth: usize,
    max_member_size: u64,
    embedded: Option<&'a dyn EmbeddedParser>,
}

impl<'a> ParseContext<'a> {
    pub fn new(config: &'a DecoderConfig, settings: &DocsiftConfig) -> Self {
        Self {
            config,
            depth: 0,
            max_depth: settings.max_embedding_depth,
            max_member_size: settings.max_document_size,
            embedded: None,
        }
    }

    /// Enable recursive decoding of embedded members.
    pub fn bind_embedded_parser(mut self, parser: &'a dyn EmbeddedParser) -> Self {
        self.embedded = Some(parser);
        self
    }

    pub fn decoder_config(&self) -> &'a DecoderConfig {
        self.config
    }

    /// Nesting depth: 0 for the requested document.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Largest member a container decoder should inflate.
    pub fn max_member_size(&self) -> u64 {
        self.max_member_size
    }

    pub fn password_for(&self, metadata: &Metadata) -> Option<String> {
        self.config.password_for(metadata)
    }

    /// Decode an embedded member into the container's stream.
    ///
    /// The member's own document boundaries and head are dropped; only its
    /// body content reaches `handler`. Without a bound parser the member is
    /// skipped.
    ///
    /// # Errors
    ///
    /// `DocsiftError::RecursionLimit` when the member would sit deeper than
    /// the configured maximum, plus whatever the member's decoder returns.
    pub fn parse_embedded(&self, content: &[u8], name: Option<&str>, handler: &mut dyn ContentHandler) -> Result<()> {
        let Some(parser) = self.embedded else {
            tracing::debug!(member = name, "No embedded parser bound, skipping member");
            return Ok(());
        };

        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(DocsiftError::RecursionLimit { depth: self.max_depth });
        }

        let child = Self { depth, ..*self };
        let hints = HintBag::for_member(name);
        let mut metadata = Metadata::new();
        let mut member_handler = BodyContentHandler::new(EmbeddedContentHandler::new(handler));

        let mime_type = parser.parse_embedded(content, &hints, &mut metadata, &mut member_handler, &child)?;
        tracing::debug!(member = name, depth, mime_type = %mime_type, "Decoded embedded member");
        Ok(())
    }
}

impl std::fmt::Debug for ParseContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseContext")
            .field("config", &self.config)
            .field("depth", &self.depth)
            .field("max_depth", &self.max_depth)
            .field("embedded", &self.embedded.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{ContentEvent, XhtmlWriter};
    use std::sync::Mutex;

    /// Emits the member bytes as one paragraph and records the depth it ran at.
    struct EchoParser {
        depths: Mutex<Vec<usize>>,
    }

    impl EmbeddedParser for EchoParser {
        fn parse_embedded(
            &self,
            content: &[u8],
            _hints: &HintBag,
            metadata: &mut Metadata,
            handler: &mut dyn ContentHandler,
            ctx: &ParseContext<'_>,
        ) -> Result<String> {
            self.depths.lock().unwrap().push(ctx.depth());
            metadata.set("member", "yes");
            let mut writer = XhtmlWriter::new(handler);
            writer.start_document(metadata)?;
            writer.element("p", &String::from_utf8_lossy(content))?;
            writer.end_document()?;
            Ok("text/plain".to_string())
        }
    }

    fn settings(max_depth: usize) -> DocsiftConfig {
        DocsiftConfig {
            max_embedding_depth: max_depth,
            ..DocsiftConfig::default()
        }
    }

    #[test]
    fn test_member_body_spliced_into_stream() {
        let config = DecoderConfig::default();
        let settings = settings(4);
        let parser = EchoParser {
            depths: Mutex::new(Vec::new()),
        };
        let ctx = ParseContext::new(&config, &settings).bind_embedded_parser(&parser);

        let mut events: Vec<ContentEvent> = Vec::new();
        ctx.parse_embedded(b"inner", Some("a.txt"), &mut events).unwrap();

        assert_eq!(
            events,
            vec![
                ContentEvent::start("p"),
                ContentEvent::text("inner"),
                ContentEvent::end("p"),
                ContentEvent::IgnorableWhitespace("\n".to_string()),
            ]
        );
        assert_eq!(*parser.depths.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_depth_limit() {
        let config = DecoderConfig::default();
        let settings = settings(0);
        let parser = EchoParser {
            depths: Mutex::new(Vec::new()),
        };
        let ctx = ParseContext::new(&config, &settings).bind_embedded_parser(&parser);

        let mut events: Vec<ContentEvent> = Vec::new();
        let err = ctx.parse_embedded(b"inner", None, &mut events).unwrap_err();
        assert!(matches!(err, DocsiftError::RecursionLimit { depth: 0 }));
        assert!(events.is_empty());
    }

    #[test]
    fn test_unbound_parser_skips_member() {
        let config = DecoderConfig::default();
        let settings = DocsiftConfig::default();
        let ctx = ParseContext::new(&config, &settings);

        let mut events: Vec<ContentEvent> = Vec::new();
        ctx.parse_embedded(b"inner", None, &mut events).unwrap();
        assert!(events.is_empty());
        assert_eq!(ctx.depth(), 0);
    }
}
