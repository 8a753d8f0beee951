//! Request pipeline shared by every entry point.
//!
//! Setup runs in a fixed order: options are parsed and the decoder
//! configuration assembled before the locator is opened, so malformed
//! options fail without any I/O. Then the resource is opened, hints are
//! accumulated, the detector is composed and the winning decoder runs.

use crate::core::config::DocsiftConfig;
use crate::core::context::{EmbeddedParser, ParseContext};
use crate::core::decoder_config::DecoderConfig;
use crate::core::detect::Detector;
use crate::core::extractor::ExtractionRequest;
use crate::core::hints::HintBag;
use crate::core::io::{self, DocumentSource, Locator};
use crate::core::options::ExtractionOptions;
use crate::handlers::ContentHandler;
use crate::plugins::registry::get_decoder_registry;
use crate::types::{Metadata, keys, resolve_output_encoding};
use crate::{DocsiftError, Result};

/// Request settings validated before any I/O.
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub decoder_config: DecoderConfig,
    pub explicit_content_type: Option<String>,
    /// Canonical name of the requested output encoding.
    pub output_encoding: String,
}

/// Parse the option set and resolve the output encoding.
///
/// The request's own fields win over the same keys inside the option set.
pub(crate) fn prepare(request: &ExtractionRequest, settings: &DocsiftConfig) -> Result<PreparedRequest> {
    let options = ExtractionOptions::from_map(&request.options)?;
    let decoder_config = DecoderConfig::assemble(&options);

    let label = request
        .output_encoding
        .as_deref()
        .or(options.output_encoding.as_deref())
        .unwrap_or(settings.default_output_encoding.as_str());
    let output_encoding = resolve_output_encoding(label)?.name().to_string();

    let explicit_content_type = request.content_type.clone().or(options.content_type);

    Ok(PreparedRequest {
        decoder_config,
        explicit_content_type,
        output_encoding,
    })
}

/// Open the locator and collect its hints. Content is not read yet.
pub(crate) fn open_source(
    locator: &Locator,
    explicit_content_type: Option<&str>,
    settings: &DocsiftConfig,
) -> Result<(DocumentSource, HintBag)> {
    let resource = io::open(locator, &settings.network, settings.max_document_size)?;
    let hints = HintBag::accumulate(
        explicit_content_type,
        resource.declared_content_type.as_deref(),
        resource.resource_name.clone(),
    );
    let source = DocumentSource::from_resource(resource, locator, settings.max_document_size);
    Ok((source, hints))
}

/// Outcome of a full decode.
#[derive(Debug)]
pub(crate) struct Decoded {
    pub mime_type: String,
    pub metadata: Metadata,
    pub output_encoding: String,
}

/// Detection plus registry dispatch, for top-level documents and embedded
/// members alike.
pub(crate) struct Pipeline<'c> {
    settings: &'c DocsiftConfig,
}

impl<'c> Pipeline<'c> {
    pub fn new(settings: &'c DocsiftConfig) -> Self {
        Self { settings }
    }

    pub fn detector(&self, hints: &HintBag) -> Detector {
        Detector::for_hints(hints, self.settings.trust_content_type_hints)
    }

    /// Run a request end to end, streaming events into `handler`.
    pub fn run(&self, request: &ExtractionRequest, handler: &mut dyn ContentHandler) -> Result<Decoded> {
        let prepared = prepare(request, self.settings)?;
        let (mut source, hints) = open_source(
            &request.locator,
            prepared.explicit_content_type.as_deref(),
            self.settings,
        )?;

        let mime_type = self.detector(&hints).detect(&mut source, &hints)?;
        let content = source.into_bytes()?;

        let mut metadata = Metadata::new();
        metadata.set(keys::CONTENT_LENGTH, content.len().to_string());
        let ctx = ParseContext::new(&prepared.decoder_config, self.settings).bind_embedded_parser(self);
        self.decode(&content, &mime_type, &hints, &mut metadata, handler, &ctx)?;

        Ok(Decoded {
            mime_type,
            metadata,
            output_encoding: prepared.output_encoding,
        })
    }

    /// Dispatch `content` to the decoder registered for `mime_type`.
    pub fn decode(
        &self,
        content: &[u8],
        mime_type: &str,
        hints: &HintBag,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        ctx: &ParseContext<'_>,
    ) -> Result<()> {
        crate::decoders::ensure_initialized()?;

        // The lock guard is released before decoding so that embedded members
        // can look up their own decoders.
        let decoder = {
            let registry = get_decoder_registry();
            let registry = registry
                .read()
                .map_err(|e| DocsiftError::LockPoisoned(format!("Decoder registry: {}", e)))?;
            registry.get(mime_type)?
        };

        hints.apply_to(metadata);
        metadata.set(keys::CONTENT_TYPE, mime_type);

        tracing::debug!(
            decoder = decoder.name(),
            mime_type,
            depth = ctx.depth(),
            bytes = content.len(),
            "Dispatching to decoder"
        );

        decoder.decode(content, mime_type, metadata, handler, ctx)
    }
}

impl EmbeddedParser for Pipeline<'_> {
    fn parse_embedded(
        &self,
        content: &[u8],
        hints: &HintBag,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        ctx: &ParseContext<'_>,
    ) -> Result<String> {
        let mime_type = self.detector(hints).detect_bytes(content, hints);
        self.decode(content, &mime_type, hints, metadata, handler, ctx)?;
        Ok(mime_type)
    }
}
