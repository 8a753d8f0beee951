//! Built-in decoders and their registration.

use crate::Result;
use crate::plugins::registry::get_decoder_registry;
use once_cell::sync::Lazy;
use std::sync::Arc;

pub mod html;
pub mod text;
pub mod xml;

#[cfg(feature = "archives")]
pub mod archive;

#[cfg(feature = "images")]
pub mod image;

pub use html::HtmlDecoder;
pub use text::PlainTextDecoder;
pub use xml::XmlDecoder;

#[cfg(feature = "archives")]
pub use archive::{TarDecoder, ZipDecoder};

#[cfg(feature = "images")]
pub use image::ImageDecoder;

/// Names of the built-in decoders. They stay registered for the life of the
/// process; [`unregister_decoder`](crate::plugins::unregister_decoder)
/// refuses them.
pub const BUILTIN_DECODER_NAMES: &[&str] = &[
    "plain-text-decoder",
    "html-decoder",
    "xml-decoder",
    "zip-decoder",
    "tar-decoder",
    "image-decoder",
];

pub fn is_builtin_decoder(name: &str) -> bool {
    BUILTIN_DECODER_NAMES.contains(&name)
}

static DECODERS_INITIALIZED: Lazy<Result<()>> = Lazy::new(register_default_decoders);

/// Register the built-in decoders once per process.
pub fn ensure_initialized() -> Result<()> {
    DECODERS_INITIALIZED
        .as_ref()
        .map(|_| ())
        .map_err(|e| crate::DocsiftError::Plugin {
            message: format!("Failed to register default decoders: {}", e),
            plugin_name: "built-in-decoders".to_string(),
        })
}

/// Register every built-in decoder enabled by the active features.
pub fn register_default_decoders() -> Result<()> {
    let registry = get_decoder_registry();
    let mut registry = registry
        .write()
        .map_err(|e| crate::DocsiftError::LockPoisoned(format!("Decoder registry: {}", e)))?;

    registry.register(Arc::new(PlainTextDecoder::new()))?;
    registry.register(Arc::new(HtmlDecoder::new()))?;
    registry.register(Arc::new(XmlDecoder::new()))?;

    #[cfg(feature = "archives")]
    {
        registry.register(Arc::new(ZipDecoder::new()))?;
        registry.register(Arc::new(TarDecoder::new()))?;
    }

    #[cfg(feature = "images")]
    registry.register(Arc::new(ImageDecoder::new()))?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::config::DocsiftConfig;
    use crate::core::context::ParseContext;
    use crate::core::decoder_config::DecoderConfig;
    use crate::handlers::{BodyContentHandler, RichTextDecorator, TextContentHandler};
    use crate::plugins::DocumentDecoder;
    use crate::types::Metadata;
    use crate::Result;

    /// Run one decoder without the pipeline; returns body text and metadata.
    pub(crate) fn decode_text(
        decoder: &dyn DocumentDecoder,
        content: &[u8],
        mime_type: &str,
        config: &DecoderConfig,
    ) -> Result<(String, Metadata)> {
        let settings = DocsiftConfig::default();
        let ctx = ParseContext::new(config, &settings);
        let mut metadata = Metadata::new();
        let mut text = TextContentHandler::new();
        {
            let mut handler = BodyContentHandler::new(RichTextDecorator::new(&mut text));
            decoder.decode(content, mime_type, &mut metadata, &mut handler, &ctx)?;
        }
        Ok((text.into_text(), metadata))
    }
}
