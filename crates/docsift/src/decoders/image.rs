//! Raster images: dimensions, plus OCR text when an engine is configured.

use crate::core::context::ParseContext;
use crate::handlers::{Attributes, ContentHandler, XhtmlWriter};
use crate::ocr::run_ocr;
use crate::plugins::{DocumentDecoder, Plugin};
use crate::types::{Metadata, keys};
use crate::{DocsiftError, Result};
use image::{ImageError, ImageReader};
use std::io::Cursor;

/// Decoder registered for `image/*`.
///
/// Width and height are read from the image header without decoding pixels.
/// OCR runs only when enabled, the input size is within bounds and the engine
/// resolves; an engine that cannot be found is logged and skipped.
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ImageDecoder {
    fn name(&self) -> &str {
        "image-decoder"
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
        "Reads image dimensions and runs OCR when configured"
    }

    fn author(&self) -> &str {
        "docsift developers"
    }
}

impl DocumentDecoder for ImageDecoder {
    fn decode(
        &self,
        content: &[u8],
        mime_type: &str,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        ctx: &ParseContext<'_>,
    ) -> Result<()> {
        if let Some((width, height)) = dimensions(content, mime_type)? {
            metadata.set(keys::IMAGE_WIDTH, width.to_string());
            metadata.set(keys::IMAGE_LENGTH, height.to_string());
        }

        let text = recognize(content, ctx)?;

        let mut writer = XhtmlWriter::new(handler);
        writer.start_document(metadata)?;
        if let Some(text) = text {
            writer.start_element_with("div", Attributes::new().with("class", "ocr"))?;
            for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
                writer.element("p", paragraph)?;
            }
            writer.end_element("div")?;
        }
        writer.end_document()
    }

    fn supported_mime_types(&self) -> &[&str] {
        &["image/*"]
    }

    fn priority(&self) -> i32 {
        40
    }
}

fn dimensions(content: &[u8], mime_type: &str) -> Result<Option<(u32, u32)>> {
    let reader = ImageReader::new(Cursor::new(content))
        .with_guessed_format()
        .map_err(|e| DocsiftError::parsing_with_source("Failed to read image header", e))?;

    match reader.into_dimensions() {
        Ok(dimensions) => Ok(Some(dimensions)),
        Err(ImageError::Unsupported(e)) => {
            tracing::debug!(mime_type, error = %e, "Image format not readable, skipping dimensions");
            Ok(None)
        }
        Err(e) => Err(DocsiftError::parsing_with_source("Failed to read image dimensions", e)),
    }
}

fn recognize(content: &[u8], ctx: &ParseContext<'_>) -> Result<Option<String>> {
    let ocr = &ctx.decoder_config().ocr;
    if !ocr.enabled {
        return Ok(None);
    }
    if !ocr.accepts_size(content.len() as u64) {
        tracing::debug!(
            size = content.len(),
            min = ocr.min_file_size,
            max = ocr.max_file_size,
            "Image outside OCR size bounds"
        );
        return Ok(None);
    }
    if ocr.resolve_executable().is_none() {
        tracing::warn!(
            engine = %ocr.executable.display(),
            "OCR enabled but the engine is not available, skipping"
        );
        return Ok(None);
    }

    run_ocr(content, ocr).map(Some)
}
