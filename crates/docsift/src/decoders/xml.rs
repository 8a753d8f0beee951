//! Generic XML decoder.
//!
//! Character data is collected with a streaming `quick-xml` reader, one run per
//! stretch of text between tags, and the trimmed runs are joined with single
//! spaces into one paragraph. The first `title` element (RSS, Atom and SVG all
//! carry one) also becomes `dc:title`.

use crate::core::charset::detect_charset_bytes;
use crate::core::context::ParseContext;
use crate::core::hints::HintBag;
use crate::core::mime;
use crate::handlers::{ContentHandler, XhtmlWriter};
use crate::plugins::{DocumentDecoder, Plugin};
use crate::types::{Metadata, keys};
use crate::{DocsiftError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Text and title gathered from one XML document.
#[derive(Debug, Default, PartialEq)]
struct XmlText {
    content: String,
    title: Option<String>,
}

/// Decoder for XML text types: `text/xml`, SVG, RSS and Atom.
pub struct XmlDecoder;

impl XmlDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XmlDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for XmlDecoder {
    fn name(&self) -> &str {
        "xml-decoder"
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
        "Extracts character data from XML documents"
    }

    fn author(&self) -> &str {
        "docsift developers"
    }
}

impl DocumentDecoder for XmlDecoder {
    fn decode(
        &self,
        content: &[u8],
        mime_type: &str,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        _ctx: &ParseContext<'_>,
    ) -> Result<()> {
        let xml = match detect_charset_bytes(content, &HintBag::resolved(mime_type)) {
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

        let text = collect_text(&xml)?;
        if let Some(title) = text.title {
            metadata.set(keys::TITLE, title);
        }

        let mut writer = XhtmlWriter::new(handler);
        writer.start_document(metadata)?;
        if !text.content.is_empty() {
            writer.element("p", &text.content)?;
        }
        writer.end_document()
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[
            mime::XML_TEXT_MIME_TYPE,
            mime::SVG_MIME_TYPE,
            "application/rss+xml",
            "application/atom+xml",
        ]
    }
}

fn collect_text(xml: &str) -> Result<XmlText> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut runs: Vec<String> = Vec::new();
    let mut run = String::new();
    let mut title: Option<String> = None;
    let mut title_depth: Option<usize> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                flush_run(&mut run, &mut runs);
                depth += 1;
                if title.is_none() && title_depth.is_none() && e.local_name().as_ref() == b"title" {
                    title_depth = Some(depth);
                    title = Some(String::new());
                }
            }
            Ok(Event::End(_)) => {
                if title_depth == Some(depth) {
                    title_depth = None;
                }
                depth = depth.saturating_sub(1);
                flush_run(&mut run, &mut runs);
            }
            Ok(Event::Empty(_)) => flush_run(&mut run, &mut runs),
            Ok(Event::Text(e)) => push_piece(&String::from_utf8_lossy(&e), &mut run, &mut title, title_depth),
            Ok(Event::CData(e)) => push_piece(&String::from_utf8_lossy(&e), &mut run, &mut title, title_depth),
            Ok(Event::GeneralRef(e)) => {
                let name = String::from_utf8_lossy(&e);
                push_piece(&resolve_reference(&name), &mut run, &mut title, title_depth);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocsiftError::parsing_with_source(
                    format!("XML parsing error at position {}", reader.buffer_position()),
                    e,
                ));
            }
            Ok(_) => {}
        }
    }
    flush_run(&mut run, &mut runs);

    let title = title
        .map(|title| title.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|title| !title.is_empty());

    Ok(XmlText {
        content: runs.join(" "),
        title,
    })
}

fn push_piece(piece: &str, run: &mut String, title: &mut Option<String>, title_depth: Option<usize>) {
    run.push_str(piece);
    if title_depth.is_some()
        && let Some(title) = title.as_mut()
    {
        title.push_str(piece);
    }
}

fn flush_run(run: &mut String, runs: &mut Vec<String>) {
    let trimmed = run.trim();
    if !trimmed.is_empty() {
        runs.push(trimmed.to_string());
    }
    run.clear();
}

/// Numeric and predefined references; anything else is kept as written.
fn resolve_reference(name: &str) -> String {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => number.parse::<u32>().ok(),
        };
        if let Some(ch) = code.and_then(char::from_u32) {
            return ch.to_string();
        }
    }
    match quick_xml::escape::resolve_predefined_entity(name) {
        Some(text) => text.to_string(),
        None => format!("&{};", name),
    }
}
