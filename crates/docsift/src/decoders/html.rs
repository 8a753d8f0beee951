//! Lenient HTML decoder.
//!
//! Markup is tokenized with `quick-xml` in a forgiving configuration (no end
//! name checks, unmatched end tags allowed, HTML attribute syntax). Head
//! content becomes metadata; body content is mapped onto a small set of safe
//! XHTML elements. Unknown elements are dropped but their text is kept.
//! When the tokenizer gives up on badly broken input, everything read up to
//! that point is still emitted.

use crate::core::charset::detect_charset_bytes;
use crate::core::context::ParseContext;
use crate::core::hints::HintBag;
use crate::core::mime;
use crate::handlers::{Attributes, ContentHandler, XhtmlWriter};
use crate::plugins::{DocumentDecoder, Plugin};
use crate::types::{Metadata, keys};
use crate::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Elements passed through to the event stream, with the attributes each may keep.
const SAFE_ELEMENTS: &[(&str, &[&str])] = &[
    ("p", &[]),
    ("h1", &[]),
    ("h2", &[]),
    ("h3", &[]),
    ("h4", &[]),
    ("h5", &[]),
    ("h6", &[]),
    ("div", &[]),
    ("ul", &[]),
    ("ol", &[]),
    ("li", &[]),
    ("dl", &[]),
    ("dt", &[]),
    ("dd", &[]),
    ("pre", &[]),
    ("blockquote", &["cite"]),
    ("address", &[]),
    ("table", &[]),
    ("caption", &[]),
    ("thead", &[]),
    ("tbody", &[]),
    ("tfoot", &[]),
    ("tr", &[]),
    ("th", &["colspan", "rowspan"]),
    ("td", &["colspan", "rowspan"]),
    ("a", &["href", "name", "rel", "title"]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("b", &[]),
    ("strong", &[]),
    ("i", &[]),
    ("em", &[]),
    ("u", &[]),
    ("code", &[]),
    ("br", &[]),
    ("hr", &[]),
    ("form", &["action", "method"]),
    ("select", &[]),
    ("option", &["value"]),
];

/// Elements whose whole subtree is left out of the body.
const SKIPPED_ELEMENTS: &[&str] = &["head", "title", "script", "style", "template"];

/// Elements whose content is raw text that the tokenizer must not see.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Start { name: String, attributes: Attributes, empty: bool },
    End { name: String },
    Text(String),
}

/// Decoder for HTML, XHTML and generic `application/xml`.
pub struct HtmlDecoder;

impl HtmlDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for HtmlDecoder {
    fn name(&self) -> &str {
        "html-decoder"
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
        "Decodes HTML and loosely structured markup into safe XHTML"
    }

    fn author(&self) -> &str {
        "docsift developers"
    }
}

impl DocumentDecoder for HtmlDecoder {
    fn decode(
        &self,
        content: &[u8],
        mime_type: &str,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        _ctx: &ParseContext<'_>,
    ) -> Result<()> {
        let markup = match detect_charset_bytes(content, &HintBag::resolved(mime_type)) {
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

        let tokens = tokenize(&strip_raw_text(&markup));
        collect_head_metadata(&tokens, metadata);

        let mut writer = XhtmlWriter::new(handler);
        writer.start_document(metadata)?;
        emit_body(&tokens, &mut writer)?;
        writer.end_document()
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[
            mime::HTML_MIME_TYPE,
            mime::XHTML_MIME_TYPE,
            mime::XML_MIME_TYPE,
            "application/vnd.wap.xhtml+xml",
        ]
    }
}

/// Drop the content of `script` and `style` elements, keeping the tags.
fn strip_raw_text(markup: &str) -> String {
    let lower = markup.to_ascii_lowercase();
    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;

    while let Some((tag, start)) = RAW_TEXT_ELEMENTS
        .iter()
        .filter_map(|tag| lower[cursor..].find(&format!("<{tag}")).map(|pos| (*tag, cursor + pos)))
        .min_by_key(|(_, pos)| *pos)
    {
        let Some(open_end) = lower[start..].find('>').map(|pos| start + pos + 1) else {
            break;
        };
        out.push_str(&markup[cursor..open_end]);

        let close = format!("</{tag}");
        match lower[open_end..].find(&close) {
            Some(pos) => cursor = open_end + pos,
            None => {
                cursor = markup.len();
                break;
            }
        }
    }

    out.push_str(&markup[cursor..]);
    out
}

fn tokenize(markup: &str) -> Vec<Token> {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut tokens = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => tokens.push(start_token(&e, false)),
            Ok(Event::Empty(e)) => tokens.push(start_token(&e, true)),
            Ok(Event::End(e)) => tokens.push(Token::End {
                name: String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase(),
            }),
            Ok(Event::Text(e)) => push_text(&mut tokens, &unescape_lossy(&String::from_utf8_lossy(&e))),
            Ok(Event::CData(e)) => push_text(&mut tokens, &String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => push_text(&mut tokens, &resolve_reference(&String::from_utf8_lossy(&e))),
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    "Malformed markup, keeping content parsed so far"
                );
                break;
            }
            Ok(_) => {}
        }
    }
    tokens
}

fn start_token(e: &BytesStart<'_>, empty: bool) -> Token {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
    let mut attributes = Attributes::new();
    for attribute in e.html_attributes().flatten() {
        let key = String::from_utf8_lossy(attribute.key.as_ref()).to_ascii_lowercase();
        let value = unescape_lossy(&String::from_utf8_lossy(&attribute.value));
        attributes.push(key, value);
    }
    Token::Start {
        name,
        attributes,
        empty,
    }
}

/// Append text, merging with a preceding text token.
fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Text(previous)) = tokens.last_mut() {
        previous.push_str(text);
    } else {
        tokens.push(Token::Text(text.to_string()));
    }
}

fn unescape_lossy(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    match quick_xml::escape::unescape(raw) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Resolve `&name;` given its name. Unknown entities are kept verbatim.
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
    if let Some(text) = quick_xml::escape::resolve_predefined_entity(name) {
        return text.to_string();
    }
    let text = match name {
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "euro" => "\u{20ac}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "middot" => "\u{b7}",
        "bull" => "\u{2022}",
        _ => return format!("&{};", name),
    };
    text.to_string()
}

/// Title, `<meta name content>` pairs and the document language.
fn collect_head_metadata(tokens: &[Token], metadata: &mut Metadata) {
    let mut title: Option<String> = None;
    let mut in_title = false;

    for token in tokens {
        match token {
            Token::Start { name, attributes, empty } => match name.as_str() {
                "title" if !empty && title.is_none() => {
                    in_title = true;
                    title = Some(String::new());
                }
                "meta" => {
                    if let (Some(key), Some(value)) = (attributes.get("name"), attributes.get("content"))
                        && !key.trim().is_empty()
                    {
                        metadata.add(key.trim(), value);
                    }
                }
                "html" => {
                    if let Some(lang) = attributes.get("lang").filter(|lang| !lang.trim().is_empty()) {
                        metadata.set(keys::LANGUAGE, lang.trim());
                    }
                }
                "body" => break,
                _ => {}
            },
            Token::End { name } if name == "title" => in_title = false,
            Token::Text(text) if in_title => {
                if let Some(title) = title.as_mut() {
                    title.push_str(text);
                }
            }
            _ => {}
        }
    }

    if let Some(title) = title {
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        if !title.is_empty() {
            metadata.set(keys::TITLE, title);
        }
    }
}

fn safe_attributes(name: &str) -> Option<&'static [&'static str]> {
    SAFE_ELEMENTS
        .iter()
        .find(|(safe, _)| *safe == name)
        .map(|(_, attributes)| *attributes)
}

fn emit_body(tokens: &[Token], writer: &mut XhtmlWriter<'_>) -> Result<()> {
    let has_body = tokens
        .iter()
        .any(|token| matches!(token, Token::Start { name, .. } if name == "body"));
    let mut in_body = !has_body;
    let mut skip_depth = 0usize;

    for token in tokens {
        match token {
            Token::Start { name, .. } if name == "body" => in_body = true,
            Token::End { name } if name == "body" => in_body = false,
            _ if !in_body => {}
            Token::Start { name, empty, .. } if SKIPPED_ELEMENTS.contains(&name.as_str()) => {
                if !empty {
                    skip_depth += 1;
                }
            }
            Token::End { name } if SKIPPED_ELEMENTS.contains(&name.as_str()) => {
                skip_depth = skip_depth.saturating_sub(1);
            }
            _ if skip_depth > 0 => {}
            Token::Start {
                name,
                attributes,
                empty,
            } => {
                let Some(allowed) = safe_attributes(name) else {
                    continue;
                };
                let mut kept = Attributes::new();
                for (key, value) in attributes.iter() {
                    if allowed.contains(&key) {
                        kept.push(key, value);
                    }
                }
                if *empty || crate::handlers::is_void(name) {
                    writer.empty_element(name, kept)?;
                } else {
                    writer.start_element_with(name, kept)?;
                }
            }
            Token::End { name } => {
                if safe_attributes(name).is_some() && writer.is_open(name) {
                    writer.end_element(name)?;
                }
            }
            Token::Text(text) => writer.characters(text)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decoder_config::DecoderConfig;
    use crate::decoders::test_support::decode_text;

    fn decode(markup: &str) -> (String, Metadata) {
        decode_text(
            &HtmlDecoder::new(),
            markup.as_bytes(),
            "text/html",
            &DecoderConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_head_becomes_metadata() {
        let (text, metadata) = decode(
            "<html lang=\"en\"><head><title>  The   Title </title>\
             <meta name=\"author\" content=\"Ada\"></head>\
             <body><p>Body text</p></body></html>",
        );

        assert_eq!(text, "Body text\n");
        assert_eq!(metadata.get(keys::TITLE), Some("The Title"));
        assert_eq!(metadata.get("author"), Some("Ada"));
        assert_eq!(metadata.get(keys::LANGUAGE), Some("en"));
        assert_eq!(metadata.get(keys::CONTENT_TYPE), Some("text/html; charset=ISO-8859-1"));
    }

    #[test]
    fn test_image_and_bookmark_markers() {
        let (text, _) = decode(
            "<html><body><p><a name=\"top\"></a>Intro <img src=\"logo.png\" alt=\"Logo\"> end</p></body></html>",
        );
        assert_eq!(text, "[bookmark: top]Intro [image: Logo] end\n");
    }

    #[test]
    fn test_script_and_style_dropped() {
        let (text, _) = decode(
            "<html><head><style>p { color: red; }</style></head><body>\
             <script>if (a < b && c) { run(); }</script><p>visible</p></body></html>",
        );
        assert_eq!(text, "visible\n");
    }

    #[test]
    fn test_void_elements_without_close_tags() {
        let (text, _) = decode("<html><body><p>one<br>two</p><hr><p>three</p></body></html>");
        assert_eq!(text, "one\ntwo\n\nthree\n");
    }

    #[test]
    fn test_entities_resolved() {
        let (text, _) = decode("<p>Fish &amp; Chips&nbsp;&#169; &#x41;&unknown;</p>");
        assert_eq!(text, "Fish & Chips\u{a0}\u{a9} A&unknown;\n");
    }

    #[test]
    fn test_document_without_body() {
        let (text, metadata) = decode("<title>T</title><div>loose <span>text</span></div>");
        assert_eq!(text, "loose text\n");
        assert_eq!(metadata.get(keys::TITLE), Some("T"));
    }

    #[test]
    fn test_strip_raw_text() {
        assert_eq!(
            strip_raw_text("<SCRIPT type=x>a<b</SCRIPT><p>c</p>"),
            "<SCRIPT type=x></SCRIPT><p>c</p>"
        );
        assert_eq!(strip_raw_text("<style>unterminated"), "<style>");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(resolve_reference("bogus"), "&bogus;");
        assert_eq!(resolve_reference("lt"), "<");
        assert_eq!(resolve_reference("#65"), "A");
    }
}
