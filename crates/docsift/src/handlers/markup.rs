use quick_xml::escape::escape;

use super::xhtml::is_void;
use super::{Attributes, ContentEvent, ContentHandler};
use crate::Result;
use crate::types::MarkupFormat;

/// Serializes the event stream back into XHTML or HTML text.
#[derive(Debug)]
pub struct MarkupContentHandler {
    format: MarkupFormat,
    out: String,
    /// Start tag written without its closing `>`, pending a possible `/>`.
    pending_start: bool,
}

impl MarkupContentHandler {
    pub fn new(format: MarkupFormat) -> Self {
        Self {
            format,
            out: String::new(),
            pending_start: false,
        }
    }

    pub fn format(&self) -> MarkupFormat {
        self.format
    }

    pub fn into_string(mut self) -> String {
        self.flush_start();
        self.out
    }

    fn flush_start(&mut self) {
        if self.pending_start {
            self.out.push('>');
            self.pending_start = false;
        }
    }

    fn write_start(&mut self, name: &str, attributes: &Attributes) {
        self.flush_start();
        self.out.push('<');
        self.out.push_str(name);
        if name == "html" && self.format == MarkupFormat::Xml && attributes.get("xmlns").is_none() {
            self.out.push_str(" xmlns=\"http://www.w3.org/1999/xhtml\"");
        }
        for (key, value) in attributes.iter() {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value));
            self.out.push('"');
        }
        match self.format {
            MarkupFormat::Xml => self.pending_start = true,
            MarkupFormat::Html => self.out.push('>'),
        }
    }

    fn write_end(&mut self, name: &str) {
        match self.format {
            MarkupFormat::Xml if self.pending_start => {
                self.out.push_str("/>");
                self.pending_start = false;
            }
            MarkupFormat::Html if is_void(name) => {}
            _ => {
                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
            }
        }
    }

    fn write_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.flush_start();
        self.out.push_str(&escape(text));
    }
}

impl ContentHandler for MarkupContentHandler {
    fn on_event(&mut self, event: ContentEvent) -> Result<()> {
        match event {
            ContentEvent::StartDocument => {
                if self.format == MarkupFormat::Xml {
                    self.out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
                }
            }
            ContentEvent::StartElement { name, attributes } => self.write_start(&name, &attributes),
            ContentEvent::EndElement { name } => self.write_end(&name),
            ContentEvent::Characters(text) | ContentEvent::IgnorableWhitespace(text) => self.write_text(&text),
            ContentEvent::EndDocument => self.flush_start(),
        }
        Ok(())
    }
}
