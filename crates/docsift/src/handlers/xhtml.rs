use super::{Attributes, ContentEvent, ContentHandler};
use crate::Result;
use crate::types::{Metadata, keys};

/// Elements followed by a newline in the event stream.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "ul", "ol", "dl", "pre", "hr", "blockquote", "address",
    "fieldset", "table", "form", "noscript", "li", "dt", "dd", "noframes", "br", "tr", "select", "option",
    "title",
];

/// Elements that never have content.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

pub(crate) fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Emits a well-formed XHTML-shaped event stream on behalf of a decoder.
///
/// Opens `html`/`head`/`body` around the document, writes metadata into the
/// head, appends a newline after block elements and closes whatever the
/// decoder leaves open.
pub struct XhtmlWriter<'h> {
    handler: &'h mut dyn ContentHandler,
    open: Vec<String>,
    started: bool,
}

impl<'h> XhtmlWriter<'h> {
    pub fn new(handler: &'h mut dyn ContentHandler) -> Self {
        Self {
            handler,
            open: Vec::new(),
            started: false,
        }
    }

    /// Start the document: head with metadata and the expanded title, then
    /// open `body`.
    pub fn start_document(&mut self, metadata: &Metadata) -> Result<()> {
        self.handler.on_event(ContentEvent::StartDocument)?;
        self.handler.on_event(ContentEvent::start("html"))?;
        self.handler.on_event(ContentEvent::start("head"))?;

        for (name, values) in metadata.iter() {
            if name == keys::TITLE {
                continue;
            }
            for value in values {
                let attributes = Attributes::new().with("name", name).with("content", value.as_str());
                self.handler.on_event(ContentEvent::start_with("meta", attributes))?;
                self.handler.on_event(ContentEvent::end("meta"))?;
            }
        }

        if let Some(title) = metadata.expanded_title() {
            self.handler.on_event(ContentEvent::start("title"))?;
            self.handler.on_event(ContentEvent::Characters(title))?;
            self.handler.on_event(ContentEvent::end("title"))?;
        }

        self.handler.on_event(ContentEvent::end("head"))?;
        self.handler.on_event(ContentEvent::start("body"))?;
        self.started = true;
        Ok(())
    }

    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.start_element_with(name, Attributes::new())
    }

    pub fn start_element_with(&mut self, name: &str, attributes: Attributes) -> Result<()> {
        self.open.push(name.to_string());
        self.handler.on_event(ContentEvent::start_with(name, attributes))
    }

    /// Close `name`, and anything opened after it.
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        let Some(position) = self.open.iter().rposition(|open| open == name) else {
            return Ok(());
        };
        while self.open.len() > position {
            if let Some(open) = self.open.pop() {
                self.close(&open)?;
            }
        }
        Ok(())
    }

    /// Emit an element with no children.
    pub fn empty_element(&mut self, name: &str, attributes: Attributes) -> Result<()> {
        self.handler.on_event(ContentEvent::start_with(name, attributes))?;
        self.close(name)
    }

    pub fn characters(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.handler.on_event(ContentEvent::text(text))
    }

    /// `<name>text</name>`.
    pub fn element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start_element(name)?;
        self.characters(text)?;
        self.end_element(name)
    }

    pub fn newline(&mut self) -> Result<()> {
        self.handler.on_event(ContentEvent::IgnorableWhitespace("\n".to_string()))
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.open.iter().any(|open| open == name)
    }

    /// Close open elements, `body` and `html`, then end the document.
    pub fn end_document(&mut self) -> Result<()> {
        while let Some(open) = self.open.pop() {
            self.close(&open)?;
        }
        if self.started {
            self.handler.on_event(ContentEvent::end("body"))?;
            self.handler.on_event(ContentEvent::end("html"))?;
        }
        self.handler.on_event(ContentEvent::EndDocument)
    }

    /// The wrapped handler, for decoding embedded members into the same stream.
    pub fn handler(&mut self) -> &mut dyn ContentHandler {
        &mut *self.handler
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.handler.on_event(ContentEvent::end(name))?;
        if is_block(name) {
            self.newline()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_skeleton() {
        let mut events: Vec<ContentEvent> = Vec::new();
        let mut metadata = Metadata::new();
        metadata.set(keys::RESOURCE_NAME, "a.txt");
        metadata.set(keys::TITLE, "Hello");

        let mut writer = XhtmlWriter::new(&mut events);
        writer.start_document(&metadata).unwrap();
        writer.element("p", "body text").unwrap();
        writer.end_document().unwrap();

        assert_eq!(
            events,
            vec![
                ContentEvent::StartDocument,
                ContentEvent::start("html"),
                ContentEvent::start("head"),
                ContentEvent::start_with(
                    "meta",
                    Attributes::new().with("name", "resourceName").with("content", "a.txt")
                ),
                ContentEvent::end("meta"),
                ContentEvent::start("title"),
                ContentEvent::text("Hello"),
                ContentEvent::end("title"),
                ContentEvent::end("head"),
                ContentEvent::start("body"),
                ContentEvent::start("p"),
                ContentEvent::text("body text"),
                ContentEvent::end("p"),
                ContentEvent::IgnorableWhitespace("\n".to_string()),
                ContentEvent::end("body"),
                ContentEvent::end("html"),
                ContentEvent::EndDocument,
            ]
        );
    }

    #[test]
    fn test_end_element_closes_intermediates() {
        let mut events: Vec<ContentEvent> = Vec::new();
        let mut writer = XhtmlWriter::new(&mut events);
        writer.start_element("div").unwrap();
        writer.start_element("b").unwrap();
        writer.end_element("div").unwrap();
        writer.end_element("div").unwrap();

        assert_eq!(
            events,
            vec![
                ContentEvent::start("div"),
                ContentEvent::start("b"),
                ContentEvent::end("b"),
                ContentEvent::end("div"),
                ContentEvent::IgnorableWhitespace("\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_end_document_closes_open_elements() {
        let mut events: Vec<ContentEvent> = Vec::new();
        let mut writer = XhtmlWriter::new(&mut events);
        writer.start_document(&Metadata::new()).unwrap();
        writer.start_element("p").unwrap();
        writer.characters("unterminated").unwrap();
        writer.end_document().unwrap();

        assert!(events.contains(&ContentEvent::end("p")));
        assert_eq!(events.last(), Some(&ContentEvent::EndDocument));
    }
}
