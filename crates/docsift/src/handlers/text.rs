use super::{ContentEvent, ContentHandler};
use crate::Result;

/// Collects character data into a string.
#[derive(Debug, Default)]
pub struct TextContentHandler {
    text: String,
}

impl TextContentHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl ContentHandler for TextContentHandler {
    fn on_event(&mut self, event: ContentEvent) -> Result<()> {
        match event {
            ContentEvent::Characters(text) | ContentEvent::IgnorableWhitespace(text) => self.text.push_str(&text),
            ContentEvent::StartElement { .. }
            | ContentEvent::EndElement { .. }
            | ContentEvent::StartDocument
            | ContentEvent::EndDocument => {}
        }
        Ok(())
    }
}

/// Passes on only what lies inside `body`, plus the document boundaries.
///
/// Head content (title, meta) is metadata, not text.
#[derive(Debug)]
pub struct BodyContentHandler<H> {
    inner: H,
    body_depth: usize,
}

impl<H: ContentHandler> BodyContentHandler<H> {
    pub fn new(inner: H) -> Self {
        Self { inner, body_depth: 0 }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: ContentHandler> ContentHandler for BodyContentHandler<H> {
    fn on_event(&mut self, event: ContentEvent) -> Result<()> {
        match &event {
            ContentEvent::StartDocument | ContentEvent::EndDocument => self.inner.on_event(event),
            ContentEvent::StartElement { name, .. } if name == "body" => {
                self.body_depth += 1;
                if self.body_depth > 1 {
                    self.inner.on_event(event)?;
                }
                Ok(())
            }
            ContentEvent::EndElement { name } if name == "body" => {
                if self.body_depth > 1 {
                    self.inner.on_event(event)?;
                }
                self.body_depth = self.body_depth.saturating_sub(1);
                Ok(())
            }
            _ if self.body_depth > 0 => self.inner.on_event(event),
            _ => Ok(()),
        }
    }
}

/// Drops document boundaries so an embedded document's events can be
/// spliced into its container's stream.
#[derive(Debug)]
pub struct EmbeddedContentHandler<H> {
    inner: H,
}

impl<H: ContentHandler> EmbeddedContentHandler<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: ContentHandler> ContentHandler for EmbeddedContentHandler<H> {
    fn on_event(&mut self, event: ContentEvent) -> Result<()> {
        match event {
            ContentEvent::StartDocument | ContentEvent::EndDocument => Ok(()),
            other => self.inner.on_event(other),
        }
    }
}

/// Ignores everything; used when only metadata is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardContentHandler;

impl ContentHandler for DiscardContentHandler {
    fn on_event(&mut self, _event: ContentEvent) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::XhtmlWriter;
    use crate::types::{Metadata, keys};

    fn sample_document(handler: &mut dyn ContentHandler) {
        let mut metadata = Metadata::new();
        metadata.set(keys::TITLE, "Heading not text");
        let mut writer = XhtmlWriter::new(handler);
        writer.start_document(&metadata).unwrap();
        writer.element("p", "Just some text.\n").unwrap();
        writer.end_document().unwrap();
    }

    #[test]
    fn test_body_text_only() {
        let mut text = TextContentHandler::new();
        {
            let mut body = BodyContentHandler::new(&mut text);
            sample_document(&mut body);
        }
        assert_eq!(text.into_text(), "Just some text.\n\n");
    }

    #[test]
    fn test_text_handler_sees_head_without_filter() {
        let mut text = TextContentHandler::new();
        sample_document(&mut text);
        assert!(text.text().starts_with("Heading not text"));
    }

    #[test]
    fn test_embedded_drops_document_boundaries() {
        let mut events: Vec<ContentEvent> = Vec::new();
        {
            let mut embedded = EmbeddedContentHandler::new(&mut events);
            embedded.on_event(ContentEvent::StartDocument).unwrap();
            embedded.on_event(ContentEvent::text("member")).unwrap();
            embedded.on_event(ContentEvent::EndDocument).unwrap();
        }
        assert_eq!(events, vec![ContentEvent::text("member")]);
    }

    #[test]
    fn test_discard_accepts_everything() {
        let mut discard = DiscardContentHandler;
        sample_document(&mut discard);
    }
}
