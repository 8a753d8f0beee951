//! Content event stream and its consumers.
//!
//! Decoders describe a document as an ordered stream of [`ContentEvent`]s
//! shaped like XHTML (`html` > `head` + `body`). Consumers implement
//! [`ContentHandler`] and are composed by wrapping: a body filter in front of
//! a decorator in front of a text sink, for instance.

mod decorator;
mod markup;
mod text;
mod xhtml;

pub use decorator::RichTextDecorator;
pub use markup::MarkupContentHandler;
pub use text::{BodyContentHandler, DiscardContentHandler, EmbeddedContentHandler, TextContentHandler};
pub use xhtml::XhtmlWriter;
pub(crate) use xhtml::is_void;

use crate::Result;

/// Element attributes in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style push.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Value of the first attribute called `name` (ASCII case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// One structural or textual event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEvent {
    StartDocument,
    StartElement { name: String, attributes: Attributes },
    EndElement { name: String },
    Characters(String),
    /// Layout whitespace, e.g. the newline after a block element.
    IgnorableWhitespace(String),
    EndDocument,
}

impl ContentEvent {
    pub fn start(name: impl Into<String>) -> Self {
        ContentEvent::StartElement {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn start_with(name: impl Into<String>, attributes: Attributes) -> Self {
        ContentEvent::StartElement {
            name: name.into(),
            attributes,
        }
    }

    pub fn end(name: impl Into<String>) -> Self {
        ContentEvent::EndElement { name: name.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ContentEvent::Characters(text.into())
    }
}

/// Consumer of the event stream. Events arrive exactly once, in order.
pub trait ContentHandler {
    fn on_event(&mut self, event: ContentEvent) -> Result<()>;
}

impl<H: ContentHandler + ?Sized> ContentHandler for &mut H {
    fn on_event(&mut self, event: ContentEvent) -> Result<()> {
        (**self).on_event(event)
    }
}

impl<H: ContentHandler + ?Sized> ContentHandler for Box<H> {
    fn on_event(&mut self, event: ContentEvent) -> Result<()> {
        (**self).on_event(event)
    }
}

/// Records events verbatim.
impl ContentHandler for Vec<ContentEvent> {
    fn on_event(&mut self, event: ContentEvent) -> Result<()> {
        self.push(event);
        Ok(())
    }
}
