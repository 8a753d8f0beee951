use super::{ContentEvent, ContentHandler};
use crate::Result;

/// Surfaces textual markers for elements that carry no character data.
///
/// An `img` with a non-empty `alt` yields `[image: alt]`, an `a` with a
/// non-empty `name` yields `[bookmark: name]`. The marker is emitted right
/// after the start event; everything else passes through untouched.
#[derive(Debug)]
pub struct RichTextDecorator<H> {
    inner: H,
}

impl<H: ContentHandler> RichTextDecorator<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

fn marker(event: &ContentEvent) -> Option<String> {
    let ContentEvent::StartElement { name, attributes } = event else {
        return None;
    };
    let (label, attribute) = if name.eq_ignore_ascii_case("img") {
        ("image", "alt")
    } else if name.eq_ignore_ascii_case("a") {
        ("bookmark", "name")
    } else {
        return None;
    };
    attributes
        .get(attribute)
        .filter(|value| !value.is_empty())
        .map(|value| format!("[{label}: {value}]"))
}

impl<H: ContentHandler> ContentHandler for RichTextDecorator<H> {
    fn on_event(&mut self, event: ContentEvent) -> Result<()> {
        let marker = marker(&event);
        self.inner.on_event(event)?;
        if let Some(marker) = marker {
            self.inner.on_event(ContentEvent::Characters(marker))?;
        }
        Ok(())
    }
}
