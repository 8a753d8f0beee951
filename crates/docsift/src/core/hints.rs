//! Out-of-band type and name hints attached to a request.

use crate::core::mime::normalize_content_type;
use crate::types::{Metadata, keys};

/// Where the winning content-type hint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintSource {
    /// Supplied by the caller as an override.
    Explicit,
    /// Declared by the remote endpoint (HTTP `Content-Type`).
    Declared,
}

/// Hints collected during request setup, read-only while decoding.
///
/// Holds at most one content-type hint. Precedence is fixed: an explicit
/// override beats an origin-declared type, which beats nothing. Both
/// candidates pass through [`normalize_content_type`] first, so an
/// uninformative override never masks a useful declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintBag {
    resource_name: Option<String>,
    content_type: Option<String>,
    source: Option<HintSource>,
}

impl HintBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the bag for one request.
    pub fn accumulate(explicit: Option<&str>, declared: Option<&str>, resource_name: Option<String>) -> Self {
        let explicit = explicit.and_then(normalize_content_type);
        let declared = declared.and_then(normalize_content_type);

        let (content_type, source) = match (explicit, declared) {
            (Some(explicit), _) => (Some(explicit), Some(HintSource::Explicit)),
            (None, Some(declared)) => (Some(declared), Some(HintSource::Declared)),
            (None, None) => (None, None),
        };

        let resource_name = resource_name.filter(|name| !name.trim().is_empty());

        tracing::debug!(
            resource_name = resource_name.as_deref(),
            content_type = content_type.as_deref(),
            source = ?source,
            "Accumulated request hints"
        );

        Self {
            resource_name,
            content_type,
            source,
        }
    }

    /// Hints for an embedded member: its name only, no inherited type.
    pub fn for_member(name: Option<&str>) -> Self {
        Self {
            resource_name: name.map(str::to_string).filter(|n| !n.trim().is_empty()),
            content_type: None,
            source: None,
        }
    }

    /// A bag carrying only an already-resolved media type, used to seed
    /// charset detection inside decoders.
    pub fn resolved(mime_type: &str) -> Self {
        Self {
            resource_name: None,
            content_type: Some(mime_type.to_string()),
            source: None,
        }
    }

    pub fn resource_name(&self) -> Option<&str> {
        self.resource_name.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_type_source(&self) -> Option<HintSource> {
        self.source
    }

    /// Copy hints into document metadata before decoding starts.
    pub fn apply_to(&self, metadata: &mut Metadata) {
        if let Some(name) = &self.resource_name {
            metadata.set(keys::RESOURCE_NAME, name.clone());
        }
        if let Some(content_type) = &self.content_type {
            metadata.set(keys::CONTENT_TYPE, content_type.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_beats_declared() {
        let hints = HintBag::accumulate(Some("text/html"), Some("text/plain"), Some("a.bin".to_string()));
        assert_eq!(hints.content_type(), Some("text/html"));
        assert_eq!(hints.content_type_source(), Some(HintSource::Explicit));
        assert_eq!(hints.resource_name(), Some("a.bin"));
    }

    #[test]
    fn test_declared_used_without_explicit() {
        let hints = HintBag::accumulate(None, Some("application/pdf"), None);
        assert_eq!(hints.content_type(), Some("application/pdf"));
        assert_eq!(hints.content_type_source(), Some(HintSource::Declared));
    }

    #[test]
    fn test_uninformative_explicit_does_not_mask_declared() {
        let hints = HintBag::accumulate(Some("application/octet-stream"), Some("text/csv"), None);
        assert_eq!(hints.content_type(), Some("text/csv"));
        assert_eq!(hints.content_type_source(), Some(HintSource::Declared));
    }

    #[test]
    fn test_generic_types_leave_no_hint() {
        let hints = HintBag::accumulate(Some("application/xml"), Some("content/unknown"), None);
        assert_eq!(hints.content_type(), None);
        assert_eq!(hints.content_type_source(), None);
    }

    #[test]
    fn test_blank_resource_name_dropped() {
        let hints = HintBag::accumulate(None, None, Some("  ".to_string()));
        assert_eq!(hints.resource_name(), None);
    }

    #[test]
    fn test_apply_to_metadata() {
        let hints = HintBag::accumulate(Some("text/plain"), None, Some("file.txt".to_string()));
        let mut metadata = Metadata::new();
        hints.apply_to(&mut metadata);
        assert_eq!(metadata.get(keys::RESOURCE_NAME), Some("file.txt"));
        assert_eq!(metadata.get(keys::CONTENT_TYPE), Some("text/plain"));
    }

    #[test]
    fn test_member_hints_carry_no_type() {
        let hints = HintBag::for_member(Some("inner/readme.txt"));
        assert_eq!(hints.resource_name(), Some("inner/readme.txt"));
        assert_eq!(hints.content_type(), None);
    }
}
