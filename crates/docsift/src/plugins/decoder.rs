use crate::core::context::ParseContext;
use crate::handlers::ContentHandler;
use crate::plugins::Plugin;
use crate::types::Metadata;
use crate::{DocsiftError, Result};
use std::sync::Arc;

/// A format handler.
///
/// `decode` turns the complete bytes of one document into an XHTML-shaped
/// event stream (normally through [`XhtmlWriter`](crate::handlers::XhtmlWriter))
/// and records what it learns in `metadata`. The stream must be well formed
/// even when decoding fails half way: decoders that give up early still close
/// what they opened, or return the error before emitting anything.
///
/// Embedded members (archive entries, attachments) are handed back to the
/// pipeline through [`ParseContext::parse_embedded`].
pub trait DocumentDecoder: Plugin {
    fn decode(
        &self,
        content: &[u8],
        mime_type: &str,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        ctx: &ParseContext<'_>,
    ) -> Result<()>;

    /// Media types handled. A trailing `/*` matches a whole top-level type.
    fn supported_mime_types(&self) -> &[&str];

    /// Higher wins when several decoders claim a type.
    fn priority(&self) -> i32 {
        50
    }
}

fn registry_lock_error(e: impl std::fmt::Display) -> DocsiftError {
    DocsiftError::LockPoisoned(format!("Decoder registry: {}", e))
}

/// Register a decoder with the global registry.
///
/// Custom decoders may be added or removed while requests are running. Each
/// document resolves its decoder once, under the read lock, and keeps its own
/// handle, so a change only affects documents dispatched afterwards.
pub fn register_decoder(decoder: Arc<dyn DocumentDecoder>) -> Result<()> {
    use crate::plugins::registry::get_decoder_registry;

    let registry = get_decoder_registry();
    let mut registry = registry.write().map_err(registry_lock_error)?;
    registry.register(decoder)
}

/// Remove a custom decoder by name, calling its `shutdown`.
///
/// Built-in decoders cannot be removed.
pub fn unregister_decoder(name: &str) -> Result<()> {
    use crate::plugins::registry::get_decoder_registry;

    if crate::decoders::is_builtin_decoder(name) {
        return Err(DocsiftError::Plugin {
            message: "built-in decoders cannot be unregistered".to_string(),
            plugin_name: name.to_string(),
        });
    }

    let registry = get_decoder_registry();
    let mut registry = registry.write().map_err(registry_lock_error)?;
    registry.remove(name)
}

/// Names of all registered decoders.
pub fn list_decoders() -> Result<Vec<String>> {
    use crate::plugins::registry::get_decoder_registry;

    let registry = get_decoder_registry();
    let registry = registry.read().map_err(registry_lock_error)?;
    Ok(registry.list())
}
