//! Plugin system for decoders.
//!
//! Every format handler implements [`Plugin`] plus [`DocumentDecoder`] and is
//! stored as `Arc<dyn DocumentDecoder>` in the global [`DecoderRegistry`].
//! Built-in decoders are registered on first use; callers may register their
//! own with a higher priority to take over a media type.
//!
//! ```rust
//! use docsift::plugins::registry::get_decoder_registry;
//!
//! docsift::decoders::ensure_initialized()?;
//! let registry = get_decoder_registry();
//! let registry = registry.read().unwrap();
//! assert!(registry.get("text/plain").is_ok());
//! # Ok::<(), docsift::DocsiftError>(())
//! ```

pub mod decoder;
pub mod registry;
pub mod traits;

pub use decoder::{DocumentDecoder, list_decoders, register_decoder, unregister_decoder};
pub use registry::DecoderRegistry;
pub use traits::Plugin;
