//! docsift - Content Extraction for Documents of Unknown Type
//!
//! docsift opens a local path or an `http`/`https`/`ftp` URL, works out what
//! the content is (media type and character set), and hands it to a decoder
//! that streams it as XHTML-shaped events. The entry points turn that stream
//! into plain text, serialized markup or metadata.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docsift::{DocsiftConfig, ExtractionRequest, extract};
//!
//! # fn main() -> docsift::Result<()> {
//! let config = DocsiftConfig::default();
//! let result = extract(&ExtractionRequest::new("notes.txt"), &config)?;
//! println!("{} ({})", result.content, result.mime_type);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): resource opening, hint accumulation, media type
//!   and charset detection, option parsing, the request pipeline
//! - **Handlers** (`handlers`): content event consumers (text, markup, body
//!   filtering, rich-text decoration)
//! - **Plugin System** (`plugins`): the `DocumentDecoder` trait and a
//!   priority-ordered registry keyed by media type
//! - **Decoders** (`decoders`): built-in plain text, HTML, XML, ZIP/TAR and
//!   image decoders
//!
//! # Resolution order
//!
//! A caller-supplied content type beats one declared by a remote server,
//! which beats content sniffing. Uninformative hints such as
//! `application/octet-stream` are discarded before they can mask anything.

#![deny(unsafe_code)]

pub mod core;
pub mod decoders;
pub mod error;
pub mod handlers;
pub mod language_detection;
#[cfg(feature = "images")]
pub mod ocr;
pub mod plugins;
pub mod types;

pub use error::{DocsiftError, Result};
pub use types::*;

pub use core::config::{DocsiftConfig, NetworkConfig};
pub use core::decoder_config::{DecoderConfig, OcrConfig, PasswordProvider, StaticPasswordProvider};
pub use core::extractor::{
    ExtractionRequest, detect_charset, detect_content_type, detect_content_type_and_charset, extract, extract_markup,
    extract_metadata, extract_text,
};
pub use core::io::Locator;
pub use core::options::{ExtractionOptions, parse_option_value};

#[cfg(feature = "tokio-runtime")]
pub use core::extractor::{
    detect_charset_async, detect_content_type_and_charset_async, detect_content_type_async, detect_language_async,
    extract_async, extract_markup_async, extract_metadata_async, extract_text_async,
};

pub use language_detection::detect_language;

pub use core::mime::{
    HTML_MIME_TYPE, JSON_MIME_TYPE, OCTET_STREAM_MIME_TYPE, PLAIN_TEXT_MIME_TYPE, XML_MIME_TYPE, ZIP_MIME_TYPE,
};

pub use plugins::registry::get_decoder_registry;
