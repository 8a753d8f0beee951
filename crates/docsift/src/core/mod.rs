//! Request pipeline: opening, hinting, detection, configuration and dispatch.

pub mod charset;
pub mod config;
pub mod context;
pub mod decoder_config;
pub mod detect;
pub mod extractor;
pub mod hints;
pub mod io;
pub mod mime;
#[cfg(feature = "network")]
pub(crate) mod network;
pub mod options;
pub(crate) mod pipeline;
