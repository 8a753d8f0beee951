//! Resource opener.
//!
//! Turns a locator string into a readable byte stream, plus the content type
//! the origin declared when the locator is a network URL. Local failures
//! surface as [`DocsiftError::Io`], network failures as
//! [`DocsiftError::Network`].

use crate::core::config::NetworkConfig;
use crate::{DocsiftError, Result};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Schemes handled by the network opener.
pub const NETWORK_SCHEMES: &[&str] = &["http://", "https://", "ftp://"];

/// A local path or a network URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Path(PathBuf),
    Url(String),
}

impl Locator {
    /// Classify a locator string. `http://`, `https://` and `ftp://` are
    /// network locators; anything else is a local path.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim_start().to_ascii_lowercase();
        if NETWORK_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
            Locator::Url(raw.trim().to_string())
        } else {
            Locator::Path(PathBuf::from(raw))
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Locator::Url(_))
    }

    /// File name derived from the locator, if any.
    pub fn resource_name(&self) -> Option<String> {
        match self {
            Locator::Path(path) => path.file_name().and_then(|n| n.to_str()).map(str::to_string),
            Locator::Url(url) => resource_name_from_url(url),
        }
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Locator::parse(raw)
    }
}

impl From<&Path> for Locator {
    fn from(path: &Path) -> Self {
        Locator::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Locator {
    fn from(path: PathBuf) -> Self {
        Locator::Path(path)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Path(path) => write!(f, "{}", path.display()),
            Locator::Url(url) => f.write_str(url),
        }
    }
}

fn resource_name_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme.split(['?', '#']).next().unwrap_or_default();
    let (_, path) = path.split_once('/')?;
    path.rsplit('/').next().filter(|name| !name.is_empty()).map(str::to_string)
}

/// An opened resource: the stream plus what the origin told us about it.
pub struct OpenedResource {
    pub reader: Box<dyn Read + Send>,
    pub declared_content_type: Option<String>,
    pub resource_name: Option<String>,
    pub length: Option<u64>,
}

impl fmt::Debug for OpenedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedResource")
            .field("declared_content_type", &self.declared_content_type)
            .field("resource_name", &self.resource_name)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Open a locator.
///
/// For network locators the response headers are received before this
/// returns, so the declared content type is known before detection starts.
/// `max_size` is enforced here only for transports that must buffer the body
/// up front; [`DocumentSource`] caps everything else while reading.
pub fn open(locator: &Locator, network: &NetworkConfig, max_size: u64) -> Result<OpenedResource> {
    match locator {
        Locator::Path(path) => open_path(path),
        Locator::Url(url) => open_url(url, network, max_size),
    }
}

fn open_path(path: &Path) -> Result<OpenedResource> {
    let file = File::open(path).map_err(DocsiftError::Io)?;
    let length = file.metadata().ok().map(|m| m.len());

    tracing::debug!(path = %path.display(), length, "Opened local resource");

    Ok(OpenedResource {
        reader: Box::new(file),
        declared_content_type: None,
        resource_name: Locator::Path(path.to_path_buf()).resource_name(),
        length,
    })
}

#[cfg(feature = "network")]
fn open_url(url: &str, network: &NetworkConfig, max_size: u64) -> Result<OpenedResource> {
    crate::core::network::open_url(url, network, max_size)
}

#[cfg(not(feature = "network"))]
fn open_url(url: &str, _network: &NetworkConfig, _max_size: u64) -> Result<OpenedResource> {
    Err(DocsiftError::network(url, "built without the `network` feature"))
}

/// Document bytes, read lazily from an opened resource.
///
/// Nothing is read until [`bytes`](Self::bytes) is first called, so a
/// detector that can answer from hints never touches the stream. Reads are
/// capped at the configured maximum document size.
pub struct DocumentSource {
    reader: Option<Box<dyn Read + Send>>,
    buffer: Option<Vec<u8>>,
    limit: u64,
    network_locator: Option<String>,
}

impl DocumentSource {
    pub fn new(reader: Box<dyn Read + Send>, limit: u64) -> Self {
        Self {
            reader: Some(reader),
            buffer: None,
            limit,
            network_locator: None,
        }
    }

    /// Source over an opened resource; read failures on network streams are
    /// reported as network errors.
    pub fn from_resource(resource: OpenedResource, locator: &Locator, limit: u64) -> Self {
        let mut source = Self::new(resource.reader, limit);
        if let Locator::Url(url) = locator {
            source.network_locator = Some(url.clone());
        }
        source
    }

    pub fn is_loaded(&self) -> bool {
        self.buffer.is_some()
    }

    /// All bytes of the document, reading the stream on first use.
    pub fn bytes(&mut self) -> Result<&[u8]> {
        if self.buffer.is_none()
            && let Some(reader) = self.reader.take()
        {
            let bytes = self.read_capped(reader)?;
            self.buffer = Some(bytes);
        }
        Ok(self.buffer.as_deref().unwrap_or_default())
    }

    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.bytes()?;
        Ok(self.buffer.unwrap_or_default())
    }

    fn read_capped(&self, reader: Box<dyn Read + Send>) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let result = reader.take(self.limit.saturating_add(1)).read_to_end(&mut bytes);

        if let Err(e) = result {
            return Err(match &self.network_locator {
                Some(url) => DocsiftError::network_with_source(url.clone(), "failed to read response body", e),
                None => DocsiftError::Io(e),
            });
        }

        if bytes.len() as u64 > self.limit {
            return Err(DocsiftError::validation(format!(
                "Document exceeds the maximum size of {} bytes",
                self.limit
            )));
        }

        tracing::debug!(bytes = bytes.len(), "Read document content");
        Ok(bytes)
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSource")
            .field("loaded", &self.is_loaded())
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
