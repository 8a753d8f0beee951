//! HTTP(S) and FTP acquisition.
//!
//! Basic GET-and-read only: no retries, no caching, no redirects beyond what
//! the HTTP client does by default.

use crate::core::config::NetworkConfig;
use crate::core::io::{Locator, OpenedResource};
use crate::{DocsiftError, Result};
use reqwest::Url;
use std::io::Read;
use std::net::ToSocketAddrs;
use suppaftp::types::FtpError;
use suppaftp::FtpStream;
use suppaftp::types::FileType;

const DEFAULT_FTP_PORT: u16 = 21;
const ANONYMOUS: &str = "anonymous";

/// Open a network locator. `max_size` bounds bodies that have to be
/// buffered at open time (FTP); streamed HTTP bodies are capped by the reader.
pub(crate) fn open_url(url: &str, network: &NetworkConfig, max_size: u64) -> Result<OpenedResource> {
    let parsed =
        Url::parse(url).map_err(|e| DocsiftError::network_with_source(url, "invalid URL", e))?;

    match parsed.scheme() {
        "http" | "https" => open_http(url, network),
        "ftp" => open_ftp(url, &parsed, network, max_size),
        other => Err(DocsiftError::network(url, format!("unsupported scheme '{}'", other))),
    }
}

fn open_http(url: &str, network: &NetworkConfig) -> Result<OpenedResource> {
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(network.connect_timeout())
        .timeout(network.read_timeout())
        .user_agent(network.user_agent.clone())
        .build()
        .map_err(|e| DocsiftError::network_with_source(url, "failed to build HTTP client", e))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| DocsiftError::network_with_source(url, "request failed", e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DocsiftError::network(url, format!("server responded with status {}", status)));
    }

    let declared_content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let length = response.content_length();

    tracing::debug!(
        url,
        status = status.as_u16(),
        declared_content_type = declared_content_type.as_deref(),
        length,
        "Opened HTTP resource"
    );

    Ok(OpenedResource {
        reader: Box::new(response),
        declared_content_type,
        resource_name: Locator::Url(url.to_string()).resource_name(),
        length,
    })
}

fn open_ftp(url: &str, parsed: &Url, network: &NetworkConfig, max_size: u64) -> Result<OpenedResource> {
    let host = parsed
        .host_str()
        .ok_or_else(|| DocsiftError::network(url, "FTP URL has no host"))?;
    let port = parsed.port().unwrap_or(DEFAULT_FTP_PORT);

    let address = (host, port)
        .to_socket_addrs()
        .map_err(|e| DocsiftError::network_with_source(url, "failed to resolve host", e))?
        .next()
        .ok_or_else(|| DocsiftError::network(url, format!("no address found for {}", host)))?;

    let mut ftp = FtpStream::connect_timeout(address, network.connect_timeout())
        .map_err(|e| DocsiftError::network_with_source(url, "FTP connect failed", e))?;

    ftp.get_ref()
        .set_read_timeout(Some(network.read_timeout()))
        .map_err(|e| DocsiftError::network_with_source(url, "failed to set FTP read timeout", e))?;

    let user = match parsed.username() {
        "" => ANONYMOUS,
        user => user,
    };
    let password = parsed.password().unwrap_or(ANONYMOUS);

    ftp.login(user, password)
        .map_err(|e| DocsiftError::network_with_source(url, "FTP login failed", e))?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|e| DocsiftError::network_with_source(url, "FTP binary mode failed", e))?;

    // Stopping early aborts the transfer, so the server may answer the RETR
    // with an error; the size check has to win over that.
    let mut exceeded = false;
    let retrieved = ftp.retr(parsed.path(), |stream| {
        let body = read_limited(stream, max_size).map_err(FtpError::ConnectionError)?;
        exceeded = body.is_none();
        Ok(body.unwrap_or_default())
    });

    if exceeded {
        return Err(DocsiftError::validation(format!(
            "Document exceeds the maximum size of {} bytes",
            max_size
        )));
    }
    let body = retrieved.map_err(|e| DocsiftError::network_with_source(url, "FTP retrieve failed", e))?;

    if let Err(e) = ftp.quit() {
        tracing::debug!(url, error = %e, "FTP quit failed after transfer");
    }

    let length = body.len() as u64;
    tracing::debug!(url, length, "Retrieved FTP resource");

    Ok(OpenedResource {
        reader: Box::new(std::io::Cursor::new(body)),
        declared_content_type: None,
        resource_name: Locator::Url(url.to_string()).resource_name(),
        length: Some(length),
    })
}

/// Read at most `limit` bytes; `None` when the stream holds more.
fn read_limited<R: Read>(reader: R, limit: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut body = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    Ok((body.len() as u64 <= limit).then_some(body))
}
