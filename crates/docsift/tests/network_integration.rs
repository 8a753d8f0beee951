//! HTTP acquisition against a local one-shot server.

#![cfg(feature = "network")]

use docsift::types::keys;
use docsift::{DocsiftConfig, DocsiftError, ExtractionRequest, NetworkConfig, detect_content_type, extract};

mod helpers;

use helpers::{serve_once, serve_status};

fn config() -> DocsiftConfig {
    DocsiftConfig {
        network: NetworkConfig {
            connect_timeout_secs: 5,
            read_timeout_secs: 5,
            ..NetworkConfig::default()
        },
        ..DocsiftConfig::default()
    }
}

#[test]
fn test_declared_content_type_is_used() {
    let url = serve_once("report.txt", Some("text/html; charset=UTF-8"), b"<p>served markup</p>");

    let result = extract(&ExtractionRequest::new(url.as_str()), &config()).unwrap();
    assert_eq!(result.mime_type, "text/html; charset=UTF-8");
    assert_eq!(result.content, "served markup\n");
    assert_eq!(result.metadata.get(keys::RESOURCE_NAME), Some("report.txt"));
    assert_eq!(result.metadata.get(keys::CONTENT_ENCODING), Some("UTF-8"));
}

#[test]
fn test_explicit_override_beats_declared_type() {
    let url = serve_once("data", Some("text/html"), b"<p>not parsed as html</p>");

    let request = ExtractionRequest::new(url.as_str()).with_content_type("text/plain");
    let result = extract(&request, &config()).unwrap();
    assert_eq!(result.mime_type, "text/plain");
    assert_eq!(result.content, "<p>not parsed as html</p>\n");
}

#[test]
fn test_octet_stream_declaration_falls_through() {
    let url = serve_once("notes.txt", Some("application/octet-stream"), b"plain words");

    assert_eq!(
        detect_content_type(&ExtractionRequest::new(url.as_str()), &config()).unwrap(),
        "text/plain"
    );
}

#[test]
fn test_error_status_is_network_error() {
    let url = serve_status("404 Not Found");

    let err = extract(&ExtractionRequest::new(url.as_str()), &config()).unwrap_err();
    assert!(matches!(err, DocsiftError::Network { .. }));
    assert!(err.is_resource_error());
}
