//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::NamedTempFile;
use zip::ZipWriter;
use zip::unstable::write::FileOptionsExt;
use zip::write::SimpleFileOptions;

/// Write `content` to a temporary file whose name ends in `suffix`.
pub fn temp_file(suffix: &str, content: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("docsift-")
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Build a ZIP archive in memory. Entries ending in `/` become directories.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_zip(entries, None)
}

/// Build a ZIP archive whose file entries are ZipCrypto-protected.
pub fn encrypted_zip_bytes(entries: &[(&str, &[u8])], password: &[u8]) -> Vec<u8> {
    build_zip(entries, Some(password))
}

fn build_zip(entries: &[(&str, &[u8])], password: Option<&[u8]>) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut options = SimpleFileOptions::default();
    if let Some(password) = password {
        options = options
            .with_deprecated_encryption(password)
            .expect("Failed to enable encryption");
    }

    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, SimpleFileOptions::default())
                .expect("Failed to add directory");
        } else {
            zip.start_file(*name, options).expect("Failed to start entry");
            zip.write_all(data).expect("Failed to write entry");
        }
    }

    zip.finish().expect("Failed to finish ZIP").into_inner()
}

/// Serve one canned HTTP response on a local port and return the URL for `path`.
pub fn serve_once(path: &str, content_type: Option<&str>, body: &[u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let port = listener.local_addr().expect("No local address").port();

    let mut response = b"HTTP/1.1 200 OK\r\n".to_vec();
    if let Some(content_type) = content_type {
        response.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    response.extend_from_slice(format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()).as_bytes());
    response.extend_from_slice(body);

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        }
    });

    format!("http://127.0.0.1:{}/{}", port, path.trim_start_matches('/'))
}

/// Serve one response with the given status line and an empty body.
pub fn serve_status(status_line: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let port = listener.local_addr().expect("No local address").port();
    let response = format!("HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status_line);

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://127.0.0.1:{}/missing.txt", port)
}
