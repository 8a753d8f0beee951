//! Runs the built `docsift` binary against temporary files.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn docsift(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docsift"))
        .args(args)
        .env_remove("DOCSIFT_LOG")
        .env_remove("RUST_LOG")
        .current_dir(std::env::temp_dir())
        .output()
        .expect("failed to run docsift binary")
}

fn fixture(suffix: &str, content: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

fn path_of(file: &NamedTempFile) -> &str {
    file.path().to_str().unwrap()
}

#[test]
fn test_text_command_prints_body_text() {
    let file = fixture(".html", b"<html><head><title>T</title></head><body><p>hello <i>there</i></p></body></html>");

    let output = docsift(&["text", path_of(&file)]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello there\n");
}

#[test]
fn test_type_command() {
    let file = fixture(".txt", b"plain ascii");

    let output = docsift(&["type", path_of(&file)]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "text/plain");

    let output = docsift(&["type", "--with-charset", path_of(&file)]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "text/plain; charset=ISO-8859-1"
    );
}

#[test]
fn test_charset_command() {
    let file = fixture(".txt", "gr\u{fc}\u{df}e".as_bytes());

    let output = docsift(&["charset", path_of(&file)]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "UTF-8");
}

#[test]
fn test_meta_command_outputs_json_lists() {
    let file = fixture(".txt", b"words");

    let output = docsift(&["meta", path_of(&file)]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["Content-Encoding"], serde_json::json!(["ISO-8859-1"]));
}

#[test]
fn test_malformed_option_pair_fails() {
    let file = fixture(".txt", b"words");

    let output = docsift(&["text", "-o", "ocrTimeout", path_of(&file)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("key=value"));
}

#[test]
fn test_invalid_option_value_fails() {
    let file = fixture(".txt", b"words");

    let output = docsift(&["text", "-o", "ocrTimeout=soon", path_of(&file)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ocrTimeout"));
}

#[test]
fn test_missing_file_fails() {
    let output = docsift(&["text", "/no/such/dir/input.txt"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error:"));
}

#[test]
fn test_language_command_undetermined_for_blank_text() {
    let output = docsift(&["language", "   "]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["language"], "und");
    assert_eq!(json["reasonablyCertain"], false);
}
