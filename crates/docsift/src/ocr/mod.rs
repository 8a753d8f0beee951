//! External OCR engine invocation.
//!
//! The engine (Tesseract by default) runs as a subprocess over a temporary
//! copy of the image and prints recognized text to stdout. The process is
//! killed once the configured timeout elapses.

use crate::core::decoder_config::OcrConfig;
use crate::{DocsiftError, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;

/// Recognize text in `image` with the engine described by `config`.
///
/// Decoders run synchronously, so the engine is driven on a current-thread
/// runtime owned by this call.
///
/// # Errors
///
/// `DocsiftError::Ocr` when OCR is disabled, the engine cannot be found or
/// started, exits unsuccessfully, or exceeds the timeout.
pub fn run_ocr(image: &[u8], config: &OcrConfig) -> Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DocsiftError::ocr_with_source("Failed to start OCR runtime", e))?;
    runtime.block_on(run_ocr_async(image, config))
}

/// Async variant of [`run_ocr`].
pub async fn run_ocr_async(image: &[u8], config: &OcrConfig) -> Result<String> {
    let executable = config.resolve_executable().ok_or_else(|| {
        DocsiftError::ocr(format!(
            "OCR engine '{}' is not available",
            config.executable.display()
        ))
    })?;
    let language = config.language.as_deref().unwrap_or("eng");

    let dir = tempfile::tempdir().map_err(|e| DocsiftError::ocr_with_source("Failed to create OCR work directory", e))?;
    let input = dir.path().join("input-image");
    tokio::fs::write(&input, image)
        .await
        .map_err(|e| DocsiftError::ocr_with_source("Failed to stage image for OCR", e))?;

    tracing::debug!(
        engine = %executable.display(),
        language,
        psm = config.page_segmentation_mode,
        bytes = image.len(),
        "Running OCR engine"
    );

    let stdout = run_engine(&executable, &input, language, config).await?;
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

async fn run_engine(executable: &Path, input: &Path, language: &str, config: &OcrConfig) -> Result<Vec<u8>> {
    let child = Command::new(executable)
        .arg(input)
        .arg("stdout")
        .arg("-l")
        .arg(language)
        .arg("--psm")
        .arg(config.page_segmentation_mode.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| DocsiftError::ocr_with_source(format!("Failed to start '{}'", executable.display()), e))?;

    let child_id = child.id();

    let output = match timeout(config.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(DocsiftError::ocr_with_source("Failed to wait for OCR engine", e)),
        // The cancelled future drops the child, which kills it.
        Err(_) => {
            return Err(DocsiftError::ocr(format!(
                "OCR engine timed out after {} seconds (PID: {:?})",
                config.timeout.as_secs(),
                child_id
            )));
        }
    };

    if !output.status.success() {
        return Err(DocsiftError::ocr(format!(
            "OCR engine exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(output.stdout)
}
