//! Structured decoder configuration assembled from the option set.
//!
//! OCR is off unless the caller names an OCR language. When it is off, the
//! executable path points somewhere that cannot exist, so any attempt to run
//! the engine fails immediately instead of picking up a system install.

use crate::core::options::ExtractionOptions;
use crate::types::Metadata;
use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Executable path used while OCR is disabled. `/dev/null` is not a
/// directory, so nothing can live beneath it.
pub const DISABLED_OCR_PATH: &str = "/dev/null/docsift-ocr-disabled";

pub const DEFAULT_OCR_EXECUTABLE: &str = "tesseract";
pub const DEFAULT_OCR_MAX_FILE_SIZE: u64 = i32::MAX as u64;
pub const DEFAULT_OCR_MIN_FILE_SIZE: u64 = 0;
pub const DEFAULT_OCR_PAGE_SEGMENTATION_MODE: u8 = 1;
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 120;

/// OCR engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrConfig {
    pub enabled: bool,
    pub language: Option<String>,
    pub executable: PathBuf,
    pub max_file_size: u64,
    pub min_file_size: u64,
    pub page_segmentation_mode: u8,
    pub timeout: Duration,
}

impl OcrConfig {
    /// OCR switched off, engine lookup redirected to [`DISABLED_OCR_PATH`].
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            language: None,
            executable: PathBuf::from(DISABLED_OCR_PATH),
            ..Self::enabled_for(String::new())
        }
    }

    /// OCR switched on for `language` with engine defaults for everything else.
    pub fn enabled_for(language: impl Into<String>) -> Self {
        Self {
            enabled: true,
            language: Some(language.into()),
            executable: PathBuf::from(DEFAULT_OCR_EXECUTABLE),
            max_file_size: DEFAULT_OCR_MAX_FILE_SIZE,
            min_file_size: DEFAULT_OCR_MIN_FILE_SIZE,
            page_segmentation_mode: DEFAULT_OCR_PAGE_SEGMENTATION_MODE,
            timeout: Duration::from_secs(DEFAULT_OCR_TIMEOUT_SECS),
        }
    }

    /// Whether an input of `size` bytes is within the configured bounds.
    pub fn accepts_size(&self, size: u64) -> bool {
        size >= self.min_file_size && size <= self.max_file_size
    }

    /// Resolve the executable, searching `PATH` for bare names.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        resolve_program(&self.executable)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        let with_exe = candidate.with_extension(std::env::consts::EXE_EXTENSION);
        (!std::env::consts::EXE_EXTENSION.is_empty() && with_exe.is_file()).then_some(with_exe)
    })
}

pub const DEFAULT_AVERAGE_CHAR_TOLERANCE: f32 = 0.3;
pub const DEFAULT_SPACING_TOLERANCE: f32 = 0.5;

/// Embedded-document extraction tuning.
///
/// Sparse: only keys present in the option set are stored, the accessors
/// fill in decoder defaults. The values are carried to every decoder through
/// [`DecoderConfig`] for page-layout formats that honor them; the built-in
/// decoders ignore them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbeddedDocumentConfig {
    pub average_char_tolerance: Option<f32>,
    pub enable_auto_space: Option<bool>,
    pub extract_acro_form_content: Option<bool>,
    pub extract_annotation_text: Option<bool>,
    pub extract_inline_images: Option<bool>,
    pub extract_unique_inline_images_only: Option<bool>,
    pub sort_by_position: Option<bool>,
    pub spacing_tolerance: Option<f32>,
    pub suppress_duplicate_overlapping_text: Option<bool>,
    pub use_non_sequential_parser: Option<bool>,
}

impl EmbeddedDocumentConfig {
    pub fn average_char_tolerance(&self) -> f32 {
        self.average_char_tolerance.unwrap_or(DEFAULT_AVERAGE_CHAR_TOLERANCE)
    }

    pub fn enable_auto_space(&self) -> bool {
        self.enable_auto_space.unwrap_or(true)
    }

    pub fn extract_acro_form_content(&self) -> bool {
        self.extract_acro_form_content.unwrap_or(true)
    }

    pub fn extract_annotation_text(&self) -> bool {
        self.extract_annotation_text.unwrap_or(true)
    }

    pub fn extract_inline_images(&self) -> bool {
        self.extract_inline_images.unwrap_or(false)
    }

    pub fn extract_unique_inline_images_only(&self) -> bool {
        self.extract_unique_inline_images_only.unwrap_or(true)
    }

    pub fn sort_by_position(&self) -> bool {
        self.sort_by_position.unwrap_or(false)
    }

    pub fn spacing_tolerance(&self) -> f32 {
        self.spacing_tolerance.unwrap_or(DEFAULT_SPACING_TOLERANCE)
    }

    pub fn suppress_duplicate_overlapping_text(&self) -> bool {
        self.suppress_duplicate_overlapping_text.unwrap_or(false)
    }

    pub fn use_non_sequential_parser(&self) -> bool {
        self.use_non_sequential_parser.unwrap_or(false)
    }
}

/// Supplies credentials for encrypted documents.
pub trait PasswordProvider: Send + Sync {
    /// Password for the document described by `metadata`, if any.
    fn password(&self, metadata: &Metadata) -> Option<String>;
}

/// Returns the same password for every document.
#[derive(Clone)]
pub struct StaticPasswordProvider {
    password: String,
}

impl StaticPasswordProvider {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl PasswordProvider for StaticPasswordProvider {
    fn password(&self, _metadata: &Metadata) -> Option<String> {
        Some(self.password.clone())
    }
}

impl fmt::Debug for StaticPasswordProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticPasswordProvider").finish_non_exhaustive()
    }
}

/// Everything a decoder needs to know about one request.
#[derive(Clone, Default)]
pub struct DecoderConfig {
    pub ocr: OcrConfig,
    pub embedded: EmbeddedDocumentConfig,
    pub password_provider: Option<Arc<dyn PasswordProvider>>,
}

impl DecoderConfig {
    /// Map parsed options onto decoder settings.
    pub fn assemble(options: &ExtractionOptions) -> Self {
        let ocr = match &options.ocr_language {
            Some(language) => {
                let mut ocr = OcrConfig::enabled_for(language.clone());
                if let Some(path) = &options.ocr_path {
                    ocr.executable = path.clone();
                }
                if let Some(max) = options.ocr_max_file_size {
                    ocr.max_file_size = max;
                }
                if let Some(min) = options.ocr_min_file_size {
                    ocr.min_file_size = min;
                }
                if let Some(mode) = options.ocr_page_segmentation_mode {
                    ocr.page_segmentation_mode = mode;
                }
                if let Some(timeout) = options.ocr_timeout {
                    ocr.timeout = Duration::from_secs(timeout);
                }
                ocr
            }
            None => OcrConfig::disabled(),
        };

        let embedded = EmbeddedDocumentConfig {
            average_char_tolerance: options.average_char_tolerance,
            enable_auto_space: options.enable_auto_space,
            extract_acro_form_content: options.extract_acro_form_content,
            extract_annotation_text: options.extract_annotation_text,
            extract_inline_images: options.extract_inline_images,
            extract_unique_inline_images_only: options.extract_unique_inline_images_only,
            sort_by_position: options.sort_by_position,
            spacing_tolerance: options.spacing_tolerance,
            suppress_duplicate_overlapping_text: options.suppress_duplicate_overlapping_text,
            use_non_sequential_parser: options.use_non_sequential_parser,
        };

        let password_provider = options
            .password
            .as_ref()
            .map(|password| Arc::new(StaticPasswordProvider::new(password.clone())) as Arc<dyn PasswordProvider>);

        tracing::debug!(
            ocr_enabled = ocr.enabled,
            embedded_overrides = options.has_embedded_overrides(),
            has_password = password_provider.is_some(),
            "Assembled decoder configuration"
        );

        Self {
            ocr,
            embedded,
            password_provider,
        }
    }

    /// Parse an untyped option set and assemble in one step.
    pub fn from_option_map(map: &Map<String, Value>) -> Result<Self> {
        let options = ExtractionOptions::from_map(map)?;
        Ok(Self::assemble(&options))
    }

    pub fn password_for(&self, metadata: &Metadata) -> Option<String> {
        self.password_provider.as_ref().and_then(|provider| provider.password(metadata))
    }
}

impl fmt::Debug for DecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("ocr", &self.ocr)
            .field("embedded", &self.embedded)
            .field("password_provider", &self.password_provider.is_some())
            .finish()
    }
}
