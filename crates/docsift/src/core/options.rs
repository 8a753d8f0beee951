//! Per-request option set.
//!
//! Callers hand in an open-ended key/value mapping (a JSON object from a host
//! binding, `key=value` pairs from the CLI). It is parsed exactly once into
//! [`ExtractionOptions`] before any input is opened; a malformed value fails
//! the request with a validation error naming the key.

use crate::{DocsiftError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const CONTENT_TYPE: &str = "contentType";
pub const OUTPUT_ENCODING: &str = "outputEncoding";
pub const PASSWORD: &str = "password";
pub const OCR_LANGUAGE: &str = "ocrLanguage";
pub const OCR_PATH: &str = "ocrPath";
pub const OCR_MAX_FILE_SIZE: &str = "ocrMaxFileSize";
pub const OCR_MIN_FILE_SIZE: &str = "ocrMinFileSize";
pub const OCR_PAGE_SEGMENTATION_MODE: &str = "ocrPageSegmentationMode";
pub const OCR_TIMEOUT: &str = "ocrTimeout";
pub const AVERAGE_CHAR_TOLERANCE: &str = "averageCharTolerance";
pub const ENABLE_AUTO_SPACE: &str = "enableAutoSpace";
pub const EXTRACT_ACRO_FORM_CONTENT: &str = "extractAcroFormContent";
pub const EXTRACT_ANNOTATION_TEXT: &str = "extractAnnotationText";
pub const EXTRACT_INLINE_IMAGES: &str = "extractInlineImages";
pub const EXTRACT_UNIQUE_INLINE_IMAGES_ONLY: &str = "extractUniqueInlineImagesOnly";
pub const SORT_BY_POSITION: &str = "sortByPosition";
pub const SPACING_TOLERANCE: &str = "spacingTolerance";
pub const SUPPRESS_DUPLICATE_OVERLAPPING_TEXT: &str = "suppressDuplicateOverlappingText";
pub const USE_NON_SEQUENTIAL_PARSER: &str = "useNonSequentialParser";

/// Every recognized option key.
pub const RECOGNIZED_KEYS: &[&str] = &[
    CONTENT_TYPE,
    OUTPUT_ENCODING,
    PASSWORD,
    OCR_LANGUAGE,
    OCR_PATH,
    OCR_MAX_FILE_SIZE,
    OCR_MIN_FILE_SIZE,
    OCR_PAGE_SEGMENTATION_MODE,
    OCR_TIMEOUT,
    AVERAGE_CHAR_TOLERANCE,
    ENABLE_AUTO_SPACE,
    EXTRACT_ACRO_FORM_CONTENT,
    EXTRACT_ANNOTATION_TEXT,
    EXTRACT_INLINE_IMAGES,
    EXTRACT_UNIQUE_INLINE_IMAGES_ONLY,
    SORT_BY_POSITION,
    SPACING_TOLERANCE,
    SUPPRESS_DUPLICATE_OVERLAPPING_TEXT,
    USE_NON_SEQUENTIAL_PARSER,
];

/// Typed view of the option set. Absent keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOptions {
    pub content_type: Option<String>,
    pub output_encoding: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub ocr_language: Option<String>,
    pub ocr_path: Option<PathBuf>,
    pub ocr_max_file_size: Option<u64>,
    pub ocr_min_file_size: Option<u64>,
    pub ocr_page_segmentation_mode: Option<u8>,
    pub ocr_timeout: Option<u64>,
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

impl ExtractionOptions {
    /// Parse an untyped option mapping.
    ///
    /// Numbers may be given as JSON numbers or numeric strings, flags as JSON
    /// booleans or `"true"`/`"false"`. `null` counts as absent. Unknown keys
    /// are ignored.
    ///
    /// # Errors
    ///
    /// `DocsiftError::Validation` naming the first key whose value does not
    /// parse.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        for key in map.keys() {
            if !RECOGNIZED_KEYS.contains(&key.as_str()) {
                tracing::debug!(key = %key, "Ignoring unrecognized option");
            }
        }

        let options = Self {
            content_type: string(map, CONTENT_TYPE)?,
            output_encoding: string(map, OUTPUT_ENCODING)?,
            password: string(map, PASSWORD)?,
            ocr_language: string(map, OCR_LANGUAGE)?,
            ocr_path: string(map, OCR_PATH)?.map(PathBuf::from),
            ocr_max_file_size: number(map, OCR_MAX_FILE_SIZE)?,
            ocr_min_file_size: number(map, OCR_MIN_FILE_SIZE)?,
            ocr_page_segmentation_mode: page_segmentation_mode(map)?,
            ocr_timeout: number(map, OCR_TIMEOUT)?,
            average_char_tolerance: tolerance(map, AVERAGE_CHAR_TOLERANCE)?,
            enable_auto_space: flag(map, ENABLE_AUTO_SPACE)?,
            extract_acro_form_content: flag(map, EXTRACT_ACRO_FORM_CONTENT)?,
            extract_annotation_text: flag(map, EXTRACT_ANNOTATION_TEXT)?,
            extract_inline_images: flag(map, EXTRACT_INLINE_IMAGES)?,
            extract_unique_inline_images_only: flag(map, EXTRACT_UNIQUE_INLINE_IMAGES_ONLY)?,
            sort_by_position: flag(map, SORT_BY_POSITION)?,
            spacing_tolerance: tolerance(map, SPACING_TOLERANCE)?,
            suppress_duplicate_overlapping_text: flag(map, SUPPRESS_DUPLICATE_OVERLAPPING_TEXT)?,
            use_non_sequential_parser: flag(map, USE_NON_SEQUENTIAL_PARSER)?,
        };

        if let (Some(min), Some(max)) = (options.ocr_min_file_size, options.ocr_max_file_size)
            && min > max
        {
            return Err(DocsiftError::validation(format!(
                "Option '{}' ({}) is larger than '{}' ({})",
                OCR_MIN_FILE_SIZE, min, OCR_MAX_FILE_SIZE, max
            )));
        }

        Ok(options)
    }

    /// Parse a JSON object string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| DocsiftError::validation_with_source("Options must be a JSON object", e))?;
        match value {
            Value::Object(map) => Self::from_map(&map),
            Value::Null => Ok(Self::default()),
            _ => Err(DocsiftError::validation("Options must be a JSON object")),
        }
    }

    /// True when any embedded-document key was supplied.
    pub fn has_embedded_overrides(&self) -> bool {
        self.average_char_tolerance.is_some()
            || self.enable_auto_space.is_some()
            || self.extract_acro_form_content.is_some()
            || self.extract_annotation_text.is_some()
            || self.extract_inline_images.is_some()
            || self.extract_unique_inline_images_only.is_some()
            || self.sort_by_position.is_some()
            || self.spacing_tolerance.is_some()
            || self.suppress_duplicate_overlapping_text.is_some()
            || self.use_non_sequential_parser.is_some()
    }
}

/// Convert a `key=value` string into the JSON value the option parser expects.
///
/// `true`/`false` become booleans, integers and decimals become numbers,
/// everything else stays a string (and fails later if a number was required).
pub fn parse_option_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>()
        && float.is_finite()
    {
        return Value::from(float);
    }
    Value::String(raw.to_string())
}

fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

fn invalid(key: &str, value: &Value, expected: &str) -> DocsiftError {
    DocsiftError::validation(format!("Option '{}' expects {}, got {}", key, expected, value))
}

fn string(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match present(map, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(invalid(key, other, "a string")),
    }
}

fn flag(map: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match present(map, key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(invalid(key, other, "a boolean")),
    }
}

fn number<T>(map: &Map<String, Value>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = match present(map, key) {
        None => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => return Err(invalid(key, other, "a number")),
    };

    raw.parse::<T>().map(Some).map_err(|e| {
        DocsiftError::validation_with_source(format!("Option '{}' expects a number, got '{}'", key, raw), e)
    })
}

/// Float parsing accepts `NaN` and `inf`; tolerances must be finite.
fn tolerance(map: &Map<String, Value>, key: &str) -> Result<Option<f32>> {
    let value = number::<f32>(map, key)?;
    if let Some(value) = value
        && !value.is_finite()
    {
        return Err(DocsiftError::validation(format!(
            "Option '{}' expects a finite number, got {}",
            key, value
        )));
    }
    Ok(value)
}

fn page_segmentation_mode(map: &Map<String, Value>) -> Result<Option<u8>> {
    let mode = number::<u8>(map, OCR_PAGE_SEGMENTATION_MODE)?;
    if let Some(mode) = mode
        && mode > 13
    {
        return Err(DocsiftError::validation(format!(
            "Option '{}' must be between 0 and 13, got {}",
            OCR_PAGE_SEGMENTATION_MODE, mode
        )));
    }
    Ok(mode)
}
