//! Language identification for extracted text.
//!
//! Backed by `whatlang` when the `language-detection` feature is enabled.
//! Codes are ISO 639-1; `und` means nothing could be determined.

use crate::types::LanguageDetection;

/// Code reported when the language cannot be determined.
pub const UNDETERMINED: &str = "und";

/// Identify the dominant language of `text`.
///
/// ```rust
/// use docsift::language_detection::detect_language;
///
/// let detection = detect_language("");
/// assert_eq!(detection.language, "und");
/// assert!(!detection.reasonably_certain);
/// ```
pub fn detect_language(text: &str) -> LanguageDetection {
    if text.trim().is_empty() {
        return undetermined();
    }
    detect_non_empty(text)
}

fn undetermined() -> LanguageDetection {
    LanguageDetection {
        language: UNDETERMINED.to_string(),
        reasonably_certain: false,
    }
}

#[cfg(feature = "language-detection")]
fn detect_non_empty(text: &str) -> LanguageDetection {
    match whatlang::detect(text) {
        Some(info) => {
            tracing::debug!(
                lang = ?info.lang(),
                confidence = info.confidence(),
                reliable = info.is_reliable(),
                "Detected language"
            );
            LanguageDetection {
                language: lang_to_iso639_1(info.lang()).to_string(),
                reasonably_certain: info.is_reliable(),
            }
        }
        None => undetermined(),
    }
}

#[cfg(not(feature = "language-detection"))]
fn detect_non_empty(_text: &str) -> LanguageDetection {
    tracing::debug!("Built without the `language-detection` feature");
    undetermined()
}

#[cfg(feature = "language-detection")]
fn lang_to_iso639_1(lang: whatlang::Lang) -> &'static str {
    use whatlang::Lang;

    match lang {
        Lang::Eng => "en",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ukr => "uk",
        Lang::Kat => "ka",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Jpn => "ja",
        Lang::Heb => "he",
        Lang::Yid => "yi",
        Lang::Pol => "pl",
        Lang::Amh => "am",
        Lang::Jav => "jv",
        Lang::Kor => "ko",
        Lang::Nob => "nb",
        Lang::Dan => "da",
        Lang::Swe => "sv",
        Lang::Fin => "fi",
        Lang::Tur => "tr",
        Lang::Nld => "nl",
        Lang::Hun => "hu",
        Lang::Ces => "cs",
        Lang::Ell => "el",
        Lang::Bul => "bg",
        Lang::Bel => "be",
        Lang::Mar => "mr",
        Lang::Kan => "kn",
        Lang::Ron => "ro",
        Lang::Slv => "sl",
        Lang::Hrv => "hr",
        Lang::Srp => "sr",
        Lang::Mkd => "mk",
        Lang::Lit => "lt",
        Lang::Lav => "lv",
        Lang::Est => "et",
        Lang::Tam => "ta",
        Lang::Vie => "vi",
        Lang::Urd => "ur",
        Lang::Tha => "th",
        Lang::Guj => "gu",
        Lang::Uzb => "uz",
        Lang::Pan => "pa",
        Lang::Aze => "az",
        Lang::Ind => "id",
        Lang::Tel => "te",
        Lang::Pes => "fa",
        Lang::Mal => "ml",
        Lang::Ori => "or",
        Lang::Mya => "my",
        Lang::Nep => "ne",
        Lang::Sin => "si",
        Lang::Khm => "km",
        Lang::Tuk => "tk",
        Lang::Aka => "ak",
        Lang::Zul => "zu",
        Lang::Sna => "sn",
        Lang::Afr => "af",
        Lang::Lat => "la",
        Lang::Slk => "sk",
        Lang::Cat => "ca",
        Lang::Tgl => "tl",
        Lang::Hye => "hy",
        Lang::Epo => "eo",
        Lang::Ben => "bn",
        Lang::Cym => "cy",
    }
}
