/// Language codes and script-based language detection.
///
/// Whisper-style servers report languages by English name ("hindi") while templates,
/// voices and translation targets are keyed by ISO-639-1 code ("hi").
use crate::capability::LanguageDetector;
use crate::error::CommonError;

/// Code used whenever a language is unknown or unmapped.
pub const DEFAULT_LANGUAGE: &str = "en";

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("english", "en"),
    ("hindi", "hi"),
    ("gujarati", "gu"),
    ("tamil", "ta"),
    ("bengali", "bn"),
    ("bangla", "bn"),
    ("punjabi", "pa"),
    ("panjabi", "pa"),
    ("marathi", "mr"),
    ("telugu", "te"),
    ("kannada", "kn"),
    ("malayalam", "ml"),
    ("urdu", "ur"),
    ("odia", "or"),
    ("oriya", "or"),
    ("assamese", "as"),
    ("nepali", "ne"),
];

/// Normalize a language name or code to a lower-case ISO-639-1 code.
///
/// Two-letter inputs are taken as codes; known names are mapped; anything else falls
/// back to [`DEFAULT_LANGUAGE`].
pub fn normalize_language_code(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    // Region suffixes such as "hi-IN" or "en_US".
    let base = lowered
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_string();

    if base.len() == 2 && base.chars().all(|c| c.is_ascii_alphabetic()) {
        return base;
    }
    LANGUAGE_NAMES
        .iter()
        .find(|(name, _)| *name == base)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// Map a character to the language whose script it belongs to.
fn script_language(c: char) -> Option<&'static str> {
    match c as u32 {
        0x0900..=0x097F => Some("hi"),
        0x0980..=0x09FF => Some("bn"),
        0x0A00..=0x0A7F => Some("pa"),
        0x0A80..=0x0AFF => Some("gu"),
        0x0B00..=0x0B7F => Some("or"),
        0x0B80..=0x0BFF => Some("ta"),
        0x0C00..=0x0C7F => Some("te"),
        0x0C80..=0x0CFF => Some("kn"),
        0x0D00..=0x0D7F => Some("ml"),
        0x0600..=0x06FF => Some("ur"),
        _ if c.is_ascii_alphabetic() => Some("en"),
        _ => None,
    }
}

/// Detects language by majority Unicode script among the letters of the text.
///
/// Devanagari is reported as Hindi. Text with no script-bearing letters is undetectable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLanguageDetector;

impl LanguageDetector for ScriptLanguageDetector {
    fn detect(&self, text: &str) -> Result<String, CommonError> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for lang in text.chars().filter_map(script_language) {
            match counts.iter_mut().find(|(l, _)| *l == lang) {
                Some((_, n)) => *n += 1,
                None => counts.push((lang, 1)),
            }
        }
        // First-seen script wins ties.
        let mut best: Option<(&'static str, usize)> = None;
        for (lang, n) in counts {
            if best.map_or(true, |(_, m)| n > m) {
                best = Some((lang, n));
            }
        }
        best.map(|(lang, _)| lang.to_string()).ok_or_else(|| {
            CommonError::LanguageDetection(format!("no script-bearing letters in {text:?}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_names_and_codes() {
        assert_eq!(normalize_language_code("hindi"), "hi");
        assert_eq!(normalize_language_code("Hindi"), "hi");
        assert_eq!(normalize_language_code("hi"), "hi");
        assert_eq!(normalize_language_code("ta-IN"), "ta");
        assert_eq!(normalize_language_code("en_US"), "en");
        assert_eq!(normalize_language_code("bangla"), "bn");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        assert_eq!(normalize_language_code("klingon"), "en");
        assert_eq!(normalize_language_code(""), "en");
    }

    #[test]
    fn detects_indic_scripts() {
        let d = ScriptLanguageDetector;
        assert_eq!(d.detect("मेरा फोन चोरी हो गया").unwrap(), "hi");
        assert_eq!(d.detect("என் தொலைபேசி").unwrap(), "ta");
        assert_eq!(d.detect("મારો ફોન").unwrap(), "gu");
        assert_eq!(d.detect("ਮੇਰਾ ਫ਼ੋਨ").unwrap(), "pa");
        assert_eq!(d.detect("আমার ফোন").unwrap(), "bn");
    }

    #[test]
    fn detects_english_and_majority_script() {
        let d = ScriptLanguageDetector;
        assert_eq!(d.detect("Mumbai, Maharashtra").unwrap(), "en");
        // Mostly Devanagari with a Latin word.
        assert_eq!(d.detect("मुंबई महाराष्ट्र MH").unwrap(), "hi");
    }

    #[test]
    fn digits_only_is_undetectable() {
        let d = ScriptLanguageDetector;
        assert!(d.detect("1234567890").is_err());
        assert!(d.detect("").is_err());
    }
}
