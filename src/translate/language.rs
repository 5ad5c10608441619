//! Script-based language detection and per-engine language codes

use regex::Regex;
use std::sync::LazyLock;

pub const AUTO: &str = "auto";
pub const DEFAULT_LANGUAGE: &str = "en";

// Tested in order; the first script found anywhere in the text wins, so
// Japanese text containing kanji is reported as Chinese.
static SCRIPT_RANGES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"[\x{4e00}-\x{9fff}]", "zh"),
        (r"[\x{3040}-\x{309f}\x{30a0}-\x{30ff}]", "ja"),
        (r"[\x{ac00}-\x{d7af}]", "ko"),
        (r"[\x{0400}-\x{04ff}]", "ru"),
        (r"[\x{0600}-\x{06ff}]", "ar"),
    ]
    .into_iter()
    .filter_map(|(pattern, code)| Regex::new(pattern).ok().map(|re| (re, code)))
    .collect()
});

/// Canonical code, display name, and engine dialects that differ from the
/// canonical code.
const LANGUAGES: &[(&str, &str, &[(&str, &str)])] = &[
    ("zh", "Chinese", &[]),
    ("en", "English", &[]),
    ("ja", "Japanese", &[("baidu", "jp")]),
    ("ko", "Korean", &[("baidu", "kor")]),
    ("fr", "French", &[("baidu", "fra")]),
    ("de", "German", &[]),
    ("es", "Spanish", &[("baidu", "spa")]),
    ("ru", "Russian", &[]),
    ("it", "Italian", &[]),
    ("pt", "Portuguese", &[]),
    ("ar", "Arabic", &[("baidu", "ara")]),
    ("th", "Thai", &[]),
    ("vi", "Vietnamese", &[("baidu", "vie")]),
    ("hi", "Hindi", &[]),
];

pub fn detect_language(text: &str) -> &'static str {
    SCRIPT_RANGES
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Resolve `auto` to a detected canonical code.
pub fn resolve_source(text: &str, source_lang: &str) -> String {
    if source_lang == AUTO {
        detect_language(text).to_string()
    } else {
        source_lang.to_string()
    }
}

pub fn map_code(engine_key: &str, canonical: &str) -> String {
    LANGUAGES
        .iter()
        .find(|(code, _, _)| *code == canonical)
        .and_then(|(_, _, dialects)| dialects.iter().find(|(engine, _)| *engine == engine_key))
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| canonical.to_string())
}

pub fn language_name(code: &str) -> &str {
    if code == AUTO {
        return "auto-detected language";
    }
    LANGUAGES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, name, _)| *name)
        .unwrap_or(code)
}

pub fn supported_languages() -> Vec<(&'static str, &'static str)> {
    LANGUAGES.iter().map(|(code, name, _)| (*code, *name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_scripts() {
        assert_eq!(detect_language("你好"), "zh");
        assert_eq!(detect_language("hello"), "en");
        assert_eq!(detect_language(""), "en");
        assert_eq!(detect_language("こんにちは"), "ja");
        assert_eq!(detect_language("안녕하세요"), "ko");
        assert_eq!(detect_language("привет"), "ru");
        assert_eq!(detect_language("مرحبا"), "ar");
    }

    #[test]
    fn test_detect_mixed_script_uses_first_range() {
        // Kanji is tested before kana
        assert_eq!(detect_language("日本語のテキスト"), "zh");
        assert_eq!(detect_language("masterpiece, 1girl, 夕焼け"), "zh");
        assert_eq!(detect_language("hello мир"), "ru");
    }

    #[test]
    fn test_resolve_source() {
        assert_eq!(resolve_source("你好", "auto"), "zh");
        assert_eq!(resolve_source("你好", "ja"), "ja");
    }

    #[test]
    fn test_map_code_dialects() {
        assert_eq!(map_code("baidu", "ja"), "jp");
        assert_eq!(map_code("baidu", "ko"), "kor");
        assert_eq!(map_code("google", "ja"), "ja");
        assert_eq!(map_code("baidu", "de"), "de");
    }

    #[test]
    fn test_map_code_falls_back_to_canonical() {
        assert_eq!(map_code("baidu", "auto"), "auto");
        assert_eq!(map_code("unknown-engine", "ko"), "ko");
        assert_eq!(map_code("baidu", "sw"), "sw");
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("zh"), "Chinese");
        assert_eq!(language_name("xx"), "xx");
        assert_eq!(supported_languages().len(), 14);
    }
}
