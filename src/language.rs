use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Caption languages tried when the caller has no preference, in priority order
pub const LANGUAGE_PRIORITIES: &[&str] = &[
    "en", "en-US", "en-GB", "en-IN", //
    "hi", "bn", "te", "ta", "mr", "gu", "kn", "ml", "pa", "or", "as", "ur", //
    "es", "fr", "de", "pt", "it", "ru", "ja", "ko", "zh", "zh-CN", "zh-TW", //
    "ar", "tr", "nl", "pl", "sv", "vi", "th", "id", "ms", "fi", "no", "da", //
    "cs", "ro", "hu", "el", "he", "uk", "fa", "sr", "hr", "bg", "sk", "sl", //
    "lt", "lv", "et", "sw", "fil", "ne", "si", "my", "km", "lo", "ka", "am",
];

/// Regional suffixes appended to a preferred language
const REGIONAL_VARIANTS: &[&str] = &["IN", "US", "GB"];

/// Sentinel meaning "no preference"
pub const AUTO: &str = "auto";

/// Caller's caption language preference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LanguagePreference {
    #[default]
    Auto,
    Code(String),
}

impl LanguagePreference {
    /// The preferred language code, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            LanguagePreference::Auto => None,
            LanguagePreference::Code(code) => Some(code),
        }
    }
}

impl FromStr for LanguagePreference {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(AUTO) {
            Ok(LanguagePreference::Auto)
        } else {
            Ok(LanguagePreference::Code(s.to_string()))
        }
    }
}

impl fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().unwrap_or(AUTO))
    }
}

/// Ordered, duplicate-free list of language codes to try against a caption source.
///
/// A preferred language comes first, followed by its `-IN`, `-US` and `-GB`
/// variants, then the fixed priority table.
pub fn build_language_list(pref: &LanguagePreference) -> Vec<String> {
    let mut langs: Vec<String> = Vec::with_capacity(LANGUAGE_PRIORITIES.len() + 4);

    if let Some(code) = pref.code() {
        langs.push(code.to_string());
        langs.extend(REGIONAL_VARIANTS.iter().map(|region| format!("{code}-{region}")));
    }

    for lang in LANGUAGE_PRIORITIES {
        if !langs.iter().any(|l| l == lang) {
            langs.push((*lang).to_string());
        }
    }

    langs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> LanguagePreference {
        LanguagePreference::Code(s.to_string())
    }

    #[test]
    fn test_preferred_language_first() {
        let langs = build_language_list(&code("hi"));
        assert_eq!(&langs[..5], ["hi", "hi-IN", "hi-US", "hi-GB", "en"]);
        assert_eq!(langs.iter().filter(|l| *l == "hi").count(), 1);
    }

    #[test]
    fn test_auto_uses_priority_table() {
        let langs = build_language_list(&LanguagePreference::Auto);
        assert_eq!(langs, LANGUAGE_PRIORITIES);
    }

    #[test]
    fn test_english_variants_not_duplicated() {
        let langs = build_language_list(&code("en"));
        assert_eq!(&langs[..4], ["en", "en-IN", "en-US", "en-GB"]);
        for lang in ["en", "en-US", "en-GB", "en-IN"] {
            assert_eq!(langs.iter().filter(|l| *l == lang).count(), 1, "{lang}");
        }
        assert_eq!(langs.len(), LANGUAGE_PRIORITIES.len());
    }

    #[test]
    fn test_unknown_language_extends_table() {
        let langs = build_language_list(&code("xx"));
        assert_eq!(langs.len(), LANGUAGE_PRIORITIES.len() + 4);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(build_language_list(&code("fr")), build_language_list(&code("fr")));
    }

    #[test]
    fn test_parse_preference() {
        assert_eq!("auto".parse::<LanguagePreference>().unwrap(), LanguagePreference::Auto);
        assert_eq!("AUTO".parse::<LanguagePreference>().unwrap(), LanguagePreference::Auto);
        assert_eq!("".parse::<LanguagePreference>().unwrap(), LanguagePreference::Auto);
        assert_eq!(" de ".parse::<LanguagePreference>().unwrap(), code("de"));
        assert_eq!(code("de").to_string(), "de");
        assert_eq!(LanguagePreference::Auto.to_string(), "auto");
    }
}
