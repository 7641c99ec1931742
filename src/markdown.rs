use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Substitutions applied in order on each pass. Every rule deletes at least one
/// character when it fires, so repeating the passes reaches a fixed point.
const RULES: &[(&str, &str)] = &[
    // horizontal rules, before emphasis can eat the asterisks
    (r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$", ""),
    (r"(?m)^#{1,6}[ \t]+(.+)$", "$1"),
    (r"(?s)```[^\n]*\n(.*?)```", "$1"),
    (r"`([^`\n]+)`", "$1"),
    (r"!?\[(.+?)\]\(.+?\)", "$1"),
    (r"\*\*(.+?)\*\*", "$1"),
    (r"__(.+?)__", "$1"),
    (r"\*(.+?)\*", "$1"),
    (r"_(.+?)_", "$1"),
    (r"(?m)^>[ \t]?(.*)$", "$1"),
];

static COMPILED: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).expect("markdown pattern is valid"), *replacement))
        .collect()
});

fn strip_once(text: &str) -> String {
    let mut out = text.to_string();
    for (re, replacement) in COMPILED.iter() {
        if let Cow::Owned(replaced) = re.replace_all(&out, *replacement) {
            out = replaced;
        }
    }
    out
}

/// Remove markdown decoration, keeping link text and code contents.
///
/// Idempotent: `strip(&strip(x)) == strip(x)`.
pub fn strip(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emphasis() {
        assert_eq!(strip("**bold** and *italic* and __strong__ and _em_"), "bold and italic and strong and em");
    }

    #[test]
    fn test_links_keep_text() {
        assert_eq!(
            strip("[00:03:12](https://youtu.be/abc_def?t=192) Introduction"),
            "00:03:12 Introduction"
        );
    }

    #[test]
    fn test_headings_quotes_and_rules() {
        let text = "## Timestamps\n> quoted line\n---\n***\nplain";
        assert_eq!(strip(text), "Timestamps\nquoted line\n\n\nplain");
    }

    #[test]
    fn test_code() {
        assert_eq!(strip("use `cargo` now"), "use cargo now");
        assert_eq!(strip("```text\n00:30 Intro\n```"), "00:30 Intro\n");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "00:00:30 - Intro\n00:03:45 - Point one";
        assert_eq!(strip(text), text);
    }

    #[test]
    fn test_idempotent_on_nested_markup() {
        for text in ["__init__ method", "> > nested quote", "**_mixed_** [a](b) `c`", "_a_ _b_"] {
            let once = strip(text);
            assert_eq!(strip(&once), once, "input: {text}");
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(strip(""), "");
    }
}
