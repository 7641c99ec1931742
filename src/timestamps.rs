use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::assemble::format_clock;
use crate::markdown;

pub const DEFAULT_MAX_DESCRIPTION_LENGTH: usize = 100;

/// Returned instead of an empty listing
pub const NO_TIMESTAMPS: &str = "No timestamps available";

const ELLIPSIS: &str = "...";

/// Time-like token not embedded in a longer number; group 1 is the token
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{1,2}:\d{1,2}(?::\d{2})?)(?:\D|$)").expect("token pattern is valid")
});

static STRICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}(?::\d{2})?$").expect("strict pattern is valid"));

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}:\d{2}(?::\d{2})?) - (.*)$").expect("entry pattern is valid"));

/// One formatted chapter marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampEntry {
    pub time: String,
    pub description: String,
}

impl TimestampEntry {
    /// Offset into the video in whole seconds
    pub fn seconds(&self) -> u64 {
        clock_to_seconds(&self.time).unwrap_or(0)
    }
}

/// Normalize a model's timestamp listing.
///
/// A token only counts as a time if it has the strict `[H]H:MM[:SS]` shape and
/// its seconds (and, in three-part form, minutes) are below 60. In two-part
/// form minutes past 59 carry into hours, so `75:10` becomes `01:15:10`.
///
/// Markdown is stripped first. Lines with a valid time become
/// `HH:MM:SS - description` (description cut to `max_description_length`
/// characters plus `...`); lines whose time fails validation, or that carry no
/// time but do contain a digit, are kept verbatim; all other lines are dropped.
pub fn format(raw: &str, max_description_length: usize) -> String {
    let clean = markdown::strip(raw);
    let lines: Vec<String> = clean
        .lines()
        .filter_map(|line| format_line(line.trim(), max_description_length))
        .collect();

    if lines.is_empty() {
        NO_TIMESTAMPS.to_string()
    } else {
        lines.join("\n")
    }
}

fn format_line(line: &str, max_description_length: usize) -> Option<String> {
    if line.is_empty() {
        return None;
    }

    let Some(token) = TOKEN_RE.captures(line).and_then(|caps| caps.get(1)) else {
        return line.chars().any(|c| c.is_ascii_digit()).then(|| line.to_string());
    };

    let Some(time) = normalize(token.as_str()) else {
        return Some(line.to_string());
    };

    let description = truncate(description_after(&line[token.end()..]), max_description_length);
    Some(format!("{time} - {description}"))
}

/// `HH:MM:SS` for a valid token, `None` if it fails shape or range checks
fn normalize(token: &str) -> Option<String> {
    if !STRICT_RE.is_match(token) {
        return None;
    }

    let parts: Vec<u64> = token
        .split(':')
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;

    match parts.as_slice() {
        [minutes, seconds] if *seconds < 60 => Some(format_clock(minutes * 60 + seconds)),
        [hours, minutes, seconds] if *minutes < 60 && *seconds < 60 => {
            Some(format!("{hours:02}:{minutes:02}:{seconds:02}"))
        }
        _ => None,
    }
}

/// Text after the time token, minus a leading separator
fn description_after(rest: &str) -> &str {
    let rest = rest.trim_start().trim_start_matches([')', ']']).trim_start();
    let rest = rest.strip_prefix(['-', '–', '—', ':']).unwrap_or(rest);
    rest.trim()
}

fn truncate(description: &str, max_chars: usize) -> String {
    if description.chars().count() > max_chars {
        let cut: String = description.chars().take(max_chars).collect();
        format!("{cut}{ELLIPSIS}")
    } else {
        description.to_string()
    }
}

fn clock_to_seconds(time: &str) -> Option<u64> {
    let parts: Vec<u64> = time
        .split(':')
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;

    match parts.as_slice() {
        [m, s] => Some(m * 60 + s),
        [h, m, s] => Some(h * 3600 + m * 60 + s),
        _ => None,
    }
}

/// Rewrite `HH:MM:SS - description` lines as markdown links to that moment,
/// `[time](<video_url>&t=<seconds>s)`.
///
/// Lines that do not have exactly that shape pass through unchanged.
pub fn hyperlink(formatted: &str, video_url: &str) -> String {
    formatted
        .lines()
        .map(|line| {
            ENTRY_RE
                .captures(line)
                .and_then(|caps| {
                    let seconds = clock_to_seconds(&caps[1])?;
                    Some(format!(
                        "[{}]({video_url}&t={seconds}s) - {}",
                        &caps[1], &caps[2]
                    ))
                })
                .unwrap_or_else(|| line.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Entries recognised in already formatted output
pub fn parse_entries(formatted: &str) -> Vec<TimestampEntry> {
    formatted
        .lines()
        .filter_map(|line| {
            let caps = ENTRY_RE.captures(line)?;
            Some(TimestampEntry {
                time: caps[1].to_string(),
                description: caps[2].to_string(),
            })
        })
        .collect()
}
