use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

/// Length of every YouTube video id
pub const VIDEO_ID_LEN: usize = 11;

/// URL shapes tried after structured parsing fails. The trailing group keeps a
/// 12th id character from sneaking through as a truncated match.
const URL_PATTERNS: &[&str] = &[
    r"youtube\.com/watch\?(?:[^#\s]*&)?v=([a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)",
    r"youtube\.com/embed/([a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)",
    r"youtube\.com/v/([a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)",
    r"youtube\.com/\?v=([a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)",
    r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)",
    r"youtube\.com/live/([a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)",
    r"youtu\.be/([a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)",
];

static URL_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    URL_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("video id pattern is valid"))
        .collect()
});

/// Canonical 11-character YouTube video id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Resolve a video id from a URL or a bare id.
    ///
    /// Tries, in order: the `v` query parameter of a youtube.com URL, the first
    /// path segment of a youtu.be URL, a family of known URL patterns, and
    /// finally whatever follows the last `v=` (or the whole input) if it is
    /// exactly 11 characters. Returns `None` rather than a garbage id.
    pub fn resolve(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        from_parsed_url(input)
            .or_else(|| from_patterns(input))
            .or_else(|| from_v_split(input))
            .map(VideoId)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VideoId {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoId::resolve(s).ok_or_else(|| eyre::eyre!("could not extract video ID from: {s}"))
    }
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn from_parsed_url(input: &str) -> Option<String> {
    let parsed = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();

    if host == "youtube.com" || host.ends_with(".youtube.com") {
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| is_video_id(v));
    }

    if host == "youtu.be" || host == "www.youtu.be" {
        return parsed
            .path_segments()?
            .next()
            .map(str::to_string)
            .filter(|seg| is_video_id(seg));
    }

    None
}

fn from_patterns(input: &str) -> Option<String> {
    URL_REGEXES
        .iter()
        .find_map(|re| re.captures(input).map(|caps| caps[1].to_string()))
}

fn from_v_split(input: &str) -> Option<String> {
    let tail = input.rsplit("v=").next()?;
    let candidate = tail.split('&').next().unwrap_or(tail);
    is_video_id(candidate).then(|| candidate.to_string())
}
