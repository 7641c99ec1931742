pub mod assemble;
pub mod config;
pub mod generate;
pub mod language;
pub mod markdown;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod scrape;
pub mod timestamps;
pub mod title;
pub mod transcript;
pub mod video_id;
pub mod youtube;
pub mod ytdlp;

use serde::Serialize;

pub use language::LanguagePreference;
pub use video_id::VideoId;

/// Browser user agent sent with every request to youtube.com
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// A single captioned segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
}

impl Segment {
    pub fn new(text: impl Into<String>, start: f64) -> Self {
        Self {
            text: text.into(),
            start,
        }
    }
}

/// Strategy that produced the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptSource {
    Api,
    PageScrape,
    ExternalTool,
}

/// Transcript segments for a video, tagged with the strategy that found them
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: VideoId,
    pub source: TranscriptSource,
    pub segments: Vec<Segment>,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::Api => write!(f, "api"),
            TranscriptSource::PageScrape => write!(f, "page-scrape"),
            TranscriptSource::ExternalTool => write!(f, "external-tool"),
        }
    }
}

/// Collapse embedded newlines and surrounding whitespace in caption text
pub(crate) fn clean_caption_text(raw: &str) -> String {
    raw.replace(['\r', '\n'], " ").trim().to_string()
}
