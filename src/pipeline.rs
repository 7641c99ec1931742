use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assemble::{ParagraphSettings, to_paragraphs, to_timed_string};
use crate::generate::{GenerationError, Generator};
use crate::timestamps::{self, DEFAULT_MAX_DESCRIPTION_LENGTH, TimestampEntry};
use crate::transcript::Cascade;
use crate::{LanguagePreference, Transcript, TranscriptSource, VideoId, prompt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Summary,
    Timestamps,
    Transcript,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Summary => write!(f, "summary"),
            Mode::Timestamps => write!(f, "timestamps"),
            Mode::Transcript => write!(f, "transcript"),
        }
    }
}

/// Per-request options
#[derive(Debug, Clone)]
pub struct Settings {
    pub language: LanguagePreference,
    pub hyperlink: bool,
    /// Transcript mode only: clean up the prose with the generator
    pub enhance: bool,
    pub max_description_length: usize,
    pub paragraphs: ParagraphSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: LanguagePreference::Auto,
            hyperlink: true,
            enhance: false,
            max_description_length: DEFAULT_MAX_DESCRIPTION_LENGTH,
            paragraphs: ParagraphSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not extract a video ID from: {0}")]
    InvalidUrl(String),

    #[error("no transcript could be retrieved for video {0}")]
    NoTranscript(VideoId),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Result of one request, ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct Rendered {
    pub video_id: VideoId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub mode: Mode,
    pub source: TranscriptSource,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub timestamps: Vec<TimestampEntry>,
}

/// Transcript acquisition wired to generation for the three modes
pub struct Pipeline<G: Generator> {
    cascade: Cascade,
    generator: G,
}

impl<G: Generator> Pipeline<G> {
    pub fn new(cascade: Cascade, generator: G) -> Self {
        Self { cascade, generator }
    }

    pub async fn transcript(&self, video_id: &VideoId, lang: &LanguagePreference) -> Result<Transcript, RunError> {
        self.cascade
            .transcript(video_id, lang)
            .await
            .ok_or_else(|| RunError::NoTranscript(video_id.clone()))
    }

    /// Resolve `input` to a video and render it in `mode`
    pub async fn run(&self, input: &str, mode: Mode, settings: &Settings) -> Result<Rendered, RunError> {
        let video_id = VideoId::resolve(input).ok_or_else(|| RunError::InvalidUrl(input.trim().to_string()))?;
        self.run_for(&video_id, mode, settings).await
    }

    pub async fn run_for(&self, video_id: &VideoId, mode: Mode, settings: &Settings) -> Result<Rendered, RunError> {
        let transcript = self.transcript(video_id, &settings.language).await?;
        debug!("Rendering {mode} for {video_id} from {} segments", transcript.segments.len());

        let mut timestamps = Vec::new();
        let content = match mode {
            Mode::Summary => {
                let evidence = to_paragraphs(&transcript.segments, &settings.paragraphs);
                self.generator.generate(prompt::SUMMARY, &evidence, "").await?
            }
            Mode::Timestamps => {
                let evidence = to_timed_string(&transcript.segments);
                let url = video_id.watch_url();
                let raw = self.generator.generate(prompt::TIMESTAMPS, &evidence, &url).await?;
                let formatted = timestamps::format(&raw, settings.max_description_length);
                timestamps = timestamps::parse_entries(&formatted);
                info!("Parsed {} timestamp entries for {video_id}", timestamps.len());
                if settings.hyperlink {
                    timestamps::hyperlink(&formatted, &url)
                } else {
                    formatted
                }
            }
            Mode::Transcript => {
                let prose = to_paragraphs(&transcript.segments, &settings.paragraphs);
                if settings.enhance {
                    self.generator.generate(prompt::TRANSCRIPT, &prose, "").await?
                } else {
                    prose
                }
            }
        };

        Ok(Rendered {
            video_id: video_id.clone(),
            title: None,
            mode,
            source: transcript.source,
            content,
            timestamps,
        })
    }
}
