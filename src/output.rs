use eyre::Result;

use crate::generate::into_raw;
use crate::pipeline::{Rendered, RunError};

const SUPPORTED_FORMATS: &str = "\
Supported formats:
  https://www.youtube.com/watch?v=ID
  https://youtu.be/ID
  https://www.youtube.com/embed/ID
  https://www.youtube.com/shorts/ID
  https://www.youtube.com/live/ID
  <11-character video ID>";

/// Render the result as plain text, with a title line when one is known
pub fn render_text(rendered: &Rendered) -> String {
    match &rendered.title {
        Some(title) => format!("# {title}\n\n{}", rendered.content),
        None => rendered.content.clone(),
    }
}

pub fn render_json(rendered: &Rendered) -> Result<String> {
    Ok(serde_json::to_string_pretty(rendered)?)
}

/// User-facing explanation of a failed request
pub fn render_error(err: RunError) -> String {
    match err {
        RunError::InvalidUrl(input) => {
            format!("Invalid YouTube URL: could not extract a video ID from \"{input}\"\n\n{SUPPORTED_FORMATS}")
        }
        RunError::NoTranscript(video_id) => format!(
            "Could not retrieve a transcript for video {video_id}.\n\n\
             This can happen when:\n\
             \x20 - the video has no captions, or captions are disabled by the uploader\n\
             \x20 - captions exist only in a language that was not requested\n\
             \x20 - YouTube blocked the request from this network\n\n\
             Try:\n\
             \x20 - another language with --lang (or --lang auto)\n\
             \x20 - checking that the video shows a CC button on youtube.com\n\
             \x20 - installing yt-dlp, which is used as the last fallback"
        ),
        RunError::Generation(e) => into_raw(Err(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GenerationError;
    use crate::pipeline::Mode;
    use crate::timestamps::TimestampEntry;
    use crate::{TranscriptSource, VideoId};

    fn sample() -> Rendered {
        Rendered {
            video_id: VideoId::resolve("dQw4w9WgXcQ").unwrap(),
            title: Some("Test Video".to_string()),
            mode: Mode::Timestamps,
            source: TranscriptSource::PageScrape,
            content: "00:00:30 - Intro".to_string(),
            timestamps: vec![TimestampEntry {
                time: "00:00:30".to_string(),
                description: "Intro".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render_text(&sample()), "# Test Video\n\n00:00:30 - Intro");
    }

    #[test]
    fn test_render_text_without_title() {
        let rendered = Rendered {
            title: None,
            ..sample()
        };
        assert_eq!(render_text(&rendered), "00:00:30 - Intro");
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["video_id"], "dQw4w9WgXcQ");
        assert_eq!(value["mode"], "timestamps");
        assert_eq!(value["source"], "page-scrape");
        assert_eq!(value["timestamps"][0]["time"], "00:00:30");
    }

    #[test]
    fn test_render_json_omits_empty_fields() {
        let rendered = Rendered {
            title: None,
            mode: Mode::Summary,
            timestamps: vec![],
            ..sample()
        };
        let value: serde_json::Value = serde_json::from_str(&render_json(&rendered).unwrap()).unwrap();
        assert!(value.get("title").is_none());
        assert!(value.get("timestamps").is_none());
    }

    #[test]
    fn test_render_errors() {
        let invalid = render_error(RunError::InvalidUrl("nope".to_string()));
        assert!(invalid.contains("\"nope\""));
        assert!(invalid.contains("https://youtu.be/ID"));

        let id = VideoId::resolve("dQw4w9WgXcQ").unwrap();
        let missing = render_error(RunError::NoTranscript(id));
        assert!(missing.starts_with("Could not retrieve a transcript for video dQw4w9WgXcQ."));
        assert!(missing.contains("yt-dlp"));

        let generation = render_error(RunError::Generation(GenerationError::NoEvidence));
        assert!(generation.starts_with("⚠️"));
    }

    #[test]
    fn test_reported_generation_error_shown_verbatim() {
        let err = crate::generate::classify("⚠️ Quota exceeded for today".to_string()).unwrap_err();
        assert_eq!(render_error(RunError::Generation(err)), "⚠️ Quota exceeded for today");
    }
}
