use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::scrape::PageScrapeSource;
use crate::youtube::InnerTubeSource;
use crate::ytdlp::YtDlpSource;
use crate::{LanguagePreference, Segment, Transcript, TranscriptSource, VideoId};

/// One self-contained way of acquiring caption segments.
///
/// Implementations swallow their own failures: `None` covers "captions are
/// disabled", network errors and timeouts alike.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    fn kind(&self) -> TranscriptSource;

    async fn fetch(&self, video_id: &VideoId, lang: &LanguagePreference) -> Option<Vec<Segment>>;
}

/// Ordered list of strategies.
///
/// Strategies are tried strictly in order and the first one that yields any
/// segments wins. Results are never merged across strategies, and a strategy
/// that fails is not retried.
pub struct Cascade {
    sources: Vec<Box<dyn SegmentSource>>,
}

impl Cascade {
    pub fn new(sources: Vec<Box<dyn SegmentSource>>) -> Self {
        Self { sources }
    }

    /// InnerTube API, then page scrape, then yt-dlp
    pub fn standard(client: reqwest::Client, ytdlp_binary: &str, tool_timeout: Duration) -> Self {
        Self::new(vec![
            Box::new(InnerTubeSource::new(client.clone())),
            Box::new(PageScrapeSource::new(client)),
            Box::new(YtDlpSource::new(ytdlp_binary, tool_timeout)),
        ])
    }

    pub fn strategies(&self) -> Vec<TranscriptSource> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// First non-empty transcript produced by the strategies, in order
    pub async fn transcript(&self, video_id: &VideoId, lang: &LanguagePreference) -> Option<Transcript> {
        for source in &self.sources {
            let kind = source.kind();
            debug!("Trying {kind} strategy for {video_id} (lang={lang})");

            let Some(mut segments) = source.fetch(video_id, lang).await else {
                debug!("{kind} strategy yielded nothing for {video_id}");
                continue;
            };
            segments.retain(|s| !s.text.trim().is_empty());
            if segments.is_empty() {
                debug!("{kind} strategy yielded only blank segments for {video_id}");
                continue;
            }

            info!("Transcript for {video_id} from {kind} strategy: {} segments", segments.len());
            return Some(Transcript {
                video_id: video_id.clone(),
                source: kind,
                segments,
            });
        }

        warn!("No transcript found for {video_id} via any strategy");
        None
    }
}
