use std::sync::LazyLock;

use async_trait::async_trait;
use eyre::{Result, bail, eyre};
use log::debug;
use regex::Regex;

use crate::language::build_language_list;
use crate::transcript::SegmentSource;
use crate::youtube::{CaptionTrack, PlayerResponse, fetch_caption_track, fetch_watch_page};
use crate::{LanguagePreference, Segment, TranscriptSource, VideoId};

static PLAYER_RESPONSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"ytInitialPlayerResponse"?\]?\s*=\s*\{"#).expect("player response pattern is valid")
});

/// Caption retrieval by scraping the player response embedded in the watch page
pub struct PageScrapeSource {
    client: reqwest::Client,
}

impl PageScrapeSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn scrape(&self, video_id: &VideoId, lang: &LanguagePreference) -> Result<Vec<Segment>> {
        let html = fetch_watch_page(&self.client, video_id).await?;
        let tracks = extract_player_response(&html)?.into_tracks();
        if tracks.is_empty() {
            bail!("no caption tracks in player response for {video_id}");
        }

        let langs = build_language_list(lang);
        let track = choose_track(&tracks, &langs).ok_or_else(|| eyre!("no usable caption track"))?;
        debug!(
            "Scraped caption track lang={} generated={}",
            track.language_code,
            track.is_generated()
        );

        fetch_caption_track(&self.client, track).await
    }
}

#[async_trait]
impl SegmentSource for PageScrapeSource {
    fn kind(&self) -> TranscriptSource {
        TranscriptSource::PageScrape
    }

    async fn fetch(&self, video_id: &VideoId, lang: &LanguagePreference) -> Option<Vec<Segment>> {
        match self.scrape(video_id, lang).await {
            Ok(segments) if !segments.is_empty() => Some(segments),
            Ok(_) => {
                debug!("Page scrape found an empty caption track for {video_id}");
                None
            }
            Err(e) => {
                debug!("Page scrape failed for {video_id}: {e}");
                None
            }
        }
    }
}

/// Locate `ytInitialPlayerResponse = {...};` in the page and parse the JSON object
pub(crate) fn extract_player_response(html: &str) -> Result<PlayerResponse> {
    let m = PLAYER_RESPONSE_RE
        .find(html)
        .ok_or_else(|| eyre!("ytInitialPlayerResponse not found in watch page"))?;

    // The match ends just past the opening brace; parse one JSON value from there
    let json = &html[m.end() - 1..];
    let mut stream = serde_json::Deserializer::from_str(json).into_iter::<PlayerResponse>();
    match stream.next() {
        Some(parsed) => Ok(parsed?),
        None => bail!("empty player response"),
    }
}

/// Pick a track by walking the candidate languages: manual tracks first, then
/// auto-generated ones, then whatever track is listed first.
pub(crate) fn choose_track<'a>(tracks: &'a [CaptionTrack], langs: &[String]) -> Option<&'a CaptionTrack> {
    let manual = langs.iter().find_map(|lang| {
        tracks
            .iter()
            .find(|t| &t.language_code == lang && !t.is_generated())
    });
    let any = || {
        langs
            .iter()
            .find_map(|lang| tracks.iter().find(|t| &t.language_code == lang))
    };

    manual.or_else(any).or_else(|| tracks.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.test/{lang}"),
            language_code: lang.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_player_response() {
        let html = r#"<script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://example.test/t?a=1;b","languageCode":"en"}]}}};var meta = {};</script>"#;
        let tracks = extract_player_response(html).unwrap().into_tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].base_url, "https://example.test/t?a=1;b");
    }

    #[test]
    fn test_extract_player_response_window_assignment() {
        let html = r#"window["ytInitialPlayerResponse"] = {"videoDetails":{"title":"x"}};"#;
        let tracks = extract_player_response(html).unwrap().into_tracks();
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_extract_player_response_missing() {
        assert!(extract_player_response("<html></html>").is_err());
        assert!(extract_player_response("ytInitialPlayerResponse = {broken").is_err());
    }

    #[test]
    fn test_choose_track_prefers_manual() {
        let tracks = vec![track("en", Some("asr")), track("fr", None), track("en", None)];
        let chosen = choose_track(&tracks, &langs(&["en", "fr"])).unwrap();
        assert_eq!(chosen.language_code, "en");
        assert!(!chosen.is_generated());
    }

    #[test]
    fn test_choose_track_manual_in_later_language_beats_generated() {
        let tracks = vec![track("hi", Some("asr")), track("en", None)];
        let chosen = choose_track(&tracks, &langs(&["hi", "en"])).unwrap();
        assert_eq!(chosen.language_code, "en");
    }

    #[test]
    fn test_choose_track_falls_back_to_generated_then_first() {
        let tracks = vec![track("de", None), track("hi", Some("asr"))];
        assert_eq!(choose_track(&tracks, &langs(&["hi"])).unwrap().language_code, "hi");
        assert_eq!(choose_track(&tracks, &langs(&["xx"])).unwrap().language_code, "de");
        assert!(choose_track(&[], &langs(&["en"])).is_none());
    }
}
