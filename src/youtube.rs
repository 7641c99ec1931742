use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::language::build_language_list;
use crate::transcript::SegmentSource;
use crate::{LanguagePreference, Segment, TranscriptSource, USER_AGENT, VideoId, clean_caption_text};

/// Languages the captions service falls back to when none of the candidates match
const SOURCE_DEFAULT_LANGUAGES: &[&str] = &["en"];

const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CaptionTrack {
    #[serde(rename = "baseUrl", default)]
    pub base_url: String,
    #[serde(rename = "languageCode", default)]
    pub language_code: String,
    /// `"asr"` for auto-generated tracks
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

impl PlayerResponse {
    /// Caption tracks listed in the response, empty when captions are disabled
    pub fn into_tracks(self) -> Vec<CaptionTrack> {
        self.captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default()
    }

    fn unplayable_reason(&self) -> Option<String> {
        let status = self.playability_status.as_ref()?;
        match status.status.as_deref() {
            None | Some("OK") => None,
            Some(code) => Some(match &status.reason {
                Some(reason) => format!("{code}: {reason}"),
                None => code.to_string(),
            }),
        }
    }
}

/// Fetch the public watch page for a video
pub(crate) async fn fetch_watch_page(client: &reqwest::Client, video_id: &VideoId) -> Result<String> {
    let watch_url = video_id.watch_url();
    debug!("Fetching watch page: {watch_url}");

    let html = client
        .get(&watch_url)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.5")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(html)
}

/// Download a caption track and parse it into segments
pub(crate) async fn fetch_caption_track(client: &reqwest::Client, track: &CaptionTrack) -> Result<Vec<Segment>> {
    if track.base_url.is_empty() {
        bail!("caption track for {} has no URL", track.language_code);
    }
    // srv3 is a different document shape; the default is the <text> timed-text format
    let url = track.base_url.replace("&fmt=srv3", "");

    let caption_xml = client
        .get(&url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    parse_caption_xml(&caption_xml)
}

/// Captions retrieval through YouTube's InnerTube player API
pub struct InnerTubeSource {
    client: reqwest::Client,
}

impl InnerTubeSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
        let page_html = fetch_watch_page(&self.client, video_id).await?;
        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION
                }
            },
            "videoId": video_id.as_str()
        });

        let resp: PlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(reason) = resp.unplayable_reason() {
            bail!("video {video_id} is not playable ({reason})");
        }

        Ok(resp.into_tracks())
    }
}

#[async_trait]
impl SegmentSource for InnerTubeSource {
    fn kind(&self) -> TranscriptSource {
        TranscriptSource::Api
    }

    async fn fetch(&self, video_id: &VideoId, lang: &LanguagePreference) -> Option<Vec<Segment>> {
        let tracks = match self.list_tracks(video_id).await {
            Ok(tracks) => tracks,
            Err(e) => {
                debug!("InnerTube track listing failed for {video_id}: {e}");
                return None;
            }
        };
        if tracks.is_empty() {
            debug!("No caption tracks listed for {video_id}");
            return None;
        }

        let langs = build_language_list(lang);
        for track in attempt_order(&tracks, &langs) {
            debug!(
                "Trying caption track lang={} generated={}",
                track.language_code,
                track.is_generated()
            );
            match fetch_caption_track(&self.client, track).await {
                Ok(segments) if !segments.is_empty() => return Some(segments),
                Ok(_) => debug!("Caption track {} was empty", track.language_code),
                Err(e) => debug!("Caption track {} failed: {e}", track.language_code),
            }
        }

        None
    }
}

/// Order in which tracks are attempted: each candidate language (manual
/// before auto-generated), then the source's default language, then every
/// listed track. A track appears at most once.
pub(crate) fn attempt_order<'a>(tracks: &'a [CaptionTrack], langs: &[String]) -> Vec<&'a CaptionTrack> {
    let (manual, generated): (Vec<usize>, Vec<usize>) =
        (0..tracks.len()).partition(|&i| !tracks[i].is_generated());

    let mut order: Vec<usize> = Vec::with_capacity(tracks.len());
    let mut push = |i: usize| {
        if !order.contains(&i) {
            order.push(i);
        }
    };

    let candidates = langs
        .iter()
        .map(String::as_str)
        .chain(SOURCE_DEFAULT_LANGUAGES.iter().copied());
    for lang in candidates {
        for pool in [&manual, &generated] {
            if let Some(&i) = pool.iter().find(|&&i| tracks[i].language_code == lang) {
                push(i);
            }
        }
    }
    for &i in manual.iter().chain(generated.iter()) {
        push(i);
    }

    order.into_iter().map(|i| &tracks[i]).collect()
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#)?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    bail!("could not extract InnerTube API key from watch page");
}

/// Parse a timed-text caption document into segments.
///
/// Each `<text start="..">` element becomes one segment. Entities are
/// unescaped twice (YouTube double-encodes them), newlines collapse to
/// spaces, and empty cues are dropped. A missing `start` reads as zero.
pub fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current: Option<(f64, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let start = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == b"start")
                    .and_then(|attr| String::from_utf8_lossy(&attr.value).parse::<f64>().ok())
                    .unwrap_or(0.0);
                current = Some((start, String::new()));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                if let Some((start, raw)) = current.take() {
                    let text = clean_caption_text(&html_escape::decode_html_entities(&raw));
                    if !text.is_empty() {
                        segments.push(Segment { text, start });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(segments)
}
