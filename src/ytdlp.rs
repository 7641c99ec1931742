use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail, eyre};
use log::debug;
use serde::Deserialize;

use crate::transcript::SegmentSource;
use crate::{LanguagePreference, Segment, TranscriptSource, VideoId, clean_caption_text};

pub const DEFAULT_BINARY: &str = "yt-dlp";

/// Language always requested alongside the preferred one
const FALLBACK_SUB_LANG: &str = "en";

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    t_start_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Subtitle download through yt-dlp, without fetching any media
pub struct YtDlpSource {
    binary: String,
    timeout: Duration,
}

impl YtDlpSource {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    async fn download(&self, video_id: &VideoId, lang: &LanguagePreference) -> Result<Vec<Segment>> {
        let tmpdir = tempfile::tempdir()?;
        let template = tmpdir.path().join("%(id)s");
        let langs = subtitle_langs(lang);
        let args = build_args(video_id, &langs, &template);
        debug!("Running {} {}", self.binary, args.join(" "));

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(&args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!("{} not found in PATH", self.binary)
            }
            Ok(Err(e)) => bail!("failed to run {}: {e}", self.binary),
            Err(_) => bail!("{} timed out after {:?}", self.binary, self.timeout),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with status {}: {}", self.binary, output.status, stderr.trim());
        }

        let path = pick_subtitle_file(tmpdir.path(), &langs)?
            .ok_or_else(|| eyre!("{} produced no json3 subtitles for {video_id}", self.binary))?;
        debug!("Reading subtitles from {}", path.display());

        let data = tokio::fs::read_to_string(&path).await?;
        parse_json3(&data)
    }
}

#[async_trait]
impl SegmentSource for YtDlpSource {
    fn kind(&self) -> TranscriptSource {
        TranscriptSource::ExternalTool
    }

    async fn fetch(&self, video_id: &VideoId, lang: &LanguagePreference) -> Option<Vec<Segment>> {
        match self.download(video_id, lang).await {
            Ok(segments) if !segments.is_empty() => Some(segments),
            Ok(_) => {
                debug!("{} subtitles for {video_id} were empty", self.binary);
                None
            }
            Err(e) => {
                debug!("{} subtitle download failed for {video_id}: {e}", self.binary);
                None
            }
        }
    }
}

/// Preferred language (unless auto) followed by English
fn subtitle_langs(lang: &LanguagePreference) -> Vec<String> {
    let mut langs = Vec::with_capacity(2);
    if let Some(code) = lang.code() {
        langs.push(code.to_string());
    }
    if !langs.iter().any(|l| l == FALLBACK_SUB_LANG) {
        langs.push(FALLBACK_SUB_LANG.to_string());
    }
    langs
}

fn build_args(video_id: &VideoId, langs: &[String], template: &Path) -> Vec<String> {
    vec![
        "--skip-download".to_string(),
        "--write-subs".to_string(),
        "--write-auto-subs".to_string(),
        "--sub-langs".to_string(),
        langs.join(","),
        "--sub-format".to_string(),
        "json3".to_string(),
        "--no-playlist".to_string(),
        "--quiet".to_string(),
        "--no-warnings".to_string(),
        "-o".to_string(),
        template.to_string_lossy().to_string(),
        video_id.watch_url(),
    ]
}

/// First `.json3` file in `dir`, preferring the requested languages in order
fn pick_subtitle_file(dir: &Path, langs: &[String]) -> Result<Option<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json3"))
        .collect();
    files.sort();

    let preferred = langs.iter().find_map(|lang| {
        let suffix = format!(".{lang}.json3");
        files
            .iter()
            .find(|p| p.to_string_lossy().ends_with(&suffix))
            .cloned()
    });

    Ok(preferred.or_else(|| files.into_iter().next()))
}

/// Parse a json3 subtitle document: one segment per event, text pieces
/// concatenated, start converted from milliseconds.
fn parse_json3(data: &str) -> Result<Vec<Segment>> {
    let doc: Json3Document = serde_json::from_str(data)?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = clean_caption_text(&raw);
            if text.is_empty() {
                return None;
            }
            Some(Segment {
                text,
                start: event.t_start_ms as f64 / 1000.0,
            })
        })
        .collect())
}
