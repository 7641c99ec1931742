use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::assemble::{NOMINAL_SEGMENT_DURATION, PARAGRAPH_GAP_THRESHOLD, ParagraphSettings};
use crate::pipeline::Mode;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_lang: Option<String>,
    pub default_model: Option<String>,
    pub default_mode: Option<Mode>,
    /// Link timestamps to the video (default true)
    pub hyperlink: Option<bool>,
    pub max_description_length: Option<usize>,
    pub paragraph_nominal_duration: Option<f64>,
    pub paragraph_gap_threshold: Option<f64>,
    pub request_timeout_secs: Option<u64>,
    pub tool_timeout_secs: Option<u64>,
    /// Path or name of the yt-dlp executable
    pub ytdlp_path: Option<String>,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn paragraph_settings(&self) -> ParagraphSettings {
        ParagraphSettings {
            nominal_duration: self.paragraph_nominal_duration.unwrap_or(NOMINAL_SEGMENT_DURATION),
            gap_threshold: self.paragraph_gap_threshold.unwrap_or(PARAGRAPH_GAP_THRESHOLD),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs.unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS))
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}
