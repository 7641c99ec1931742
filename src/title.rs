use std::sync::LazyLock;
use std::time::Duration;

use eyre::{Result, bail};
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::VideoId;
use crate::youtube::fetch_watch_page;

const OEMBED_TIMEOUT: Duration = Duration::from_secs(5);
const TITLE_SUFFIX: &str = " - YouTube";

static OG_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+(?:property|name)="og:title"\s+content="([^"]*)""#).expect("og:title pattern is valid")
});

static TITLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is valid"));

#[derive(Deserialize)]
struct OEmbed {
    title: Option<String>,
}

/// Best-effort human readable title; never fails
pub async fn fetch_title(client: &reqwest::Client, video_id: &VideoId) -> String {
    match oembed_title(client, video_id).await {
        Ok(title) => return title,
        Err(e) => debug!("oEmbed title lookup failed for {video_id}: {e}"),
    }

    match fetch_watch_page(client, video_id).await {
        Ok(html) => {
            if let Some(title) = extract_page_title(&html) {
                return title;
            }
            debug!("No title found in watch page for {video_id}");
        }
        Err(e) => debug!("Watch page title lookup failed for {video_id}: {e}"),
    }

    placeholder_title(video_id)
}

async fn oembed_title(client: &reqwest::Client, video_id: &VideoId) -> Result<String> {
    let resp = client
        .get("https://www.youtube.com/oembed")
        .query(&[("url", video_id.watch_url().as_str()), ("format", "json")])
        .timeout(OEMBED_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;

    let oembed: OEmbed = resp.json().await?;
    match oembed.title.map(|t| t.trim().to_string()) {
        Some(title) if !title.is_empty() => Ok(title),
        _ => bail!("oEmbed response has no title"),
    }
}

/// `og:title` meta content, else `<title>` without the site suffix
pub(crate) fn extract_page_title(html: &str) -> Option<String> {
    let og = OG_TITLE_RE.captures(html).map(|caps| caps[1].to_string());
    let tag = || {
        TITLE_TAG_RE.captures(html).and_then(|caps| {
            let title = caps[1].trim();
            title.contains(TITLE_SUFFIX).then(|| title.split(TITLE_SUFFIX).next().unwrap_or(title).to_string())
        })
    };

    og.filter(|t| !t.trim().is_empty())
        .or_else(tag)
        .map(|t| html_escape::decode_html_entities(t.trim()).to_string())
        .filter(|t| !t.is_empty())
}

pub fn placeholder_title(video_id: &VideoId) -> String {
    format!("YouTube Video ({video_id})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_og_title_preferred() {
        let html = r#"<html><head><title>Other - YouTube</title>
<meta property="og:title" content="Rust &amp; Tokio in 100 Seconds"></head></html>"#;
        assert_eq!(extract_page_title(html).unwrap(), "Rust & Tokio in 100 Seconds");
    }

    #[test]
    fn test_title_tag_suffix_removed() {
        let html = "<html><head><title>  Learning Rust - YouTube</title></head></html>";
        assert_eq!(extract_page_title(html).unwrap(), "Learning Rust");
    }

    #[test]
    fn test_title_tag_without_suffix_ignored() {
        assert!(extract_page_title("<title>YouTube</title>").is_none());
        assert!(extract_page_title("<html></html>").is_none());
    }

    #[test]
    fn test_placeholder_title() {
        let id = VideoId::resolve("dQw4w9WgXcQ").unwrap();
        assert_eq!(placeholder_title(&id), "YouTube Video (dQw4w9WgXcQ)");
    }
}
