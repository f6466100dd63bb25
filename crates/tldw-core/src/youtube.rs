//! YouTube watch-page scraping and caption download.

use std::{
    sync::{Arc, LazyLock, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    error::{Result, TldwError},
    source::{MetadataSource, TranscriptSource},
    types::{TranscriptEntry, VideoMetadata},
};

const TITLE_FALLBACK: &str = "Title not found";
const CHANNEL_FALLBACK: &str = "Channel name not found";

static DESCRIPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"shortDescription":"(.*?)","isCrawlable"#).expect("description pattern is valid")
});

static VIDEO_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern is valid"));

/// Extract the 11-character video id from a URL or a bare id.
pub fn video_id_from_url(input: &str) -> Result<String> {
    let input = input.trim();
    let invalid = || TldwError::InvalidUrl {
        input: input.to_string(),
    };

    if VIDEO_ID_PATTERN.is_match(input) {
        return Ok(input.to_string());
    }

    let url = Url::parse(input).map_err(|_| invalid())?;
    let host = url.host_str().unwrap_or_default().trim_start_matches("www.");
    let mut segments = url.path_segments().into_iter().flatten();

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("shorts" | "embed" | "live") => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    };

    candidate
        .filter(|id| VIDEO_ID_PATTERN.is_match(id))
        .ok_or_else(invalid)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Pull title, channel and description out of a watch page.
///
/// Title and channel fall back to placeholder text; a missing description
/// anchor means the page is not what we expected and is an error.
pub fn parse_watch_page(html: &str) -> std::result::Result<VideoMetadata, String> {
    let document = Html::parse_document(html);

    let title = select_attr(&document, r#"meta[property="og:title"]"#, "content")
        .unwrap_or_else(|| TITLE_FALLBACK.to_string());
    let channel = select_attr(&document, r#"link[itemprop="name"]"#, "content")
        .unwrap_or_else(|| CHANNEL_FALLBACK.to_string());

    let raw_description = DESCRIPTION_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| "description anchors not found in page".to_string())?
        .as_str();

    Ok(VideoMetadata {
        title,
        channel,
        description: decode_json_string(raw_description),
    })
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .find_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn decode_json_string(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", raw))
        .unwrap_or_else(|_| raw.replace("\\n", "\n"))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "languageCode")]
    pub language_code: String,
    /// `Some("asr")` for auto-generated captions.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Read the caption track list embedded in the watch page's player response.
pub fn parse_caption_tracks(html: &str) -> Vec<CaptionTrack> {
    const ANCHOR: &str = "\"captionTracks\":";

    let Some(start) = html.find(ANCHOR) else {
        return Vec::new();
    };
    let rest = &html[start + ANCHOR.len()..];

    serde_json::Deserializer::from_str(rest)
        .into_iter::<Vec<CaptionTrack>>()
        .next()
        .and_then(|parsed| parsed.ok())
        .unwrap_or_default()
}

/// First track matching the language preference, manual captions before
/// auto-generated ones of the same language.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|lang| {
        let mut matching = tracks.iter().filter(|t| &t.language_code == lang);
        let manual = matching.clone().find(|t| !t.is_generated());
        manual.or_else(|| matching.next())
    })
}

#[derive(Deserialize)]
struct Json3Body {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Map a `fmt=json3` caption body to transcript entries, skipping events
/// that carry no text (window/style events and bare line breaks).
pub fn parse_json3(body: &str) -> std::result::Result<Vec<TranscriptEntry>, serde_json::Error> {
    let body: Json3Body = serde_json::from_str(body)?;

    Ok(body
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptEntry {
                start: event.start_ms as f64 / 1000.0,
                duration: event.duration_ms as f64 / 1000.0,
                text: text.to_string(),
            })
        })
        .collect())
}

/// HTTP client for YouTube pages and caption tracks.
///
/// Clones share the last fetched watch page, so metadata and captions for
/// one video cost a single page request.
#[derive(Clone)]
pub struct YoutubeClient {
    client: reqwest::Client,
    last_page: Arc<Mutex<Option<(String, Arc<str>)>>>,
}

impl YoutubeClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0")
            .build()?;
        Ok(Self {
            client,
            last_page: Arc::default(),
        })
    }

    fn remembered_page(&self, video_id: &str) -> Option<Arc<str>> {
        let last_page = self.last_page.lock().ok()?;
        last_page
            .as_ref()
            .filter(|(id, _)| id == video_id)
            .map(|(_, page)| Arc::clone(page))
    }

    fn remember_page(&self, video_id: &str, page: Arc<str>) {
        if let Ok(mut last_page) = self.last_page.lock() {
            *last_page = Some((video_id.to_string(), page));
        }
    }

    async fn watch_page(&self, video_id: &str) -> std::result::Result<Arc<str>, reqwest::Error> {
        if let Some(page) = self.remembered_page(video_id) {
            debug!(video_id, "reusing fetched watch page");
            return Ok(page);
        }

        let page: Arc<str> = self.get_text(&watch_url(video_id)).await?.into();
        self.remember_page(video_id, Arc::clone(&page));
        Ok(page)
    }

    async fn get_text(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        self.client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    async fn download_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> std::result::Result<Vec<TranscriptEntry>, String> {
        let html = self
            .watch_page(video_id)
            .await
            .map_err(|e| e.to_string())?;

        let tracks = parse_caption_tracks(&html);
        if tracks.is_empty() {
            return Err("captions are disabled for this video".to_string());
        }

        let track = select_track(&tracks, languages).ok_or_else(|| {
            let available: Vec<_> = tracks.iter().map(|t| t.language_code.as_str()).collect();
            format!(
                "no captions in {} (available: {})",
                languages.join(", "),
                available.join(", ")
            )
        })?;
        debug!(language = %track.language_code, generated = track.is_generated(), "selected caption track");

        let mut track_url = Url::parse(&track.base_url).map_err(|e| e.to_string())?;
        track_url.query_pairs_mut().append_pair("fmt", "json3");

        let body = self
            .get_text(track_url.as_str())
            .await
            .map_err(|e| e.to_string())?;

        parse_json3(&body).map_err(|e| format!("unreadable caption track: {e}"))
    }
}

#[async_trait]
impl MetadataSource for YoutubeClient {
    async fn fetch_metadata(&self, video_id: &str) -> Result<VideoMetadata> {
        let url = watch_url(video_id);
        let unavailable = |reason: String| TldwError::MetadataUnavailable {
            url: url.clone(),
            reason,
        };

        let html = self
            .watch_page(video_id)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        parse_watch_page(&html).map_err(unavailable)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeClient {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<TranscriptEntry>> {
        self.download_transcript(video_id, languages)
            .await
            .map_err(|reason| TldwError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCH_PAGE: &str = r#"<!DOCTYPE html><html><head>
<meta property="og:title" content="Rust in 100 Seconds">
</head><body>
<span itemprop="author" itemscope><link itemprop="url" href="http://www.youtube.com/@somechannel"><link itemprop="name" content="Some Channel"></span>
<script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en","name":{"runs":[{"text":"English (auto-generated)"}]},"languageCode":"en","kind":"asr"},{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=de","name":{"simpleText":"Deutsch"},"languageCode":"de"}],"audioTracks":[]}},"videoDetails":{"shortDescription":"Chapters:\n00:00 Intro\n01:30 \"Ownership\"","isCrawlable":true}};</script>
</body></html>"#;

    #[test]
    fn scrapes_title_channel_and_description() {
        let metadata = parse_watch_page(WATCH_PAGE).unwrap();

        assert_eq!(metadata.title, "Rust in 100 Seconds");
        assert_eq!(metadata.channel, "Some Channel");
        assert_eq!(metadata.description, "Chapters:\n00:00 Intro\n01:30 \"Ownership\"");
    }

    #[test]
    fn missing_meta_tags_fall_back_but_missing_description_fails() {
        let page = r#"<html><script>{"shortDescription":"hi","isCrawlable":true}</script></html>"#;
        let metadata = parse_watch_page(page).unwrap();
        assert_eq!(metadata.title, TITLE_FALLBACK);
        assert_eq!(metadata.channel, CHANNEL_FALLBACK);
        assert_eq!(metadata.description, "hi");

        assert!(parse_watch_page("<html><body>consent wall</body></html>").is_err());
    }

    #[test]
    fn reads_caption_tracks_and_prefers_language_order() {
        let tracks = parse_caption_tracks(WATCH_PAGE);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].base_url, "https://www.youtube.com/api/timedtext?v=abc&lang=en");
        assert!(tracks[0].is_generated());

        let prefs = vec!["de".to_string(), "en".to_string()];
        assert_eq!(select_track(&tracks, &prefs).unwrap().language_code, "de");

        let prefs = vec!["fr".to_string(), "en".to_string()];
        assert_eq!(select_track(&tracks, &prefs).unwrap().language_code, "en");

        assert!(select_track(&tracks, &["fr".to_string()]).is_none());
        assert!(parse_caption_tracks("<html></html>").is_empty());
    }

    #[test]
    fn manual_track_beats_generated_track() {
        let track = |kind: Option<&str>, url: &str| CaptionTrack {
            base_url: url.to_string(),
            language_code: "en".to_string(),
            kind: kind.map(str::to_string),
        };
        let tracks = vec![track(Some("asr"), "auto"), track(None, "manual")];

        let chosen = select_track(&tracks, &["en".to_string()]).unwrap();
        assert_eq!(chosen.base_url, "manual");
    }

    #[test]
    fn json3_events_become_entries() {
        let body = r#"{"wireMagic":"pb3","events":[
            {"tStartMs":0,"dDurationMs":185000,"id":1,"wWinId":1},
            {"tStartMs":1200,"dDurationMs":2500,"segs":[{"utf8":"hello"},{"utf8":" world"}]},
            {"tStartMs":3700,"segs":[{"utf8":"\n"}]},
            {"tStartMs":4000,"dDurationMs":1500,"segs":[{"utf8":"second\nline"}]}
        ]}"#;

        let entries = parse_json3(body).unwrap();
        assert_eq!(
            entries,
            vec![
                TranscriptEntry { start: 1.2, duration: 2.5, text: "hello world".to_string() },
                TranscriptEntry { start: 4.0, duration: 1.5, text: "second line".to_string() },
            ]
        );
        assert!(parse_json3("not json").is_err());
    }

    #[test]
    fn video_ids_from_common_url_shapes() {
        let id = "dQw4w9WgXcQ";
        for input in [
            "dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=xyz",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
        ] {
            assert_eq!(video_id_from_url(input).unwrap(), id, "{input}");
        }
    }

    #[test]
    fn rejects_non_video_urls() {
        for input in [
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/@somechannel",
            "https://www.youtube.com/watch?v=short",
            "not a url",
        ] {
            assert!(
                matches!(video_id_from_url(input), Err(TldwError::InvalidUrl { .. })),
                "{input}"
            );
        }
    }

    #[test]
    fn clones_share_the_last_watch_page() {
        let client = YoutubeClient::new(Duration::from_secs(5)).unwrap();
        let captions = client.clone();

        client.remember_page("dQw4w9WgXcQ", Arc::from(WATCH_PAGE));

        let page = captions.remembered_page("dQw4w9WgXcQ").unwrap();
        assert_eq!(parse_caption_tracks(&page).len(), 2);
        assert!(captions.remembered_page("aaaaaaaaaaa").is_none());
    }
}
