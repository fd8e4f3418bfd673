//! Remote lookups against the YouTube Data API v3.
//!
//! The reconciliation engine only sees the [`MetadataSource`] and [`PlaylistSource`] traits, so
//! the HTTP client can be swapped for fakes in tests.

use std::collections::BTreeMap;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{Result, YtplExpectedError};
use crate::metadata::VideoInfo;

const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const PLAYLIST_ITEMS_URL: &str = "https://youtube.googleapis.com/youtube/v3/playlistItems";
const PAGE_SIZE: u32 = 50;

static ISO8601_DURATION_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_iso8601_duration_regex() -> &'static Regex {
    ISO8601_DURATION_REGEX
        .get_or_init(|| Regex::new(r"^P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$").unwrap())
}

pub trait MetadataSource {
    fn video_info(&self, id: &str) -> Result<VideoInfo>;
}

pub trait PlaylistSource {
    /// Lazily list the video ids of a playlist, following pagination until exhausted.
    fn playlist_ids<'a>(&'a self, playlist_id: &str) -> Box<dyn Iterator<Item = Result<String>> + 'a>;
}

/// Parse the ISO-8601 durations YouTube reports, e.g. `PT1H2M3S` or `P1DT4M`.
pub fn parse_iso8601_duration(value: &str) -> Result<Duration> {
    let invalid = || YtplExpectedError::InvalidDuration { value: value.to_string() };
    let captures = get_iso8601_duration_regex().captures(value).ok_or_else(invalid)?;
    // "P" and "PT" alone carry no designator.
    if value.ends_with('P') || value.ends_with('T') {
        return Err(invalid().into());
    }

    let int = |i: usize| -> Result<u64> {
        match captures.get(i) {
            Some(m) => m.as_str().parse::<u64>().map_err(|_| invalid().into()),
            None => Ok(0),
        }
    };
    let weeks = int(1)?;
    let days = int(2)?;
    let hours = int(3)?;
    let minutes = int(4)?;
    let seconds: f64 = match captures.get(5) {
        Some(m) => m.as_str().parse().map_err(|_| invalid())?,
        None => 0.0,
    };

    let whole = weeks
        .checked_mul(7)
        .and_then(|d| d.checked_add(days))
        .and_then(|d| d.checked_mul(24))
        .and_then(|h| h.checked_add(hours))
        .and_then(|h| h.checked_mul(3600))
        .and_then(|s| s.checked_add(minutes.checked_mul(60)?))
        .ok_or_else(invalid)?;
    let fraction = Duration::try_from_secs_f64(seconds).map_err(|_| invalid())?;
    Ok(Duration::from_secs(whole).checked_add(fraction).ok_or_else(invalid)?)
}

/// Build a record from one item of a `videos` response.
pub fn parse_video_item(id: &str, item: &Value) -> Result<VideoInfo> {
    let malformed = |message: &str| YtplExpectedError::MalformedResponse {
        id: id.to_string(),
        message: message.to_string(),
    };
    let duration = item
        .pointer("/contentDetails/duration")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing contentDetails.duration"))?;
    let duration = parse_iso8601_duration(duration)?;
    let title = item
        .pointer("/snippet/title")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing snippet.title"))?;

    let mut locale_titles = BTreeMap::new();
    if let Some(localizations) = item.get("localizations").and_then(Value::as_object) {
        for (locale, info) in localizations {
            let Some(localized) = info.get("title").and_then(Value::as_str) else {
                warn!("Localization {} of {} has no title", locale, id);
                continue;
            };
            let code: String = locale.chars().take(2).collect();
            locale_titles.insert(code, localized.to_string());
        }
    }

    Ok(VideoInfo::new(id, duration, title, locale_titles))
}

/// Extract the record for `id` from a full `videos` response body.
pub fn parse_videos_response(id: &str, data: &Value) -> Result<VideoInfo> {
    let item = data
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .ok_or_else(|| YtplExpectedError::VideoNotFound { id: id.to_string() })?;
    parse_video_item(id, item)
}

/// One page of a `playlistItems` response: the ids and the continuation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistPage {
    pub ids: Vec<String>,
    pub next_page_token: Option<String>,
}

pub fn parse_playlist_page(playlist_id: &str, data: &Value) -> Result<PlaylistPage> {
    let items = data.get("items").and_then(Value::as_array).ok_or_else(|| YtplExpectedError::MalformedResponse {
        id: playlist_id.to_string(),
        message: "missing items".to_string(),
    })?;
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match item.pointer("/contentDetails/videoId").and_then(Value::as_str) {
            Some(vid) => {
                debug!("Found playlist item: {}", vid);
                ids.push(vid.to_string());
            }
            None => warn!("Playlist {} has an item without videoId", playlist_id),
        }
    }
    let next_page_token = data.get("nextPageToken").and_then(Value::as_str).map(str::to_string);
    Ok(PlaylistPage { ids, next_page_token })
}

/// Blocking HTTP client for the YouTube Data API.
pub struct YoutubeClient {
    http_client: ureq::Agent,
    api_key: Option<String>,
}

impl YoutubeClient {
    pub fn new(api_key: Option<String>) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(30))
            .build();
        Self { http_client, api_key }
    }

    /// Use `api_key` if given, else the `YOUTUBE_API_KEY` environment variable.
    pub fn from_env(api_key: Option<String>) -> Self {
        let api_key = api_key.or_else(|| env::var("YOUTUBE_API_KEY").ok());
        if api_key.is_none() {
            warn!("YOUTUBE_API_KEY is not set");
        }
        Self::new(api_key)
    }

    fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut request = self.http_client.get(url);
        if let Some(key) = &self.api_key {
            request = request.query("key", key);
        }
        for (name, value) in params {
            request = request.query(name, value);
        }
        let response = request.call()?;
        debug!("Got response for {}", response.get_url());
        let value: Value = response.into_json()?;
        Ok(value)
    }

    pub fn fetch_playlist_page(&self, playlist_id: &str, page_token: Option<&str>) -> Result<PlaylistPage> {
        let page_size = PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        let data = self.get_json(PLAYLIST_ITEMS_URL, &params).map_err(|e| {
            error!("Failed to list playlist {}: {}", playlist_id, e);
            e
        })?;
        parse_playlist_page(playlist_id, &data)
    }
}

impl MetadataSource for YoutubeClient {
    fn video_info(&self, id: &str) -> Result<VideoInfo> {
        debug!("Youtube request for info: {}", id);
        let data = self.get_json(
            VIDEOS_URL,
            &[("part", "contentDetails,id,localizations,snippet"), ("maxResults", "1"), ("id", id)],
        )?;
        parse_videos_response(id, &data)
    }
}

impl PlaylistSource for YoutubeClient {
    fn playlist_ids<'a>(&'a self, playlist_id: &str) -> Box<dyn Iterator<Item = Result<String>> + 'a> {
        debug!("Getting YouTube playlist: {}", playlist_id);
        Box::new(PlaylistIds {
            client: self,
            playlist_id: playlist_id.to_string(),
            buffer: Vec::new().into_iter(),
            next_page_token: None,
            done: false,
        })
    }
}

/// Iterator over the pages of one playlist. Pages are fetched on demand.
struct PlaylistIds<'a> {
    client: &'a YoutubeClient,
    playlist_id: String,
    buffer: std::vec::IntoIter<String>,
    next_page_token: Option<String>,
    done: bool,
}

impl Iterator for PlaylistIds<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.buffer.next() {
                return Some(Ok(id));
            }
            if self.done {
                return None;
            }
            match self.client.fetch_playlist_page(&self.playlist_id, self.next_page_token.as_deref()) {
                Ok(page) => {
                    self.done = page.next_page_token.is_none();
                    self.next_page_token = page.next_page_token;
                    self.buffer = page.ids.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
