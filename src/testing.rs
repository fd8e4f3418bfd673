use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use tempfile::TempDir;

use crate::error::{Result, YtplExpectedError};
use crate::locator::MediaFetcher;
use crate::metadata::VideoInfo;
use crate::youtube::{MetadataSource, PlaylistSource};

static INIT: Once = Once::new();

pub fn init() -> TempDir {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")))
            .with_test_writer()
            .try_init();
    });
    TempDir::new().expect("failed to create temp dir")
}

pub fn video(id: &str, secs: u64, title: &str) -> VideoInfo {
    VideoInfo::new(id, Duration::from_secs(secs), title, BTreeMap::new())
}

pub fn video_with_locales(id: &str, secs: u64, title: &str, locales: &[(&str, &str)]) -> VideoInfo {
    let locale_titles = locales.iter().map(|(l, t)| (l.to_string(), t.to_string())).collect();
    VideoInfo::new(id, Duration::from_secs(secs), title, locale_titles)
}

/// Metadata source backed by a map. Counts lookups so tests can assert on remote traffic.
#[derive(Default)]
pub struct FakeMetadata {
    pub videos: HashMap<String, VideoInfo>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeMetadata {
    pub fn with(videos: impl IntoIterator<Item = VideoInfo>) -> Self {
        Self {
            videos: videos.into_iter().map(|v| (v.id.clone(), v)).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl MetadataSource for FakeMetadata {
    fn video_info(&self, id: &str) -> Result<VideoInfo> {
        self.calls.borrow_mut().push(id.to_string());
        self.videos.get(id).cloned().ok_or_else(|| YtplExpectedError::VideoNotFound { id: id.to_string() }.into())
    }
}

#[derive(Default)]
pub struct FakePlaylists {
    pub playlists: HashMap<String, Vec<String>>,
}

impl PlaylistSource for FakePlaylists {
    fn playlist_ids<'a>(&'a self, playlist_id: &str) -> Box<dyn Iterator<Item = Result<String>> + 'a> {
        let ids = self.playlists.get(playlist_id).cloned().unwrap_or_default();
        Box::new(ids.into_iter().map(Ok))
    }
}

/// Writes `<id>.<ext>` (plus any extra files) into the staging directory instead of downloading.
#[derive(Default)]
pub struct FakeFetcher {
    pub ext: String,
    pub extra_files: Vec<String>,
    pub fail: Vec<String>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new(ext: &str) -> Self {
        Self { ext: ext.to_string(), ..Default::default() }
    }
}

impl MediaFetcher for FakeFetcher {
    fn fetch(&self, id: &str, staging_dir: &Path, _extra_args: &[String], _audio_only: bool) -> Result<()> {
        self.calls.borrow_mut().push(id.to_string());
        if self.fail.iter().any(|f| f == id) {
            return Err(YtplExpectedError::DownloadFailed { id: id.to_string(), status: "exit status: 1".to_string() }.into());
        }
        if !self.ext.is_empty() {
            fs::write(staging_dir.join(format!("{id}.{}", self.ext)), id)?;
        }
        for extra in &self.extra_files {
            fs::write(staging_dir.join(extra.replace("{id}", id)), "")?;
        }
        Ok(())
    }
}
