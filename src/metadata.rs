//! Video metadata records and the ordered playlist entry mapping.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Metadata of one video. Identity is the video id alone: two records with the same id are the
/// same entity even when their titles or durations differ.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub id: String,
    pub duration: Duration,
    title: String,
    locale_titles: BTreeMap<String, String>,
    pub missing: bool,
}

impl VideoInfo {
    pub fn new(id: impl Into<String>, duration: Duration, title: impl Into<String>, locale_titles: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            duration,
            title: title.into(),
            locale_titles,
            missing: false,
        }
    }

    /// Placeholder for a video whose metadata could not be resolved. The id doubles as title.
    pub fn missing(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            duration: Duration::ZERO,
            locale_titles: BTreeMap::new(),
            missing: true,
        }
    }

    /// Localized title. Falls back to the default title unless the exact locale code is registered.
    pub fn title(&self, locale: Option<&str>) -> &str {
        locale.and_then(|l| self.locale_titles.get(l)).map(String::as_str).unwrap_or(&self.title)
    }

    pub fn default_title(&self) -> &str {
        &self.title
    }

    pub fn locale_titles(&self) -> &BTreeMap<String, String> {
        &self.locale_titles
    }

    /// Field-wise comparison, unlike `==` which only compares ids.
    pub fn same_fields(&self, other: &VideoInfo) -> bool {
        self.id == other.id
            && self.duration == other.duration
            && self.title == other.title
            && self.locale_titles == other.locale_titles
            && self.missing == other.missing
    }
}

impl PartialEq for VideoInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VideoInfo {}

impl Hash for VideoInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for VideoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing {
            write!(f, "{} (missing)", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.title)
        }
    }
}

/// Ordered mapping from video to its raw file, in merge order. One entry per distinct id.
#[derive(Debug, Default, Clone)]
pub struct PlaylistEntries {
    entries: Vec<(VideoInfo, Option<PathBuf>)>,
    index: HashMap<String, usize>,
}

impl PlaylistEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a video with no file yet. An existing entry with the same id is replaced in place.
    pub fn insert(&mut self, info: VideoInfo) {
        match self.index.get(&info.id) {
            Some(&i) => self.entries[i].0 = info,
            None => {
                self.index.insert(info.id.clone(), self.entries.len());
                self.entries.push((info, None));
            }
        }
    }

    pub fn set_path(&mut self, id: &str, path: PathBuf) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                self.entries[i].1 = Some(path);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<(&VideoInfo, Option<&Path>)> {
        self.index.get(id).map(|&i| {
            let (info, path) = &self.entries[i];
            (info, path.as_deref())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VideoInfo, Option<&Path>)> {
        self.entries.iter().map(|(info, path)| (info, path.as_deref()))
    }

    pub fn videos(&self) -> impl Iterator<Item = &VideoInfo> {
        self.entries.iter().map(|(info, _)| info)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(VideoInfo, Option<PathBuf>)> for PlaylistEntries {
    fn from_iter<I: IntoIterator<Item = (VideoInfo, Option<PathBuf>)>>(iter: I) -> Self {
        let mut rv = Self::new();
        for (info, path) in iter {
            let id = info.id.clone();
            rv.insert(info);
            if let Some(path) = path {
                rv.set_path(&id, path);
            }
        }
        rv
    }
}
