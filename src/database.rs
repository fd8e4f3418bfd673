//! The local database is a JSON array of video records kept between runs:
//!
//! ```json
//! [{"id": "...", "duration": 125, "title": "...", "locale": {"en": "..."}}]
//! ```
//!
//! Records are keyed by id. Placeholders for unresolved videos are never stored.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, YtplExpectedError};
use crate::metadata::{PlaylistEntries, VideoInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbRecord {
    pub id: String,
    #[serde(alias = "duration_seconds")]
    pub duration: u64,
    pub title: String,
    #[serde(default)]
    pub locale: BTreeMap<String, String>,
}

impl From<&VideoInfo> for DbRecord {
    fn from(info: &VideoInfo) -> Self {
        DbRecord {
            id: info.id.clone(),
            duration: info.duration.as_secs(),
            title: info.default_title().to_string(),
            locale: info.locale_titles().clone(),
        }
    }
}

impl From<DbRecord> for VideoInfo {
    fn from(record: DbRecord) -> Self {
        VideoInfo::new(record.id, Duration::from_secs(record.duration), record.title, record.locale)
    }
}

/// Ordered collection of records with an explicit id index.
#[derive(Debug, Default, Clone)]
pub struct LocalDb {
    records: Vec<VideoInfo>,
    index: HashMap<String, usize>,
}

impl LocalDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&VideoInfo> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Append a record unless its id is already known. Returns whether it was added.
    pub fn insert(&mut self, info: VideoInfo) -> bool {
        if self.index.contains_key(&info.id) {
            return false;
        }
        self.index.insert(info.id.clone(), self.records.len());
        self.records.push(info);
        true
    }

    /// Replace the record with the same id at its position, or append it.
    pub fn upsert(&mut self, info: VideoInfo) {
        match self.index.get(&info.id) {
            Some(&i) => self.records[i] = info,
            None => {
                self.insert(info);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoInfo> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fold the resolved videos of a run into the database. Unseen videos are appended; known
    /// ones are replaced only when `update_existing` is set. Placeholders are skipped.
    pub fn merge_entries(&mut self, entries: &PlaylistEntries, update_existing: bool) -> MergeStats {
        let mut stats = MergeStats::default();
        for info in entries.videos() {
            if info.missing {
                continue;
            }
            if !self.contains(&info.id) {
                debug!("Adding {} to database", info);
                self.insert(info.clone());
                stats.added += 1;
            } else if update_existing {
                debug!("Updating {} in database", info);
                self.upsert(info.clone());
                stats.updated += 1;
            }
        }
        stats
    }

    pub fn from_records(records: Vec<DbRecord>) -> Self {
        let mut db = LocalDb::new();
        for record in records {
            let id = record.id.clone();
            if !db.insert(record.into()) {
                warn!("Duplicate database record for {}, keeping the first one", id);
            }
        }
        db
    }

    pub fn to_records(&self) -> Vec<DbRecord> {
        self.records.iter().map(DbRecord::from).collect()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
}

pub fn parse_db(path: &Path, contents: &str) -> Result<LocalDb> {
    let records: Vec<DbRecord> = serde_json::from_str(contents).map_err(|e| YtplExpectedError::MalformedDatabase {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(LocalDb::from_records(records))
}

pub fn read_db(path: &Path) -> Result<LocalDb> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => YtplExpectedError::FileNotFound { path: path.to_path_buf() }.into(),
        _ => crate::error::YtplError::from(e),
    })?;
    parse_db(path, &contents)
}

pub fn dump_db(db: &LocalDb) -> Result<String> {
    let mut json = serde_json::to_string_pretty(&db.to_records())?;
    json.push('\n');
    Ok(json)
}

pub fn write_db(path: &Path, db: &LocalDb) -> Result<()> {
    let json = dump_db(db)?;
    fs::write(path, json)?;
    Ok(())
}
