//! Directories of human-readable symlinks pointing at raw files.
//!
//! Each directory holds one link per video, named after the (optionally localized) title plus the
//! raw file's extension. Syncing is idempotent: a second run with the same inputs touches nothing.
//! Links are only removed when they point at a raw file of the current run under a stale name, or
//! when they occupy a name that a current video needs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info_span, warn};

use crate::common::{id_from_path, is_symlink, listdir_abs, make_symlink, relative_path, sanitize_name, truncate_bytes, MAX_FILENAME_BYTES};
use crate::error::Result;
use crate::metadata::{PlaylistEntries, VideoInfo};

/// Counts of what a sync did to the directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub kept: usize,
    pub created: usize,
    pub removed: usize,
    pub unresolved: usize,
}

impl SyncReport {
    pub fn mutations(&self) -> usize {
        self.created + self.removed
    }
}

/// Extension of a raw file, i.e. everything after `<id>.`.
pub fn raw_extension(info: &VideoInfo, raw_path: &Path) -> String {
    let name = raw_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    match name.strip_prefix(&format!("{}.", info.id)) {
        Some(ext) => ext.to_string(),
        None => raw_path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default(),
    }
}

/// `<stem><suffix>.<ext>` with the stem cut so the whole name stays within
/// [`MAX_FILENAME_BYTES`]. The cut is deterministic, so reruns plan the same name.
fn link_name(title: &str, suffix: &str, ext: &str) -> String {
    let budget = MAX_FILENAME_BYTES.saturating_sub(suffix.len() + ext.len() + 1);
    format!("{}{suffix}.{ext}", truncate_bytes(&sanitize_name(title), budget))
}

/// The link name for a video: sanitized title plus the raw file's extension.
pub fn pretty_name(info: &VideoInfo, raw_path: &Path, locale: Option<&str>) -> String {
    link_name(info.title(locale), "", &raw_extension(info, raw_path))
}

fn disambiguated_name(info: &VideoInfo, raw_path: &Path, locale: Option<&str>, attempt: usize) -> String {
    let suffix = match attempt {
        0 => format!(" [{}]", info.id),
        n => format!(" [{}] ({})", info.id, n + 1),
    };
    link_name(info.title(locale), &suffix, &raw_extension(info, raw_path))
}

/// Compute the link name of every resolved entry. When names collide, the first video keeps the
/// plain name and later ones get their id appended, plus a counter if that is taken as well.
pub fn plan_names(entries: &PlaylistEntries, locale: Option<&str>) -> Vec<(String, PathBuf, String)> {
    let mut claimed: HashMap<String, String> = HashMap::new();
    let mut plan = Vec::new();
    for (info, raw_path) in entries.iter() {
        let Some(raw_path) = raw_path else {
            continue;
        };
        let taken = |name: &String, claimed: &HashMap<String, String>| claimed.get(name).is_some_and(|owner| owner != &info.id);
        let plain = pretty_name(info, raw_path, locale);
        let mut name = plain.clone();
        let mut attempt = 0;
        while taken(&name, &claimed) {
            name = disambiguated_name(info, raw_path, locale, attempt);
            attempt += 1;
        }
        if name != plain {
            warn!("Title collision on {}, using {} for {}", plain, name, info.id);
        }
        claimed.insert(name.clone(), info.id.clone());
        plan.push((info.id.clone(), raw_path.to_path_buf(), name));
    }
    plan
}

/// Log entries of `dir` that do not look like links made by us. Nothing is deleted here.
pub fn audit_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut suspect = Vec::new();
    for file in listdir_abs(dir)? {
        if !is_symlink(&file) || id_from_path(&file).is_none() {
            warn!("Found non valid file: {}", file.display());
            suspect.push(file);
        } else if !file.exists() {
            warn!("Found dead symlink: {}", file.display());
            suspect.push(file);
        }
    }
    Ok(suspect)
}

/// Symlinks in `dir` that resolve to `canonical_target`.
fn find_links_to(dir: &Path, canonical_target: &Path) -> Result<Vec<PathBuf>> {
    let mut links = Vec::new();
    for file in listdir_abs(dir)? {
        if is_symlink(&file) && file.is_file() && fs::canonicalize(&file).map(|p| p == canonical_target).unwrap_or(false) {
            links.push(file);
        }
    }
    Ok(links)
}

/// Bring the links in `dir` in line with `entries` for the given locale.
pub fn sync(dir: &Path, entries: &PlaylistEntries, locale: Option<&str>) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    if !dir.is_dir() {
        debug!("Creating directory {}", dir.display());
        fs::create_dir_all(dir)?;
    }

    audit_dir(dir)?;
    let canonical_dir = fs::canonicalize(dir)?;

    for (info, raw_path) in entries.iter() {
        if raw_path.is_none() {
            error!("Video not found: {}", info);
            report.unresolved += 1;
        }
    }

    for (id, raw_path, name) in plan_names(entries, locale) {
        let _span = info_span!("link", id = %id).entered();
        let canonical_raw = match fs::canonicalize(&raw_path) {
            Ok(p) => p,
            Err(e) => {
                error!("Raw file of {} is not accessible: {}: {}", id, raw_path.display(), e);
                report.unresolved += 1;
                continue;
            }
        };

        let mut found = 0;
        for link in find_links_to(dir, &canonical_raw)? {
            if link.file_name().map(|n| n.to_string_lossy() == name.as_str()).unwrap_or(false) {
                debug!("Found video: {} = {}", id, link.display());
                found += 1;
            } else {
                debug!("Removing invalid link: {}", link.display());
                fs::remove_file(&link)?;
                report.removed += 1;
            }
        }

        if found > 0 {
            report.kept += 1;
            continue;
        }

        let link = dir.join(&name);
        match fs::symlink_metadata(&link) {
            Ok(meta) if !meta.file_type().is_symlink() => {
                error!("Cannot create link {}: a non-link entry is in the way", link.display());
                continue;
            }
            Ok(_) => {
                debug!("Removing invalid link: {}", link.display());
                fs::remove_file(&link)?;
                report.removed += 1;
            }
            Err(_) => {}
        }
        let target = relative_path(&canonical_raw, &canonical_dir)?;
        debug!("Creating link: {} -> {}", link.display(), target.display());
        if let Err(e) = make_symlink(&target, &link) {
            error!("Failed to create link {}: {}", link.display(), e);
            report.unresolved += 1;
            continue;
        }
        report.created += 1;
    }

    Ok(report)
}
