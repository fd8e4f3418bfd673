//! One reconciliation run: merge playlist ids, resolve metadata, make sure raw files exist,
//! sync the symlink directories, write the playlist and update the database.

use std::fs::File;
use std::io::{BufReader, BufWriter};

use tracing::{debug, error, info, info_span};

use crate::config::Config;
use crate::database::{read_db, write_db, LocalDb};
use crate::error::Result;
use crate::locator::{ensure_downloaded, MediaFetcher};
use crate::merge::try_merge_ids;
use crate::metadata::PlaylistEntries;
use crate::playlist::{read_ids, write_playlist};
use crate::resolver::resolve;
use crate::symlinks;
use crate::youtube::{MetadataSource, PlaylistSource};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub entries: usize,
    pub unresolved_metadata: usize,
    pub failed_downloads: usize,
    pub links_created: usize,
    pub links_removed: usize,
    pub playlist_entries: Option<usize>,
    pub db_added: usize,
    pub db_updated: usize,
}

/// Ids referenced by the current playlist file, unless it is to be overwritten.
fn existing_playlist_ids(config: &Config) -> Result<Vec<String>> {
    let Some(playlist) = &config.playlist else {
        return Ok(Vec::new());
    };
    if playlist.overwrite || !playlist.path.is_file() {
        return Ok(Vec::new());
    }
    info!("Parsing M3U playlist: {}", playlist.path.display());
    let reader = BufReader::new(File::open(&playlist.path)?);
    read_ids(reader, playlist.format.url_encoded())
}

fn load_db(config: &Config) -> Result<Option<LocalDb>> {
    let Some(path) = &config.local_db else {
        return Ok(None);
    };
    if !path.exists() && config.update_db {
        info!("Local database {} does not exist yet, starting empty", path.display());
        return Ok(Some(LocalDb::new()));
    }
    info!("Reading local database: {}", path.display());
    Ok(Some(read_db(path)?))
}

pub fn reconcile(
    config: &Config,
    metadata: &dyn MetadataSource,
    playlists: &dyn PlaylistSource,
    fetcher: &dyn MediaFetcher,
) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let mut local_db = load_db(config)?;

    let existing = existing_playlist_ids(config)?;
    debug!("Initial playlist: {:?}", existing);

    info!("Getting playlist info: {:?}", config.playlist_ids);
    let remote = config.playlist_ids.iter().flat_map(|p| playlists.playlist_ids(p));
    let ids = try_merge_ids(existing, remote)?;
    debug!("Updated playlist: {:?}", ids);

    let mut entries = PlaylistEntries::new();
    for id in &ids {
        let _span = info_span!("item", id = %id).entered();
        let info = resolve(id, local_db.as_ref(), metadata, config.update_all);
        if info.missing {
            report.unresolved_metadata += 1;
        }
        entries.insert(info);
    }
    report.entries = entries.len();

    info!("Downloading missing videos");
    let videos: Vec<_> = entries.videos().cloned().collect();
    for info in &videos {
        let _span = info_span!("item", id = %info.id).entered();
        if info.missing {
            debug!("Skipping unresolved video {}", info.id);
            continue;
        }
        match ensure_downloaded(fetcher, &info.id, &config.output_raw_dir, &config.downloader_args, config.audio_only) {
            Ok(path) => {
                entries.set_path(&info.id, path);
            }
            Err(e) if e.is_item_recoverable() => {
                error!("Failed to download video: {}: {}", info, e);
                report.failed_downloads += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let locales = std::iter::once(None).chain(config.locales.iter().map(|l| Some(l.as_str())));
    for locale in locales {
        let dir = config.link_dir(locale);
        info!("Creating video links in {}", dir.display());
        let sync = symlinks::sync(&dir, &entries, locale)?;
        report.links_created += sync.created;
        report.links_removed += sync.removed;
    }

    if let Some(playlist) = &config.playlist {
        info!("Creating M3U playlist {}", playlist.path.display());
        let stream = BufWriter::new(File::create(&playlist.path)?);
        let base = playlist.base_dir();
        let written = write_playlist(stream, &entries, playlist.format.url_encoded(), base.as_deref(), playlist.locale.as_deref())?;
        report.playlist_entries = Some(written);
    }

    if config.update_db {
        if let (Some(path), Some(db)) = (&config.local_db, local_db.as_mut()) {
            info!("Updating local database: {}", path.display());
            let stats = db.merge_entries(&entries, config.update_all);
            report.db_added = stats.added;
            report.db_updated = stats.updated;
            write_db(path, db)?;
        }
    }

    Ok(report)
}
