//! Reading and writing the extended M3U playlist of a run.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::common::{absolute_path, relative_path, url_decode, url_encode_path};
use crate::error::{Result, YtplExpectedError};
use crate::metadata::PlaylistEntries;

pub const M3U_HEADER: &str = "#EXTM3U";

/// VLC needs percent-encoded paths when they contain spaces or special characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistFormat {
    #[default]
    Normal,
    Vlc,
}

impl PlaylistFormat {
    pub fn url_encoded(self) -> bool {
        self == PlaylistFormat::Vlc
    }
}

impl FromStr for PlaylistFormat {
    type Err = YtplExpectedError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "normal" => Ok(PlaylistFormat::Normal),
            "vlc" => Ok(PlaylistFormat::Vlc),
            _ => Err(YtplExpectedError::InvalidConfigValue {
                key: "playlist.format".to_string(),
                message: format!("must be one of normal, vlc: got {s}"),
            }),
        }
    }
}

impl fmt::Display for PlaylistFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistFormat::Normal => write!(f, "normal"),
            PlaylistFormat::Vlc => write!(f, "vlc"),
        }
    }
}

/// Video ids referenced by an existing playlist, in order. The id is the file name up to its
/// first dot.
pub fn read_ids<R: BufRead>(reader: R, url_encoded: bool) -> Result<Vec<String>> {
    debug!("Parsing M3U playlist");
    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let basename = line.rsplit('/').next().unwrap_or(line);
        let mut id = basename.split('.').next().unwrap_or(basename).to_string();
        if url_encoded {
            id = url_decode(&id);
        }
        if id.is_empty() {
            return Err(YtplExpectedError::InvalidPlaylistEntry { line: line.to_string() }.into());
        }
        debug!("Found video {}", id);
        ids.push(id);
    }
    Ok(ids)
}

/// Render the path line of one entry: absolute without `base`, else relative to `base`.
pub fn entry_path(path: &Path, url_encoded: bool, base: Option<&Path>) -> Result<String> {
    let path: PathBuf = match base {
        None => absolute_path(path)?,
        Some(base) => relative_path(path, base)?,
    };
    let path = path.to_string_lossy().into_owned();
    Ok(if url_encoded { url_encode_path(&path) } else { path })
}

/// Write the playlist. Entries without a file are dropped and logged. Returns the number of
/// entries written.
pub fn write_playlist<W: Write>(
    mut stream: W,
    entries: &PlaylistEntries,
    url_encoded: bool,
    base: Option<&Path>,
    locale: Option<&str>,
) -> Result<usize> {
    debug!("Creating M3U playlist");
    writeln!(stream, "{M3U_HEADER}")?;
    let mut written = 0;
    for (info, path) in entries.iter() {
        let Some(path) = path else {
            error!("Video not found: {}", info);
            continue;
        };
        let line = entry_path(path, url_encoded, base)?;
        writeln!(stream, "#EXTINF:{},{}", info.duration.as_secs(), info.title(locale))?;
        writeln!(stream, "{line}")?;
        debug!("M3U item: {}", line);
        written += 1;
    }
    stream.flush()?;
    Ok(written)
}
