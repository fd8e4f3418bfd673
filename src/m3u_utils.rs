//! Standalone M3U maintenance utilities: path re-encoding, listing, moving, copying, and
//! compatibility symlink farms, and XSPF conversion. These work on any M3U file, not only the ones written by a
//! reconciliation run.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, error, info};

use crate::common::{absolute_path, make_symlink, relative_path, url_decode, url_encode_path};
use crate::error::{Result, YtplExpectedError};

const FILE_SCHEME: &str = "file://";

const XSPF_NAMESPACE: &str = "http://xspf.org/ns/0/";

static URI_SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_uri_scheme_regex() -> &'static Regex {
    URI_SCHEME_REGEX.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*)://").unwrap())
}

/// Encoding format for paths in a playlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathEncoding {
    /// Plain UTF-8 paths.
    #[default]
    Normal,
    /// Percent-encoded paths (`%20`).
    Url,
}

impl FromStr for PathEncoding {
    type Err = YtplExpectedError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "normal" => Ok(PathEncoding::Normal),
            "url" => Ok(PathEncoding::Url),
            _ => Err(YtplExpectedError::Generic(format!("Unknown path encoding {s}, expected normal or url"))),
        }
    }
}

fn is_path_line(line: &str) -> bool {
    !line.is_empty() && !line.starts_with('#')
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => YtplExpectedError::FileNotFound { path: path.to_path_buf() }.into(),
        _ => crate::error::YtplError::from(e),
    })?;
    Ok(contents.lines().map(str::to_string).collect())
}

/// Replace `path` with `lines`, going through a temporary file in the same directory.
fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let dir = absolute_path(path)?.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/"));
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    for line in lines {
        writeln!(tmp, "{line}")?;
    }
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn playlist_dir(playlist: &Path) -> Result<PathBuf> {
    let abs = absolute_path(playlist)?;
    Ok(abs.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/")))
}

/// Re-encode one playlist entry. Non-file URIs pass through untouched. The entry may be given
/// literally or percent-encoded; whichever names an existing file wins.
pub fn encode_uri(uri: &str, dirname: &Path, absolute: bool, encoding: PathEncoding, resolve: bool) -> Result<String> {
    if let Some(captures) = get_uri_scheme_regex().captures(uri) {
        if !captures[1].eq_ignore_ascii_case("file") {
            debug!("Parsed {} as {}", uri, uri);
            return Ok(uri.to_string());
        }
    }

    let mut raw = uri.strip_prefix(FILE_SCHEME).unwrap_or(uri).to_string();
    let prefix = if Path::new(&raw).is_absolute() { PathBuf::new() } else { dirname.to_path_buf() };

    if !prefix.join(&raw).exists() {
        raw = url_decode(&raw);
    }
    let mut path = prefix.join(&raw);
    if !path.exists() {
        error!("Parsed {} as {}: file not found", uri, path.display());
        return Err(YtplExpectedError::FileNotFound { path }.into());
    }

    if resolve {
        path = fs::canonicalize(&path)?;
    }
    let path = if absolute { absolute_path(&path)? } else { relative_path(&path, dirname)? };
    let mut rv = path.to_string_lossy().into_owned();
    if encoding == PathEncoding::Url {
        rv = url_encode_path(&rv);
    }
    debug!("Parsed {} as {}", uri, rv);
    Ok(rv)
}

/// Rewrite every path line of `playlist` with [`encode_uri`].
pub fn sanitize_playlist(playlist: &Path, absolute: bool, encoding: PathEncoding, resolve: bool) -> Result<()> {
    info!("Reading {}", playlist.display());
    let dirname = playlist_dir(playlist)?;
    let mut lines = read_lines(playlist)?;
    for line in lines.iter_mut() {
        if is_path_line(line) {
            *line = encode_uri(line, &dirname, absolute, encoding, resolve)?;
        }
    }
    write_lines(playlist, &lines)
}

/// Path lines of a playlist, percent-decoded when that is what makes them exist.
pub fn list_playlist(src: &Path) -> Result<Vec<String>> {
    let dirname = playlist_dir(src)?;
    let mut rv = Vec::new();
    for line in read_lines(src)? {
        if !is_path_line(&line) {
            continue;
        }
        let mut line = line.strip_prefix(FILE_SCHEME).unwrap_or(&line).to_string();
        let mut file = if Path::new(&line).is_absolute() { PathBuf::from(&line) } else { dirname.join(&line) };
        if !file.is_file() {
            file = PathBuf::from(url_decode(&file.to_string_lossy()));
            line = url_decode(&line);
        }
        if !file.is_file() {
            return Err(YtplExpectedError::FileNotFound { path: file }.into());
        }
        rv.push(line);
    }
    Ok(rv)
}

/// Move a playlist, rebasing relative entries so they keep pointing at the same files.
/// `dst` may be a directory. Returns the new playlist path.
pub fn move_playlist(src: &Path, dst: &Path) -> Result<PathBuf> {
    let dst = if dst.is_dir() {
        dst.join(src.file_name().ok_or_else(|| YtplExpectedError::FileNotFound { path: src.to_path_buf() })?)
    } else {
        dst.to_path_buf()
    };
    let src_dir = playlist_dir(src)?;
    let dst_dir = playlist_dir(&dst)?;

    let mut lines = read_lines(src)?;
    for line in lines.iter_mut() {
        if !is_path_line(line) || get_uri_scheme_regex().is_match(line) && !line.starts_with(FILE_SCHEME) {
            continue;
        }
        let (prefix, path) = match line.strip_prefix(FILE_SCHEME) {
            Some(rest) => (FILE_SCHEME, rest.to_string()),
            None => ("", line.clone()),
        };
        if Path::new(&path).is_absolute() {
            continue;
        }
        let rebased = relative_path(&src_dir.join(&path), &dst_dir)?;
        *line = format!("{prefix}{}", rebased.to_string_lossy());
    }

    let mut out = fs::File::create(&dst)?;
    for line in &lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    if absolute_path(src)? != absolute_path(&dst)? {
        fs::remove_file(src)?;
    }
    info!("Moved {} -> {}", src.display(), dst.display());
    Ok(dst)
}

/// Copy the files of a playlist into `dst`. Existing files are kept unless `force` is set.
/// Returns the number of copied files.
pub fn copy_files(src: &Path, dst: &Path, force: bool) -> Result<usize> {
    let dirname = playlist_dir(src)?;
    fs::create_dir_all(dst)?;
    let mut copied = 0;
    for file in list_playlist(src)? {
        let file = if Path::new(&file).is_absolute() { PathBuf::from(file) } else { dirname.join(file) };
        let Some(name) = file.file_name() else {
            continue;
        };
        let dst_file = dst.join(name);
        if force || !dst_file.is_file() {
            info!("Copying {} -> {}", file.display(), dst_file.display());
            fs::copy(&file, &dst_file)?;
            copied += 1;
        } else {
            debug!("{}: already present", dst_file.display());
        }
    }
    Ok(copied)
}

/// Create `<index>.<ext>` symlinks in `dest_dir` for every playlist entry and point the playlist
/// at them. Useful for players that choke on long or exotic file names.
pub fn compat(playlist: &Path, dest_dir: &Path) -> Result<()> {
    fs::create_dir_all(dest_dir)?;
    let base = playlist_dir(playlist)?;
    let dest_dir = absolute_path(dest_dir)?;
    let mut lines = read_lines(playlist)?;

    for (index, line) in lines.iter_mut().enumerate() {
        if !is_path_line(line) {
            continue;
        }
        let (file_prefix, rest) = match line.strip_prefix(FILE_SCHEME) {
            Some(rest) => (true, rest.to_string()),
            None => (false, line.clone()),
        };
        let abs_path = Path::new(&rest).is_absolute();
        let mut file = if abs_path { PathBuf::from(&rest) } else { base.join(&rest) };

        let mut url_encoded = false;
        if !file.is_file() {
            url_encoded = true;
            file = PathBuf::from(url_decode(&file.to_string_lossy()));
        }
        if !file.is_file() {
            return Err(YtplExpectedError::FileNotFound { path: file }.into());
        }

        let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let ext = name.rsplit('.').next().unwrap_or_default();
        let link = dest_dir.join(format!("{index}.{ext}"));
        let target = relative_path(&file, &dest_dir)?;
        debug!("Creating link: {} -> {}", link.display(), target.display());
        make_symlink(&target, &link)?;

        let new_path = if abs_path { link.clone() } else { relative_path(&link, &base)? };
        let mut new_line = new_path.to_string_lossy().into_owned();
        if url_encoded {
            new_line = url_encode_path(&new_line);
        }
        if file_prefix {
            new_line = format!("{FILE_SCHEME}{new_line}");
        }
        *line = new_line;
    }

    write_lines(playlist, &lines)
}

/// One `<track>` of an XSPF playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XspfTrack {
    /// Decoded location with any `file://` scheme removed.
    pub location: String,
    pub title: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<u64>,
}

fn malformed(path: &Path, message: impl Into<String>) -> YtplExpectedError {
    YtplExpectedError::MalformedXspf { path: path.to_path_buf(), message: message.into() }
}

fn xspf_child_text<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children().find(|c| c.has_tag_name((XSPF_NAMESPACE, name))).and_then(|c| c.text()).map(str::trim)
}

/// Parse the `trackList` of an XSPF file. Every location must name an existing file, relative
/// locations being taken from the XSPF file's directory.
pub fn read_xspf(src: &Path) -> Result<Vec<XspfTrack>> {
    let contents = fs::read_to_string(src).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => YtplExpectedError::FileNotFound { path: src.to_path_buf() }.into(),
        _ => crate::error::YtplError::from(e),
    })?;
    let doc = roxmltree::Document::parse(&contents).map_err(|e| malformed(src, e.to_string()))?;
    let track_list = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name((XSPF_NAMESPACE, "trackList")))
        .ok_or_else(|| malformed(src, "no trackList element"))?;

    let dirname = playlist_dir(src)?;
    let mut tracks = Vec::new();
    for track in track_list.children().filter(|n| n.has_tag_name((XSPF_NAMESPACE, "track"))) {
        let raw = xspf_child_text(track, "location").ok_or_else(|| malformed(src, "track without location"))?;
        let decoded = url_decode(raw);
        let location = decoded.strip_prefix(FILE_SCHEME).unwrap_or(&decoded).to_string();
        let file = if Path::new(&location).is_absolute() { PathBuf::from(&location) } else { dirname.join(&location) };
        if !file.is_file() {
            error!("Parsed {} as {}: file not found", raw, file.display());
            return Err(YtplExpectedError::FileNotFound { path: file }.into());
        }
        debug!("Parsed {} as {}", raw, location);
        tracks.push(XspfTrack {
            location,
            title: xspf_child_text(track, "title").map(str::to_string),
            duration_ms: xspf_child_text(track, "duration").and_then(|d| d.parse().ok()),
        });
    }
    Ok(tracks)
}

/// Locations of an XSPF playlist, in track order.
pub fn xspf_list(src: &Path) -> Result<Vec<String>> {
    Ok(read_xspf(src)?.into_iter().map(|t| t.location).collect())
}

/// Convert an XSPF playlist to an extended M3U at `dst`. Relative locations are rebased onto the
/// directory of `dst`. Returns the number of tracks written.
pub fn xspf_to_m3u(src: &Path, dst: &Path) -> Result<usize> {
    let tracks = read_xspf(src)?;
    let src_dir = playlist_dir(src)?;
    let dst_dir = playlist_dir(dst)?;
    fs::create_dir_all(&dst_dir)?;

    let mut lines = vec!["#EXTM3U".to_string()];
    for track in &tracks {
        let path = if Path::new(&track.location).is_absolute() {
            track.location.clone()
        } else {
            relative_path(&src_dir.join(&track.location), &dst_dir)?.to_string_lossy().into_owned()
        };
        let title = match &track.title {
            Some(t) => t.clone(),
            None => Path::new(&path).file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
        };
        let seconds = track.duration_ms.map(|ms| (ms / 1000) as i64).unwrap_or(-1);
        lines.push(format!("#EXTINF:{seconds},{title}"));
        lines.push(path);
    }
    write_lines(dst, &lines)?;
    info!("Converted {} -> {} ({} tracks)", src.display(), dst.display(), tracks.len());
    Ok(tracks.len())
}
