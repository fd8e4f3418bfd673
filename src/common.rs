/// The common module is our grab bag of small filesystem and naming helpers shared by the
/// reconciliation steps and the M3U utilities.

use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Replacement for `/` in titles. U+2215 DIVISION SLASH looks the same but is not a separator.
pub const SEPARATOR_SUBSTITUTE: char = '\u{2215}';

static RAW_FILENAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_raw_filename_regex() -> &'static Regex {
    RAW_FILENAME_REGEX.get_or_init(|| Regex::new(r"^([A-Za-z0-9_\-]{8,})\.[a-z0-9]{1,4}$").unwrap())
}

/// Byte budget for generated file names, well under the 255 bytes most filesystems allow.
pub const MAX_FILENAME_BYTES: usize = 180;

/// Cut `s` to at most `max` bytes on a char boundary, dropping trailing whitespace.
pub fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].trim_end()
}

/// Make a title usable as a single file name component.
pub fn sanitize_name(name: &str) -> String {
    name.replace('/', &SEPARATOR_SUBSTITUTE.to_string())
}

/// Decode the video identifier from a raw file name such as `dQw4w9WgXcQ.webm`.
pub fn id_from_filename(name: &str) -> Option<String> {
    get_raw_filename_regex().captures(name).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/// Decode the video identifier of a path, following symlinks to the raw file they point at.
/// Dangling symlinks are decoded from their literal target.
pub fn id_from_path(file: &Path) -> Option<String> {
    let resolved = match fs::canonicalize(file) {
        Ok(p) => p,
        Err(_) => match fs::read_link(file) {
            Ok(target) => target,
            Err(_) => file.to_path_buf(),
        },
    };
    let name = resolved.file_name()?.to_str()?;
    id_from_filename(name)
}

/// List a directory (one level) as absolute, normalized paths, sorted for stable processing order.
pub fn listdir_abs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let base = absolute_path(dir)?;
    let mut paths = Vec::new();
    for entry in fs::read_dir(&base)? {
        let entry = entry?;
        paths.push(base.join(entry.file_name()));
    }
    paths.sort();
    Ok(paths)
}

pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).map(|m| m.file_type().is_symlink()).unwrap_or(false)
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_lexically(path));
    }
    Ok(normalize_lexically(&env::current_dir()?.join(path)))
}

/// Lexical relative path from directory `base` to `target`. Neither needs to exist.
pub fn relative_path(target: &Path, base: &Path) -> io::Result<PathBuf> {
    let target = absolute_path(target)?;
    let base = absolute_path(base)?;
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts.iter().zip(base_parts.iter()).take_while(|(a, b)| a == b).count();

    let mut rv = PathBuf::new();
    for _ in common..base_parts.len() {
        rv.push("..");
    }
    for part in &target_parts[common..] {
        rv.push(part.as_os_str());
    }
    if rv.as_os_str().is_empty() {
        rv.push(".");
    }
    Ok(rv)
}

/// Percent-encode a path for URL-style playlists. Separators are kept.
pub fn url_encode_path(path: &str) -> String {
    path.split('/').map(|segment| urlencoding::encode(segment).into_owned()).collect::<Vec<_>>().join("/")
}

/// Percent-decode, leaving the input untouched when it does not decode to UTF-8.
pub fn url_decode(s: &str) -> String {
    match urlencoding::decode(s) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => s.to_string(),
    }
}

/// Move a file, falling back to copy and delete across filesystems.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
    }
}

#[cfg(unix)]
pub fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Install the process-wide tracing subscriber. `RUST_LOG` takes precedence over `default_filter`.
/// When logging to a file, the returned guard must be held until exit to flush buffered events.
pub fn initialize_logging(default_filter: &str, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match log_file {
        None => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
        Some(path) => {
            let path = absolute_path(path)?;
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
            let filename = path.file_name().ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            fs::create_dir_all(&dir)?;
            let file_appender = tracing_appender::rolling::never(&dir, filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(guard))
        }
    }
}
