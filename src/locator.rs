//! Locating raw media files and fetching the ones that are not downloaded yet.
//!
//! Raw files are named `<id>.<ext>` inside the raw directory. Downloads go to a private staging
//! directory first and only the primary artifact is moved into place.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::common::{id_from_path, listdir_abs, move_file};
use crate::error::{Result, YtplExpectedError};

/// Find the raw file of `id` in `raw_dir`. Only regular files directly inside the directory count.
pub fn find_existing(raw_dir: &Path, id: &str) -> Result<Option<PathBuf>> {
    if !raw_dir.is_dir() {
        return Ok(None);
    }
    for path in listdir_abs(raw_dir)? {
        if path.is_file() && id_from_path(&path).as_deref() == Some(id) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloaderKind {
    YtDlp,
    YoutubeDl,
}

impl DownloaderKind {
    pub fn executable_name(self) -> &'static str {
        match self {
            DownloaderKind::YtDlp => "yt-dlp",
            DownloaderKind::YoutubeDl => "youtube-dl",
        }
    }
}

/// The external downloader to invoke, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderCommand {
    pub program: PathBuf,
    pub kind: DownloaderKind,
}

impl DownloaderCommand {
    /// Probe `PATH` for yt-dlp, then youtube-dl.
    pub fn detect() -> Option<DownloaderCommand> {
        let path = env::var_os("PATH")?;
        Self::detect_in(&path)
    }

    pub fn detect_in(path: &OsString) -> Option<DownloaderCommand> {
        for kind in [DownloaderKind::YtDlp, DownloaderKind::YoutubeDl] {
            for dir in env::split_paths(path) {
                let candidate = dir.join(kind.executable_name());
                if is_executable(&candidate) {
                    debug!("Using downloader {}", candidate.display());
                    return Some(DownloaderCommand { program: candidate, kind });
                }
            }
        }
        None
    }

    /// Arguments for downloading `id` into `staging_dir`, excluding the program itself.
    pub fn args(&self, id: &str, staging_dir: &Path, extra_args: &[String], audio_only: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--ignore-errors".into(),
            "--embed-subs".into(),
            "--embed-thumbnail".into(),
            "--output".into(),
            staging_dir.join("%(id)s.%(ext)s").into_os_string(),
        ];
        if audio_only {
            args.push("--extract-audio".into());
        }
        match self.kind {
            DownloaderKind::YtDlp => {
                args.push("--embed-metadata".into());
                args.push("--embed-chapters".into());
            }
            DownloaderKind::YoutubeDl => args.push("--add-metadata".into()),
        }
        args.extend(extra_args.iter().map(OsString::from));
        args.push("--".into());
        args.push(id.into());
        args
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

/// Deposits the media file(s) of one video into a staging directory.
pub trait MediaFetcher {
    fn fetch(&self, id: &str, staging_dir: &Path, extra_args: &[String], audio_only: bool) -> Result<()>;
}

/// Runs yt-dlp or youtube-dl as a blocking child process.
pub struct ExternalDownloader {
    command: Option<DownloaderCommand>,
}

impl ExternalDownloader {
    pub fn new(command: Option<DownloaderCommand>) -> Self {
        Self { command }
    }
}

impl MediaFetcher for ExternalDownloader {
    fn fetch(&self, id: &str, staging_dir: &Path, extra_args: &[String], audio_only: bool) -> Result<()> {
        let command = self.command.as_ref().ok_or(YtplExpectedError::DownloaderNotFound)?;
        let args = command.args(id, staging_dir, extra_args, audio_only);
        debug!("Calling: {} {:?}", command.program.display(), args);
        let status = Command::new(&command.program).args(&args).status()?;
        if !status.success() {
            return Err(YtplExpectedError::DownloadFailed {
                id: id.to_string(),
                status: status.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Pick the primary artifact among the staged files: the first whose name has exactly one dot.
pub fn select_primary_artifact(files: &[PathBuf]) -> Option<&PathBuf> {
    files.iter().find(|f| f.file_name().and_then(|n| n.to_str()).map(|n| n.matches('.').count() == 1).unwrap_or(false))
}

/// Return the raw file of `id`, downloading it into `raw_dir` first if needed.
pub fn ensure_downloaded(fetcher: &dyn MediaFetcher, id: &str, raw_dir: &Path, extra_args: &[String], audio_only: bool) -> Result<PathBuf> {
    if let Some(existing) = find_existing(raw_dir, id)? {
        return Ok(existing);
    }

    info!("Downloading video: {}", id);
    fs::create_dir_all(raw_dir)?;

    let staging = tempfile::Builder::new().prefix("ytplaylist.").tempdir()?;
    fetcher.fetch(id, staging.path(), extra_args, audio_only)?;

    let files = listdir_abs(staging.path())?;
    if files.is_empty() {
        return Err(YtplExpectedError::NothingDownloaded { id: id.to_string() }.into());
    }
    if files.len() > 1 {
        warn!("Downloaded {} files for {}, expected 1", files.len(), id);
    }
    let primary = select_primary_artifact(&files).ok_or_else(|| YtplExpectedError::NoPrimaryArtifact {
        id: id.to_string(),
        files: files.clone(),
    })?;

    // The primary artifact always has a file name: it was selected by it.
    let new_name = raw_dir.join(primary.file_name().unwrap_or_default());
    move_file(primary, &new_name)?;
    debug!("Downloaded {}", new_name.display());

    find_existing(raw_dir, id)?.ok_or_else(|| {
        YtplExpectedError::DownloadedFileMissing {
            id: id.to_string(),
            dir: raw_dir.to_path_buf(),
        }
        .into()
    })
}
