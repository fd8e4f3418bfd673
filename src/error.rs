use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum YtplError {
    #[error("ytplaylist error: {0}")]
    Generic(String),
    #[error(transparent)]
    Expected(#[from] YtplExpectedError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),
}

#[derive(Error, Debug)]
pub enum YtplExpectedError {
    #[error("{0}")]
    Generic(String),
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },
    #[error("Configuration file not found ({path})")]
    ConfigNotFound { path: PathBuf },
    #[error("Invalid value for {key} in configuration: {message}")]
    InvalidConfigValue { key: String, message: String },
    #[error("Neither yt-dlp nor youtube-dl is found")]
    DownloaderNotFound,
    #[error("Downloader failed for {id}: {status}")]
    DownloadFailed { id: String, status: String },
    #[error("Downloader produced no file for {id}")]
    NothingDownloaded { id: String },
    #[error("Did not find downloaded file for {id} in {files:?}")]
    NoPrimaryArtifact { id: String, files: Vec<PathBuf> },
    #[error("Downloaded video not found in {dir}: {id}")]
    DownloadedFileMissing { id: String, dir: PathBuf },
    #[error("Video not found: {id}")]
    VideoNotFound { id: String },
    #[error("Malformed response for {id}: {message}")]
    MalformedResponse { id: String, message: String },
    #[error("Invalid duration: {value}")]
    InvalidDuration { value: String },
    #[error("Malformed database {path}: {message}")]
    MalformedDatabase { path: PathBuf, message: String },
    #[error("Invalid playlist entry: {line}")]
    InvalidPlaylistEntry { line: String },
    #[error("Malformed XSPF playlist {path}: {message}")]
    MalformedXspf { path: PathBuf, message: String },
}

impl From<ureq::Error> for YtplError {
    fn from(e: ureq::Error) -> Self {
        YtplError::Http(Box::new(e))
    }
}

impl YtplError {
    /// Failures that only affect the item being processed. The batch logs them and moves on.
    pub fn is_item_recoverable(&self) -> bool {
        match self {
            YtplError::Http(_) => true,
            YtplError::Expected(e) => matches!(
                e,
                YtplExpectedError::DownloadFailed { .. }
                    | YtplExpectedError::NothingDownloaded { .. }
                    | YtplExpectedError::VideoNotFound { .. }
                    | YtplExpectedError::MalformedResponse { .. }
                    | YtplExpectedError::InvalidDuration { .. }
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, YtplError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_recoverable_classification() {
        let soft: YtplError = YtplExpectedError::DownloadFailed { id: "abcdefgh".into(), status: "exit status: 1".into() }.into();
        assert!(soft.is_item_recoverable());
        let soft: YtplError = YtplExpectedError::VideoNotFound { id: "abcdefgh".into() }.into();
        assert!(soft.is_item_recoverable());

        let fatal: YtplError = YtplExpectedError::DownloaderNotFound.into();
        assert!(!fatal.is_item_recoverable());
        let fatal: YtplError = YtplExpectedError::NoPrimaryArtifact { id: "abcdefgh".into(), files: vec![] }.into();
        assert!(!fatal.is_item_recoverable());
        let fatal: YtplError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(!fatal.is_item_recoverable());
    }
}
