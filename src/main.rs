use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use ytplaylist::common::initialize_logging;
use ytplaylist::config::{Config, ConfigFile, Overrides};
use ytplaylist::locator::{DownloaderCommand, ExternalDownloader};
use ytplaylist::playlist::PlaylistFormat;
use ytplaylist::reconcile;
use ytplaylist::youtube::YoutubeClient;

/// Download YouTube playlists and keep a directory of nicely named links to them.
#[derive(Parser, Debug)]
#[command(name = "ytplaylist", version, about)]
struct Cli {
    /// Print debug information.
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (default: platform config dir).
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Output directory for the named links.
    #[arg(short = 'o', long = "output")]
    output_dir: Option<PathBuf>,

    /// Output directory for the raw downloaded files.
    #[arg(short = 'O', long = "output-raw")]
    output_raw_dir: Option<PathBuf>,

    /// Output directory template for localized links, containing {locale}.
    #[arg(short = 'e', long = "output-locale")]
    output_locale_dir: Option<String>,

    /// Create localized link directories for these two-letter locales.
    #[arg(short = 'l', long = "locale")]
    locales: Vec<String>,

    /// Download audio only.
    #[arg(short = 'a', long)]
    audio_only: bool,

    /// M3U playlist file to create or extend.
    #[arg(short = 'p', long)]
    playlist: Option<PathBuf>,

    /// Playlist path encoding: normal, or vlc for percent-encoded paths.
    #[arg(short = 'P', long = "playlist-fmt")]
    playlist_format: Option<PlaylistFormat>,

    /// Use localized titles in the playlist.
    #[arg(short = 'L', long)]
    playlist_locale: Option<String>,

    /// Write absolute paths in the playlist.
    #[arg(short = 'A', long = "playlist-abs")]
    playlist_absolute: bool,

    /// Ignore the existing playlist contents.
    #[arg(short = 'f', long)]
    playlist_overwrite: bool,

    /// Local JSON database of video metadata.
    #[arg(short = 'd', long)]
    local_db: Option<PathBuf>,

    /// Add newly resolved videos to the local database.
    #[arg(short = 'u', long)]
    update_db: bool,

    /// Refresh every video from YouTube and rewrite its database record.
    #[arg(short = 'U', long)]
    update_all: bool,

    /// Extra argument passed to the downloader. Repeatable.
    #[arg(short = 'x', long = "ytdl-extra", allow_hyphen_values = true)]
    downloader_args: Vec<String>,

    /// YouTube playlist ids.
    #[arg(value_name = "PLAYLIST", required = true)]
    playlist_ids: Vec<String>,
}

impl Cli {
    fn overrides(self) -> Overrides {
        Overrides {
            playlist_ids: self.playlist_ids,
            output_dir: self.output_dir,
            output_raw_dir: self.output_raw_dir,
            output_locale_dir: self.output_locale_dir,
            locales: self.locales,
            audio_only: self.audio_only,
            playlist: self.playlist,
            playlist_format: self.playlist_format,
            playlist_locale: self.playlist_locale,
            playlist_absolute: self.playlist_absolute,
            playlist_overwrite: self.playlist_overwrite,
            local_db: self.local_db,
            update_db: self.update_db,
            update_all: self.update_all,
            downloader_args: self.downloader_args,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "info" };
    let _guard = initialize_logging(filter, cli.log_file.as_deref())?;

    let file = ConfigFile::parse(cli.config.as_deref()).context("Failed to read configuration")?;
    let config = Config::resolve(file, cli.overrides())?;

    let client = YoutubeClient::from_env(config.api_key.clone());
    let downloader = DownloaderCommand::detect();
    if downloader.is_none() {
        warn!("Neither yt-dlp nor youtube-dl is found in PATH, only existing files can be used");
    }
    let fetcher = ExternalDownloader::new(downloader);

    let report = reconcile(&config, &client, &client, &fetcher)?;
    info!(
        "Done: {} videos, {} unresolved, {} failed downloads, {} links created, {} links removed",
        report.entries, report.unresolved_metadata, report.failed_downloads, report.links_created, report.links_removed
    );
    Ok(())
}
