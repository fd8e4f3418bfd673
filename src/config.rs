//! The config module provides the config file format, its parsing, and the merge with command line
//! overrides into the [`Config`] a run works from.
//!
//! The config file is optional. Invalid values produce errors naming the offending key, and
//! unrecognized keys are warned about.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::warn;

use crate::common::absolute_path;
use crate::error::{Result, YtplExpectedError};
use crate::playlist::PlaylistFormat;

pub const LOCALE_PLACEHOLDER: &str = "{locale}";

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ytplaylist").map(|d| d.config_dir().join("config.toml"))
}

/// Values read from the config file. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub output_dir: Option<PathBuf>,
    pub output_raw_dir: Option<PathBuf>,
    pub output_locale_dir: Option<String>,
    pub locales: Option<Vec<String>>,
    pub audio_only: Option<bool>,
    pub local_db: Option<PathBuf>,
    pub downloader_args: Option<Vec<String>>,
    pub api_key: Option<String>,
    pub playlist: PlaylistFileConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistFileConfig {
    pub path: Option<PathBuf>,
    pub format: Option<PlaylistFormat>,
    pub locale: Option<String>,
    pub absolute: Option<bool>,
}

fn invalid(key: &str, message: impl Into<String>) -> YtplExpectedError {
    YtplExpectedError::InvalidConfigValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn take_string(data: &mut toml::Table, prefix: &str, key: &str) -> Result<Option<String>> {
    let full = format!("{prefix}{key}");
    match data.remove(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(invalid(&full, format!("must be a string: got {}", other.type_str())).into()),
    }
}

fn take_bool(data: &mut toml::Table, prefix: &str, key: &str) -> Result<Option<bool>> {
    let full = format!("{prefix}{key}");
    match data.remove(key) {
        None => Ok(None),
        Some(toml::Value::Boolean(b)) => Ok(Some(b)),
        Some(other) => Err(invalid(&full, format!("must be a bool: got {}", other.type_str())).into()),
    }
}

fn take_string_list(data: &mut toml::Table, prefix: &str, key: &str) -> Result<Option<Vec<String>>> {
    let full = format!("{prefix}{key}");
    match data.remove(key) {
        None => Ok(None),
        Some(toml::Value::Array(items)) => {
            let mut rv = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    toml::Value::String(s) => rv.push(s),
                    other => return Err(invalid(&full, format!("each item must be a string: got {}", other.type_str())).into()),
                }
            }
            Ok(Some(rv))
        }
        Some(other) => Err(invalid(&full, format!("must be a list[str]: got {}", other.type_str())).into()),
    }
}

fn take_path(data: &mut toml::Table, prefix: &str, key: &str) -> Result<Option<PathBuf>> {
    Ok(take_string(data, prefix, key)?.map(|s| expand_path(&s)))
}

pub fn expand_path(s: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(s).into_owned())
}

fn warn_unknown_keys(data: &toml::Table, prefix: &str, cfgpath: &Path) {
    for key in data.keys() {
        warn!("Unrecognized key {}{} in configuration file ({})", prefix, key, cfgpath.display());
    }
}

impl ConfigFile {
    /// Read the config file at `cfgpath`, or at the default location when `None`. A missing file
    /// at the default location is not an error.
    pub fn parse(cfgpath: Option<&Path>) -> Result<ConfigFile> {
        let (path, explicit) = match cfgpath {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(ConfigFile::default()),
            },
        };
        if !path.is_file() {
            if explicit {
                return Err(YtplExpectedError::ConfigNotFound { path }.into());
            }
            return Ok(ConfigFile::default());
        }
        let contents = fs::read_to_string(&path)?;
        Self::parse_str(&path, &contents)
    }

    pub fn parse_str(cfgpath: &Path, contents: &str) -> Result<ConfigFile> {
        let mut data: toml::Table = contents.parse()?;

        let mut playlist = PlaylistFileConfig::default();
        match data.remove("playlist") {
            None => {}
            Some(toml::Value::Table(mut table)) => {
                playlist.path = take_path(&mut table, "playlist.", "path")?;
                playlist.format = match take_string(&mut table, "playlist.", "format")? {
                    Some(s) => Some(s.parse::<PlaylistFormat>()?),
                    None => None,
                };
                playlist.locale = take_string(&mut table, "playlist.", "locale")?;
                playlist.absolute = take_bool(&mut table, "playlist.", "absolute")?;
                warn_unknown_keys(&table, "playlist.", cfgpath);
            }
            Some(other) => return Err(invalid("playlist", format!("must be a table: got {}", other.type_str())).into()),
        }

        let cfg = ConfigFile {
            output_dir: take_path(&mut data, "", "output_dir")?,
            output_raw_dir: take_path(&mut data, "", "output_raw_dir")?,
            output_locale_dir: take_string(&mut data, "", "output_locale_dir")?,
            locales: take_string_list(&mut data, "", "locales")?,
            audio_only: take_bool(&mut data, "", "audio_only")?,
            local_db: take_path(&mut data, "", "local_db")?,
            downloader_args: take_string_list(&mut data, "", "downloader_args")?,
            api_key: take_string(&mut data, "", "api_key")?,
            playlist,
        };
        warn_unknown_keys(&data, "", cfgpath);
        Ok(cfg)
    }
}

/// Command line values. `None`/`false`/empty means "not given on the command line".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub playlist_ids: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub output_raw_dir: Option<PathBuf>,
    pub output_locale_dir: Option<String>,
    pub locales: Vec<String>,
    pub audio_only: bool,
    pub playlist: Option<PathBuf>,
    pub playlist_format: Option<PlaylistFormat>,
    pub playlist_locale: Option<String>,
    pub playlist_absolute: bool,
    pub playlist_overwrite: bool,
    pub local_db: Option<PathBuf>,
    pub update_db: bool,
    pub update_all: bool,
    pub downloader_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistConfig {
    pub path: PathBuf,
    pub format: PlaylistFormat,
    pub locale: Option<String>,
    pub absolute: bool,
    pub overwrite: bool,
}

impl PlaylistConfig {
    /// Directory relative paths are written against, `None` for absolute paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        if self.absolute {
            return None;
        }
        Some(self.path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/")))
    }
}

/// Everything a reconciliation run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub playlist_ids: Vec<String>,
    pub output_dir: PathBuf,
    pub output_raw_dir: PathBuf,
    pub output_locale_template: String,
    pub locales: Vec<String>,
    pub audio_only: bool,
    pub playlist: Option<PlaylistConfig>,
    pub local_db: Option<PathBuf>,
    pub update_db: bool,
    pub update_all: bool,
    pub downloader_args: Vec<String>,
    pub api_key: Option<String>,
}

/// `<default>` with `suffix` appended to its last component, e.g. `/music` -> `/music-raw`.
fn sibling_with_suffix(default: &Path, suffix: &str) -> PathBuf {
    let name = default.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let parent = default.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/"));
    parent.join(format!("{name}{suffix}"))
}

impl Config {
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Config> {
        let output_dir = absolute_path(&overrides.output_dir.or(file.output_dir).unwrap_or_else(|| PathBuf::from(".")))?;
        let output_raw_dir = match overrides.output_raw_dir.or(file.output_raw_dir) {
            Some(p) => absolute_path(&p)?,
            None => sibling_with_suffix(&output_dir, "-raw"),
        };
        let output_locale_template = match overrides.output_locale_dir.or(file.output_locale_dir) {
            Some(t) => absolute_path(&expand_path(&t))?.to_string_lossy().into_owned(),
            None => sibling_with_suffix(&output_dir, &format!("-{LOCALE_PLACEHOLDER}")).to_string_lossy().into_owned(),
        };

        let locales = if overrides.locales.is_empty() { file.locales.unwrap_or_default() } else { overrides.locales };
        for locale in &locales {
            if locale.chars().count() != 2 {
                return Err(invalid("locales", format!("locale codes have two letters: got {locale}")).into());
            }
        }
        if locales.len() > 1 && !output_locale_template.contains(LOCALE_PLACEHOLDER) {
            return Err(invalid(
                "output_locale_dir",
                format!("must contain {LOCALE_PLACEHOLDER} when several locales are configured"),
            )
            .into());
        }

        let local_db = overrides.local_db.or(file.local_db);
        if overrides.update_db && local_db.is_none() {
            return Err(invalid("local_db", "updating the database requires a database path").into());
        }

        let playlist = match overrides.playlist.or(file.playlist.path) {
            Some(path) => {
                let playlist_locale = overrides.playlist_locale.or(file.playlist.locale);
                if let Some(l) = &playlist_locale {
                    if l.chars().count() != 2 {
                        return Err(invalid("playlist.locale", format!("locale codes have two letters: got {l}")).into());
                    }
                }
                Some(PlaylistConfig {
                    path: absolute_path(&path)?,
                    format: overrides.playlist_format.or(file.playlist.format).unwrap_or_default(),
                    locale: playlist_locale,
                    absolute: overrides.playlist_absolute || file.playlist.absolute.unwrap_or(false),
                    overwrite: overrides.playlist_overwrite,
                })
            }
            None => None,
        };

        let mut downloader_args = file.downloader_args.unwrap_or_default();
        downloader_args.extend(overrides.downloader_args);

        Ok(Config {
            playlist_ids: overrides.playlist_ids,
            output_dir,
            output_raw_dir,
            output_locale_template,
            locales,
            audio_only: overrides.audio_only || file.audio_only.unwrap_or(false),
            playlist,
            local_db,
            update_db: overrides.update_db,
            update_all: overrides.update_all,
            downloader_args,
            api_key: file.api_key,
        })
    }

    /// Symlink directory for `locale`, or the default pretty directory for `None`.
    pub fn link_dir(&self, locale: Option<&str>) -> PathBuf {
        match locale {
            None => self.output_dir.clone(),
            Some(l) => PathBuf::from(self.output_locale_template.replace(LOCALE_PLACEHOLDER, l)),
        }
    }
}
