pub mod common;
pub mod config;
pub mod database;
pub mod error;
pub mod locator;
pub mod m3u_utils;
pub mod merge;
pub mod metadata;
pub mod playlist;
pub mod reconcile;
pub mod resolver;
pub mod symlinks;
pub mod youtube;

pub use config::{Config, ConfigFile, Overrides};
pub use error::{Result, YtplError, YtplExpectedError};
pub use metadata::{PlaylistEntries, VideoInfo};
pub use reconcile::{reconcile, ReconcileReport};

#[cfg(test)]
mod testing;

#[cfg(test)]
mod common_test;
#[cfg(test)]
mod merge_test;
#[cfg(test)]
mod metadata_test;
#[cfg(test)]
mod resolver_test;
#[cfg(test)]
mod youtube_test;
