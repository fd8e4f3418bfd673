use tracing::{debug, error, warn};

use crate::database::LocalDb;
use crate::metadata::VideoInfo;
use crate::youtube::MetadataSource;

/// Resolve the metadata of one video.
///
/// The local database wins unless `force_refresh` is set. The remote source is consulted when
/// the database has no record or a refresh is forced; a failed lookup keeps whatever was found
/// before. The result is a placeholder if nothing could be resolved. This never fails: lookup
/// errors only affect this video.
pub fn resolve(id: &str, local_db: Option<&LocalDb>, source: &dyn MetadataSource, force_refresh: bool) -> VideoInfo {
    let mut info = VideoInfo::missing(id);

    match local_db.and_then(|db| db.get(id)) {
        Some(found) => {
            debug!("Found video in database: {}", found);
            info = found.clone();
        }
        None => debug!("Not found in database: {}", id),
    }

    if info.missing || force_refresh {
        match source.video_info(id) {
            Ok(remote) => {
                debug!("Got video info from Youtube: {}", remote);
                info = remote;
            }
            Err(e) => warn!("Video info not found on Youtube: {}: {}", id, e),
        }
    }

    if info.missing {
        error!("Failed to get video information for {}", id);
    }
    info
}
