//! Merging of playlist id sequences.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;

/// Keep `existing` verbatim, then append each id from `remote` not seen yet, in first-seen order.
/// Remote listings are lazy and fallible; the first error aborts the merge.
pub fn try_merge_ids<I>(existing: Vec<String>, remote: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = Result<String>>,
{
    let mut seen: HashSet<String> = existing.iter().cloned().collect();
    let mut merged = existing;
    for id in remote {
        let id = id?;
        if seen.insert(id.clone()) {
            debug!("New playlist item: {}", id);
            merged.push(id);
        }
    }
    Ok(merged)
}

pub fn merge_ids<I>(existing: Vec<String>, remote: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashSet<String> = existing.iter().cloned().collect();
    let mut merged = existing;
    merged.extend(remote.into_iter().filter(|id| seen.insert(id.clone())));
    merged
}
