use crate::error::{Result, YtplError, YtplExpectedError};
use crate::merge::*;

fn ids(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_merge_appends_new_in_first_seen_order() {
    let merged = merge_ids(ids(&["a", "b"]), ids(&["c", "a", "d", "c", "e"]));
    assert_eq!(merged, ids(&["a", "b", "c", "d", "e"]));
}

#[test]
fn test_merge_keeps_existing_verbatim() {
    let existing = ids(&["z", "y", "x"]);
    let merged = merge_ids(existing.clone(), ids(&["x", "w"]));
    assert_eq!(&merged[..3], &existing[..]);
    assert_eq!(merged, ids(&["z", "y", "x", "w"]));
}

#[test]
fn test_merge_empty_inputs() {
    assert!(merge_ids(vec![], vec![]).is_empty());
    assert_eq!(merge_ids(vec![], ids(&["a", "a"])), ids(&["a"]));
    assert_eq!(merge_ids(ids(&["a"]), vec![]), ids(&["a"]));
}

#[test]
fn test_try_merge_concatenated_sources() {
    let first = ids(&["a", "b"]).into_iter().map(Ok);
    let second = ids(&["b", "c"]).into_iter().map(Ok);
    let merged = try_merge_ids(ids(&["c"]), first.chain(second)).unwrap();
    assert_eq!(merged, ids(&["c", "a", "b"]));
}

#[test]
fn test_try_merge_propagates_source_error() {
    let remote: Vec<Result<String>> = vec![
        Ok("a".to_string()),
        Err(YtplExpectedError::Generic("listing failed".to_string()).into()),
        Ok("b".to_string()),
    ];
    let err = try_merge_ids(vec![], remote).unwrap_err();
    assert!(matches!(err, YtplError::Expected(YtplExpectedError::Generic(_))));
}
