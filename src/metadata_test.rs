use crate::metadata::*;
use crate::testing::{video, video_with_locales};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[test]
fn test_identity_is_id_only() {
    let a = video("dQw4w9WgXcQ", 212, "Original");
    let b = video("dQw4w9WgXcQ", 100, "Renamed");
    assert_eq!(a, b);
    assert!(!a.same_fields(&b));

    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn test_title_locale_fallback() {
    let v = video_with_locales("dQw4w9WgXcQ", 212, "Hello", &[("fr", "Bonjour")]);
    assert_eq!(v.title(None), "Hello");
    assert_eq!(v.title(Some("fr")), "Bonjour");
    assert_eq!(v.title(Some("de")), "Hello");
    // Only exact codes match.
    assert_eq!(v.title(Some("FR")), "Hello");
}

#[test]
fn test_missing_placeholder() {
    let v = VideoInfo::missing("dQw4w9WgXcQ");
    assert!(v.missing);
    assert_eq!(v.title(None), "dQw4w9WgXcQ");
    assert_eq!(v.duration.as_secs(), 0);
    assert_eq!(v.to_string(), "dQw4w9WgXcQ (missing)");
    assert_eq!(video("dQw4w9WgXcQ", 1, "Foo").to_string(), "dQw4w9WgXcQ (Foo)");
}

#[test]
fn test_entries_keep_order_and_replace_in_place() {
    let mut entries = PlaylistEntries::new();
    entries.insert(video("aaaaaaaaaaa", 1, "A"));
    entries.insert(video("bbbbbbbbbbb", 2, "B"));
    entries.insert(video("aaaaaaaaaaa", 3, "A2"));
    assert_eq!(entries.len(), 2);

    let titles: Vec<_> = entries.videos().map(|v| v.title(None).to_string()).collect();
    assert_eq!(titles, vec!["A2", "B"]);

    assert!(entries.set_path("bbbbbbbbbbb", PathBuf::from("/raw/bbbbbbbbbbb.mp4")));
    assert!(!entries.set_path("ccccccccccc", PathBuf::from("/raw/ccccccccccc.mp4")));
    let (_, path) = entries.get("bbbbbbbbbbb").unwrap();
    assert_eq!(path, Some(Path::new("/raw/bbbbbbbbbbb.mp4")));
    let (_, path) = entries.get("aaaaaaaaaaa").unwrap();
    assert_eq!(path, None);
}

#[test]
fn test_entries_from_iter() {
    let entries: PlaylistEntries = vec![
        (video("aaaaaaaaaaa", 1, "A"), Some(PathBuf::from("/raw/aaaaaaaaaaa.mp4"))),
        (video("bbbbbbbbbbb", 2, "B"), None),
    ]
    .into_iter()
    .collect();
    let collected: Vec<_> = entries.iter().map(|(v, p)| (v.id.clone(), p.is_some())).collect();
    assert_eq!(collected, vec![("aaaaaaaaaaa".to_string(), true), ("bbbbbbbbbbb".to_string(), false)]);
}
