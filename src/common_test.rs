use crate::common::*;
use crate::testing;
use std::fs;
use std::path::{Path, PathBuf};

#[test]
fn test_sanitize_name_single_segment() {
    let name = sanitize_name("AC/DC / Back in Black");
    assert!(!name.contains('/'));
    assert_eq!(name, "AC\u{2215}DC \u{2215} Back in Black");
    assert_eq!(Path::new(&name).components().count(), 1);
}

#[test]
fn test_id_from_filename() {
    assert_eq!(id_from_filename("dQw4w9WgXcQ.webm").as_deref(), Some("dQw4w9WgXcQ"));
    assert_eq!(id_from_filename("abc-_DEF123.m4a").as_deref(), Some("abc-_DEF123"));
    // Too short to be a video id.
    assert_eq!(id_from_filename("short.mp4"), None);
    // Partial downloads and sidecar files are not raw files.
    assert_eq!(id_from_filename("dQw4w9WgXcQ.webm.part"), None);
    assert_eq!(id_from_filename("dQw4w9WgXcQ.en.vtt"), None);
    assert_eq!(id_from_filename("Some Title.mp4"), None);
}

#[test]
fn test_id_from_path_follows_symlinks() {
    let tmp = testing::init();
    let raw = tmp.path().join("dQw4w9WgXcQ.mp4");
    fs::write(&raw, "").unwrap();
    let link = tmp.path().join("Never Gonna Give You Up.mp4");
    make_symlink(Path::new("dQw4w9WgXcQ.mp4"), &link).unwrap();

    assert_eq!(id_from_path(&raw).as_deref(), Some("dQw4w9WgXcQ"));
    assert_eq!(id_from_path(&link).as_deref(), Some("dQw4w9WgXcQ"));

    // Dangling links decode from their literal target.
    let dead = tmp.path().join("Gone.mp4");
    make_symlink(Path::new("zzzzzzzzzzz.mp4"), &dead).unwrap();
    assert_eq!(id_from_path(&dead).as_deref(), Some("zzzzzzzzzzz"));
}

#[test]
fn test_listdir_abs_sorted() {
    let tmp = testing::init();
    for name in ["c", "a", "b"] {
        fs::write(tmp.path().join(name), "").unwrap();
    }
    let listed = listdir_abs(tmp.path()).unwrap();
    let names: Vec<_> = listed.iter().map(|p| p.file_name().unwrap().to_str().unwrap().to_string()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert!(listed.iter().all(|p| p.is_absolute()));
}

#[test]
fn test_normalize_lexically() {
    assert_eq!(normalize_lexically(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    assert_eq!(normalize_lexically(Path::new("../a/../../b")), PathBuf::from("../../b"));
    assert_eq!(normalize_lexically(Path::new("/..")), PathBuf::from("/"));
    assert_eq!(normalize_lexically(Path::new("a/..")), PathBuf::from("."));
}

#[test]
fn test_relative_path() {
    assert_eq!(relative_path(Path::new("/a/b/Foo.mp4"), Path::new("/a")).unwrap(), PathBuf::from("b/Foo.mp4"));
    assert_eq!(relative_path(Path::new("/music-raw/x.mp4"), Path::new("/music")).unwrap(), PathBuf::from("../music-raw/x.mp4"));
    assert_eq!(relative_path(Path::new("/a"), Path::new("/a")).unwrap(), PathBuf::from("."));
}

#[test]
fn test_url_encode_path_keeps_separators() {
    assert_eq!(url_encode_path("/music/A B/C&D.mp4"), "/music/A%20B/C%26D.mp4");
    assert_eq!(url_decode("/music/A%20B/C%26D.mp4"), "/music/A B/C&D.mp4");
    // Invalid UTF-8 after decoding leaves the input alone.
    assert_eq!(url_decode("%FF"), "%FF");
}

#[test]
fn test_move_file() {
    let tmp = testing::init();
    let src = tmp.path().join("src.mp4");
    let dst = tmp.path().join("dst.mp4");
    fs::write(&src, "data").unwrap();
    move_file(&src, &dst).unwrap();
    assert!(!src.exists());
    assert_eq!(fs::read_to_string(&dst).unwrap(), "data");
}

#[test]
fn test_is_symlink() {
    let tmp = testing::init();
    let file = tmp.path().join("file");
    fs::write(&file, "").unwrap();
    let link = tmp.path().join("link");
    make_symlink(&file, &link).unwrap();
    assert!(is_symlink(&link));
    assert!(!is_symlink(&file));
    assert!(!is_symlink(&tmp.path().join("nope")));
}

#[test]
fn test_truncate_bytes_on_char_boundary() {
    assert_eq!(truncate_bytes("hello", 10), "hello");
    assert_eq!(truncate_bytes("hello world", 6), "hello");
    // Three bytes per char: 8 bytes keeps two chars.
    assert_eq!(truncate_bytes("日本語", 8), "日本");
    assert_eq!(truncate_bytes("日本語", 2), "");
}
