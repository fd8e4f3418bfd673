use crate::database::LocalDb;
use crate::resolver::*;
use crate::testing::{self, video, FakeMetadata};

#[test]
fn test_database_hit_skips_remote() {
    let _tmp = testing::init();
    let mut db = LocalDb::new();
    db.insert(video("aaaaaaaaaaa", 10, "Cached"));
    let remote = FakeMetadata::with([video("aaaaaaaaaaa", 20, "Remote")]);

    let info = resolve("aaaaaaaaaaa", Some(&db), &remote, false);
    assert_eq!(info.title(None), "Cached");
    assert!(remote.calls.borrow().is_empty());
}

#[test]
fn test_database_miss_uses_remote() {
    let _tmp = testing::init();
    let db = LocalDb::new();
    let remote = FakeMetadata::with([video("aaaaaaaaaaa", 20, "Remote")]);
    let info = resolve("aaaaaaaaaaa", Some(&db), &remote, false);
    assert_eq!(info.title(None), "Remote");
    assert!(!info.missing);

    let info = resolve("aaaaaaaaaaa", None, &remote, false);
    assert_eq!(info.title(None), "Remote");
    assert_eq!(remote.calls.borrow().len(), 2);
}

#[test]
fn test_force_refresh() {
    let _tmp = testing::init();
    let mut db = LocalDb::new();
    db.insert(video("aaaaaaaaaaa", 10, "Cached"));
    db.insert(video("bbbbbbbbbbb", 10, "Only cached"));
    let remote = FakeMetadata::with([video("aaaaaaaaaaa", 20, "Remote")]);

    let info = resolve("aaaaaaaaaaa", Some(&db), &remote, true);
    assert_eq!(info.title(None), "Remote");
    // A failed refresh keeps the cached record.
    let info = resolve("bbbbbbbbbbb", Some(&db), &remote, true);
    assert_eq!(info.title(None), "Only cached");
    assert!(!info.missing);
}

#[test]
fn test_unresolvable_yields_placeholder() {
    let _tmp = testing::init();
    let remote = FakeMetadata::default();
    let info = resolve("aaaaaaaaaaa", None, &remote, false);
    assert!(info.missing);
    assert_eq!(info.title(None), "aaaaaaaaaaa");
}

#[test]
fn test_idempotent_without_refresh() {
    let _tmp = testing::init();
    let mut db = LocalDb::new();
    db.insert(video("aaaaaaaaaaa", 10, "Cached"));
    let remote = FakeMetadata::default();
    let first = resolve("aaaaaaaaaaa", Some(&db), &remote, false);
    let second = resolve("aaaaaaaaaaa", Some(&db), &remote, false);
    assert_eq!(first, second);
    assert!(first.same_fields(&second));
}
