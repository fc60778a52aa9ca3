// Tests for the quarantine engine

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fotolist::fs::{MemoryStore, PhotoStore};
use fotolist::photo::{ErrorKind, NameSet, PhotoError, QuarantineEngine, RootLocks, TreeLister};

fn engine(store: &Arc<MemoryStore>) -> QuarantineEngine {
    let store: Arc<dyn PhotoStore> = store.clone();
    QuarantineEngine::new(store, "temp_removed")
}

fn set(names: &[&str]) -> NameSet {
    names.iter().copied().collect()
}

#[tokio::test]
async fn test_clean_moves_unlisted_file() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/file1.jpg", "one");
    store.add_file("/photos/file2.jpg", "two");

    let report = engine(&store)
        .clean(Path::new("/photos"), &set(&["file1.jpg"]))
        .await
        .unwrap();

    assert_eq!(report.removed_names().collect::<Vec<_>>(), vec!["file2.jpg"]);
    assert_eq!(report.files_kept, 1);
    assert!(store.contains_file("/photos/file1.jpg"));
    assert!(!store.contains_file("/photos/file2.jpg"));
    assert_eq!(
        store.file_text("/photos/temp_removed/file2.jpg").as_deref(),
        Some("two")
    );
}

#[tokio::test]
async fn test_clean_creates_quarantine_next_to_file() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/keep.jpg", "");
    store.add_file("/photos/2024/drop.jpg", "");

    let report = engine(&store)
        .clean(Path::new("/photos"), &set(&["keep.jpg"]))
        .await
        .unwrap();

    assert_eq!(report.removed_count(), 1);
    assert_eq!(report.moved[0].to, Path::new("/photos/2024/temp_removed/drop.jpg"));
    assert!(store.contains_dir("/photos/2024/temp_removed"));
    // No quarantine folder where nothing was removed
    assert!(!store.contains_dir("/photos/temp_removed"));
}

#[tokio::test]
async fn test_clean_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/b.jpg", "");
    store.add_file("/photos/sub/c.jpg", "");
    let baseline = set(&["a.jpg"]);
    let engine = engine(&store);

    let first = engine.clean(Path::new("/photos"), &baseline).await.unwrap();
    assert_eq!(first.removed_count(), 2);

    let mutations = store.mutation_count();
    let second = engine.clean(Path::new("/photos"), &baseline).await.unwrap();
    assert_eq!(second.removed_count(), 0);
    assert_eq!(store.mutation_count(), mutations);
}

#[tokio::test]
async fn test_quarantined_files_are_not_listed_again() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/keep.jpg", "");
    store.add_file("/photos/f.jpg", "");

    engine(&store)
        .clean(Path::new("/photos"), &set(&["keep.jpg"]))
        .await
        .unwrap();

    let dyn_store: Arc<dyn PhotoStore> = store.clone();
    let names = TreeLister::new(dyn_store, "temp_removed")
        .list(Path::new("/photos"))
        .await
        .unwrap();
    assert!(!names.contains("f.jpg"));
    assert!(names.contains("keep.jpg"));
}

#[tokio::test]
async fn test_clean_empty_baseline_moves_everything() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/b.jpg", "");

    let report = engine(&store)
        .clean(Path::new("/photos"), &NameSet::new())
        .await
        .unwrap();
    assert_eq!(report.removed_names().collect::<Vec<_>>(), vec!["a.jpg", "b.jpg"]);
    assert_eq!(report.files_kept, 0);
}

#[tokio::test]
async fn test_clean_missing_folder_touches_nothing() {
    let store = Arc::new(MemoryStore::new());

    let err = engine(&store)
        .clean(Path::new("/nowhere"), &NameSet::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFolderPath);
    assert_eq!(store.mutation_count(), 0);
}

#[tokio::test]
async fn test_clean_stops_at_busy_file() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/b.jpg", "");
    store.add_file("/photos/c.jpg", "");
    store.mark_busy("b.jpg");

    let err = engine(&store)
        .clean(Path::new("/photos"), &NameSet::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MoveFailure);
    match err {
        PhotoError::MoveFailure {
            moved,
            from,
            quarantined,
            ..
        } => {
            assert_eq!(moved, 1);
            assert_eq!(from, Path::new("/photos/b.jpg"));
            assert_eq!(quarantined, vec!["a.jpg".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    // Earlier moves are not rolled back, later files are untouched
    assert!(store.contains_file("/photos/temp_removed/a.jpg"));
    assert!(store.contains_file("/photos/b.jpg"));
    assert!(store.contains_file("/photos/c.jpg"));
}

#[tokio::test]
async fn test_clean_refuses_to_overwrite_quarantined_file() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "new");
    store.add_file("/photos/temp_removed/a.jpg", "old");

    let err = engine(&store)
        .clean(Path::new("/photos"), &NameSet::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MoveFailure);
    assert_eq!(store.file_text("/photos/temp_removed/a.jpg").as_deref(), Some("old"));
    assert_eq!(store.file_text("/photos/a.jpg").as_deref(), Some("new"));
}

#[tokio::test]
async fn test_root_locks_are_released_after_clean() {
    let store = Arc::new(MemoryStore::new());
    store.add_dir("/one");
    store.add_dir("/two");
    let engine = engine(&store);

    engine.clean(Path::new("/one"), &NameSet::new()).await.unwrap();
    engine.clean(Path::new("/two"), &NameSet::new()).await.unwrap();
    engine.clean(Path::new("/one"), &NameSet::new()).await.unwrap();
    assert!(engine.locks().is_empty());
}

#[tokio::test]
async fn test_root_lock_entry_lives_while_held() {
    let locks = RootLocks::new();

    let first = locks.acquire(Path::new("/a")).await;
    let second = locks.acquire(Path::new("/b")).await;
    assert_eq!(locks.len(), 2);

    drop(first);
    assert_eq!(locks.len(), 1);
    drop(second);
    assert!(locks.is_empty());

    // A released root can be locked again
    let again = locks.acquire(Path::new("/a")).await;
    assert_eq!(locks.len(), 1);
    drop(again);
}

#[tokio::test]
async fn test_file_named_like_quarantine_is_left_in_place() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/temp_removed", "not a folder");
    store.add_file("/photos/sub/b.jpg", "");

    let report = engine(&store)
        .clean(Path::new("/photos"), &NameSet::new())
        .await
        .unwrap();

    assert_eq!(report.removed_names().collect::<Vec<_>>(), vec!["b.jpg"]);
    assert_eq!(store.file_text("/photos/temp_removed").as_deref(), Some("not a folder"));
    assert!(store.contains_file("/photos/sub/temp_removed/b.jpg"));
}

#[tokio::test]
async fn test_clean_waits_for_root_lock() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    let locks = RootLocks::new();
    let dyn_store: Arc<dyn PhotoStore> = store.clone();
    let engine = QuarantineEngine::with_locks(dyn_store, "temp_removed", locks.clone());

    let guard = locks.acquire(Path::new("/photos")).await;
    let keep = NameSet::new();
    let run = engine.clean(Path::new("/photos"), &keep);
    tokio::pin!(run);

    let blocked = tokio::time::timeout(Duration::from_millis(50), &mut run).await;
    assert!(blocked.is_err());
    assert!(store.contains_file("/photos/a.jpg"));

    drop(guard);
    let report = run.await.unwrap();
    assert_eq!(report.removed_count(), 1);
    assert!(locks.is_empty());
}
