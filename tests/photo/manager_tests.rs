// Tests for the photo manager operations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fotolist::catalog::{CatalogRepository, FileStatus};
use fotolist::config::Config;
use fotolist::fs::{MemoryStore, PhotoStore};
use fotolist::photo::{ErrorKind, ManifestHandler, NameSet, PhotoManager};

fn config() -> Config {
    Config {
        report_dir: Some(PathBuf::from("/reports")),
        ..Config::default()
    }
}

fn manager(store: &Arc<MemoryStore>) -> PhotoManager {
    let store: Arc<dyn PhotoStore> = store.clone();
    PhotoManager::new(store, config()).unwrap()
}

#[tokio::test]
async fn test_create_list_file_default_location() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/sub/b.jpg", "");

    let path = manager(&store)
        .create_list_file(Path::new("/photos"), None)
        .await
        .unwrap();

    assert_eq!(path, Path::new("/reports/photo_list.txt"));
    assert_eq!(store.file_text(&path).as_deref(), Some("a.jpg\nb.jpg\n"));
}

#[tokio::test]
async fn test_create_list_then_diff_is_clean() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/b.png", "");
    let manager = manager(&store);

    let list = manager
        .create_list_file(Path::new("/photos"), Some(Path::new("/lists/photos.txt")))
        .await
        .unwrap();
    let baseline = manager.manifest_baseline(list);
    let report = manager.diff(&baseline, Path::new("/photos")).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.matched, 2);
}

#[tokio::test]
async fn test_diff_scenario_writes_both_reports() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/manifest.txt", "file1.jpg\nfile2.jpg\n");
    store.add_file("/photos/file2.jpg", "");
    store.add_file("/photos/file3.jpg", "");
    let manager = manager(&store);

    let baseline = manager.manifest_baseline("/manifest.txt");
    let report = manager.diff(&baseline, Path::new("/photos")).await.unwrap();
    assert_eq!(report.missing_in_target, vec!["file1.jpg"]);
    assert_eq!(report.missing_in_baseline, vec!["file3.jpg"]);

    let files = manager.write_diff_reports(&report, None).await.unwrap();
    assert_eq!(files.baseline, Path::new("/reports/baseline_diff.txt"));
    assert_eq!(files.target, Path::new("/reports/target_diff.txt"));
    assert_eq!(store.file_text(&files.baseline).as_deref(), Some("file3.jpg\n"));
    assert_eq!(store.file_text(&files.target).as_deref(), Some("file1.jpg\n"));
}

#[tokio::test]
async fn test_diff_reports_with_custom_name() {
    let store = Arc::new(MemoryStore::new());
    store.add_dir("/photos");
    let manager = manager(&store);

    let report = manager.diff(&NameSet::new(), Path::new("/photos")).await.unwrap();
    let files = manager.write_diff_reports(&report, Some("june.txt")).await.unwrap();

    assert_eq!(files.baseline, Path::new("/reports/june_baseline.txt"));
    assert_eq!(files.target, Path::new("/reports/june_target.txt"));
    // Empty reports are still written
    assert_eq!(store.file_text(&files.baseline).as_deref(), Some(""));
}

#[tokio::test]
async fn test_diff_empty_manifest_and_populated_folder() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/manifest.txt", "");
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/b.jpg", "");
    let manager = manager(&store);

    let baseline = manager.manifest_baseline("/manifest.txt");
    let report = manager.diff(&baseline, Path::new("/photos")).await.unwrap();
    assert_eq!(report.missing_in_baseline, vec!["a.jpg", "b.jpg"]);
    assert!(report.missing_in_target.is_empty());
}

#[tokio::test]
async fn test_images_only_from_config() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/desktop.ini", "");
    let dyn_store: Arc<dyn PhotoStore> = store.clone();
    let config = Config {
        image_extensions_only: true,
        ..config()
    };
    let manager = PhotoManager::new(dyn_store, config).unwrap();

    let report = manager.diff(&NameSet::new(), Path::new("/photos")).await.unwrap();
    assert_eq!(report.missing_in_baseline, vec!["a.jpg"]);
}

#[tokio::test]
async fn test_missing_folder_rejected_before_manifest() {
    let store = Arc::new(MemoryStore::new());
    let manager = manager(&store);
    let baseline = manager.manifest_baseline("/missing.txt");

    let err = manager.diff(&baseline, Path::new("/nowhere")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFolderPath);

    let err = manager.clean(&baseline, Path::new("/nowhere")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFolderPath);

    let err = manager
        .create_list_file(Path::new("/nowhere"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFolderPath);

    assert_eq!(store.mutation_count(), 0);
}

#[tokio::test]
async fn test_missing_manifest_rejected() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    let manager = manager(&store);
    let baseline = manager.manifest_baseline("/missing.txt");

    let err = manager.clean(&baseline, Path::new("/photos")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidManifest);
    assert!(err.kind().is_rejection());
    assert!(store.contains_file("/photos/a.jpg"));
    assert_eq!(store.mutation_count(), 0);
}

#[tokio::test]
async fn test_clean_scenario_and_removed_report() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/manifest.txt", "file1.jpg\n");
    store.add_file("/photos/file1.jpg", "");
    store.add_file("/photos/file2.jpg", "");
    let manager = manager(&store);

    let baseline = manager.manifest_baseline("/manifest.txt");
    let report = manager.clean(&baseline, Path::new("/photos")).await.unwrap();
    assert_eq!(report.removed_names().collect::<Vec<_>>(), vec!["file2.jpg"]);

    let path = manager.write_removed_report(&report).await.unwrap();
    assert_eq!(path, Path::new("/reports/removed_files.txt"));
    assert_eq!(store.file_text(&path).as_deref(), Some("file2.jpg\n"));
    assert!(store.contains_file("/photos/file1.jpg"));
    assert!(store.contains_file("/photos/temp_removed/file2.jpg"));
}

#[tokio::test]
async fn test_report_write_failure() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.deny("/reports");

    let err = manager(&store)
        .create_list_file(Path::new("/photos"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WriteFailure);
}

#[tokio::test]
async fn test_custom_quarantine_name() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    let dyn_store: Arc<dyn PhotoStore> = store.clone();
    let config = Config {
        quarantine_dir: "_trash".to_string(),
        ..config()
    };
    let manager = PhotoManager::new(dyn_store, config).unwrap();

    manager.clean(&NameSet::new(), Path::new("/photos")).await.unwrap();
    assert!(store.contains_file("/photos/_trash/a.jpg"));

    let names = manager.create_list(Path::new("/photos")).await.unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let store: Arc<dyn PhotoStore> = Arc::new(MemoryStore::new());
    let config = Config {
        quarantine_dir: String::new(),
        ..config()
    };
    let err = PhotoManager::new(store, config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_catalog_records_listing_and_removals() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/album/b.jpg", "");
    let dyn_store: Arc<dyn PhotoStore> = store.clone();

    let catalog = Arc::new(
        CatalogRepository::open(Arc::clone(&dyn_store), "/catalog.json")
            .await
            .unwrap(),
    );
    let manager = PhotoManager::new(dyn_store, config())
        .unwrap()
        .with_catalog(Arc::clone(&catalog));

    manager.create_list(Path::new("/photos")).await.unwrap();
    let rows = catalog.get_all().await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.device_name == "local" && r.is_active()));
    assert_eq!(catalog.get_by_album("/photos/album").await.len(), 1);

    // Listing twice does not duplicate rows
    manager.create_list(Path::new("/photos")).await.unwrap();
    assert_eq!(catalog.get_all().await.len(), 2);

    let baseline: NameSet = ["a.jpg"].into_iter().collect();
    manager.clean(&baseline, Path::new("/photos")).await.unwrap();

    let removed = catalog.get_by_status(FileStatus::Removed).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].full_name(), "b.jpg");
    assert!(store.contains_file("/catalog.json"));
}

#[tokio::test]
async fn test_catalog_as_baseline() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/b.jpg", "");
    let dyn_store: Arc<dyn PhotoStore> = store.clone();

    let catalog = Arc::new(
        CatalogRepository::open(Arc::clone(&dyn_store), "/catalog.json")
            .await
            .unwrap(),
    );
    let manager = PhotoManager::new(dyn_store, config())
        .unwrap()
        .with_catalog(Arc::clone(&catalog));
    manager.create_list(Path::new("/photos")).await.unwrap();

    store.add_file("/photos/c.jpg", "");
    let report = manager.diff(&catalog, Path::new("/photos")).await.unwrap();
    assert_eq!(report.missing_in_baseline, vec!["c.jpg"]);
    assert!(report.missing_in_target.is_empty());

    let clean = manager.clean(&catalog, Path::new("/photos")).await.unwrap();
    assert_eq!(clean.removed_names().collect::<Vec<_>>(), vec!["c.jpg"]);
}

#[tokio::test]
async fn test_write_lines_matches_manifest_file() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/b.jpg", "");
    let manager = manager(&store);

    let names = manager.create_list(Path::new("/photos")).await.unwrap();
    let mut sink: Vec<u8> = Vec::new();
    ManifestHandler::write_lines(&mut sink, &names).await.unwrap();

    let path = manager.create_list_file(Path::new("/photos"), None).await.unwrap();
    assert_eq!(store.file_text(path), Some(String::from_utf8(sink).unwrap()));
}

#[tokio::test]
async fn test_partial_clean_marks_moved_rows_removed() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/photos/a.jpg", "");
    store.add_file("/photos/b.jpg", "");
    let dyn_store: Arc<dyn PhotoStore> = store.clone();

    let catalog = Arc::new(
        CatalogRepository::open(Arc::clone(&dyn_store), "/catalog.json")
            .await
            .unwrap(),
    );
    let manager = PhotoManager::new(dyn_store, config())
        .unwrap()
        .with_catalog(Arc::clone(&catalog));
    manager.create_list(Path::new("/photos")).await.unwrap();
    store.mark_busy("b.jpg");

    let err = manager.clean(&NameSet::new(), Path::new("/photos")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MoveFailure);
    assert!(store.contains_file("/photos/temp_removed/a.jpg"));

    let active: Vec<String> = catalog
        .get_by_status(FileStatus::Active)
        .await
        .iter()
        .map(|r| r.full_name())
        .collect();
    assert_eq!(active, vec!["b.jpg".to_string()]);
    let removed = catalog.get_by_status(FileStatus::Removed).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].full_name(), "a.jpg");
}

#[tokio::test]
async fn test_folder_rejected_before_request_manifest_is_sanitized() {
    let store = Arc::new(MemoryStore::new());
    store.add_dir("/photos");
    let manager = manager(&store);
    let baseline = manager.request_baseline("/lists/bad|name.txt");

    let err = manager.diff(&baseline, Path::new("/nowhere")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFolderPath);
    let err = manager.clean(&baseline, Path::new("/nowhere")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFolderPath);

    // With a valid folder the manifest path itself is rejected
    let err = manager.diff(&baseline, Path::new("/photos")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidManifest);
    assert_eq!(store.mutation_count(), 0);
}

#[tokio::test]
async fn test_request_manifest_is_decoded() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/lists/my list.txt", "a.jpg\n");
    store.add_file("/photos/a.jpg", "");
    let manager = manager(&store);

    let baseline = manager.request_baseline(" \"/lists/my%20list.txt\" ");
    let report = manager.diff(&baseline, Path::new("/photos")).await.unwrap();
    assert!(report.is_clean());
}
