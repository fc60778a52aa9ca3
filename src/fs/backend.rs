use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Backend type information for display and identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Local,
    Memory,
}

impl StoreKind {
    /// Get a short display name for the store
    pub fn short_name(&self) -> &'static str {
        match self {
            StoreKind::Local => "Local",
            StoreKind::Memory => "Memory",
        }
    }
}

/// Filesystem capabilities needed by the photo manifest core
///
/// Probes report "does not exist" as `Ok(false)`; every other failure,
/// permission problems included, is returned as an error.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    // ========== Probes ==========

    /// Check if a path exists and is a directory
    async fn dir_exists(&self, path: &Path) -> io::Result<bool>;

    /// Check if a path exists and is a regular file
    async fn file_exists(&self, path: &Path) -> io::Result<bool>;

    /// Resolve a path to its canonical absolute form
    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    // ========== Listing ==========

    /// Regular files directly inside `dir`, in a stable order
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Subdirectories directly inside `dir`, in a stable order
    async fn list_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    // ========== Content ==========

    /// Read a whole text file
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace `path` with `data` without exposing a partially written file
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    // ========== Mutation ==========

    /// Create a directory and any missing parents; succeeds if it already exists
    async fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Move a file, failing with `AlreadyExists` instead of overwriting
    async fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    // ========== Backend Info ==========

    fn store_kind(&self) -> StoreKind;
}
