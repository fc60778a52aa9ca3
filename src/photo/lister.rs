// Directory listing module
// Depth-first traversal that reports bare file names

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::error::PhotoError;
use super::names::NameSet;
use super::path_utils;
use crate::fs::PhotoStore;

/// A regular file found during a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    /// Bare file name
    pub name: String,
    /// Directory containing the file
    pub dir: PathBuf,
}

/// Progress information for listing operations
#[derive(Debug, Clone, serde::Serialize)]
pub struct ListProgress {
    pub directories_visited: usize,
    pub files_found: usize,
    pub current_dir: String,
}

/// Type alias for progress callback function
pub type ProgressCallback = Box<dyn Fn(ListProgress) + Send + Sync>;

/// Fail with `InvalidFolderPath` unless `root` is an existing directory
///
/// Permission problems while probing are returned as such, not as a
/// missing folder.
pub async fn require_directory(store: &dyn PhotoStore, root: &Path) -> Result<(), PhotoError> {
    if root.as_os_str().is_empty() {
        return Err(PhotoError::invalid_folder(root, "path is empty"));
    }
    let is_dir = store
        .dir_exists(root)
        .await
        .map_err(|e| PhotoError::from_io_error(e, "probing folder", root))?;
    if !is_dir {
        return Err(PhotoError::invalid_folder(
            root,
            "does not exist or is not a directory",
        ));
    }
    Ok(())
}

/// Recursively enumerates files under a root, skipping quarantine folders
pub struct TreeLister {
    store: Arc<dyn PhotoStore>,
    quarantine_dir: String,
    progress_callback: Option<Arc<ProgressCallback>>,
}

impl TreeLister {
    pub fn new(store: Arc<dyn PhotoStore>, quarantine_dir: impl Into<String>) -> Self {
        Self {
            store,
            quarantine_dir: quarantine_dir.into(),
            progress_callback: None,
        }
    }

    /// Set a progress callback function, invoked once per directory
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ListProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Name of the reserved quarantine folder this lister skips
    pub fn quarantine_dir(&self) -> &str {
        &self.quarantine_dir
    }

    /// True if `dir` is a quarantine folder
    pub fn is_quarantine(&self, dir: &Path) -> bool {
        path_utils::file_name_of(dir).is_some_and(|name| name == self.quarantine_dir)
    }

    /// Unique bare names of every regular file under `root`
    ///
    /// # Errors
    /// `InvalidFolderPath` if `root` is missing or not a directory; I/O errors
    /// from any directory in the walk abort the listing.
    pub async fn list(&self, root: &Path) -> Result<NameSet, PhotoError> {
        let entries = self.list_entries(root).await?;
        let total = entries.len();
        let names: NameSet = entries.into_iter().map(|entry| entry.name).collect();

        info!(
            root = %root.display(),
            files = total,
            unique_names = names.len(),
            "folder listed"
        );
        Ok(names)
    }

    /// Every regular file under `root` with its directory, in depth-first order
    ///
    /// Within a directory files come first, then each subdirectory in turn.
    pub async fn list_entries(&self, root: &Path) -> Result<Vec<ListedFile>, PhotoError> {
        require_directory(self.store.as_ref(), root).await?;

        let mut found = Vec::new();
        let mut directories_visited = 0usize;
        let mut to_visit = vec![root.to_path_buf()];

        while let Some(dir) = to_visit.pop() {
            let files = self
                .store
                .list_files(&dir)
                .await
                .map_err(|e| PhotoError::from_io_error(e, "listing files in", &dir))?;
            for file in files {
                if let Some(name) = path_utils::file_name_of(&file) {
                    found.push(ListedFile {
                        name,
                        dir: dir.clone(),
                    });
                }
            }

            let subdirs = self
                .store
                .list_dirs(&dir)
                .await
                .map_err(|e| PhotoError::from_io_error(e, "listing directories in", &dir))?;
            // Reversed so the stack pops them in listing order
            for subdir in subdirs.into_iter().rev() {
                if self.is_quarantine(&subdir) {
                    debug!(dir = %subdir.display(), "skipping quarantine folder");
                    continue;
                }
                to_visit.push(subdir);
            }

            directories_visited += 1;
            if let Some(ref callback) = self.progress_callback {
                callback(ListProgress {
                    directories_visited,
                    files_found: found.len(),
                    current_dir: dir.display().to_string(),
                });
            }
        }

        Ok(found)
    }
}
