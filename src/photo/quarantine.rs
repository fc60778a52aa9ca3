// Quarantine module
// Moves files that the baseline no longer references into a reserved folder

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::error::PhotoError;
use super::lister::require_directory;
use super::names::NameSet;
use super::path_utils;
use crate::fs::PhotoStore;

/// Advisory locks keyed by canonical root path
///
/// Clean runs against the same root are serialized; runs against different
/// roots proceed independently. Cloning shares the underlying lock table.
/// An entry lives only while a run holds or waits for it.
#[derive(Debug, Clone, Default)]
pub struct RootLocks {
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl RootLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `root`
    pub async fn acquire(&self, root: &Path) -> RootGuard {
        let lock = self
            .locks
            .entry(root.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        RootGuard {
            guard: Some(lock.lock_owned().await),
            root: root.to_path_buf(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of roots currently locked or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive hold on one root, released on drop
#[derive(Debug)]
pub struct RootGuard {
    guard: Option<OwnedMutexGuard<()>>,
    root: PathBuf,
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Drop for RootGuard {
    fn drop(&mut self) {
        // Release first so the table holds the only remaining reference
        self.guard.take();
        // Waiters hold a clone of the mutex, which keeps their entry alive
        self.locks
            .remove_if(&self.root, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// One relocated file
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QuarantinedFile {
    pub name: String,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of a clean run
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CleanReport {
    pub root: PathBuf,
    pub directories_visited: usize,
    pub files_kept: usize,
    pub moved: Vec<QuarantinedFile>,
}

impl CleanReport {
    /// Bare names of moved files in the order they were moved
    pub fn removed_names(&self) -> impl Iterator<Item = &str> {
        self.moved.iter().map(|file| file.name.as_str())
    }

    pub fn removed_count(&self) -> usize {
        self.moved.len()
    }
}

/// Engine that quarantines files absent from a baseline
///
/// The run is not transactional: if a move fails, files moved before it
/// stay in quarantine and the error reports how many there were.
pub struct QuarantineEngine {
    store: Arc<dyn PhotoStore>,
    quarantine_dir: String,
    locks: RootLocks,
}

impl QuarantineEngine {
    pub fn new(store: Arc<dyn PhotoStore>, quarantine_dir: impl Into<String>) -> Self {
        Self::with_locks(store, quarantine_dir, RootLocks::new())
    }

    /// Create an engine sharing an existing lock table
    pub fn with_locks(
        store: Arc<dyn PhotoStore>,
        quarantine_dir: impl Into<String>,
        locks: RootLocks,
    ) -> Self {
        Self {
            store,
            quarantine_dir: quarantine_dir.into(),
            locks,
        }
    }

    pub fn locks(&self) -> &RootLocks {
        &self.locks
    }

    fn is_quarantine(&self, dir: &Path) -> bool {
        path_utils::file_name_of(dir).is_some_and(|name| name == self.quarantine_dir)
    }

    /// Move every file under `root` whose bare name is not in `baseline` into
    /// a quarantine folder created next to it
    ///
    /// # Errors
    /// `InvalidFolderPath` before anything is touched if `root` is not a
    /// directory. `MoveFailure` aborts the run at the first file that cannot
    /// be relocated and lists the names moved before it.
    ///
    /// A file named like the quarantine folder is never moved. Any other
    /// unlisted file in that directory still fails, since the folder cannot
    /// be created next to it.
    pub async fn clean(&self, root: &Path, baseline: &NameSet) -> Result<CleanReport, PhotoError> {
        require_directory(self.store.as_ref(), root).await?;

        let key = self
            .store
            .canonicalize(root)
            .await
            .map_err(|e| PhotoError::from_io_error(e, "resolving folder", root))?;
        let _guard = self.locks.acquire(&key).await;
        debug!(root = %key.display(), "acquired root lock");

        let mut report = CleanReport {
            root: root.to_path_buf(),
            ..CleanReport::default()
        };
        let mut to_visit = vec![root.to_path_buf()];

        while let Some(dir) = to_visit.pop() {
            self.clean_directory(&dir, baseline, &mut report).await?;

            let subdirs = self
                .store
                .list_dirs(&dir)
                .await
                .map_err(|e| PhotoError::from_io_error(e, "listing directories in", &dir))?;
            for subdir in subdirs.into_iter().rev() {
                if !self.is_quarantine(&subdir) {
                    to_visit.push(subdir);
                }
            }
            report.directories_visited += 1;
        }

        info!(
            root = %root.display(),
            moved = report.removed_count(),
            kept = report.files_kept,
            directories = report.directories_visited,
            "clean complete"
        );
        Ok(report)
    }

    /// Handle the files directly inside one directory
    async fn clean_directory(
        &self,
        dir: &Path,
        baseline: &NameSet,
        report: &mut CleanReport,
    ) -> Result<(), PhotoError> {
        let files = self
            .store
            .list_files(dir)
            .await
            .map_err(|e| PhotoError::from_io_error(e, "listing files in", dir))?;

        let quarantine = dir.join(&self.quarantine_dir);
        for file in files {
            let Some(name) = path_utils::file_name_of(&file) else {
                continue;
            };
            if baseline.contains(&name) {
                report.files_kept += 1;
                continue;
            }
            if name == self.quarantine_dir {
                // A file holding the reserved name blocks the quarantine folder itself
                warn!(file = %file.display(), "file uses the quarantine folder name, left in place");
                continue;
            }

            let target = quarantine.join(&name);
            let moved = report.removed_count();
            let fail = |source| PhotoError::MoveFailure {
                from: file.clone(),
                to: target.clone(),
                moved,
                quarantined: report.removed_names().map(str::to_string).collect(),
                source,
            };

            self.store.create_dir(&quarantine).await.map_err(fail)?;
            if let Err(e) = self.store.move_file(&file, &target).await {
                warn!(file = %file.display(), error = %e, moved, "move into quarantine failed");
                return Err(fail(e));
            }

            debug!(name = %name, dir = %dir.display(), "quarantined");
            report.moved.push(QuarantinedFile {
                name,
                from: file,
                to: target,
            });
        }
        Ok(())
    }
}
