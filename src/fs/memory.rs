//! In-memory implementation of [`PhotoStore`].
//!
//! Used by tests to exercise the core without touching disk, with hooks to
//! inject the failures a real filesystem produces (files in use, denied
//! directories).

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::fs::backend::{PhotoStore, StoreKind};

#[derive(Debug, Default)]
struct MemoryState {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    denied: HashSet<PathBuf>,
    busy_names: HashSet<String>,
    mutations: usize,
}

impl MemoryState {
    fn check_access(&self, path: &Path) -> io::Result<()> {
        if self.denied.iter().any(|denied| path.starts_with(denied)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("access denied: {}", path.display()),
            ));
        }
        Ok(())
    }

    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such file or directory: {}", path.display()),
        )
    }
}

/// Thread-safe in-memory filesystem
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not hide the state from later assertions
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a directory and its ancestors
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state.add_ancestors(path);
        state.dirs.insert(path.to_path_buf());
    }

    /// Create a file (and its parent directories) with the given contents
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state.add_ancestors(path);
        state.files.insert(path.to_path_buf(), contents.into());
    }

    /// Make every operation under `path` fail with `PermissionDenied`
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.lock().denied.insert(path.as_ref().to_path_buf());
    }

    /// Make moves of any file with this bare name fail as if the file were in use
    pub fn mark_busy(&self, name: impl Into<String>) {
        self.lock().busy_names.insert(name.into());
    }

    pub fn contains_file(&self, path: impl AsRef<Path>) -> bool {
        self.lock().files.contains_key(path.as_ref())
    }

    pub fn contains_dir(&self, path: impl AsRef<Path>) -> bool {
        self.lock().dirs.contains(path.as_ref())
    }

    /// Contents of a file as UTF-8 text
    pub fn file_text(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock()
            .files
            .get(path.as_ref())
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }

    /// Number of mutating calls (writes, directory creations, moves) served so far
    pub fn mutation_count(&self) -> usize {
        self.lock().mutations
    }
}

#[async_trait::async_trait]
impl PhotoStore for MemoryStore {
    async fn dir_exists(&self, path: &Path) -> io::Result<bool> {
        let state = self.lock();
        state.check_access(path)?;
        Ok(state.dirs.contains(path))
    }

    async fn file_exists(&self, path: &Path) -> io::Result<bool> {
        let state = self.lock();
        state.check_access(path)?;
        Ok(state.files.contains_key(path))
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let state = self.lock();
        state.check_access(path)?;
        if state.dirs.contains(path) || state.files.contains_key(path) {
            Ok(path.to_path_buf())
        } else {
            Err(MemoryState::not_found(path))
        }
    }

    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.lock();
        state.check_access(dir)?;
        if !state.dirs.contains(dir) {
            return Err(MemoryState::not_found(dir));
        }
        Ok(state
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect())
    }

    async fn list_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.lock();
        state.check_access(dir)?;
        if !state.dirs.contains(dir) {
            return Err(MemoryState::not_found(dir));
        }
        Ok(state
            .dirs
            .iter()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect())
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.lock();
        state.check_access(path)?;
        let data = state
            .files
            .get(path)
            .ok_or_else(|| MemoryState::not_found(path))?;
        String::from_utf8(data.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        state.check_access(path)?;
        state.add_ancestors(path);
        state.files.insert(path.to_path_buf(), data.to_vec());
        state.mutations += 1;
        Ok(())
    }

    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.check_access(path)?;
        if state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("a file already exists at {}", path.display()),
            ));
        }
        state.add_ancestors(path);
        state.dirs.insert(path.to_path_buf());
        state.mutations += 1;
        Ok(())
    }

    async fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.check_access(from)?;
        state.check_access(to)?;

        let name = from
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if state.busy_names.contains(&name) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("file is in use: {}", from.display()),
            ));
        }
        if state.files.contains_key(to) || state.dirs.contains(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("destination already exists: {}", to.display()),
            ));
        }
        if !to.parent().is_some_and(|parent| state.dirs.contains(parent)) {
            return Err(MemoryState::not_found(to));
        }

        let data = state
            .files
            .remove(from)
            .ok_or_else(|| MemoryState::not_found(from))?;
        state.files.insert(to.to_path_buf(), data);
        state.mutations += 1;
        Ok(())
    }

    fn store_kind(&self) -> StoreKind {
        StoreKind::Memory
    }
}
