use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::fs::backend::{PhotoStore, StoreKind};

/// Local filesystem store backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        LocalStore
    }

    /// Map "not found" to `Ok(None)` and keep every other error
    async fn probe(path: &Path) -> io::Result<Option<std::fs::Metadata>> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Entries of `dir` filtered by file type, sorted by name
    async fn list_entries(dir: &Path, want_dirs: bool) -> io::Result<Vec<PathBuf>> {
        let mut read_dir = fs::read_dir(dir).await?;
        let mut entries = Vec::new();

        while let Some(entry) = read_dir.next_entry().await? {
            // Symbolic links are neither followed nor reported
            let file_type = entry.file_type().await?;
            let keep = if want_dirs {
                file_type.is_dir()
            } else {
                file_type.is_file()
            };
            if keep {
                entries.push(entry.path());
            }
        }

        entries.sort();
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl PhotoStore for LocalStore {
    async fn dir_exists(&self, path: &Path) -> io::Result<bool> {
        Ok(Self::probe(path).await?.is_some_and(|m| m.is_dir()))
    }

    async fn file_exists(&self, path: &Path) -> io::Result<bool> {
        Ok(Self::probe(path).await?.is_some_and(|m| m.is_file()))
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path).await
    }

    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Self::list_entries(dir, false).await
    }

    async fn list_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Self::list_entries(dir, true).await
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path).await
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).await?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        // Each call gets its own temp file, so concurrent writers never share one
        let dest = path.to_path_buf();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut temp = tempfile::Builder::new()
                .prefix(".fotolist-")
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            temp.write_all(&data)?;
            temp.as_file().sync_all()?;
            temp.persist(&dest).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path).await
    }

    async fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        // link(2) refuses an existing destination, unlike rename(2)
        match fs::hard_link(from, to).await {
            Ok(()) => {
                if let Err(e) = fs::remove_file(from).await {
                    let _ = fs::remove_file(to).await;
                    return Err(e);
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(e),
            Err(e) => {
                // Filesystems without hard links fall back to probe-then-rename
                debug!(from = %from.display(), error = %e, "hard link unavailable, renaming");
                if Self::probe(to).await?.is_some() {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("destination already exists: {}", to.display()),
                    ));
                }
                fs::rename(from, to).await
            }
        }
    }

    fn store_kind(&self) -> StoreKind {
        StoreKind::Local
    }
}
