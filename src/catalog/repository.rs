use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::record::{FileStatus, NewPhoto, PhotoRecord};
use crate::fs::PhotoStore;
use crate::photo::baseline::BaselineSource;
use crate::photo::error::PhotoError;
use crate::photo::names::NameSet;

/// On-disk layout of the catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    next_id: i64,
    photos: Vec<PhotoRecord>,
}

impl CatalogFile {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Photo catalog persisted as a JSON document through a [`PhotoStore`]
///
/// Every mutating call writes the whole catalog back before returning.
/// Changes are staged on a copy and only become visible once persisted, so a
/// failed write leaves the catalog as it was.
pub struct CatalogRepository {
    store: Arc<dyn PhotoStore>,
    path: PathBuf,
    state: Mutex<CatalogFile>,
}

impl CatalogRepository {
    /// Open the catalog at `path`, starting empty if the file does not exist
    pub async fn open(store: Arc<dyn PhotoStore>, path: impl Into<PathBuf>) -> Result<Self, PhotoError> {
        let path = path.into();
        let exists = store
            .file_exists(&path)
            .await
            .map_err(|e| PhotoError::from_io_error(e, "probing catalog", &path))?;

        let file = if exists {
            let text = store
                .read_to_string(&path)
                .await
                .map_err(|e| PhotoError::from_io_error(e, "reading catalog", &path))?;
            serde_json::from_str(&text).map_err(|e| PhotoError::Catalog {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            debug!(catalog = %path.display(), "catalog not found, starting empty");
            CatalogFile::default()
        };

        Ok(Self {
            store,
            path,
            state: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, file: &CatalogFile) -> Result<(), PhotoError> {
        let data = serde_json::to_vec_pretty(file).map_err(|e| PhotoError::Catalog {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        self.store
            .write_atomic(&self.path, &data)
            .await
            .map_err(|source| PhotoError::WriteFailure {
                path: self.path.clone(),
                source,
            })
    }

    async fn select<F>(&self, predicate: F) -> Vec<PhotoRecord>
    where
        F: Fn(&PhotoRecord) -> bool,
    {
        let state = self.state.lock().await;
        state.photos.iter().filter(|p| predicate(*p)).cloned().collect()
    }

    pub async fn get_all(&self) -> Vec<PhotoRecord> {
        self.select(|_| true).await
    }

    pub async fn get_by_id(&self, id: i64) -> Option<PhotoRecord> {
        self.select(|p| p.id == id).await.into_iter().next()
    }

    pub async fn get_by_device(&self, device_name: &str) -> Vec<PhotoRecord> {
        self.select(|p| p.device_name == device_name).await
    }

    pub async fn get_by_album(&self, album_name: &str) -> Vec<PhotoRecord> {
        self.select(|p| p.album_name == album_name).await
    }

    pub async fn get_by_status(&self, status: FileStatus) -> Vec<PhotoRecord> {
        self.select(|p| p.file_status == status).await
    }

    /// Insert one photo and return the stored row
    pub async fn add_photo(&self, photo: NewPhoto) -> Result<PhotoRecord, PhotoError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let now = Utc::now();
        let record = PhotoRecord {
            id: next.allocate_id(),
            device_name: photo.device_name,
            album_name: photo.album_name,
            file_name: photo.file_name,
            file_extension: photo.file_extension,
            file_status: FileStatus::Active,
            created_at: now,
            updated_at: now,
        };
        next.photos.push(record.clone());
        self.persist(&next).await?;
        *state = next;
        Ok(record)
    }

    /// Record a batch of photos in one write
    ///
    /// A photo already known for the same device, album and name is marked
    /// `Active` again instead of being duplicated. Returns the number of new rows.
    pub async fn add_photos(&self, photos: Vec<NewPhoto>) -> Result<usize, PhotoError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let now = Utc::now();
        let mut inserted = 0;

        for photo in photos {
            if let Some(existing) = next.photos.iter_mut().find(|p| p.same_file(&photo)) {
                if existing.file_status != FileStatus::Active {
                    existing.file_status = FileStatus::Active;
                    existing.updated_at = now;
                }
                continue;
            }

            let id = next.allocate_id();
            next.photos.push(PhotoRecord {
                id,
                device_name: photo.device_name,
                album_name: photo.album_name,
                file_name: photo.file_name,
                file_extension: photo.file_extension,
                file_status: FileStatus::Active,
                created_at: now,
                updated_at: now,
            });
            inserted += 1;
        }

        self.persist(&next).await?;
        *state = next;
        info!(catalog = %self.path.display(), inserted, total = state.photos.len(), "catalog updated");
        Ok(inserted)
    }

    /// Replace the row with the same id; returns false if there is none
    pub async fn update_photo(&self, mut photo: PhotoRecord) -> Result<bool, PhotoError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let Some(slot) = next.photos.iter_mut().find(|p| p.id == photo.id) else {
            return Ok(false);
        };
        photo.updated_at = Utc::now();
        *slot = photo;
        self.persist(&next).await?;
        *state = next;
        Ok(true)
    }

    /// Delete a row by id; returns false if there is none
    pub async fn delete_photo(&self, id: i64) -> Result<bool, PhotoError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        next.photos.retain(|p| p.id != id);
        if next.photos.len() == state.photos.len() {
            return Ok(false);
        }
        self.persist(&next).await?;
        *state = next;
        Ok(true)
    }

    /// Mark every active row whose bare name is in `names` as removed
    /// Returns the number of rows changed
    pub async fn mark_removed<'a, I>(&self, names: I) -> Result<usize, PhotoError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let removed: NameSet = names.into_iter().collect();
        if removed.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let now = Utc::now();
        let mut changed = 0;
        for photo in next.photos.iter_mut() {
            if photo.is_active() && removed.contains(&photo.full_name()) {
                photo.file_status = FileStatus::Removed;
                photo.updated_at = now;
                changed += 1;
            }
        }

        if changed > 0 {
            self.persist(&next).await?;
            *state = next;
        }
        debug!(changed, "catalog rows marked removed");
        Ok(changed)
    }
}

#[async_trait]
impl BaselineSource for CatalogRepository {
    /// Names of all active rows
    async fn load(&self) -> Result<NameSet, PhotoError> {
        let state = self.state.lock().await;
        Ok(state
            .photos
            .iter()
            .filter(|p| p.is_active())
            .map(PhotoRecord::full_name)
            .collect())
    }

    fn describe(&self) -> String {
        format!("catalog {}", self.path.display())
    }
}
