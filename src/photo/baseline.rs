// Baseline providers
// Anything that can supply the set of expected file names

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::error::PhotoError;
use super::manifest::ManifestHandler;
use super::names::NameSet;
use super::path_utils;
use crate::fs::PhotoStore;

/// Source of the "known/expected" name set
///
/// The reconciler and quarantine executor only see the loaded [`NameSet`],
/// so a manifest file and the photo catalog are interchangeable.
#[async_trait]
pub trait BaselineSource: Send + Sync {
    /// Load the current baseline
    async fn load(&self) -> Result<NameSet, PhotoError>;

    /// Human-readable origin, used in logs and summaries
    fn describe(&self) -> String;
}

/// Baseline read from a manifest file
pub struct ManifestBaseline {
    store: Arc<dyn PhotoStore>,
    path: PathBuf,
    untrusted: bool,
}

impl ManifestBaseline {
    pub fn new(store: Arc<dyn PhotoStore>, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
            untrusted: false,
        }
    }

    /// Manifest named by a raw request string, sanitized on load
    pub fn from_request(store: Arc<dyn PhotoStore>, raw: &str) -> Self {
        Self {
            store,
            path: PathBuf::from(raw),
            untrusted: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self) -> Result<PathBuf, PhotoError> {
        if !self.untrusted {
            return Ok(self.path.clone());
        }
        let raw = self.path.to_string_lossy();
        path_utils::sanitize_request_path(&raw).map_err(|rejection| PhotoError::ManifestUnreadable {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, rejection),
        })
    }
}

#[async_trait]
impl BaselineSource for ManifestBaseline {
    async fn load(&self) -> Result<NameSet, PhotoError> {
        let path = self.resolve()?;
        ManifestHandler::read(self.store.as_ref(), &path).await
    }

    fn describe(&self) -> String {
        format!("manifest {}", self.path.display())
    }
}

/// A fixed set of names held in memory
#[async_trait]
impl BaselineSource for NameSet {
    async fn load(&self) -> Result<NameSet, PhotoError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory names", self.len())
    }
}

/// Shared providers, e.g. a catalog also attached to a manager
#[async_trait]
impl<T: BaselineSource + ?Sized> BaselineSource for Arc<T> {
    async fn load(&self) -> Result<NameSet, PhotoError> {
        (**self).load().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
