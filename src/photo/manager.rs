// Photo manager service
// The create-list, diff and clean operations exposed to the request layer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::baseline::{BaselineSource, ManifestBaseline};
use super::compare::{DiffEngine, DiffReport};
use super::error::PhotoError;
use super::lister::{require_directory, ListProgress, TreeLister};
use super::manifest::ManifestHandler;
use super::names::NameSet;
use super::path_utils;
use super::quarantine::{CleanReport, QuarantineEngine, RootLocks};
use crate::catalog::{CatalogRepository, NewPhoto};
use crate::config::Config;
use crate::fs::PhotoStore;

/// Locations of the two diff report files
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DiffReportFiles {
    /// Names found on disk that the baseline does not list
    pub baseline: PathBuf,
    /// Names the baseline lists that were not found on disk
    pub target: PathBuf,
}

/// Entry point for the three logical operations
pub struct PhotoManager {
    store: Arc<dyn PhotoStore>,
    config: Config,
    lister: TreeLister,
    quarantine: QuarantineEngine,
    diff_engine: DiffEngine,
    catalog: Option<Arc<CatalogRepository>>,
}

impl PhotoManager {
    /// Create a manager over `store`
    ///
    /// # Errors
    /// Returns a `Config` error if the configuration does not validate
    pub fn new(store: Arc<dyn PhotoStore>, config: Config) -> Result<Self, PhotoError> {
        config.validate().map_err(|reason| PhotoError::Config {
            path: PathBuf::from("<config>"),
            reason,
        })?;
        let diff_engine = DiffEngine::with_options(&config.diff_options())?;
        let lister = TreeLister::new(Arc::clone(&store), config.quarantine_dir.clone());
        let quarantine = QuarantineEngine::new(Arc::clone(&store), config.quarantine_dir.clone());
        debug!(
            store = store.store_kind().short_name(),
            quarantine_dir = %config.quarantine_dir,
            "photo manager ready"
        );

        Ok(Self {
            store,
            config,
            lister,
            quarantine,
            diff_engine,
            catalog: None,
        })
    }

    /// Record listings in, and quarantine results to, a photo catalog
    pub fn with_catalog(mut self, catalog: Arc<CatalogRepository>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Share root locks with other managers over the same folders
    pub fn with_locks(mut self, locks: RootLocks) -> Self {
        self.quarantine = QuarantineEngine::with_locks(
            Arc::clone(&self.store),
            self.config.quarantine_dir.clone(),
            locks,
        );
        self
    }

    /// Report listing progress once per directory
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ListProgress) + Send + Sync + 'static,
    {
        self.lister = TreeLister::new(Arc::clone(&self.store), self.config.quarantine_dir.clone())
            .with_progress_callback(callback);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn PhotoStore> {
        Arc::clone(&self.store)
    }

    pub fn catalog(&self) -> Option<&Arc<CatalogRepository>> {
        self.catalog.as_ref()
    }

    /// Baseline backed by a manifest file in this manager's store
    pub fn manifest_baseline(&self, path: impl Into<PathBuf>) -> ManifestBaseline {
        ManifestBaseline::new(Arc::clone(&self.store), path)
    }

    /// Baseline for an untrusted manifest path from the request layer
    ///
    /// The path is sanitized when the baseline is loaded, after `diff` or
    /// `clean` has validated the folder.
    pub fn request_baseline(&self, raw: &str) -> ManifestBaseline {
        ManifestBaseline::from_request(Arc::clone(&self.store), raw)
    }

    /// List every file name under `folder`
    ///
    /// With a catalog attached, each file found is also recorded as an
    /// active catalog row.
    pub async fn create_list(&self, folder: &Path) -> Result<NameSet, PhotoError> {
        let entries = self.lister.list_entries(folder).await?;

        if let Some(ref catalog) = self.catalog {
            let photos = entries
                .iter()
                .map(|entry| {
                    NewPhoto::from_name(
                        &self.config.device_name,
                        &entry.dir.display().to_string(),
                        &entry.name,
                    )
                })
                .collect();
            catalog.add_photos(photos).await?;
        }

        let names: NameSet = entries.into_iter().map(|entry| entry.name).collect();
        info!(folder = %folder.display(), names = names.len(), "list created");
        Ok(names)
    }

    /// List `folder` and write the result as a manifest
    /// Defaults to `<report dir>/<list file name>`; returns the path written
    pub async fn create_list_file(&self, folder: &Path, dest: Option<&Path>) -> Result<PathBuf, PhotoError> {
        let names = self.create_list(folder).await?;
        let dest = dest
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.report_dir().join(&self.config.list_file_name));
        ManifestHandler::write(self.store.as_ref(), &dest, &names).await
    }

    /// Compare a baseline with the names currently under `folder`
    ///
    /// The folder is validated before the baseline is loaded, so a bad
    /// folder is reported as such even when the manifest is also missing.
    pub async fn diff(&self, baseline: &dyn BaselineSource, folder: &Path) -> Result<DiffReport, PhotoError> {
        require_directory(self.store.as_ref(), folder).await?;
        let expected = baseline.load().await?;
        let found = self.lister.list(folder).await?;

        info!(baseline = %baseline.describe(), folder = %folder.display(), "diff started");
        Ok(self.diff_engine.diff(&expected, &found))
    }

    /// Write both halves of a diff report
    ///
    /// With `report_name` = `x.ext` the files are `x_baseline.ext` and
    /// `x_target.ext`; otherwise the configured names are used.
    pub async fn write_diff_reports(
        &self,
        report: &DiffReport,
        report_name: Option<&str>,
    ) -> Result<DiffReportFiles, PhotoError> {
        let dir = self.config.report_dir();
        let (baseline_name, target_name) = match report_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => (
                path_utils::suffixed_name(name, "baseline"),
                path_utils::suffixed_name(name, "target"),
            ),
            None => (
                self.config.baseline_report_name.clone(),
                self.config.target_report_name.clone(),
            ),
        };

        let baseline = ManifestHandler::write(
            self.store.as_ref(),
            &dir.join(baseline_name),
            report.missing_in_baseline.iter().map(String::as_str),
        )
        .await?;
        let target = ManifestHandler::write(
            self.store.as_ref(),
            &dir.join(target_name),
            report.missing_in_target.iter().map(String::as_str),
        )
        .await?;

        Ok(DiffReportFiles { baseline, target })
    }

    /// Quarantine every file under `folder` that the baseline does not list
    ///
    /// With a catalog attached, rows for the moved names are marked removed,
    /// including the names moved before a `MoveFailure`.
    pub async fn clean(&self, baseline: &dyn BaselineSource, folder: &Path) -> Result<CleanReport, PhotoError> {
        require_directory(self.store.as_ref(), folder).await?;
        let expected = baseline.load().await?;

        info!(baseline = %baseline.describe(), folder = %folder.display(), "clean started");
        let report = match self.quarantine.clean(folder, &expected).await {
            Ok(report) => report,
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "clean aborted");
                if let PhotoError::MoveFailure { ref quarantined, .. } = e {
                    self.record_partial_clean(quarantined).await;
                }
                return Err(e);
            }
        };

        if let Some(ref catalog) = self.catalog {
            catalog.mark_removed(report.removed_names()).await?;
        }
        Ok(report)
    }

    /// Keep the catalog in step with moves made before a clean run failed
    /// The move error is what the caller sees, so a catalog error is only logged
    async fn record_partial_clean(&self, quarantined: &[String]) {
        let Some(ref catalog) = self.catalog else {
            return;
        };
        if let Err(e) = catalog.mark_removed(quarantined.iter().map(String::as_str)).await {
            warn!(error = %e, moved = quarantined.len(), "catalog not updated after partial clean");
        }
    }

    /// Write the removed-names report to `<report dir>/<removed report name>`
    pub async fn write_removed_report(&self, report: &CleanReport) -> Result<PathBuf, PhotoError> {
        let dest = self.config.report_dir().join(&self.config.removed_report_name);
        ManifestHandler::write(self.store.as_ref(), &dest, report.removed_names()).await
    }
}
