//! Configuration loading.
//!
//! Settings come from a TOML file; every key is optional and falls back to
//! the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::photo::compare::{DiffOptions, DEFAULT_IMAGE_EXTENSIONS};
use crate::photo::error::PhotoError;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "FOTOLIST_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reserved folder name that holds quarantined files
    pub quarantine_dir: String,
    /// Where report files are written; the system temp directory if unset
    pub report_dir: Option<PathBuf>,
    pub list_file_name: String,
    pub baseline_report_name: String,
    pub target_report_name: String,
    pub removed_report_name: String,
    /// Restrict "missing in baseline" to image extensions
    pub image_extensions_only: bool,
    pub image_extensions: Vec<String>,
    /// Device recorded on catalog rows
    pub device_name: String,
    /// JSON photo catalog; catalog features are off if unset
    pub catalog_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quarantine_dir: "temp_removed".to_string(),
            report_dir: None,
            list_file_name: "photo_list.txt".to_string(),
            baseline_report_name: "baseline_diff.txt".to_string(),
            target_report_name: "target_diff.txt".to_string(),
            removed_report_name: "removed_files.txt".to_string(),
            image_extensions_only: false,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            device_name: "local".to_string(),
            catalog_path: None,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/fotolist/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fotolist").join("config.toml"))
    }

    /// Load configuration
    ///
    /// An explicit path (argument, then `FOTOLIST_CONFIG`) must exist. The
    /// default location is optional and yields defaults when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, PhotoError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        if let Some(path) = explicit.map(Path::to_path_buf).or(from_env) {
            return Self::from_file(&path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("no configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse and validate one TOML file
    pub fn from_file(path: &Path) -> Result<Self, PhotoError> {
        let text = std::fs::read_to_string(path).map_err(|e| PhotoError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml(&text).map_err(|reason| PhotoError::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        debug!(config = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let name = self.quarantine_dir.trim();
        if name.is_empty() {
            return Err("quarantine_dir must not be empty".to_string());
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(format!("quarantine_dir '{}' must be a single folder name", name));
        }

        for (key, value) in [
            ("list_file_name", &self.list_file_name),
            ("baseline_report_name", &self.baseline_report_name),
            ("target_report_name", &self.target_report_name),
            ("removed_report_name", &self.removed_report_name),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", key));
            }
        }

        if self.image_extensions_only && self.image_extensions.is_empty() {
            return Err("image_extensions_only is set but image_extensions is empty".to_string());
        }
        Ok(())
    }

    /// Directory for report files
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Reconciler options derived from this configuration
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            image_extensions_only: self.image_extensions_only,
            image_extensions: self.image_extensions.clone(),
        }
    }
}
