use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::photo::path_utils;

/// Lifecycle state of a catalog row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum FileStatus {
    Active,
    Removed,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Active => write!(f, "Active"),
            FileStatus::Removed => write!(f, "Removed"),
        }
    }
}

/// One photo known to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: i64,
    pub device_name: String,
    /// Directory the file was found in
    pub album_name: String,
    /// File name without extension
    pub file_name: String,
    /// Extension including the leading dot, empty if none
    pub file_extension: String,
    pub file_status: FileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PhotoRecord {
    /// Bare file name used for baseline comparison
    pub fn full_name(&self) -> String {
        format!("{}{}", self.file_name, self.file_extension)
    }

    pub fn is_active(&self) -> bool {
        self.file_status == FileStatus::Active
    }

    /// True if `other` describes the same file on the same device
    pub fn same_file(&self, other: &NewPhoto) -> bool {
        self.device_name == other.device_name
            && self.album_name == other.album_name
            && self.file_name == other.file_name
            && self.file_extension == other.file_extension
    }
}

/// Data for a row that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub device_name: String,
    pub album_name: String,
    pub file_name: String,
    pub file_extension: String,
}

impl NewPhoto {
    /// Describe a file found in `album` under its bare `name`
    pub fn from_name(device_name: &str, album: &str, name: &str) -> Self {
        let (file_name, file_extension) = path_utils::split_name(name);
        Self {
            device_name: device_name.to_string(),
            album_name: album.to_string(),
            file_name,
            file_extension,
        }
    }
}
