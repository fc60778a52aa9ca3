// Centralized error handling module
// Closed error taxonomy for listing, reconciliation and quarantine

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Machine-checkable category of a [`PhotoError`]
///
/// Callers branch on this rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    /// Folder missing, not a directory, or rejected by the sanitizer
    InvalidFolderPath,
    /// Manifest missing or unreadable
    InvalidManifest,
    /// A report or manifest destination could not be written
    WriteFailure,
    /// A file could not be relocated into quarantine
    MoveFailure,
    /// Access errors while probing filesystem state
    Io,
    /// Configuration could not be loaded or is inconsistent
    Config,
    /// Photo catalog could not be loaded, parsed or persisted
    Catalog,
}

impl ErrorKind {
    /// True for the two categories the request layer reports as a rejected request
    pub fn is_rejection(self) -> bool {
        matches!(self, ErrorKind::InvalidFolderPath | ErrorKind::InvalidManifest)
    }
}

/// Main error type for the photo manifest core
/// Provides context-rich error messages with file paths and operations
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Invalid photo folder path: {}: {reason}\nSuggestion: Check that the folder exists and is a directory", path.display())]
    InvalidFolderPath { path: PathBuf, reason: String },

    #[error("Manifest not found: {}\nSuggestion: Create a manifest first using the 'create-list' command", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("Manifest could not be read: {}: {source}\nSuggestion: Check that the manifest is a readable UTF-8 text file", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}\nSuggestion: Check disk space and write permissions", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Failed to move {} to {} after {moved} file(s) were already quarantined: {source}\nSuggestion: Check that the file is not in use and that no file with the same name is already quarantined",
        from.display(),
        to.display()
    )]
    MoveFailure {
        from: PathBuf,
        to: PathBuf,
        moved: usize,
        /// Bare names already relocated by this run, in move order
        quarantined: Vec<String>,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied while {operation}: {}\nSuggestion: Check file permissions or run with appropriate privileges", path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("I/O error while {operation} {}: {source}\nSuggestion: Check file permissions and disk space", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration {}: {reason}\nSuggestion: Fix the configuration file or remove it to use defaults", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("Photo catalog error {}: {reason}\nSuggestion: Check that the catalog file is valid JSON", path.display())]
    Catalog { path: PathBuf, reason: String },
}

impl PhotoError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PhotoError::InvalidFolderPath { .. } => ErrorKind::InvalidFolderPath,
            PhotoError::ManifestNotFound { .. } | PhotoError::ManifestUnreadable { .. } => {
                ErrorKind::InvalidManifest
            }
            PhotoError::WriteFailure { .. } => ErrorKind::WriteFailure,
            PhotoError::MoveFailure { .. } => ErrorKind::MoveFailure,
            PhotoError::PermissionDenied { .. } | PhotoError::Io { .. } => ErrorKind::Io,
            PhotoError::Config { .. } => ErrorKind::Config,
            PhotoError::Catalog { .. } => ErrorKind::Catalog,
        }
    }

    /// Shorthand for a folder rejection
    pub fn invalid_folder(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PhotoError::InvalidFolderPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an error with context about the operation and path.
    ///
    /// Permission problems keep their own variant so they are never mistaken
    /// for a missing path.
    pub fn from_io_error(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::PermissionDenied => PhotoError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            _ => PhotoError::Io {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }
}
