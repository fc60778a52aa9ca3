// Manifest format handler module
// Reads and writes line-delimited file-name manifests and reports

use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::error::PhotoError;
use super::names::NameSet;
use crate::fs::PhotoStore;

/// Label used in errors for writes that do not target a file
pub const STREAM_SINK: &str = "<stream>";

/// Handler for reading and writing manifest and report files
///
/// Format: one file name per line, UTF-8, newline-terminated, no escaping.
pub struct ManifestHandler;

impl ManifestHandler {
    /// Parse manifest text into a set of names
    /// Blank lines are skipped and duplicates collapse silently
    pub fn parse(text: &str) -> NameSet {
        let mut names = NameSet::new();
        let mut duplicates = 0usize;

        for line in text.lines() {
            // lines() leaves the '\r' of CRLF files in place
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }
            if !names.insert(line) {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            debug!(duplicates, "collapsed duplicate manifest lines");
        }
        names
    }

    /// Render names as manifest text, one per line in iteration order
    pub fn render<'a, I>(names: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut output = String::new();
        for name in names {
            if name.contains('\n') || name.contains('\r') {
                // Such a name cannot survive a round trip through the format
                warn!(name = %name.escape_debug(), "file name contains a line break");
            }
            output.push_str(name);
            output.push('\n');
        }
        output
    }

    /// Read a manifest through the store
    ///
    /// # Errors
    /// `ManifestNotFound` if the source does not exist, `ManifestUnreadable`
    /// if it exists but cannot be read as UTF-8 text. A present but empty
    /// manifest is valid and yields an empty set.
    pub async fn read(store: &dyn PhotoStore, path: &Path) -> Result<NameSet, PhotoError> {
        let exists = store
            .file_exists(path)
            .await
            .map_err(|e| PhotoError::from_io_error(e, "probing manifest", path))?;
        if !exists {
            return Err(PhotoError::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }

        let text = store
            .read_to_string(path)
            .await
            .map_err(|source| PhotoError::ManifestUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let names = Self::parse(&text);
        debug!(manifest = %path.display(), entries = names.len(), "manifest loaded");
        Ok(names)
    }

    /// Write names to `path`, replacing any previous file only once the new
    /// content is complete
    pub async fn write<'a, I>(store: &dyn PhotoStore, path: &Path, names: I) -> Result<PathBuf, PhotoError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let text = Self::render(names);
        store
            .write_atomic(path, text.as_bytes())
            .await
            .map_err(|source| PhotoError::WriteFailure {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(output = %path.display(), bytes = text.len(), "list written");
        Ok(path.to_path_buf())
    }

    /// Write names to an async sink, one per line, then flush
    /// Returns the number of lines written
    pub async fn write_lines<'a, W, I>(sink: &mut W, names: I) -> Result<usize, PhotoError>
    where
        W: AsyncWrite + Unpin + ?Sized,
        I: IntoIterator<Item = &'a str>,
    {
        let wrap = |source| PhotoError::WriteFailure {
            path: PathBuf::from(STREAM_SINK),
            source,
        };

        let mut count = 0;
        for name in names {
            sink.write_all(name.as_bytes()).await.map_err(wrap)?;
            sink.write_all(b"\n").await.map_err(wrap)?;
            count += 1;
        }
        sink.flush().await.map_err(wrap)?;
        Ok(count)
    }
}
