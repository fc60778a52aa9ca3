// Path helpers for bare-name comparison and request path sanitizing
// Handles both forward and backward slashes in untrusted input

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use thiserror::Error;

/// Characters never accepted in a request path
pub const BLOCKED_CHARS: &[char] = &['<', '>', '|', '?', '*', '"'];

/// Reason a request path was rejected by [`sanitize_request_path`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathRejection {
    #[error("path is empty")]
    Empty,
    #[error("path is not valid percent-encoded UTF-8")]
    BadEncoding,
    #[error("path contains a control character")]
    ControlCharacter,
    #[error("path contains the reserved character '{0}'")]
    BlockedCharacter(char),
}

/// Bare file name of a path (directory portion stripped)
///
/// Returns None for paths without a final component such as `/` or `..`.
pub fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Split a bare name into stem and extension, the extension keeping its dot
///
/// `IMG_01.jpg` becomes (`IMG_01`, `.jpg`); `README` becomes (`README`, ``).
pub fn split_name(name: &str) -> (String, String) {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    (stem, extension)
}

/// Normalize a path string by handling both forward and backward slashes
/// Converts all path separators to the platform-specific separator
pub fn normalize_separators(path_str: &str) -> String {
    if cfg!(windows) {
        path_str.replace('/', "\\")
    } else {
        path_str.replace('\\', "/")
    }
}

/// Clean an untrusted path received from the request layer
///
/// Trims whitespace and surrounding quotes, decodes URL escapes, rejects
/// control characters and the blocklist, then normalizes separators.
pub fn sanitize_request_path(raw: &str) -> Result<PathBuf, PathRejection> {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() {
        return Err(PathRejection::Empty);
    }

    let decoded = urlencoding::decode(trimmed).map_err(|_| PathRejection::BadEncoding)?;
    let decoded = decoded.trim();
    if decoded.is_empty() {
        return Err(PathRejection::Empty);
    }

    if decoded.chars().any(char::is_control) {
        return Err(PathRejection::ControlCharacter);
    }
    if let Some(c) = decoded.chars().find(|c| BLOCKED_CHARS.contains(c)) {
        return Err(PathRejection::BlockedCharacter(c));
    }

    let normalized = normalize_separators(decoded);
    // Keep a lone root separator but drop trailing ones elsewhere
    let normalized = if normalized.len() > 1 {
        normalized.trim_end_matches(MAIN_SEPARATOR).to_string()
    } else {
        normalized
    };

    Ok(PathBuf::from(normalized))
}

/// Derive a sibling report name: `report.txt` + `baseline` -> `report_baseline.txt`
pub fn suffixed_name(name: &str, suffix: &str) -> String {
    let (stem, extension) = split_name(name);
    format!("{}_{}{}", stem, suffix, extension)
}
