// Photo manifest core
// Tree listing, manifest I/O, set reconciliation and quarantine

pub mod baseline;
pub mod compare;
pub mod error;
pub mod lister;
pub mod manager;
pub mod manifest;
pub mod names;
pub mod path_utils;
pub mod quarantine;

// Re-export commonly used types for convenience
pub use baseline::{BaselineSource, ManifestBaseline};
pub use compare::{DiffEngine, DiffOptions, DiffReport, ImageFilter};
pub use error::{ErrorKind, PhotoError};
pub use lister::{ListProgress, ListedFile, TreeLister};
pub use manager::{DiffReportFiles, PhotoManager};
pub use manifest::ManifestHandler;
pub use names::NameSet;
pub use path_utils::{sanitize_request_path, PathRejection};
pub use quarantine::{CleanReport, QuarantineEngine, QuarantinedFile, RootGuard, RootLocks};
