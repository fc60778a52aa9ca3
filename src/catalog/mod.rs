//! Photo catalog
//!
//! Keeps one row per photo (device, album, name, extension, status) so the
//! catalog can stand in for a manifest as the baseline of a diff or clean.

pub mod record;
pub mod repository;

pub use record::{FileStatus, NewPhoto, PhotoRecord};
pub use repository::CatalogRepository;
