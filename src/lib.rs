// Library module for fotolist
// Re-exports modules for use in integration tests and the binary

pub mod catalog;
pub mod config;
pub mod fs;
pub mod logging;
pub mod photo;
