//! Resumable batch driver for sequence search and structure prediction.
/// Per-user application directories.
pub mod app_dirs;
/// Verified transfers from scratch into the archive.
pub mod archive;
/// Command-line parsing.
pub mod cli;
/// Layered run configuration.
pub mod config;
/// Archive and scratch path layout.
pub mod layout;
/// Run-wide and per-unit logging.
pub mod logging;
/// Batch driver.
pub mod pipeline;
/// Resume and skip decisions from on-disk artifacts.
pub mod resume;
/// External tool invocation.
pub mod tools;
/// Input discovery and unit state.
pub mod work_unit;
