//! Fixed on-disk layout of the archive and scratch trees.
//!
//! Archive: `<archive_root>/<unit_id>/{search, prediction, logs}` with the
//! canonical search result at `search/<unit_id>.a3m`.
//! Scratch: `<scratch_root>/<unit_id>/{search, prediction}`.

use std::path::{Path, PathBuf};

/// Extension of the search result consumed by the predict tool.
pub const SEARCH_RESULT_EXT: &str = "a3m";

const SEARCH_AREA: &str = "search";
const PREDICTION_AREA: &str = "prediction";
const LOG_AREA: &str = "logs";

/// Durable locations for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePaths {
    pub unit_dir: PathBuf,
    pub search_dir: PathBuf,
    pub search_result: PathBuf,
    pub prediction_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_file: PathBuf,
}

impl ArchivePaths {
    pub fn new(archive_root: &Path, unit_id: &str) -> Self {
        let unit_dir = archive_root.join(unit_id);
        let search_dir = unit_dir.join(SEARCH_AREA);
        let log_dir = unit_dir.join(LOG_AREA);
        Self {
            search_result: search_dir.join(canonical_result_name(unit_id)),
            prediction_dir: unit_dir.join(PREDICTION_AREA),
            log_file: log_dir.join(format!("{unit_id}.log")),
            search_dir,
            log_dir,
            unit_dir,
        }
    }
}

/// Transient scratch locations for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchPaths {
    pub unit_dir: PathBuf,
    /// Working directory handed to the search tool.
    pub search_dir: PathBuf,
    /// Canonically named search result inside `search_dir`.
    pub search_result: PathBuf,
    /// Output directory handed to the predict tool.
    pub prediction_dir: PathBuf,
}

impl ScratchPaths {
    pub fn new(scratch_root: &Path, unit_id: &str) -> Self {
        let unit_dir = scratch_root.join(unit_id);
        let search_dir = unit_dir.join(SEARCH_AREA);
        Self {
            search_result: search_dir.join(canonical_result_name(unit_id)),
            prediction_dir: unit_dir.join(PREDICTION_AREA),
            search_dir,
            unit_dir,
        }
    }
}

/// `<unit_id>.a3m`
pub fn canonical_result_name(unit_id: &str) -> String {
    format!("{unit_id}.{SEARCH_RESULT_EXT}")
}
