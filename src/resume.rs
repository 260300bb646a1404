//! Resume/skip decisions derived purely from artifact presence.
//!
//! There is no journal: a unit is complete when its archive holds a non-empty
//! search result and a prediction directory with at least one recognized output
//! marker. A single marker is weak evidence (one finished model satisfies it
//! even if other replicas failed); that limitation is accepted as-is.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::RegexSet;

use crate::archive;
use crate::layout::{ArchivePaths, ScratchPaths};

/// File-name patterns that count as prediction output. All case-insensitive.
const OUTPUT_MARKER_PATTERNS: &[&str] = &[
    r"(?i)\.(pdb|cif)$",
    r"(?i)^ranking.*\.json$",
    r"(?i)_scores_rank_\d+.*\.json$",
    r"(?i)\.done\.txt$",
];

static OUTPUT_MARKERS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(OUTPUT_MARKER_PATTERNS).expect("output marker patterns must compile")
});

/// How the search step will be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPlan {
    /// Canonical result already on scratch.
    ReuseLocal,
    /// Archived result exists; copy it back to scratch instead of searching.
    StageFromArchive,
    Run,
}

/// How the predict step will be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictPlan {
    ReuseLocal,
    Run,
}

/// Outcome of inspecting one unit's archive and scratch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    /// Everything is archived; skip the unit and purge its scratch.
    FullyArchived,
    Resume {
        search: SearchPlan,
        predict: PredictPlan,
    },
}

impl ResumeDecision {
    pub fn describe(&self) -> String {
        match self {
            Self::FullyArchived => "fully archived, skipping".to_string(),
            Self::Resume { search, predict } => {
                let search = match search {
                    SearchPlan::ReuseLocal => "reuse scratch search result",
                    SearchPlan::StageFromArchive => "stage archived search result",
                    SearchPlan::Run => "run search",
                };
                let predict = match predict {
                    PredictPlan::ReuseLocal => "reuse scratch prediction",
                    PredictPlan::Run => "run prediction",
                };
                format!("{search}, {predict}")
            }
        }
    }
}

/// Whether a file name is a recognized prediction output marker.
pub fn is_output_marker(file_name: &str) -> bool {
    OUTPUT_MARKERS.is_match(file_name)
}

/// Whether `dir` exists and directly contains a recognized marker file.
pub fn has_output_marker(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(|entry| entry.ok()).any(|entry| {
        entry.file_type().is_ok_and(|ty| ty.is_file())
            && entry.file_name().to_str().is_some_and(is_output_marker)
    })
}

/// Whether `path` is a regular file with at least one byte.
pub fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

/// Archived search result present and prediction area carries a marker.
pub fn is_fully_archived(archive: &ArchivePaths) -> bool {
    is_non_empty_file(&archive.search_result) && has_output_marker(&archive.prediction_dir)
}

/// Decide which steps a unit still needs.
pub fn assess(archive: &ArchivePaths, scratch: &ScratchPaths) -> ResumeDecision {
    if is_fully_archived(archive) {
        return ResumeDecision::FullyArchived;
    }
    let search = if is_non_empty_file(&scratch.search_result) {
        SearchPlan::ReuseLocal
    } else if is_non_empty_file(&archive.search_result) {
        SearchPlan::StageFromArchive
    } else {
        SearchPlan::Run
    };
    let predict = if has_output_marker(&scratch.prediction_dir) {
        PredictPlan::ReuseLocal
    } else {
        PredictPlan::Run
    };
    ResumeDecision::Resume { search, predict }
}

/// Remove stray scratch directories of an archived unit.
///
/// Best-effort: every failure is returned for logging and none stops the purge.
pub fn purge_scratch(scratch: &ScratchPaths) -> Vec<(PathBuf, std::io::Error)> {
    let mut failures = Vec::new();
    for dir in [&scratch.search_dir, &scratch.prediction_dir, &scratch.unit_dir] {
        if let Err(err) = archive::remove_dir_if_exists(dir) {
            failures.push((dir.clone(), err));
        }
    }
    failures
}
