use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::work_unit::WorkUnit;

use super::UnitOutcome;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Skipped,
    Completed,
    Failed,
    Planned,
}

/// One unit's line in the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    pub unit_id: String,
    pub input: PathBuf,
    pub outcome: OutcomeKind,
    /// Last state reached.
    pub status: String,
    pub ran_search: bool,
    pub ran_predict: bool,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitReport {
    pub(super) fn finished(unit: &WorkUnit, outcome: UnitOutcome, elapsed_secs: f64) -> Self {
        let (kind, ran_search, ran_predict) = match outcome {
            UnitOutcome::Skipped => (OutcomeKind::Skipped, false, false),
            UnitOutcome::Completed {
                ran_search,
                ran_predict,
            } => (OutcomeKind::Completed, ran_search, ran_predict),
        };
        Self {
            outcome: kind,
            ran_search,
            ran_predict,
            elapsed_secs,
            ..Self::base(unit)
        }
    }

    pub(super) fn failed(unit: &WorkUnit, error: String, elapsed_secs: f64) -> Self {
        Self {
            outcome: OutcomeKind::Failed,
            elapsed_secs,
            error: Some(error),
            ..Self::base(unit)
        }
    }

    pub(super) fn planned(unit: &WorkUnit, plan: String) -> Self {
        Self {
            outcome: OutcomeKind::Planned,
            plan: Some(plan),
            ..Self::base(unit)
        }
    }

    fn base(unit: &WorkUnit) -> Self {
        Self {
            unit_id: unit.id.clone(),
            input: unit.source.clone(),
            outcome: OutcomeKind::Planned,
            status: unit.status.as_str().to_string(),
            ran_search: false,
            ran_predict: false,
            elapsed_secs: 0.0,
            plan: None,
            error: None,
        }
    }
}

/// Result of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub units: Vec<UnitReport>,
    /// Set when `stop_on_error` ended the batch before every unit ran.
    pub stopped_early: bool,
}

impl BatchReport {
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.units.iter().filter(|u| u.outcome == kind).count()
    }

    pub fn failed_units(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|u| u.outcome == OutcomeKind::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.count(OutcomeKind::Failed) == 0
    }

    /// External tool invocations made during the batch.
    pub fn tool_invocations(&self) -> usize {
        self.units
            .iter()
            .map(|u| usize::from(u.ran_search) + usize::from(u.ran_predict))
            .sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} units: {} completed, {} skipped, {} failed, {} planned{}",
            self.units.len(),
            self.count(OutcomeKind::Completed),
            self.count(OutcomeKind::Skipped),
            self.count(OutcomeKind::Failed),
            self.count(OutcomeKind::Planned),
            if self.stopped_early {
                " (stopped early)"
            } else {
                ""
            }
        )
    }
}

/// Write the report as pretty JSON, creating parent directories.
pub fn write_report(report: &BatchReport, path: &Path) -> Result<(), ReportError> {
    let bytes = serde_json::to_vec_pretty(report)?;
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, bytes).map_err(write_err)?;
    Ok(())
}
