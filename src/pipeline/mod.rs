//! Batch driver: resume assessment, tool invocation and archival per unit.

mod naming;
mod report;

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Instant,
};

use crate::archive::{self, ArchiveError, Mirror};
use crate::config::PipelineConfig;
use crate::layout::{ArchivePaths, ScratchPaths};
use crate::logging::UnitLog;
use crate::resume::{self, PredictPlan, ResumeDecision, SearchPlan};
use crate::tools::{PredictTool, SearchTool, ToolError};
use crate::work_unit::{UnitStatus, WorkUnit};

pub use naming::{normalize_search_result, select_newest_result};
pub use report::{BatchReport, OutcomeKind, ReportError, UnitReport, write_report};

/// Why a single unit stopped before it was archived.
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("Search produced no non-empty result in {work_dir}")]
    NoSearchResultProduced { work_dir: PathBuf },
    #[error("Prediction produced no recognized output in {out_dir}")]
    NoPredictionProduced { out_dir: PathBuf },
    #[error("I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl UnitError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// How a unit that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Already archived before this run touched it.
    Skipped,
    Completed { ran_search: bool, ran_predict: bool },
}

/// Drives work units one at a time through search, predict and archive.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    search: &'a dyn SearchTool,
    predict: &'a dyn PredictTool,
    mirror: &'a dyn Mirror,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        search: &'a dyn SearchTool,
        predict: &'a dyn PredictTool,
        mirror: &'a dyn Mirror,
    ) -> Self {
        Self {
            config,
            search,
            predict,
            mirror,
        }
    }

    pub fn archive_paths(&self, unit: &WorkUnit) -> ArchivePaths {
        ArchivePaths::new(&self.config.archive_root, &unit.id)
    }

    pub fn scratch_paths(&self, unit: &WorkUnit) -> ScratchPaths {
        ScratchPaths::new(&self.config.scratch_root, &unit.id)
    }

    /// Run every unit in order; in dry-run mode only report the plan.
    ///
    /// A failed unit is recorded and the batch moves on unless
    /// `stop_on_error` is set.
    pub fn run(&self, units: &mut [WorkUnit]) -> BatchReport {
        if self.config.dry_run {
            return self.plan(units);
        }
        let mut report = BatchReport::default();
        let total = units.len();
        for (index, unit) in units.iter_mut().enumerate() {
            tracing::info!("[{}/{}] Processing {}", index + 1, total, unit.id);
            let started = Instant::now();
            let result = self.process_unit(unit);
            let elapsed = started.elapsed().as_secs_f64();
            match result {
                Ok(outcome) => {
                    report
                        .units
                        .push(UnitReport::finished(unit, outcome, elapsed));
                }
                Err(err) => {
                    tracing::error!(
                        "Unit {} failed at status {}: {err}",
                        unit.id,
                        unit.status
                    );
                    report
                        .units
                        .push(UnitReport::failed(unit, err.to_string(), elapsed));
                    if self.config.stop_on_error {
                        tracing::warn!("Stopping batch after failure of {}", unit.id);
                        report.stopped_early = true;
                        break;
                    }
                }
            }
        }
        tracing::info!("Batch finished: {}", report.summary());
        report
    }

    /// Assess every unit without touching the filesystem.
    pub fn plan(&self, units: &[WorkUnit]) -> BatchReport {
        let units = units
            .iter()
            .map(|unit| {
                let decision =
                    resume::assess(&self.archive_paths(unit), &self.scratch_paths(unit));
                let plan = decision.describe();
                tracing::info!("[dry-run] {}: {plan}", unit.id);
                UnitReport::planned(unit, plan)
            })
            .collect();
        BatchReport {
            units,
            stopped_early: false,
        }
    }

    /// Bring one unit to the archived state, resuming from whatever is on disk.
    pub fn process_unit(&self, unit: &mut WorkUnit) -> Result<UnitOutcome, UnitError> {
        let archive_paths = self.archive_paths(unit);
        let scratch_paths = self.scratch_paths(unit);
        let decision = resume::assess(&archive_paths, &scratch_paths);
        tracing::info!("{}: {}", unit.id, decision.describe());

        let (search_plan, predict_plan) = match decision {
            ResumeDecision::FullyArchived => {
                for (path, err) in resume::purge_scratch(&scratch_paths) {
                    tracing::warn!(
                        "{}: failed to purge scratch {}: {err}",
                        unit.id,
                        path.display()
                    );
                }
                unit.advance(UnitStatus::Archived);
                return Ok(UnitOutcome::Skipped);
            }
            ResumeDecision::Resume { search, predict } => (search, predict),
        };

        let mut log = UnitLog::open(&archive_paths.log_file);
        tracing::debug!("{}: tool output goes to {}", unit.id, log.path().display());
        log.line(&format!(
            "unit {} started from {}: {}",
            unit.id,
            unit.source.display(),
            decision.describe()
        ));
        let result = self.drive(
            unit,
            &archive_paths,
            &scratch_paths,
            search_plan,
            predict_plan,
            &mut log,
        );
        match &result {
            Ok(_) => log.line(&format!("unit {} archived", unit.id)),
            Err(err) => log.line(&format!(
                "unit {} failed at status {}: {err}",
                unit.id, unit.status
            )),
        }
        result
    }

    fn drive(
        &self,
        unit: &mut WorkUnit,
        archive_paths: &ArchivePaths,
        scratch_paths: &ScratchPaths,
        search_plan: SearchPlan,
        predict_plan: PredictPlan,
        log: &mut UnitLog,
    ) -> Result<UnitOutcome, UnitError> {
        let ran_search = match search_plan {
            SearchPlan::ReuseLocal => {
                log.line("search result found on scratch, search skipped");
                false
            }
            SearchPlan::StageFromArchive => {
                stage_from_archive(archive_paths, scratch_paths)?;
                log.line(&format!(
                    "staged archived search result {}",
                    archive_paths.search_result.display()
                ));
                false
            }
            SearchPlan::Run => {
                self.run_search(unit, scratch_paths, log)?;
                true
            }
        };
        unit.advance(UnitStatus::SearchDone);

        let ran_predict = match predict_plan {
            PredictPlan::ReuseLocal => {
                log.line("prediction found on scratch, predict skipped");
                false
            }
            PredictPlan::Run => {
                self.run_predict(scratch_paths, log)?;
                true
            }
        };
        unit.advance(UnitStatus::PredictDone);

        self.archive_unit(unit, archive_paths, scratch_paths, log)?;
        unit.advance(UnitStatus::Archived);
        Ok(UnitOutcome::Completed {
            ran_search,
            ran_predict,
        })
    }

    fn run_search(
        &self,
        unit: &WorkUnit,
        scratch_paths: &ScratchPaths,
        log: &mut UnitLog,
    ) -> Result<(), UnitError> {
        let work_dir = &scratch_paths.search_dir;
        archive::ensure_empty_dir(work_dir).map_err(|err| UnitError::io(work_dir, err))?;
        tracing::info!("{}: running search", unit.id);
        self.search.search(&unit.source, work_dir, log)?;
        let result = normalize_search_result(work_dir, &unit.id)?;
        log.line(&format!("search result {}", result.display()));
        Ok(())
    }

    fn run_predict(&self, scratch_paths: &ScratchPaths, log: &mut UnitLog) -> Result<(), UnitError> {
        let out_dir = &scratch_paths.prediction_dir;
        archive::ensure_empty_dir(out_dir).map_err(|err| UnitError::io(out_dir, err))?;
        tracing::info!("Running prediction into {}", out_dir.display());
        self.predict
            .predict(&scratch_paths.search_result, out_dir, log)?;
        if !resume::has_output_marker(out_dir) {
            return Err(UnitError::NoPredictionProduced {
                out_dir: out_dir.clone(),
            });
        }
        Ok(())
    }

    fn archive_unit(
        &self,
        unit: &WorkUnit,
        archive_paths: &ArchivePaths,
        scratch_paths: &ScratchPaths,
        log: &mut UnitLog,
    ) -> Result<(), UnitError> {
        let file = archive::transfer_file(&scratch_paths.search_result, &archive_paths.search_result)?;
        log.line(&format!(
            "archived {} ({} bytes, sha256 {})",
            file.destination.display(),
            file.bytes,
            file.digest
        ));
        remove_scratch_dir(unit, &scratch_paths.search_dir);

        let dir = archive::transfer_directory(
            &scratch_paths.prediction_dir,
            &archive_paths.prediction_dir,
            self.mirror,
        )?;
        log.line(&format!(
            "mirrored {} files into {} via {}",
            dir.files,
            dir.destination.display(),
            dir.mirror
        ));
        remove_scratch_dir(unit, &scratch_paths.unit_dir);
        tracing::info!("{}: archived to {}", unit.id, archive_paths.unit_dir.display());
        Ok(())
    }
}

fn stage_from_archive(archive_paths: &ArchivePaths, scratch_paths: &ScratchPaths) -> Result<(), UnitError> {
    let dir = &scratch_paths.search_dir;
    fs::create_dir_all(dir).map_err(|err| UnitError::io(dir, err))?;
    fs::copy(&archive_paths.search_result, &scratch_paths.search_result)
        .map_err(|err| UnitError::io(&scratch_paths.search_result, err))?;
    Ok(())
}

/// Scratch cleanup after a verified transfer; a leftover directory is harmless.
fn remove_scratch_dir(unit: &WorkUnit, dir: &Path) {
    if let Err(err) = archive::remove_dir_if_exists(dir) {
        tracing::warn!("{}: failed to remove scratch {}: {err}", unit.id, dir.display());
    }
}
