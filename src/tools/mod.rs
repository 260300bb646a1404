//! External tool contracts and their subprocess-backed implementations.
//!
//! The search and predict tools are opaque executables. The driver only talks
//! to them through [`SearchTool`] and [`PredictTool`], which keeps the pipeline
//! testable with in-process stand-ins.

mod environment;
mod predict;
mod process;
mod search;

use std::path::{Path, PathBuf};

use crate::logging::UnitLog;

pub use environment::{EnvironmentError, check_environment, resolve_executable};
pub use predict::PredictCommand;
pub use search::SearchCommand;

/// Environment variable used to pin both tools to one accelerator.
pub const ACCELERATOR_ENV: &str = "CUDA_VISIBLE_DEVICES";

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to start {tool} ({program}): {source}")]
    Spawn {
        tool: &'static str,
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}")]
    Failed { tool: &'static str, status: String },
}

/// Sequence search: reads `input`, writes one or more `*.a3m` into `work_dir`.
pub trait SearchTool {
    fn search(&self, input: &Path, work_dir: &Path, log: &mut UnitLog) -> Result<(), ToolError>;
}

/// Structure prediction: reads a search result, writes into `out_dir`.
pub trait PredictTool {
    fn predict(
        &self,
        search_result: &Path,
        out_dir: &Path,
        log: &mut UnitLog,
    ) -> Result<(), ToolError>;
}
