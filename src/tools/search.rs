use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::config::PipelineConfig;
use crate::logging::UnitLog;

use super::{ACCELERATOR_ENV, SearchTool, ToolError, process};

/// Invokes the search executable:
/// `<binary> <input> <database> <work_dir> --mmseqs <db_tool> --threads <n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCommand {
    pub binary: PathBuf,
    pub db_tool_binary: PathBuf,
    pub database: PathBuf,
    pub threads: u32,
    pub gpu_id: u32,
}

impl SearchCommand {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            binary: config.search.binary.clone(),
            db_tool_binary: config.search.db_tool_binary.clone(),
            database: config.search.database.clone(),
            threads: config.search.threads,
            gpu_id: config.gpu_id,
        }
    }

    pub fn command(&self, input: &Path, work_dir: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg(input)
            .arg(&self.database)
            .arg(work_dir)
            .arg("--mmseqs")
            .arg(&self.db_tool_binary)
            .arg("--threads")
            .arg(self.threads.to_string())
            .env(ACCELERATOR_ENV, self.gpu_id.to_string());
        command
    }
}

impl SearchTool for SearchCommand {
    fn search(&self, input: &Path, work_dir: &Path, log: &mut UnitLog) -> Result<(), ToolError> {
        process::run_logged(self.command(input, work_dir), "search", log)
    }
}
