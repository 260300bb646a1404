use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::config::{PipelineConfig, PredictSettings};
use crate::logging::UnitLog;

use super::{ACCELERATOR_ENV, PredictTool, ToolError, process};

/// Invokes the predict executable:
/// `<binary> <result.a3m> <out_dir> --model-type .. --num-models .. --num-recycle ..
/// --pair-mode .. --pair-strategy .. [--templates]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictCommand {
    pub binary: PathBuf,
    pub model_type: String,
    pub num_models: u32,
    pub num_recycle: u32,
    pub pair_mode: String,
    pub pair_strategy: String,
    pub use_templates: bool,
    pub gpu_id: u32,
}

impl PredictCommand {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let PredictSettings {
            binary,
            model_type,
            num_models,
            num_recycle,
            pair_mode,
            pair_strategy,
            use_templates,
        } = config.predict.clone();
        Self {
            binary,
            model_type,
            num_models,
            num_recycle,
            pair_mode,
            pair_strategy,
            use_templates,
            gpu_id: config.gpu_id,
        }
    }

    pub fn command(&self, search_result: &Path, out_dir: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg(search_result)
            .arg(out_dir)
            .arg("--model-type")
            .arg(&self.model_type)
            .arg("--num-models")
            .arg(self.num_models.to_string())
            .arg("--num-recycle")
            .arg(self.num_recycle.to_string())
            .arg("--pair-mode")
            .arg(&self.pair_mode)
            .arg("--pair-strategy")
            .arg(&self.pair_strategy);
        if self.use_templates {
            command.arg("--templates");
        }
        command.env(ACCELERATOR_ENV, self.gpu_id.to_string());
        command
    }
}

impl PredictTool for PredictCommand {
    fn predict(
        &self,
        search_result: &Path,
        out_dir: &Path,
        log: &mut UnitLog,
    ) -> Result<(), ToolError> {
        process::run_logged(self.command(search_result, out_dir), "predict", log)
    }
}
