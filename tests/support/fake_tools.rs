use std::{cell::RefCell, collections::HashSet, fs, path::Path};

use foldrun::logging::UnitLog;
use foldrun::tools::{PredictTool, SearchTool, ToolError};

/// In-process search stand-in that records which inputs it was asked for.
#[derive(Default)]
pub struct RecordingSearch {
    pub calls: RefCell<Vec<String>>,
    /// File name written into the work dir; `None` writes nothing.
    pub output_name: Option<String>,
    /// Stems for which the tool exits non-zero.
    pub failing: HashSet<String>,
}

impl RecordingSearch {
    pub fn writing(name: &str) -> Self {
        Self {
            output_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl SearchTool for RecordingSearch {
    fn search(&self, input: &Path, work_dir: &Path, log: &mut UnitLog) -> Result<(), ToolError> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.borrow_mut().push(stem.clone());
        log.line(&format!("recording search for {stem}"));
        if self.failing.contains(&stem) {
            return Err(ToolError::Failed {
                tool: "search",
                status: "exit status: 1".into(),
            });
        }
        if let Some(name) = &self.output_name {
            let body = fs::read_to_string(input).unwrap_or_default();
            fs::write(work_dir.join(name), format!("#a3m\n{body}")).expect("write search result");
        }
        Ok(())
    }
}

/// In-process predict stand-in that writes a ranked model file.
#[derive(Default)]
pub struct RecordingPredict {
    pub calls: RefCell<Vec<String>>,
    pub writes_nothing: bool,
}

impl RecordingPredict {
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl PredictTool for RecordingPredict {
    fn predict(
        &self,
        search_result: &Path,
        out_dir: &Path,
        _log: &mut UnitLog,
    ) -> Result<(), ToolError> {
        let stem = search_result
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.borrow_mut().push(stem.clone());
        if !self.writes_nothing {
            fs::write(
                out_dir.join(format!("{stem}_unrelaxed_rank_001_model_1.pdb")),
                "ATOM      1  N   MET A   1\n",
            )
            .expect("write model");
            fs::write(out_dir.join(format!("{stem}.done.txt")), "").expect("write done marker");
        }
        Ok(())
    }
}
