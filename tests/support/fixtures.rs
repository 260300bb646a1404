use std::{fs, path::PathBuf};

use foldrun::cli::CliArgs;
use foldrun::config::{FileSettings, PipelineConfig};
use tempfile::TempDir;

/// Temporary input, archive and scratch trees for one test.
pub struct BatchFixture {
    pub temp: TempDir,
    pub input: PathBuf,
    pub archive: PathBuf,
    pub scratch: PathBuf,
}

impl BatchFixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        let input = temp.path().join("inputs");
        let archive = temp.path().join("archive");
        let scratch = temp.path().join("scratch");
        fs::create_dir_all(&input).expect("create input dir");
        Self {
            temp,
            input,
            archive,
            scratch,
        }
    }

    pub fn add_sequence(&self, file_name: &str) -> PathBuf {
        let path = self.input.join(file_name);
        fs::write(&path, ">chain_a\nMKVLAAGIV\n").expect("write sequence");
        path
    }

    pub fn config(&self) -> PipelineConfig {
        let mut args = CliArgs::new(self.input.clone(), self.archive.clone());
        args.scratch = Some(self.scratch.clone());
        PipelineConfig::resolve(&args, FileSettings::default()).expect("resolve config")
    }
}
