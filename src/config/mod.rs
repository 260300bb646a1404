//! Immutable run configuration.
//!
//! A [`PipelineConfig`] is resolved exactly once at startup from three layers:
//! built-in defaults, the optional `foldrun.toml`, and CLI flags (highest
//! precedence). The driver only ever sees it by shared reference.

mod file;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::CliArgs;

pub use file::{
    FileSettings, PredictFileSettings, SearchFileSettings, load_required_settings_from,
    load_settings_from,
};

/// Default filename of the config file inside the application directory.
pub const CONFIG_FILE_NAME: &str = "foldrun.toml";

const DEFAULT_SEARCH_BINARY: &str = "colabfold_search";
const DEFAULT_PREDICT_BINARY: &str = "colabfold_batch";
const DEFAULT_DB_TOOL_BINARY: &str = "mmseqs";
const DEFAULT_DATABASE_DIR: &str = "databases";
const DEFAULT_THREADS: u32 = 8;
const DEFAULT_GPU_ID: u32 = 0;
const DEFAULT_MODEL_TYPE: &str = "alphafold2_multimer_v3";
const DEFAULT_NUM_MODELS: u32 = 5;
const DEFAULT_NUM_RECYCLE: u32 = 3;
const DEFAULT_PAIR_MODE: &str = "unpaired_paired";
const DEFAULT_PAIR_STRATEGY: &str = "greedy";

/// Errors that may occur while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// A resolved value is outside its allowed range.
    #[error("Invalid setting {key}: {reason}")]
    Invalid {
        /// Setting name as the operator sees it.
        key: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
}

/// Directory mirroring utility used for directory archival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorKind {
    /// In-process copy with a rename swap.
    #[default]
    Copy,
    /// External `rsync -a --delete`.
    Rsync,
}

impl MirrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Rsync => "rsync",
        }
    }
}

impl FromStr for MirrorKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "copy" => Ok(Self::Copy),
            "rsync" => Ok(Self::Rsync),
            other => Err(format!("unknown mirror '{other}' (expected copy or rsync)")),
        }
    }
}

/// Parameters for the sequence-search step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Search tool executable.
    pub binary: PathBuf,
    /// Database tool binary handed to the search tool.
    pub db_tool_binary: PathBuf,
    /// Sequence database directory.
    pub database: PathBuf,
    pub threads: u32,
}

/// Parameters for the structure-prediction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictSettings {
    /// Predict tool executable.
    pub binary: PathBuf,
    /// Model family.
    pub model_type: String,
    /// Replica count.
    pub num_models: u32,
    pub num_recycle: u32,
    pub pair_mode: String,
    pub pair_strategy: String,
    pub use_templates: bool,
}

/// Fully resolved configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Input sequence file or directory.
    pub input: PathBuf,
    /// Durable archive root.
    pub archive_root: PathBuf,
    /// Fast local scratch root.
    pub scratch_root: PathBuf,
    /// Accelerator id exported to both tools.
    pub gpu_id: u32,
    pub search: SearchSettings,
    pub predict: PredictSettings,
    pub mirror: MirrorKind,
    pub log_dir: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub stop_on_error: bool,
    pub dry_run: bool,
}

impl PipelineConfig {
    /// Merge defaults, file settings and CLI flags, then validate.
    pub fn resolve(cli: &CliArgs, file: FileSettings) -> Result<Self, ConfigError> {
        let FileSettings {
            scratch,
            gpu,
            mirror,
            log_dir,
            stop_on_error,
            search,
            predict,
        } = file;

        let config = Self {
            input: cli.input.clone(),
            archive_root: cli.archive.clone(),
            scratch_root: pick(cli.scratch.clone(), scratch, default_scratch_root),
            gpu_id: pick(cli.gpu, gpu, || DEFAULT_GPU_ID),
            search: SearchSettings {
                binary: pick(cli.search_bin.clone(), search.binary, || {
                    PathBuf::from(DEFAULT_SEARCH_BINARY)
                }),
                db_tool_binary: pick(cli.db_tool_bin.clone(), search.db_tool, || {
                    PathBuf::from(DEFAULT_DB_TOOL_BINARY)
                }),
                database: pick(cli.database.clone(), search.database, || {
                    PathBuf::from(DEFAULT_DATABASE_DIR)
                }),
                threads: pick(cli.threads, search.threads, || DEFAULT_THREADS),
            },
            predict: PredictSettings {
                binary: pick(cli.predict_bin.clone(), predict.binary, || {
                    PathBuf::from(DEFAULT_PREDICT_BINARY)
                }),
                model_type: pick(cli.model_type.clone(), predict.model_type, || {
                    DEFAULT_MODEL_TYPE.to_string()
                }),
                num_models: pick(cli.num_models, predict.num_models, || DEFAULT_NUM_MODELS),
                num_recycle: pick(cli.num_recycle, predict.num_recycle, || {
                    DEFAULT_NUM_RECYCLE
                }),
                pair_mode: pick(cli.pair_mode.clone(), predict.pair_mode, || {
                    DEFAULT_PAIR_MODE.to_string()
                }),
                pair_strategy: pick(cli.pair_strategy.clone(), predict.pair_strategy, || {
                    DEFAULT_PAIR_STRATEGY.to_string()
                }),
                use_templates: pick(cli.templates, predict.templates, || false),
            },
            mirror: pick(cli.mirror, mirror, MirrorKind::default),
            log_dir: cli.log_dir.clone().or(log_dir),
            report_path: cli.report.clone(),
            stop_on_error: cli.stop_on_error || stop_on_error.unwrap_or(false),
            dry_run: cli.dry_run,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.search.threads == 0 {
            return Err(ConfigError::Invalid {
                key: "threads",
                reason: "must be >= 1".into(),
            });
        }
        if self.predict.num_models == 0 {
            return Err(ConfigError::Invalid {
                key: "num_models",
                reason: "must be >= 1".into(),
            });
        }
        for (key, value) in [
            ("model_type", &self.predict.model_type),
            ("pair_mode", &self.predict.pair_mode),
            ("pair_strategy", &self.predict.pair_strategy),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must not be empty".into(),
                });
            }
        }
        if same_location(&self.scratch_root, &self.archive_root) {
            return Err(ConfigError::Invalid {
                key: "scratch",
                reason: "scratch root must differ from the archive root".into(),
            });
        }
        Ok(())
    }
}

fn pick<T>(cli: Option<T>, file: Option<T>, default: impl FnOnce() -> T) -> T {
    cli.or(file).unwrap_or_else(default)
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("foldrun")
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
