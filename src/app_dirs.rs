//! Application directory helpers anchored to a single `.foldrun` folder.
//!
//! The default config file and run logs live here. The base defaults to the OS
//! config directory and can be overridden with `FOLDRUN_CONFIG_HOME` for
//! cluster setups where home directories are not writable from compute nodes.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the OS config root.
pub const APP_DIR_NAME: &str = ".foldrun";
/// Environment variable overriding the config base directory.
pub const CONFIG_HOME_ENV: &str = "FOLDRUN_CONFIG_HOME";

const LOGS_DIR_NAME: &str = "logs";

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    /// Failed to create the application directory.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the run logs directory inside the `.foldrun` root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    let path = logs_dir_in(&base);
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Path of the default config file, without creating anything.
pub fn default_config_path() -> Option<PathBuf> {
    config_base_dir().map(|base| config_path_in(&base))
}

fn logs_dir_in(base: &Path) -> PathBuf {
    base.join(APP_DIR_NAME).join(LOGS_DIR_NAME)
}

fn config_path_in(base: &Path) -> PathBuf {
    base.join(APP_DIR_NAME)
        .join(crate::config::CONFIG_FILE_NAME)
}

/// `FOLDRUN_CONFIG_HOME` when set and non-empty, else the OS config dir.
fn config_base_dir() -> Option<PathBuf> {
    base_dir_from(std::env::var_os(CONFIG_HOME_ENV).map(PathBuf::from))
}

fn base_dir_from(env_override: Option<PathBuf>) -> Option<PathBuf> {
    env_override
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}
