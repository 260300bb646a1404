use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::Error as SerdeDeError};

use super::{ConfigError, MirrorKind};

/// Settings read from `foldrun.toml`. Every key is optional; missing keys fall
/// back to built-in defaults and CLI flags override whatever is set here.
///
/// Config keys: `scratch`, `gpu`, `mirror`, `log_dir`, `stop_on_error`, plus the
/// `[search]` and `[predict]` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    #[serde(default)]
    pub scratch: Option<PathBuf>,
    #[serde(default)]
    pub gpu: Option<u32>,
    #[serde(default)]
    pub mirror: Option<MirrorKind>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub stop_on_error: Option<bool>,
    #[serde(default)]
    pub search: SearchFileSettings,
    #[serde(default)]
    pub predict: PredictFileSettings,
}

/// `[search]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchFileSettings {
    #[serde(default)]
    pub binary: Option<PathBuf>,
    #[serde(default)]
    pub db_tool: Option<PathBuf>,
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub threads: Option<u32>,
}

/// `[predict]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictFileSettings {
    #[serde(default)]
    pub binary: Option<PathBuf>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub num_models: Option<u32>,
    #[serde(default)]
    pub num_recycle: Option<u32>,
    #[serde(default)]
    pub pair_mode: Option<String>,
    #[serde(default)]
    pub pair_strategy: Option<String>,
    #[serde(default)]
    pub templates: Option<bool>,
}

/// Load settings from `path`, returning defaults when the file is absent.
pub fn load_settings_from(path: &Path) -> Result<FileSettings, ConfigError> {
    if !path.exists() {
        return Ok(FileSettings::default());
    }
    load_required_settings_from(path)
}

/// Load settings from a file the operator named explicitly; absence is an error.
pub fn load_required_settings_from(path: &Path) -> Result<FileSettings, ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_optional_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("foldrun.toml")).unwrap();
        assert_eq!(settings, FileSettings::default());
    }

    #[test]
    fn missing_required_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = load_required_settings_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn parses_nested_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foldrun.toml");
        std::fs::write(
            &path,
            r#"
scratch = "/local/scratch"
gpu = 2
mirror = "rsync"

[search]
threads = 32
database = "/db/colabfold"

[predict]
num_models = 3
templates = true
"#,
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.scratch, Some(PathBuf::from("/local/scratch")));
        assert_eq!(settings.gpu, Some(2));
        assert_eq!(settings.mirror, Some(MirrorKind::Rsync));
        assert_eq!(settings.search.threads, Some(32));
        assert_eq!(
            settings.search.database,
            Some(PathBuf::from("/db/colabfold"))
        );
        assert_eq!(settings.predict.num_models, Some(3));
        assert_eq!(settings.predict.templates, Some(true));
        assert_eq!(settings.predict.model_type, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foldrun.toml");
        std::fs::write(&path, "[predict]\nnum_model = 3\n").unwrap();

        let err = load_settings_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }
}
