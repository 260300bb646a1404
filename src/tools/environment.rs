use std::path::{Path, PathBuf};

use crate::config::{MirrorKind, PipelineConfig};

/// Startup problems that make the whole run impossible.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Required executable for {role} not found: {path}")]
    MissingBinary { role: &'static str, path: PathBuf },
    #[error("Sequence database directory not found: {0}")]
    MissingDatabase(PathBuf),
}

/// Verify every external binary and the database before any unit runs.
///
/// All problems are collected so the operator can fix them in one pass.
pub fn check_environment(config: &PipelineConfig) -> Vec<EnvironmentError> {
    let mut problems = Vec::new();
    let mut binaries = vec![
        ("search tool", config.search.binary.clone()),
        ("predict tool", config.predict.binary.clone()),
        ("database tool", config.search.db_tool_binary.clone()),
    ];
    if config.mirror == MirrorKind::Rsync {
        binaries.push(("mirror", PathBuf::from("rsync")));
    }
    for (role, path) in binaries {
        if resolve_executable(&path).is_none() {
            problems.push(EnvironmentError::MissingBinary { role, path });
        }
    }
    if !config.search.database.is_dir() {
        problems.push(EnvironmentError::MissingDatabase(
            config.search.database.clone(),
        ));
    }
    problems
}

/// Resolve `program` the way a shell would: paths with a separator are taken
/// as-is, bare names are looked up on `PATH`.
pub fn resolve_executable(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return is_executable(program).then(|| program.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
