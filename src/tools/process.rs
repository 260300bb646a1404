use std::process::{Command, Stdio};

use crate::logging::UnitLog;

use super::ToolError;

/// Run `command` to completion with stdout/stderr appended to the unit log.
///
/// When the log cannot be shared the child inherits the parent's stdio so the
/// output is still visible.
pub(super) fn run_logged(
    mut command: Command,
    tool: &'static str,
    log: &mut UnitLog,
) -> Result<(), ToolError> {
    let rendered = render_command(&command);
    log.line(&format!("{tool}: {rendered}"));
    tracing::debug!("Running {tool}: {rendered}");

    command.stdin(Stdio::null());
    match (log.try_clone_file(), log.try_clone_file()) {
        (Some(out), Some(err)) => {
            command.stdout(out).stderr(err);
        }
        _ => {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
    }

    let status = command.status().map_err(|source| ToolError::Spawn {
        tool,
        program: command.get_program().into(),
        source,
    })?;
    log.line(&format!("{tool}: exited with {status}"));
    if !status.success() {
        return Err(ToolError::Failed {
            tool,
            status: status.to_string(),
        });
    }
    Ok(())
}

pub(super) fn render_command(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned()),
    );
    parts.join(" ")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn captures_output_into_unit_log() {
        let tmp = tempdir().unwrap();
        let log_path = tmp.path().join("u.log");
        let mut log = UnitLog::open(&log_path);

        let mut command = Command::new("sh");
        command.arg("-c").arg("echo searching; echo warn >&2");
        run_logged(command, "search", &mut log).unwrap();
        drop(log);

        let text = std::fs::read_to_string(&log_path).unwrap();
        assert!(text.contains("search: sh -c"));
        assert!(text.contains("searching"));
        assert!(text.contains("warn"));
        assert!(text.contains("exited with"));
    }

    #[test]
    fn nonzero_exit_is_a_failure() {
        let tmp = tempdir().unwrap();
        let mut log = UnitLog::open(&tmp.path().join("u.log"));
        let mut command = Command::new("sh");
        command.arg("-c").arg("exit 3");

        let err = run_logged(command, "predict", &mut log).unwrap_err();
        assert!(matches!(err, ToolError::Failed { tool: "predict", .. }));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let tmp = tempdir().unwrap();
        let mut log = UnitLog::disabled(&tmp.path().join("u.log"));
        let command = Command::new(tmp.path().join("no-such-tool"));

        let err = run_logged(command, "search", &mut log).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
