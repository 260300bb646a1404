use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::config::MirrorKind;

use super::{ArchiveError, fs_ops};

/// Makes `destination` an exact copy of `source`, dropping entries that only
/// exist in `destination`. Must leave `source` untouched.
pub trait Mirror {
    fn name(&self) -> &'static str;

    fn mirror(&self, source: &Path, destination: &Path) -> Result<(), ArchiveError>;
}

/// Build the mirror selected in configuration.
pub fn mirror_for(kind: MirrorKind) -> Box<dyn Mirror> {
    match kind {
        MirrorKind::Copy => Box::new(CopyMirror),
        MirrorKind::Rsync => Box::new(RsyncMirror::default()),
    }
}

/// In-process mirror: copy into `<dest>.new`, then swap it in by rename.
///
/// The previous destination is parked at `<dest>.old` during the swap and
/// restored if the final rename fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyMirror;

impl Mirror for CopyMirror {
    fn name(&self) -> &'static str {
        MirrorKind::Copy.as_str()
    }

    fn mirror(&self, source: &Path, destination: &Path) -> Result<(), ArchiveError> {
        let failed = |reason: String| ArchiveError::Mirror {
            source_dir: source.to_path_buf(),
            destination: destination.to_path_buf(),
            reason,
        };
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| failed(format!("create parent: {err}")))?;
        }
        let new_path = fs_ops::with_suffix(destination, "new");
        let old_path = fs_ops::with_suffix(destination, "old");
        fs_ops::remove_dir_if_exists(&new_path)
            .map_err(|err| failed(format!("clear {}: {err}", new_path.display())))?;
        fs_ops::remove_dir_if_exists(&old_path)
            .map_err(|err| failed(format!("clear {}: {err}", old_path.display())))?;

        if let Err(err) = fs_ops::copy_dir_all(source, &new_path) {
            let _ = fs::remove_dir_all(&new_path);
            return Err(failed(format!("copy: {err}")));
        }

        let had_previous = destination.exists();
        if had_previous {
            fs::rename(destination, &old_path).map_err(|err| {
                let _ = fs::remove_dir_all(&new_path);
                failed(format!("park previous copy: {err}"))
            })?;
        }
        if let Err(err) = fs::rename(&new_path, destination) {
            if had_previous {
                let _ = fs::rename(&old_path, destination);
            }
            let _ = fs::remove_dir_all(&new_path);
            return Err(failed(format!("swap in new copy: {err}")));
        }
        if had_previous && let Err(err) = fs::remove_dir_all(&old_path) {
            tracing::warn!(
                "Mirrored {} but left stale copy at {}: {err}",
                destination.display(),
                old_path.display()
            );
        }
        Ok(())
    }
}

/// Mirror through `rsync -a --delete`.
#[derive(Debug, Clone)]
pub struct RsyncMirror {
    pub binary: PathBuf,
}

impl Default for RsyncMirror {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("rsync"),
        }
    }
}

impl Mirror for RsyncMirror {
    fn name(&self) -> &'static str {
        MirrorKind::Rsync.as_str()
    }

    fn mirror(&self, source: &Path, destination: &Path) -> Result<(), ArchiveError> {
        let failed = |reason: String| ArchiveError::Mirror {
            source_dir: source.to_path_buf(),
            destination: destination.to_path_buf(),
            reason,
        };
        fs::create_dir_all(destination).map_err(|err| failed(format!("create: {err}")))?;
        let output = Command::new(&self.binary)
            .arg("-a")
            .arg("--delete")
            .arg(with_trailing_slash(source))
            .arg(with_trailing_slash(destination))
            .stdin(Stdio::null())
            .output()
            .map_err(|err| failed(format!("spawn {}: {err}", self.binary.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// rsync copies directory contents (not the directory itself) with a trailing slash.
fn with_trailing_slash(path: &Path) -> OsString {
    let mut raw = path.as_os_str().to_owned();
    if !raw.to_string_lossy().ends_with('/') {
        raw.push("/");
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seed(dir: &Path, files: &[(&str, &str)]) {
        for (name, body) in files {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
    }

    #[test]
    fn copy_mirror_drops_stale_destination_entries() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("archive").join("prediction");
        seed(&src, &[("rank_001.pdb", "new"), ("sub/scores.json", "{}")]);
        seed(&dest, &[("rank_001.pdb", "old"), ("stale.pdb", "stale")]);

        CopyMirror.mirror(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("rank_001.pdb")).unwrap(), "new");
        assert!(dest.join("sub").join("scores.json").is_file());
        assert!(!dest.join("stale.pdb").exists());
        assert!(!tmp.path().join("archive").join("prediction.old").exists());
        assert!(!tmp.path().join("archive").join("prediction.new").exists());
        assert!(src.join("rank_001.pdb").is_file());
    }

    #[test]
    fn copy_mirror_creates_missing_destination() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        seed(&src, &[("a.pdb", "a")]);
        let dest = tmp.path().join("deep").join("tree").join("prediction");

        CopyMirror.mirror(&src, &dest).unwrap();
        assert!(dest.join("a.pdb").is_file());
    }

    #[test]
    fn copy_mirror_failure_keeps_previous_destination() {
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("prediction");
        seed(&dest, &[("kept.pdb", "kept")]);

        let err = CopyMirror
            .mirror(&tmp.path().join("missing-src"), &dest)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Mirror { .. }));
        assert_eq!(fs::read_to_string(dest.join("kept.pdb")).unwrap(), "kept");
    }

    #[test]
    fn rsync_mirror_drops_stale_entries_and_copies_contents_not_dir() {
        let Some(binary) = crate::tools::resolve_executable(Path::new("rsync")) else {
            eprintln!("rsync not installed; skipping");
            return;
        };
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("archive").join("prediction");
        seed(&src, &[("rank_001.pdb", "new"), ("sub/scores.json", "{}")]);
        seed(&dest, &[("rank_001.pdb", "old"), ("stale.pdb", "stale")]);

        let mirror = RsyncMirror { binary };
        mirror.mirror(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("rank_001.pdb")).unwrap(), "new");
        assert!(dest.join("sub").join("scores.json").is_file());
        assert!(!dest.join("stale.pdb").exists());
        assert!(!dest.join("src").exists());
        assert!(src.join("rank_001.pdb").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn copy_mirror_preserves_symlinks() {
        use std::os::unix::fs::symlink;

        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        seed(&src, &[("rank_001.pdb", "ATOM")]);
        symlink("rank_001.pdb", src.join("best.pdb")).unwrap();
        symlink(".", src.join("self")).unwrap();
        let dest = tmp.path().join("prediction");

        CopyMirror.mirror(&src, &dest).unwrap();

        assert_eq!(fs::read_link(dest.join("best.pdb")).unwrap(), PathBuf::from("rank_001.pdb"));
        assert_eq!(fs::read_link(dest.join("self")).unwrap(), PathBuf::from("."));
    }

    #[test]
    fn rsync_mirror_reports_missing_binary() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        seed(&src, &[("a.pdb", "a")]);
        let mirror = RsyncMirror {
            binary: tmp.path().join("no-such-rsync"),
        };
        let err = mirror.mirror(&src, &tmp.path().join("dest")).unwrap_err();
        assert!(err.to_string().contains("spawn"));
    }

    #[test]
    fn mirror_for_reports_configured_name() {
        for kind in [MirrorKind::Copy, MirrorKind::Rsync] {
            assert_eq!(mirror_for(kind).name(), kind.as_str());
            assert_eq!(kind.as_str().parse::<MirrorKind>(), Ok(kind));
        }
    }

    #[test]
    fn trailing_slash_is_added_once() {
        assert_eq!(with_trailing_slash(Path::new("/a/b")), OsString::from("/a/b/"));
        assert_eq!(with_trailing_slash(Path::new("/a/b/")), OsString::from("/a/b/"));
    }
}
