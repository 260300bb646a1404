use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::{ArchiveError, Mirror, digest::sha256_file, fs_ops};

/// Record of a verified single-file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransfer {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// SHA-256 shared by both copies at verification time.
    pub digest: String,
    pub bytes: u64,
}

/// Record of a mirrored directory transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirTransfer {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub files: usize,
    pub mirror: &'static str,
}

/// Copy `source` to `destination`, verify digests, then delete `source`.
///
/// `source` is only removed once both digests agree. On a mismatch both files
/// are left in place for inspection.
pub fn transfer_file(source: &Path, destination: &Path) -> Result<FileTransfer, ArchiveError> {
    transfer_file_with(source, destination, |src, dest| {
        fs::copy(src, dest).map(|_| ())
    })
}

fn transfer_file_with<F>(
    source: &Path,
    destination: &Path,
    copy: F,
) -> Result<FileTransfer, ArchiveError>
where
    F: FnOnce(&Path, &Path) -> io::Result<()>,
{
    let bytes = match fs::metadata(source) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => meta.len(),
        _ => {
            return Err(ArchiveError::SourceMissingOrEmpty {
                path: source.to_path_buf(),
            });
        }
    };
    if fs_ops::same_location(source, destination) {
        return Err(ArchiveError::SameLocation {
            path: source.to_path_buf(),
        });
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    copy(source, destination)?;

    let source_digest = sha256_file(source)?;
    let destination_digest = sha256_file(destination)?;
    if source_digest != destination_digest {
        return Err(ArchiveError::IntegrityMismatch {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_digest,
            destination_digest,
        });
    }

    fs::remove_file(source).map_err(|err| ArchiveError::SourceRemoval {
        path: source.to_path_buf(),
        source: err,
    })?;
    Ok(FileTransfer {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        digest: source_digest,
        bytes,
    })
}

/// Mirror `source_dir` onto `destination_dir`, then delete `source_dir`.
///
/// No per-file verification is done. Any mirror error returns before the
/// source tree is touched.
pub fn transfer_directory(
    source_dir: &Path,
    destination_dir: &Path,
    mirror: &dyn Mirror,
) -> Result<DirTransfer, ArchiveError> {
    if !source_dir.is_dir() {
        return Err(ArchiveError::SourceDirMissing {
            path: source_dir.to_path_buf(),
        });
    }
    if fs_ops::same_location(source_dir, destination_dir) {
        return Err(ArchiveError::SameLocation {
            path: source_dir.to_path_buf(),
        });
    }
    let files = fs_ops::count_files(source_dir)?;
    mirror.mirror(source_dir, destination_dir)?;

    fs::remove_dir_all(source_dir).map_err(|err| ArchiveError::SourceRemoval {
        path: source_dir.to_path_buf(),
        source: err,
    })?;
    Ok(DirTransfer {
        source: source_dir.to_path_buf(),
        destination: destination_dir.to_path_buf(),
        files,
        mirror: mirror.name(),
    })
}
