//! Archival of scratch artifacts into durable storage.
//!
//! Files are copied, verified by SHA-256 and only then removed from scratch.
//! Directories are mirrored (destination made an exact copy, stale entries
//! dropped) without per-file verification, then removed from scratch. In both
//! cases the scratch copy survives any failure before the final removal.

mod digest;
mod fs_ops;
mod mirror;
mod transfer;

use std::path::PathBuf;

pub use digest::sha256_file;
pub use fs_ops::{count_files, ensure_empty_dir, remove_dir_if_exists};
pub use mirror::{CopyMirror, Mirror, RsyncMirror, mirror_for};
pub use transfer::{DirTransfer, FileTransfer, transfer_directory, transfer_file};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Source file {path} is missing or empty")]
    SourceMissingOrEmpty { path: PathBuf },
    #[error("Source directory {path} is missing")]
    SourceDirMissing { path: PathBuf },
    #[error(
        "Checksum mismatch between {source_path} ({source_digest}) and {destination} ({destination_digest})"
    )]
    IntegrityMismatch {
        source_path: PathBuf,
        destination: PathBuf,
        source_digest: String,
        destination_digest: String,
    },
    #[error("Refusing to archive {path} onto itself")]
    SameLocation { path: PathBuf },
    #[error("Mirroring {source_dir} to {destination} failed: {reason}")]
    Mirror {
        source_dir: PathBuf,
        destination: PathBuf,
        reason: String,
    },
    #[error("Archived {path} but could not remove the scratch copy: {source}")]
    SourceRemoval {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
