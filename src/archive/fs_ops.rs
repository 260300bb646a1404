use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Remove `path` if present and recreate it empty.
pub fn ensure_empty_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Remove a directory tree, treating absence as success.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Number of regular files below `path`.
pub fn count_files(path: &Path) -> io::Result<usize> {
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            total += count_files(&entry.path())?;
        } else {
            total += 1;
        }
    }
    Ok(total)
}

pub(super) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("dir")
        .to_string();
    name.push('.');
    name.push_str(suffix);
    path.with_file_name(name)
}

/// Recursively copy `src` into `dest`.
///
/// Symlinks are recreated as links, never followed, so the copy matches what
/// `rsync -a` produces.
pub(super) fn copy_dir_all(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if ty.is_symlink() {
            copy_symlink(&src_path, &dest_path)?;
        } else if ty.is_dir() {
            copy_dir_all(&src_path, &dest_path)?;
        } else if ty.is_file() {
            fs::copy(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dest)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dest: &Path) -> io::Result<()> {
    tracing::warn!("Skipping symlink {} while copying", src.display());
    Ok(())
}

/// Whether two paths resolve to the same filesystem location.
pub(super) fn same_location(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
