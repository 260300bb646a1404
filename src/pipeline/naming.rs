use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use crate::layout::{SEARCH_RESULT_EXT, canonical_result_name};
use crate::resume::is_non_empty_file;

use super::UnitError;

/// Pick the most recently modified `*.<ext>` file directly inside `dir`.
///
/// Ties on modification time resolve to the lexicographically smallest file
/// name so the choice is stable across runs.
pub fn select_newest_result(dir: &Path, ext: &str) -> io::Result<Option<PathBuf>> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, entry.file_name(), path));
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(candidates.into_iter().next().map(|(_, _, path)| path))
}

/// Make the search tool's output available under `<unit_id>.a3m`.
///
/// The tool names results on its own terms, so the newest result is copied to
/// the canonical name when it differs.
pub fn normalize_search_result(work_dir: &Path, unit_id: &str) -> Result<PathBuf, UnitError> {
    let canonical = work_dir.join(canonical_result_name(unit_id));
    let newest = select_newest_result(work_dir, SEARCH_RESULT_EXT)
        .map_err(|source| UnitError::io(work_dir, source))?
        .ok_or_else(|| UnitError::NoSearchResultProduced {
            work_dir: work_dir.to_path_buf(),
        })?;
    if newest != canonical {
        tracing::info!(
            "Search result {} copied to canonical name {}",
            newest.display(),
            canonical.display()
        );
        fs::copy(&newest, &canonical).map_err(|source| UnitError::io(&canonical, source))?;
    }
    if !is_non_empty_file(&canonical) {
        return Err(UnitError::NoSearchResultProduced {
            work_dir: work_dir.to_path_buf(),
        });
    }
    Ok(canonical)
}
