//! Input discovery and the per-file work unit descriptor.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Sequence-file extensions accepted as input (compared case-insensitively).
pub const SEQUENCE_EXTENSIONS: &[&str] = &["fasta", "fa", "faa", "fas", "a3m"];

/// Errors raised while enumerating input files.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Input path {0} does not exist")]
    Missing(PathBuf),
    #[error("Input file {0} does not have a recognized sequence extension")]
    UnsupportedFile(PathBuf),
    #[error("Input file {0} has no usable file name")]
    Unnamed(PathBuf),
    #[error("Failed to read input directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Progress of a unit through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UnitStatus {
    Pending,
    SearchDone,
    PredictDone,
    Archived,
}

impl UnitStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Archived)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::SearchDone => "search-done",
            Self::PredictDone => "predict-done",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input sequence file being driven through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// File stem of the input, used to name every artifact of the unit.
    pub id: String,
    pub source: PathBuf,
    pub status: UnitStatus,
}

impl WorkUnit {
    /// Build a unit from an input path, deriving the id from the file stem.
    pub fn from_path(path: &Path) -> Result<Self, DiscoveryError> {
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !matches!(*stem, "" | "." | ".."))
            .ok_or_else(|| DiscoveryError::Unnamed(path.to_path_buf()))?;
        Ok(Self {
            id: id.to_string(),
            source: path.to_path_buf(),
            status: UnitStatus::Pending,
        })
    }

    /// Move to `next`; status never goes backwards.
    pub fn advance(&mut self, next: UnitStatus) {
        if next > self.status {
            self.status = next;
        }
    }
}

/// Whether `path` carries one of [`SEQUENCE_EXTENSIONS`].
pub fn is_sequence_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SEQUENCE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Enumerate work units from a single file or a directory (non-recursive).
///
/// Directory entries are filtered by extension, hidden files are skipped, and
/// the result is sorted by file name.
pub fn discover_units(input: &Path) -> Result<Vec<WorkUnit>, DiscoveryError> {
    let meta = fs::metadata(input).map_err(|_| DiscoveryError::Missing(input.to_path_buf()))?;
    if meta.is_file() {
        if !is_sequence_file(input) {
            return Err(DiscoveryError::UnsupportedFile(input.to_path_buf()));
        }
        return Ok(vec![WorkUnit::from_path(input)?]);
    }

    let read_err = |source| DiscoveryError::ReadDir {
        path: input.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(input).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !path.is_file() || !is_sequence_file(&path) {
            continue;
        }
        paths.push(path);
    }
    paths.sort();

    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        let unit = WorkUnit::from_path(&path)?;
        if units.iter().any(|seen: &WorkUnit| seen.id == unit.id) {
            tracing::warn!(
                "Skipping {}: another input already maps to unit id {}",
                path.display(),
                unit.id
            );
            continue;
        }
        units.push(unit);
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn id_strips_only_the_last_extension() {
        let unit = WorkUnit::from_path(Path::new("/in/complex.v2.fasta")).unwrap();
        assert_eq!(unit.id, "complex.v2");
        assert_eq!(unit.status, UnitStatus::Pending);
    }

    #[test]
    fn dot_stems_are_rejected() {
        let dir = tempdir().unwrap();
        let dotted = dir.path().join("..fasta");
        fs::write(&dotted, ">x\nA\n").unwrap();

        assert!(matches!(
            WorkUnit::from_path(&dotted),
            Err(DiscoveryError::Unnamed(_))
        ));
        assert!(matches!(
            discover_units(&dotted),
            Err(DiscoveryError::Unnamed(_))
        ));
        assert!(matches!(
            WorkUnit::from_path(Path::new("/in/...fa")),
            Err(DiscoveryError::Unnamed(_))
        ));
    }

    #[test]
    fn discovers_sorted_sequence_files_only() {
        let dir = tempdir().unwrap();
        for name in ["b.fasta", "a.FA", "notes.txt", ".hidden.fasta", "c.a3m"] {
            fs::write(dir.path().join(name), ">x\nAAA\n").unwrap();
        }
        fs::create_dir(dir.path().join("nested.fasta")).unwrap();

        let units = discover_units(dir.path()).unwrap();
        let ids = units.iter().map(|u| u.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicate_stems_keep_the_first_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.fa"), ">x\nA\n").unwrap();
        fs::write(dir.path().join("x.fasta"), ">x\nA\n").unwrap();

        let units = discover_units(dir.path()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source, dir.path().join("x.fa"));
    }

    #[test]
    fn single_file_input_must_have_known_extension() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("one.fasta");
        let bad = dir.path().join("one.txt");
        fs::write(&good, ">x\nA\n").unwrap();
        fs::write(&bad, ">x\nA\n").unwrap();

        assert_eq!(discover_units(&good).unwrap().len(), 1);
        assert!(matches!(
            discover_units(&bad),
            Err(DiscoveryError::UnsupportedFile(_))
        ));
        assert!(matches!(
            discover_units(&dir.path().join("missing")),
            Err(DiscoveryError::Missing(_))
        ));
    }

    #[test]
    fn status_only_moves_forward() {
        let mut unit = WorkUnit::from_path(Path::new("a.fasta")).unwrap();
        unit.advance(UnitStatus::PredictDone);
        unit.advance(UnitStatus::SearchDone);
        assert_eq!(unit.status, UnitStatus::PredictDone);
        unit.advance(UnitStatus::Archived);
        assert!(unit.status.is_terminal());
    }
}
