//! Archive pattern expansion

use crate::error::ArchiveError;
use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Deduplicated archive paths in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSet {
    paths: Vec<PathBuf>,
}

impl ArchiveSet {
    /// Build a set from explicit paths, dropping repeats (first occurrence wins).
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut set = Self::default();
        let mut seen = HashSet::new();
        for path in paths {
            set.push_unique(&mut seen, path);
        }
        set
    }

    fn push_unique(&mut self, seen: &mut HashSet<PathBuf>, path: PathBuf) {
        if seen.insert(path.clone()) {
            self.paths.push(path);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl<'a> IntoIterator for &'a ArchiveSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Expand comma-separated glob patterns into archive paths.
///
/// Each piece is trimmed and empty pieces are ignored. Only regular files
/// are kept. A path matched by more than one pattern appears once, at the
/// position of its first match.
///
/// # Errors
///
/// Returns `ArchiveError::InvalidPattern` if any pattern fails to compile.
pub fn expand_patterns(patterns: &str) -> Result<ArchiveSet, ArchiveError> {
    let mut set = ArchiveSet::default();
    let mut seen = HashSet::new();

    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let matches = glob::glob(pattern).map_err(|e| ArchiveError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;

        let before = set.len();
        for entry in matches {
            match entry {
                Ok(path) if is_regular_file(&path) => set.push_unique(&mut seen, path),
                Ok(path) => debug!("Skipping non-file match {}", path.display()),
                Err(e) => warn!("Failed to read glob entry for '{pattern}': {e}"),
            }
        }

        if set.len() == before {
            debug!("Pattern '{pattern}' added no archives");
        }
    }

    Ok(set)
}

fn is_regular_file(path: &Path) -> bool {
    path.metadata().is_ok_and(|m| m.is_file())
}
