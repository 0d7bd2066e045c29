use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::DiscoverError;

/// Normalize a root that may be wrapped in single-child directory chains,
/// the shape an extracted archive usually has.
///
/// Descends while the directory holds exactly one entry and that entry is
/// itself a directory; stops at the first directory with zero or two or
/// more entries. A missing or unlistable path (including a plain file)
/// fails with [`DiscoverError::NotFound`].
pub fn resolve(path: &Path) -> Result<PathBuf, DiscoverError> {
    let mut current = path.to_path_buf();

    loop {
        debug!(path = %current.display(), "resolving base directory");
        let mut entries = Vec::new();
        let read = std::fs::read_dir(&current)
            .map_err(|_| DiscoverError::NotFound(path.to_path_buf()))?;
        for entry in read {
            let entry = entry.map_err(|_| DiscoverError::NotFound(path.to_path_buf()))?;
            entries.push(entry);
        }

        if entries.len() == 1 && entries[0].path().is_dir() {
            current = entries[0].path();
            continue;
        }
        return Ok(current);
    }
}
