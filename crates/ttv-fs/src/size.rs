use std::path::Path;

use crate::{Error, Result};

/// Total byte size of the regular files below `root`.
///
/// Symlinks are counted by their own metadata and never followed, so a link
/// pointing outside the tree cannot inflate the result.
pub fn dir_size(root: impl AsRef<Path>) -> Result<u64> {
    let root = root.as_ref();
    let metadata = root.symlink_metadata().map_err(|e| Error::Read {
        path:   root.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Ok(metadata.len());
    }

    let mut total = 0u64;
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| Error::Read {
            path:   dir.clone(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::Read {
                path:   dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            let metadata = path.symlink_metadata().map_err(|e| Error::Read {
                path:   path.clone(),
                source: e,
            })?;
            if metadata.is_dir() {
                pending.push(path);
            } else if metadata.is_file() {
                total += metadata.len();
            }
        }
    }

    Ok(total)
}
