mod error;
mod lock;
mod primitives;
mod size;

pub use error::{Error, Result};
pub use lock::LockFile;
pub use primitives::{
    AtomicWriteOptions, FallbackStrategy, MoveFileOptions, atomic_write, move_dir, move_file,
    write_new,
};
pub use size::dir_size;

use std::path::{Path, PathBuf};

/// Create `path` and all missing parents.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path).map_err(|e| Error::CreateDir {
        path:   path.to_path_buf(),
        source: e,
    })
}

/// First free name in `dir` among `name`, `name-1`, `name-2`, ...
///
/// Only meaningful while a single writer owns `dir`.
pub fn unique_child(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    let dir = dir.as_ref();
    let candidate = dir.join(name);
    if candidate.symlink_metadata().is_err() {
        return candidate;
    }
    (1u32..)
        .map(|n| dir.join(format!("{name}-{n}")))
        .find(|p| p.symlink_metadata().is_err())
        .unwrap_or(candidate)
}

/// Remove a file, treating an already missing file as success.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Remove {
            path:   path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unique_child_skips_taken_names() {
        let dir = tempdir().unwrap();
        assert_eq!(unique_child(dir.path(), "batch-1"), dir.path().join("batch-1"));

        std::fs::create_dir(dir.path().join("batch-1")).unwrap();
        std::fs::create_dir(dir.path().join("batch-1-1")).unwrap();
        assert_eq!(unique_child(dir.path(), "batch-1"), dir.path().join("batch-1-2"));
    }

    #[test]
    fn test_ensure_dir_nested() -> Result<()> {
        let dir = tempdir().unwrap();
        ensure_dir(dir.path().join("a/b/c"))?;
        ensure_dir(dir.path().join("a/b/c"))?;
        assert!(dir.path().join("a/b/c").is_dir());
        Ok(())
    }

    #[test]
    fn test_remove_file_if_exists() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.zip");
        std::fs::write(&path, "zip").unwrap();

        assert!(remove_file_if_exists(&path)?);
        assert!(!remove_file_if_exists(&path)?);
        Ok(())
    }
}
