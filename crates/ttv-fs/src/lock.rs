use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Exclusive lock file, removed again on drop.
///
/// Acquisition uses `create_new`, so two processes can never both hold the
/// lock for the same path. A stale file left by a crashed process has to be
/// removed by an operator; its content names the owning pid.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    Error::Locked(path.clone())
                } else {
                    Error::Write {
                        path:   path.clone(),
                        source: e,
                    }
                }
            })?;
        writeln!(file, "{}", std::process::id()).map_err(|e| Error::Write {
            path:   path.clone(),
            source: e,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release lock file");
        }
    }
}
