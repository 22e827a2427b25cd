use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Hidden sibling directory that receives an extraction before it becomes
/// visible under its final name.
///
/// Dropping an uncommitted staging directory removes it with everything
/// extracted so far.
#[derive(Debug)]
pub struct Staging {
    path: PathBuf,
    destination: PathBuf,
}

impl Staging {
    pub fn new(destination: &Path) -> Result<Self> {
        let name = destination
            .file_name()
            .ok_or_else(|| Error::InvalidPath(destination.display().to_string()))?
            .to_string_lossy();
        let parent = destination.parent().unwrap_or(Path::new("."));
        let path = parent.join(format!(".{name}.staging"));

        // leftover from an interrupted run
        if path.exists() {
            std::fs::remove_dir_all(&path).map_err(|e| Error::DirectoryCreationFailed {
                path: path.clone(),
                source: e,
            })?;
        }
        ttv_fs::ensure_dir(&path)?;

        Ok(Self {
            path,
            destination: destination.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Publish the staged tree under the destination name with one rename.
    pub fn commit(self) -> Result<PathBuf> {
        match ttv_fs::move_dir(&self.path, &self.destination) {
            Ok(()) => Ok(self.destination.clone()),
            Err(ttv_fs::Error::AlreadyExists(path)) => Err(Error::AlreadyExtracted(path)),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if self.path.exists()
            && let Err(e) = std::fs::remove_dir_all(&self.path)
        {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to clean up staging directory");
        }
    }
}
