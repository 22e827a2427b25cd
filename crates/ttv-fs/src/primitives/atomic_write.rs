use std::fs;
use std::io::Write;
use std::path::Path;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Write `content` to a hidden sibling and rename it over `path`.
pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let parent = path.parent().ok_or_else(|| Error::Write {
        path:   path.to_path_buf(),
        source: std::io::Error::other("no parent directory"),
    })?;

    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let tmp_path = parent.join(format!(".{file_name}.{}.tmp", std::process::id()));

    let mut file = fs::File::create(&tmp_path).map_err(|e| Error::Write {
        path:   tmp_path.clone(),
        source: e,
    })?;
    file.write_all(content).map_err(|e| Error::Write {
        path:   tmp_path.clone(),
        source: e,
    })?;
    if options.sync {
        file.sync_all().map_err(|e| Error::Write {
            path:   tmp_path.clone(),
            source: e,
        })?;
    }
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Move {
            from:   tmp_path.clone(),
            to:     path.to_path_buf(),
            source: e,
        }
    })
}

/// Write `content` to `path`, failing if it already exists.
pub fn write_new(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                Error::AlreadyExists(path.to_path_buf())
            } else {
                Error::Write {
                    path:   path.to_path_buf(),
                    source: e,
                }
            }
        })?;
    file.write_all(content).map_err(|e| Error::Write {
        path:   path.to_path_buf(),
        source: e,
    })
}
