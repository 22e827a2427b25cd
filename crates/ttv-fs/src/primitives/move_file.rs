use std::io::ErrorKind;
use std::path::Path;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackStrategy {
    #[default]
    Copy,
    Error,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MoveFileOptions {
    pub fallback: FallbackStrategy,
}

impl MoveFileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback(mut self, fallback: FallbackStrategy) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Move a regular file, copying and removing the source when a rename
/// would cross filesystems and the fallback allows it.
pub fn move_file(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: MoveFileOptions,
) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if dest.symlink_metadata().is_ok() {
        return Err(Error::AlreadyExists(dest.to_path_buf()));
    }

    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => match options.fallback {
            FallbackStrategy::Copy => {
                std::fs::copy(src, dest).map_err(|e| Error::Write {
                    path:   dest.to_path_buf(),
                    source: e,
                })?;
                std::fs::remove_file(src).map_err(|e| Error::Remove {
                    path:   src.to_path_buf(),
                    source: e,
                })
            }
            FallbackStrategy::Error => Err(Error::CrossDevice {
                from: src.to_path_buf(),
                to:   dest.to_path_buf(),
            }),
        },
        Err(e) => Err(Error::Move {
            from:   src.to_path_buf(),
            to:     dest.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_move_file() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.zip");
        let dest = dir.path().join("dest.zip");
        std::fs::write(&src, "data").unwrap();

        move_file(&src, &dest, MoveFileOptions::new()).unwrap();

        assert!(!src.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"data");
    }

    #[test]
    fn test_move_file_keeps_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.zip");
        let dest = dir.path().join("dest.zip");
        std::fs::write(&src, "new").unwrap();
        std::fs::write(&dest, "old").unwrap();

        let result = move_file(&src, &dest, MoveFileOptions::new().fallback(FallbackStrategy::Error));

        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");
    }
}
