use std::io::ErrorKind;
use std::path::Path;

use crate::{Error, Result};

/// Move a directory with a single `rename(2)`.
///
/// Observers see either the whole tree at `src` or the whole tree at `dest`,
/// never a partially populated destination. The destination must not exist,
/// and moves across filesystems are refused instead of degrading to
/// copy + delete.
pub fn move_dir(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if dest.symlink_metadata().is_ok() {
        return Err(Error::AlreadyExists(dest.to_path_buf()));
    }

    std::fs::rename(src, dest).map_err(|e| match e.kind() {
        ErrorKind::CrossesDevices => Error::CrossDevice {
            from: src.to_path_buf(),
            to:   dest.to_path_buf(),
        },
        _ => Error::Move {
            from:   src.to_path_buf(),
            to:     dest.to_path_buf(),
            source: e,
        },
    })
}
