use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to move '{from}' to '{to}': {source}")]
    Move {
        from:   PathBuf,
        to:     PathBuf,
        source: io::Error,
    },

    #[error("failed to remove '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("cross-device move of '{from}' to '{to}' is not atomic")]
    CrossDevice { from: PathBuf, to: PathBuf },

    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("lock '{0}' is held by another process")]
    Locked(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
