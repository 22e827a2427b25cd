use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("zip-slip attack detected: entry '{entry}' resolves to '{resolved}'")]
    ZipSlip { entry: PathBuf, resolved: PathBuf },

    #[error("invalid entry name: {0:?}")]
    InvalidPath(String),

    #[error("archive '{path}' is corrupted: {source}")]
    Corrupted {
        path:   PathBuf,
        source: zip::result::ZipError,
    },

    #[error("failed to open archive '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("destination already extracted: {0}")]
    AlreadyExtracted(PathBuf),

    #[error("staging operation failed: {source}")]
    StagingFailed {
        #[from]
        source: ttv_fs::Error,
    },
}

impl Error {
    /// Whether this error means the archive tried to write outside its root.
    pub fn is_safety_violation(&self) -> bool {
        matches!(self, Self::ZipSlip { .. } | Self::InvalidPath(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
