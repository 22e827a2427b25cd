use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read catalog '{path}': {source}")]
    CatalogRead { path: PathBuf, source: io::Error },

    #[error("malformed catalog '{path}': {source}")]
    CatalogFormat {
        path:   PathBuf,
        source: serde_json::Error,
    },

    #[error("catalog lists '{identifier}' (internal id {internal_id:?}) more than once")]
    DuplicateCatalogEntry {
        identifier:  String,
        internal_id: Option<u64>,
    },

    #[error("nbn {0:?} cannot be used as a directory name")]
    InvalidNbn(String),

    #[error(transparent)]
    Extract(#[from] ttv_archive::Error),

    #[error(transparent)]
    Fs(#[from] ttv_fs::Error),

    #[error(transparent)]
    Dispatch(#[from] ttv_vault::Error),

    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("inbox names must be unique, duplicated: {}", .0.join(", "))]
    DuplicateInboxNames(Vec<String>),
}

impl Error {
    /// Whether the failure points at a malicious or malformed archive rather
    /// than at the environment.
    pub fn is_unsafe_archive(&self) -> bool {
        matches!(self, Self::Extract(e) if e.is_safety_violation())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
