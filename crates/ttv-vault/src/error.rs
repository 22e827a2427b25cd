use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of any dispatch sub-step. Callers treat every variant alike: the
/// batch is sealed but not archived.
#[derive(Debug, Error)]
pub enum Error {
    #[error("command failed: {cmd}, source: {source}")]
    CommandFailed { cmd: String, source: std::io::Error },

    #[error("command {cmd} exited with {code:?}: {stderr}")]
    CommandExit {
        cmd:    String,
        code:   Option<i32>,
        stderr: String,
    },

    #[error("command {cmd} timed out after {after:?}")]
    Timeout { cmd: String, after: Duration },

    #[error("batch path has no usable name: {0}")]
    InvalidBatch(PathBuf),

    #[error("invalid vault url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("vault request to {url} failed: {source}")]
    Request {
        url:    String,
        source: reqwest::Error,
    },

    #[error("vault rejected import at {url} with status {status}: {body}")]
    Status {
        url:    String,
        status: reqwest::StatusCode,
        body:   String,
    },
}
