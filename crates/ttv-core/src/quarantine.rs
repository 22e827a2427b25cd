//! Moving rejected inputs aside.
//!
//! Nothing in here returns an error: a failure while quarantining is logged
//! and swallowed so the worker can move on to the next package.

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use ttv_fs::{AtomicWriteOptions, MoveFileOptions};

#[derive(Debug, Clone)]
pub struct Quarantine {
    rejects: PathBuf,
}

impl Quarantine {
    pub fn new(rejects: impl Into<PathBuf>) -> Self {
        Self {
            rejects: rejects.into(),
        }
    }

    pub fn rejects(&self) -> &Path { &self.rejects }

    /// Move `path` into the rejects directory and record why next to it.
    ///
    /// Returns where the input ended up, or `None` if it could not be moved.
    pub fn reject(&self, path: &Path, cause: &dyn StdError) -> Option<PathBuf> {
        let chain = cause_chain(cause);
        if path.symlink_metadata().is_err() {
            tracing::warn!(path = %path.display(), cause = %chain, "rejected input is gone, nothing to quarantine");
            return None;
        }
        if let Err(e) = ttv_fs::ensure_dir(&self.rejects) {
            tracing::error!(path = %path.display(), cause = %chain, error = %e, "cannot create rejects directory");
            return None;
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            tracing::error!(path = %path.display(), cause = %chain, "rejected input has no file name");
            return None;
        };
        let target = self.free_target(&name);

        let moved = if path.is_dir() {
            ttv_fs::move_dir(path, &target)
        } else {
            ttv_fs::move_file(path, &target, MoveFileOptions::new())
        };
        if let Err(e) = moved {
            tracing::error!(
                path = %path.display(),
                target = %target.display(),
                cause = %chain,
                error = %e,
                "failed to move rejected input"
            );
            return None;
        }

        let mut cause_name = target.file_name().unwrap_or_default().to_os_string();
        cause_name.push(".cause");
        let cause_file = target.with_file_name(cause_name);
        if let Err(e) = ttv_fs::atomic_write(&cause_file, format!("{chain}\n").as_bytes(), AtomicWriteOptions::new()) {
            tracing::warn!(path = %cause_file.display(), error = %e, "failed to record rejection cause");
        }

        tracing::warn!(path = %path.display(), target = %target.display(), cause = %chain, "input quarantined");
        Some(target)
    }

    /// Write `<rejects>/<batch name>.dispatch-failed` once per batch.
    ///
    /// Returns `false` when nothing new was recorded.
    pub fn record_dispatch_failure(&self, batch: &Path, cause: &dyn StdError) -> bool {
        let chain = cause_chain(cause);
        let name = batch.file_name().unwrap_or_default().to_string_lossy();
        let record = self.rejects.join(format!("{name}.dispatch-failed"));
        let content = format!("batch: {}\ncause: {chain}\n", batch.display());

        let written = ttv_fs::ensure_dir(&self.rejects)
            .and_then(|()| ttv_fs::write_new(&record, content.as_bytes()));
        match written {
            Ok(()) => {
                tracing::error!(batch = %batch.display(), record = %record.display(), cause = %chain, "dispatch failed, batch left in outbox");
                true
            }
            Err(ttv_fs::Error::AlreadyExists(_)) => {
                tracing::debug!(record = %record.display(), "dispatch failure already recorded");
                false
            }
            Err(e) => {
                tracing::error!(batch = %batch.display(), cause = %chain, error = %e, "failed to record dispatch failure");
                false
            }
        }
    }

    fn free_target(&self, name: &str) -> PathBuf {
        let target = self.rejects.join(name);
        if target.symlink_metadata().is_err() {
            return target;
        }
        let millis = chrono::Utc::now().timestamp_millis();
        ttv_fs::unique_child(&self.rejects, &format!("{name}-{millis}"))
    }
}

/// `outer: inner: innermost`
pub fn cause_chain(error: &dyn StdError) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        let text = e.to_string();
        // transparent wrappers repeat their source's message
        if !out.ends_with(&text) {
            let _ = write!(out, ": {text}");
        }
        source = e.source();
    }
    out
}
