//! The current batch workspace and its rotation into the outbox.
//!
//! Layout: `<current>/<nbn>/v<version>/<entry path>`. A rotation renames the
//! whole workspace to `<outbox>/batch-<unix millis>` in one step and starts a
//! fresh, empty workspace.

use std::path::{Path, PathBuf};

use ttv_fs::LockFile as WorkspaceLock;
use ttv_vault::ArchiveDispatcher;

use crate::error::{Error, Result};

/// The active accumulation directory.
#[derive(Debug)]
pub struct BatchWorkspace {
    root: PathBuf,
    arrivals: usize,
}

impl BatchWorkspace {
    /// Open (creating if needed) the workspace at `root`.
    ///
    /// Staging directories left by an interrupted extraction are removed so
    /// they neither count towards the threshold nor end up in a batch.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        ttv_fs::ensure_dir(&root)?;
        let workspace = Self { root, arrivals: 0 };
        workspace.sweep_staging()?;
        Ok(workspace)
    }

    fn sweep_staging(&self) -> Result<()> {
        for object in read_dir(&self.root)? {
            if !object.is_dir() {
                continue;
            }
            for stale in read_dir(&object)? {
                let is_staging = stale
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.') && n.ends_with(".staging"));
                if !is_staging {
                    continue;
                }
                tracing::warn!(path = %stale.display(), "removing leftover staging directory");
                std::fs::remove_dir_all(&stale).map_err(|e| ttv_fs::Error::Remove {
                    path:   stale.clone(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path { &self.root }

    /// Take the cross-process lock for the workspace at `root`. Take it
    /// before [`open`](Self::open), which cleans up the workspace.
    ///
    /// The lock file lives next to the workspace so it does not travel with
    /// a sealed batch.
    pub fn lock_root(root: &Path) -> Result<WorkspaceLock> {
        let mut name = root.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        let path = root.with_file_name(name);
        if let Some(parent) = path.parent() {
            ttv_fs::ensure_dir(parent)?;
        }
        Ok(WorkspaceLock::acquire(path)?)
    }

    pub fn object_dir(&self, nbn: &str) -> Result<PathBuf> {
        validate_nbn(nbn)?;
        Ok(self.root.join(nbn))
    }

    pub fn ensure_object_dir(&self, nbn: &str) -> Result<PathBuf> {
        let dir = self.object_dir(nbn)?;
        ttv_fs::ensure_dir(&dir)?;
        Ok(dir)
    }

    pub fn version_dir(&self, nbn: &str, version: u32) -> Result<PathBuf> {
        Ok(self.object_dir(nbn)?.join(format!("v{version}")))
    }

    /// Note an object version that extraction already placed under
    /// [`version_dir`](Self::version_dir).
    pub fn record_arrival(&mut self, nbn: &str, version: u32, extracted: &Path) {
        self.arrivals += 1;
        tracing::debug!(
            nbn,
            version,
            path = %extracted.display(),
            arrivals = self.arrivals,
            "object version staged"
        );
    }

    pub fn size(&self) -> Result<u64> {
        Ok(ttv_fs::dir_size(&self.root)?)
    }
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_failed = |e| ttv_fs::Error::Read {
        path:   dir.to_path_buf(),
        source: e,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_failed)? {
        paths.push(entry.map_err(read_failed)?.path());
    }
    Ok(paths)
}

fn validate_nbn(nbn: &str) -> Result<()> {
    let invalid = nbn.is_empty()
        || nbn == "."
        || nbn == ".."
        || nbn.contains(['/', '\\', '\0'])
        || nbn.starts_with('.');
    if invalid {
        return Err(Error::InvalidNbn(nbn.to_string()));
    }
    Ok(())
}

/// Result of a threshold check.
#[derive(Debug)]
pub enum Rotation {
    BelowThreshold {
        size: u64,
    },
    /// The workspace was sealed. `dispatch` holds the outcome of the hand-off;
    /// the batch itself stays on disk either way.
    Sealed {
        batch: PathBuf,
        size: u64,
        dispatch: ttv_vault::Result<()>,
    },
}

/// Seals the workspace once it grows past the threshold.
///
/// The threshold is a soft boundary: it is checked after each arrival, so a
/// sealed batch exceeds it by at most one package.
#[derive(Debug)]
pub struct BatchRotator<D> {
    workspace: BatchWorkspace,
    threshold: u64,
    outbox: PathBuf,
    dispatcher: D,
}

impl<D: ArchiveDispatcher> BatchRotator<D> {
    pub fn new(
        workspace: BatchWorkspace,
        threshold: u64,
        outbox: impl Into<PathBuf>,
        dispatcher: D,
    ) -> Result<Self> {
        let outbox = outbox.into();
        ttv_fs::ensure_dir(&outbox)?;
        Ok(Self {
            workspace,
            threshold,
            outbox,
            dispatcher,
        })
    }

    pub fn workspace(&self) -> &BatchWorkspace { &self.workspace }

    pub fn workspace_mut(&mut self) -> &mut BatchWorkspace { &mut self.workspace }

    pub fn threshold(&self) -> u64 { self.threshold }

    pub fn outbox(&self) -> &Path { &self.outbox }

    /// Seal and dispatch the workspace if it is larger than the threshold.
    ///
    /// A failed rename leaves the workspace untouched and is returned as an
    /// error; the next call simply tries again. Once the rename succeeded the
    /// batch belongs to the dispatcher and is never touched again from here.
    pub fn check_and_rotate(&mut self) -> Result<Rotation> {
        let size = self.workspace.size()?;
        if size <= self.threshold {
            return Ok(Rotation::BelowThreshold { size });
        }

        let batch = self.seal()?;
        tracing::info!(
            threshold = self.threshold,
            size,
            objects = self.workspace.arrivals,
            batch = %batch.display(),
            "threshold reached, sealed batch"
        );
        self.workspace.arrivals = 0;

        if let Err(e) = ttv_fs::ensure_dir(&self.workspace.root) {
            // the next ensure_object_dir recreates it
            tracing::warn!(path = %self.workspace.root.display(), error = %e, "failed to recreate batch workspace");
        }

        let dispatch = self.dispatcher.dispatch(&batch);
        Ok(Rotation::Sealed {
            batch,
            size,
            dispatch,
        })
    }

    fn seal(&self) -> Result<PathBuf> {
        let name = format!("batch-{}", chrono::Utc::now().timestamp_millis());
        let batch = ttv_fs::unique_child(&self.outbox, &name);
        ttv_fs::move_dir(&self.workspace.root, &batch)?;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct RecordingDispatcher {
        batches: RefCell<Vec<PathBuf>>,
    }

    impl ArchiveDispatcher for RecordingDispatcher {
        fn dispatch(&self, batch: &Path) -> ttv_vault::Result<()> {
            self.batches.borrow_mut().push(batch.to_path_buf());
            Ok(())
        }
    }

    fn stage(workspace: &BatchWorkspace, nbn: &str, version: u32, bytes: usize) {
        let dir = workspace.version_dir(nbn, version).unwrap();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("payload.bin"), vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn version_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = BatchWorkspace::open(dir.path().join("current")).unwrap();
        assert_eq!(
            workspace.version_dir("urn:nbn:nl:ui:13-abc", 3).unwrap(),
            dir.path().join("current/urn:nbn:nl:ui:13-abc/v3")
        );
    }

    #[test]
    fn nbn_cannot_escape_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = BatchWorkspace::open(dir.path().join("current")).unwrap();
        for nbn in ["", ".", "..", "../x", "a/b", ".hidden"] {
            assert!(
                matches!(workspace.object_dir(nbn), Err(Error::InvalidNbn(_))),
                "accepted {nbn:?}"
            );
        }
    }

    #[test]
    fn below_threshold_keeps_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = BatchWorkspace::open(dir.path().join("current")).unwrap();
        stage(&workspace, "urn:nbn:1", 1, 400);
        let mut rotator =
            BatchRotator::new(workspace, 1000, dir.path().join("outbox"), RecordingDispatcher::default()).unwrap();

        let rotation = rotator.check_and_rotate().unwrap();

        assert!(matches!(rotation, Rotation::BelowThreshold { size: 400 }));
        assert!(dir.path().join("current/urn:nbn:1/v1/payload.bin").exists());
        assert_eq!(std::fs::read_dir(dir.path().join("outbox")).unwrap().count(), 0);
    }

    #[test]
    fn exactly_at_threshold_does_not_rotate() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = BatchWorkspace::open(dir.path().join("current")).unwrap();
        stage(&workspace, "urn:nbn:1", 1, 1000);
        let mut rotator =
            BatchRotator::new(workspace, 1000, dir.path().join("outbox"), RecordingDispatcher::default()).unwrap();

        assert!(matches!(rotator.check_and_rotate().unwrap(), Rotation::BelowThreshold { .. }));
    }

    #[test]
    fn over_threshold_seals_and_dispatches() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = BatchWorkspace::open(dir.path().join("current")).unwrap();
        stage(&workspace, "urn:nbn:1", 1, 600);
        stage(&workspace, "urn:nbn:2", 1, 600);
        let mut rotator =
            BatchRotator::new(workspace, 1000, dir.path().join("outbox"), RecordingDispatcher::default()).unwrap();

        let rotation = rotator.check_and_rotate().unwrap();

        let Rotation::Sealed { batch, size, dispatch } = rotation else {
            panic!("expected a sealed batch");
        };
        assert_eq!(size, 1200);
        assert!(dispatch.is_ok());
        assert!(batch.starts_with(dir.path().join("outbox")));
        assert!(batch.file_name().unwrap().to_string_lossy().starts_with("batch-"));
        assert!(batch.join("urn:nbn:1/v1/payload.bin").exists());
        assert!(batch.join("urn:nbn:2/v1/payload.bin").exists());
        assert_eq!(*rotator.dispatcher.batches.borrow(), vec![batch.clone()]);

        let current = dir.path().join("current");
        assert!(current.is_dir());
        assert_eq!(std::fs::read_dir(&current).unwrap().count(), 0);
    }

    #[test]
    fn failed_rename_leaves_workspace_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = BatchWorkspace::open(dir.path().join("current")).unwrap();
        stage(&workspace, "urn:nbn:1", 1, 2000);
        let mut rotator =
            BatchRotator::new(workspace, 1000, dir.path().join("outbox"), RecordingDispatcher::default()).unwrap();
        // the outbox disappearing makes the rename fail
        std::fs::remove_dir(dir.path().join("outbox")).unwrap();

        assert!(rotator.check_and_rotate().is_err());
        assert!(dir.path().join("current/urn:nbn:1/v1/payload.bin").exists());
        assert!(rotator.dispatcher.batches.borrow().is_empty());

        std::fs::create_dir(dir.path().join("outbox")).unwrap();
        assert!(matches!(rotator.check_and_rotate().unwrap(), Rotation::Sealed { .. }));
    }

    #[test]
    fn open_removes_leftover_staging() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("current");
        let stale = current.join("urn:nbn:1/.v2.staging/data");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("half.bin"), vec![0u8; 500]).unwrap();
        std::fs::create_dir_all(current.join("urn:nbn:1/v1")).unwrap();
        std::fs::write(current.join("urn:nbn:1/v1/whole.bin"), vec![0u8; 100]).unwrap();

        let workspace = BatchWorkspace::open(&current).unwrap();

        assert!(!current.join("urn:nbn:1/.v2.staging").exists());
        assert!(current.join("urn:nbn:1/v1/whole.bin").exists());
        assert_eq!(workspace.size().unwrap(), 100);
    }

    #[test]
    fn lock_file_sits_next_to_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("work/current");

        let lock = BatchWorkspace::lock_root(&current).unwrap();

        assert_eq!(lock.path(), dir.path().join("work/current.lock"));
        assert!(matches!(
            BatchWorkspace::lock_root(&current),
            Err(Error::Fs(ttv_fs::Error::Locked(_)))
        ));
        BatchWorkspace::open(&current).unwrap();
        assert!(dir.path().join("work/current.lock").exists());
    }
}
