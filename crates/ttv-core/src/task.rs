//! One incoming package, from inbox to batch.

use std::path::PathBuf;

use ttv_vault::ArchiveDispatcher;

use crate::batch::{BatchRotator, Rotation};
use crate::error::{Error, Result};
use crate::item::TransferItem;
use crate::quarantine::{Quarantine, cause_chain};
use crate::resolve::IdentityResolver;

/// Everything a [`TransferTask`] needs. The worker owns it exclusively.
#[derive(Debug)]
pub struct TransferContext<R, D> {
    pub resolver:   R,
    pub rotator:    BatchRotator<D>,
    pub quarantine: Quarantine,
}

impl<R, D> TransferContext<R, D> {
    pub fn new(resolver: R, rotator: BatchRotator<D>, quarantine: Quarantine) -> Self {
        Self {
            resolver,
            rotator,
            quarantine,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// No transfer record; the package was left where it is.
    Unresolved,
    /// Extracted into the current batch, threshold not reached.
    Staged { nbn: String, version: u32 },
    /// Extracted, and the batch was sealed and dispatched.
    Sealed { batch: PathBuf },
    /// Extracted and sealed, but the hand-off failed. The batch is intact.
    DispatchFailed { batch: PathBuf },
    /// Extracted, but sealing the batch failed. The object version stays in
    /// the workspace and goes out with the next successful rotation.
    RotationDeferred {
        nbn:     String,
        version: u32,
        cause:   String,
    },
    /// Moved to the rejects directory (or left in place if even that failed).
    Rejected { cause: String },
}

impl TaskOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Staged { .. } => "staged",
            Self::Sealed { .. } => "sealed",
            Self::DispatchFailed { .. } => "dispatch-failed",
            Self::RotationDeferred { .. } => "rotation-deferred",
            Self::Rejected { .. } => "rejected",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferTask {
    package: PathBuf,
}

impl TransferTask {
    pub fn new(package: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
        }
    }

    /// Process the package. Failures end up in the outcome and the logs,
    /// never in a panic or an error return.
    pub fn run<R, D>(&self, ctx: &mut TransferContext<R, D>) -> TaskOutcome
    where
        R: IdentityResolver,
        D: ArchiveDispatcher,
    {
        let span = tracing::info_span!("transfer", package = %self.package.display());
        let _entered = span.enter();

        let item = match ctx.resolver.resolve(&self.package) {
            Ok(Some(item)) => item,
            Ok(None) => {
                tracing::warn!(path = %self.package.display(), "no transfer record for package, leaving it in place");
                return TaskOutcome::Unresolved;
            }
            Err(e) => return self.reject(&ctx.quarantine, &e),
        };

        if let Err(e) = self.stage(&item, &mut ctx.rotator) {
            if e.is_unsafe_archive() {
                tracing::error!(
                    security = true,
                    path = %self.package.display(),
                    error = %e,
                    "package tried to write outside its extraction root"
                );
            }
            return self.reject(&ctx.quarantine, &e);
        }

        // the package is consumed from here on; nothing left to quarantine
        match ctx.rotator.check_and_rotate() {
            Ok(Rotation::BelowThreshold { size }) => {
                tracing::debug!(size, threshold = ctx.rotator.threshold(), "batch below threshold");
                TaskOutcome::Staged {
                    nbn:     item.nbn,
                    version: item.ocfl_object_version_number,
                }
            }
            Ok(Rotation::Sealed {
                batch,
                dispatch: Ok(()),
                ..
            }) => {
                tracing::info!(batch = %batch.display(), "batch dispatched");
                TaskOutcome::Sealed { batch }
            }
            Ok(Rotation::Sealed {
                batch,
                dispatch: Err(e),
                ..
            }) => {
                ctx.quarantine.record_dispatch_failure(&batch, &e);
                TaskOutcome::DispatchFailed { batch }
            }
            Err(e) => {
                let cause = cause_chain(&e);
                tracing::error!(
                    nbn = %item.nbn,
                    version = item.ocfl_object_version_number,
                    error = %cause,
                    "batch rotation failed, object version stays in the workspace"
                );
                TaskOutcome::RotationDeferred {
                    nbn: item.nbn,
                    version: item.ocfl_object_version_number,
                    cause,
                }
            }
        }
    }

    /// Extract the package into its version directory.
    fn stage<D: ArchiveDispatcher>(&self, item: &TransferItem, rotator: &mut BatchRotator<D>) -> Result<()> {
        let workspace = rotator.workspace_mut();
        workspace.ensure_object_dir(&item.nbn)?;
        let version_dir = workspace.version_dir(&item.nbn, item.ocfl_object_version_number)?;

        let report = ttv_archive::absorb(&self.package, &version_dir)?;
        tracing::info!(
            nbn = %item.nbn,
            version = item.ocfl_object_version_number,
            entries = report.entry_count,
            bytes = report.total_bytes,
            "package extracted"
        );
        workspace.record_arrival(&item.nbn, item.ocfl_object_version_number, &version_dir);
        Ok(())
    }

    fn reject(&self, quarantine: &Quarantine, cause: &Error) -> TaskOutcome {
        quarantine.reject(&self.package, cause);
        TaskOutcome::Rejected {
            cause: cause_chain(cause),
        }
    }
}
