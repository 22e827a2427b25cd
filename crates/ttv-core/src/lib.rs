//! Staging of incoming packages into size-bounded batches.
//!
//! A [`TransferTask`] resolves a package to its object version, extracts it
//! into the current [`BatchWorkspace`], and lets the [`BatchRotator`] seal and
//! dispatch the batch once it passes the threshold. Anything that goes wrong
//! ends up in the [`Quarantine`].

mod batch;
mod config;
mod error;
mod item;
mod quarantine;
mod resolve;
mod task;

pub use batch::{BatchRotator, BatchWorkspace, Rotation};
pub use config::{ArchiverConfig, BatchConfig, Config, ENV_PREFIX, InboxConfig, VaultConfig};
pub use error::{Error, Result};
pub use item::{FilenameAttributes, TransferItem};
pub use quarantine::{Quarantine, cause_chain};
pub use resolve::{CatalogRecord, CatalogResolver, IdentityResolver};
pub use task::{TaskOutcome, TransferContext, TransferTask};

/// Held for as long as a worker owns the batch workspace.
pub use ttv_fs::LockFile as WorkspaceLock;
