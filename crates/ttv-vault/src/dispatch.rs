use std::path::Path;

use crate::client::{ImportCommand, VaultApi};
use crate::error::Result;
use crate::tar::Archiver;

/// Hands a sealed batch over to long-term storage.
///
/// Archiving and registering the import form one step with one failure mode,
/// so the mechanism can change without touching the callers.
pub trait ArchiveDispatcher {
    fn dispatch(&self, batch: &Path) -> Result<()>;
}

impl<D: ArchiveDispatcher + ?Sized> ArchiveDispatcher for &D {
    fn dispatch(&self, batch: &Path) -> Result<()> {
        (**self).dispatch(batch)
    }
}

impl<D: ArchiveDispatcher + ?Sized> ArchiveDispatcher for Box<D> {
    fn dispatch(&self, batch: &Path) -> Result<()> {
        (**self).dispatch(batch)
    }
}

/// Archive with an [`Archiver`], then register the artifact with a
/// [`VaultApi`].
///
/// The import is attempted at most once per dispatch, and never when
/// archiving failed.
#[derive(Debug)]
pub struct VaultDispatcher<A, V> {
    archiver: A,
    vault: V,
    single_object: bool,
}

impl<A: Archiver, V: VaultApi> VaultDispatcher<A, V> {
    pub fn new(archiver: A, vault: V, single_object: bool) -> Self {
        Self {
            archiver,
            vault,
            single_object,
        }
    }
}

impl<A: Archiver, V: VaultApi> ArchiveDispatcher for VaultDispatcher<A, V> {
    fn dispatch(&self, batch: &Path) -> Result<()> {
        let artifact = self.archiver.archive(batch)?;
        self.vault.import(&ImportCommand {
            path:          artifact,
            single_object: self.single_object,
        })?;
        tracing::info!(batch = %batch.display(), "batch handed over to vault");
        Ok(())
    }
}
