//! Identity resolution: which logical object version does a package hold?

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::item::{FilenameAttributes, TransferItem};

/// Maps an incoming package to its transfer record.
pub trait IdentityResolver {
    /// `Ok(None)` means the package is unknown, which is not an error.
    fn resolve(&self, package: &Path) -> Result<Option<TransferItem>>;
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for &R {
    fn resolve(&self, package: &Path) -> Result<Option<TransferItem>> {
        (**self).resolve(package)
    }
}

/// One row of the JSON catalog file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub identifier: String,
    #[serde(default)]
    pub internal_id: Option<u64>,
    pub nbn: String,
    pub ocfl_object_version_number: u32,
}

/// Resolver backed by a catalog exported from the transfer-item database.
#[derive(Debug, Default)]
pub struct CatalogResolver {
    items: HashMap<(String, Option<u64>), TransferItem>,
}

impl CatalogResolver {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read(path).map_err(|e| Error::CatalogRead {
            path:   path.to_path_buf(),
            source: e,
        })?;
        let records: Vec<CatalogRecord> =
            serde_json::from_slice(&content).map_err(|e| Error::CatalogFormat {
                path:   path.to_path_buf(),
                source: e,
            })?;
        let resolver = Self::from_records(records)?;
        tracing::info!(catalog = %path.display(), items = resolver.len(), "loaded transfer catalog");
        Ok(resolver)
    }

    pub fn from_records(records: impl IntoIterator<Item = CatalogRecord>) -> Result<Self> {
        let mut items = HashMap::new();
        for record in records {
            let key = (record.identifier, record.internal_id);
            if items.contains_key(&key) {
                return Err(Error::DuplicateCatalogEntry {
                    identifier:  key.0,
                    internal_id: key.1,
                });
            }
            items.insert(key, TransferItem {
                nbn: record.nbn,
                ocfl_object_version_number: record.ocfl_object_version_number,
            });
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn lookup(&self, attributes: &FilenameAttributes) -> Option<&TransferItem> {
        self.items
            .get(&(attributes.identifier.clone(), attributes.internal_id))
    }
}

impl IdentityResolver for CatalogResolver {
    fn resolve(&self, package: &Path) -> Result<Option<TransferItem>> {
        let Some(attributes) = FilenameAttributes::from_path(package) else {
            tracing::debug!(path = %package.display(), "file name is not a package name");
            return Ok(None);
        };
        tracing::debug!(?attributes, "filename attributes");
        Ok(self.lookup(&attributes).cloned())
    }
}
