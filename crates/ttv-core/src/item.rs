use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

/// `<identifier>[-ttv<internal id>].zip`
static DVE_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<identifier>.+?)(?:-ttv(?P<internal_id>\d+))?\.zip$")
        .expect("valid filename pattern")
});

/// A logical object version known to the lookup service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferItem {
    pub nbn: String,
    pub ocfl_object_version_number: u32,
}

/// Identifying parts of an incoming package's file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilenameAttributes {
    pub dve_file_path: PathBuf,
    pub identifier: String,
    pub internal_id: Option<u64>,
}

impl FilenameAttributes {
    /// `None` when the file name does not have the package shape.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let captures = DVE_FILENAME.captures(name)?;
        let internal_id = match captures.name("internal_id") {
            Some(id) => Some(id.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            dve_file_path: path.to_path_buf(),
            identifier: captures["identifier"].to_string(),
            internal_id,
        })
    }
}
