use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: PathBuf,
    pub relative: PathBuf,
    pub resolved: PathBuf,
}

/// Resolve an archive entry name against `base` and make sure the result
/// stays inside `base`.
///
/// `base` is expected to be absolute and normalized; see [`normalize_root`].
/// The entry is joined *before* normalization, so `a/../../x` is caught as an
/// escape instead of being silently clamped to `x`.
pub fn sanitize_entry(name: &str, base: &Path) -> Result<SanitizedPath> {
    if name.contains('\0') {
        return Err(Error::InvalidPath(name.to_string()));
    }

    let entry_path = PathBuf::from(name);
    let resolved = normalize_path(&base.join(&entry_path));

    if !resolved.starts_with(base) {
        return Err(Error::ZipSlip {
            entry: entry_path,
            resolved,
        });
    }

    let relative = resolved
        .strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_default();

    Ok(SanitizedPath {
        original: entry_path,
        relative,
        resolved,
    })
}

/// Absolute, lexically normalized form of an extraction root.
pub fn normalize_root(base: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(base).map_err(|e| Error::ExtractionFailed {
        path:   base.to_path_buf(),
        source: e,
    })?;
    Ok(normalize_path(&absolute))
}

/// Resolve `.` and `..` lexically. `..` at the root stays at the root.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}
