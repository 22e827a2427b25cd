//! Zip extraction.
//!
//! Every entry name is sanitized before the first byte is written, so an
//! archive carrying a single escaping entry leaves no trace on disk. Parent
//! directories are always created explicitly because packages produced by
//! some repositories omit directory entries.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use crate::entry::{ArchiveReport, Entry, EntryKind};
use crate::error::{Error, Result};
use crate::sanitize::{SanitizedPath, normalize_root, sanitize_entry};
use crate::staging::Staging;

struct PlannedEntry {
    index: usize,
    path: SanitizedPath,
    kind: EntryKind,
    size: u64,
    mode: Option<u32>,
}

/// Extract a zip stream directly into `destination`.
///
/// `destination` is created if missing. Nothing is staged: on failure the
/// caller owns whatever was written. Prefer [`extract_zip`] for
/// all-or-nothing semantics.
pub fn extract_from_reader<R: Read + Seek>(reader: R, destination: &Path) -> Result<ArchiveReport> {
    extract_archive(reader, destination, destination)
}

/// Extract the zip file at `archive` into `destination` through a staging
/// directory.
///
/// `destination` must not exist yet. It appears with its complete content or
/// not at all.
pub fn extract_zip(archive: &Path, destination: &Path) -> Result<ArchiveReport> {
    if destination.symlink_metadata().is_ok() {
        return Err(Error::AlreadyExtracted(destination.to_path_buf()));
    }
    let file = File::open(archive).map_err(|e| Error::Open {
        path:   archive.to_path_buf(),
        source: e,
    })?;

    let staging = Staging::new(destination)?;
    let report = extract_archive(file, staging.path(), archive)?;
    staging.commit()?;

    tracing::debug!(
        archive = %archive.display(),
        destination = %destination.display(),
        entries = report.entry_count,
        bytes = report.total_bytes,
        "extracted archive"
    );
    Ok(report)
}

/// Extract `archive` into `destination` and delete the archive afterwards.
///
/// On any failure the archive is left where it is.
pub fn absorb(archive: &Path, destination: &Path) -> Result<ArchiveReport> {
    let report = extract_zip(archive, destination)?;
    ttv_fs::remove_file_if_exists(archive)?;
    Ok(report)
}

fn extract_archive<R: Read + Seek>(
    reader: R,
    destination: &Path,
    origin: &Path,
) -> Result<ArchiveReport> {
    let corrupted = |e| Error::Corrupted {
        path:   origin.to_path_buf(),
        source: e,
    };

    let root = normalize_root(destination)?;
    let mut archive = zip::ZipArchive::new(reader).map_err(corrupted)?;

    let mut planned = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index(index).map_err(corrupted)?;
        let path = match sanitize_entry(file.name(), &root) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(
                    archive = %origin.display(),
                    entry = file.name(),
                    "archive entry escapes extraction root"
                );
                return Err(e);
            }
        };
        let kind = if file.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        if kind == EntryKind::File && path.relative.as_os_str().is_empty() {
            return Err(Error::InvalidPath(file.name().to_string()));
        }
        planned.push(PlannedEntry {
            index,
            path,
            kind,
            size: file.size(),
            mode: file.unix_mode(),
        });
    }

    ensure_directory(&root)?;

    let mut report = ArchiveReport::default();
    for entry in planned {
        let target = &entry.path.resolved;
        match entry.kind {
            EntryKind::Directory => ensure_directory(target)?,
            EntryKind::File => {
                if let Some(parent) = target.parent() {
                    ensure_directory(parent)?;
                }
                let mut file = archive.by_index(entry.index).map_err(corrupted)?;
                write_file(&mut file, target)?;
                if let Some(mode) = entry.mode {
                    apply_mode(target, mode)?;
                }
            }
        }

        report.push(
            Entry::new(
                entry.path.original,
                entry.path.relative,
                entry.size,
                entry.kind,
            )
            .with_mode(entry.mode),
        );
    }

    Ok(report)
}

fn write_file(reader: &mut impl Read, target: &Path) -> Result<()> {
    let failed = |e| Error::ExtractionFailed {
        path:   target.to_path_buf(),
        source: e,
    };
    let mut out = File::create(target).map_err(failed)?;
    std::io::copy(reader, &mut out).map_err(failed)?;
    Ok(())
}

/// Keep the archived permission bits of a file, minus setuid/setgid/sticky,
/// and never less than owner read-write plus world read.
#[cfg(unix)]
fn apply_mode(target: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let perms = std::fs::Permissions::from_mode((mode & 0o777) | 0o644);
    std::fs::set_permissions(target, perms).map_err(|e| Error::ExtractionFailed {
        path:   target.to_path_buf(),
        source: e,
    })
}

#[cfg(not(unix))]
fn apply_mode(_target: &Path, _mode: u32) -> Result<()> { Ok(()) }

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
            path:   PathBuf::from(path),
            source: e,
        })?;
    }
    Ok(())
}
