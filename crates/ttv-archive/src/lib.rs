//! Zip package extraction with path sanitization and staged commit.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Entry path resolution (zip-slip prevention)
//! - `staging.rs` - Hidden sibling directory committed by rename
//! - `extract.rs` - Validate-then-write zip extraction
//! - `entry.rs` - Report types

pub use entry::{ArchiveReport, Entry, EntryKind};
pub use error::{Error, Result};
pub use extract::{absorb, extract_from_reader, extract_zip};
pub use sanitize::{SanitizedPath, normalize_root, sanitize_entry};
pub use staging::Staging;

mod entry;
mod error;
mod extract;
mod sanitize;
mod staging;
