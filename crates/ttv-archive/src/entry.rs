use std::path::PathBuf;

/// An archive entry written to disk.
#[derive(Clone, Debug)]
pub struct Entry {
    pub original_path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,
    pub mode: Option<u32>,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(original_path: PathBuf, relative_path: PathBuf, size: u64, kind: EntryKind) -> Self {
        Self {
            original_path,
            relative_path,
            size,
            mode: None,
            kind,
        }
    }

    pub fn with_mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Clone, Debug, Default)]
pub struct ArchiveReport {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub entries: Vec<Entry>,
}

impl ArchiveReport {
    pub(crate) fn push(&mut self, entry: Entry) {
        // declared sizes come from the archive headers
        self.total_bytes = self.total_bytes.saturating_add(entry.size);
        self.entry_count += 1;
        self.entries.push(entry);
    }

    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_file())
    }
}
