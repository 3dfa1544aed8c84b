//! Archive entry types.

use crate::ArchivePath;

/// What an archive entry is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory.
    Directory,
    /// A regular file.
    File {
        /// Absolute position of the data in the archive, `None` when unpacked.
        position: Option<u64>,
        /// Whether the executable bit is set.
        executable: bool,
        /// Whether the data lives in the `.unpacked` sidecar directory.
        unpacked: bool,
    },
    /// A symbolic link with a root-relative target.
    Link {
        /// Target path relative to the archive root.
        target: String,
    },
}

/// An entry in an asar archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The path of the entry within the archive.
    pub path: ArchivePath,
    /// File size in bytes (0 for directories and links).
    pub size: u64,
    /// Entry kind and kind-specific data.
    pub kind: EntryKind,
}

impl Entry {
    /// Returns true if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// Returns true if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File { .. })
    }

    /// Returns the link target if this entry is a symbolic link.
    pub fn link_target(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Link { target } => Some(target),
            _ => None,
        }
    }
}
