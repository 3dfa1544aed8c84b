//! Unified-diff patch sets.
//!
//! A patch set is a unified-diff document covering one or more files. Each
//! [`FilePatch`] names a source and destination path; differing paths mean
//! the file is renamed, a missing source (`/dev/null`) means it is created,
//! a missing destination means it is deleted.
//!
//! # Example
//!
//! ```
//! use asarpatch::patch::{apply_patch, parse_patch};
//!
//! let text = "--- a.txt\n+++ a.txt\n@@ -1 +1 @@\n-hello\n+world\n";
//! let patches = parse_patch(text)?;
//! assert_eq!(apply_patch("hello\n", &patches[0])?, "world\n");
//! # Ok::<(), asarpatch::Error>(())
//! ```

mod apply;
mod parser;

pub use apply::apply_patch;
pub use parser::parse_patch;

use crate::ArchivePath;

/// One line of a hunk body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    /// Unchanged line present on both sides.
    Context(String),
    /// Line removed from the source.
    Remove(String),
    /// Line added to the destination.
    Add(String),
}

/// A contiguous block of line changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based first source line (0 with `old_lines == 0` means "before line 1").
    pub old_start: usize,
    /// Number of source lines covered.
    pub old_lines: usize,
    /// 1-based first destination line.
    pub new_start: usize,
    /// Number of destination lines covered.
    pub new_lines: usize,
    /// Hunk body.
    pub lines: Vec<HunkLine>,
    /// The source side ends without a trailing newline.
    pub old_missing_newline: bool,
    /// The destination side ends without a trailing newline.
    pub new_missing_newline: bool,
}

impl Hunk {
    /// Lines the source must contain at the hunk position.
    pub fn old_side(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            HunkLine::Context(text) | HunkLine::Remove(text) => Some(text.as_str()),
            HunkLine::Add(_) => None,
        })
    }

    /// Lines that replace the source lines.
    pub fn new_side(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            HunkLine::Context(text) | HunkLine::Add(text) => Some(text.as_str()),
            HunkLine::Remove(_) => None,
        })
    }
}

/// The changes to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    /// Source path; `None` when the file is created.
    pub old_path: Option<ArchivePath>,
    /// Destination path; `None` when the file is deleted.
    pub new_path: Option<ArchivePath>,
    /// Hunks in file order.
    pub hunks: Vec<Hunk>,
}

impl FilePatch {
    /// Returns true if the source and destination are both present and differ.
    pub fn is_rename(&self) -> bool {
        matches!((&self.old_path, &self.new_path), (Some(old), Some(new)) if old != new)
    }

    /// Returns true if the patch creates a new file.
    pub fn is_creation(&self) -> bool {
        self.old_path.is_none()
    }

    /// Returns true if the patch deletes its source.
    pub fn is_deletion(&self) -> bool {
        self.new_path.is_none()
    }

    /// Path used to identify the patch in messages.
    pub fn display_path(&self) -> &str {
        self.old_path
            .as_ref()
            .or(self.new_path.as_ref())
            .map(ArchivePath::as_str)
            .unwrap_or("/dev/null")
    }
}
