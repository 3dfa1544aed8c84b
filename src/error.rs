//! Error types for asar patching operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when locating, unpacking, patching and repacking asar
//! archives, along with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! Nothing in this crate retries or swallows errors. Every failure aborts the
//! current operation and surfaces to the caller, leaving the working
//! directory in whatever state existed at that point:
//!
//! ```rust,no_run
//! use asarpatch::{Error, Patcher, PatcherOptions};
//!
//! fn patch(features: &[&str]) -> asarpatch::Result<()> {
//!     let patcher = Patcher::new(PatcherOptions::new().features(features.iter().copied()))?;
//!     let backup = patcher.backup_archive()?;
//!     patcher.unpack_archive()?;
//!     match patcher.patch_dir() {
//!         Ok(()) => {}
//!         Err(e @ Error::PatchConflict { .. }) => {
//!             eprintln!("Patch did not apply, original kept at {}", backup.display());
//!             return Err(e);
//!         }
//!         Err(e) => return Err(e),
//!     }
//!     patcher.pack_dir()?;
//!     patcher.remove_dir()
//! }
//! ```

use std::io;
use std::path::PathBuf;

use crate::workflow::Stage;

/// The main error type for asar patching operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Resolution | [`ArchiveNotFound`][Self::ArchiveNotFound] | No install found |
/// | I/O | [`Io`][Self::Io], [`InvalidUtf8`][Self::InvalidUtf8] | File system operations |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader] | Malformed archive |
/// | Security | [`PathTraversal`][Self::PathTraversal], [`LinkOutsidePackage`][Self::LinkOutsidePackage] | Unsafe entry names |
/// | Patching | [`PatchParse`][Self::PatchParse], [`PatchConflict`][Self::PatchConflict] | Bad or stale patch sets |
/// | Usage | [`StageOrder`][Self::StageOrder], [`EmptyDirectory`][Self::EmptyDirectory] | Steps run out of order |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    ///
    /// Check the underlying [`std::io::ErrorKind`] for specific handling:
    /// a patch referencing a missing source file surfaces as
    /// [`ErrorKind::NotFound`](std::io::ErrorKind::NotFound).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No archive path could be resolved.
    ///
    /// Returned by [`Patcher::new`](crate::Patcher::new) when neither an
    /// explicit archive path, a working directory, nor platform discovery
    /// produced a candidate.
    #[error("Can't find app.asar")]
    ArchiveNotFound,

    /// The archive format is invalid or not recognized.
    #[error("Invalid asar format: {0}")]
    InvalidFormat(String),

    /// The archive header is corrupt or points outside the file.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// An archive path failed validation.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// An archive entry or patch target would escape its root directory.
    #[error("Path traversal detected: {path}")]
    PathTraversal {
        /// The offending path.
        path: String,
    },

    /// A symbolic link inside the packed directory points outside of it.
    #[error("Link {path} points outside the package: {target}")]
    LinkOutsidePackage {
        /// The link path relative to the packed directory.
        path: String,
        /// The resolved link target.
        target: PathBuf,
    },

    /// The directory to pack has no entries.
    #[error("Directory is empty: {}", .0.display())]
    EmptyDirectory(PathBuf),

    /// A patch set is not valid unified-diff text.
    #[error("Patch parse error at line {line}: {reason}")]
    PatchParse {
        /// 1-based line number inside the patch set.
        line: usize,
        /// What was expected.
        reason: String,
    },

    /// A hunk does not apply cleanly to the current file content.
    #[error("Hunk #{hunk} does not apply to {file}")]
    PatchConflict {
        /// File the patch targets (source path).
        file: String,
        /// 1-based hunk index within the file patch.
        hunk: usize,
    },

    /// A file expected to hold text is not valid UTF-8.
    #[error("File is not valid UTF-8: {}", .0.display())]
    InvalidUtf8(PathBuf),

    /// A workflow step was invoked out of order.
    #[error("Workflow step requires stage {expected}, current stage is {actual}")]
    StageOrder {
        /// Stage the step requires.
        expected: Stage,
        /// Stage the workflow is in.
        actual: Stage,
    },
}

impl Error {
    /// Returns true if this error indicates a damaged archive.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptHeader { .. } | Self::InvalidFormat(_))
    }

    /// Returns true if this error came from parsing or applying a patch set.
    pub fn is_patch_failure(&self) -> bool {
        matches!(self, Self::PatchParse { .. } | Self::PatchConflict { .. })
    }

    /// Returns true if this is an I/O error of the given kind.
    pub fn is_io_kind(&self, kind: io::ErrorKind) -> bool {
        matches!(self, Self::Io(e) if e.kind() == kind)
    }
}

/// A specialized Result type for asar patching operations.
pub type Result<T> = std::result::Result<T, Error>;
