//! Exit codes for the CLI tool.

use asarpatch::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive format error
pub const BAD_ARCHIVE: i32 = 3;
/// Patch set did not parse or apply
pub const PATCH_FAILED: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// No archive could be located
pub const NOT_FOUND: i32 = 6;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    PatchFailed,
    IoError,
    NotFound,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::PatchFailed => PATCH_FAILED,
            Self::IoError => IO_ERROR,
            Self::NotFound => NOT_FOUND,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts an asarpatch error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(_) | Error::InvalidUtf8(_) => ExitCode::IoError,
        Error::ArchiveNotFound => ExitCode::NotFound,
        Error::InvalidFormat(_) | Error::CorruptHeader { .. } => ExitCode::BadArchive,
        Error::PathTraversal { .. } | Error::LinkOutsidePackage { .. } => ExitCode::FatalError,
        Error::InvalidArchivePath(_) => ExitCode::BadArgs,
        Error::EmptyDirectory(_) => ExitCode::BadArgs,
        Error::PatchParse { .. } | Error::PatchConflict { .. } => ExitCode::PatchFailed,
        Error::StageOrder { .. } => ExitCode::FatalError,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
