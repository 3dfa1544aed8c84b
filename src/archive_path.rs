//! Validated relative paths for archive entries and patch targets.

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Maximum length for archive paths (in bytes).
const MAX_PATH_LENGTH: usize = 32768;

/// A validated path relative to an archive root or working directory.
///
/// Every path a patch set or an asar header names goes through this type
/// before it touches the file system, so a hostile patch or archive cannot
/// reach outside the working directory.
///
/// `ArchivePath` uses forward slashes and guarantees that:
/// - No NUL bytes are present
/// - The path is not absolute
/// - No empty, `.` or `..` segments exist
///
/// # Examples
///
/// ```
/// use asarpatch::ArchivePath;
///
/// let path = ArchivePath::new("src/main.js").unwrap();
/// assert_eq!(path.file_name(), "main.js");
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the path is empty, absolute,
    /// contains NUL bytes, or has empty, `.` or `..` segments.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Creates an `ArchivePath` from a loosely formatted path.
    ///
    /// Backslashes become forward slashes, leading `./` segments and a
    /// trailing slash are dropped. Used for file names taken from patch
    /// headers, which may be written on any platform.
    ///
    /// ```
    /// use asarpatch::ArchivePath;
    ///
    /// let path = ArchivePath::normalize(".\\src\\main.js").unwrap();
    /// assert_eq!(path.as_str(), "src/main.js");
    /// ```
    pub fn normalize(s: &str) -> Result<Self> {
        let mut normalized = s.replace('\\', "/");
        while let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest.to_string();
        }
        while normalized.ends_with('/') {
            normalized.pop();
        }
        Self::new(&normalized)
    }

    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        if s.starts_with('/') || s.contains('\\') || has_drive_prefix(s) {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }

        for segment in s.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidArchivePath(
                        "empty segment (consecutive or trailing slashes)".into(),
                    ));
                }
                "." => {
                    return Err(Error::InvalidArchivePath("'.' segment not allowed".into()));
                }
                ".." => {
                    return Err(Error::InvalidArchivePath(
                        "'..' segment not allowed (path traversal)".into(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins this path with a single entry name.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` contains a separator or is otherwise
    /// not a valid single segment.
    pub fn join(&self, name: &str) -> Result<Self> {
        if name.contains('/') {
            return Err(Error::InvalidArchivePath(format!(
                "entry name contains separator: {}",
                name
            )));
        }
        Self::new(&format!("{}/{}", self.0, name))
    }

    /// Returns the parent directory of this path, if any.
    pub fn parent(&self) -> Option<Self> {
        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Returns the file name (last segment) of this path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns an iterator over the path segments.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Resolves this path below `root` using native separators.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.components());
        path
    }
}

/// Returns true for `C:`-style prefixes.
fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}
