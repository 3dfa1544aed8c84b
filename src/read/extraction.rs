//! Full archive extraction to the file system.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use super::{Archive, EntryKind};
use crate::{ArchivePath, Error, Result};

/// Summary of an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractResult {
    /// Number of regular files written.
    pub files_extracted: usize,
    /// Number of directories created.
    pub directories_created: usize,
    /// Number of symbolic links created.
    pub links_created: usize,
    /// Number of links that could not be recreated on this platform.
    pub links_skipped: usize,
    /// Total bytes of file data written.
    pub bytes_extracted: u64,
}

/// Extracts every entry of the archive at `archive` into `dest`.
///
/// `dest` is created if it does not exist. Unpacked entries are copied from
/// the `<archive>.unpacked` sidecar directory.
///
/// # Errors
///
/// Fails on malformed archives, unsafe entry or link paths, and I/O errors.
/// Entries written before the failure are left in place.
pub fn extract_all(archive: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<ExtractResult> {
    let mut archive = Archive::open_path(archive)?;
    archive.extract(dest)
}

impl<R: Read + Seek> Archive<R> {
    /// Extracts every entry into `dest`, creating it if needed.
    pub fn extract(&mut self, dest: impl AsRef<Path>) -> Result<ExtractResult> {
        let dest = dest.as_ref();
        fs::create_dir_all(dest)?;

        let mut result = ExtractResult::default();
        let entries = self.entries.clone();
        for entry in &entries {
            let target = entry.path.to_fs_path(dest);
            match &entry.kind {
                EntryKind::Directory => {
                    fs::create_dir_all(&target)?;
                    result.directories_created += 1;
                }
                EntryKind::File { executable, .. } => {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    let mut out = BufWriter::new(File::create(&target)?);
                    result.bytes_extracted += self.copy_entry(entry, &mut out)?;
                    out.flush()?;
                    if *executable {
                        set_executable(&target)?;
                    }
                    result.files_extracted += 1;
                }
                EntryKind::Link { target: link } => {
                    let link_path = ArchivePath::new(link).map_err(|_| Error::PathTraversal {
                        path: link.clone(),
                    })?;
                    let relative = relative_link(&entry.path, &link_path);
                    if create_symlink(&relative, &target)? {
                        result.links_created += 1;
                    } else {
                        result.links_skipped += 1;
                    }
                }
            }
        }

        log::debug!(
            "extracted {} files, {} directories into {}",
            result.files_extracted,
            result.directories_created,
            dest.display()
        );
        Ok(result)
    }
}

/// Computes the target of a symlink at `link` pointing to the root-relative
/// `target`, expressed relative to the link's own directory.
pub(crate) fn relative_link(link: &ArchivePath, target: &ArchivePath) -> String {
    let mut from_segments: Vec<&str> = link.components().collect();
    from_segments.pop();
    let to_segments: Vec<&str> = target.components().collect();

    let common = from_segments
        .iter()
        .zip(&to_segments)
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = vec![".."; from_segments.len() - common];
    parts.extend_from_slice(&to_segments[common..]);
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(unix)]
fn create_symlink(relative: &str, at: &Path) -> Result<bool> {
    if let Some(parent) = at.parent() {
        fs::create_dir_all(parent)?;
    }
    if at.symlink_metadata().is_ok() {
        fs::remove_file(at)?;
    }
    std::os::unix::fs::symlink(relative, at)?;
    Ok(true)
}

#[cfg(not(unix))]
fn create_symlink(relative: &str, at: &Path) -> Result<bool> {
    log::warn!(
        "Skipping link '{}' -> '{}': symlinks are not supported here",
        at.display(),
        relative
    );
    Ok(false)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(link: &str, target: &str) -> String {
        relative_link(
            &ArchivePath::new(link).unwrap(),
            &ArchivePath::new(target).unwrap(),
        )
    }

    #[test]
    fn test_relative_link_same_dir() {
        assert_eq!(rel("a/link", "a/file"), "file");
        assert_eq!(rel("link", "file"), "file");
    }

    #[test]
    fn test_relative_link_across_dirs() {
        assert_eq!(rel("a/b/link", "c/file"), "../../c/file");
        assert_eq!(rel("a/b/link", "a/file"), "../file");
        assert_eq!(rel("link", "a/b/file"), "a/b/file");
    }

    #[test]
    fn test_relative_link_to_ancestor_dir() {
        assert_eq!(rel("a/b/link", "a"), "..");
    }
}
