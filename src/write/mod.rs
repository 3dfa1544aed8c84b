//! Archive writing API for asar archives.
//!
//! Packing walks a directory in sorted pre-order, builds the header tree,
//! then streams every file's data after the header. The archive is written
//! to a temporary sibling and renamed over the target, so readers never see
//! a half-written archive.
//!
//! # Example
//!
//! ```rust,no_run
//! use asarpatch::write::create_package;
//!
//! let result = create_package("app", "app.asar")?;
//! println!("Packed {} files", result.files_packed);
//! # Ok::<(), asarpatch::Error>(())
//! ```

mod integrity;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::format::{FileNode, Node, encode_header};
use crate::{ArchivePath, Error, Result};

/// Options for packing a directory.
#[derive(Debug, Clone)]
pub struct PackOptions {
    integrity: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self { integrity: true }
    }
}

impl PackOptions {
    /// Creates default options (integrity records enabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables SHA-256 integrity records.
    pub fn integrity(mut self, enabled: bool) -> Self {
        self.integrity = enabled;
        self
    }
}

/// Summary of a packing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackResult {
    /// Number of regular files packed.
    pub files_packed: usize,
    /// Number of directories recorded.
    pub directories: usize,
    /// Number of symbolic links recorded.
    pub links: usize,
    /// Total bytes of file data.
    pub data_size: u64,
    /// Size of the header including its length prefix.
    pub header_size: u64,
}

/// A file queued for the data section.
struct PendingFile {
    source: PathBuf,
    path: ArchivePath,
    size: u64,
}

/// Packs the contents of `src` into a new archive at `dest` with default
/// options, replacing any existing file.
///
/// # Errors
///
/// Fails if `src` is missing, not a directory, or empty, if a symbolic link
/// points outside `src`, or if `dest` cannot be written.
pub fn create_package(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<PackResult> {
    create_package_with_options(src, dest, &PackOptions::default())
}

/// Packs the contents of `src` into `dest` using `options`.
pub fn create_package_with_options(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: &PackOptions,
) -> Result<PackResult> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if !fs::metadata(src)?.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", src.display()),
        )));
    }

    let (root, pending, mut result) = build_tree(src, options)?;
    if pending.is_empty() && result.directories == 0 && result.links == 0 {
        return Err(Error::EmptyDirectory(src.to_path_buf()));
    }

    let header = encode_header(&root)?;
    result.header_size = header.len() as u64;

    let partial = partial_path(dest);
    let written = write_archive(&partial, &header, &pending);
    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    fs::rename(&partial, dest)?;

    log::info!(
        "packed {} files ({} bytes) from {} into {}",
        result.files_packed,
        result.data_size,
        src.display(),
        dest.display()
    );
    Ok(result)
}

fn build_tree(src: &Path, options: &PackOptions) -> Result<(Node, Vec<PendingFile>, PackResult)> {
    let canonical_src = src.canonicalize()?;
    let mut root = Node::empty_dir();
    let mut pending = Vec::new();
    let mut result = PackResult::default();
    let mut offset = 0u64;

    let walker = WalkDir::new(src)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for item in walker {
        let item = item.map_err(|e| {
            e.into_io_error()
                .map(Error::Io)
                .unwrap_or_else(|| Error::InvalidFormat("file system loop while packing".into()))
        })?;
        let path = relative_archive_path(src, item.path())?;
        let parent = path.parent();
        let name = path.file_name().to_string();
        let file_type = item.file_type();

        let node = if file_type.is_dir() {
            result.directories += 1;
            Node::empty_dir()
        } else if file_type.is_symlink() {
            result.links += 1;
            Node::Link {
                link: link_target(&canonical_src, item.path(), &path)?,
            }
        } else {
            let metadata = item.metadata().map_err(|e| {
                Error::Io(e.into_io_error().unwrap_or_else(|| io::Error::other("metadata")))
            })?;
            let mut file = FileNode::new(offset, metadata.len());
            file.executable = is_executable(&metadata);
            if options.integrity {
                let mut reader = BufReader::new(File::open(item.path())?);
                let (integrity, size) = integrity::compute(&mut reader)?;
                file.size = size;
                file.integrity = Some(integrity);
            }
            pending.push(PendingFile {
                source: item.path().to_path_buf(),
                path: path.clone(),
                size: file.size,
            });
            offset += file.size;
            result.files_packed += 1;
            result.data_size += file.size;
            Node::File(file)
        };

        root.dir_mut(parent.as_ref())?.insert_child(&name, node)?;
    }

    Ok((root, pending, result))
}

fn write_archive(partial: &Path, header: &[u8], pending: &[PendingFile]) -> Result<()> {
    let mut out = BufWriter::new(File::create(partial)?);
    out.write_all(header)?;
    for file in pending {
        let source = File::open(&file.source)?;
        let copied = io::copy(&mut source.take(file.size), &mut out)?;
        if copied != file.size {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} changed while packing", file.path),
            )));
        }
    }
    out.into_inner().map_err(|e| Error::Io(e.into_error()))?.sync_all()?;
    Ok(())
}

/// Converts a walked path into an archive path relative to `root`.
fn relative_archive_path(root: &Path, path: &Path) -> Result<ArchivePath> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| Error::InvalidArchivePath(path.display().to_string()))?;
    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component.as_os_str().to_str().ok_or_else(|| {
            Error::InvalidArchivePath(format!("non UTF-8 name: {}", relative.display()))
        })?;
        segments.push(segment);
    }
    ArchivePath::new(&segments.join("/"))
}

/// Resolves a symlink to a target relative to the packed root.
fn link_target(canonical_root: &Path, link: &Path, path: &ArchivePath) -> Result<String> {
    let resolved = link.canonicalize()?;
    let relative = resolved
        .strip_prefix(canonical_root)
        .map_err(|_| Error::LinkOutsidePackage {
            path: path.to_string(),
            target: resolved.clone(),
        })?;
    let segments: Option<Vec<&str>> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect();
    match segments {
        Some(segments) if !segments.is_empty() => Ok(segments.join("/")),
        _ => Err(Error::LinkOutsidePackage {
            path: path.to_string(),
            target: resolved,
        }),
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}
