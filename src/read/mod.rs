//! Archive reading API for asar archives.
//!
//! This module provides listing, single-file reads and full extraction.
//!
//! # Example
//!
//! ```rust,no_run
//! use asarpatch::read::Archive;
//!
//! let mut archive = Archive::open_path("app.asar")?;
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.path, entry.size);
//! }
//! let package = archive.read("package.json")?;
//! # Ok::<(), asarpatch::Error>(())
//! ```

mod entry;
mod extraction;

pub use entry::{Entry, EntryKind};
pub use extraction::{ExtractResult, extract_all};

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{HeaderInfo, Node, read_header};
use crate::{Error, Result};

/// An opened asar archive.
pub struct Archive<R> {
    reader: R,
    root: Node,
    info: HeaderInfo,
    entries: Vec<Entry>,
    unpacked_dir: Option<PathBuf>,
}

impl Archive<BufReader<File>> {
    /// Opens an archive from a file path.
    ///
    /// Entries flagged as unpacked are resolved against the sibling
    /// `<path>.unpacked` directory.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = Self::open(BufReader::new(file))?;
        archive.unpacked_dir = Some(unpacked_dir_for(path));
        Ok(archive)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Opens an archive from a reader positioned at its start.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is malformed, an entry name is unsafe,
    /// or a file's data range lies past the end of the archive.
    pub fn open(mut reader: R) -> Result<Self> {
        let (root, info) = read_header(&mut reader)?;
        let total_len = reader.seek(SeekFrom::End(0))?;
        let data_len = total_len.saturating_sub(info.data_offset);

        let mut entries = Vec::new();
        for (path, node) in root.walk()? {
            let entry = match node {
                Node::Directory { .. } => Entry {
                    path,
                    size: 0,
                    kind: EntryKind::Directory,
                },
                Node::Link { link } => Entry {
                    path,
                    size: 0,
                    kind: EntryKind::Link {
                        target: link.clone(),
                    },
                },
                Node::File(file) => {
                    let position = match file.data_offset()? {
                        Some(offset) => {
                            let end = offset.checked_add(file.size);
                            if end.is_none_or(|end| end > data_len) {
                                return Err(Error::CorruptHeader {
                                    offset: info.data_offset,
                                    reason: format!(
                                        "data of '{}' ({} bytes at {}) lies past end of archive",
                                        path, file.size, offset
                                    ),
                                });
                            }
                            Some(info.data_offset + offset)
                        }
                        None => None,
                    };
                    Entry {
                        path,
                        size: file.size,
                        kind: EntryKind::File {
                            position,
                            executable: file.executable,
                            unpacked: file.unpacked,
                        },
                    }
                }
            };
            entries.push(entry);
        }

        Ok(Self {
            reader,
            root,
            info,
            entries,
            unpacked_dir: None,
        })
    }

    /// Sets the directory unpacked entries are read from.
    pub fn with_unpacked_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.unpacked_dir = Some(dir.into());
        self
    }

    /// Returns all entries in pre-order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the parsed header tree.
    pub fn header(&self) -> &Node {
        &self.root
    }

    /// Returns header location information.
    pub fn header_info(&self) -> HeaderInfo {
        self.info
    }

    /// Returns the entry at `path`, if present.
    pub fn entry(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path.as_str() == path)
    }

    /// Reads the full contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::ErrorKind::NotFound`] if there is no such file.
    pub fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .entry(path)
            .filter(|e| e.is_file())
            .cloned()
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no file '{}' in archive", path),
                ))
            })?;
        let mut data = Vec::with_capacity(entry.size as usize);
        self.copy_entry(&entry, &mut data)?;
        Ok(data)
    }

    /// Copies the data of a file entry into `out`, returning bytes copied.
    pub(crate) fn copy_entry<W: std::io::Write>(&mut self, entry: &Entry, out: &mut W) -> Result<u64> {
        let EntryKind::File { position, .. } = &entry.kind else {
            return Ok(0);
        };
        let copied = match position {
            Some(position) => {
                self.reader.seek(SeekFrom::Start(*position))?;
                std::io::copy(&mut (&mut self.reader).take(entry.size), out)?
            }
            None => {
                let dir = self.unpacked_dir.as_deref().ok_or_else(|| {
                    Error::InvalidFormat(format!(
                        "'{}' is unpacked but the archive has no sidecar directory",
                        entry.path
                    ))
                })?;
                let mut file = File::open(entry.path.to_fs_path(dir))?;
                std::io::copy(&mut file, out)?
            }
        };
        if copied != entry.size {
            return Err(Error::CorruptHeader {
                offset: position.unwrap_or(0),
                reason: format!(
                    "'{}' holds {} bytes, header says {}",
                    entry.path, copied, entry.size
                ),
            });
        }
        Ok(copied)
    }
}

/// Returns the sidecar directory holding unpacked entries of `archive`.
pub fn unpacked_dir_for(archive: &Path) -> PathBuf {
    let mut name = OsString::from(archive.as_os_str());
    name.push(".unpacked");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FileNode, encode_header};
    use std::io::Cursor;

    fn archive_bytes(root: &Node, data: &[u8]) -> Vec<u8> {
        let mut bytes = encode_header(root).unwrap();
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn test_read_file() {
        let mut root = Node::empty_dir();
        root.insert_child("a.txt", Node::File(FileNode::new(0, 6)))
            .unwrap();
        root.insert_child("b.txt", Node::File(FileNode::new(6, 3)))
            .unwrap();
        let bytes = archive_bytes(&root, b"hello\nbye");

        let mut archive = Archive::open(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.read("a.txt").unwrap(), b"hello\n");
        assert_eq!(archive.read("b.txt").unwrap(), b"bye");
        assert!(archive.read("c.txt").unwrap_err().is_io_kind(std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_data_past_end_is_corrupt() {
        let mut root = Node::empty_dir();
        root.insert_child("a.txt", Node::File(FileNode::new(4, 10)))
            .unwrap();
        let bytes = archive_bytes(&root, b"short");
        let err = Archive::open(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_unpacked_without_sidecar() {
        let mut root = Node::empty_dir();
        root.insert_child("n.node", Node::File(FileNode::unpacked(2)))
            .unwrap();
        let mut archive = Archive::open(Cursor::new(archive_bytes(&root, b""))).unwrap();
        assert!(matches!(archive.read("n.node"), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_unpacked_dir_for() {
        assert_eq!(
            unpacked_dir_for(Path::new("/x/app.asar")),
            PathBuf::from("/x/app.asar.unpacked")
        );
    }
}
