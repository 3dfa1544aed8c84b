//! The JSON header tree of an asar archive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ArchivePath, Error, Result};

/// A node of the header tree.
///
/// The three shapes are distinguished by their keys: directories carry
/// `files`, links carry `link`, regular files carry `size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// A directory and its children, keyed by entry name.
    Directory {
        /// Child entries.
        files: BTreeMap<String, Node>,
    },
    /// A symbolic link; the target is relative to the archive root.
    Link {
        /// Link target relative to the archive root.
        link: String,
    },
    /// A regular file.
    File(FileNode),
}

/// Metadata of a regular file entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    /// Decimal offset of the data relative to the data section.
    ///
    /// Absent for files stored in the `.unpacked` sidecar directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    /// Size of the file in bytes.
    pub size: u64,
    /// Whether the file has the executable bit.
    #[serde(default, skip_serializing_if = "is_false")]
    pub executable: bool,
    /// Whether the file lives in the `.unpacked` sidecar directory.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unpacked: bool,
    /// Content hashes, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<Integrity>,
}

/// SHA-256 integrity record of a file entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrity {
    /// Hash algorithm name (`SHA256`).
    pub algorithm: String,
    /// Hex digest of the whole file.
    pub hash: String,
    /// Size of each hashed block.
    pub block_size: u64,
    /// Hex digests of each block.
    pub blocks: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FileNode {
    /// Creates a packed file entry at `offset` within the data section.
    pub fn new(offset: u64, size: u64) -> Self {
        Self {
            offset: Some(offset.to_string()),
            size,
            executable: false,
            unpacked: false,
            integrity: None,
        }
    }

    /// Creates an entry stored in the `.unpacked` sidecar directory.
    pub fn unpacked(size: u64) -> Self {
        Self {
            offset: None,
            size,
            executable: false,
            unpacked: true,
            integrity: None,
        }
    }

    /// Parses the data offset.
    ///
    /// Returns `Ok(None)` for unpacked entries.
    pub fn data_offset(&self) -> Result<Option<u64>> {
        match &self.offset {
            None if self.unpacked => Ok(None),
            None => Err(Error::InvalidFormat("packed file entry has no offset".into())),
            Some(offset) => offset
                .parse::<u64>()
                .map(Some)
                .map_err(|_| Error::InvalidFormat(format!("invalid file offset '{}'", offset))),
        }
    }
}

impl Node {
    /// Creates an empty directory node.
    pub fn empty_dir() -> Self {
        Self::Directory {
            files: BTreeMap::new(),
        }
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    /// Returns the children of a directory node.
    pub fn children(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Self::Directory { files } => Some(files),
            _ => None,
        }
    }

    /// Adds a child to this directory node, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if `name` is not a single safe
    /// path segment or this node is not a directory.
    pub fn insert_child(&mut self, name: &str, node: Node) -> Result<()> {
        if name.contains('/') {
            return Err(Error::InvalidArchivePath(format!(
                "entry name contains separator: {}",
                name
            )));
        }
        ArchivePath::new(name)?;
        match self {
            Self::Directory { files } => {
                files.insert(name.to_string(), node);
                Ok(())
            }
            _ => Err(Error::InvalidArchivePath(format!(
                "cannot add '{}' to a non-directory entry",
                name
            ))),
        }
    }

    /// Looks up a descendant by path.
    pub fn get(&self, path: &ArchivePath) -> Option<&Node> {
        path.components()
            .try_fold(self, |node, name| node.children()?.get(name))
    }

    /// Returns the directory at `path`, or this node for `None`.
    pub(crate) fn dir_mut(&mut self, path: Option<&ArchivePath>) -> Result<&mut Node> {
        let mut node = self;
        if let Some(path) = path {
            for name in path.components() {
                node = match node {
                    Self::Directory { files } => files.get_mut(name).ok_or_else(|| {
                        Error::InvalidArchivePath(format!("missing parent directory {}", path))
                    })?,
                    _ => {
                        return Err(Error::InvalidArchivePath(format!(
                            "{} is not a directory",
                            path
                        )));
                    }
                };
            }
        }
        if node.is_dir() {
            Ok(node)
        } else {
            Err(Error::InvalidArchivePath("parent is not a directory".into()))
        }
    }

    /// Lists every descendant in pre-order, parents before children and
    /// siblings sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathTraversal`] if an entry name is unsafe.
    pub fn walk(&self) -> Result<Vec<(ArchivePath, &Node)>> {
        let mut out = Vec::new();
        walk_into(self, None, &mut out)?;
        Ok(out)
    }
}

fn walk_into<'a>(
    node: &'a Node,
    prefix: Option<&ArchivePath>,
    out: &mut Vec<(ArchivePath, &'a Node)>,
) -> Result<()> {
    let Some(children) = node.children() else {
        return Ok(());
    };
    for (name, child) in children {
        let joined = match prefix {
            Some(prefix) => prefix.join(name),
            None if name.contains('/') => Err(Error::InvalidArchivePath(name.clone())),
            None => ArchivePath::new(name),
        };
        let path = joined.map_err(|_| Error::PathTraversal {
            path: match prefix {
                Some(prefix) => format!("{}/{}", prefix, name),
                None => name.clone(),
            },
        })?;
        out.push((path.clone(), child));
        walk_into(child, Some(&path), out)?;
    }
    Ok(())
}
