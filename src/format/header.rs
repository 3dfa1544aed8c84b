//! Asar header prefix parsing and encoding.

use std::io::{ErrorKind, Read};

use super::node::Node;
use super::reader::{read_u32_le, u32_at};
use super::{MAX_HEADER_SIZE, SIZE_PICKLE_LEN, SIZE_PICKLE_PAYLOAD, align4};
use crate::{Error, Result};

/// Location information obtained while reading a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Length of the header pickle (JSON plus its own prefix and padding).
    pub header_size: u32,
    /// Length of the JSON text.
    pub json_size: u32,
    /// Absolute position where file data begins.
    pub data_offset: u64,
}

/// Parses the header prefix and JSON tree from the start of an archive.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] if the size pickle is wrong or the JSON
/// is not an asar directory tree, and [`Error::CorruptHeader`] if the
/// lengths are inconsistent or the header is truncated.
pub fn read_header<R: Read>(r: &mut R) -> Result<(Node, HeaderInfo)> {
    let size_payload = read_u32_le(r).map_err(truncated(0))?;
    if size_payload != SIZE_PICKLE_PAYLOAD {
        return Err(Error::InvalidFormat(format!(
            "size pickle payload is {}, expected {}",
            size_payload, SIZE_PICKLE_PAYLOAD
        )));
    }
    let header_size = read_u32_le(r).map_err(truncated(4))?;
    if header_size < 8 {
        return Err(Error::CorruptHeader {
            offset: 4,
            reason: format!("header size {} is too small", header_size),
        });
    }
    if header_size > MAX_HEADER_SIZE {
        return Err(Error::CorruptHeader {
            offset: 4,
            reason: format!(
                "header size {} exceeds limit of {} bytes",
                header_size, MAX_HEADER_SIZE
            ),
        });
    }

    let mut buf = vec![0u8; header_size as usize];
    r.read_exact(&mut buf).map_err(truncated(SIZE_PICKLE_LEN))?;

    // Checked above: buf holds at least 8 bytes.
    let payload_size = u32_at(&buf, 0).unwrap_or(0) as usize;
    let json_size = u32_at(&buf, 4).unwrap_or(0);
    if payload_size > buf.len() - 4 {
        return Err(Error::CorruptHeader {
            offset: SIZE_PICKLE_LEN,
            reason: format!(
                "pickle payload {} exceeds header size {}",
                payload_size, header_size
            ),
        });
    }
    let json_end = 8usize
        .checked_add(json_size as usize)
        .filter(|end| *end <= buf.len() && json_size as usize <= payload_size.saturating_sub(4))
        .ok_or_else(|| Error::CorruptHeader {
            offset: SIZE_PICKLE_LEN + 4,
            reason: format!("JSON length {} exceeds header size {}", json_size, header_size),
        })?;

    let json = std::str::from_utf8(&buf[8..json_end])
        .map_err(|e| Error::InvalidFormat(format!("header is not UTF-8: {}", e)))?;
    let root: Node = serde_json::from_str(json)
        .map_err(|e| Error::InvalidFormat(format!("header is not an asar tree: {}", e)))?;
    if !root.is_dir() {
        return Err(Error::InvalidFormat("header root is not a directory".into()));
    }

    let info = HeaderInfo {
        header_size,
        json_size,
        data_offset: SIZE_PICKLE_LEN + u64::from(header_size),
    };
    log::debug!(
        "read asar header: {} bytes JSON, data at {:#x}",
        json_size,
        info.data_offset
    );
    Ok((root, info))
}

/// Encodes a header tree into the bytes that precede file data.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] if the tree is not a directory or the
/// encoded header does not fit in a `u32`.
pub fn encode_header(root: &Node) -> Result<Vec<u8>> {
    if !root.is_dir() {
        return Err(Error::InvalidFormat("header root is not a directory".into()));
    }
    let json = serde_json::to_vec(root)
        .map_err(|e| Error::InvalidFormat(format!("cannot encode header: {}", e)))?;

    let padded = align4(json.len());
    let payload_size = 4 + padded;
    let header_size = 4 + payload_size;
    let too_large = || Error::InvalidFormat(format!("header of {} bytes is too large", header_size));
    let json_size = u32::try_from(json.len()).map_err(|_| too_large())?;
    let payload_size = u32::try_from(payload_size).map_err(|_| too_large())?;
    let header_size_u32 = u32::try_from(header_size).map_err(|_| too_large())?;

    let mut out = Vec::with_capacity(SIZE_PICKLE_LEN as usize + header_size);
    out.extend_from_slice(&SIZE_PICKLE_PAYLOAD.to_le_bytes());
    out.extend_from_slice(&header_size_u32.to_le_bytes());
    out.extend_from_slice(&payload_size.to_le_bytes());
    out.extend_from_slice(&json_size.to_le_bytes());
    out.extend_from_slice(&json);
    out.resize(SIZE_PICKLE_LEN as usize + header_size, 0);
    Ok(out)
}

fn truncated(offset: u64) -> impl FnOnce(std::io::Error) -> Error {
    move |e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::CorruptHeader {
                offset,
                reason: "truncated header".into(),
            }
        } else {
            Error::Io(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::node::FileNode;
    use std::io::Cursor;

    fn sample_tree() -> Node {
        let mut root = Node::empty_dir();
        root.insert_child("a.txt", Node::File(FileNode::new(0, 6)))
            .unwrap();
        root
    }

    #[test]
    fn test_encode_layout() {
        let bytes = encode_header(&sample_tree()).unwrap();
        assert_eq!(u32_at(&bytes, 0), Some(4));
        let header_size = u32_at(&bytes, 4).unwrap() as usize;
        assert_eq!(bytes.len(), 8 + header_size);
        assert_eq!(header_size % 4, 0);
        assert_eq!(u32_at(&bytes, 8).unwrap() as usize, header_size - 4);
        let json_size = u32_at(&bytes, 12).unwrap() as usize;
        let json = std::str::from_utf8(&bytes[16..16 + json_size]).unwrap();
        assert_eq!(json, r#"{"files":{"a.txt":{"offset":"0","size":6}}}"#);
    }

    #[test]
    fn test_read_encoded_header() {
        let bytes = encode_header(&sample_tree()).unwrap();
        let (root, info) = read_header(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(root, sample_tree());
        assert_eq!(info.data_offset, bytes.len() as u64);
    }

    #[test]
    fn test_wrong_size_pickle() {
        let mut bytes = encode_header(&sample_tree()).unwrap();
        bytes[0] = 5;
        let err = read_header(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = encode_header(&sample_tree()).unwrap();
        let err = read_header(&mut Cursor::new(&bytes[..bytes.len() - 3])).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_json_length_past_header() {
        let mut bytes = encode_header(&sample_tree()).unwrap();
        bytes[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = read_header(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_root_must_be_directory() {
        let file = Node::File(FileNode::new(0, 1));
        assert!(encode_header(&file).is_err());
    }
}
