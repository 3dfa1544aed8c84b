//! Asar archive format constants, header tree and low-level parsing.
//!
//! An asar archive is laid out as:
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 4 | `u32` LE, always [`SIZE_PICKLE_PAYLOAD`] |
//! | 4 | `u32` LE, length of the header pickle that follows |
//! | 4 | `u32` LE, header pickle payload length |
//! | 4 | `u32` LE, JSON string length |
//! | n | JSON header, zero padded to a multiple of 4 |
//! | .. | file data, addressed by offsets relative to this point |
//!
//! Both length prefixes are Chromium pickles: a `u32` payload size followed
//! by 4-byte aligned payload.

pub mod header;
pub mod node;
pub mod reader;

pub use header::{HeaderInfo, encode_header, read_header};
pub use node::{FileNode, Integrity, Node};

/// Payload size of the leading size pickle (one `u32`).
pub const SIZE_PICKLE_PAYLOAD: u32 = 4;

/// Bytes taken by the leading size pickle.
pub const SIZE_PICKLE_LEN: u64 = 8;

/// Largest header accepted when reading.
pub const MAX_HEADER_SIZE: u32 = 64 * 1024 * 1024;

/// Block size used for per-block integrity hashes.
pub const INTEGRITY_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Integrity algorithm name written to the header.
pub const INTEGRITY_ALGORITHM: &str = "SHA256";

/// Rounds `len` up to the pickle alignment.
#[inline]
pub(crate) fn align4(len: usize) -> usize {
    (len + 3) & !3
}
