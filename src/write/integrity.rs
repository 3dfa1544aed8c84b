//! SHA-256 integrity records for packed files.

use std::fmt::Write as _;
use std::io::Read;

use sha2::{Digest, Sha256};

use crate::format::{INTEGRITY_ALGORITHM, INTEGRITY_BLOCK_SIZE, Integrity};

/// Hashes `reader` to the end, returning the integrity record and the
/// number of bytes read.
pub(crate) fn compute<R: Read>(reader: &mut R) -> std::io::Result<(Integrity, u64)> {
    let mut whole = Sha256::new();
    let mut blocks = Vec::new();
    let mut buf = vec![0u8; INTEGRITY_BLOCK_SIZE];
    let mut total = 0u64;

    loop {
        let filled = fill_block(reader, &mut buf)?;
        if filled == 0 && !blocks.is_empty() {
            break;
        }
        let block = &buf[..filled];
        whole.update(block);
        blocks.push(to_hex(&Sha256::digest(block)));
        total += filled as u64;
        if filled < buf.len() {
            break;
        }
    }

    Ok((
        Integrity {
            algorithm: INTEGRITY_ALGORITHM.to_string(),
            hash: to_hex(&whole.finalize()),
            block_size: INTEGRITY_BLOCK_SIZE as u64,
            blocks,
        },
        total,
    ))
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
