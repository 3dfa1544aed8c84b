//! Tests for malformed and corrupted archive handling.
//!
//! These tests verify that asarpatch correctly detects and reports errors
//! when parsing malformed, truncated, or malicious archives, without
//! panicking.

mod common;

use std::io::Cursor;

use asarpatch::Error;
use asarpatch::read::Archive;
use tempfile::TempDir;

use common::raw_archive;

fn open(bytes: Vec<u8>) -> asarpatch::Result<Archive<Cursor<Vec<u8>>>> {
    Archive::open(Cursor::new(bytes))
}

// =============================================================================
// Prefix Tests
// =============================================================================

#[test]
fn test_empty_file() {
    let err = open(Vec::new()).err().unwrap();
    assert!(matches!(err, Error::CorruptHeader { offset: 0, .. }), "{err:?}");
}

#[test]
fn test_truncated_size_pickle() {
    let err = open(vec![4, 0, 0]).err().unwrap();
    assert!(err.is_corruption());

    let err = open(vec![4, 0, 0, 0, 16, 0]).err().unwrap();
    assert!(matches!(err, Error::CorruptHeader { offset: 4, .. }), "{err:?}");
}

#[test]
fn test_wrong_size_pickle_payload() {
    let mut bytes = raw_archive(r#"{"files":{}}"#, b"");
    bytes[0] = 8;
    let err = open(bytes).err().unwrap();
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_not_an_asar_file() {
    let err = open(b"PK\x03\x04 this is a zip file".to_vec()).err().unwrap();
    assert!(err.is_corruption());
}

#[test]
fn test_header_size_too_small() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(&[0; 16]);
    let err = open(bytes).err().unwrap();
    assert!(matches!(err, Error::CorruptHeader { .. }), "{err:?}");
}

#[test]
fn test_header_size_over_limit() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    let err = open(bytes).err().unwrap();
    assert!(matches!(err, Error::CorruptHeader { ref reason, .. } if reason.contains("limit")));
}

#[test]
fn test_header_truncated() {
    let mut bytes = raw_archive(r#"{"files":{"a":{"offset":"0","size":1}}}"#, b"a");
    bytes.truncate(20);
    let err = open(bytes).err().unwrap();
    assert!(matches!(err, Error::CorruptHeader { .. }), "{err:?}");
}

#[test]
fn test_json_length_exceeds_header() {
    let mut bytes = raw_archive(r#"{"files":{}}"#, b"");
    bytes[12..16].copy_from_slice(&1000u32.to_le_bytes());
    let err = open(bytes).err().unwrap();
    assert!(matches!(err, Error::CorruptHeader { .. }), "{err:?}");
}

// =============================================================================
// Header JSON Tests
// =============================================================================

#[test]
fn test_header_not_json() {
    let err = open(raw_archive("not json at all", b"")).err().unwrap();
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_header_not_utf8() {
    let mut bytes = raw_archive("{\"files\":{\"xx\":{}}}", b"");
    // Overwrite part of "files" with invalid UTF-8
    bytes[19] = 0xFF;
    bytes[20] = 0xFE;
    let err = open(bytes).err().unwrap();
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_header_root_not_directory() {
    let err = open(raw_archive(r#"{"offset":"0","size":0}"#, b"")).err().unwrap();
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_invalid_offset_string() {
    let json = r#"{"files":{"a.txt":{"offset":"abc","size":1}}}"#;
    let err = open(raw_archive(json, b"a")).err().unwrap();
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_packed_file_without_offset() {
    let json = r#"{"files":{"a.txt":{"size":1}}}"#;
    let err = open(raw_archive(json, b"a")).err().unwrap();
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_data_past_end_of_file() {
    let json = r#"{"files":{"a.txt":{"offset":"0","size":100}}}"#;
    let err = open(raw_archive(json, b"short")).err().unwrap();
    assert!(matches!(err, Error::CorruptHeader { ref reason, .. } if reason.contains("a.txt")));
}

#[test]
fn test_offset_overflow() {
    let json = r#"{"files":{"a.txt":{"offset":"18446744073709551615","size":2}}}"#;
    let err = open(raw_archive(json, b"ab")).err().unwrap();
    assert!(matches!(err, Error::CorruptHeader { .. }), "{err:?}");
}

// =============================================================================
// Path Safety Tests
// =============================================================================

#[test]
fn test_parent_directory_name_rejected() {
    let json = r#"{"files":{"..":{"files":{"evil.txt":{"offset":"0","size":1}}}}}"#;
    let err = open(raw_archive(json, b"x")).err().unwrap();
    assert!(matches!(err, Error::PathTraversal { .. }), "{err:?}");
}

#[test]
fn test_name_with_separator_rejected() {
    let json = r#"{"files":{"a/../../evil.txt":{"offset":"0","size":1}}}"#;
    let err = open(raw_archive(json, b"x")).err().unwrap();
    assert!(matches!(err, Error::PathTraversal { .. }), "{err:?}");
}

#[test]
fn test_link_escaping_root_not_extracted() {
    let temp = TempDir::new().unwrap();
    let json = r#"{"files":{"link":{"link":"../../etc/passwd"}}}"#;
    let mut archive = open(raw_archive(json, b"")).unwrap();

    let err = archive.extract(temp.path().join("out")).unwrap_err();
    assert!(matches!(err, Error::PathTraversal { .. }), "{err:?}");
    assert!(!temp.path().join("out/link").exists());
}

#[test]
fn test_size_mismatch_on_read() {
    // The header claims 3 bytes but the sidecar file holds 5.
    let temp = TempDir::new().unwrap();
    let json = r#"{"files":{"n.node":{"size":3,"unpacked":true}}}"#;
    let archive_path = temp.path().join("app.asar");
    std::fs::write(&archive_path, raw_archive(json, b"")).unwrap();
    common::write_tree(&temp.path().join("app.asar.unpacked"), &[("n.node", b"12345")]);

    let mut archive = Archive::open_path(&archive_path).unwrap();
    let err = archive.read("n.node").unwrap_err();
    assert!(err.is_corruption(), "{err:?}");
}
