//! Pack/extract round-trip tests.
//!
//! These tests pack real directories with `create_package`, read them back
//! with `Archive` and `extract_all`, and compare the trees.

mod common;

use std::fs;
use std::io::Cursor;

use asarpatch::format::Node;
use asarpatch::{
    Archive, ArchivePath, EntryKind, Error, PackOptions, create_package,
    create_package_with_options, extract_all,
};
use tempfile::TempDir;

use common::{raw_archive, read_tree, write_tree};

const FILES: &[(&str, &[u8])] = &[
    ("package.json", br#"{"name":"app","main":"main.js"}"#),
    ("main.js", b"console.log('hello');\n"),
    ("src/lib/util.js", b"module.exports = 42;\n"),
    ("src/empty.txt", b""),
    ("static/logo.bin", &[0u8, 1, 2, 3, 255, 254, 253]),
];

#[test]
fn test_pack_extract_preserves_tree() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, FILES);
    let archive = temp.path().join("app.asar");

    let packed = create_package(&source, &archive).unwrap();
    assert_eq!(packed.files_packed, FILES.len());
    assert_eq!(packed.directories, 3); // src, src/lib, static

    let dest = temp.path().join("out");
    let extracted = extract_all(&archive, &dest).unwrap();
    assert_eq!(extracted.files_extracted, FILES.len());
    assert_eq!(read_tree(&source), read_tree(&dest));
}

#[test]
fn test_read_single_file() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, FILES);
    let archive_path = temp.path().join("app.asar");
    create_package(&source, &archive_path).unwrap();

    let mut archive = Archive::open_path(&archive_path).unwrap();
    assert_eq!(archive.read("src/lib/util.js").unwrap(), b"module.exports = 42;\n");
    assert_eq!(archive.read("src/empty.txt").unwrap(), b"");

    let err = archive.read("missing.js").unwrap_err();
    assert!(err.is_io_kind(std::io::ErrorKind::NotFound));
    // Directories are not readable as files
    assert!(archive.read("src").is_err());
}

#[test]
fn test_entries_are_sorted_preorder() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, &[("b.txt", b"b"), ("a/z.txt", b"z"), ("a/y.txt", b"y")]);
    let archive_path = temp.path().join("app.asar");
    create_package(&source, &archive_path).unwrap();

    let archive = Archive::open_path(&archive_path).unwrap();
    let names: Vec<&str> = archive.entries().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(names, ["a", "a/y.txt", "a/z.txt", "b.txt"]);
    assert!(archive.entry("a").unwrap().is_directory());
    assert_eq!(archive.entry("b.txt").unwrap().size, 1);
}

#[test]
fn test_integrity_records() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, &[("abc.txt", b"abc")]);
    let archive_path = temp.path().join("app.asar");
    create_package(&source, &archive_path).unwrap();

    let archive = Archive::open_path(&archive_path).unwrap();
    let node = archive.header().get(&ArchivePath::new("abc.txt").unwrap()).unwrap();
    let Node::File(file) = node else {
        panic!("expected file node, got {:?}", node);
    };
    let integrity = file.integrity.as_ref().expect("integrity record");
    assert_eq!(integrity.algorithm, "SHA256");
    assert_eq!(
        integrity.hash,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(integrity.block_size, 4 * 1024 * 1024);
    assert_eq!(integrity.blocks, vec![integrity.hash.clone()]);
}

#[test]
fn test_integrity_can_be_disabled() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, &[("a.txt", b"a")]);
    let archive_path = temp.path().join("app.asar");
    create_package_with_options(&source, &archive_path, &PackOptions::new().integrity(false))
        .unwrap();

    let archive = Archive::open_path(&archive_path).unwrap();
    let node = archive.header().get(&ArchivePath::new("a.txt").unwrap());
    assert!(matches!(node, Some(Node::File(f)) if f.integrity.is_none()));
}

#[test]
fn test_pack_replaces_existing_archive() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, &[("a.txt", b"first")]);
    let archive_path = temp.path().join("app.asar");
    create_package(&source, &archive_path).unwrap();

    fs::write(source.join("a.txt"), b"second").unwrap();
    create_package(&source, &archive_path).unwrap();

    let mut archive = Archive::open_path(&archive_path).unwrap();
    assert_eq!(archive.read("a.txt").unwrap(), b"second");
    assert!(!temp.path().join("app.asar.partial").exists());
}

#[test]
fn test_pack_empty_directory_fails() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("empty");
    fs::create_dir(&source).unwrap();
    let archive_path = temp.path().join("app.asar");

    let err = create_package(&source, &archive_path).unwrap_err();
    assert!(matches!(err, Error::EmptyDirectory(_)));
    assert!(!archive_path.exists());
}

#[test]
fn test_pack_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    let err = create_package(temp.path().join("nope"), temp.path().join("app.asar")).unwrap_err();
    assert!(err.is_io_kind(std::io::ErrorKind::NotFound));
}

#[test]
fn test_unpacked_entries_read_from_sidecar() {
    let temp = TempDir::new().unwrap();
    let json = r#"{"files":{"native.node":{"size":4,"unpacked":true},"a.txt":{"offset":"0","size":2}}}"#;
    let archive_path = temp.path().join("app.asar");
    fs::write(&archive_path, raw_archive(json, b"hi")).unwrap();
    write_tree(&temp.path().join("app.asar.unpacked"), &[("native.node", b"\x7fELF")]);

    let mut archive = Archive::open_path(&archive_path).unwrap();
    assert!(matches!(
        archive.entry("native.node").unwrap().kind,
        EntryKind::File { unpacked: true, position: None, .. }
    ));
    assert_eq!(archive.read("native.node").unwrap(), b"\x7fELF");

    let dest = temp.path().join("out");
    extract_all(&archive_path, &dest).unwrap();
    assert_eq!(fs::read(dest.join("native.node")).unwrap(), b"\x7fELF");
    assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"hi");
}

#[test]
fn test_unpacked_entry_without_sidecar_fails() {
    let json = r#"{"files":{"native.node":{"size":4,"unpacked":true}}}"#;
    let mut archive = Archive::open(Cursor::new(raw_archive(json, b""))).unwrap();
    assert!(archive.read("native.node").is_err());
}

#[cfg(unix)]
#[test]
fn test_executable_bit_round_trips() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, &[("bin/run.sh", b"#!/bin/sh\n"), ("data.txt", b"x")]);
    fs::set_permissions(source.join("bin/run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
    let archive_path = temp.path().join("app.asar");
    create_package(&source, &archive_path).unwrap();

    let archive = Archive::open_path(&archive_path).unwrap();
    assert!(matches!(
        archive.entry("bin/run.sh").unwrap().kind,
        EntryKind::File { executable: true, .. }
    ));
    assert!(matches!(
        archive.entry("data.txt").unwrap().kind,
        EntryKind::File { executable: false, .. }
    ));

    let dest = temp.path().join("out");
    extract_all(&archive_path, &dest).unwrap();
    let mode = fs::metadata(dest.join("bin/run.sh")).unwrap().permissions().mode();
    assert_ne!(mode & 0o100, 0);
}

#[cfg(unix)]
#[test]
fn test_symlinks_round_trip() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, &[("lib/real.js", b"real")]);
    fs::create_dir_all(source.join("alias")).unwrap();
    std::os::unix::fs::symlink("../lib/real.js", source.join("alias/link.js")).unwrap();
    let archive_path = temp.path().join("app.asar");

    let packed = create_package(&source, &archive_path).unwrap();
    assert_eq!(packed.links, 1);

    let archive = Archive::open_path(&archive_path).unwrap();
    assert_eq!(archive.entry("alias/link.js").unwrap().link_target(), Some("lib/real.js"));

    let dest = temp.path().join("out");
    let result = extract_all(&archive_path, &dest).unwrap();
    assert_eq!(result.links_created, 1);
    assert_eq!(
        fs::read_link(dest.join("alias/link.js")).unwrap(),
        std::path::PathBuf::from("../lib/real.js")
    );
    assert_eq!(fs::read(dest.join("alias/link.js")).unwrap(), b"real");
}

#[cfg(unix)]
#[test]
fn test_symlink_outside_package_rejected() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    write_tree(&source, &[("a.txt", b"a")]);
    write_tree(temp.path(), &[("outside.txt", b"secret")]);
    std::os::unix::fs::symlink("../outside.txt", source.join("escape")).unwrap();

    let err = create_package(&source, temp.path().join("app.asar")).unwrap_err();
    assert!(matches!(err, Error::LinkOutsidePackage { ref path, .. } if path == "escape"));
}
