//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use asarpatch::create_package;

/// Writes `files` under `root`, creating parent directories.
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (name, data) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, data).expect("Failed to write file");
    }
}

/// Reads every regular file under `root` into a map keyed by `/`-separated
/// relative path.
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.expect("Failed to walk directory"))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(root)
                .expect("Entry outside root")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let data = fs::read(entry.path()).expect("Failed to read file");
            (rel, data)
        })
        .collect()
}

/// A temporary install: `<tmp>/app.asar` packed from `files`, plus an empty
/// patch base directory at `<tmp>/base`.
pub struct Fixture {
    pub temp: TempDir,
    pub archive: PathBuf,
    pub base_dir: PathBuf,
}

impl Fixture {
    /// Creates the fixture with the given archive contents.
    pub fn new(files: &[(&str, &[u8])]) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let source = temp.path().join("source");
        write_tree(&source, files);
        let archive = temp.path().join("app.asar");
        create_package(&source, &archive).expect("Failed to pack fixture");
        fs::remove_dir_all(&source).expect("Failed to remove fixture source");

        let base_dir = temp.path().join("base");
        fs::create_dir_all(base_dir.join("patches")).expect("Failed to create patches dir");

        Self {
            temp,
            archive,
            base_dir,
        }
    }

    /// The working directory the patcher derives for the archive.
    pub fn work_dir(&self) -> PathBuf {
        self.temp.path().join("app")
    }

    /// Writes `patches/<feature>.diff`.
    pub fn add_patch(&self, feature: &str, text: &str) {
        let path = self.base_dir.join("patches").join(format!("{feature}.diff"));
        fs::write(path, text).expect("Failed to write patch");
    }

    /// Lists backup files next to the archive.
    pub fn backups(&self) -> Vec<PathBuf> {
        let mut backups: Vec<PathBuf> = fs::read_dir(self.temp.path())
            .expect("Failed to list temp dir")
            .map(|e| e.expect("Failed to read dir entry").path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("app.asar.") && n.ends_with(".backup"))
            })
            .collect();
        backups.sort();
        backups
    }
}

/// Builds raw archive bytes from a header JSON string and a data section,
/// bypassing the writer's validation.
pub fn raw_archive(json: &str, data: &[u8]) -> Vec<u8> {
    let json = json.as_bytes();
    let padded = (json.len() + 3) & !3;
    let payload_size = 4 + padded;
    let header_size = 4 + payload_size;

    let mut out = Vec::new();
    out.extend_from_slice(&4u32.to_le_bytes());
    out.extend_from_slice(&(header_size as u32).to_le_bytes());
    out.extend_from_slice(&(payload_size as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(json);
    out.resize(8 + header_size, 0);
    out.extend_from_slice(data);
    out
}
