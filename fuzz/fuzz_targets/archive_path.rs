//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Security properties being tested:
//! - Path traversal rejection (`..` segments)
//! - Absolute path rejection
//! - NUL byte handling

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(path_str) = std::str::from_utf8(data) else {
        return;
    };

    for result in [
        asarpatch::ArchivePath::new(path_str),
        asarpatch::ArchivePath::normalize(path_str),
    ] {
        let Ok(path) = result else {
            continue;
        };
        let normalized = path.as_str();

        assert!(
            !normalized.split('/').any(|seg| seg == ".." || seg == "." || seg.is_empty()),
            "Unsafe segment accepted: {:?}",
            normalized
        );
        assert!(
            !normalized.starts_with('/'),
            "Absolute path accepted: {:?}",
            normalized
        );
        assert!(
            !normalized.contains('\0') && !normalized.contains('\\'),
            "Invalid character accepted: {:?}",
            normalized
        );
    }
});
