//! Fuzz target for Archive::open with arbitrary byte input.
//!
//! Exercises the size pickle, header JSON and data range validation with
//! malformed or adversarial input, looking for panics and hangs.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let Ok(mut archive) = asarpatch::Archive::open(Cursor::new(data)) else {
        return;
    };

    // Every accepted entry path must be safe, and every packed file readable
    let entries = archive.entries().to_vec();
    for entry in &entries {
        assert!(!entry.path.components().any(|c| c == ".." || c == "."));
        if entry.is_file() {
            let _ = archive.read(entry.path.as_str());
        }
    }
});
