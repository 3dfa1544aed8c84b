//! Fuzz target for unified-diff parsing and application.
//!
//! Run with: cargo +nightly fuzz run patch_parse
//!
//! The input is split at the first NUL byte: the part before is parsed as a
//! patch set, the part after is used as the source text for every file patch.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut parts = data.splitn(2, |&b| b == 0);
    let Ok(diff) = std::str::from_utf8(parts.next().unwrap_or_default()) else {
        return;
    };
    let source = String::from_utf8_lossy(parts.next().unwrap_or_default());

    let Ok(patches) = asarpatch::patch::parse_patch(diff) else {
        return;
    };
    for patch in &patches {
        for hunk in &patch.hunks {
            assert_eq!(hunk.old_side().count(), hunk.old_lines);
            assert_eq!(hunk.new_side().count(), hunk.new_lines);
        }
        let _ = asarpatch::patch::apply_patch(&source, patch);
    }
});
