//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the rite MUST NOT call sleep methods.
//! Pacing is done with `tokio::time::interval`; waiting is done on channels.
//! Test code is exempt.

use architectural_enforcement::{find_patterns, rust_files};

const SLEEP_PATTERNS: &[&str] = &["::sleep(", ".sleep(", "sleep_until("];

#[test]
fn test_no_sleep_in_production_code() {
    let mut files = rust_files("rite/core/src");
    files.extend(rust_files("rite/cli/src"));
    assert!(!files.is_empty(), "no sources found to scan");

    let violations = find_patterns(&files, SLEEP_PATTERNS);
    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {}", violation);
        }
        eprintln!("\n✅ Use tokio::time::interval() for pacing and channels for waiting.");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

#[test]
fn test_shatter_paces_frames_with_interval() {
    let files = rust_files("rite/core/src/shatter.rs");
    let found = find_patterns(&files, &["tokio::time::interval("]);
    assert!(
        !found.is_empty(),
        "shatter must pace frames with tokio::time::interval"
    );
}
