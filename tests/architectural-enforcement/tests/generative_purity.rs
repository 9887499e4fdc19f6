//! Integration Test: Generative Purity
//!
//! **Policy**: The generators (seed hashing, the stream, composition, text,
//! lexicon, colors, canvas and residue extraction) are pure functions of their
//! inputs. They MUST NOT reach for ambient randomness, clocks, the environment
//! or the async runtime. The same prompt must give the same artifact forever.

use architectural_enforcement::{find_patterns, rust_files};

const PURE_SOURCES: &[&str] = &[
    "rite/core/src/rng.rs",
    "rite/core/src/seed.rs",
    "rite/core/src/composition.rs",
    "rite/core/src/text.rs",
    "rite/core/src/lexicon.rs",
    "rite/core/src/color.rs",
    "rite/core/src/canvas.rs",
    "rite/core/src/residue",
];

const IMPURE_PATTERNS: &[&str] = &[
    "rand::",
    "thread_rng",
    "SystemTime",
    "Instant",
    "std::env",
    "tokio::",
];

#[test]
fn test_generators_use_no_ambient_state() {
    let files: Vec<_> = PURE_SOURCES.iter().flat_map(|dir| rust_files(dir)).collect();
    assert!(files.len() >= PURE_SOURCES.len(), "generator sources missing");

    let violations = find_patterns(&files, IMPURE_PATTERNS);
    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Ambient state used in generator code!\n");
        for violation in &violations {
            eprintln!("  ❌ {}", violation);
        }
        eprintln!("\n✅ Draw randomness from seed.stream(); pass time in as arguments.");

        panic!(
            "\nFound {} purity violation(s) in generator code.",
            violations.len()
        );
    }
}
