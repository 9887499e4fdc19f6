//! Architectural Enforcement Integration Tests
//!
//! Source scans that keep the rite honest:
//! - No sleep() calls in production code
//! - Generators stay pure: no ambient randomness, clocks or environment
//!
//! The helpers here are shared by the tests in `tests/`.

use std::fs;
use std::path::{Path, PathBuf};

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the pattern was found in
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Root of the workspace this crate lives in
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files under `dir`, relative to the workspace root
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Production lines of a source file with comments stripped
///
/// Everything from the first `#[cfg(test)]` on is test code and skipped.
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
        .filter(|(_, code)| !code.trim().is_empty())
        .collect()
}

/// Lines of production code in `files` matching any of `patterns`
pub fn find_patterns(files: &[PathBuf], patterns: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => continue,
        };
        for (line, code) in production_lines(&content) {
            if patterns.iter().any(|p| code.contains(p)) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: code.trim().to_string(),
                });
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n// note\nlet x = 1; // trailing\n#[cfg(test)]\nmod tests {}\n";
        let lines = production_lines(source);
        assert_eq!(lines, vec![(1, "fn a() {}"), (3, "let x = 1; ")]);
    }

    #[test]
    fn test_workspace_root_holds_the_rite() {
        assert!(workspace_root().join("rite/core/src/lib.rs").exists());
    }
}
