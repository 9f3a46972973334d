//! Architectural Enforcement Integration Tests
//!
//! Shared source-scanning helpers for the tests in `tests/`, which enforce:
//! - No sleeping in engine code (time only moves through deadlines)
//! - No process-wide animation registry (every animator owns its state)

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// All `.rs` files under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|entry| entry.into_path())
        .collect()
}

/// Line with any `//` comment removed
#[must_use]
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Non-test lines of a file as `(line_number, code)`
///
/// Everything from the first `#[cfg(test)]` on is treated as test code;
/// test modules sit at the bottom of each file.
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, code_part(line)))
        .collect()
}

/// A rule violation ready for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the violation is in
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending source line
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text.trim())
    }
}

/// Run `matches` over the production lines of every file under `dir`
pub fn scan<F>(dir: &str, mut matches: F) -> Vec<Violation>
where
    F: FnMut(&Path, &[(usize, &str)], usize) -> bool,
{
    let mut violations = Vec::new();
    for path in rust_files(dir) {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        let lines = production_lines(&content);
        for (idx, (number, code)) in lines.iter().enumerate() {
            if matches(&path, &lines, idx) {
                violations.push(Violation {
                    path: path.clone(),
                    line: *number,
                    text: (*code).to_string(),
                });
            }
        }
    }
    violations
}

/// Print violations and fail
pub fn report(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\nCRITICAL: {rule}\n");
    for violation in violations {
        eprintln!("  {violation}");
    }
    panic!(
        "\nFound {} violation(s) of: {rule}\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_part_strips_comments() {
        assert_eq!(code_part("let x = 1; // sleep(1)"), "let x = 1; ");
        assert_eq!(code_part("/// docs"), "");
    }

    #[test]
    fn test_production_lines_stop_at_tests() {
        let content = "fn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}\n";
        assert_eq!(production_lines(content), vec![(1, "fn a() {}")]);
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
