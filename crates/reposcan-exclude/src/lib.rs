//! Exclude/include pattern normalization and matching.
//!
//! `reposcan-walk` merges [`default_excludes`] with the caller's
//! `CollectorOpts::exclude_patterns` before compiling a [`PatternSet`]; this
//! crate owns that merge and the compiled-matcher boundary so the rest of
//! the workspace never touches `globset` directly.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use reposcan_path::normalize_rel_path;

/// Default exclude list merged with user-supplied patterns (§3). Kept
/// deliberately small and directory-shaped so a single match skips an
/// entire subtree during traversal.
#[must_use]
pub fn default_excludes() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/target/**".to_string(),
        "**/vendor/**".to_string(),
        "**/dist/**".to_string(),
        "**/build/**".to_string(),
        "**/.venv/**".to_string(),
        "**/venv/**".to_string(),
        "**/__pycache__/**".to_string(),
        "**/.idea/**".to_string(),
        "**/.vscode/**".to_string(),
        "**/coverage/**".to_string(),
        "**/*.min.js".to_string(),
        "**/*.lock".to_string(),
    ]
}

/// Normalize a raw pattern: forward slashes, no leading `./`.
#[must_use]
pub fn normalize_pattern(pattern: &str) -> String {
    normalize_rel_path(pattern)
}

/// Append `pattern` to `patterns` unless an equivalent normalized entry is
/// already present. Returns whether the pattern was newly added.
pub fn add_pattern(patterns: &mut Vec<String>, pattern: &str) -> bool {
    let normalized = normalize_pattern(pattern);
    if patterns.iter().any(|p| normalize_pattern(p) == normalized) {
        return false;
    }
    patterns.push(normalized);
    true
}

/// A compiled, matchable set of glob patterns over repo-relative paths.
pub struct PatternSet {
    set: GlobSet,
}

impl PatternSet {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let normalized = normalize_pattern(pattern);
            let glob = Glob::new(&normalized)
                .with_context(|| format!("invalid glob pattern {normalized:?}"))?;
            builder.add(glob);
        }
        let set = builder.build().context("failed to compile pattern set")?;
        Ok(Self { set })
    }

    #[must_use]
    pub fn is_match(&self, rel_path: &str) -> bool {
        self.set.is_match(normalize_rel_path(rel_path))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Merge the default exclude list with user-supplied exclude patterns,
/// deduplicating.
#[must_use]
pub fn merge_excludes(user_patterns: &[String]) -> Vec<String> {
    let mut merged = default_excludes();
    for pattern in user_patterns {
        add_pattern(&mut merged, pattern);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excludes_cover_common_vendor_dirs() {
        let excludes = default_excludes();
        assert!(excludes.iter().any(|p| p.contains("node_modules")));
        assert!(excludes.iter().any(|p| p.contains(".git")));
    }

    #[test]
    fn add_pattern_dedupes_normalized_equivalents() {
        let mut patterns = vec!["./src/gen/**".to_string()];
        assert!(!add_pattern(&mut patterns, "src/gen/**"));
        assert_eq!(patterns.len(), 1);
    }

    #[test]
    fn add_pattern_dedupes_cross_platform_separators() {
        let mut patterns = vec!["src/gen/**".to_string()];
        assert!(!add_pattern(&mut patterns, r"src\gen\**"));
    }

    #[test]
    fn pattern_set_matches_directory_glob() {
        let set = PatternSet::compile(&["**/node_modules/**".to_string()]).unwrap();
        assert!(set.is_match("a/node_modules/b/index.js"));
        assert!(!set.is_match("a/src/index.js"));
    }

    #[test]
    fn merge_excludes_includes_both_default_and_user() {
        let merged = merge_excludes(&["custom/path/**".to_string()]);
        assert!(merged.iter().any(|p| p.contains("node_modules")));
        assert!(merged.iter().any(|p| p == "custom/path/**"));
    }
}
