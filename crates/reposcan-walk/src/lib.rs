//! Directory walk, classification predicates, and the filesystem
//! abstraction (§4.1, §6) that every collector in the workspace consumes.

pub mod classify;
pub mod fs;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use reposcan_exclude::PatternSet;
use reposcan_path::normalize_rel_path;

/// Test-root directory names recognized at the repo root (§4.1).
pub const TEST_ROOT_NAMES: &[&str] = &["tests", "test", "spec", "__tests__", "benches"];

/// Demo-path directory segments excluded from test-absence signals unless
/// `includeDemoPaths` is set.
pub const DEMO_PATH_SEGMENTS: &[&str] = &["examples", "demos", "samples"];

/// A single walked file, relative to the repo root with forward slashes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WalkedFile {
    pub rel_path: String,
}

/// Walk every regular file under `repo_path`, returning repo-relative,
/// forward-slash paths in deterministic lexicographic order.
///
/// Directories matching `excludes` are pruned (their entire subtree is
/// skipped); surviving files are matched against `excludes` then, if
/// `includes` is non-empty, against `includes`. Symlinks are resolved; a
/// link resolving outside `repo_path` is silently skipped.
pub fn walk_files(
    repo_path: &Path,
    excludes: &PatternSet,
    includes: &PatternSet,
) -> Result<Vec<WalkedFile>> {
    let repo_root = repo_path
        .canonicalize()
        .with_context(|| format!("failed to canonicalize {}", repo_path.display()))?;

    let mut out = Vec::new();
    let walker = WalkBuilder::new(repo_path)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .git_global(true)
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        if file_type.is_symlink() {
            let Ok(resolved) = path.canonicalize() else {
                continue;
            };
            if !resolved.starts_with(&repo_root) {
                continue;
            }
        }

        let Ok(rel) = path.strip_prefix(repo_path) else {
            continue;
        };
        let rel_path = normalize_rel_path(&rel.to_string_lossy());
        if rel_path.is_empty() {
            continue;
        }
        if excludes.is_match(&rel_path) {
            continue;
        }
        if !includes.is_empty() && !includes.is_match(&rel_path) {
            continue;
        }
        out.push(WalkedFile { rel_path });
    }

    out.sort();
    Ok(out)
}

/// Detect which of [`TEST_ROOT_NAMES`] exist as top-level directories of
/// `repo_path`.
pub fn detect_test_roots(repo_path: &Path) -> Vec<String> {
    TEST_ROOT_NAMES
        .iter()
        .filter(|name| repo_path.join(name).is_dir())
        .map(|name| (*name).to_string())
        .collect()
}

/// Is `rel_path` under a demo path segment (§3 `includeDemoPaths`)?
#[must_use]
pub fn is_demo_path(rel_path: &str) -> bool {
    normalize_rel_path(rel_path)
        .split('/')
        .any(|segment| DEMO_PATH_SEGMENTS.contains(&segment))
}

/// Build a [`WalkedFile`] set from plain relative path strings, for tests
/// and for collectors that already have a file list from a previous walk.
#[must_use]
pub fn walked_files_from(paths: impl IntoIterator<Item = impl Into<String>>) -> Vec<WalkedFile> {
    let mut out: Vec<WalkedFile> = paths
        .into_iter()
        .map(|p| WalkedFile {
            rel_path: normalize_rel_path(&p.into()),
        })
        .collect();
    out.sort();
    out
}

pub(crate) fn file_name(rel_path: &str) -> &str {
    rel_path.rsplit('/').next().unwrap_or(rel_path)
}

pub(crate) fn extension(rel_path: &str) -> Option<&str> {
    let name = file_name(rel_path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

#[allow(dead_code)]
pub(crate) fn parent(rel_path: &str) -> &str {
    match rel_path.rfind('/') {
        Some(idx) => &rel_path[..idx],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pattern_set(patterns: &[&str]) -> PatternSet {
        let owned: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        PatternSet::compile(&owned).unwrap()
    }

    #[test]
    fn walk_files_is_sorted_and_relative() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("b/z.rs"), "fn z() {}").unwrap();
        fs::write(tmp.path().join("a.rs"), "fn a() {}").unwrap();

        let files = walk_files(tmp.path(), &pattern_set(&[]), &pattern_set(&[])).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b/z.rs"]);
    }

    #[test]
    fn walk_files_prunes_excluded_directories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("node_modules/pkg")).unwrap();
        fs::write(tmp.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(tmp.path().join("main.rs"), "fn main() {}").unwrap();

        let excludes = pattern_set(&["**/node_modules/**"]);
        let files = walk_files(tmp.path(), &excludes, &pattern_set(&[])).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["main.rs"]);
    }

    #[test]
    fn walk_files_honors_includes_when_nonempty() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(tmp.path().join("readme.md"), "hi").unwrap();

        let includes = pattern_set(&["**/*.rs"]);
        let files = walk_files(tmp.path(), &pattern_set(&[]), &includes).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["main.rs"]);
    }

    #[test]
    fn detect_test_roots_finds_known_names() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("tests")).unwrap();
        fs::create_dir_all(tmp.path().join("benches")).unwrap();
        let roots = detect_test_roots(tmp.path());
        assert_eq!(roots, vec!["tests".to_string(), "benches".to_string()]);
    }

    #[test]
    fn is_demo_path_matches_any_segment() {
        assert!(is_demo_path("examples/foo.rs"));
        assert!(is_demo_path("pkg/demos/bar.rs"));
        assert!(!is_demo_path("src/examples_helper.rs"));
    }

    #[test]
    fn file_name_and_extension_helpers() {
        assert_eq!(file_name("a/b/c.rs"), "c.rs");
        assert_eq!(extension("a/b/c.rs"), Some("rs"));
        assert_eq!(extension("a/b/README"), None);
    }
}
