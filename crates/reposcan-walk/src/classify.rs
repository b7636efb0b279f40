//! Test-file recognition (§4.1 table) and the parallel-tree fallback.

use std::collections::BTreeSet;

use crate::{extension, file_name};

/// Source extensions the engine treats as analyzable code (§4.2 source
/// extension list, reused by classification and several collectors).
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "go", "py", "js", "ts", "jsx", "tsx", "java", "rs", "rb", "php", "swift", "scala", "ex", "exs",
    "kt", "cs",
];

/// Is `rel_path` a test file purely by name/location, per the §4.1 table?
/// For Rust, this covers the `_test.rs`/`tests/X.rs` forms; the inline
/// `#[cfg(test)]` form requires file content and is checked separately via
/// [`has_inline_rust_test`].
#[must_use]
pub fn is_test_file_by_name(rel_path: &str) -> bool {
    let Some(ext) = extension(rel_path) else {
        return false;
    };
    let name = file_name(rel_path);
    let stem = name.strip_suffix(&format!(".{ext}")).unwrap_or(name);

    match ext {
        "go" => stem.ends_with("_test"),
        "js" | "jsx" | "ts" | "tsx" => stem.contains(".test") || stem.contains(".spec"),
        "py" => {
            stem.starts_with("test_")
                || stem.ends_with("_test")
                || rel_path.split('/').any(|seg| seg == "tests")
        }
        "rb" => {
            stem.ends_with("_spec") || stem.ends_with("_test") || stem.starts_with("test_")
        }
        "java" | "kt" => {
            stem.ends_with("Test") || stem.ends_with("Tests") || stem.ends_with("Spec")
        }
        "rs" => {
            stem.ends_with("_test")
                || rel_path.starts_with("tests/")
                || rel_path.contains("/tests/")
        }
        "cs" => {
            stem.ends_with("Tests")
                || stem.ends_with("Test")
                || rel_path.contains(".Tests")
                || rel_path.contains(".UnitTests")
                || rel_path.contains(".IntegrationTests")
        }
        "scala" => {
            stem.ends_with("Test")
                || stem.ends_with("Tests")
                || stem.ends_with("Spec")
                || stem.ends_with("Suite")
        }
        "ex" | "exs" => stem.ends_with("_test"),
        "php" => {
            stem.ends_with("Test")
                || stem.ends_with("_test")
                || rel_path.split('/').any(|seg| seg == "tests")
        }
        "swift" => {
            stem.ends_with("Tests")
                || stem.ends_with("Test")
                || rel_path.contains("Tests/")
        }
        _ => false,
    }
}

/// Rust's inline form: `#[cfg(test)]` appears anywhere in the file. Scans
/// the full file, per §4.1.
#[must_use]
pub fn has_inline_rust_test(lines: &[String]) -> bool {
    lines.iter().any(|line| line.contains("#[cfg(test)]"))
}

/// Combined test-file predicate. `lines` is only consulted for `.rs` files;
/// pass `None` when content isn't available (name-only classification still
/// covers most cases).
#[must_use]
pub fn is_test_file(rel_path: &str, lines: Option<&[String]>) -> bool {
    if is_test_file_by_name(rel_path) {
        return true;
    }
    if extension(rel_path) == Some("rs")
        && let Some(lines) = lines
        && has_inline_rust_test(lines)
    {
        return true;
    }
    false
}

/// Candidate test-counterpart paths for `source_rel_path`, used by the
/// patterns collector's missing-tests rule and by the general parallel-tree
/// fallback. Not exhaustive membership-checking — callers intersect the
/// result with the actual file set.
fn candidate_counterparts(source_rel_path: &str, test_roots: &[String]) -> Vec<String> {
    let Some(ext) = extension(source_rel_path) else {
        return Vec::new();
    };
    let name = file_name(source_rel_path);
    let stem = name.strip_suffix(&format!(".{ext}")).unwrap_or(name);
    let dir = crate::parent(source_rel_path);

    let mut candidates = Vec::new();
    let push_in_dir = |candidates: &mut Vec<String>, fname: String| {
        if dir.is_empty() {
            candidates.push(fname);
        } else {
            candidates.push(format!("{dir}/{fname}"));
        }
    };

    match ext {
        "go" => push_in_dir(&mut candidates, format!("{stem}_test.go")),
        "rb" => {
            push_in_dir(&mut candidates, format!("{stem}_spec.rb"));
            push_in_dir(&mut candidates, format!("{stem}_test.rb"));
        }
        "rs" => {
            candidates.push(format!("tests/{stem}.rs"));
            candidates.push(format!("tests/{stem}/mod.rs"));
            push_in_dir(&mut candidates, format!("{stem}_test.rs"));
        }
        "py" => {
            push_in_dir(&mut candidates, format!("test_{stem}.py"));
            push_in_dir(&mut candidates, format!("{stem}_test.py"));
        }
        "ex" => {
            candidates.push(format!("test/{stem}_test.exs"));
        }
        "php" => {
            push_in_dir(&mut candidates, format!("{stem}Test.php"));
        }
        "java" => push_in_dir(&mut candidates, format!("{stem}Test.java")),
        "kt" => push_in_dir(&mut candidates, format!("{stem}Test.kt")),
        "swift" => candidates.push(format!("Tests/{stem}Tests.swift")),
        _ => {}
    }

    // Java/Kotlin Maven-style mirror: src/main/{java,kotlin}/X -> src/test/{..}/XTest.
    for lang_dir in ["java", "kotlin"] {
        if let Some(rest) = source_rel_path
            .strip_prefix(&format!("src/main/{lang_dir}/"))
        {
            let rest_dir = crate::parent(rest);
            let rest_name = file_name(rest);
            let rest_stem = rest_name
                .rsplit_once('.')
                .map(|(s, _)| s)
                .unwrap_or(rest_name);
            let test_name = format!("{rest_stem}Test.{ext}");
            let test_path = if rest_dir.is_empty() {
                format!("src/test/{lang_dir}/{test_name}")
            } else {
                format!("src/test/{lang_dir}/{rest_dir}/{test_name}")
            };
            candidates.push(test_path);
        }
    }

    // Generic parallel-tree fallback: for each detected test root, try the
    // source's relative path with progressively more leading components
    // stripped, rooted under the test root.
    let segments: Vec<&str> = source_rel_path.split('/').collect();
    for root in test_roots {
        for strip in 0..segments.len() {
            let suffix = segments[strip..].join("/");
            if suffix.is_empty() {
                continue;
            }
            candidates.push(format!("{root}/{suffix}"));
        }
    }

    candidates
}

/// Does `source_rel_path` have a test counterpart present in `all_paths`,
/// per §4.1's per-extension rules plus the parallel-tree fallback?
#[must_use]
pub fn has_test_counterpart(
    source_rel_path: &str,
    all_paths: &BTreeSet<String>,
    test_roots: &[String],
) -> bool {
    candidate_counterparts(source_rel_path, test_roots)
        .iter()
        .any(|candidate| all_paths.contains(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_test_file_recognized_by_suffix() {
        assert!(is_test_file_by_name("pkg/foo_test.go"));
        assert!(!is_test_file_by_name("pkg/foo.go"));
    }

    #[test]
    fn js_test_and_spec_suffixes_recognized() {
        assert!(is_test_file_by_name("src/foo.test.ts"));
        assert!(is_test_file_by_name("src/foo.spec.js"));
        assert!(!is_test_file_by_name("src/foo.ts"));
    }

    #[test]
    fn python_test_prefix_and_suffix_recognized() {
        assert!(is_test_file_by_name("pkg/test_foo.py"));
        assert!(is_test_file_by_name("pkg/foo_test.py"));
        assert!(is_test_file_by_name("tests/foo.py"));
    }

    #[test]
    fn rust_named_and_tests_dir_recognized() {
        assert!(is_test_file_by_name("src/foo_test.rs"));
        assert!(is_test_file_by_name("tests/integration.rs"));
        assert!(!is_test_file_by_name("src/foo.rs"));
    }

    #[test]
    fn rust_inline_cfg_test_detected_via_content() {
        let lines = vec!["fn a() {}".to_string(), "#[cfg(test)]".to_string()];
        assert!(is_test_file("src/foo.rs", Some(&lines)));
        assert!(!is_test_file("src/foo.rs", Some(&["fn a() {}".to_string()])));
    }

    #[test]
    fn csharp_sibling_project_recognized() {
        assert!(is_test_file_by_name("MyApp.Tests/FooTests.cs"));
        assert!(is_test_file_by_name("MyApp.UnitTests/Foo.cs"));
    }

    #[test]
    fn has_test_counterpart_finds_same_dir_go_test() {
        let mut all = BTreeSet::new();
        all.insert("pkg/foo.go".to_string());
        all.insert("pkg/foo_test.go".to_string());
        assert!(has_test_counterpart("pkg/foo.go", &all, &[]));
    }

    #[test]
    fn has_test_counterpart_finds_parallel_tree_match() {
        let mut all = BTreeSet::new();
        all.insert("src/foo.py".to_string());
        all.insert("tests/src/foo.py".to_string());
        assert!(has_test_counterpart(
            "src/foo.py",
            &all,
            &["tests".to_string()]
        ));
    }

    #[test]
    fn has_test_counterpart_false_when_absent() {
        let mut all = BTreeSet::new();
        all.insert("src/foo.py".to_string());
        assert!(!has_test_counterpart("src/foo.py", &all, &["tests".to_string()]));
    }

    #[test]
    fn has_test_counterpart_java_maven_mirror() {
        let mut all = BTreeSet::new();
        all.insert("src/main/java/com/acme/Foo.java".to_string());
        all.insert("src/test/java/com/acme/FooTest.java".to_string());
        assert!(has_test_counterpart(
            "src/main/java/com/acme/Foo.java",
            &all,
            &[]
        ));
    }
}
