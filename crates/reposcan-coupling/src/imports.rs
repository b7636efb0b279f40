//! Per-language import extraction and module-id derivation (§4.4 steps
//! 2-5). Each language gets a small, regex-free scanner; heuristic by
//! design (§1 non-goal: perfect syntactic parsing).

/// Source extensions the coupling collector recognizes as import-bearing.
pub const COUPLING_EXTENSIONS: &[&str] = &[
    "go", "js", "ts", "jsx", "tsx", "py", "java", "rs", "rb", "php", "c", "cc", "cpp", "h", "hpp",
];

fn extension(rel_path: &str) -> Option<&str> {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

fn dir_of(rel_path: &str) -> &str {
    match rel_path.rfind('/') {
        Some(idx) => &rel_path[..idx],
        None => "",
    }
}

/// Read a `module <path>` line out of `go.mod` content.
#[must_use]
pub fn parse_go_module_path(go_mod_contents: &str) -> Option<String> {
    go_mod_contents
        .lines()
        .find_map(|l| l.trim().strip_prefix("module ").map(str::trim))
        .map(str::to_string)
}

/// Raw quoted import paths from Go source (handles both single-line
/// `import "x"` and grouped `import (\n "x"\n "y"\n)` forms).
#[must_use]
pub fn extract_go_imports(lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_block = false;
    for line in lines {
        let trimmed = line.trim();
        if !in_block && trimmed.starts_with("import (") {
            in_block = true;
            continue;
        }
        if in_block {
            if trimmed == ")" {
                in_block = false;
                continue;
            }
            if let Some(path) = extract_quoted(trimmed) {
                out.push(path);
            }
        } else if let Some(rest) = trimmed.strip_prefix("import ") {
            if let Some(path) = extract_quoted(rest) {
                out.push(path);
            }
        }
    }
    out
}

fn extract_quoted(s: &str) -> Option<String> {
    let start = s.find('"')?;
    let rest = &s[start + 1..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// JS/TS module id: the file's repo-relative path with its extension
/// stripped.
#[must_use]
pub fn js_module_id(rel_path: &str) -> String {
    match rel_path.rsplit_once('.') {
        Some((stem, ext)) if matches!(ext, "js" | "jsx" | "ts" | "tsx") => stem.to_string(),
        _ => rel_path.to_string(),
    }
}

/// Relative (`./`, `../`) import specifiers from `import ... from '...'` and
/// `require('...')` forms. Bare-specifier (package) imports are ignored
/// per §4.4 step 5 (only relative paths are extracted for JS/TS).
#[must_use]
pub fn extract_js_relative_imports(lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for line in lines {
        for spec in extract_js_specs(line) {
            if spec.starts_with("./") || spec.starts_with("../") {
                out.push(spec);
            }
        }
    }
    out
}

fn extract_js_specs(line: &str) -> Vec<String> {
    let mut specs = Vec::new();
    for marker in ["from ", "require("] {
        let mut cursor = 0usize;
        while let Some(found) = line[cursor..].find(marker) {
            let after_marker = cursor + found + marker.len();
            let after = &line[after_marker..];
            let quote_start = after.find(['"', '\'']);
            let Some(quote_start) = quote_start else {
                break;
            };
            let quote_char = after.as_bytes()[quote_start] as char;
            let rest = &after[quote_start + 1..];
            let Some(quote_end) = rest.find(quote_char) else {
                break;
            };
            specs.push(rest[..quote_end].to_string());
            cursor = after_marker + quote_start + 1 + quote_end + 1;
        }
    }
    specs
}

fn extract_single_quoted(s: &str) -> Option<String> {
    let start = s.find('\'')?;
    let rest = &s[start + 1..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

/// Resolve a JS/TS relative import against the current file's directory,
/// producing the candidate module ids to probe against `moduleSet` (plain
/// resolution, then `/index`), per §4.4 step 5.
#[must_use]
pub fn resolve_js_relative(current_rel_path: &str, spec: &str) -> Vec<String> {
    let dir = dir_of(current_rel_path);
    let joined = join_and_normalize(dir, spec);
    let stripped = strip_known_js_ext(&joined);
    vec![stripped.clone(), format!("{stripped}/index")]
}

fn strip_known_js_ext(path: &str) -> String {
    for ext in [".tsx", ".ts", ".jsx", ".js"] {
        if let Some(stem) = path.strip_suffix(ext) {
            return stem.to_string();
        }
    }
    path.to_string()
}

fn join_and_normalize(base_dir: &str, rel_spec: &str) -> String {
    let mut segments: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };
    for part in rel_spec.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Python dotted module id for a source file: `a/b/c.py` -> `a.b.c`;
/// `a/b/__init__.py` -> `a.b`.
#[must_use]
pub fn python_module_id(rel_path: &str) -> String {
    let without_ext = rel_path.strip_suffix(".py").unwrap_or(rel_path);
    let without_init = without_ext
        .strip_suffix("/__init__")
        .unwrap_or(without_ext);
    let without_init = if without_init == "__init__" { "" } else { without_init };
    without_init.replace('/', ".")
}

/// Dotted import targets from `import a.b.c` and `from a.b import c`
/// statements.
#[must_use]
pub fn extract_python_imports(lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("from ") {
            if let Some((module, _)) = rest.split_once(" import ") {
                let module = module.trim();
                if !module.starts_with('.') {
                    out.push(module.to_string());
                }
            }
        } else if let Some(rest) = trimmed.strip_prefix("import ") {
            for part in rest.split(',') {
                let name = part.trim().split(" as ").next().unwrap_or("").trim();
                if !name.is_empty() {
                    out.push(name.to_string());
                }
            }
        }
    }
    out
}

/// Progressively shorter dotted prefixes of `dotted`, longest first,
/// including the full path itself (§4.4 step 5: "try the full dotted path,
/// then successive parent prefixes").
#[must_use]
pub fn python_prefixes(dotted: &str) -> Vec<String> {
    let segments: Vec<&str> = dotted.split('.').collect();
    (1..=segments.len())
        .rev()
        .map(|n| segments[..n].join("."))
        .collect()
}

/// Java/Kotlin package declared by a file's `package a.b.c;` statement.
#[must_use]
pub fn java_package_of(lines: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        let trimmed = line.trim();
        trimmed
            .strip_prefix("package ")
            .and_then(|rest| rest.strip_suffix(';'))
            .map(str::trim)
            .map(str::to_string)
    })
}

/// Package of each `import a.b.ClassName;` (last segment stripped).
#[must_use]
pub fn extract_java_imports(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            let rest = trimmed
                .strip_prefix("import static ")
                .or_else(|| trimmed.strip_prefix("import "))?;
            let rest = rest.strip_suffix(';').unwrap_or(rest).trim();
            let (package, _) = rest.rsplit_once('.')?;
            Some(package.to_string())
        })
        .collect()
}

/// Rust crate-local module from `use crate::<first>::...;` only.
#[must_use]
pub fn extract_rust_crate_imports(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            let rest = trimmed.strip_prefix("use crate::")?;
            let first = rest.split("::").next()?;
            let first = first.split(|c: char| c == ';' || c == '{').next()?.trim();
            if first.is_empty() {
                None
            } else {
                Some(first.to_string())
            }
        })
        .collect()
}

/// Rust's crate-local module set: first path component under `src/`, i.e.
/// `src/foo.rs`, `src/foo/mod.rs`, `src/foo/bar.rs` all belong to `foo`;
/// `src/lib.rs` / `src/main.rs` belong to the crate root, which has no
/// first-component name and is excluded from the module set.
#[must_use]
pub fn rust_module_of(rel_path: &str) -> Option<String> {
    let rest = rel_path.strip_prefix("src/")?;
    let first = rest.split('/').next()?;
    let stem = first.strip_suffix(".rs").unwrap_or(first);
    if stem.is_empty() || stem == "lib" || stem == "main" {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Ruby module id: file path without extension.
#[must_use]
pub fn ruby_module_id(rel_path: &str) -> String {
    rel_path.strip_suffix(".rb").unwrap_or(rel_path).to_string()
}

/// `require_relative '...'` targets, resolved against the current file's
/// directory.
#[must_use]
pub fn extract_ruby_requires(current_rel_path: &str, lines: &[String]) -> Vec<String> {
    let dir = dir_of(current_rel_path);
    lines
        .iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            let rest = trimmed.strip_prefix("require_relative ")?;
            let spec = extract_single_quoted(rest).or_else(|| extract_quoted(rest))?;
            Some(join_and_normalize(dir, &spec))
        })
        .collect()
}

/// PHP namespace declared by a file's `namespace X\Y;` statement,
/// normalized to forward slashes.
#[must_use]
pub fn php_namespace_of(lines: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        let trimmed = line.trim();
        trimmed
            .strip_prefix("namespace ")
            .and_then(|rest| rest.strip_suffix(';'))
            .map(|ns| ns.trim().replace('\\', "/"))
    })
}

/// Namespace of each `use X\Y\Z;` (last segment stripped), normalized.
#[must_use]
pub fn extract_php_use_imports(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            let rest = trimmed.strip_prefix("use ")?;
            let rest = rest.strip_suffix(';').unwrap_or(rest).trim();
            let rest = rest.split(" as ").next().unwrap_or(rest);
            let normalized = rest.replace('\\', "/");
            let (ns, _) = normalized.rsplit_once('/')?;
            Some(ns.to_string())
        })
        .collect()
}

/// Quoted (not angle-bracket) `#include "..."` targets, resolved relative
/// to the includer's directory (§4.4 step 5: angle-bracket includes are
/// ignored).
#[must_use]
pub fn extract_c_includes(current_rel_path: &str, lines: &[String]) -> Vec<String> {
    let dir = dir_of(current_rel_path);
    lines
        .iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            let rest = trimmed.strip_prefix("#include ")?.trim();
            if !rest.starts_with('"') {
                return None;
            }
            let spec = extract_quoted(rest)?;
            Some(join_and_normalize(dir, &spec))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_of(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn parses_go_module_path() {
        assert_eq!(
            parse_go_module_path("module example.com/acme/widget\n\ngo 1.22\n"),
            Some("example.com/acme/widget".to_string())
        );
    }

    #[test]
    fn extracts_grouped_go_imports() {
        let lines = lines_of("import (\n\t\"fmt\"\n\t\"example.com/acme/widget/pkg/a\"\n)\n");
        let imports = extract_go_imports(&lines);
        assert_eq!(imports, vec!["fmt", "example.com/acme/widget/pkg/a"]);
    }

    #[test]
    fn extracts_single_line_go_import() {
        let lines = lines_of("import \"fmt\"\n");
        assert_eq!(extract_go_imports(&lines), vec!["fmt"]);
    }

    #[test]
    fn js_module_id_strips_extension() {
        assert_eq!(js_module_id("src/foo.ts"), "src/foo");
        assert_eq!(js_module_id("src/foo.jsx"), "src/foo");
    }

    #[test]
    fn extracts_relative_js_imports_only() {
        let lines = lines_of("import x from './a';\nimport y from 'lodash';\nconst z = require('../b');\n");
        let imports = extract_js_relative_imports(&lines);
        assert_eq!(imports, vec!["./a".to_string(), "../b".to_string()]);
    }

    #[test]
    fn resolves_js_relative_import_with_index_candidate() {
        let candidates = resolve_js_relative("src/pages/home.ts", "../lib/util");
        assert_eq!(candidates, vec!["src/lib/util".to_string(), "src/lib/util/index".to_string()]);
    }

    #[test]
    fn python_module_id_handles_init_and_plain() {
        assert_eq!(python_module_id("pkg/sub/mod.py"), "pkg.sub.mod");
        assert_eq!(python_module_id("pkg/sub/__init__.py"), "pkg.sub");
    }

    #[test]
    fn extracts_python_import_forms() {
        let lines = lines_of("import pkg.sub.mod\nfrom pkg.other import thing\nfrom . import local\n");
        let imports = extract_python_imports(&lines);
        assert_eq!(imports, vec!["pkg.sub.mod".to_string(), "pkg.other".to_string()]);
    }

    #[test]
    fn python_prefixes_are_longest_first() {
        assert_eq!(
            python_prefixes("a.b.c"),
            vec!["a.b.c".to_string(), "a.b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn java_package_and_imports_strip_class_name() {
        let lines = lines_of("package com.acme.widget;\nimport com.acme.other.Thing;\n");
        assert_eq!(java_package_of(&lines), Some("com.acme.widget".to_string()));
        assert_eq!(extract_java_imports(&lines), vec!["com.acme.other".to_string()]);
    }

    #[test]
    fn rust_module_of_ignores_crate_root_files() {
        assert_eq!(rust_module_of("src/foo.rs"), Some("foo".to_string()));
        assert_eq!(rust_module_of("src/foo/bar.rs"), Some("foo".to_string()));
        assert_eq!(rust_module_of("src/lib.rs"), None);
        assert_eq!(rust_module_of("src/main.rs"), None);
    }

    #[test]
    fn extracts_rust_crate_use_imports_only() {
        let lines = lines_of("use crate::coupling::Thing;\nuse std::collections::HashMap;\n");
        assert_eq!(extract_rust_crate_imports(&lines), vec!["coupling".to_string()]);
    }

    #[test]
    fn extracts_ruby_require_relative_resolved_to_dir() {
        let lines = lines_of("require_relative '../lib/helper'\n");
        assert_eq!(
            extract_ruby_requires("app/models/user.rb", &lines),
            vec!["lib/helper".to_string()]
        );
    }

    #[test]
    fn php_namespace_and_use_strip_class_segment() {
        let lines = lines_of("namespace App\\Models;\nuse App\\Services\\Mailer;\n");
        assert_eq!(php_namespace_of(&lines), Some("App/Models".to_string()));
        assert_eq!(extract_php_use_imports(&lines), vec!["App/Services".to_string()]);
    }

    #[test]
    fn c_include_ignores_angle_bracket_form() {
        let lines = lines_of("#include \"local/header.h\"\n#include <stdio.h>\n");
        let imports = extract_c_includes("src/main.c", &lines);
        assert_eq!(imports, vec!["src/local/header.h".to_string()]);
    }
}
