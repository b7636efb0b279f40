//! `.env`-file and source-reference parsing (§4.8 config drift).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Parse `KEY=value` lines from a `.env`-style file, ignoring comments and
/// blank lines. Later duplicate keys overwrite earlier ones, matching
/// dotenv loader semantics.
#[must_use]
pub fn parse_env_file(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        out.insert(key.to_string(), value.to_string());
    }
    out
}

static JS_ENV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"process\.env\.([A-Za-z_][A-Za-z0-9_]*)").expect("static regex is valid"));
static JS_ENV_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"process\.env\[['"]([A-Za-z_][A-Za-z0-9_]*)['"]\]"#).expect("static regex is valid"));
static GO_ENV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"os\.Getenv\(\s*"([A-Za-z_][A-Za-z0-9_]*)"\s*\)"#).expect("static regex is valid"));
static PY_ENV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"os\.environ(?:\.get)?\(?\[?['"]([A-Za-z_][A-Za-z0-9_]*)['"]\]?\)?"#)
        .expect("static regex is valid")
});
static RUBY_ENV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ENV\[['"]([A-Za-z_][A-Za-z0-9_]*)['"]\]"#).expect("static regex is valid"));
static RUST_ENV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"std::env::var(?:_os)?\(\s*"([A-Za-z_][A-Za-z0-9_]*)"\s*\)"#).expect("static regex is valid")
});
static JAVA_ENV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"System\.getenv\(\s*"([A-Za-z_][A-Za-z0-9_]*)"\s*\)"#).expect("static regex is valid")
});

/// Extract environment variable names referenced on one source line, across
/// every language the collector understands. Cheap enough to run
/// unconditionally rather than dispatch by extension.
#[must_use]
pub fn extract_env_references(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    for regex in [&*JS_ENV, &*JS_ENV_BRACKET, &*GO_ENV, &*PY_ENV, &*RUBY_ENV, &*RUST_ENV, &*JAVA_ENV] {
        for captures in regex.captures_iter(line) {
            out.push(captures[1].to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_file_skips_comments_and_blanks() {
        let text = "# comment\nFOO=bar\n\nBAZ=\"quoted\"\n";
        let parsed = parse_env_file(text);
        assert_eq!(parsed.get("FOO"), Some(&"bar".to_string()));
        assert_eq!(parsed.get("BAZ"), Some(&"quoted".to_string()));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn extracts_js_and_go_env_references() {
        assert_eq!(extract_env_references("const x = process.env.API_KEY;"), vec!["API_KEY".to_string()]);
        assert_eq!(extract_env_references(r#"v := os.Getenv("API_KEY")"#), vec!["API_KEY".to_string()]);
    }

    #[test]
    fn extracts_python_and_ruby_references() {
        assert_eq!(extract_env_references(r#"os.environ.get("DB_HOST")"#), vec!["DB_HOST".to_string()]);
        assert_eq!(extract_env_references(r#"ENV["DB_HOST"]"#), vec!["DB_HOST".to_string()]);
    }
}
