//! Route extraction and normalization (§4.8 API drift).

use std::sync::LazyLock;

use regex::Regex;

/// Known OpenAPI/Swagger spec file names, searched for anywhere in the tree.
pub const SPEC_FILE_NAMES: &[&str] = &[
    "openapi.yaml",
    "openapi.yml",
    "openapi.json",
    "swagger.yaml",
    "swagger.yml",
    "swagger.json",
];

static YAML_PATH_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s{0,4}(/\S*):\s*$"#).expect("static regex is valid"));
static JSON_PATH_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"(/[^"]*)"\s*:\s*\{?\s*$"#).expect("static regex is valid"));
static SPEC_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^\s*["']?version["']?\s*:\s*["']?([0-9][\w.\-]*)["']?"#).expect("static regex is valid"));

static GO_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\.(?:Get|Post|Put|Delete|Patch|HandleFunc)\(\s*"([^"]+)""#)
        .expect("static regex is valid")
});
static EXPRESS_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:app|router)\.(?:get|post|put|delete|patch)\(\s*['"]([^'"]+)['"]"#)
        .expect("static regex is valid")
});
static FLASK_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@\w+\.(?:route|get|post|put|delete|patch)\(\s*['"]([^'"]+)['"]"#)
        .expect("static regex is valid")
});
static DJANGO_ROUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bpath\(\s*['"]([^'"]*)['"]"#).expect("static regex is valid"));

/// Extract declared route paths from an OpenAPI/Swagger spec's raw text,
/// matching either YAML path keys or JSON `"path": {` keys.
#[must_use]
pub fn extract_declared_routes(text: &str) -> Vec<String> {
    let mut routes = Vec::new();
    for line in text.lines() {
        if let Some(captures) = YAML_PATH_KEY.captures(line) {
            routes.push(captures[1].to_string());
        } else if let Some(captures) = JSON_PATH_KEY.captures(line) {
            routes.push(captures[1].to_string());
        }
    }
    routes
}

/// Extract the spec's top-level `version` field, if present.
#[must_use]
pub fn extract_spec_version(text: &str) -> Option<String> {
    text.lines().find_map(|line| SPEC_VERSION.captures(line).map(|c| c[1].to_string()))
}

/// Extract registered routes from one source line, keyed by the language
/// implied by `ext`.
#[must_use]
pub fn extract_registered_routes(ext: &str, line: &str) -> Vec<String> {
    let regex = match ext {
        "go" => &*GO_ROUTE,
        "js" | "jsx" | "ts" | "tsx" => &*EXPRESS_ROUTE,
        "py" => {
            if let Some(captures) = FLASK_ROUTE.captures(line) {
                return vec![captures[1].to_string()];
            }
            &*DJANGO_ROUTE
        }
        _ => return Vec::new(),
    };
    regex
        .captures_iter(line)
        .map(|c| c[1].to_string())
        .collect()
}

/// Derive a Next.js file-route from a path under `pages/api/` or
/// `app/api/.../route.ts`.
#[must_use]
pub fn next_js_file_route(rel_path: &str) -> Option<String> {
    let strip_ext = |p: &str| p.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(p);
    if let Some(rest) = rel_path.strip_prefix("pages/api/") {
        let rest = strip_ext(rest);
        let rest = rest.strip_suffix("/index").unwrap_or(rest);
        return Some(format!("/api/{rest}"));
    }
    if let Some(rest) = rel_path.strip_prefix("app/api/") {
        if let Some(dir) = rest.strip_suffix("/route.ts").or_else(|| rest.strip_suffix("/route.js")) {
            return Some(format!("/api/{dir}"));
        }
    }
    None
}

/// Normalize a route for comparison: trim trailing slash, generalize
/// framework-specific params to `{id}`, lowercase.
#[must_use]
pub fn normalize_route(route: &str) -> String {
    let mut route = route.to_string();
    if route.len() > 1 && route.ends_with('/') {
        route.pop();
    }
    let segments: Vec<String> = route
        .split('/')
        .map(|segment| {
            if segment.starts_with(':') {
                "{id}".to_string()
            } else if segment.starts_with('[') && segment.ends_with(']') {
                "{id}".to_string()
            } else if segment.starts_with('<') && segment.ends_with('>') {
                "{id}".to_string()
            } else {
                segment.to_string()
            }
        })
        .collect();
    segments.join("/").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_yaml_path_keys() {
        let spec = "paths:\n  /users:\n    get:\n      summary: list\n  /users/{id}:\n    get:\n";
        let routes = extract_declared_routes(spec);
        assert_eq!(routes, vec!["/users".to_string(), "/users/{id}".to_string()]);
    }

    #[test]
    fn extracts_go_routes() {
        let routes = extract_registered_routes("go", r#"r.Get("/users/:id", handler)"#);
        assert_eq!(routes, vec!["/users/:id".to_string()]);
    }

    #[test]
    fn extracts_express_routes() {
        let routes = extract_registered_routes("js", r#"app.get('/users/:id', handler)"#);
        assert_eq!(routes, vec!["/users/:id".to_string()]);
    }

    #[test]
    fn extracts_flask_routes() {
        let routes = extract_registered_routes("py", r#"@app.route("/users/<int:id>")"#);
        assert_eq!(routes, vec!["/users/<int:id>".to_string()]);
    }

    #[test]
    fn next_js_pages_api_route_is_derived_from_path() {
        assert_eq!(next_js_file_route("pages/api/users/[id].ts"), Some("/api/users/{id}".to_string()));
        assert_eq!(next_js_file_route("pages/api/users/index.ts"), Some("/api/users".to_string()));
    }

    #[test]
    fn normalize_route_maps_params_and_trims_trailing_slash() {
        assert_eq!(normalize_route("/Users/:id/"), "/users/{id}");
        assert_eq!(normalize_route("/users/<int:id>"), "/users/{id}");
        assert_eq!(normalize_route("/users/[id]"), "/users/{id}");
    }

    #[test]
    fn extract_spec_version_reads_top_level_field() {
        assert_eq!(extract_spec_version("openapi: 3.0.0\nversion: \"2.1.0\"\n"), Some("2.1.0".to_string()));
    }
}
