//! Dependency manifest parsing (§4.8 vulnerability collector).

use std::sync::LazyLock;

use regex::Regex;

/// One dependency extracted from a manifest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub ecosystem: String,
    pub name: String,
    pub version: String,
}

static GO_REQUIRE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^\s]+)\s+(v[0-9][^\s]*)").expect("static regex is valid"));
static GRADLE_DEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]([^:'"\s]+):([^:'"\s]+):([^'":\s]+)['"]"#).expect("static regex is valid")
});
static POM_DEPENDENCY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<dependency>\s*<groupId>([^<]+)</groupId>\s*<artifactId>([^<]+)</artifactId>\s*<version>([^<]+)</version>")
        .expect("static regex is valid")
});
static CSPROJ_PACKAGE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<PackageReference\s+Include="([^"]+)"\s+Version="([^"]+)""#).expect("static regex is valid")
});
static REQUIREMENTS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9_.\-]+)\s*==\s*([A-Za-z0-9_.\-]+)").expect("static regex is valid"));
static PYPROJECT_POETRY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*([A-Za-z0-9_.\-]+)\s*=\s*"([^"^~][^"]*)""#).expect("static regex is valid"));
static CARGO_DEP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*([A-Za-z0-9_-]+)\s*=\s*"([^"]+)""#).expect("static regex is valid"));

fn parse_go_mod(text: &str) -> Vec<Dependency> {
    let mut out = Vec::new();
    let mut in_require_block = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("require (") {
            in_require_block = true;
            continue;
        }
        if in_require_block && trimmed == ")" {
            in_require_block = false;
            continue;
        }
        let candidate = if in_require_block {
            Some(trimmed)
        } else {
            trimmed.strip_prefix("require ")
        };
        let Some(candidate) = candidate else {
            continue;
        };
        if let Some(captures) = GO_REQUIRE_LINE.captures(candidate) {
            out.push(Dependency {
                ecosystem: "Go".to_string(),
                name: captures[1].to_string(),
                version: captures[2].to_string(),
            });
        }
    }
    out
}

fn parse_pom_xml(text: &str) -> Vec<Dependency> {
    POM_DEPENDENCY_BLOCK
        .captures_iter(text)
        .map(|c| Dependency {
            ecosystem: "Maven".to_string(),
            name: format!("{}:{}", c[1].trim(), c[2].trim()),
            version: c[3].trim().to_string(),
        })
        .collect()
}

fn parse_gradle(text: &str) -> Vec<Dependency> {
    GRADLE_DEP
        .captures_iter(text)
        .map(|c| Dependency {
            ecosystem: "Maven".to_string(),
            name: format!("{}:{}", &c[1], &c[2]),
            version: c[3].to_string(),
        })
        .collect()
}

fn parse_csproj(text: &str) -> Vec<Dependency> {
    CSPROJ_PACKAGE_REF
        .captures_iter(text)
        .map(|c| Dependency {
            ecosystem: "NuGet".to_string(),
            name: c[1].to_string(),
            version: c[2].to_string(),
        })
        .collect()
}

fn parse_requirements_txt(text: &str) -> Vec<Dependency> {
    text.lines()
        .filter_map(|line| {
            REQUIREMENTS_LINE.captures(line).map(|c| Dependency {
                ecosystem: "PyPI".to_string(),
                name: c[1].to_string(),
                version: c[2].to_string(),
            })
        })
        .collect()
}

fn parse_pyproject_toml(text: &str) -> Vec<Dependency> {
    let mut out = Vec::new();
    let mut in_poetry_deps = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_poetry_deps = trimmed == "[tool.poetry.dependencies]" || trimmed == "[tool.poetry.dev-dependencies]";
            continue;
        }
        if !in_poetry_deps {
            continue;
        }
        if let Some(captures) = PYPROJECT_POETRY_LINE.captures(trimmed) {
            let name = &captures[1];
            if name == "python" {
                continue;
            }
            out.push(Dependency {
                ecosystem: "PyPI".to_string(),
                name: name.to_string(),
                version: captures[2].to_string(),
            });
        }
    }
    out
}

fn parse_cargo_toml(text: &str) -> Vec<Dependency> {
    let mut out = Vec::new();
    let mut in_deps = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_deps = trimmed == "[dependencies]" || trimmed == "[dev-dependencies]" || trimmed == "[build-dependencies]";
            continue;
        }
        if !in_deps {
            continue;
        }
        if let Some(captures) = CARGO_DEP_LINE.captures(trimmed) {
            out.push(Dependency {
                ecosystem: "crates.io".to_string(),
                name: captures[1].to_string(),
                version: captures[2].to_string(),
            });
        }
    }
    out
}

fn parse_package_json(text: &str) -> Vec<Dependency> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        let Some(obj) = value.get(section).and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, version) in obj {
            let Some(version) = version.as_str() else {
                continue;
            };
            out.push(Dependency {
                ecosystem: "npm".to_string(),
                name: name.clone(),
                version: version.trim_start_matches(['^', '~']).to_string(),
            });
        }
    }
    out
}

/// Parse a dependency manifest by its file name. Returns an empty vector
/// for unrecognized names or unparseable content.
#[must_use]
pub fn parse_manifest(file_name: &str, text: &str) -> Vec<Dependency> {
    match file_name {
        "go.mod" => parse_go_mod(text),
        "pom.xml" => parse_pom_xml(text),
        "build.gradle" | "build.gradle.kts" => parse_gradle(text),
        "Cargo.toml" => parse_cargo_toml(text),
        "requirements.txt" => parse_requirements_txt(text),
        "pyproject.toml" => parse_pyproject_toml(text),
        "package.json" => parse_package_json(text),
        name if name.ends_with(".csproj") => parse_csproj(text),
        _ => Vec::new(),
    }
}

/// Manifest file names (or suffix patterns) the collector recognizes.
#[must_use]
pub fn is_manifest_file(file_name: &str) -> bool {
    matches!(
        file_name,
        "go.mod" | "pom.xml" | "build.gradle" | "build.gradle.kts" | "Cargo.toml" | "requirements.txt" | "pyproject.toml" | "package.json"
    ) || file_name.ends_with(".csproj")
}
