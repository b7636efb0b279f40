//! TOML user configuration (`reposcan.toml` at the repo root) supplying
//! defaults that CLI flags override, following the same config-layering
//! idiom as this codebase's other tools.

use std::path::Path;
use std::sync::Arc;

use reposcan_model::{CollectorOpts, GitSince};
use serde::Deserialize;

use crate::cli::GlobalArgs;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub min_confidence: Option<f64>,
    pub large_file_threshold: Option<usize>,
    pub min_complexity_score: Option<f64>,
    pub min_function_lines: Option<usize>,
    pub max_issues: Option<usize>,
    pub git_since: Option<String>,
    pub git_depth: Option<usize>,
    pub include_demo_paths: Option<bool>,
    pub bus_factor_threshold: Option<u32>,
}

/// Load `reposcan.toml` from the repo root, if present. A missing file is
/// not an error; a malformed one is.
pub fn load_user_config(repo_root: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = repo_root.join("reposcan.toml");
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let config: UserConfig = toml::from_str(&text)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(Some(config))
}

/// Build the effective [`CollectorOpts`] from CLI flags layered over the
/// optional TOML config, with CLI flags winning on every field.
pub fn resolve_opts(
    global: &GlobalArgs,
    user_config: Option<&UserConfig>,
    progress_fn: Option<Arc<dyn Fn(&str) + Send + Sync>>,
) -> anyhow::Result<CollectorOpts> {
    let mut opts = CollectorOpts::with_defaults();

    let mut exclude = user_config.map(|c| c.exclude.clone()).unwrap_or_default();
    exclude.extend(global.exclude.iter().cloned());
    opts.exclude_patterns = exclude;

    let mut include = user_config.map(|c| c.include.clone()).unwrap_or_default();
    include.extend(global.include.iter().cloned());
    opts.include_patterns = include;

    if let Some(v) = global.min_confidence.or_else(|| user_config.and_then(|c| c.min_confidence)) {
        opts.min_confidence = v;
    }
    if let Some(v) = global.large_file_threshold.or_else(|| user_config.and_then(|c| c.large_file_threshold)) {
        opts.large_file_threshold = v;
    }
    if let Some(v) = global.min_complexity_score.or_else(|| user_config.and_then(|c| c.min_complexity_score)) {
        opts.min_complexity_score = v;
    }
    if let Some(v) = global.min_function_lines.or_else(|| user_config.and_then(|c| c.min_function_lines)) {
        opts.min_function_lines = v;
    }
    if let Some(v) = global.max_issues.or_else(|| user_config.and_then(|c| c.max_issues)) {
        opts.max_issues = v;
    }
    if let Some(spec) = global.git_since.clone().or_else(|| user_config.and_then(|c| c.git_since.clone())) {
        opts.git_since = Some(GitSince::parse(&spec).map_err(|e| anyhow::anyhow!("{e}"))?);
    }
    if let Some(v) = global.git_depth.or_else(|| user_config.and_then(|c| c.git_depth)) {
        opts.git_depth = v;
    }
    opts.include_demo_paths =
        global.include_demo_paths || user_config.and_then(|c| c.include_demo_paths).unwrap_or(false);
    if let Some(v) = global.bus_factor_threshold.or_else(|| user_config.and_then(|c| c.bus_factor_threshold)) {
        opts.bus_factor_threshold = v;
    }
    opts.git_root = global.git_root.clone();
    opts.progress_fn = progress_fn;

    Ok(opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_user_config(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn cli_flags_override_toml_config() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("reposcan.toml"), "min_confidence = 0.2\n").unwrap();
        let user_config = load_user_config(tmp.path()).unwrap();

        let mut global = GlobalArgs::default();
        global.min_confidence = Some(0.9);
        let opts = resolve_opts(&global, user_config.as_ref(), None).unwrap();
        assert!((opts.min_confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn toml_config_supplies_defaults_when_no_flag_given() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("reposcan.toml"), "min_confidence = 0.35\n").unwrap();
        let user_config = load_user_config(tmp.path()).unwrap();

        let global = GlobalArgs::default();
        let opts = resolve_opts(&global, user_config.as_ref(), None).unwrap();
        assert!((opts.min_confidence - 0.35).abs() < f64::EPSILON);
    }

    #[test]
    fn exclude_patterns_merge_toml_and_cli() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("reposcan.toml"), "exclude = [\"vendor/**\"]\n").unwrap();
        let user_config = load_user_config(tmp.path()).unwrap();

        let mut global = GlobalArgs::default();
        global.exclude = vec!["target/**".to_string()];
        let opts = resolve_opts(&global, user_config.as_ref(), None).unwrap();
        assert_eq!(opts.exclude_patterns, vec!["vendor/**", "target/**"]);
    }
}
