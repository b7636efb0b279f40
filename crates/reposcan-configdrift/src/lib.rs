//! Config drift collector (§4.8): `.env.example` vs. other `.env.*` files
//! and vs. environment variables actually referenced from source.

mod env;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, ScanContext};
use reposcan_walk::walk_files;

use env::{extract_env_references, parse_env_file};

const DRIFT_CONFIDENCE: f64 = 0.5;

fn is_env_example(name: &str) -> bool {
    name == ".env.example" || name == ".env.sample"
}

fn is_env_file(name: &str) -> bool {
    name.starts_with(".env") && !is_env_example(name)
}

/// Collector implementing §4.8 config drift.
#[derive(Default)]
pub struct ConfigDriftCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl ConfigDriftCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for ConfigDriftCollector {
    fn name(&self) -> &str {
        "config-drift"
    }

    fn collect(
        &self,
        ctx: &ScanContext,
        repo_path: &Path,
        opts: &CollectorOpts,
    ) -> Result<Vec<RawSignal>, CollectError> {
        let excludes = PatternSet::compile(&merge_excludes(&opts.exclude_patterns))
            .map_err(CollectError::Other)?;
        let includes = PatternSet::compile(&opts.include_patterns).map_err(CollectError::Other)?;
        let files = walk_files(repo_path, &excludes, &includes).map_err(CollectError::Other)?;

        let mut example_keys: BTreeMap<String, String> = BTreeMap::new();
        let mut env_files: Vec<(String, BTreeMap<String, String>)> = Vec::new();
        let mut referenced_keys: BTreeSet<String> = BTreeSet::new();
        let mut files_scanned = 0usize;

        for file in &files {
            ctx.check()?;
            let name = file.rel_path.rsplit('/').next().unwrap_or(&file.rel_path);
            let full_path = repo_path.join(&file.rel_path);

            if is_env_example(name) {
                let Ok(bytes) = reposcan_content::read_head(&full_path, 1024 * 1024) else {
                    continue;
                };
                let text = String::from_utf8_lossy(&bytes);
                example_keys.extend(parse_env_file(&text));
                continue;
            }
            if is_env_file(name) {
                let Ok(bytes) = reposcan_content::read_head(&full_path, 1024 * 1024) else {
                    continue;
                };
                let text = String::from_utf8_lossy(&bytes);
                env_files.push((file.rel_path.clone(), parse_env_file(&text)));
                continue;
            }

            let Ok(bytes) = reposcan_content::read_head(&full_path, 10 * 1024 * 1024) else {
                continue;
            };
            if reposcan_content::is_binary_prefix(&bytes) {
                continue;
            }
            let text = String::from_utf8_lossy(&bytes);
            files_scanned += 1;
            for line in text.lines() {
                referenced_keys.extend(extract_env_references(line));
            }
        }

        ctx.check()?;
        let mut signals = Vec::new();

        let example_key_set: BTreeSet<String> = example_keys.keys().cloned().collect();

        for key in referenced_keys.difference(&example_key_set) {
            let title = format!("Env var drift: `{key}` referenced in source but missing from `.env.example`");
            signals.push(
                RawSignal::new(self.name(), "env-var-drift", key, 0, title, String::new(), DRIFT_CONFIDENCE)
                    .with_tag("config-drift"),
            );
        }

        for key in &example_key_set {
            let referenced_anywhere = referenced_keys.contains(key)
                || env_files.iter().any(|(_, keys)| keys.contains_key(key));
            if !referenced_anywhere {
                let title = format!("Dead config key: `{key}` in `.env.example` is never referenced or overridden");
                signals.push(
                    RawSignal::new(self.name(), "dead-config-key", key, 0, title, String::new(), DRIFT_CONFIDENCE)
                        .with_tag("config-drift"),
                );
            }
        }

        for (env_path, keys) in &env_files {
            for (key, value) in keys {
                let Some(example_value) = example_keys.get(key) else {
                    continue;
                };
                if example_value.is_empty() || value.is_empty() {
                    continue;
                }
                if example_value != value {
                    let title = format!(
                        "Inconsistent default: `{key}` is `{example_value}` in `.env.example` but `{value}` in `{env_path}`"
                    );
                    signals.push(
                        RawSignal::new(self.name(), "inconsistent-defaults", key, 0, title, String::new(), DRIFT_CONFIDENCE)
                            .with_tag("config-drift"),
                    );
                }
            }
        }

        signals.sort_by(|a, b| a.file_path.cmp(&b.file_path).then(a.kind.cmp(&b.kind)));

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "filesScanned": files_scanned,
            "exampleKeys": example_keys.len(),
            "envFiles": env_files.len(),
            "referencedKeys": referenced_keys.len(),
        }));

        Ok(signals)
    }

    fn metrics(&self) -> Option<serde_json::Value> {
        self.metrics.lock().expect("metrics mutex poisoned").clone()
    }
}
