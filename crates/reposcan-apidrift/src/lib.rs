//! API drift collector (§4.8): declared OpenAPI/Swagger routes vs. routes
//! registered in handler code, plus a spec-version staleness check.

mod routes;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, ScanContext};
use reposcan_walk::walk_files;

use routes::{extract_declared_routes, extract_registered_routes, extract_spec_version, next_js_file_route, normalize_route, SPEC_FILE_NAMES};

const UNDOCUMENTED_ROUTE_CONFIDENCE: f64 = 0.6;
const UNIMPLEMENTED_ROUTE_CONFIDENCE: f64 = 0.5;
const STALE_API_VERSION_CONFIDENCE: f64 = 0.7;

const ROUTE_EXTENSIONS: &[&str] = &["go", "js", "jsx", "ts", "tsx", "py"];

fn extension(rel_path: &str) -> Option<&str> {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Collector implementing §4.8 API drift.
#[derive(Default)]
pub struct ApiDriftCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl ApiDriftCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for ApiDriftCollector {
    fn name(&self) -> &str {
        "api-drift"
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

        let mut declared: BTreeSet<String> = BTreeSet::new();
        let mut spec_versions: Vec<(String, String)> = Vec::new();
        let mut spec_files_found = 0usize;

        for file in &files {
            ctx.check()?;
            let name = file.rel_path.rsplit('/').next().unwrap_or(&file.rel_path);
            if !SPEC_FILE_NAMES.contains(&name) {
                continue;
            }
            spec_files_found += 1;
            let full_path = repo_path.join(&file.rel_path);
            let Ok(bytes) = reposcan_content::read_head(&full_path, 2 * 1024 * 1024) else {
                continue;
            };
            let text = String::from_utf8_lossy(&bytes);
            for route in extract_declared_routes(&text) {
                declared.insert(normalize_route(&route));
            }
            if let Some(version) = extract_spec_version(&text) {
                spec_versions.push((file.rel_path.clone(), version));
            }
        }

        let mut registered: BTreeSet<String> = BTreeSet::new();
        let mut files_scanned = 0usize;
        for file in &files {
            ctx.check()?;
            if let Some(route) = next_js_file_route(&file.rel_path) {
                registered.insert(normalize_route(&route));
                continue;
            }
            let Some(ext) = extension(&file.rel_path) else {
                continue;
            };
            if !ROUTE_EXTENSIONS.contains(&ext) {
                continue;
            }
            let full_path = repo_path.join(&file.rel_path);
            let Ok(bytes) = reposcan_content::read_head(&full_path, 2 * 1024 * 1024) else {
                continue;
            };
            if reposcan_content::is_binary_prefix(&bytes) {
                continue;
            }
            let text = String::from_utf8_lossy(&bytes);
            files_scanned += 1;
            for line in text.lines() {
                for route in extract_registered_routes(ext, line) {
                    registered.insert(normalize_route(&route));
                }
            }
        }

        ctx.check()?;
        let mut signals = Vec::new();
        for route in registered.difference(&declared) {
            let title = format!("Undocumented route: `{route}` registered but not in the API spec");
            signals.push(
                RawSignal::new(self.name(), "undocumented-route", route, 0, title, String::new(), UNDOCUMENTED_ROUTE_CONFIDENCE)
                    .with_tag("api-drift"),
            );
        }
        for route in declared.difference(&registered) {
            let title = format!("Unimplemented route: `{route}` declared but never registered");
            signals.push(
                RawSignal::new(self.name(), "unimplemented-route", route, 0, title, String::new(), UNIMPLEMENTED_ROUTE_CONFIDENCE)
                    .with_tag("api-drift"),
            );
        }

        if let Some((canonical_path, canonical_version)) = spec_versions.first() {
            for (other_path, other_version) in spec_versions.iter().skip(1) {
                if other_version != canonical_version {
                    let title = format!(
                        "Stale API version: `{other_path}` declares {other_version}, `{canonical_path}` declares {canonical_version}"
                    );
                    signals.push(
                        RawSignal::new(self.name(), "stale-api-version", other_path, 0, title, String::new(), STALE_API_VERSION_CONFIDENCE)
                            .with_tag("api-drift"),
                    );
                }
            }
        }

        signals.sort_by(|a, b| a.file_path.cmp(&b.file_path).then(a.kind.cmp(&b.kind)));

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "specFilesFound": spec_files_found,
            "filesScanned": files_scanned,
            "declaredRoutes": declared.len(),
            "registeredRoutes": registered.len(),
        }));

        Ok(signals)
    }

    fn metrics(&self) -> Option<serde_json::Value> {
        self.metrics.lock().expect("metrics mutex poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> CollectorOpts {
        let mut opts = CollectorOpts::with_defaults();
        opts.min_confidence = 0.0;
        opts
    }

    #[test]
    fn undocumented_route_is_flagged_when_no_spec_declares_it() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("openapi.yaml"), "paths:\n  /users:\n    get:\n").unwrap();
        std::fs::write(tmp.path().join("server.go"), "r.Get(\"/pets\", handler)\n").unwrap();

        let collector = ApiDriftCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.iter().any(|s| s.kind == "undocumented-route" && s.file_path == "/pets"));
        assert!(signals.iter().any(|s| s.kind == "unimplemented-route" && s.file_path == "/users"));
    }

    #[test]
    fn matching_routes_produce_no_drift_signals() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("openapi.yaml"), "paths:\n  /users:\n    get:\n").unwrap();
        std::fs::write(tmp.path().join("server.go"), "r.Get(\"/users\", handler)\n").unwrap();

        let collector = ApiDriftCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.is_empty());
    }
}
