//! Vulnerability collector (§4.8): parses dependency manifests and queries
//! an injected lookup client for known advisories.
//!
//! The actual network client that talks to an OSV-style backend is outside
//! this crate's scope; callers inject whatever implements [`VulnSource`].
//! [`NullVulnSource`] is the default and always returns no matches, so the
//! collector is inert until a real client is wired in at the application
//! edge.

mod manifests;

use std::path::Path;
use std::sync::{Arc, Mutex};

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, ScanContext};
use reposcan_walk::walk_files;

pub use manifests::{Dependency, is_manifest_file, parse_manifest};

const HIGH_CONFIDENCE: f64 = 0.95;
const MEDIUM_CONFIDENCE: f64 = 0.80;
const LOW_CONFIDENCE: f64 = 0.60;
const UNKNOWN_CONFIDENCE: f64 = 0.80;

/// One advisory returned by a [`VulnSource`] lookup for a queried dependency.
#[derive(Debug, Clone)]
pub struct VulnMatch {
    pub id: String,
    pub aliases: Vec<String>,
    pub summary: String,
    pub fixed_version: Option<String>,
    /// CVSS-derived bucket: "high", "medium", or "low". `None` if the
    /// backend didn't report one.
    pub severity: Option<String>,
    pub package: String,
    pub version: String,
    pub ecosystem: String,
}

/// A batched advisory lookup, matching the external `queryBatch` contract.
///
/// Implementations may hit a network service; a failure there must not fail
/// the scan, so `query_batch` returns a `Result` the collector treats as
/// best-effort: an `Err` degrades to "no vulnerabilities found" rather than
/// aborting collection.
pub trait VulnSource: Send + Sync {
    /// Look up advisories for a batch of `(ecosystem, name, version)` deps.
    fn query_batch(&self, deps: &[Dependency]) -> anyhow::Result<Vec<VulnMatch>>;
}

/// Default source: no network client configured, so nothing is ever found.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVulnSource;

impl VulnSource for NullVulnSource {
    fn query_batch(&self, _deps: &[Dependency]) -> anyhow::Result<Vec<VulnMatch>> {
        Ok(Vec::new())
    }
}

fn confidence_for_severity(severity: Option<&str>) -> f64 {
    match severity {
        Some("high") => HIGH_CONFIDENCE,
        Some("medium") => MEDIUM_CONFIDENCE,
        Some("low") => LOW_CONFIDENCE,
        _ => UNKNOWN_CONFIDENCE,
    }
}

/// Collector implementing §4.8 vulnerability scanning over manifest files.
pub struct VulnCollector {
    source: Arc<dyn VulnSource>,
    metrics: Mutex<Option<serde_json::Value>>,
}

impl Default for VulnCollector {
    fn default() -> Self {
        Self::new(Arc::new(NullVulnSource))
    }
}

impl VulnCollector {
    #[must_use]
    pub fn new(source: Arc<dyn VulnSource>) -> Self {
        Self {
            source,
            metrics: Mutex::new(None),
        }
    }
}

impl Collector for VulnCollector {
    fn name(&self) -> &str {
        "vuln"
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

        // (manifest path, dependency) pairs, so a match can be attributed
        // back to the file it came from.
        let mut located: Vec<(String, Dependency)> = Vec::new();
        let mut manifests_scanned = 0usize;

        for file in &files {
            ctx.check()?;
            let file_name = Path::new(&file.rel_path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if !is_manifest_file(file_name) {
                continue;
            }
            let full_path = repo_path.join(&file.rel_path);
            let Ok(bytes) = reposcan_content::read_head(&full_path, 2 * 1024 * 1024) else {
                continue;
            };
            if reposcan_content::is_binary_prefix(&bytes) {
                continue;
            }
            manifests_scanned += 1;
            let text = String::from_utf8_lossy(&bytes);
            for dep in parse_manifest(file_name, &text) {
                located.push((file.rel_path.clone(), dep));
            }
        }

        let deps: Vec<Dependency> = located.iter().map(|(_, dep)| dep.clone()).collect();
        opts.report(&format!("querying {} dependencies for known advisories", deps.len()));

        // A lookup failure is best-effort: the scan keeps going with no
        // vulnerability signals rather than failing outright.
        let matches = self.source.query_batch(&deps).unwrap_or_default();

        let mut signals = Vec::new();
        for m in &matches {
            let Some((manifest_path, _)) = located
                .iter()
                .find(|(_, dep)| dep.ecosystem == m.ecosystem && dep.name == m.package && dep.version == m.version)
            else {
                continue;
            };
            let confidence = confidence_for_severity(m.severity.as_deref());
            let mut title = format!("{} in {} {}", m.id, m.package, m.version);
            if let Some(fixed) = &m.fixed_version {
                title.push_str(&format!(" (fixed in {fixed})"));
            }
            let mut signal = RawSignal::new(self.name(), "vulnerable-dependency", manifest_path, 0, title, m.summary.clone(), confidence)
                .with_tag("vulnerability");
            for alias in &m.aliases {
                signal = signal.with_tag(alias);
            }
            signals.push(signal);
        }

        signals.sort_by(|a, b| a.file_path.cmp(&b.file_path).then(a.title.cmp(&b.title)));

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "manifestsScanned": manifests_scanned,
            "dependenciesFound": deps.len(),
            "vulnerabilitiesFound": signals.len(),
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

    struct FakeSource {
        matches: Vec<VulnMatch>,
    }

    impl VulnSource for FakeSource {
        fn query_batch(&self, _deps: &[Dependency]) -> anyhow::Result<Vec<VulnMatch>> {
            Ok(self.matches.clone())
        }
    }

    struct FailingSource;

    impl VulnSource for FailingSource {
        fn query_batch(&self, _deps: &[Dependency]) -> anyhow::Result<Vec<VulnMatch>> {
            Err(anyhow::anyhow!("backend unreachable"))
        }
    }

    fn opts() -> CollectorOpts {
        let mut opts = CollectorOpts::with_defaults();
        opts.min_confidence = 0.0;
        opts
    }

    #[test]
    fn null_source_produces_no_signals() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Cargo.toml"), "[dependencies]\nserde = \"1.0\"\n").unwrap();

        let collector = VulnCollector::default();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn matched_advisory_is_flagged_with_severity_confidence() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("requirements.txt"),
            "django==3.1.0\n",
        )
        .unwrap();

        let source = Arc::new(FakeSource {
            matches: vec![VulnMatch {
                id: "GHSA-xxxx".to_string(),
                aliases: vec!["CVE-2021-1234".to_string()],
                summary: "SQL injection".to_string(),
                fixed_version: Some("3.1.13".to_string()),
                severity: Some("high".to_string()),
                package: "django".to_string(),
                version: "3.1.0".to_string(),
                ecosystem: "PyPI".to_string(),
            }],
        });

        let collector = VulnCollector::new(source);
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, "vulnerable-dependency");
        assert!((signals[0].confidence - HIGH_CONFIDENCE).abs() < f64::EPSILON);
        assert_eq!(signals[0].file_path, "requirements.txt");
    }

    #[test]
    fn unknown_severity_falls_back_to_default_confidence() {
        assert!((confidence_for_severity(None) - UNKNOWN_CONFIDENCE).abs() < f64::EPSILON);
        assert!((confidence_for_severity(Some("medium")) - MEDIUM_CONFIDENCE).abs() < f64::EPSILON);
        assert!((confidence_for_severity(Some("low")) - LOW_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn backend_failure_degrades_to_empty_signals_without_erroring() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("go.mod"), "module x\n\nrequire github.com/pkg/errors v0.9.1\n").unwrap();

        let collector = VulnCollector::new(Arc::new(FailingSource));
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.is_empty());
    }
}
