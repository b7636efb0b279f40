//! Registry bootstrap and common post-processing for the collector framework.
//!
//! This crate wires every collector crate into a single [`Registry`] and
//! runs a scan with the shared post-processing pipeline every collector
//! family gets for free: timestamp enrichment from git history, confidence
//! filtering, and the registration-order presentation documented in §5 of
//! the engine's design notes.

use std::path::Path;
use std::sync::Arc;

use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, Registry, ScanContext};

/// Build a [`Registry`] containing every collector, in the fixed
/// registration order the rest of the engine's ordering guarantees depend
/// on: complexity, duplication, coupling, bus factor, gitlog, patterns,
/// then the summarized §4.8 collectors in the order they're specified.
#[must_use]
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(Arc::new(reposcan_complexity::ComplexityCollector::new()));
    registry.register(Arc::new(reposcan_duplication::DuplicationCollector::new()));
    registry.register(Arc::new(reposcan_coupling::CouplingCollector::new()));
    registry.register(Arc::new(reposcan_busfactor::BusFactorCollector::new()));
    registry.register(Arc::new(reposcan_gitlog::GitlogCollector::new()));
    registry.register(Arc::new(reposcan_patterns::PatternsCollector::new()));
    registry.register(Arc::new(reposcan_apidrift::ApiDriftCollector::new()));
    registry.register(Arc::new(reposcan_configdrift::ConfigDriftCollector::new()));
    registry.register(Arc::new(reposcan_docstale::DocStaleCollector::new()));
    registry.register(Arc::new(reposcan_githygiene::GitHygieneCollector::new()));
    registry.register(Arc::new(reposcan_vuln::VulnCollector::default()));
    registry
}

/// Outcome of a single collector's run within a larger scan: either its
/// signals, or the error it failed with (collection continues past a
/// single collector's hard failure so one bad collector doesn't sink the
/// whole scan).
pub struct CollectorOutcome {
    pub name: String,
    pub result: Result<Vec<RawSignal>, CollectError>,
    pub metrics: Option<serde_json::Value>,
}

/// Run every collector in `registry` over `repo_path`, honoring `opts`,
/// enrich each signal's timestamp from git history when one isn't already
/// set, and apply `opts.min_confidence` filtering.
///
/// Signals are returned grouped by collector in registration order; within
/// a collector's group the collector's own ordering is preserved. A single
/// collector's `Err` is captured in its [`CollectorOutcome`] rather than
/// aborting the whole scan, except for [`CollectError::Cancelled`], which
/// stops the scan immediately since a cancelled `ScanContext` applies to
/// every remaining collector too.
pub fn run_scan(
    registry: &Registry,
    ctx: &ScanContext,
    repo_path: &Path,
    opts: &CollectorOpts,
) -> Result<Vec<CollectorOutcome>, CollectError> {
    let git_root = reposcan_git::repo_root(repo_path);
    let mut outcomes = Vec::new();

    for collector in registry.each() {
        ctx.check()?;
        let name = collector.name().to_string();
        match collector.collect(ctx, repo_path, opts) {
            Ok(mut signals) => {
                enrich_timestamps(&mut signals, git_root.as_deref());
                signals.retain(|s| s.confidence >= opts.min_confidence);
                outcomes.push(CollectorOutcome {
                    name,
                    result: Ok(signals),
                    metrics: collector.metrics(),
                });
            }
            Err(CollectError::Cancelled) => return Err(CollectError::Cancelled),
            Err(err) => {
                outcomes.push(CollectorOutcome {
                    name,
                    result: Err(err),
                    metrics: collector.metrics(),
                });
            }
        }
    }

    Ok(outcomes)
}

/// Fill in a zero timestamp from the file's last commit time, when the repo
/// is a git checkout. Signals that already set a timestamp (gitlog's own
/// revert/churn/stale-branch signals, for instance) are left untouched.
fn enrich_timestamps(signals: &mut [RawSignal], git_root: Option<&Path>) {
    let Some(git_root) = git_root else {
        return;
    };
    for signal in signals {
        if signal.timestamp != 0 {
            continue;
        }
        let ts = reposcan_git::last_commit_time(git_root, &signal.file_path);
        if ts != 0 {
            signal.timestamp = ts;
        }
    }
}

/// Run a single named collector, applying the same enrichment and
/// confidence filtering as [`run_scan`]. Returns an error if no collector
/// with that name is registered.
pub fn run_one(
    registry: &Registry,
    name: &str,
    ctx: &ScanContext,
    repo_path: &Path,
    opts: &CollectorOpts,
) -> Result<CollectorOutcome, CollectError> {
    let collector = registry
        .get(name)
        .ok_or_else(|| CollectError::Other(anyhow::anyhow!("no collector registered as {name:?}")))?;
    ctx.check()?;
    match collector.collect(ctx, repo_path, opts) {
        Ok(mut signals) => {
            let git_root = reposcan_git::repo_root(repo_path);
            enrich_timestamps(&mut signals, git_root.as_deref());
            signals.retain(|s| s.confidence >= opts.min_confidence);
            Ok(CollectorOutcome {
                name: name.to_string(),
                result: Ok(signals),
                metrics: collector.metrics(),
            })
        }
        Err(err) => Ok(CollectorOutcome {
            name: name.to_string(),
            result: Err(err),
            metrics: collector.metrics(),
        }),
    }
}

/// Flatten every collector's signals into one list, in registration order,
/// dropping any collector that failed outright. Convenience for callers
/// (the CLI) that just want "all the signals found."
#[must_use]
pub fn flatten_signals(outcomes: &[CollectorOutcome]) -> Vec<RawSignal> {
    outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .flat_map(|signals| signals.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposcan_test_support::TestRepo;

    #[test]
    fn default_registry_has_all_eleven_collectors_in_order() {
        let registry = default_registry();
        let names: Vec<&str> = registry.each().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "complexity",
                "duplication",
                "coupling",
                "bus-factor",
                "gitlog",
                "patterns",
                "api-drift",
                "config-drift",
                "doc-stale",
                "git-hygiene",
                "vuln",
            ]
        );
    }

    #[test]
    fn run_scan_keeps_going_past_a_single_precondition_failure() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("main.rs"), "fn main() {}\n").unwrap();

        let registry = default_registry();
        let ctx = ScanContext::new();
        let mut opts = CollectorOpts::with_defaults();
        opts.min_confidence = 0.0;

        let outcomes = run_scan(&registry, &ctx, tmp.path(), &opts).unwrap();
        assert_eq!(outcomes.len(), registry.len());
        // bus-factor and gitlog fail precondition outside a git repo, but
        // the scan still produces outcomes for every other collector.
        let bus_factor = outcomes.iter().find(|o| o.name == "bus-factor").unwrap();
        assert!(matches!(bus_factor.result, Err(CollectError::Precondition(_))));
        let complexity = outcomes.iter().find(|o| o.name == "complexity").unwrap();
        assert!(complexity.result.is_ok());
    }

    #[test]
    fn min_confidence_filters_low_confidence_signals() {
        let repo = TestRepo::init().unwrap();
        repo.write_file("big.go", &"x\n".repeat(1500)).unwrap();
        repo.commit_all("Dev", "add big file", 1_700_000_000).unwrap();

        let registry = default_registry();
        let ctx = ScanContext::new();
        let mut opts = CollectorOpts::with_defaults();
        opts.min_confidence = 1.1;

        let outcomes = run_scan(&registry, &ctx, repo.path(), &opts).unwrap();
        let all = flatten_signals(&outcomes);
        assert!(all.is_empty());
    }

    #[test]
    fn run_one_rejects_unknown_collector_names() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = default_registry();
        let ctx = ScanContext::new();
        let opts = CollectorOpts::with_defaults();
        let result = run_one(&registry, "nonexistent", &ctx, tmp.path(), &opts);
        assert!(result.is_err());
    }

    #[test]
    fn timestamps_are_enriched_from_git_history_when_unset() {
        let repo = TestRepo::init().unwrap();
        repo.write_file("big.go", &"x\n".repeat(1500)).unwrap();
        repo.commit_all("Dev", "add big file", 1_700_000_000).unwrap();

        let registry = default_registry();
        let ctx = ScanContext::new();
        let mut opts = CollectorOpts::with_defaults();
        opts.min_confidence = 0.0;

        let outcomes = run_scan(&registry, &ctx, repo.path(), &opts).unwrap();
        let patterns = outcomes.iter().find(|o| o.name == "patterns").unwrap();
        let signals = patterns.result.as_ref().unwrap();
        assert!(signals.iter().any(|s| s.file_path == "big.go" && s.timestamp == 1_700_000_000));
    }
}
