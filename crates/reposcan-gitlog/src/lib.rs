//! Gitlog collector (§4.6): revert detection, 90-day churn, and
//! stale-branch enumeration from commit history.

mod revert;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use reposcan_git::GitCommit;
use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, ScanContext};

use revert::{RevertTarget, detect_revert};

/// §4.6: branch names never flagged as stale.
const PROTECTED_BRANCHES: &[&str] = &["main", "master", "develop", "trunk"];

/// Churn window: commits in the last 90 days.
const CHURN_WINDOW_DAYS: i64 = 90;
/// Minimum commit count within the churn window to emit a signal.
const CHURN_MIN_COMMITS: usize = 10;
/// Stale-branch age floor.
const STALE_BRANCH_MIN_DAYS: f64 = 30.0;

fn churn_confidence(commit_count: usize) -> f64 {
    reposcan_math::lerp_clamped(commit_count as f64, 10.0, 0.4, 30.0, 0.8)
}

fn stale_branch_confidence(age_days: f64) -> f64 {
    reposcan_math::lerp_clamped(age_days, 30.0, 0.3, 90.0, 0.6)
}

fn revert_signal(source: &str, commit: &GitCommit, target: &RevertTarget) -> RawSignal {
    let title = match target {
        RevertTarget::OriginalSubject(subject) => format!("Revert: {subject}"),
        RevertTarget::ShortHash(hash) => format!("Revert of {hash}"),
    };
    let description = format!("Reverting commit {}", commit.short_hash);
    RawSignal::new(source, "revert", ".", 0, title, description, 0.70)
        .with_tag("git-hygiene")
        .with_author(commit.author.clone())
        .with_timestamp(commit.timestamp)
}

struct ChurnAccumulator {
    commit_count: usize,
    authors: std::collections::BTreeSet<String>,
    last_touched: i64,
}

fn churn_signal(source: &str, path: &str, acc: &ChurnAccumulator) -> RawSignal {
    let confidence = churn_confidence(acc.commit_count);
    let title = format!("High churn: `{path}` changed {} times in the last 90 days", acc.commit_count);
    let authors: Vec<&str> = acc.authors.iter().map(String::as_str).collect();
    let description = format!("Contributing authors: {}", authors.join(", "));
    RawSignal::new(source, "churn", path, 0, title, description, confidence)
        .with_tag("churn")
        .with_timestamp(acc.last_touched)
}

fn stale_branch_signal(source: &str, name: &str, tip_timestamp: i64, age_days: f64) -> RawSignal {
    let confidence = stale_branch_confidence(age_days);
    let title = format!("Stale branch `{name}` ({} days old)", age_days.floor() as i64);
    let description = format!("Tip commit age: {:.1} days", age_days);
    RawSignal::new(source, "stale-branch", name, 0, title, description, confidence)
        .with_tag("stale-branch")
        .with_timestamp(tip_timestamp)
}

/// Collector implementing §4.6.
#[derive(Default)]
pub struct GitlogCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl GitlogCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for GitlogCollector {
    fn name(&self) -> &str {
        "gitlog"
    }

    fn collect(
        &self,
        ctx: &ScanContext,
        repo_path: &Path,
        opts: &CollectorOpts,
    ) -> Result<Vec<RawSignal>, CollectError> {
        let git_root_hint = opts.git_root.clone().unwrap_or_else(|| repo_path.to_path_buf());
        let git_root = reposcan_git::repo_root(&git_root_hint).ok_or_else(|| {
            CollectError::Precondition(format!(
                "{} is not inside a git repository",
                git_root_hint.display()
            ))
        })?;

        let since_days = opts.git_since.map(|s| s.days);
        let commits = reposcan_git::collect_history(&git_root, Some(opts.git_depth), since_days)
            .map_err(CollectError::Other)?;

        let now_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let mut revert_signals = Vec::new();
        let mut churn_acc: BTreeMap<String, ChurnAccumulator> = BTreeMap::new();
        let mut commits_examined = 0usize;

        for commit in &commits {
            ctx.check()?;
            commits_examined += 1;
            if commits_examined % 100 == 0 {
                opts.report(&format!("gitlog: examined {commits_examined} commits"));
            }

            if let Some(target) = detect_revert(&commit.subject, &commit.body) {
                revert_signals.push(revert_signal(self.name(), commit, &target));
            }

            let age_days = (now_unix - commit.timestamp) as f64 / 86_400.0;
            if age_days <= CHURN_WINDOW_DAYS as f64 {
                let changed = reposcan_git::changed_files(&git_root, &commit.hash).unwrap_or_default();
                for path in changed {
                    let entry = churn_acc.entry(path).or_insert(ChurnAccumulator {
                        commit_count: 0,
                        authors: std::collections::BTreeSet::new(),
                        last_touched: commit.timestamp,
                    });
                    entry.commit_count += 1;
                    entry.authors.insert(commit.author.clone());
                    entry.last_touched = entry.last_touched.max(commit.timestamp);
                }
            }
        }

        ctx.check()?;

        let mut churn_signals: Vec<RawSignal> = churn_acc
            .iter()
            .filter(|(_, acc)| acc.commit_count >= CHURN_MIN_COMMITS)
            .map(|(path, acc)| churn_signal(self.name(), path, acc))
            .collect();
        churn_signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        ctx.check()?;
        let branches = reposcan_git::branches(&git_root).map_err(CollectError::Other)?;
        let mut stale_signals: Vec<RawSignal> = branches
            .into_iter()
            .filter(|(name, _)| !PROTECTED_BRANCHES.contains(&name.as_str()))
            .filter_map(|(name, tip_ts)| {
                let age_days = (now_unix - tip_ts) as f64 / 86_400.0;
                (age_days >= STALE_BRANCH_MIN_DAYS)
                    .then(|| stale_branch_signal(self.name(), &name, tip_ts, age_days))
            })
            .collect();
        stale_signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        let mut signals = revert_signals;
        signals.extend(churn_signals);
        signals.extend(stale_signals);

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "commitsExamined": commits_examined,
            "reverts": signals.iter().filter(|s| s.kind == "revert").count(),
            "churnPaths": signals.iter().filter(|s| s.kind == "churn").count(),
            "staleBranches": signals.iter().filter(|s| s.kind == "stale-branch").count(),
        }));

        Ok(signals)
    }

    fn metrics(&self) -> Option<serde_json::Value> {
        self.metrics.lock().expect("metrics mutex poisoned").clone()
    }
}
