//! Bus-factor collector (§4.5): blame-weighted, recency-decayed ownership
//! rolled up per directory, emitting low-bus-factor signals.

mod ownership;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, ScanContext};
use reposcan_walk::walk_files;

use ownership::{AuthorStat, accumulate_file, bus_factor, ranked_ownership, rollup_dirs};

fn confidence_for_bus_factor(factor: u32) -> f64 {
    match factor {
        0 | 1 => 0.80,
        2 => 0.50,
        _ => 0.30,
    }
}

/// Top-N authors formatted as `"Name (NN.N%, L lines)"` lines, for the
/// signal description (§4.5 step 4).
fn describe_top_authors(ranked: &[ownership::OwnershipRow], n: usize) -> String {
    ranked
        .iter()
        .take(n)
        .map(|row| {
            format!(
                "{} ({:.1}%, {} lines)",
                row.author,
                row.share * 100.0,
                row.blame_lines
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collector implementing §4.5.
#[derive(Default)]
pub struct BusFactorCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl BusFactorCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for BusFactorCollector {
    fn name(&self) -> &str {
        "bus-factor"
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

        let excludes = PatternSet::compile(&merge_excludes(&opts.exclude_patterns))
            .map_err(CollectError::Other)?;
        let includes = PatternSet::compile(&opts.include_patterns).map_err(CollectError::Other)?;
        let files = walk_files(repo_path, &excludes, &includes).map_err(CollectError::Other)?;

        let now_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let mut file_authors: Vec<(String, BTreeMap<String, AuthorStat>)> = Vec::new();
        let mut files_blamed = 0usize;
        let mut files_skipped = 0usize;
        for file in &files {
            ctx.check()?;
            let Ok(blamed) = reposcan_git::blame_lines(&git_root, &file.rel_path) else {
                files_skipped += 1;
                continue;
            };
            if blamed.is_empty() {
                continue;
            }
            let mut per_author = BTreeMap::new();
            accumulate_file(&mut per_author, &blamed, now_unix);
            file_authors.push((file.rel_path.clone(), per_author));
            files_blamed += 1;
        }

        ctx.check()?;
        let dirs = rollup_dirs(&file_authors);

        let threshold = opts.bus_factor_threshold;
        let mut signals = Vec::new();
        for (dir_path, stats) in &dirs {
            ctx.check()?;
            let ranked = ranked_ownership(stats);
            let factor = bus_factor(&ranked);
            if factor > threshold {
                continue;
            }
            let top_author = ranked.first().map(|r| r.author.as_str()).unwrap_or("nobody");
            let title = format!("Low bus factor {factor} in `{dir_path}`: {top_author}");
            let description = describe_top_authors(&ranked, 5);
            let confidence = confidence_for_bus_factor(factor);
            let mut signal = RawSignal::new(
                self.name(),
                "low-bus-factor",
                dir_path,
                0,
                title,
                description,
                confidence,
            )
            .with_tag("ownership")
            .with_tag("bus-factor");
            if let Some(top) = ranked.first() {
                signal = signal.with_author(top.author.clone());
            }
            signals.push(signal);
        }

        signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "filesWalked": files.len(),
            "filesBlamed": files_blamed,
            "filesSkipped": files_skipped,
            "directoriesFlagged": signals.len(),
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
    use reposcan_model::CollectorOpts;
    use reposcan_test_support::TestRepo;

    fn opts() -> CollectorOpts {
        let mut opts = CollectorOpts::with_defaults();
        opts.min_confidence = 0.0;
        opts
    }

    #[test]
    fn non_git_directory_is_a_precondition_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let collector = BusFactorCollector::new();
        let ctx = ScanContext::new();
        let result = collector.collect(&ctx, tmp.path(), &opts());
        assert!(matches!(result, Err(CollectError::Precondition(_))));
    }

    #[test]
    fn single_author_repo_yields_bus_factor_one() {
        // §8 scenario 2: two files, both authored by Alice.
        let repo = TestRepo::init().unwrap();
        repo.write_file("a.txt", "line1\nline2\n").unwrap();
        repo.write_file("b.txt", "line1\nline2\n").unwrap();
        repo.commit_all("Alice", "initial", 1_700_000_000).unwrap();

        let collector = BusFactorCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, repo.path(), &opts()).unwrap();

        let root_signal = signals.iter().find(|s| s.file_path == ".").unwrap();
        assert_eq!(root_signal.confidence, 0.80);
        assert!(root_signal.title.contains("bus factor 1"));
        assert!(root_signal.title.contains("Alice"));
    }

    #[test]
    fn two_equal_authors_need_two_for_bus_factor_and_get_lower_confidence() {
        let repo = TestRepo::init().unwrap();
        repo.write_file("shared.txt", "l1\nl2\nl3\nl4\n").unwrap();
        repo.commit_all("Alice", "initial", 1_700_000_000).unwrap();
        repo.write_file("shared.txt", "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\n").unwrap();
        repo.commit_all("Bob", "extend", 1_700_000_100).unwrap();

        let mut opts = opts();
        opts.bus_factor_threshold = 2;
        let collector = BusFactorCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, repo.path(), &opts).unwrap();
        let root_signal = signals.iter().find(|s| s.file_path == ".");
        assert!(root_signal.is_some());
    }
}
