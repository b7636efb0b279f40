//! Doc staleness collector (§4.8): doc age vs. sibling source age,
//! doc-references-vanished-symbol drift, and broken local doc links.

mod markdown;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, ScanContext};
use reposcan_walk::classify::SOURCE_EXTENSIONS;
use reposcan_walk::walk_files;

use markdown::{extract_backticked_identifiers, extract_link_targets, is_local_link};

const STALE_DOC_MIN_GAP_DAYS: f64 = 90.0;
const DOC_CODE_DRIFT_CONFIDENCE: f64 = 0.45;
const BROKEN_DOC_LINK_CONFIDENCE: f64 = 0.6;

fn is_doc_file(rel_path: &str) -> bool {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    let upper = name.to_ascii_uppercase();
    if upper.starts_with("README") {
        return true;
    }
    rel_path.split('/').next() == Some("docs") && name.to_ascii_lowercase().ends_with(".md")
}

fn stale_doc_confidence(gap_days: f64) -> f64 {
    reposcan_math::lerp_clamped(gap_days, 90.0, 0.4, 365.0, 0.7)
}

/// Resolve a markdown link `target`, relative to `doc_dir`, into a
/// repo-relative path with `.`/`..` segments collapsed.
fn resolve_relative(doc_dir: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    let mut segments: Vec<&str> = if doc_dir.is_empty() || doc_dir == "." {
        Vec::new()
    } else {
        doc_dir.split('/').collect()
    };
    for part in target.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Collector implementing §4.8 doc stale.
#[derive(Default)]
pub struct DocStaleCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl DocStaleCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for DocStaleCollector {
    fn name(&self) -> &str {
        "doc-stale"
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

        let all_paths: BTreeSet<String> = files.iter().map(|f| f.rel_path.clone()).collect();

        let mut docs_scanned = 0usize;
        let mut signals = Vec::new();

        for file in &files {
            ctx.check()?;
            if !is_doc_file(&file.rel_path) {
                continue;
            }
            docs_scanned += 1;

            let full_path = repo_path.join(&file.rel_path);
            let Ok(bytes) = reposcan_content::read_head(&full_path, 2 * 1024 * 1024) else {
                continue;
            };
            let text = String::from_utf8_lossy(&bytes).into_owned();

            let doc_dir = reposcan_path::parent_dir(&file.rel_path);
            let source_dir = doc_dir
                .strip_prefix("docs/")
                .or_else(|| doc_dir.strip_prefix("docs"))
                .unwrap_or(&doc_dir)
                .trim_start_matches('/');
            let source_dir = if source_dir.is_empty() { "." } else { source_dir };

            let dir_source_files: Vec<&str> = all_paths
                .iter()
                .filter(|p| {
                    reposcan_path::parent_dir(p) == source_dir
                        && SOURCE_EXTENSIONS.contains(&p.rsplit('.').next().unwrap_or(""))
                })
                .map(String::as_str)
                .collect();

            if !dir_source_files.is_empty() {
                let doc_time = reposcan_git::last_commit_time(&git_root, &file.rel_path);
                let dir_time = dir_source_files
                    .iter()
                    .map(|p| reposcan_git::last_commit_time(&git_root, p))
                    .max()
                    .unwrap_or(0);
                let gap_days = (dir_time - doc_time) as f64 / 86_400.0;
                if doc_time > 0 && dir_time > 0 && gap_days >= STALE_DOC_MIN_GAP_DAYS {
                    let title = format!("Stale doc: `{}` predates recent changes in `{source_dir}`", file.rel_path);
                    signals.push(
                        RawSignal::new(
                            self.name(),
                            "stale-doc",
                            &file.rel_path,
                            0,
                            title,
                            format!("{gap_days:.0} days behind the most recently touched source file."),
                            stale_doc_confidence(gap_days),
                        )
                        .with_tag("doc-stale"),
                    );
                }

                let identifiers = extract_backticked_identifiers(&text);
                if !identifiers.is_empty() {
                    let dir_contents: String = dir_source_files
                        .iter()
                        .filter_map(|p| std::fs::read_to_string(repo_path.join(p)).ok())
                        .collect();
                    let any_found = identifiers.iter().any(|ident| dir_contents.contains(ident.as_str()));
                    if !any_found {
                        let title = format!("Doc/code drift: `{}` references symbols absent from `{source_dir}`", file.rel_path);
                        signals.push(
                            RawSignal::new(self.name(), "doc-code-drift", &file.rel_path, 0, title, String::new(), DOC_CODE_DRIFT_CONFIDENCE)
                                .with_tag("doc-stale"),
                        );
                    }
                }
            }

            for target in extract_link_targets(&text) {
                if !is_local_link(&target) {
                    continue;
                }
                let resolved = resolve_relative(&doc_dir, &target);
                if resolved.is_empty() || all_paths.contains(&resolved) {
                    continue;
                }
                let title = format!("Broken doc link: `{}` links to missing `{target}`", file.rel_path);
                signals.push(
                    RawSignal::new(self.name(), "broken-doc-link", &file.rel_path, 0, title, String::new(), BROKEN_DOC_LINK_CONFIDENCE)
                        .with_tag("doc-stale"),
                );
            }
        }

        signals.sort_by(|a, b| a.file_path.cmp(&b.file_path).then(a.kind.cmp(&b.kind)));

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "docsScanned": docs_scanned,
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
    use reposcan_test_support::TestRepo;

    fn opts() -> CollectorOpts {
        let mut opts = CollectorOpts::with_defaults();
        opts.min_confidence = 0.0;
        opts
    }

    #[test]
    fn non_git_directory_is_a_precondition_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let collector = DocStaleCollector::new();
        let ctx = ScanContext::new();
        let result = collector.collect(&ctx, tmp.path(), &opts());
        assert!(matches!(result, Err(CollectError::Precondition(_))));
    }

    #[test]
    fn stale_doc_is_flagged_when_source_outpaces_doc() {
        let repo = TestRepo::init().unwrap();
        let base = 1_700_000_000;
        repo.write_file("README.md", "See `run` for details.\n").unwrap();
        repo.write_file("lib.go", "func run() {}\n").unwrap();
        repo.commit_all("Alice", "initial", base).unwrap();
        repo.write_file("lib.go", "func run() {}\nfunc more() {}\n").unwrap();
        repo.commit_all("Alice", "update lib", base + (200 * 86_400)).unwrap();

        let collector = DocStaleCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, repo.path(), &opts()).unwrap();
        assert!(signals.iter().any(|s| s.kind == "stale-doc" && s.file_path == "README.md"));
    }

    #[test]
    fn broken_doc_link_is_flagged() {
        let repo = TestRepo::init().unwrap();
        repo.write_file("README.md", "See [guide](docs/guide.md).\n").unwrap();
        repo.commit_all("Alice", "initial", 1_700_000_000).unwrap();

        let collector = DocStaleCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, repo.path(), &opts()).unwrap();
        assert!(signals.iter().any(|s| s.kind == "broken-doc-link" && s.file_path == "README.md"));
    }
}
