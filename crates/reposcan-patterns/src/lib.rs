//! Patterns collector (§4.7): large files, source files with no test
//! counterpart, and directories whose test-to-source ratio runs thin.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{CollectError, Collector, CollectorOpts, RawSignal, ScanContext};
use reposcan_walk::classify::{SOURCE_EXTENSIONS, has_test_counterpart, is_test_file};
use reposcan_walk::{detect_test_roots, is_demo_path, walk_files};

/// Non-blank line floor for a source file to be eligible for `missing-tests`.
const MISSING_TESTS_MIN_LINES: usize = 20;
/// Fixed confidence for `missing-tests`.
const MISSING_TESTS_CONFIDENCE: f64 = 0.5;
/// Fixed confidence for `low-test-ratio`.
const LOW_TEST_RATIO_CONFIDENCE: f64 = 0.4;
/// Minimum source files in a directory before `low-test-ratio` applies.
const LOW_TEST_RATIO_MIN_SOURCE_FILES: usize = 3;
/// Test-to-source ratio floor.
const LOW_TEST_RATIO_THRESHOLD: f64 = 0.10;

fn extension(rel_path: &str) -> Option<&str> {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

fn large_file_confidence(line_count: usize, threshold: usize) -> f64 {
    reposcan_math::lerp_clamped(
        line_count as f64,
        threshold as f64,
        0.4,
        (threshold * 2) as f64,
        0.8,
    )
}

#[derive(Default, Clone, Copy)]
struct DirCounts {
    source_files: usize,
    test_files: usize,
}

/// Collector implementing §4.7.
#[derive(Default)]
pub struct PatternsCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl PatternsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for PatternsCollector {
    fn name(&self) -> &str {
        "patterns"
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

        let all_paths: BTreeSet<String> = files.iter().map(|f| f.rel_path.clone()).collect();
        let test_roots = detect_test_roots(repo_path);

        let mut large_file_signals = Vec::new();
        let mut missing_test_signals = Vec::new();
        let mut dir_counts: BTreeMap<String, DirCounts> = BTreeMap::new();
        let mut files_scanned = 0usize;

        for file in &files {
            ctx.check()?;
            let full_path = repo_path.join(&file.rel_path);
            let Ok(bytes) = reposcan_content::read_head(&full_path, 10 * 1024 * 1024) else {
                continue;
            };
            if reposcan_content::is_binary_prefix(&bytes) {
                continue;
            }
            let text = String::from_utf8_lossy(&bytes);
            let lines: Vec<String> = text.lines().map(str::to_string).collect();
            files_scanned += 1;

            let line_count = lines.len();
            if line_count > opts.large_file_threshold {
                let confidence = large_file_confidence(line_count, opts.large_file_threshold);
                let title = format!("Large file: `{}` has {line_count} lines", file.rel_path);
                let description = format!(
                    "Exceeds the {}-line threshold; consider splitting.",
                    opts.large_file_threshold
                );
                large_file_signals.push(
                    RawSignal::new(self.name(), "large-file", &file.rel_path, 0, title, description, confidence)
                        .with_tag("size"),
                );
            }

            let Some(ext) = extension(&file.rel_path) else {
                continue;
            };
            let is_source = SOURCE_EXTENSIONS.contains(&ext);
            let is_test = is_test_file(&file.rel_path, Some(&lines));

            let dir = reposcan_path::parent_dir(&file.rel_path);
            if is_source {
                let entry = dir_counts.entry(dir.clone()).or_default();
                if is_test {
                    entry.test_files += 1;
                } else {
                    entry.source_files += 1;
                }
            }

            if !is_source || is_test {
                continue;
            }
            let non_blank = reposcan_content::non_blank_line_count(&lines);
            if non_blank < MISSING_TESTS_MIN_LINES {
                continue;
            }
            if is_demo_path(&file.rel_path) && !opts.include_demo_paths {
                continue;
            }
            if has_test_counterpart(&file.rel_path, &all_paths, &test_roots) {
                continue;
            }
            let title = format!("Missing tests: `{}` has no test counterpart", file.rel_path);
            let description = format!("{non_blank} non-blank lines with no matching test file found.");
            missing_test_signals.push(
                RawSignal::new(
                    self.name(),
                    "missing-tests",
                    &file.rel_path,
                    0,
                    title,
                    description,
                    MISSING_TESTS_CONFIDENCE,
                )
                .with_tag("test-coverage"),
            );
        }

        ctx.check()?;
        let mut low_ratio_signals = Vec::new();
        for (dir, counts) in &dir_counts {
            ctx.check()?;
            if counts.source_files < LOW_TEST_RATIO_MIN_SOURCE_FILES {
                continue;
            }
            let ratio = reposcan_math::safe_ratio(counts.test_files, counts.source_files);
            if ratio >= LOW_TEST_RATIO_THRESHOLD {
                continue;
            }
            let title = format!(
                "Low test ratio in `{dir}`: {} test files for {} source files",
                counts.test_files, counts.source_files
            );
            let description = format!("Test-to-source ratio {ratio:.2} is below the 0.10 floor.");
            low_ratio_signals.push(
                RawSignal::new(
                    self.name(),
                    "low-test-ratio",
                    dir,
                    0,
                    title,
                    description,
                    LOW_TEST_RATIO_CONFIDENCE,
                )
                .with_tag("test-coverage"),
            );
        }

        large_file_signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        missing_test_signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        low_ratio_signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        let mut signals = large_file_signals;
        signals.extend(missing_test_signals);
        signals.extend(low_ratio_signals);

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "filesScanned": files_scanned,
            "largeFiles": signals.iter().filter(|s| s.kind == "large-file").count(),
            "missingTests": signals.iter().filter(|s| s.kind == "missing-tests").count(),
            "lowTestRatioDirs": signals.iter().filter(|s| s.kind == "low-test-ratio").count(),
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
    fn large_file_confidence_matches_boundaries() {
        assert_eq!(large_file_confidence(1000, 1000), 0.4);
        assert_eq!(large_file_confidence(2000, 1000), 0.8);
        assert_eq!(large_file_confidence(4000, 1000), 0.8);
    }

    #[test]
    fn large_file_over_threshold_is_flagged() {
        let tmp = tempfile::tempdir().unwrap();
        let body: String = (0..1500).map(|i| format!("line {i}\n")).collect();
        std::fs::write(tmp.path().join("big.go"), body).unwrap();

        let collector = PatternsCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        let found = signals.iter().find(|s| s.kind == "large-file");
        assert!(found.is_some());
    }

    #[test]
    fn missing_tests_flags_source_with_no_counterpart() {
        let tmp = tempfile::tempdir().unwrap();
        let body: String = (0..25).map(|i| format!("line {i}\n")).collect();
        std::fs::write(tmp.path().join("foo.go"), body).unwrap();

        let collector = PatternsCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.iter().any(|s| s.kind == "missing-tests" && s.file_path == "foo.go"));
    }

    #[test]
    fn missing_tests_skips_when_counterpart_present() {
        let tmp = tempfile::tempdir().unwrap();
        let body: String = (0..25).map(|i| format!("line {i}\n")).collect();
        std::fs::write(tmp.path().join("foo.go"), &body).unwrap();
        std::fs::write(tmp.path().join("foo_test.go"), "package main\n").unwrap();

        let collector = PatternsCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(!signals.iter().any(|s| s.kind == "missing-tests"));
    }

    #[test]
    fn missing_tests_skips_demo_paths_unless_opted_in() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("examples")).unwrap();
        let body: String = (0..25).map(|i| format!("line {i}\n")).collect();
        std::fs::write(tmp.path().join("examples/foo.go"), body).unwrap();

        let collector = PatternsCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(!signals.iter().any(|s| s.kind == "missing-tests"));

        let mut opts_with_demo = opts();
        opts_with_demo.include_demo_paths = true;
        let signals = collector.collect(&ctx, tmp.path(), &opts_with_demo).unwrap();
        assert!(signals.iter().any(|s| s.kind == "missing-tests"));
    }

    #[test]
    fn low_test_ratio_flags_thin_directories() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..20 {
            std::fs::write(tmp.path().join(format!("src_{i}.go")), "package main\n").unwrap();
        }

        let collector = PatternsCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.iter().any(|s| s.kind == "low-test-ratio" && s.file_path == "."));
    }
}
