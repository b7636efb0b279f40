//! Complexity collector (§4.2): per-language function extraction plus a
//! control-flow/branch score, `score = nonBlankLines / 50 + branchCount`.

mod functions;

use std::path::Path;
use std::sync::Mutex;

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{Collector, CollectorOpts, CollectError, RawSignal, ScanContext};
use reposcan_walk::walk_files;

use functions::{FunctionSpan, extract_functions, word_tokens};

fn extension(rel_path: &str) -> Option<&str> {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Source extensions the complexity collector analyzes (§4.2).
const COMPLEXITY_EXTENSIONS: &[&str] = &[
    "go", "py", "js", "ts", "jsx", "tsx", "java", "rs", "rb", "php", "swift", "scala", "ex", "exs",
];

const BRANCH_WORDS: &[&str] = &[
    "if", "elif", "elsif", "for", "while", "switch", "case", "catch", "except", "guard", "when",
    "unless",
];

fn is_comment_only(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with('#') || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

fn branch_count(body_lines: &[String]) -> usize {
    let mut count = 0usize;
    for line in body_lines {
        if is_comment_only(line) {
            continue;
        }
        for word in word_tokens(line) {
            if BRANCH_WORDS.contains(&word) {
                count += 1;
            }
        }
        count += line.matches("&&").count();
        count += line.matches("||").count();
    }
    count
}

/// §4.2 step 7 confidence tiers.
fn confidence_for_score(score: f64) -> f64 {
    if score >= 15.0 {
        0.80
    } else if score >= 8.0 {
        reposcan_math::lerp_clamped(score, 8.0, 0.60, 15.0, 0.80)
    } else if score >= 6.0 {
        reposcan_math::lerp_clamped(score, 6.0, 0.50, 8.0, 0.60)
    } else {
        0.50
    }
}

#[derive(Debug, Clone)]
struct ScoredFunction {
    rel_path: String,
    span: FunctionSpan,
    non_blank_lines: usize,
    branches: usize,
    score: f64,
}

fn score_functions(rel_path: &str, ext: &str, lines: &[String]) -> Vec<ScoredFunction> {
    extract_functions(ext, lines)
        .into_iter()
        .filter_map(|span| {
            let body = &lines[span.start_line - 1..span.end_line.min(lines.len())];
            let non_blank_lines = reposcan_content::non_blank_line_count(body);
            let branches = branch_count(body);
            let score = non_blank_lines as f64 / 50.0 + branches as f64;
            Some(ScoredFunction {
                rel_path: rel_path.to_string(),
                span,
                non_blank_lines,
                branches,
                score,
            })
        })
        .collect()
}

/// Collector implementing §4.2.
#[derive(Default)]
pub struct ComplexityCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl ComplexityCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for ComplexityCollector {
    fn name(&self) -> &str {
        "complexity"
    }

    fn collect(
        &self,
        ctx: &ScanContext,
        repo_path: &Path,
        opts: &CollectorOpts,
    ) -> Result<Vec<RawSignal>, CollectError> {
        let excludes = PatternSet::compile(&merge_excludes(&opts.exclude_patterns))
            .map_err(CollectError::Other)?;
        let includes =
            PatternSet::compile(&opts.include_patterns).map_err(CollectError::Other)?;
        let files = walk_files(repo_path, &excludes, &includes).map_err(CollectError::Other)?;

        let min_function_lines = opts.min_function_lines.max(1);
        let min_score = opts.min_complexity_score;

        let mut scored = Vec::new();
        let mut files_scanned = 0usize;
        for file in &files {
            ctx.check()?;
            let Some(ext) = extension(&file.rel_path) else {
                continue;
            };
            if !COMPLEXITY_EXTENSIONS.contains(&ext) {
                continue;
            }
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

            for function in score_functions(&file.rel_path, ext, &lines) {
                let body_non_blank = function.non_blank_lines;
                if (function.span.end_line - function.span.start_line + 1) < 1 {
                    continue;
                }
                if body_non_blank < min_function_lines {
                    continue;
                }
                if function.score >= min_score {
                    scored.push(function);
                }
            }
        }

        // §4.2 determinism: sort by score descending, ties by start line
        // then file path.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.span.start_line.cmp(&b.span.start_line))
                .then(a.rel_path.cmp(&b.rel_path))
        });

        let signals: Vec<RawSignal> = scored
            .iter()
            .map(|f| {
                let confidence = confidence_for_score(f.score);
                let title = format!(
                    "Function `{}` has high complexity (score {:.1})",
                    f.span.name, f.score
                );
                let description = format!(
                    "{} non-blank lines, {} branch points, lines {}-{}",
                    f.non_blank_lines, f.branches, f.span.start_line, f.span.end_line
                );
                RawSignal::new(
                    self.name(),
                    "complex-function",
                    &f.rel_path,
                    f.span.start_line as u32,
                    title,
                    description,
                    confidence,
                )
                .with_tag("complexity")
                .with_tag("refactor-candidate")
            })
            .collect();

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "filesScanned": files_scanned,
            "functionsFlagged": signals.len(),
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

    fn opts() -> CollectorOpts {
        let mut opts = CollectorOpts::with_defaults();
        opts.min_confidence = 0.0;
        opts
    }

    #[test]
    fn branch_count_does_not_double_count_else_if() {
        let lines = vec!["else if (x) {".to_string()];
        assert_eq!(branch_count(&lines), 1);
    }

    #[test]
    fn branch_count_ignores_comment_only_lines() {
        let lines = vec!["// if this && that".to_string()];
        assert_eq!(branch_count(&lines), 0);
    }

    #[test]
    fn branch_count_counts_logical_operators() {
        let lines = vec!["if (a && b || c) {".to_string()];
        assert_eq!(branch_count(&lines), 3);
    }

    #[test]
    fn confidence_tiers_match_spec_boundaries() {
        assert_eq!(confidence_for_score(15.0), 0.80);
        assert_eq!(confidence_for_score(22.4), 0.80);
        assert_eq!(confidence_for_score(8.0), 0.60);
        assert_eq!(confidence_for_score(6.0), 0.50);
        assert_eq!(confidence_for_score(5.9), 0.50);
    }

    #[test]
    fn end_to_end_scenario_one_120_line_function_20_branches() {
        // §8 scenario 1: nonBlankLines=120, branchCount=20 -> score=22.4 -> confidence 0.80.
        let tmp = tempfile::tempdir().unwrap();
        let mut body = String::from("func Big() {\n");
        for i in 0..20 {
            body.push_str(&format!("\tif x{i} {{\n\t\tdoThing()\n\t}}\n"));
        }
        // pad to exactly 120 non-blank body lines (20 ifs * 3 lines = 60, add 58 statements + open/close).
        for i in 0..58 {
            body.push_str(&format!("\tdoMore{i}()\n"));
        }
        body.push_str("}\n");
        std::fs::write(tmp.path().join("big.go"), &body).unwrap();

        let collector = ComplexityCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, "complex-function");
        assert_eq!(signals[0].confidence, 0.80);
    }

    #[test]
    fn functions_below_min_function_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("tiny.go"), "func Tiny() {\n\treturn\n}\n").unwrap();
        let collector = ComplexityCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn signals_sorted_by_score_descending() {
        let tmp = tempfile::tempdir().unwrap();
        let low = "func Low() {\n".to_string()
            + &"\tif a {\n\t\tx()\n\t}\n".repeat(6)
            + "}\n";
        let high = "func High() {\n".to_string()
            + &"\tif a {\n\t\tx()\n\t}\n".repeat(20)
            + "}\n";
        std::fs::write(tmp.path().join("a_low.go"), low).unwrap();
        std::fs::write(tmp.path().join("b_high.go"), high).unwrap();

        let collector = ComplexityCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.len() >= 2);
        assert!(signals[0].confidence >= signals[1].confidence);
    }
}
