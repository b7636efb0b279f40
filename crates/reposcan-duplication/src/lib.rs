//! Duplication collector (§4.3): Type-1 (exact) and Type-2 (renamed
//! identifier) clone detection via sliding-window fingerprints.

mod fingerprint;
mod normalize;

use std::path::Path;
use std::sync::Mutex;

use reposcan_exclude::{PatternSet, merge_excludes};
use reposcan_model::{Collector, CollectError, CollectorOpts, RawSignal, ScanContext};
use reposcan_walk::walk_files;

use fingerprint::{CloneGroup, EntrySpan, FileEntries, WINDOW_SIZE, find_clone_groups};
use normalize::{normalize_type1, normalize_type2};

/// Hard file-count cap shared with the coupling collector (§5).
const FILE_CAP: usize = 10_000;

fn base_confidence(span: f64) -> f64 {
    if span >= 50.0 {
        0.75
    } else if span >= 30.0 {
        reposcan_math::lerp_clamped(span, 30.0, 0.60, 50.0, 0.75)
    } else if span >= 15.0 {
        reposcan_math::lerp_clamped(span, 15.0, 0.45, 30.0, 0.60)
    } else {
        reposcan_math::lerp_clamped(span, 6.0, 0.35, 15.0, 0.45)
    }
}

fn confidence_for_group(span_entries: usize, location_count: usize, is_type2: bool) -> f64 {
    let mut confidence = base_confidence(span_entries as f64);
    if location_count >= 4 {
        confidence += 0.10;
    } else if location_count == 3 {
        confidence += 0.05;
    }
    if is_type2 {
        confidence -= 0.05;
    }
    confidence.clamp(0.0, 0.80)
}

struct ResolvedLocation {
    rel_path: String,
    start_line: u32,
    end_line: u32,
}

fn resolve_locations(
    group: &CloneGroup,
    rel_paths: &[String],
    files: &[FileEntries],
) -> Vec<ResolvedLocation> {
    let mut locations: Vec<ResolvedLocation> = group
        .locations
        .iter()
        .map(|span: &EntrySpan| ResolvedLocation {
            rel_path: rel_paths[span.file_idx].clone(),
            start_line: files[span.file_idx].original_lines[span.start_idx],
            end_line: files[span.file_idx].original_lines[span.end_idx],
        })
        .collect();
    locations.sort_by(|a, b| a.rel_path.cmp(&b.rel_path).then(a.start_line.cmp(&b.start_line)));
    locations
}

fn line_ranges_overlap(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start <= b_end && b_start <= a_end
}

struct ScoredGroup {
    locations: Vec<ResolvedLocation>,
    span_entries: usize,
    is_type2: bool,
}

fn emit_signal(source: &str, group: &ScoredGroup) -> RawSignal {
    let confidence = confidence_for_group(group.span_entries, group.locations.len(), group.is_type2);
    let first = &group.locations[0];
    let title = if group.is_type2 {
        format!(
            "Near-duplicate block ({} lines) across {} locations",
            group.span_entries,
            group.locations.len()
        )
    } else {
        format!(
            "Duplicated block ({} lines) across {} locations",
            group.span_entries,
            group.locations.len()
        )
    };
    let description = group
        .locations
        .iter()
        .map(|loc| format!("{}:{}-{}", loc.rel_path, loc.start_line, loc.end_line))
        .collect::<Vec<_>>()
        .join("\n");
    RawSignal::new(source, "code-clone", &first.rel_path, first.start_line, title, description, confidence)
        .with_tag(if group.is_type2 { "near-clone" } else { "exact-clone" })
        .with_tag("duplication")
}

/// Collector implementing §4.3.
#[derive(Default)]
pub struct DuplicationCollector {
    metrics: Mutex<Option<serde_json::Value>>,
}

impl DuplicationCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for DuplicationCollector {
    fn name(&self) -> &str {
        "duplication"
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
        let walked = walk_files(repo_path, &excludes, &includes).map_err(CollectError::Other)?;

        let mut cap_exceeded = false;
        let mut candidate_paths: Vec<String> = walked.into_iter().map(|f| f.rel_path).collect();
        if candidate_paths.len() > FILE_CAP {
            candidate_paths.truncate(FILE_CAP);
            cap_exceeded = true;
        }

        let mut rel_paths = Vec::new();
        let mut files = Vec::new();
        for rel_path in candidate_paths {
            ctx.check()?;
            let full_path = repo_path.join(&rel_path);
            let Ok(bytes) = reposcan_content::read_head(&full_path, 10 * 1024 * 1024) else {
                continue;
            };
            if reposcan_content::is_binary_prefix(&bytes) {
                continue;
            }
            let text = String::from_utf8_lossy(&bytes);
            let raw_lines: Vec<String> = text.lines().map(str::to_string).collect();
            let file_name = rel_path.rsplit('/').next().unwrap_or(&rel_path).to_string();
            if reposcan_content::is_generated(&file_name, &raw_lines) {
                continue;
            }

            let mut original_lines = Vec::new();
            let mut type1 = Vec::new();
            let mut type2 = Vec::new();
            for (idx, raw_line) in raw_lines.iter().enumerate() {
                let t1 = normalize_type1(raw_line);
                if t1.trim().is_empty() {
                    continue;
                }
                let t2 = normalize_type2(&t1);
                original_lines.push((idx + 1) as u32);
                type1.push(t1);
                type2.push(t2);
            }
            if original_lines.len() < WINDOW_SIZE {
                continue;
            }

            let file_idx = files.len();
            rel_paths.push(rel_path);
            files.push(FileEntries { file_idx, original_lines, type1, type2 });
        }

        ctx.check()?;

        let type1_groups = find_clone_groups(&files, |f| &f.type1);
        let type2_groups_raw = find_clone_groups(&files, |f| &f.type2);

        let type1_scored: Vec<ScoredGroup> = type1_groups
            .iter()
            .map(|group| ScoredGroup {
                locations: resolve_locations(group, &rel_paths, &files),
                span_entries: group.span_entries,
                is_type2: false,
            })
            .collect();

        let type1_ranges: Vec<(&str, u32, u32)> = type1_scored
            .iter()
            .flat_map(|group| group.locations.iter().map(|loc| (loc.rel_path.as_str(), loc.start_line, loc.end_line)))
            .collect();

        let type2_scored: Vec<ScoredGroup> = type2_groups_raw
            .iter()
            .filter_map(|group| {
                let mut locations = resolve_locations(group, &rel_paths, &files);
                locations.retain(|loc| {
                    !type1_ranges.iter().any(|&(path, start, end)| {
                        path == loc.rel_path && line_ranges_overlap(loc.start_line, loc.end_line, start, end)
                    })
                });
                if locations.len() < 2 {
                    return None;
                }
                Some(ScoredGroup { locations, span_entries: group.span_entries, is_type2: true })
            })
            .collect();

        let mut signals: Vec<RawSignal> = type1_scored
            .iter()
            .chain(type2_scored.iter())
            .map(|group| emit_signal(self.name(), group))
            .collect();

        signals.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.file_path.cmp(&b.file_path))
                .then(a.line.cmp(&b.line))
        });
        signals.truncate(opts.max_issues);

        *self.metrics.lock().expect("metrics mutex poisoned") = Some(serde_json::json!({
            "filesScanned": files.len(),
            "capExceeded": cap_exceeded,
            "cloneGroups": signals.len(),
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

    fn block(lines: usize) -> String {
        (0..lines).map(|i| format!("statement_{i}();\n")).collect()
    }

    #[test]
    fn exact_duplicate_block_across_two_files_emits_one_signal() {
        let tmp = tempfile::tempdir().unwrap();
        let body = block(22);
        std::fs::write(tmp.path().join("a.rs"), &body).unwrap();
        std::fs::write(tmp.path().join("b.rs"), &body).unwrap();

        let collector = DuplicationCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, "code-clone");
        assert!((signals[0].confidence - 0.52).abs() < 1e-9);
    }

    #[test]
    fn unique_files_produce_no_clones() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.rs"), block(10)).unwrap();
        std::fs::write(tmp.path().join("b.rs"), "fn totally_unique() { 1 }\n".repeat(10)).unwrap();

        let collector = DuplicationCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn type2_clone_is_suppressed_when_type1_already_covers_the_range() {
        let tmp = tempfile::tempdir().unwrap();
        // Identical (Type 1) block: Type 2 would also match the same range
        // but must not produce a second overlapping signal.
        let body = block(20);
        std::fs::write(tmp.path().join("a.rs"), &body).unwrap();
        std::fs::write(tmp.path().join("b.rs"), &body).unwrap();

        let collector = DuplicationCollector::new();
        let ctx = ScanContext::new();
        let signals = collector.collect(&ctx, tmp.path(), &opts()).unwrap();
        assert!(signals.iter().all(|s| s.tags.contains("exact-clone")));
    }

    #[test]
    fn confidence_never_exceeds_cap() {
        assert!(confidence_for_group(200, 10, false) <= 0.80);
    }
}
