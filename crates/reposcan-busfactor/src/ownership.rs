//! Per-author blame/commit-weight accumulation and directory rollup
//! (§4.5 steps 1-3).

use std::collections::BTreeMap;

/// One author's accumulated ownership signal within a single directory (or
/// file, before rollup): raw line count plus recency-decayed commit
/// weight.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AuthorStat {
    pub blame_lines: usize,
    pub commit_weight: f64,
}

/// Accumulate one file's blamed `(author, commit_time)` lines into
/// per-author stats, decaying each line's weight by its commit's age
/// relative to `now_unix` (§4.5 step 1).
pub fn accumulate_file(
    per_author: &mut BTreeMap<String, AuthorStat>,
    blamed_lines: &[(String, i64)],
    now_unix: i64,
) {
    for (author, commit_time) in blamed_lines {
        let age_days = (now_unix - commit_time) as f64 / 86_400.0;
        let weight = reposcan_math::recency_weight(age_days);
        let entry = per_author.entry(author.clone()).or_default();
        entry.blame_lines += 1;
        entry.commit_weight += weight;
    }
}

/// One directory's rolled-up ownership: the union of every file directly
/// in it plus, recursively, every subdirectory's files (§4.5 step 2).
#[derive(Debug, Clone, Default)]
pub struct DirStats {
    pub per_author: BTreeMap<String, AuthorStat>,
    pub total_lines: usize,
}

impl DirStats {
    fn merge_file(&mut self, file_authors: &BTreeMap<String, AuthorStat>, file_lines: usize) {
        for (author, stat) in file_authors {
            let entry = self.per_author.entry(author.clone()).or_default();
            entry.blame_lines += stat.blame_lines;
            entry.commit_weight += stat.commit_weight;
        }
        self.total_lines += file_lines;
    }
}

/// Roll up a flat list of `(file_rel_path, per_author)` into every
/// ancestor directory, including the file's own directory and root `.`.
#[must_use]
pub fn rollup_dirs(files: &[(String, BTreeMap<String, AuthorStat>)]) -> BTreeMap<String, DirStats> {
    let mut dirs: BTreeMap<String, DirStats> = BTreeMap::new();
    for (rel_path, per_author) in files {
        let file_lines: usize = per_author.values().map(|s| s.blame_lines).sum();
        for dir in reposcan_path::ancestor_dirs(rel_path) {
            dirs.entry(dir).or_default().merge_file(per_author, file_lines);
        }
    }
    dirs
}

/// One author's ownership ranking row: name, raw lines, ownership share.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipRow {
    pub author: String,
    pub blame_lines: usize,
    pub commit_weight: f64,
    pub share: f64,
}

/// Rank authors by ownership share (ties by `commit_weight` then name),
/// per §4.5 step 3.
#[must_use]
pub fn ranked_ownership(dir: &DirStats) -> Vec<OwnershipRow> {
    let total = dir.total_lines;
    let mut rows: Vec<OwnershipRow> = dir
        .per_author
        .iter()
        .map(|(author, stat)| OwnershipRow {
            author: author.clone(),
            blame_lines: stat.blame_lines,
            commit_weight: stat.commit_weight,
            share: reposcan_math::safe_ratio(stat.blame_lines, total),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.share
            .partial_cmp(&a.share)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.commit_weight
                    .partial_cmp(&a.commit_weight)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.author.cmp(&b.author))
    });
    rows
}

/// Smallest `k` such that the top `k` ranked authors hold `> 0.5` of the
/// directory's blame lines; `0` if there are no authors (§8 bus-factor
/// math property).
#[must_use]
pub fn bus_factor(ranked: &[OwnershipRow]) -> u32 {
    if ranked.is_empty() {
        return 0;
    }
    let mut cumulative = 0.0;
    for (idx, row) in ranked.iter().enumerate() {
        cumulative += row.share;
        if cumulative > 0.5 {
            return (idx + 1) as u32;
        }
    }
    ranked.len() as u32
}
