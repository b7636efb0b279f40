//! Sliding-window fingerprinting and clone-group assembly (§4.3 steps 3-6).
//!
//! A window's hash only tells us two positions *start* identically; adjacent
//! windows on the same (file, file) diagonal are chained into one extended
//! clone so a long repeated block collapses to a single group rather than
//! one group per window offset.

use std::collections::HashMap;

/// Minimum window size fingerprinted, per file, per normalization level.
pub const WINDOW_SIZE: usize = 6;

/// One file's non-blank, normalized lines plus their original line numbers.
pub struct FileEntries {
    pub file_idx: usize,
    pub original_lines: Vec<u32>,
    pub type1: Vec<String>,
    pub type2: Vec<String>,
}

/// A clone location: inclusive entry-index span within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySpan {
    pub file_idx: usize,
    pub start_idx: usize,
    pub end_idx: usize,
}

impl EntrySpan {
    fn overlaps(&self, other: &EntrySpan) -> bool {
        self.file_idx == other.file_idx
            && self.start_idx <= other.end_idx
            && other.start_idx <= self.end_idx
    }

    fn union(&self, other: &EntrySpan) -> EntrySpan {
        EntrySpan {
            file_idx: self.file_idx,
            start_idx: self.start_idx.min(other.start_idx),
            end_idx: self.end_idx.max(other.end_idx),
        }
    }
}

/// A surviving clone group: every location sharing the same normalized
/// content, after diagonal chaining and same-file overlap merging.
#[derive(Debug, Clone)]
pub struct CloneGroup {
    pub locations: Vec<EntrySpan>,
    pub span_entries: usize,
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn window_hash(lines: &[String], start: usize, window: usize) -> u64 {
    let mut buf = String::new();
    for line in &lines[start..start + window] {
        buf.push_str(line);
        buf.push('\n');
    }
    fnv1a64(buf.as_bytes())
}

/// hash -> every (file_idx, start_idx) window beginning at that content.
fn build_hash_groups(
    files: &[FileEntries],
    window: usize,
    select: impl Fn(&FileEntries) -> &[String],
) -> HashMap<u64, Vec<(usize, usize)>> {
    let mut groups: HashMap<u64, Vec<(usize, usize)>> = HashMap::new();
    for file in files {
        let lines = select(file);
        if lines.len() < window {
            continue;
        }
        for start in 0..=(lines.len() - window) {
            let hash = window_hash(lines, start, window);
            groups.entry(hash).or_default().push((file.file_idx, start));
        }
    }
    groups
}

type Position = (usize, usize);

fn ordered_pair(a: Position, b: Position) -> (Position, Position) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Every distinct pair of positions that share a window hash.
fn pair_matches(groups: &HashMap<u64, Vec<Position>>) -> Vec<(Position, Position)> {
    let mut pairs = Vec::new();
    for positions in groups.values() {
        if positions.len() < 2 {
            continue;
        }
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                pairs.push(ordered_pair(positions[i], positions[j]));
            }
        }
    }
    pairs
}

/// Chain consecutive same-diagonal pair matches into extended two-location
/// clones, so a repeated block of N windows collapses into one span of
/// `N + window - 1` entries rather than N separate tiny clones.
fn chain_pairs(mut pairs: Vec<(Position, Position)>, window: usize) -> Vec<(EntrySpan, EntrySpan)> {
    pairs.sort_by_key(|&((fa, ia), (fb, ib))| (fa, fb, ia as isize - ib as isize, ia));

    let mut chains = Vec::new();
    let mut i = 0;
    while i < pairs.len() {
        let ((fa, ia0), (fb, ib0)) = pairs[i];
        let diagonal = ia0 as isize - ib0 as isize;
        let mut last_ia = ia0;
        let mut last_ib = ib0;
        let mut j = i + 1;
        while j < pairs.len() {
            let ((fa2, ia2), (fb2, ib2)) = pairs[j];
            if fa2 != fa || fb2 != fb || ia2 as isize - ib2 as isize != diagonal {
                break;
            }
            if ia2 == last_ia + 1 {
                last_ia = ia2;
                last_ib = ib2;
                j += 1;
            } else {
                break;
            }
        }
        chains.push((
            EntrySpan { file_idx: fa, start_idx: ia0, end_idx: last_ia + window - 1 },
            EntrySpan { file_idx: fb, start_idx: ib0, end_idx: last_ib + window - 1 },
        ));
        i = j;
    }
    chains
}

/// Merge same-file overlapping spans within one group's location list.
fn merge_same_file(locations: &[EntrySpan]) -> Vec<EntrySpan> {
    let mut merged: Vec<EntrySpan> = Vec::new();
    'outer: for &span in locations {
        for existing in &mut merged {
            if existing.overlaps(&span) {
                *existing = existing.union(&span);
                continue 'outer;
            }
        }
        merged.push(span);
    }
    merged
}

/// Cluster two-location chains that share an overlapping location into
/// groups covering 3+ distinct files/positions.
fn cluster_chains(chains: Vec<(EntrySpan, EntrySpan)>) -> Vec<CloneGroup> {
    let mut groups: Vec<Vec<EntrySpan>> = chains
        .into_iter()
        .map(|(a, b)| vec![a, b])
        .collect();

    loop {
        let mut merged_any = false;
        'restart: for i in 0..groups.len() {
            for j in (i + 1)..groups.len() {
                let shares = groups[i]
                    .iter()
                    .any(|a| groups[j].iter().any(|b| a.overlaps(b)));
                if shares {
                    let other = groups.remove(j);
                    groups[i].extend(other);
                    merged_any = true;
                    break 'restart;
                }
            }
        }
        if !merged_any {
            break;
        }
    }

    groups
        .into_iter()
        .filter_map(|locations| {
            let merged = merge_same_file(&locations);
            if merged.len() < 2 {
                return None;
            }
            let span_entries = merged.iter().map(|s| s.end_idx - s.start_idx + 1).max()?;
            Some(CloneGroup { locations: merged, span_entries })
        })
        .collect()
}

/// Find every clone group for one normalization level.
#[must_use]
pub fn find_clone_groups(
    files: &[FileEntries],
    select: impl Fn(&FileEntries) -> &[String],
) -> Vec<CloneGroup> {
    let groups = build_hash_groups(files, WINDOW_SIZE, select);
    let pairs = pair_matches(&groups);
    let chains = chain_pairs(pairs, WINDOW_SIZE);
    cluster_chains(chains)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(file_idx: usize, lines: &[&str]) -> FileEntries {
        FileEntries {
            file_idx,
            original_lines: (1..=lines.len() as u32).collect(),
            type1: lines.iter().map(|s| s.to_string()).collect(),
            type2: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn chains_adjacent_windows_into_one_span() {
        let shared: Vec<String> = (0..25).map(|i| format!("line_{i}")).collect();
        let a = FileEntries {
            file_idx: 0,
            original_lines: (1..=25).collect(),
            type1: shared.clone(),
            type2: shared.clone(),
        };
        let b = FileEntries {
            file_idx: 1,
            original_lines: (1..=25).collect(),
            type1: shared.clone(),
            type2: shared,
        };
        let files = vec![a, b];
        let groups = find_clone_groups(&files, |f| &f.type1);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].span_entries, 25);
        assert_eq!(groups[0].locations.len(), 2);
    }

    #[test]
    fn no_match_when_content_differs() {
        let a = entries(0, &["a", "b", "c", "d", "e", "f"]);
        let b = entries(1, &["x", "y", "z", "w", "v", "u"]);
        let files = vec![a, b];
        assert!(find_clone_groups(&files, |f| &f.type1).is_empty());
    }

    #[test]
    fn below_window_size_produces_no_groups() {
        let a = entries(0, &["a", "b"]);
        let b = entries(1, &["a", "b"]);
        let files = vec![a, b];
        assert!(find_clone_groups(&files, |f| &f.type1).is_empty());
    }
}
