//! # reposcan-git
//!
//! Streaming git adapter backing the §6 git abstraction: history walk,
//! blame-equivalent per-line authorship, branch enumeration, and
//! last-commit-time lookup. Shells out to the `git` binary rather than
//! linking `git2`, the same tradeoff this workspace's other git-facing
//! crates make — subprocess output is line-oriented and easy to parse
//! deterministically in tests without a real repository.
//!
//! ## What belongs here
//! * Git history collection, blame, branch enumeration
//! * Parsing of the above into plain records
//!
//! ## What does NOT belong here
//! * Analysis computation (bus factor, gitlog signals — those live in
//!   `reposcan-busfactor` / `reposcan-gitlog`)
//! * Git history mutation

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Field separator used in custom `--pretty=format:` strings; chosen to
/// avoid collision with commit message content.
const FIELD_SEP: char = '\u{1f}';
/// Record separator between commits.
const RECORD_SEP: char = '\u{1e}';

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GitCommit {
    pub hash: String,
    pub short_hash: String,
    pub timestamp: i64,
    pub author: String,
    pub subject: String,
    pub body: String,
    pub files: Vec<String>,
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn repo_root(path: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .arg("-C")
        .arg(path)
        .arg("rev-parse")
        .arg("--show-toplevel")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

/// Collect commit history with full metadata (hash, author, subject, body)
/// but without per-commit file lists; see [`collect_history_with_files`]
/// for that.
pub fn collect_history(
    repo_root: &Path,
    max_commits: Option<usize>,
    since_days: Option<i64>,
) -> Result<Vec<GitCommit>> {
    let format = format!(
        "--pretty=format:%H{FIELD_SEP}%h{FIELD_SEP}%ct{FIELD_SEP}%ae{FIELD_SEP}%s{FIELD_SEP}%b{RECORD_SEP}"
    );
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo_root).arg("log").arg(format);
    if let Some(days) = since_days {
        cmd.arg(format!("--since={days}.days"));
    }
    if let Some(limit) = max_commits {
        cmd.arg(format!("-n{limit}"));
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::null());

    let mut child = cmd.spawn().context("Failed to spawn git log")?;
    let stdout = child.stdout.take().context("Missing git log stdout")?;
    let reader = BufReader::new(stdout);
    let commits = parse_commit_metadata(reader)?;
    let status = child.wait()?;
    if !status.success() {
        bail!("git log failed");
    }
    Ok(commits)
}

/// Parse the custom-delimited `git log` output used by [`collect_history`].
/// Exposed for testing without spawning a subprocess.
pub fn parse_commit_metadata<R: BufRead>(mut reader: R) -> Result<Vec<GitCommit>> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let mut commits = Vec::new();
    for record in buf.split(RECORD_SEP) {
        let record = record.trim_matches('\n');
        if record.is_empty() {
            continue;
        }
        let mut fields = record.splitn(6, FIELD_SEP);
        let hash = fields.next().unwrap_or("").to_string();
        let short_hash = fields.next().unwrap_or("").to_string();
        let timestamp = fields.next().unwrap_or("0").parse::<i64>().unwrap_or(0);
        let author = fields.next().unwrap_or("").to_string();
        let subject = fields.next().unwrap_or("").to_string();
        let body = fields.next().unwrap_or("").trim().to_string();
        if hash.is_empty() {
            continue;
        }
        commits.push(GitCommit {
            hash,
            short_hash,
            timestamp,
            author,
            subject,
            body,
            files: Vec::new(),
        });
    }
    Ok(commits)
}

/// Changed files for a single commit (empty for a root commit).
pub fn changed_files(repo_root: &Path, commit_hash: &str) -> Result<Vec<String>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .arg("show")
        .arg("--name-only")
        .arg("--pretty=format:")
        .arg(commit_hash)
        .output()
        .context("Failed to spawn git show")?;
    if !output.status.success() {
        bail!("git show failed for {commit_hash}");
    }
    let text = String::from_utf8_lossy(&output.stdout);
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Per-line `(author, commit_time)` for `path`, approximating a blame
/// operation via `git blame --line-porcelain`.
pub fn blame_lines(repo_root: &Path, rel_path: &str) -> Result<Vec<(String, i64)>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .arg("blame")
        .arg("--line-porcelain")
        .arg("--")
        .arg(rel_path)
        .output()
        .context("Failed to spawn git blame")?;
    if !output.status.success() {
        bail!("git blame failed for {rel_path}");
    }
    let reader = BufReader::new(output.stdout.as_slice());
    parse_blame_porcelain(reader)
}

/// Parse `git blame --line-porcelain` output into `(author, commit_time)`
/// pairs, one per source line. Exposed for testing.
pub fn parse_blame_porcelain<R: BufRead>(reader: R) -> Result<Vec<(String, i64)>> {
    let mut out = Vec::new();
    let mut author: Option<String> = None;
    let mut commit_time: Option<i64> = None;
    for line in reader.lines() {
        let line = line?;
        if let Some(rest) = line.strip_prefix("author ") {
            author = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("author-time ") {
            commit_time = rest.trim().parse::<i64>().ok();
        } else if line.starts_with('\t') {
            if let (Some(a), Some(t)) = (author.clone(), commit_time) {
                out.push((a, t));
            }
        }
    }
    Ok(out)
}

/// `(branch name, tip commit timestamp)` for every local branch.
pub fn branches(repo_root: &Path) -> Result<Vec<(String, i64)>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .arg("for-each-ref")
        .arg("refs/heads")
        .arg("--format=%(refname:short)%09%(committerdate:unix)")
        .output()
        .context("Failed to spawn git for-each-ref")?;
    if !output.status.success() {
        bail!("git for-each-ref failed");
    }
    let text = String::from_utf8_lossy(&output.stdout);
    Ok(parse_branch_refs(text.lines()))
}

fn parse_branch_refs<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<(String, i64)> {
    lines
        .filter_map(|line| {
            let mut parts = line.splitn(2, '\t');
            let name = parts.next()?.to_string();
            let ts = parts.next()?.trim().parse::<i64>().ok()?;
            Some((name, ts))
        })
        .collect()
}

/// Last commit timestamp touching `rel_path`, or 0 if unknown (used by
/// timestamp enrichment).
pub fn last_commit_time(repo_root: &Path, rel_path: &str) -> i64 {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .arg("log")
        .arg("-1")
        .arg("--format=%ct")
        .arg("--")
        .arg(rel_path)
        .output();
    match output {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<i64>()
            .unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_commit_metadata_handles_multiline_body() {
        let input = format!(
            "h1{FIELD_SEP}short1{FIELD_SEP}100{FIELD_SEP}a@x.com{FIELD_SEP}subject one{FIELD_SEP}line one\nline two{RECORD_SEP}h2{FIELD_SEP}short2{FIELD_SEP}200{FIELD_SEP}b@x.com{FIELD_SEP}subject two{FIELD_SEP}{RECORD_SEP}"
        );
        let commits = parse_commit_metadata(Cursor::new(input)).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "h1");
        assert_eq!(commits[0].body, "line one\nline two");
        assert_eq!(commits[1].subject, "subject two");
        assert_eq!(commits[1].body, "");
    }

    #[test]
    fn parse_blame_porcelain_pairs_author_with_line() {
        let input = "\
hash1 1 1 1
author Alice
author-time 1000
\tfirst line
hash2 2 2 1
author Bob
author-time 2000
\tsecond line
";
        let pairs = parse_blame_porcelain(Cursor::new(input)).unwrap();
        assert_eq!(
            pairs,
            vec![("Alice".to_string(), 1000), ("Bob".to_string(), 2000)]
        );
    }

    #[test]
    fn parse_branch_refs_splits_name_and_timestamp() {
        let lines = ["main\t100", "feature/x\t200"];
        let branches = parse_branch_refs(lines.into_iter());
        assert_eq!(
            branches,
            vec![("main".to_string(), 100), ("feature/x".to_string(), 200)]
        );
    }
}
