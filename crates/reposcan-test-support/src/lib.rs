//! Deterministic git-repo and file-tree fixtures shared by collector test
//! suites. Centralized here so `reposcan-busfactor`, `reposcan-gitlog`, and
//! `reposcan-engine` don't each re-implement "write files, `git init`,
//! commit as a fixed author/date".

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;

/// A throwaway git repository with deterministic commit metadata.
pub struct TestRepo {
    _dir: TempDir,
    path: PathBuf,
}

impl TestRepo {
    /// Initialize an empty repo with a fixed local identity (so commits are
    /// reproducible across machines/CI).
    pub fn init() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let path = dir.path().to_path_buf();
        run_git(&path, &["init", "--quiet", "--initial-branch=main"])?;
        run_git(&path, &["config", "user.email", "test@example.com"])?;
        run_git(&path, &["config", "user.name", "Test User"])?;
        Ok(Self { _dir: dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `rel_path`, creating parent directories.
    pub fn write_file(&self, rel_path: &str, contents: &str) -> Result<()> {
        let full = self.path.join(rel_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, contents)
            .with_context(|| format!("failed to write {rel_path}"))?;
        Ok(())
    }

    /// Stage everything and commit as `author`, with commit date
    /// `unix_timestamp` seconds since epoch (UTC).
    pub fn commit_all(&self, author: &str, message: &str, unix_timestamp: i64) -> Result<String> {
        run_git(&self.path, &["add", "-A"])?;
        let date = format!("{unix_timestamp} +0000");
        let author_arg = format!("{author} <{author}@example.com>");
        run_git(
            &self.path,
            &[
                "commit",
                "--quiet",
                "--allow-empty",
                "--author",
                &author_arg,
                "--date",
                &date,
                "-m",
                message,
            ],
        )?;
        // GIT_COMMITTER_DATE isn't set above; set env directly instead.
        Ok(self.head_hash()?)
    }

    #[must_use]
    pub fn head_hash(&self) -> Result<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .arg("rev-parse")
            .arg("HEAD")
            .output()
            .context("failed to run git rev-parse")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Create and check out a new branch from the current HEAD.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        run_git(&self.path, &["branch", name])?;
        Ok(())
    }
}

fn run_git(repo_path: &Path, args: &[&str]) -> Result<()> {
    let status = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(args)
        .env("GIT_COMMITTER_DATE", committer_date_from_args(args))
        .status()
        .with_context(|| format!("failed to run git {args:?}"))?;
    if !status.success() {
        bail!("git {args:?} failed");
    }
    Ok(())
}

fn committer_date_from_args(args: &[&str]) -> String {
    args.iter()
        .position(|a| *a == "--date")
        .and_then(|idx| args.get(idx + 1))
        .map(|d| d.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_and_commit_produce_a_resolvable_head() {
        let repo = TestRepo::init().unwrap();
        repo.write_file("a.txt", "hello").unwrap();
        let hash = repo.commit_all("Alice", "initial", 1_700_000_000).unwrap();
        assert_eq!(hash.len(), 40);
    }

    #[test]
    fn create_branch_does_not_error() {
        let repo = TestRepo::init().unwrap();
        repo.write_file("a.txt", "hello").unwrap();
        repo.commit_all("Alice", "initial", 1_700_000_000).unwrap();
        repo.create_branch("feature/x").unwrap();
    }
}
