//! The replaceable filesystem interface from §6, so collector tests can
//! mock I/O without touching a real tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Minimal stat result; platform-specific bits (mode) are collapsed to a
/// `u32` since no collector needs more than "is this executable".
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub size: u64,
    pub is_dir: bool,
    pub mtime_unix: i64,
}

/// §6 filesystem abstraction: `walkDir`, `open`, `stat`, `evalSymlinks`,
/// `readFile`. `walk_dir` here returns a flat list rather than taking a
/// visitor callback, since Rust iterators make the visitor form redundant;
/// semantics (deterministic order, exclude-pruned) match the original
/// contract.
pub trait FileSystem: Send + Sync {
    fn walk_dir(&self, root: &Path) -> Result<Vec<PathBuf>>;
    fn stat(&self, path: &Path) -> Result<FileStat>;
    fn eval_symlinks(&self, path: &Path) -> Result<PathBuf>;
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
}

/// The production filesystem, backed directly by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn walk_dir(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let excludes = reposcan_exclude::PatternSet::compile(&[])?;
        let includes = reposcan_exclude::PatternSet::compile(&[])?;
        let files = crate::walk_files(root, &excludes, &includes)?;
        Ok(files.into_iter().map(|f| root.join(f.rel_path)).collect())
    }

    fn stat(&self, path: &Path) -> Result<FileStat> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        let mtime_unix = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Ok(FileStat {
            size: meta.len(),
            is_dir: meta.is_dir(),
            mtime_unix,
        })
    }

    fn eval_symlinks(&self, path: &Path) -> Result<PathBuf> {
        path.canonicalize()
            .with_context(|| format!("failed to resolve symlinks for {}", path.display()))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn real_filesystem_stats_a_regular_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "hello").unwrap();
        let stat = RealFileSystem.stat(&path).unwrap();
        assert_eq!(stat.size, 5);
        assert!(!stat.is_dir);
    }

    #[test]
    fn real_filesystem_reads_file_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "hello").unwrap();
        assert_eq!(RealFileSystem.read_file(&path).unwrap(), b"hello");
    }

    #[test]
    fn real_filesystem_walk_dir_lists_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.rs"), "fn a() {}").unwrap();
        let files = RealFileSystem.walk_dir(tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
    }
}
