//! Content-reading and file-classification helpers shared by every
//! collector that inspects file bytes: binary detection, the "generated
//! file" heuristic, line reading, and content hashing.

use std::fs::File;
use std::io::{BufRead, BufReader, Read as _};
use std::path::Path;

use anyhow::{Context, Result};

/// §4.1: first 8 KiB contains a NUL byte, or UTF-8 decoding of that prefix
/// fails.
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// §4.1: generated-file banner is searched for within the first N lines.
const GENERATED_BANNER_SCAN_LINES: usize = 30;

pub fn read_head(path: &Path, max_bytes: usize) -> Result<Vec<u8>> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut buf = Vec::with_capacity(max_bytes.min(1 << 20));
    file.by_ref().take(max_bytes as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn read_lines(path: &Path, max_lines: usize) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        lines.push(line);
        if lines.len() >= max_lines {
            break;
        }
    }
    Ok(lines)
}

/// Is `bytes` (a prefix of the file) binary by the §4.1 rule?
#[must_use]
pub fn is_binary_prefix(bytes: &[u8]) -> bool {
    let prefix = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    if prefix.contains(&0) {
        return true;
    }
    std::str::from_utf8(prefix).is_err()
}

/// Classify a file on disk as binary per §4.1, reading only the sniff
/// prefix.
pub fn is_binary_file(path: &Path) -> Result<bool> {
    let bytes = read_head(path, BINARY_SNIFF_BYTES)?;
    Ok(is_binary_prefix(&bytes))
}

/// Filenames matching a common "generated" naming convention.
fn generated_by_name(file_name: &str) -> bool {
    file_name.ends_with("_string.go")
        || file_name.ends_with(".pb.go")
        || file_name.ends_with(".generated.cs")
        || file_name.ends_with(".g.cs")
        || file_name.ends_with("_generated.py")
}

/// §4.1: generated-file detection by filename heuristic or a
/// "Code generated ... DO NOT EDIT" banner in the first ~30 lines.
#[must_use]
pub fn is_generated(file_name: &str, lines: &[String]) -> bool {
    if generated_by_name(file_name) {
        return true;
    }
    lines
        .iter()
        .take(GENERATED_BANNER_SCAN_LINES)
        .any(|line| line.contains("Code generated") && line.contains("DO NOT EDIT"))
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

pub fn non_blank_line_count(lines: &[String]) -> usize {
    lines.iter().filter(|l| !l.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn is_binary_prefix_detects_nul_byte() {
        assert!(is_binary_prefix(b"hello\0world"));
    }

    #[test]
    fn is_binary_prefix_accepts_plain_text() {
        assert!(!is_binary_prefix(b"fn main() {}\n"));
    }

    #[test]
    fn is_binary_prefix_rejects_invalid_utf8() {
        assert!(is_binary_prefix(&[0xff, 0xfe, 0x00, 0x01]));
    }

    #[test]
    fn is_binary_file_reads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bin.dat");
        let mut f = File::create(&path).unwrap();
        f.write_all(&[0u8, 1, 2, 3]).unwrap();
        assert!(is_binary_file(&path).unwrap());
    }

    #[test]
    fn is_generated_matches_filename_suffix() {
        assert!(is_generated("types_string.go", &[]));
        assert!(!is_generated("types.go", &[]));
    }

    #[test]
    fn is_generated_matches_banner() {
        let lines = vec![
            "// Code generated by protoc-gen-go. DO NOT EDIT.".to_string(),
            "package foo".to_string(),
        ];
        assert!(is_generated("foo.go", &lines));
    }

    #[test]
    fn is_generated_ignores_banner_outside_scan_window() {
        let mut lines: Vec<String> = (0..40).map(|i| format!("line {i}")).collect();
        lines.push("// Code generated by x. DO NOT EDIT.".to_string());
        assert!(!is_generated("foo.go", &lines));
    }

    #[test]
    fn non_blank_line_count_skips_whitespace_only_lines() {
        let lines = vec!["a".to_string(), "  ".to_string(), "".to_string(), "b".to_string()];
        assert_eq!(non_blank_line_count(&lines), 2);
    }

    #[test]
    fn hash_bytes_is_deterministic() {
        assert_eq!(hash_bytes(b"abc"), hash_bytes(b"abc"));
        assert_ne!(hash_bytes(b"abc"), hash_bytes(b"abd"));
    }
}
