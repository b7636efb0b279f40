//! Revert detection (§4.6): a commit is a revert if its subject matches
//! `Revert "..."`, its subject begins with `revert:`/`revert(...):`, or its
//! body names the reverted commit via `This reverts commit <hash>.`.

use regex::Regex;
use std::sync::LazyLock;

static QUOTED_REVERT_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^Revert "(.+)"$"#).expect("static regex is valid"));
static REVERT_PREFIX_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^revert(\([^)]*\))?:").expect("static regex is valid"));
static REVERTS_COMMIT_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"This reverts commit ([0-9a-f]{7,40})\.").expect("static regex is valid"));

/// What a revert signal's title names: either the quoted original subject,
/// or a short hash recovered from the commit body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertTarget {
    OriginalSubject(String),
    ShortHash(String),
}

/// Does `subject`/`body` identify this commit as a revert, and if so what
/// does it revert?
#[must_use]
pub fn detect_revert(subject: &str, body: &str) -> Option<RevertTarget> {
    if let Some(captures) = QUOTED_REVERT_SUBJECT.captures(subject) {
        return Some(RevertTarget::OriginalSubject(captures[1].to_string()));
    }
    if REVERT_PREFIX_SUBJECT.is_match(subject) {
        if let Some(captures) = REVERTS_COMMIT_BODY.captures(body) {
            return Some(RevertTarget::ShortHash(captures[1][..7.min(captures[1].len())].to_string()));
        }
        return Some(RevertTarget::OriginalSubject(subject.to_string()));
    }
    if let Some(captures) = REVERTS_COMMIT_BODY.captures(body) {
        return Some(RevertTarget::ShortHash(captures[1][..7.min(captures[1].len())].to_string()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_revert_subject_captures_original_title() {
        let target = detect_revert(r#"Revert "feat: add Foo function""#, "");
        assert_eq!(
            target,
            Some(RevertTarget::OriginalSubject("feat: add Foo function".to_string()))
        );
    }

    #[test]
    fn revert_colon_prefix_is_detected() {
        let target = detect_revert("revert: bad migration", "");
        assert_eq!(
            target,
            Some(RevertTarget::OriginalSubject("revert: bad migration".to_string()))
        );
    }

    #[test]
    fn revert_scoped_prefix_is_detected() {
        let target = detect_revert("revert(api): broken endpoint", "");
        assert!(target.is_some());
    }

    #[test]
    fn body_reverts_commit_form_captures_short_hash() {
        let target = detect_revert(
            "Fix oops",
            "This reverts commit abcdef1234567890abcdef1234567890abcdef12.",
        );
        assert_eq!(target, Some(RevertTarget::ShortHash("abcdef1".to_string())));
    }

    #[test]
    fn non_revert_subject_is_none() {
        assert_eq!(detect_revert("feat: add Foo function", ""), None);
    }
}
