//! Lightweight markdown scanning: backticked identifiers and local links
//! (§4.8 doc stale).

use std::sync::LazyLock;

use regex::Regex;

static BACKTICK_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([A-Za-z_][A-Za-z0-9_.:]{2,})`").expect("static regex is valid"));
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\(([^)\s]+)\)").expect("static regex is valid"));

/// Identifiers referenced in backticks, e.g. `` `parseConfig` ``.
#[must_use]
pub fn extract_backticked_identifiers(text: &str) -> Vec<String> {
    BACKTICK_IDENT.captures_iter(text).map(|c| c[1].to_string()).collect()
}

/// Is `target` a local file reference rather than a URL or in-page anchor?
#[must_use]
pub fn is_local_link(target: &str) -> bool {
    if target.starts_with('#') {
        return false;
    }
    !target.contains("://") && !target.starts_with("mailto:")
}

/// Every markdown link target in `text`.
#[must_use]
pub fn extract_link_targets(text: &str) -> Vec<String> {
    MARKDOWN_LINK.captures_iter(text).map(|c| c[1].to_string()).collect()
}
