//! Signal data model, collector interface, and process-wide registry.
//!
//! This is the core of the engine: every other crate in the workspace either
//! produces [`RawSignal`]s or consumes them. Nothing here depends on the
//! filesystem or a git binary; those live in `reposcan-walk` and
//! `reposcan-git`.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A structured finding emitted by a collector.
///
/// See the module docs for the invariants every collector must uphold when
/// constructing one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    /// Short collector identifier, e.g. `"complexity"`.
    pub source: String,
    /// Finding sub-type tag, e.g. `"complex-function"`.
    pub kind: String,
    /// Repo-relative path; directory or module key for scoped signals.
    pub file_path: String,
    /// 1-based line number, or 0 when not applicable.
    pub line: u32,
    /// Single-line human-readable summary.
    pub title: String,
    /// Multi-line human-readable detail, may contain embedded lists.
    pub description: String,
    /// Value in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Unordered set of lowercase slugs; always includes `kind`.
    pub tags: BTreeSet<String>,
    /// Present for gitlog reverts and similar author-attributed signals.
    pub author: Option<String>,
    /// Unix timestamp of the signal's last relevant event; 0 means unknown.
    pub timestamp: i64,
}

impl RawSignal {
    /// Construct a signal, auto-inserting `kind` into `tags`.
    ///
    /// Panics in debug builds if any of the non-empty-string invariants
    /// (§3 invariant 1) are violated; collectors are expected to validate
    /// their own inputs before reaching this point, so this is a
    /// `debug_assert` rather than a runtime `Result`.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        kind: impl Into<String>,
        file_path: impl Into<String>,
        line: u32,
        title: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let source = source.into();
        let kind = kind.into();
        let file_path = file_path.into();
        let title = title.into();
        debug_assert!(!source.is_empty(), "signal source must be non-empty");
        debug_assert!(!kind.is_empty(), "signal kind must be non-empty");
        debug_assert!(!file_path.is_empty(), "signal file_path must be non-empty");
        debug_assert!(!title.is_empty(), "signal title must be non-empty");
        debug_assert!(
            (0.0..=1.0).contains(&confidence),
            "signal confidence must be in [0, 1], got {confidence}"
        );
        let mut tags = BTreeSet::new();
        tags.insert(kind.clone());
        Self {
            source,
            kind,
            file_path,
            line,
            title,
            description: description.into(),
            confidence,
            tags,
            author: None,
            timestamp: 0,
        }
    }

    /// Builder-style tag addition.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Builder-style author attribution.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Builder-style timestamp attachment.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Default bus-factor threshold (signals emitted for bus factor <= this).
///
/// Open question resolution (see `DESIGN.md`): the source description hints
/// at configurability but the only observed behavior is a hard-coded `1`.
/// We expose it as a documented constant plus an overridable opts field, so
/// the engine's own default path never deviates from it.
pub const DEFAULT_BUS_FACTOR_THRESHOLD: u32 = 1;

/// Default large-file line threshold.
pub const DEFAULT_LARGE_FILE_THRESHOLD: usize = 1000;
/// Default minimum complexity score to emit a signal.
pub const DEFAULT_MIN_COMPLEXITY_SCORE: f64 = 6.0;
/// Default minimum function body length (non-blank lines) to consider.
pub const DEFAULT_MIN_FUNCTION_LINES: usize = 5;
/// Default per-collector issue cap (duplication and others).
pub const DEFAULT_MAX_ISSUES: usize = 200;
/// Default maximum commits examined by history walks.
pub const DEFAULT_GIT_DEPTH: usize = 1000;

/// Relative time bound for git history walks, parsed from strings like
/// `"90d"`, `"2w"`, `"6m"`, `"1y"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitSince {
    pub days: i64,
}

/// Error parsing a [`GitSince`] duration spec.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid duration spec {0:?}: expected a number followed by d/w/m/y")]
pub struct GitSinceParseError(pub String);

impl GitSince {
    /// Parse a duration string of the form `<number><unit>` where unit is
    /// one of `d` (days), `w` (weeks), `m` (months, 30 days), `y` (years,
    /// 365 days).
    pub fn parse(spec: &str) -> Result<Self, GitSinceParseError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(GitSinceParseError(spec.to_string()));
        }
        let unit = spec.chars().last().expect("checked non-empty above");
        let (number_part, multiplier) = match unit {
            'd' => (&spec[..spec.len() - 1], 1),
            'w' => (&spec[..spec.len() - 1], 7),
            'm' => (&spec[..spec.len() - 1], 30),
            'y' => (&spec[..spec.len() - 1], 365),
            _ => return Err(GitSinceParseError(spec.to_string())),
        };
        let count: i64 = number_part
            .parse()
            .map_err(|_| GitSinceParseError(spec.to_string()))?;
        Ok(GitSince {
            days: count * multiplier,
        })
    }
}

/// Human-readable progress sink, invoked by collectors at documented
/// checkpoints (every 100 commits for the gitlog collector, etc.).
pub type ProgressFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration passed into every `collect` call.
#[derive(Clone, Default)]
pub struct CollectorOpts {
    pub exclude_patterns: Vec<String>,
    pub include_patterns: Vec<String>,
    pub min_confidence: f64,
    pub large_file_threshold: usize,
    pub min_complexity_score: f64,
    pub min_function_lines: usize,
    pub max_issues: usize,
    pub git_root: Option<PathBuf>,
    pub git_since: Option<GitSince>,
    pub git_depth: usize,
    pub progress_fn: Option<ProgressFn>,
    pub include_demo_paths: bool,
    pub bus_factor_threshold: u32,
}

impl CollectorOpts {
    /// Report progress if a sink is configured; a no-op otherwise.
    pub fn report(&self, message: &str) {
        if let Some(sink) = &self.progress_fn {
            sink(message);
        }
    }
}

/// Builder mirroring [`CollectorOpts`]'s documented defaults.
impl CollectorOpts {
    #[must_use]
    pub fn with_defaults() -> Self {
        CollectorOpts {
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            min_confidence: 0.0,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            min_complexity_score: DEFAULT_MIN_COMPLEXITY_SCORE,
            min_function_lines: DEFAULT_MIN_FUNCTION_LINES,
            max_issues: DEFAULT_MAX_ISSUES,
            git_root: None,
            git_since: None,
            git_depth: DEFAULT_GIT_DEPTH,
            progress_fn: None,
            include_demo_paths: false,
            bus_factor_threshold: DEFAULT_BUS_FACTOR_THRESHOLD,
        }
    }
}

/// Errors surfaced out of `Collector::collect`.
#[derive(Debug, Error)]
pub enum CollectError {
    /// §7 item 1: e.g. bus factor / gitlog invoked on a non-git directory.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// §7 item 2: the scan context was cancelled.
    #[error("scan cancelled")]
    Cancelled,
    /// Any I/O failure that isn't a per-file read failure (those are
    /// swallowed and counted in metrics instead, per §7 item 3).
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Any other hard failure (pattern compilation, subprocess spawn, …)
    /// that should abort the collector rather than degrade gracefully.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Cooperative cancellation token threaded through a single scan.
///
/// Checked at the suspension points documented in §5: before each
/// directory's child enumeration, before each file's processing, between
/// phases, and between commits when walking history.
#[derive(Clone, Default)]
pub struct ScanContext {
    cancelled: Arc<AtomicBool>,
}

impl ScanContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Poll point: returns `Err(CollectError::Cancelled)` if cancelled.
    pub fn check(&self) -> Result<(), CollectError> {
        if self.is_cancelled() {
            Err(CollectError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// The polymorphic capability every collector implements.
///
/// Collectors are singleton-ish: constructed once at registration and
/// reused across `collect` calls. Implementations that want to expose
/// `metrics()` should hold their last scan's metrics behind a
/// `std::sync::Mutex<Option<serde_json::Value>>` or similar interior
/// mutability, since this trait takes `&self`.
pub trait Collector: Send + Sync {
    /// Collector's declared name, e.g. `"complexity"`. Must match the
    /// `source` field of every signal it emits.
    fn name(&self) -> &str;

    /// Run the collector over `repo_path`, honoring `opts`.
    fn collect(
        &self,
        ctx: &ScanContext,
        repo_path: &std::path::Path,
        opts: &CollectorOpts,
    ) -> Result<Vec<RawSignal>, CollectError>;

    /// Structured metrics from the most recent `collect` call, if any.
    fn metrics(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Process-wide mapping from collector name to instance.
///
/// Built once at startup (by `reposcan-engine`) and treated as immutable
/// thereafter; iteration order is registration order, which the rest of
/// the engine relies on for "collector-registration-order" signal
/// presentation (§5).
#[derive(Default)]
pub struct Registry {
    collectors: Vec<Arc<dyn Collector>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a collector to the registry at startup.
    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        self.collectors.push(collector);
    }

    /// Look up a collector by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Collector>> {
        self.collectors.iter().find(|c| c.name() == name).cloned()
    }

    /// Iterate collectors in registration order.
    pub fn each(&self) -> impl Iterator<Item = &Arc<dyn Collector>> {
        self.collectors.iter()
    }

    /// Reset hook for tests: drop every registered collector.
    pub fn reset(&mut self) {
        self.collectors.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}
