//! Argument parsing: global scan options plus one subcommand per collector
//! family, mirroring the shape of this author's other CLI tools (global
//! args + subcommand enum + a `ValueEnum` format switch).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Signal-producing static analysis over a repository.
///
/// Default mode (no subcommand) runs every registered collector.
#[derive(Parser, Debug)]
#[command(name = "reposcan", version, about, long_about = None)]
pub struct Cli {
    /// Repository to scan.
    #[arg(value_name = "REPO", default_value = ".")]
    pub repo: PathBuf,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Exclude pattern(s) using gitignore syntax. Repeatable.
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Include pattern(s); when non-empty, only matching files are scanned.
    #[arg(long = "include", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Drop signals below this confidence (0.0-1.0).
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Line-count threshold for the large-file signal.
    #[arg(long)]
    pub large_file_threshold: Option<usize>,

    /// Minimum complexity score to emit a signal.
    #[arg(long)]
    pub min_complexity_score: Option<f64>,

    /// Minimum non-blank function body length to consider.
    #[arg(long)]
    pub min_function_lines: Option<usize>,

    /// Cap on issues emitted per collector.
    #[arg(long)]
    pub max_issues: Option<usize>,

    /// Git root override, if different from `repo`.
    #[arg(long)]
    pub git_root: Option<PathBuf>,

    /// Only examine commits within this window, e.g. `90d`, `6m`, `1y`.
    #[arg(long)]
    pub git_since: Option<String>,

    /// Maximum number of commits examined by history walks.
    #[arg(long)]
    pub git_depth: Option<usize>,

    /// Don't skip demo/example/fixture paths for the patterns collector.
    #[arg(long)]
    pub include_demo_paths: bool,

    /// Bus factor at or below which an ownership signal is emitted.
    #[arg(long)]
    pub bus_factor_threshold: Option<u32>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Suppress the progress spinner.
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run every registered collector (the default).
    Scan,
    /// Cyclomatic-complexity-style scoring over functions (§4.2).
    Complexity,
    /// Near-duplicate code block detection (§4.3).
    Duplication,
    /// Import-graph cycles and fan-out (§4.4).
    Coupling,
    /// Blame-weighted ownership concentration (§4.5).
    BusFactor,
    /// Revert, churn, and stale-branch detection from git history (§4.6).
    Gitlog,
    /// Missing-test and large-file heuristics (§4.7).
    Patterns,
    /// Declared-vs-registered API route drift (§4.8).
    ApiDrift,
    /// Declared-vs-referenced config key drift (§4.8).
    ConfigDrift,
    /// Stale or broken documentation (§4.8).
    DocStale,
    /// Large binaries, merge markers, secrets, mixed line endings (§4.8).
    GitHygiene,
    /// Known-vulnerable dependency manifests (§4.8).
    Vuln,
}

impl Commands {
    /// The collector name this subcommand runs, or `None` for `Scan` (run
    /// every collector).
    #[must_use]
    pub fn collector_name(&self) -> Option<&'static str> {
        match self {
            Commands::Scan => None,
            Commands::Complexity => Some("complexity"),
            Commands::Duplication => Some("duplication"),
            Commands::Coupling => Some("coupling"),
            Commands::BusFactor => Some("bus-factor"),
            Commands::Gitlog => Some("gitlog"),
            Commands::Patterns => Some("patterns"),
            Commands::ApiDrift => Some("api-drift"),
            Commands::ConfigDrift => Some("config-drift"),
            Commands::DocStale => Some("doc-stale"),
            Commands::GitHygiene => Some("git-hygiene"),
            Commands::Vuln => Some("vuln"),
        }
    }
}
