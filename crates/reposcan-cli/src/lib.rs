//! # reposcan-cli
//!
//! Command-line entry point. Responsibilities: parse arguments, layer TOML
//! config under CLI flags, dispatch to the collector registry, render
//! output. Business logic lives in `reposcan-engine` and the collector
//! crates; this crate should stay thin.

mod cli;
mod commands;
mod config;
mod output;
mod progress;

pub use cli::Cli;

use clap::Parser;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::dispatch(&cli)
}
