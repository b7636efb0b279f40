//! Dispatch: run the requested collector(s) and render the result.

use std::sync::Arc;

use reposcan_engine::{default_registry, flatten_signals, run_one, run_scan};
use reposcan_model::ScanContext;

use crate::cli::{Cli, Commands};
use crate::config::{load_user_config, resolve_opts};
use crate::output::render;
use crate::progress::Progress;

pub fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let repo_root = cli.repo.canonicalize().unwrap_or_else(|_| cli.repo.clone());
    let user_config = load_user_config(&repo_root)?;

    let progress = Arc::new(Progress::new(!cli.global.no_progress));
    let progress_for_callback = Arc::clone(&progress);
    let progress_fn: Arc<dyn Fn(&str) + Send + Sync> = Arc::new(move |msg: &str| {
        progress_for_callback.set_message(msg.to_string());
    });

    let opts = resolve_opts(&cli.global, user_config.as_ref(), Some(progress_fn))?;
    let registry = default_registry();
    let ctx = ScanContext::new();

    let command = cli.command.clone().unwrap_or(Commands::Scan);
    let signals = match command.collector_name() {
        None => {
            let outcomes = run_scan(&registry, &ctx, &repo_root, &opts)?;
            for outcome in &outcomes {
                if let Err(err) = &outcome.result {
                    eprintln!("warning: collector {:?} failed: {err:#}", outcome.name);
                }
            }
            flatten_signals(&outcomes)
        }
        Some(name) => {
            let outcome = run_one(&registry, name, &ctx, &repo_root, &opts)?;
            outcome.result?
        }
    };

    progress.finish_and_clear();

    // max_issues is enforced per collector (post-sort, inside collect()),
    // not re-applied here across the combined output.
    print!("{}", render(&signals, cli.global.format));
    Ok(())
}
