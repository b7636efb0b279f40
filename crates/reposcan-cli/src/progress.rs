//! Optional spinner wrapping the engine's plain `progress_fn` callback.
//! With the `ui` feature disabled (or `--no-progress`), this is a no-op,
//! matching the rest of the workspace's convention of no structured
//! logging crate.

#[cfg(feature = "ui")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "ui")]
use std::io::IsTerminal;

pub struct Progress {
    #[cfg(feature = "ui")]
    bar: Option<ProgressBar>,
}

impl Progress {
    #[cfg(feature = "ui")]
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled && std::io::stderr().is_terminal() {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            None
        };
        Self { bar }
    }

    #[cfg(not(feature = "ui"))]
    #[must_use]
    pub fn new(_enabled: bool) -> Self {
        Self {}
    }

    pub fn set_message(&self, message: impl Into<String>) {
        #[cfg(feature = "ui")]
        if let Some(bar) = &self.bar {
            bar.set_message(message.into());
        }
        #[cfg(not(feature = "ui"))]
        let _ = message;
    }

    pub fn finish_and_clear(&self) {
        #[cfg(feature = "ui")]
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_progress_does_not_panic() {
        let p = Progress::new(false);
        p.set_message("scanning");
        p.finish_and_clear();
    }
}
