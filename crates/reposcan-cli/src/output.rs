//! Rendering layer: `serde_json` for `--format json`, a simple aligned-
//! column renderer for `--format text`, kept separate from the analysis
//! crates per this codebase's usual split between collection and display.

use reposcan_model::RawSignal;

use crate::cli::OutputFormat;

/// Render a flat signal list per the requested format.
#[must_use]
pub fn render(signals: &[RawSignal], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => render_json(signals),
        OutputFormat::Text => render_text(signals),
    }
}

fn render_json(signals: &[RawSignal]) -> String {
    serde_json::to_string_pretty(signals).unwrap_or_else(|_| "[]".to_string())
}

fn render_text(signals: &[RawSignal]) -> String {
    if signals.is_empty() {
        return "No signals found.\n".to_string();
    }

    let source_width = signals.iter().map(|s| s.source.len()).max().unwrap_or(0);
    let kind_width = signals.iter().map(|s| s.kind.len()).max().unwrap_or(0);

    let mut out = String::new();
    for signal in signals {
        let location = if signal.line > 0 {
            format!("{}:{}", signal.file_path, signal.line)
        } else {
            signal.file_path.clone()
        };
        out.push_str(&format!(
            "[{:<source_width$}] {:<kind_width$} {:>4.0}%  {location}  {}\n",
            signal.source,
            signal.kind,
            signal.confidence * 100.0,
            signal.title,
        ));
    }
    out.push_str(&format!("\n{} signal(s).\n", signals.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<RawSignal> {
        vec![RawSignal::new(
            "complexity",
            "complex-function",
            "src/a.rs",
            12,
            "Complex function `do_thing`",
            "",
            0.72,
        )]
    }

    #[test]
    fn json_output_round_trips_signal_fields() {
        let rendered = render(&sample(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value[0]["kind"], "complex-function");
    }

    #[test]
    fn text_output_includes_title_and_location() {
        let rendered = render(&sample(), OutputFormat::Text);
        assert!(rendered.contains("src/a.rs:12"));
        assert!(rendered.contains("Complex function `do_thing`"));
        assert!(rendered.contains("1 signal(s)."));
    }

    #[test]
    fn empty_signals_render_a_friendly_message() {
        assert_eq!(render(&[], OutputFormat::Text), "No signals found.\n");
    }
}
