//! Cut-flow tables.

use cutflow_cuts::{AnalysisConfig, CutFlowHistogram};
use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;

/// Renders one cut-flow histogram as a boxed table with raw counts,
/// weighted sums and the efficiency relative to the previous row.
pub fn render_cut_flow(histogram: &CutFlowHistogram) -> String {
    let title = format!("{} ({})", histogram.flow(), histogram.variation());
    let label_width = histogram
        .labels()
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max("Cut".len());

    let mut rows = vec![format!(
        "{:<lw$}  {:>12}  {:>16}  {:>8}",
        "Cut",
        "Events",
        "Weighted",
        "Eff.",
        lw = label_width
    )];
    let mut previous: Option<u64> = None;
    for (label, count, weight) in histogram.rows() {
        let efficiency = match previous {
            None => "100.00%".to_string(),
            Some(0) => "-".to_string(),
            Some(p) => format!("{:.2}%", count as f64 / p as f64 * 100.0),
        };
        rows.push(format!(
            "{:<lw$}  {:>12}  {:>16}  {:>8}",
            label,
            count.to_formatted_string(&Locale::en),
            format_weight(weight),
            efficiency,
            lw = label_width
        ));
        previous = Some(count);
    }

    let width = rows
        .iter()
        .chain(std::iter::once(&title))
        .map(|r| r.chars().count())
        .max()
        .unwrap_or(0)
        + 4;

    let mut output = String::new();
    output.push_str(&format!("╔{}╗", "═".repeat(width)).bright_cyan().to_string());
    output.push('\n');
    push_row(&mut output, &title.bold().to_string(), title.chars().count(), width);
    output.push_str(&format!("╠{}╣", "═".repeat(width)).bright_cyan().to_string());
    output.push('\n');
    for row in &rows {
        push_row(&mut output, row, row.chars().count(), width);
    }
    output.push_str(&format!("╚{}╝", "═".repeat(width)).bright_cyan().to_string());
    output.push('\n');
    output
}

/// Renders every histogram of `config`, ordered by variation and cut flow.
pub fn render_all(config: &AnalysisConfig) -> String {
    config
        .histograms()
        .into_iter()
        .map(render_cut_flow)
        .collect::<Vec<_>>()
        .join("\n")
}

// `visible` is the printed width of `text`, which may carry color codes.
fn push_row(output: &mut String, text: &str, visible: usize, width: usize) {
    let pad = width.saturating_sub(visible + 2);
    output.push_str(&format!(
        "{}  {}{}{}",
        "║".bright_cyan(),
        text,
        " ".repeat(pad),
        "║".bright_cyan()
    ));
    output.push('\n');
}

pub(crate) fn format_weight(weight: f64) -> String {
    let rounded = format!("{:.2}", weight.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let whole: u64 = whole.parse().unwrap_or(0);
    let sign = if weight < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, whole.to_formatted_string(&Locale::en), fraction)
}
