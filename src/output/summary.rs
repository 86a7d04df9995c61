use std::fmt::Write;

use comfy_table::Cell;

use crate::dataset::Dataset;
use crate::insights::EngagementInsights;
use crate::notify::NotifyOutcome;
use crate::plot::SaveOutcome;

use super::styling::{failure, heading, label, source, success, value};
use super::tables::{create_table, cyan_header, mean_cell, status_cell};

/// Everything one job run produced, for the terminal summary.
pub struct RunSummary<'a> {
    pub dataset: &'a Dataset,
    pub insights: &'a EngagementInsights,
    pub save: &'a SaveOutcome,
    pub notification: Option<&'a NotifyOutcome>,
}

/// Prints a human-readable summary of an analysis run to stdout.
///
/// Displays:
/// - Overview: source URL, repository count, dataset shape, fetch time
/// - Engagement: mean forks, open issues and watchers
/// - Outputs: where the plot went and whether the notification was delivered
pub fn print_summary(summary: &RunSummary<'_>) {
    println!("{}", render_summary(summary));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", heading(emoji), heading(title).underlined());
}

fn render_summary(summary: &RunSummary<'_>) -> String {
    let mut output = String::new();
    let dataset = summary.dataset;

    add_section_header(&mut output, "📊", "Overview");

    let (rows, columns) = dataset.shape();
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        label("Source:"),
        source(dataset.source_url()),
        label("Repositories analyzed:"),
        value(rows),
        label("Dataset shape:"),
        value(format!("{rows} rows × {columns} columns")),
        label("Fetched at:"),
        label(dataset.fetched_at().format("%Y-%m-%d %H:%M UTC")),
    );

    add_section_header(&mut output, "📈", "Engagement");

    let mut means_table = create_table();
    means_table.set_header(cyan_header(&["Metric", "Column", "Mean"]));
    for (metric, mean) in summary.insights.named_values() {
        means_table.add_row(vec![
            Cell::new(metric.label()),
            Cell::new(metric.column()),
            mean_cell(mean),
        ]);
    }
    let _ = writeln!(output, "{means_table}\n");

    add_section_header(&mut output, "📦", "Outputs");

    let mut outputs_table = create_table();
    outputs_table.set_header(cyan_header(&["Step", "Result"]));
    outputs_table.add_row(vec![Cell::new("Plot"), save_cell(summary.save)]);
    outputs_table.add_row(vec![
        Cell::new("Notification"),
        notification_cell(summary.notification),
    ]);
    let _ = writeln!(output, "{outputs_table}");

    let status = if summary.save.is_saved()
        && summary.notification.is_some_and(NotifyOutcome::is_delivered)
    {
        success("Analysis complete")
    } else if summary.save.is_saved() {
        value("Analysis complete (notification not delivered)")
    } else {
        failure("Analysis complete (plot not saved)")
    };
    let _ = writeln!(output, "\n{status}");

    output
}

fn save_cell(save: &SaveOutcome) -> Cell {
    match save {
        SaveOutcome::Saved { path } => status_cell(true, format!("Saved to {}", path.display())),
        SaveOutcome::Failed { path, error } => {
            status_cell(false, format!("Not saved to {}: {error}", path.display()))
        }
    }
}

fn notification_cell(notification: Option<&NotifyOutcome>) -> Cell {
    match notification {
        Some(NotifyOutcome::Delivered { status }) => {
            status_cell(true, format!("Delivered (HTTP {status})"))
        }
        Some(NotifyOutcome::Failed { reason }) => status_cell(false, format!("Failed: {reason}")),
        None => Cell::new("Skipped (no ntfy_topic configured)"),
    }
}
