//! Report generation.
//!
//! This module renders an aggregation [`Report`] as an aligned text
//! table, a Markdown document or JSON.

use crate::cli::OutputFormat;
use crate::models::{format_number, Dataset, Report, SummaryRow};
use anyhow::Result;

/// Shown in place of the table when nothing qualified.
pub const EMPTY_RESULT_MESSAGE: &str =
    "No dead children found for the given age (or no suitable data).";

/// Render a report in the requested format.
pub fn generate_report(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(generate_text_report(report)),
        OutputFormat::Markdown => Ok(generate_markdown_report(report)),
        OutputFormat::Json => generate_json_report(report),
    }
}

/// The closing line that totals all groups.
pub fn total_line(max_age: i64, total: usize) -> String {
    format!("Total dead children (Age ≤ {}): {}", max_age, total)
}

fn summary_cells(row: &SummaryRow) -> Vec<String> {
    vec![
        row.embarked.clone(),
        row.embarked_name.clone(),
        row.dead_children_count.to_string(),
        format_number(row.max_age_in_group),
    ]
}

fn dataset_cells(dataset: &Dataset) -> Vec<Vec<String>> {
    dataset
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect()
}

/// Render a plain-text grid with columns padded to their widest cell.
pub fn render_text_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut grid = String::new();
    grid.push_str(&grid_line(&widths, headers));
    grid.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    grid.push_str(&rule.join("  "));
    grid.push('\n');

    for row in rows {
        grid.push_str(&grid_line(&widths, row));
        grid.push('\n');
    }

    grid
}

fn grid_line(widths: &[usize], cells: &[String]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            format!("{:<width$}", cell, width = width)
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Render a Markdown table.
pub fn render_markdown_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut table = String::new();
    table.push_str(&format!(
        "| {} |\n",
        headers.iter().map(|h| escape_cell(h)).collect::<Vec<_>>().join(" | ")
    ));
    table.push_str(&format!(
        "|{}|\n",
        headers.iter().map(|_| ":---").collect::<Vec<_>>().join("|")
    ));

    for row in rows {
        table.push_str(&format!(
            "| {} |\n",
            row.iter().map(|c| escape_cell(c)).collect::<Vec<_>>().join(" | ")
        ));
    }

    table
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// Generate the plain-text report printed to a terminal.
pub fn generate_text_report(report: &Report) -> String {
    let mut output = String::new();

    if let Some(ref preview) = report.raw_preview {
        output.push_str(&format!("Raw data (first {} rows)\n\n", preview.len()));
        output.push_str(&render_text_grid(&preview.columns, &dataset_cells(preview)));
        output.push('\n');
    }

    output.push_str(&format!(
        "Dead children by port of embarkation (Age ≤ {})\n\n",
        report.metadata.max_age
    ));

    if report.rows.is_empty() {
        output.push_str(EMPTY_RESULT_MESSAGE);
        output.push('\n');
        return output;
    }

    let rows: Vec<Vec<String>> = report.rows.iter().map(summary_cells).collect();
    output.push_str(&render_text_grid(&report.columns, &rows));
    output.push('\n');
    output.push_str(&total_line(
        report.metadata.max_age,
        report.metadata.total_dead_children,
    ));
    output.push('\n');

    output
}

/// Generate a Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Dead Children by Port of Embarkation\n\n");

    // Metadata
    let metadata = &report.metadata;
    output.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    output.push_str(&format!("- **Maximum Age:** {}\n", metadata.max_age));
    output.push_str(&format!("- **Rows Read:** {}\n", metadata.rows_read));
    output.push_str(&format!(
        "- **Generated:** {}\n\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(ref preview) = report.raw_preview {
        output.push_str("## Raw Data (head)\n\n");
        output.push_str(&render_markdown_table(
            &preview.columns,
            &dataset_cells(preview),
        ));
        output.push('\n');
    }

    output.push_str("## Result\n\n");

    if report.rows.is_empty() {
        output.push_str(&format!("> {}\n", EMPTY_RESULT_MESSAGE));
        return output;
    }

    let rows: Vec<Vec<String>> = report.rows.iter().map(summary_cells).collect();
    output.push_str(&render_markdown_table(&report.columns, &rows));
    output.push('\n');
    output.push_str(&format!(
        "**{}**\n",
        total_line(metadata.max_age, metadata.total_dead_children)
    ));

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
