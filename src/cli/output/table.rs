//! Table output formatting for CLI commands
//!
//! Renders audit rows, duplicate pairs, flagged batches and comparison
//! summaries with comfy-table. Decisions are color-coded when the terminal
//! allows it and fall back to icons otherwise.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::{AuditEntry, BatchFlag, Decision, DuplicatePair, ScenarioRecord};
use crate::services::ComparisonReport;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format pair audit rows
    pub fn format_audit(&self, entries: &[AuditEntry]) -> String {
        let mut table = self.create_base_table();

        table.set_header(header(&[
            "Step A", "Step B", "Scn A", "Scn B", "Similarity", "Relation", "Conf", "Contrast",
            "Decision",
        ]));

        for entry in entries {
            table.add_row(vec![
                Cell::new(truncate(&entry.step_a, 40)),
                Cell::new(truncate(&entry.step_b, 40)),
                number(entry.scenario_a),
                number(entry.scenario_b),
                Cell::new(format!("{:.4}", entry.similarity)).set_alignment(CellAlignment::Right),
                Cell::new(entry.relation_label.as_str()),
                Cell::new(format!("{:.2}", entry.confidence)).set_alignment(CellAlignment::Right),
                Cell::new(if entry.contrast { "yes" } else { "-" }),
                self.decision_cell(entry.decision),
            ]);
        }

        table.to_string()
    }

    /// Format duplicate pairs, looking the scenario text up in `records`
    pub fn format_duplicates(&self, pairs: &[DuplicatePair], records: &[ScenarioRecord]) -> String {
        let mut table = self.create_base_table();

        table.set_header(header(&["Kept", "Removed", "Similarity", "Kept scenario", "Removed scenario"]));

        let text = |index: usize| {
            records
                .get(index)
                .map(|r| truncate(&r.render(), 50))
                .unwrap_or_else(|| "-".to_string())
        };

        for pair in pairs {
            table.add_row(vec![
                number(pair.original_index),
                number(pair.duplicate_index),
                Cell::new(format!("{:.4}", pair.similarity)).set_alignment(CellAlignment::Right),
                Cell::new(text(pair.original_index)),
                Cell::new(text(pair.duplicate_index)),
            ]);
        }

        table.to_string()
    }

    /// Format batches that were kept unprocessed
    pub fn format_flags(&self, flags: &[BatchFlag]) -> String {
        let mut table = self.create_base_table();

        table.set_header(header(&["Batch", "Scenarios", "Reason"]));

        for flag in flags {
            let reason = if self.use_colors {
                Cell::new(truncate(&flag.reason, 60)).fg(Color::Yellow)
            } else {
                Cell::new(truncate(&flag.reason, 60))
            };
            table.add_row(vec![
                number(flag.batch),
                Cell::new(format!("{}..{}", flag.start, flag.end)),
                reason,
            ]);
        }

        table.to_string()
    }

    /// Format the per-approach summary of a comparison
    pub fn format_comparison(&self, report: &ComparisonReport) -> String {
        let mut table = self.create_base_table();

        table.set_header(header(&["Approach", "Original", "Kept", "Removed", "Removal rate"]));

        for summary in [&report.left, &report.right] {
            table.add_row(vec![
                Cell::new(&summary.name),
                number(summary.original),
                number(summary.kept),
                number(summary.removed),
                Cell::new(format!("{:.1}%", summary.removal_rate))
                    .set_alignment(CellAlignment::Right),
            ]);
        }

        table.to_string()
    }

    /// Format label/count pairs as a two-column table
    pub fn format_counts(&self, rows: &[(&str, usize)]) -> String {
        let mut table = self.create_base_table();

        table.set_header(header(&["Metric", "Count"]));
        for (label, count) in rows {
            table.add_row(vec![Cell::new(label), number(*count)]);
        }

        table.to_string()
    }

    fn decision_cell(&self, decision: Decision) -> Cell {
        if self.use_colors {
            Cell::new(decision.to_string()).fg(decision_color(decision))
        } else {
            Cell::new(format!("{} {}", decision_icon(decision), decision))
        }
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(u16::try_from(width).unwrap_or(u16::MAX));
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn number(value: usize) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn decision_color(decision: Decision) -> Color {
    match decision {
        Decision::Duplicate => Color::Red,
        Decision::Contradictory => Color::Magenta,
        Decision::Ambiguous => Color::Yellow,
        Decision::Distinct => Color::Green,
    }
}

fn decision_icon(decision: Decision) -> &'static str {
    match decision {
        Decision::Duplicate => "✗",
        Decision::Contradictory => "⊗",
        Decision::Ambiguous => "?",
        Decision::Distinct => "✓",
    }
}
