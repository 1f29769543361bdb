use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use lab_ingest::format_numeric;
use lab_model::{AuditSummary, ExclusionCounts};

use crate::types::RunResult;

pub fn print_summary(result: &RunResult) {
    print!("{}", render_summary(result));
}

/// Run summary as printed to stdout. The descriptive-statistics table is
/// included only when the run's `verbose` option is set.
pub fn render_summary(result: &RunResult) -> String {
    let audit = &result.audit;
    let mut out = format!("Source: {} ({})\n", result.data_dir.display(), audit.pipeline);
    if let Some(path) = &result.clean_table {
        out.push_str(&format!("Clean table: {}\n", path.display()));
    }
    for path in &result.artifacts {
        out.push_str(&format!("Audit artifact: {}\n", path.display()));
    }
    out.push_str(&format!("{}\n", run_table(audit)));
    out.push_str(&format!("{}\n", label_table(audit)));
    if result.options.verbose && !audit.descriptive_stats.is_empty() {
        out.push_str(&format!("\nDescriptive statistics:\n{}\n", stats_table(audit)));
    }
    out
}

/// Rows in, rows out and the rows removed by each exclusion class.
pub fn run_table(audit: &AuditSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Step"), header_cell("Rows")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Input rows"), Cell::new(audit.input_rows)]);
    for (name, count) in exclusion_rows(&audit.exclusions) {
        table.add_row(vec![Cell::new(name), count_cell(count, Color::Yellow)]);
    }
    if audit.derived_rows > 0 {
        table.add_row(vec![
            Cell::new("Derived rows"),
            Cell::new(audit.derived_rows).fg(Color::Green),
        ]);
    }
    table.add_row(vec![
        Cell::new("Output rows")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(audit.output_rows).add_attribute(Attribute::Bold),
    ]);
    table
}

/// Retained unit and median observations per case admission for each label.
pub fn label_table(audit: &AuditSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Label"),
        header_cell("Unit"),
        header_cell("Median obs/case"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for label in &audit.included_labels {
        let unit = audit.units.get(label).map_or_else(|| dim_cell("-"), Cell::new);
        let median = audit
            .median_observations
            .get(label)
            .map_or_else(|| dim_cell("-"), |value| Cell::new(format_numeric(*value)));
        table.add_row(vec![Cell::new(label), unit, median]);
    }
    for label in &audit.dropped_labels {
        table.add_row(vec![dim_cell(label), dim_cell("-"), dim_cell("dropped")]);
    }
    table
}

pub fn stats_table(audit: &AuditSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Label"),
        header_cell("Count"),
        header_cell("Mean"),
        header_cell("Std"),
        header_cell("Min"),
        header_cell("25%"),
        header_cell("50%"),
        header_cell("75%"),
        header_cell("Max"),
    ]);
    apply_table_style(&mut table);
    for index in 1..9 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for (label, stats) in &audit.descriptive_stats {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(stats.count),
            number_cell(stats.mean),
            stats.std.map_or_else(|| dim_cell("-"), number_cell),
            number_cell(stats.min),
            number_cell(stats.q25),
            number_cell(stats.median),
            number_cell(stats.q75),
            number_cell(stats.max),
        ]);
    }
    table
}

fn exclusion_rows(counts: &ExclusionCounts) -> [(&'static str, usize); 9] {
    [
        ("Unselected label", counts.unselected_label),
        ("Excluded material", counts.excluded_material),
        ("Non-arterial blood gas", counts.non_arterial_blood_gas),
        ("Disallowed unit", counts.disallowed_unit),
        ("Missing value", counts.missing_value),
        ("Non-numeric token", counts.non_numeric_token),
        ("Unparsed text", counts.unparsed_text),
        ("Negative value", counts.negative_value),
        ("Out of range", counts.out_of_range),
    ]
}

fn number_cell(value: f64) -> Cell {
    Cell::new(format!("{value:.3}"))
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
