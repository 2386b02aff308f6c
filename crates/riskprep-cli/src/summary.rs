use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use riskprep_model::{ConfigIssue, IssueSeverity};

use crate::types::RunResult;

pub fn print_run_summary(result: &RunResult) {
    println!("Data: {}", result.data.display());
    match (&result.config, result.configured) {
        (Some(path), true) => println!("Config: {}", path.display()),
        (Some(path), false) => println!("Config: {} (not found)", path.display()),
        (None, _) => println!("Config: none"),
    }
    match &result.output {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: dry run, nothing written"),
    }

    let report = &result.report;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Before"),
        header_cell("After"),
        header_cell("Changed"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Rows"),
        Cell::new(report.rows_before),
        Cell::new(report.rows_after),
        count_cell(report.rows_removed(), "removed", Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Columns"),
        Cell::new(report.columns_before),
        Cell::new(report.columns_after),
        names_cell(&report.columns_dropped, &report.columns_added),
    ]);
    table.add_row(vec![
        Cell::new("Elapsed")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(format!("{:.2?}", result.elapsed)),
    ]);
    println!("{table}");
    print_issue_table(&result.issues);
}

pub fn print_issue_table(issues: &[ConfigIssue]) {
    if issues.is_empty() {
        return;
    }
    let mut ordered: Vec<&ConfigIssue> = issues.iter().collect();
    ordered.sort_by_key(|issue| std::cmp::Reverse(severity_rank(issue.severity)));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Path"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in ordered {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(&issue.path),
            Cell::new(&issue.message),
        ]);
    }
    println!();
    println!("Configuration issues:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
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
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, label: &str, color: Color) -> Cell {
    if count > 0 {
        Cell::new(format!("{count} {label}"))
            .fg(color)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn names_cell(dropped: &[String], added: &[String]) -> Cell {
    let mut parts = Vec::new();
    if !dropped.is_empty() {
        parts.push(format!("dropped: {}", dropped.join(", ")));
    }
    if !added.is_empty() {
        parts.push(format!("added: {}", added.join(", ")));
    }
    if parts.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(parts.join("\n")).fg(Color::Yellow)
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 2,
        IssueSeverity::Warning => 1,
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
