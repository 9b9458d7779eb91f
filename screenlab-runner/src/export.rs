//! Table export: CSV (original column headers) and JSON.

use std::path::Path;

use anyhow::{Context, Result};
use screenlab_core::domain::ScreenerRow;

use crate::aggregate::ScreenerTable;

/// Column headers, in display order.
pub const HEADERS: [&str; 11] = [
    "NAME",
    "TICKER",
    "ON MKT",
    "MIN",
    "AVG",
    "MAX",
    "FORECAST MIN",
    "FORECAST VALUE",
    "FORECAST MAX",
    "Δ % FORECAST",
    "STATUS",
];

/// Format a numeric cell: 2 decimals, empty when missing.
pub fn format_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// All cells of a row as display strings, matching [`HEADERS`].
pub fn row_cells(row: &ScreenerRow) -> Vec<String> {
    let mut cells = vec![row.name.clone(), row.symbol.clone()];
    cells.extend(row.numeric_fields().into_iter().map(format_cell));
    cells.push(row.status.label().to_string());
    cells
}

// ─── CSV export ─────────────────────────────────────────────────────

pub fn export_csv(table: &ScreenerTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(HEADERS)?;
    for row in table.rows() {
        wtr.write_record(row_cells(row))?;
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(table: &ScreenerTable) -> Result<String> {
    let rows: Vec<&ScreenerRow> = table.rows().collect();
    serde_json::to_string_pretty(&rows).context("failed to serialize screener rows to JSON")
}

pub fn write_csv(table: &ScreenerTable, path: &Path) -> Result<()> {
    std::fs::write(path, export_csv(table)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_json(table: &ScreenerTable, path: &Path) -> Result<()> {
    std::fs::write(path, export_json(table)?)
        .with_context(|| format!("failed to write {}", path.display()))
}
