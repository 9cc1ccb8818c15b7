//! Turn report rows into tables.

use serde_json::Value;

use super::aggregate::{group_totals, number_value, NanPolicy};
use super::definition::GroupSpec;
use crate::metadata::Row;

/// Rows of cells; row 0 is the header.
pub type ReportTable = Vec<Vec<Value>>;

/// Render one flat table, or one table per group when groups are given.
pub fn render(rows: &[Row], groups: Option<&[GroupSpec]>, policy: NanPolicy) -> Vec<ReportTable> {
    match groups {
        Some(groups) => groups
            .iter()
            .map(|group| render_group(rows, group, policy))
            .collect(),
        None => vec![render_flat(rows)],
    }
}

/// Header is the first row's field names; every body row follows that order.
///
/// Fields missing from a later row render as `null`; fields the first row
/// lacks are not shown.
pub fn render_flat(rows: &[Row]) -> ReportTable {
    let header: Vec<String> = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    let mut table = Vec::with_capacity(rows.len() + 1);
    table.push(header.iter().cloned().map(Value::String).collect());
    for row in rows {
        table.push(
            header
                .iter()
                .map(|field| row.get(field).cloned().unwrap_or(Value::Null))
                .collect(),
        );
    }
    table
}

/// `[groupByField, aggregate...]` header, then one row per group value.
///
/// A total that is missing or NaN renders as `0`.
pub fn render_group(rows: &[Row], group: &GroupSpec, policy: NanPolicy) -> ReportTable {
    let totals = group_totals(rows, group, policy);

    let mut header = Vec::with_capacity(group.aggregate_fields.len() + 1);
    header.push(Value::String(group.group_by_field.clone()));
    header.extend(group.aggregate_fields.iter().cloned().map(Value::String));

    let mut table = Vec::with_capacity(totals.keys.len() + 1);
    table.push(header);
    for key in &totals.keys {
        let mut line = Vec::with_capacity(group.aggregate_fields.len() + 1);
        line.push(Value::String(key.clone()));
        for index in 0..group.aggregate_fields.len() {
            line.push(
                match totals.total(index, key) {
                    Some(total) if !total.is_nan() => number_value(total),
                    _ => Value::from(0),
                },
            );
        }
        table.push(line);
    }
    table
}

/// Plain-text rendering with space-padded columns.
pub fn format_table(table: &ReportTable) -> String {
    let cells: Vec<Vec<String>> = table
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for (line, row) in cells.iter().enumerate() {
        let text: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        out.push_str(text.join("  ").trim_end());
        out.push('\n');

        if line == 0 {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            out.push_str(&rule.join("  "));
            out.push('\n');
        }
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
