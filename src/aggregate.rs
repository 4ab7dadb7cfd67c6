// Grouping and counting over the vehicle table

use anyhow::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::data::{cell, Table};
use crate::error::DashboardError;

pub const TOP_N_MIN: usize = 2;
pub const TOP_N_MAX: usize = 10;
pub const TOP_N_DEFAULT: usize = 5;

/// Name given to the value column of count aggregates.
pub const COUNT: &str = "Count";

/// Ordered (key, metric) pairs produced by an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub key_columns: Vec<String>,
    pub value_column: String,
    pub rows: Vec<AggregateRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<String>,
    pub value: f64,
    /// Rows that contributed to `value`.
    pub count: usize,
}

impl Aggregate {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Distinct values of one key column, in row order.
    pub fn key_values(&self, position: usize) -> Vec<String> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if let Some(k) = row.key.get(position) {
                if !seen.contains(k) {
                    seen.push(k.clone());
                }
            }
        }
        seen
    }
}

impl AggregateRow {
    /// Key cells joined for display.
    pub fn label(&self) -> String {
        self.key.join(", ")
    }
}

/// Top-N count, bounded to `TOP_N_MIN..=TOP_N_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopN(usize);

impl TopN {
    pub fn new(n: usize) -> Result<Self, DashboardError> {
        if (TOP_N_MIN..=TOP_N_MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(DashboardError::TopNOutOfRange {
                got: n,
                min: TOP_N_MIN,
                max: TOP_N_MAX,
            })
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for TopN {
    fn default() -> Self {
        Self(TOP_N_DEFAULT)
    }
}

fn column_indices(table: &Table, columns: &[&str]) -> Result<Vec<usize>, DashboardError> {
    columns.iter().map(|c| table.column_index(c)).collect()
}

/// Key cells of a row in canonical form, or `None` if any of them is missing.
fn row_key(row: &[String], indices: &[usize]) -> Option<Vec<String>> {
    indices
        .iter()
        .map(|&idx| cell(row, idx).map(canonical_cell))
        .collect()
}

/// One spelling per value: numeric cells are rewritten in shortest decimal
/// form (`2020.0` and `2e3` become `2020` and `2000`), text is trimmed.
pub fn canonical_cell(raw: &str) -> String {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(x) if x == 0.0 => "0".to_string(),
        Ok(x) => x.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Count rows per key, in order of first appearance.
///
/// Rows with a missing key cell are not counted.
pub fn count_by(table: &Table, keys: &[&str]) -> Result<Aggregate> {
    let indices = column_indices(table, keys)?;

    let mut positions: HashMap<Vec<String>, usize> = HashMap::new();
    let mut rows: Vec<AggregateRow> = Vec::new();

    for row in &table.rows {
        let Some(key) = row_key(row, &indices) else {
            continue;
        };
        match positions.get(&key).copied() {
            Some(pos) => rows[pos].count += 1,
            None => {
                positions.insert(key.clone(), rows.len());
                rows.push(AggregateRow { key, value: 0.0, count: 1 });
            }
        }
    }

    for row in &mut rows {
        row.value = row.count as f64;
    }

    Ok(Aggregate {
        key_columns: keys.iter().map(|k| k.to_string()).collect(),
        value_column: COUNT.to_string(),
        rows,
    })
}

/// Count rows per value of one column, most frequent first.
///
/// Equal counts keep order of first appearance.
pub fn value_counts(table: &Table, column: &str) -> Result<Aggregate> {
    let mut counts = count_by(table, &[column])?;
    counts.rows.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(counts)
}

/// The `n` most frequent values of `column`.
pub fn top_n(table: &Table, column: &str, n: TopN) -> Result<Vec<String>> {
    let counts = value_counts(table, column)?;
    Ok(counts
        .rows
        .into_iter()
        .take(n.get())
        .filter_map(|row| row.key.into_iter().next())
        .collect())
}

/// Mean of `value_column` per key, sorted by key.
///
/// Missing values are left out of both sum and denominator; a group with no
/// remaining values is dropped.
pub fn mean_by(table: &Table, keys: &[&str], value_column: &str) -> Result<Aggregate> {
    let indices = column_indices(table, keys)?;
    let value_idx = table.column_index(value_column)?;

    let mut sums: HashMap<Vec<String>, (f64, usize)> = HashMap::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let Some(key) = row_key(row, &indices) else {
            continue;
        };
        let Some(raw) = cell(row, value_idx) else {
            continue;
        };
        let value = raw.parse::<f64>().map_err(|_| DashboardError::NotNumeric {
            value: raw.to_string(),
            column: value_column.to_string(),
            row: table.source_row(row_idx),
        })?;

        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut rows: Vec<AggregateRow> = sums
        .into_iter()
        .map(|(key, (sum, count))| AggregateRow {
            key,
            value: sum / count as f64,
            count,
        })
        .collect();
    rows.sort_by(|a, b| compare_keys(&a.key, &b.key));

    log::debug!("mean of '{}' over {:?}: {} groups", value_column, keys, rows.len());

    Ok(Aggregate {
        key_columns: keys.iter().map(|k| k.to_string()).collect(),
        value_column: value_column.to_string(),
        rows,
    })
}

/// Keep rows whose `column` matches `value`.
pub fn filter_eq(table: &Table, column: &str, value: &str) -> Result<Table> {
    let idx = table.column_index(column)?;
    Ok(table.retain_rows(|row| cell(row, idx).is_some_and(|c| cell_matches(c, value))))
}

/// Keep rows whose `column` matches any of `values`.
pub fn filter_in(table: &Table, column: &str, values: &[String]) -> Result<Table> {
    let idx = table.column_index(column)?;
    Ok(table.retain_rows(|row| {
        cell(row, idx).is_some_and(|c| values.iter().any(|v| cell_matches(c, v)))
    }))
}

/// Keep rows where every listed column has a value.
pub fn drop_missing(table: &Table, columns: &[&str]) -> Result<Table> {
    let indices = column_indices(table, columns)?;
    Ok(table.retain_rows(|row| indices.iter().all(|&idx| cell(row, idx).is_some())))
}

/// Sorted distinct non-missing values of a column, in canonical form.
pub fn distinct_sorted(table: &Table, column: &str) -> Result<Vec<String>> {
    let mut values: Vec<String> = table.column(column)?.flatten().map(canonical_cell).collect();
    values.sort_by(|a, b| compare_cells(a, b));
    values.dedup();
    Ok(values)
}

/// Selection values are opaque: match on text, or on number when both sides parse.
pub fn cell_matches(cell: &str, value: &str) -> bool {
    let (cell, value) = (cell.trim(), value.trim());
    if cell == value {
        return true;
    }
    match (cell.parse::<f64>(), value.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Numbers sort numerically and before text; text sorts lexically.
///
/// Only identical text compares `Equal`; numeric ties fall back to the text.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// NaN spellings sort as text.
fn as_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|x| !x.is_nan())
}

fn compare_keys(a: &[String], b: &[String]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| compare_cells(x, y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}
