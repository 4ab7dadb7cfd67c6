use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

use crate::error::DashboardError;

pub const VEHICLE_TYPE: &str = "Electric Vehicle Type";
pub const MAKE: &str = "Make";
pub const MODEL_YEAR: &str = "Model Year";
pub const ELECTRIC_RANGE: &str = "Electric Range";
pub const ELECTRIC_UTILITY: &str = "Electric Utility";

/// Cell spellings treated as a missing value.
const NA_VALUES: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

/// Flat in-memory table of vehicle records.
///
/// Rows keep file order. Every cell is kept as text; numeric interpretation
/// happens at aggregation time so that unused columns never fail a load.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based dataset row number of each row, carried through filtering.
    origin: Vec<usize>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let origin = (1..=rows.len()).collect();
        Self { headers, rows, origin }
    }

    /// Same headers, no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: Vec::new(),
            origin: Vec::new(),
        }
    }

    /// Rows for which `keep` holds, remembering where each came from.
    pub fn retain_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(&[String]) -> bool,
    {
        let mut rows = Vec::new();
        let mut origin = Vec::new();
        for (idx, row) in self.rows.iter().enumerate() {
            if keep(row) {
                rows.push(row.clone());
                origin.push(self.source_row(idx));
            }
        }
        Self {
            headers: self.headers.clone(),
            rows,
            origin,
        }
    }

    /// Dataset row number (1-based, header excluded) of the row at `idx`.
    pub fn source_row(&self, idx: usize) -> usize {
        self.origin.get(idx).copied().unwrap_or(idx + 1)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Locate a column by name, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Result<usize, DashboardError> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| DashboardError::MissingColumn(name.to_string()))
    }

    /// Iterate the cells of one column, `None` for missing values.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = Option<&str>> + '_, DashboardError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| cell(row, idx)))
    }

    /// Read CSV with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() {
            bail!("CSV input has no header row");
        }

        let mut rows = Vec::new();
        for (idx, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("Malformed CSV record at row {}", idx + 1))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Read a JSON array of objects (`orient='records'`).
    ///
    /// Headers come from the first object; later objects missing a key get a
    /// missing cell.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let headers: Vec<String> = match array.first() {
            Some(first) => first
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?
                .keys()
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::with_capacity(array.len());
        for (i, item) in array.iter().enumerate() {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Item {} in array is not an object", i))?;

            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let val_str = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => String::new(),
                    _ => bail!("Unsupported value type for field '{}' in item {}", header, i),
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Ok(Self::new(headers, rows))
    }
}

/// Load a dataset from a path, dispatching on extension. `-` reads CSV from stdin.
pub fn load_file(path: &Path) -> Result<Table> {
    if path.as_os_str() == "-" {
        return Table::from_csv_reader(std::io::stdin().lock()).context("Failed to read CSV from stdin");
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let root: Value = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
            Table::from_json(&root)?
        }
        _ => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Table::from_csv_reader(file)
                .with_context(|| format!("Failed to parse CSV in {}", path.display()))?
        }
    };

    log::info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

/// Cell at `idx`, or `None` if absent or a missing-value marker.
pub fn cell(row: &[String], idx: usize) -> Option<&str> {
    let raw = row.get(idx)?.trim();
    if is_missing(raw) {
        None
    } else {
        Some(raw)
    }
}

pub fn is_missing(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || NA_VALUES.contains(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_csv_reader() {
        let csv = "Make,Model Year,Electric Range\nTESLA,2020,322\nNISSAN,2019,\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Make", "Model Year", "Electric Range"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][2], "");
    }

    #[test]
    fn test_from_csv_reader_quoted_fields() {
        let csv = "Make,Electric Utility\nTESLA,\"CITY OF SEATTLE - (WA), CITY OF TACOMA - (WA)\"\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0][1], "CITY OF SEATTLE - (WA), CITY OF TACOMA - (WA)");
    }

    #[test]
    fn test_from_csv_reader_ragged_row_fails() {
        let csv = "a,b\n1,2\n3\n";
        assert!(Table::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_headers_only() {
        let table = Table::from_csv_reader("Make,Model Year\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let table = Table::new(vec!["Make".into()], vec![]);
        assert_eq!(table.column_index("make").unwrap(), 0);
        assert_eq!(
            table.column_index("Model Year").unwrap_err(),
            DashboardError::MissingColumn("Model Year".into())
        );
    }

    #[test]
    fn test_column_marks_missing() {
        let table = Table::new(
            vec!["Electric Range".into()],
            vec![vec!["120".into()], vec!["".into()], vec!["NaN".into()], vec![" 80 ".into()]],
        );
        let values: Vec<Option<&str>> = table.column(ELECTRIC_RANGE).unwrap().collect();
        assert_eq!(values, vec![Some("120"), None, None, Some("80")]);
    }

    #[test]
    fn test_from_json() {
        let value = json!([
            {"Make": "TESLA", "Model Year": 2020, "Electric Range": 322},
            {"Make": "NISSAN", "Model Year": 2019, "Electric Range": null}
        ]);
        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.len(), 2);
        let idx = table.column_index(ELECTRIC_RANGE).unwrap();
        assert_eq!(table.rows[0][idx], "322");
        assert_eq!(cell(&table.rows[1], idx), None);
    }

    #[test]
    fn test_from_json_empty_array() {
        let table = Table::from_json(&json!([])).unwrap();
        assert!(table.is_empty());
        assert!(table.headers.is_empty());
    }

    #[test]
    fn test_from_json_not_array() {
        assert!(Table::from_json(&json!({"Make": "TESLA"})).is_err());
    }

    #[test]
    fn test_retain_rows_keeps_source_row_numbers() {
        let table = Table::new(
            vec!["Make".into()],
            vec![vec!["B".into()], vec!["A".into()], vec!["B".into()], vec!["A".into()]],
        );
        let only_a = table.retain_rows(|row| row[0] == "A");
        assert_eq!(only_a.len(), 2);
        assert_eq!(only_a.source_row(0), 2);
        assert_eq!(only_a.source_row(1), 4);

        let again = only_a.retain_rows(|_| true);
        assert_eq!(again.source_row(1), 4);
        assert_eq!(table.source_row(2), 3);
    }

    #[test]
    fn test_load_file_missing() {
        let result = load_file(Path::new("does/not/exist.csv"));
        assert!(result.is_err());
    }
}
