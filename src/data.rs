use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Category label used when a cell is null or absent from its row
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// A single raw cell as it came out of the CSV parser
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// True for cells that carry nothing once whitespace is trimmed
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str(UNKNOWN_CATEGORY),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// One data row keyed by column name. A header missing from the map was
/// absent from the source record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: HashMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Category label of a cell: `Unknown` for null or missing cells,
    /// otherwise the cell's display text (an empty string stays empty).
    pub fn category(&self, column: &str) -> String {
        match self.get(column) {
            None | Some(CellValue::Null) => UNKNOWN_CATEGORY.to_string(),
            Some(value) => value.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A loaded table: headers in CSV order plus the non-blank rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
