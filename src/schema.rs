use crate::data::{CellValue, Row};
use serde::Serialize;
use tracing::{debug, warn};

/// Inferred schema for one loaded dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnCatalog {
    /// Every header, in CSV order
    pub columns: Vec<String>,
    /// Headers with at least one finite numeric value, in CSV order
    pub numeric: Vec<String>,
}

impl ColumnCatalog {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric.iter().any(|c| c == column)
    }

    /// First numeric column in catalog order
    pub fn primary_metric(&self) -> Option<&str> {
        self.numeric.first().map(String::as_str)
    }

    /// Second numeric column in catalog order
    pub fn secondary_metric(&self) -> Option<&str> {
        self.numeric.get(1).map(String::as_str)
    }
}

/// Best-effort numeric reading of a cell. Never fails: anything that is not
/// a finite decimal number yields `None`.
pub fn coerce_number(value: &CellValue) -> Option<f64> {
    let n = match value {
        CellValue::Null => return None,
        CellValue::Number(n) => *n,
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
    };
    n.is_finite().then_some(n)
}

/// Coerce `row[column]`, treating a missing cell like any other non-number
pub fn coerce_cell(row: &Row, column: &str) -> Option<f64> {
    row.get(column).and_then(coerce_number)
}

/// Classify headers into the numeric subset. Blank rows are ignored, and a
/// dataset with no remaining rows yields an empty catalog.
pub fn infer_catalog(rows: &[Row], headers: &[String]) -> ColumnCatalog {
    let rows: Vec<&Row> = rows.iter().filter(|row| !row.is_blank()).collect();
    if rows.is_empty() {
        debug!(columns = headers.len(), "no data rows, empty catalog");
        return ColumnCatalog::default();
    }

    let numeric: Vec<String> = headers
        .iter()
        .filter(|header| rows.iter().any(|row| coerce_cell(row, header).is_some()))
        .cloned()
        .collect();

    debug!(
        columns = headers.len(),
        numeric = numeric.len(),
        "inferred column catalog"
    );

    ColumnCatalog {
        columns: headers.to_vec(),
        numeric,
    }
}

/// Pick the x-axis column: the requested one when it is a header,
/// otherwise the first header. `None` only when there are no headers.
pub fn resolve_x_column(headers: &[String], requested: Option<&str>) -> Option<String> {
    match requested {
        Some(name) if headers.iter().any(|h| h == name) => Some(name.to_string()),
        Some(name) => {
            let fallback = headers.first().cloned();
            warn!(requested = name, fallback = ?fallback, "x column not in headers");
            fallback
        }
        None => headers.first().cloned(),
    }
}
