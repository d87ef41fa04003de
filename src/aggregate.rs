// Descriptive statistics and grouped sums over coerced cell values

use crate::data::Row;
use crate::schema::coerce_cell;
use serde::Serialize;
use std::collections::HashMap;

/// Statistics over the rows of one column that coerce to a finite number.
/// Kept at full precision; see [`ColumnStats::display`] for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Two-decimal presentation of [`ColumnStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsDisplay {
    pub count: usize,
    pub sum: String,
    pub min: String,
    pub max: String,
    pub avg: String,
}

impl ColumnStats {
    pub fn display(&self) -> StatsDisplay {
        StatsDisplay {
            count: self.count,
            sum: format_fixed2(self.sum),
            min: format_fixed2(self.min),
            max: format_fixed2(self.max),
            avg: format_fixed2(self.avg),
        }
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format with exactly two decimals (`65` -> `65.00`)
pub fn format_fixed2(value: f64) -> String {
    format!("{:.2}", value)
}

/// Stats for `column`, or `None` when no row holds a number there
pub fn compute_stats(rows: &[Row], column: &str) -> Option<ColumnStats> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for value in rows.iter().filter_map(|row| coerce_cell(row, column)) {
        count += 1;
        sum += value;
        min = min.min(value);
        max = max.max(value);
    }

    if count == 0 {
        return None;
    }

    Some(ColumnStats {
        count,
        sum,
        min,
        max,
        avg: sum / count as f64,
    })
}

/// Sums of one numeric column partitioned by a categorical column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedAggregate {
    /// (category, sum) in first-seen category order
    pub entries: Vec<(String, f64)>,
}

impl GroupedAggregate {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn categories(&self) -> Vec<String> {
        self.entries.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }
}

/// Sum `value_column` per distinct `group_column` category. Categories keep
/// first-occurrence order; values that do not coerce contribute zero.
pub fn group_sum_by(rows: &[Row], group_column: &str, value_column: &str) -> GroupedAggregate {
    let mut entries: Vec<(String, f64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let category = row.category(group_column);
        let value = coerce_cell(row, value_column).unwrap_or(0.0);

        match positions.get(&category) {
            Some(&idx) => entries[idx].1 += value,
            None => {
                positions.insert(category.clone(), entries.len());
                entries.push((category, value));
            }
        }
    }

    GroupedAggregate { entries }
}
