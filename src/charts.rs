use crate::aggregate::group_sum_by;
use crate::data::Row;
use crate::ir::{BarChart, CategoryChart, ChartSpec, PieChart, PieSlice, ScatterChart, Series};
use crate::schema::{coerce_cell, ColumnCatalog};
use tracing::debug;

/// Y columns that drive the multi-series charts: the caller's selection
/// restricted to numeric columns (selection order, no repeats), or every
/// numeric column when nothing usable was selected.
pub fn y_columns_in_play(catalog: &ColumnCatalog, selected: &[String]) -> Vec<String> {
    let mut picked: Vec<String> = Vec::new();
    for name in selected {
        if catalog.is_numeric(name) && !picked.contains(name) {
            picked.push(name.clone());
        }
    }
    if picked.is_empty() {
        catalog.numeric.clone()
    } else {
        picked
    }
}

/// Derive the chart menu for one dataset and selection.
///
/// Output order is fixed: trend, distribution, comparison, grouped bar,
/// area, scatter. A chart whose inputs are missing is left out.
pub fn build_chart_specs(
    rows: &[Row],
    catalog: &ColumnCatalog,
    x_column: &str,
    y_columns: &[String],
) -> Vec<ChartSpec> {
    let mut charts = Vec::new();

    if !catalog.columns.iter().any(|c| c == x_column) {
        return charts;
    }

    let categories: Vec<String> = rows.iter().map(|row| row.category(x_column)).collect();
    let in_play = y_columns_in_play(catalog, y_columns);
    let primary = catalog.primary_metric();
    let grouped = primary.map(|metric| group_sum_by(rows, x_column, metric));

    // Trend
    if let Some(metric) = primary.filter(|_| !categories.is_empty()) {
        charts.push(ChartSpec::Trend(CategoryChart {
            title: format!("{} trend by {}", metric, x_column),
            categories: categories.clone(),
            series: vec![row_series(rows, metric)],
            x_title: x_column.to_string(),
            y_title: metric.to_string(),
        }));
    }

    // Distribution
    if let (Some(metric), Some(grouped)) = (primary, &grouped) {
        if in_play.len() == 1 && !grouped.is_empty() {
            charts.push(ChartSpec::Distribution(PieChart {
                title: format!("{} share by {}", metric, x_column),
                series_name: metric.to_string(),
                slices: grouped
                    .entries
                    .iter()
                    .map(|(name, value)| PieSlice {
                        name: name.clone(),
                        value: *value,
                    })
                    .collect(),
            }));
        }
    }

    // Comparison
    if !in_play.is_empty() {
        charts.push(ChartSpec::Comparison(CategoryChart {
            title: format!("Column comparison by {}", x_column),
            categories: categories.clone(),
            series: in_play.iter().map(|col| row_series(rows, col)).collect(),
            x_title: x_column.to_string(),
            y_title: "Value".to_string(),
        }));
    }

    // Grouped bar
    if let (Some(metric), Some(grouped)) = (primary, &grouped) {
        if !grouped.is_empty() {
            charts.push(ChartSpec::GroupedBar(BarChart {
                title: format!("Total {} by {}", metric, x_column),
                categories: grouped.categories(),
                series: Series {
                    name: metric.to_string(),
                    values: grouped.values().into_iter().map(Some).collect(),
                },
                x_title: x_column.to_string(),
                y_title: metric.to_string(),
                inverted: true,
            }));
        }
    }

    // Area
    if let Some(metric) = primary.filter(|_| !categories.is_empty()) {
        charts.push(ChartSpec::Area(CategoryChart {
            title: format!("{} over {}", metric, x_column),
            categories,
            series: vec![row_series(rows, metric)],
            x_title: x_column.to_string(),
            y_title: metric.to_string(),
        }));
    }

    // Scatter
    if let (Some(x_metric), Some(y_metric)) = (primary, catalog.secondary_metric()) {
        let points: Vec<(f64, f64)> = rows
            .iter()
            .filter_map(|row| Some((coerce_cell(row, x_metric)?, coerce_cell(row, y_metric)?)))
            .collect();
        if !points.is_empty() {
            charts.push(ChartSpec::Scatter(ScatterChart {
                title: format!("{} vs {}", x_metric, y_metric),
                points,
                x_title: x_metric.to_string(),
                y_title: y_metric.to_string(),
            }));
        }
    }

    debug!(x_column, charts = charts.len(), "built chart specs");
    charts
}

/// One value per row, in row order
fn row_series(rows: &[Row], column: &str) -> Series {
    Series {
        name: column.to_string(),
        values: rows.iter().map(|row| coerce_cell(row, column)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::{parse_csv, CsvOptions};
    use crate::ir::ChartKind;
    use crate::schema::infer_catalog;

    fn load(text: &str) -> (Vec<Row>, ColumnCatalog) {
        let data = parse_csv(text, &CsvOptions::default()).unwrap();
        let catalog = infer_catalog(&data.rows, &data.headers);
        (data.rows, catalog)
    }

    fn kinds(charts: &[ChartSpec]) -> Vec<ChartKind> {
        charts.iter().map(ChartSpec::kind).collect()
    }

    #[test]
    fn test_no_numeric_columns() {
        let (rows, catalog) = load("name,city\nann,oslo\nbob,rome\n");
        assert!(build_chart_specs(&rows, &catalog, "name", &[]).is_empty());
    }

    #[test]
    fn test_single_metric_menu() {
        let (rows, catalog) = load("month,sales\nJan,10\nFeb,20\nMar,35\n");
        let charts = build_chart_specs(&rows, &catalog, "month", &[]);
        assert_eq!(
            kinds(&charts),
            vec![
                ChartKind::Trend,
                ChartKind::Distribution,
                ChartKind::Comparison,
                ChartKind::GroupedBar,
                ChartKind::Area,
            ]
        );

        let ChartSpec::Trend(trend) = &charts[0] else {
            panic!("expected trend first");
        };
        assert_eq!(trend.categories, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(trend.series[0].values, vec![Some(10.0), Some(20.0), Some(35.0)]);
    }

    #[test]
    fn test_full_menu_order() {
        let (rows, catalog) = load("region,q1,q2\nN,1,2\nS,3,4\nN,5,6\n");
        let charts = build_chart_specs(&rows, &catalog, "region", &["q1".to_string()]);
        assert_eq!(kinds(&charts), ChartKind::ALL.to_vec());
    }

    #[test]
    fn test_pie_needs_single_y_column() {
        let (rows, catalog) = load("region,q1,q2\nN,1,2\nS,3,4\n");

        let none_selected = build_chart_specs(&rows, &catalog, "region", &[]);
        assert!(!kinds(&none_selected).contains(&ChartKind::Distribution));

        let both = build_chart_specs(
            &rows,
            &catalog,
            "region",
            &["q1".to_string(), "q2".to_string()],
        );
        assert!(!kinds(&both).contains(&ChartKind::Distribution));

        let one = build_chart_specs(&rows, &catalog, "region", &["q2".to_string()]);
        assert!(kinds(&one).contains(&ChartKind::Distribution));
    }

    #[test]
    fn test_comparison_follows_selection() {
        let (rows, catalog) = load("region,q1,q2,q3\nN,1,2,3\n");
        let charts = build_chart_specs(
            &rows,
            &catalog,
            "region",
            &["q3".to_string(), "region".to_string(), "q1".to_string(), "q3".to_string()],
        );
        let comparison = charts
            .iter()
            .find_map(|c| match c {
                ChartSpec::Comparison(c) => Some(c),
                _ => None,
            })
            .unwrap();
        let names: Vec<&str> = comparison.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["q3", "q1"]);
    }

    #[test]
    fn test_grouped_bar_sums_by_category() {
        let (rows, catalog) = load("region,amount\nB,1\nA,2\nB,3\nA,x\n");
        let charts = build_chart_specs(&rows, &catalog, "region", &[]);
        let bar = charts
            .iter()
            .find_map(|c| match c {
                ChartSpec::GroupedBar(b) => Some(b),
                _ => None,
            })
            .unwrap();
        assert!(bar.inverted);
        assert_eq!(bar.categories, vec!["B", "A"]);
        assert_eq!(bar.series.values, vec![Some(4.0), Some(2.0)]);
    }

    #[test]
    fn test_scatter_filters_non_numeric_rows() {
        let (rows, catalog) = load("id,h,w\n1,170,65\n2,,70\n3,180,n/a\n4,160,55\n");
        let charts = build_chart_specs(&rows, &catalog, "id", &[]);
        let scatter = charts
            .iter()
            .find_map(|c| match c {
                ChartSpec::Scatter(s) => Some(s),
                _ => None,
            })
            .unwrap();
        // id is numeric too, so it is the primary metric
        assert_eq!(scatter.x_title, "id");
        assert_eq!(scatter.y_title, "h");
        assert_eq!(scatter.points, vec![(1.0, 170.0), (3.0, 180.0), (4.0, 160.0)]);
    }

    #[test]
    fn test_unknown_x_column_yields_nothing() {
        let (rows, catalog) = load("month,sales\nJan,10\n");
        assert!(build_chart_specs(&rows, &catalog, "nope", &[]).is_empty());
    }

    #[test]
    fn test_trend_keeps_gaps() {
        let (rows, catalog) = load("month,sales\nJan,10\nFeb,\nMar,oops\n");
        let charts = build_chart_specs(&rows, &catalog, "month", &[]);
        let ChartSpec::Trend(trend) = &charts[0] else {
            panic!("expected trend first");
        };
        assert_eq!(trend.categories, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(trend.series[0].values, vec![Some(10.0), None, None]);
    }
}
