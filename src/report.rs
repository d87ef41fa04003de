use crate::aggregate::{compute_stats, group_sum_by, round2, GroupedAggregate};
use crate::data::Row;
use crate::ir::{Breakdown, ChartSpec, DotRow, Kpi, ReportDocument, TableRow};
use crate::schema::ColumnCatalog;

pub const REPORT_TITLE: &str = "CSV Report";
pub const TABLE_TITLE: &str = "Comparison Summary";

/// Numeric columns that get a KPI card after the row count
const MAX_METRIC_KPIS: usize = 3;

/// Dots per dot-matrix row; each dot stands for 5%
pub const DOTS_PER_ROW: usize = 20;

/// Compose the report sections in rendering order
pub fn assemble_report(
    rows: &[Row],
    catalog: &ColumnCatalog,
    charts: Vec<ChartSpec>,
    x_column: Option<&str>,
) -> ReportDocument {
    if catalog.is_empty() || rows.is_empty() {
        return ReportDocument {
            title: REPORT_TITLE.to_string(),
            x_column: None,
            kpis: Vec::new(),
            breakdown: None,
            charts: Vec::new(),
            table_title: TABLE_TITLE.to_string(),
            table: Vec::new(),
        };
    }

    let stats: Vec<(String, _)> = catalog
        .numeric
        .iter()
        .filter_map(|col| compute_stats(rows, col).map(|s| (col.clone(), s)))
        .collect();

    let mut kpis = vec![Kpi {
        label: "Total Rows".to_string(),
        value: rows.len().to_string(),
        sub: None,
    }];
    kpis.extend(stats.iter().take(MAX_METRIC_KPIS).map(|(col, s)| {
        let shown = s.display();
        Kpi {
            label: format!("Avg {}", col),
            value: shown.avg,
            sub: Some(format!("{}–{}", shown.min, shown.max)),
        }
    }));

    let table = stats
        .iter()
        .map(|(col, s)| TableRow {
            column: col.clone(),
            stats: s.display(),
        })
        .collect();

    ReportDocument {
        title: REPORT_TITLE.to_string(),
        x_column: x_column.map(str::to_string),
        kpis,
        breakdown: x_column.and_then(|x| breakdown(rows, catalog, x)),
        charts,
        table_title: TABLE_TITLE.to_string(),
        table,
    }
}

/// Dot-matrix share of the primary metric per `x_column` category
pub fn breakdown(rows: &[Row], catalog: &ColumnCatalog, x_column: &str) -> Option<Breakdown> {
    if !catalog.columns.iter().any(|c| c == x_column) {
        return None;
    }
    let metric = catalog.primary_metric()?;
    let dots = dot_matrix(&group_sum_by(rows, x_column, metric));
    if dots.is_empty() {
        return None;
    }
    Some(Breakdown {
        title: format!("Share of {} by {}", metric, x_column),
        rows: dots,
    })
}

/// Percentage share per category, quantised to a row of 20 dots
pub fn dot_matrix(grouped: &GroupedAggregate) -> Vec<DotRow> {
    let total = grouped.total();
    if total == 0.0 || !total.is_finite() {
        return Vec::new();
    }

    grouped
        .entries
        .iter()
        .map(|(category, value)| {
            let percent = round2(value / total * 100.0);
            let active_dots = (percent / 5.0).round().clamp(0.0, DOTS_PER_ROW as f64) as usize;
            DotRow {
                category: category.clone(),
                percent,
                active_dots,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::group_sum_by;
    use crate::charts::build_chart_specs;
    use crate::csv_reader::{parse_csv, CsvOptions};
    use crate::ir::ChartKind;
    use crate::schema::infer_catalog;

    fn report_for(text: &str) -> ReportDocument {
        let data = parse_csv(text, &CsvOptions::default()).unwrap();
        let catalog = infer_catalog(&data.rows, &data.headers);
        let x = data.headers.first().cloned();
        let charts = match &x {
            Some(x) => build_chart_specs(&data.rows, &catalog, x, &[]),
            None => Vec::new(),
        };
        assemble_report(&data.rows, &catalog, charts, x.as_deref())
    }

    #[test]
    fn test_kpis_and_table() {
        let doc = report_for("month,sales\nJan,10\nFeb,20\nMar,35\n");
        assert_eq!(doc.kpis.len(), 2);
        assert_eq!(doc.kpis[0].label, "Total Rows");
        assert_eq!(doc.kpis[0].value, "3");
        assert_eq!(doc.kpis[1].label, "Avg sales");
        assert_eq!(doc.kpis[1].value, "21.67");
        assert_eq!(doc.kpis[1].sub.as_deref(), Some("10.00–35.00"));

        assert_eq!(doc.table.len(), 1);
        assert_eq!(doc.table[0].column, "sales");
        assert_eq!(doc.table[0].stats.sum, "65.00");
        assert_eq!(doc.charts[0].kind(), ChartKind::Trend);
        assert_eq!(doc.x_column.as_deref(), Some("month"));
    }

    #[test]
    fn test_metric_kpis_capped_at_three() {
        let doc = report_for("k,a,b,c,d\nx,1,2,3,4\n");
        assert_eq!(doc.kpis.len(), 4);
        let labels: Vec<&str> = doc.kpis.iter().map(|k| k.label.as_str()).collect();
        assert_eq!(labels, vec!["Total Rows", "Avg a", "Avg b", "Avg c"]);
        assert_eq!(doc.table.len(), 4);
    }

    #[test]
    fn test_empty_and_header_only_reports() {
        let empty = report_for("");
        assert!(empty.is_empty());
        assert!(empty.x_column.is_none());

        let header_only = report_for("x,y\n");
        assert!(header_only.is_empty());
        assert!(header_only.x_column.is_none());
    }

    #[test]
    fn test_section_order_in_json() {
        let doc = report_for("month,sales\nJan,10\n");
        let json = serde_json::to_string(&doc).unwrap();
        let kpis = json.find("\"kpis\"").unwrap();
        let charts = json.find("\"charts\"").unwrap();
        let breakdown = json.find("\"breakdown\"").unwrap();
        let table = json.find("\"table\"").unwrap();
        assert!(kpis < breakdown && breakdown < charts && charts < table);
    }

    #[test]
    fn test_dot_matrix() {
        let data = parse_csv("r,v\nN,30\nS,50\nE,20\n", &CsvOptions::default()).unwrap();
        let grouped = group_sum_by(&data.rows, "r", "v");
        let dots = dot_matrix(&grouped);
        assert_eq!(dots.len(), 3);
        assert_eq!(dots[0].percent, 30.0);
        assert_eq!(dots[0].active_dots, 6);
        assert_eq!(dots[1].active_dots, 10);
        assert_eq!(dots[2].active_dots, 4);
    }

    #[test]
    fn test_report_carries_breakdown() {
        let doc = report_for("month,sales\nJan,10\nFeb,30\nJan,60\n");
        let breakdown = doc.breakdown.unwrap();
        assert_eq!(breakdown.title, "Share of sales by month");
        let shares: Vec<(&str, f64, usize)> = breakdown
            .rows
            .iter()
            .map(|r| (r.category.as_str(), r.percent, r.active_dots))
            .collect();
        assert_eq!(shares, vec![("Jan", 70.0, 14), ("Feb", 30.0, 6)]);
    }

    #[test]
    fn test_no_breakdown_without_metric_or_x() {
        let text_only = report_for("name,city\nann,Oslo\n");
        assert!(text_only.breakdown.is_none());

        let data = parse_csv("m,v\na,1\n", &CsvOptions::default()).unwrap();
        let catalog = infer_catalog(&data.rows, &data.headers);
        assert!(breakdown(&data.rows, &catalog, "nope").is_none());
        let doc = assemble_report(&data.rows, &catalog, Vec::new(), None);
        assert!(doc.breakdown.is_none());
    }

    #[test]
    fn test_dot_matrix_zero_total() {
        let data = parse_csv("r,v\nN,0\n", &CsvOptions::default()).unwrap();
        let grouped = group_sum_by(&data.rows, "r", "v");
        assert!(dot_matrix(&grouped).is_empty());
    }
}
