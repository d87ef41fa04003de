use crate::aggregate::StatsDisplay;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Chart Specifications
// =============================================================================

/// Chart kinds, in the order the builder emits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Trend,
    Distribution,
    Comparison,
    GroupedBar,
    Area,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Trend,
        ChartKind::Distribution,
        ChartKind::Comparison,
        ChartKind::GroupedBar,
        ChartKind::Area,
        ChartKind::Scatter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Trend => "trend",
            ChartKind::Distribution => "distribution",
            ChartKind::Comparison => "comparison",
            ChartKind::GroupedBar => "grouped_bar",
            ChartKind::Area => "area",
            ChartKind::Scatter => "scatter",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "trend" | "line" => Ok(ChartKind::Trend),
            "distribution" | "pie" => Ok(ChartKind::Distribution),
            "comparison" | "column" => Ok(ChartKind::Comparison),
            "grouped_bar" | "bar" => Ok(ChartKind::GroupedBar),
            "area" => Ok(ChartKind::Area),
            "scatter" => Ok(ChartKind::Scatter),
            other => Err(format!("Unknown chart kind '{}'", other)),
        }
    }
}

/// One named numeric series. `None` marks a row whose value is not a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Categorical x-axis against one or more series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChart {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub x_title: String,
    pub y_title: String,
}

/// Grouped sums drawn as horizontal bars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Series,
    pub x_title: String,
    pub y_title: String,
    pub inverted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub series_name: String,
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterChart {
    pub title: String,
    pub points: Vec<(f64, f64)>,
    pub x_title: String,
    pub y_title: String,
}

/// Renderer-agnostic description of one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Trend(CategoryChart),
    Distribution(PieChart),
    Comparison(CategoryChart),
    GroupedBar(BarChart),
    Area(CategoryChart),
    Scatter(ScatterChart),
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartSpec::Trend(_) => ChartKind::Trend,
            ChartSpec::Distribution(_) => ChartKind::Distribution,
            ChartSpec::Comparison(_) => ChartKind::Comparison,
            ChartSpec::GroupedBar(_) => ChartKind::GroupedBar,
            ChartSpec::Area(_) => ChartKind::Area,
            ChartSpec::Scatter(_) => ChartKind::Scatter,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Trend(c) | ChartSpec::Comparison(c) | ChartSpec::Area(c) => &c.title,
            ChartSpec::Distribution(p) => &p.title,
            ChartSpec::GroupedBar(b) => &b.title,
            ChartSpec::Scatter(s) => &s.title,
        }
    }
}

// =============================================================================
// Report Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

/// One line of the summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub column: String,
    #[serde(flatten)]
    pub stats: StatsDisplay,
}

/// One line of the dot-matrix breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DotRow {
    pub category: String,
    /// Share of the grouped total, in percent
    pub percent: f64,
    pub active_dots: usize,
}

/// Share of the primary metric per x category, drawn as rows of dots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub title: String,
    pub rows: Vec<DotRow>,
}

/// Everything one render/export cycle needs, in rendering order:
/// KPIs, the dot-matrix breakdown, charts, then the summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub x_column: Option<String>,
    pub kpis: Vec<Kpi>,
    pub breakdown: Option<Breakdown>,
    pub charts: Vec<ChartSpec>,
    pub table_title: String,
    pub table: Vec<TableRow>,
}

impl ReportDocument {
    pub fn is_empty(&self) -> bool {
        self.kpis.is_empty()
            && self.breakdown.is_none()
            && self.charts.is_empty()
            && self.table.is_empty()
    }
}

// =============================================================================
// Export Pages
// =============================================================================

/// Where the full captured image is drawn on one page, in page units.
/// `y_offset` is measured from the top edge and goes negative on later pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImagePlacement {
    pub x_offset: f64,
    pub y_offset: f64,
    pub width: f64,
    pub height: f64,
}

/// One page of a paginated export
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSlice {
    pub page_index: usize,
    /// First source-image row revealed by this page
    pub source_offset_px: f64,
    /// Source-image rows covered by one page height
    pub height_px: f64,
    pub placement: ImagePlacement,
}
