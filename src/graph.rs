use crate::export::{CapturedImage, ReportCapture};
use crate::ir::{
    BarChart, Breakdown, CategoryChart, ChartSpec, PieChart, ReportDocument, ScatterChart,
};
use crate::palette::ColorPalette;
use crate::report::DOTS_PER_ROW;
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::f64::consts::PI;
use std::ops::Range;

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

const TEXT: RGBColor = RGBColor(0x33, 0x33, 0x33);
const MUTED: RGBColor = RGBColor(0x66, 0x66, 0x66);
const CARD_FILL: RGBColor = RGBColor(0xf5, 0xf7, 0xfa);
const CARD_BORDER: RGBColor = RGBColor(0xdc, 0xe0, 0xe6);
const DOT_ACTIVE: RGBColor = RGBColor(0x2d, 0xb7, 0x7e);
const DOT_INACTIVE: RGBColor = RGBColor(0xd6, 0xed, 0xe3);

/// Render a single chart spec to PNG bytes
pub fn render_chart_png(
    spec: &ChartSpec,
    width: u32,
    height: u32,
    palette: &ColorPalette,
) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;
        draw_chart(&root, spec, palette)?;
        root.present().context("Failed to present drawing")?;
    }
    CapturedImage::new(width, height, buffer)?.to_png()
}

/// Draw one chart spec into `area`
pub fn draw_chart(area: &Area, spec: &ChartSpec, palette: &ColorPalette) -> Result<()> {
    match spec {
        ChartSpec::Trend(chart) => draw_line_chart(area, chart, palette, false),
        ChartSpec::Area(chart) => draw_line_chart(area, chart, palette, true),
        ChartSpec::Comparison(chart) => draw_column_chart(area, chart, palette),
        ChartSpec::GroupedBar(chart) => draw_horizontal_bars(area, chart, palette),
        ChartSpec::Distribution(chart) => draw_pie(area, chart, palette),
        ChartSpec::Scatter(chart) => draw_scatter(area, chart, palette),
    }
}

/// Padded value range, as the axis should show it
fn value_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    }

    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        let lower = if include_zero && min == 0.0 { 0.0 } else { min - padding };
        (lower)..(max + padding)
    }
}

/// Categories sit on integer positions of a `-0.5..n-0.5` axis
fn category_range(count: usize) -> Range<f64> {
    -0.5..(count as f64 - 0.5)
}

fn category_label(categories: &[String], position: f64) -> String {
    let idx = position.round();
    if (position - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn draw_line_chart(
    area: &Area,
    chart: &CategoryChart,
    palette: &ColorPalette,
    filled: bool,
) -> Result<()> {
    let values = chart.series.iter().flat_map(|s| s.values.iter().flatten().copied());
    let y_range = value_range(values, filled);
    let baseline = y_range.start;

    let mut ctx = ChartBuilder::on(area)
        .margin(10)
        .caption(&chart.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(category_range(chart.categories.len()), y_range)
        .context("Failed to build chart")?;

    let categories = &chart.categories;
    ctx.configure_mesh()
        .x_labels(categories.len().min(24))
        .x_label_formatter(&|x| category_label(categories, *x))
        .x_desc(chart.x_title.as_str())
        .y_desc(chart.y_title.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    for (idx, series) in chart.series.iter().enumerate() {
        let color = palette.color(idx);
        let points: Vec<(f64, f64)> = series
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect();

        if filled {
            ctx.draw_series(
                AreaSeries::new(points.clone(), baseline, color.mix(0.3)).border_style(color),
            )
            .context("Failed to draw area series")?;
        } else {
            ctx.draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .context("Failed to draw line series")?;
        }
        ctx.draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
            .context("Failed to draw point series")?;
    }

    Ok(())
}

fn draw_column_chart(area: &Area, chart: &CategoryChart, palette: &ColorPalette) -> Result<()> {
    let values = chart.series.iter().flat_map(|s| s.values.iter().flatten().copied());
    let y_range = value_range(values, true);

    let mut ctx = ChartBuilder::on(area)
        .margin(10)
        .caption(&chart.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(category_range(chart.categories.len()), y_range)
        .context("Failed to build chart")?;

    let categories = &chart.categories;
    ctx.configure_mesh()
        .x_labels(categories.len().min(24))
        .x_label_formatter(&|x| category_label(categories, *x))
        .x_desc(chart.x_title.as_str())
        .y_desc(chart.y_title.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    // Side-by-side bars, one slot per series
    let num_series = chart.series.len().max(1);
    let bar_width = 0.8 / num_series as f64;

    for (series_idx, series) in chart.series.iter().enumerate() {
        let color = palette.color(series_idx);
        let x_offset = (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * bar_width;

        ctx.draw_series(series.values.iter().enumerate().filter_map(|(cat_idx, v)| {
            let y_val = (*v)?;
            let x_center = cat_idx as f64 + x_offset;
            Some(Rectangle::new(
                [
                    (x_center - bar_width / 2.0, 0.0),
                    (x_center + bar_width / 2.0, y_val),
                ],
                color.filled(),
            ))
        }))
        .context("Failed to draw bar")?
        .label(series.name.as_str())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    if chart.series.len() > 1 {
        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(CARD_BORDER)
            .draw()
            .context("Failed to draw legend")?;
    }

    Ok(())
}

fn draw_horizontal_bars(area: &Area, chart: &BarChart, palette: &ColorPalette) -> Result<()> {
    let values = chart.series.values.iter().flatten().copied();
    let x_range = value_range(values, true);

    let mut ctx = ChartBuilder::on(area)
        .margin(10)
        .caption(&chart.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range, category_range(chart.categories.len()))
        .context("Failed to build chart")?;

    let categories = &chart.categories;
    ctx.configure_mesh()
        .y_labels(categories.len().min(24))
        .y_label_formatter(&|y| category_label(categories, *y))
        .x_desc(chart.y_title.as_str())
        .y_desc(chart.x_title.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    let color = palette.color(0);
    ctx.draw_series(chart.series.values.iter().enumerate().filter_map(|(idx, v)| {
        let value = (*v)?;
        let y = idx as f64;
        Some(Rectangle::new([(0.0, y - 0.4), (value, y + 0.4)], color.filled()))
    }))
    .context("Failed to draw bar")?;

    Ok(())
}

/// Polygon outline of one pie slice, from `start` to `end` radians
fn slice_polygon(center: (i32, i32), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = (((end - start) / (PI / 90.0)).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for i in 0..=steps {
        let angle = start + (end - start) * i as f64 / steps as f64;
        points.push((
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 + (radius * angle.sin()).round() as i32,
        ));
    }
    points
}

fn draw_pie(area: &Area, chart: &PieChart, palette: &ColorPalette) -> Result<()> {
    let area = area
        .titled(&chart.title, ("sans-serif", 20))
        .context("Failed to draw chart title")?;
    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = (width.min(height) as f64) * 0.35;

    let total: f64 = chart.slices.iter().map(|s| s.value.max(0.0)).sum();
    if total <= 0.0 {
        return Ok(());
    }

    // Start at twelve o'clock, clockwise
    let mut angle = -PI / 2.0;
    for (idx, slice) in chart.slices.iter().enumerate() {
        if slice.value <= 0.0 {
            continue;
        }
        let sweep = slice.value / total * 2.0 * PI;
        let color = palette.color(idx);
        area.draw(&Polygon::new(
            slice_polygon(center, radius, angle, angle + sweep),
            color.filled(),
        ))
        .context("Failed to draw pie slice")?;

        let mid = angle + sweep / 2.0;
        let label_at = (
            center.0 + (radius * 1.15 * mid.cos()) as i32,
            center.1 + (radius * 1.15 * mid.sin()) as i32,
        );
        area.draw(&Text::new(
            format!("{} ({:.1}%)", slice.name, slice.value / total * 100.0),
            label_at,
            ("sans-serif", 14).into_font().color(&TEXT),
        ))
        .context("Failed to draw pie label")?;

        angle += sweep;
    }

    Ok(())
}

fn draw_scatter(area: &Area, chart: &ScatterChart, palette: &ColorPalette) -> Result<()> {
    let x_range = value_range(chart.points.iter().map(|p| p.0), false);
    let y_range = value_range(chart.points.iter().map(|p| p.1), false);

    let mut ctx = ChartBuilder::on(area)
        .margin(10)
        .caption(&chart.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    ctx.configure_mesh()
        .x_desc(chart.x_title.as_str())
        .y_desc(chart.y_title.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    let color = palette.color(0);
    ctx.draw_series(
        chart
            .points
            .iter()
            .map(|&p| Circle::new(p, 4, color.mix(0.7).filled())),
    )
    .context("Failed to draw point series")?;

    Ok(())
}

// =============================================================================
// Report capture
// =============================================================================

const TITLE_HEIGHT: u32 = 60;
const KPI_HEIGHT: u32 = 110;
const BREAKDOWN_HEADER_HEIGHT: u32 = 44;
const DOT_ROW_HEIGHT: u32 = 26;
const TABLE_HEADER_HEIGHT: u32 = 50;
const TABLE_ROW_HEIGHT: u32 = 30;
const PADDING: i32 = 20;

/// Vertical bands of a captured report, in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub width: u32,
    pub height: u32,
    pub kpi_top: Option<u32>,
    pub breakdown_top: Option<u32>,
    pub chart_tops: Vec<u32>,
    pub table_top: Option<u32>,
}

impl ReportLayout {
    pub fn measure(doc: &ReportDocument, width: u32, chart_height: u32) -> Self {
        let mut top = TITLE_HEIGHT;

        let kpi_top = (!doc.kpis.is_empty()).then(|| {
            let at = top;
            top += KPI_HEIGHT;
            at
        });

        let breakdown_top = doc.breakdown.as_ref().map(|breakdown| {
            let at = top;
            top += BREAKDOWN_HEADER_HEIGHT + DOT_ROW_HEIGHT * breakdown.rows.len() as u32 + 10;
            at
        });

        let chart_tops = doc
            .charts
            .iter()
            .map(|_| {
                let at = top;
                top += chart_height;
                at
            })
            .collect();

        let table_top = (!doc.table.is_empty()).then(|| {
            let at = top;
            top += TABLE_HEADER_HEIGHT + TABLE_ROW_HEIGHT * (doc.table.len() as u32 + 1);
            at
        });

        Self {
            width,
            height: top,
            kpi_top,
            breakdown_top,
            chart_tops,
            table_top,
        }
    }
}

/// Rasterises a report document with plotters: title, KPI cards, each chart
/// in its own band, then the summary table.
#[derive(Debug, Clone)]
pub struct PlottersCapture {
    pub width: u32,
    pub chart_height: u32,
    pub palette: ColorPalette,
}

impl PlottersCapture {
    pub fn new(width: u32, chart_height: u32, palette: ColorPalette) -> Self {
        Self {
            width,
            chart_height,
            palette,
        }
    }
}

impl ReportCapture for PlottersCapture {
    fn capture(&self, doc: &ReportDocument) -> Result<CapturedImage> {
        let layout = ReportLayout::measure(doc, self.width, self.chart_height);
        let mut buffer = vec![0u8; layout.width as usize * layout.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (layout.width, layout.height))
                .into_drawing_area();
            root.fill(&WHITE).context("Failed to fill background")?;

            root.draw(&Text::new(
                doc.title.clone(),
                (PADDING, PADDING),
                ("sans-serif", 28).into_font().color(&TEXT),
            ))
            .context("Failed to draw report title")?;

            if let Some(top) = layout.kpi_top {
                draw_kpi_cards(&root, doc, top, layout.width)?;
            }

            if let (Some(top), Some(breakdown)) = (layout.breakdown_top, &doc.breakdown) {
                draw_breakdown(&root, breakdown, top)?;
            }

            for (chart, top) in doc.charts.iter().zip(&layout.chart_tops) {
                let band = root
                    .clone()
                    .shrink((0, *top), (layout.width, self.chart_height));
                draw_chart(&band, chart, &self.palette)?;
            }

            if let Some(top) = layout.table_top {
                draw_summary_table(&root, doc, top, layout.width)?;
            }

            root.present().context("Failed to present drawing")?;
        }
        CapturedImage::new(layout.width, layout.height, buffer)
    }
}

fn draw_kpi_cards(root: &Area, doc: &ReportDocument, top: u32, width: u32) -> Result<()> {
    let count = doc.kpis.len() as i32;
    let gap = 16;
    let card_width = (width as i32 - 2 * PADDING - gap * (count - 1)) / count;
    let y0 = top as i32 + 10;
    let y1 = top as i32 + KPI_HEIGHT as i32 - 10;

    for (idx, kpi) in doc.kpis.iter().enumerate() {
        let x0 = PADDING + idx as i32 * (card_width + gap);
        let x1 = x0 + card_width;

        root.draw(&Rectangle::new([(x0, y0), (x1, y1)], CARD_FILL.filled()))
            .context("Failed to draw KPI card")?;
        root.draw(&Rectangle::new([(x0, y0), (x1, y1)], CARD_BORDER.stroke_width(1)))
            .context("Failed to draw KPI card")?;

        root.draw(&Text::new(
            kpi.label.clone(),
            (x0 + 12, y0 + 10),
            ("sans-serif", 14).into_font().color(&MUTED),
        ))
        .context("Failed to draw KPI label")?;
        root.draw(&Text::new(
            kpi.value.clone(),
            (x0 + 12, y0 + 32),
            ("sans-serif", 26).into_font().color(&TEXT),
        ))
        .context("Failed to draw KPI value")?;
        if let Some(sub) = &kpi.sub {
            root.draw(&Text::new(
                sub.clone(),
                (x0 + 12, y0 + 66),
                ("sans-serif", 13).into_font().color(&MUTED),
            ))
            .context("Failed to draw KPI subtitle")?;
        }
    }

    Ok(())
}

/// Dot-matrix rows: label, twenty dots, percentage
fn draw_breakdown(root: &Area, breakdown: &Breakdown, top: u32) -> Result<()> {
    let top = top as i32;
    root.draw(&Text::new(
        breakdown.title.clone(),
        (PADDING, top + 12),
        ("sans-serif", 20).into_font().color(&TEXT),
    ))
    .context("Failed to draw breakdown title")?;

    let label_width = 160;
    let dot_step = 18;
    for (idx, row) in breakdown.rows.iter().enumerate() {
        let y = top + BREAKDOWN_HEADER_HEIGHT as i32 + idx as i32 * DOT_ROW_HEIGHT as i32;
        root.draw(&Text::new(
            row.category.clone(),
            (PADDING, y + 4),
            ("sans-serif", 14).into_font().color(&TEXT),
        ))
        .context("Failed to draw breakdown label")?;

        for dot in 0..DOTS_PER_ROW {
            let color = if dot < row.active_dots { DOT_ACTIVE } else { DOT_INACTIVE };
            let center = (PADDING + label_width + dot as i32 * dot_step, y + 11);
            root.draw(&Circle::new(center, 6, color.filled()))
                .context("Failed to draw dot")?;
        }

        root.draw(&Text::new(
            format!("{:.2}%", row.percent),
            (PADDING + label_width + DOTS_PER_ROW as i32 * dot_step + 10, y + 4),
            ("sans-serif", 14).into_font().color(&MUTED),
        ))
        .context("Failed to draw breakdown value")?;
    }

    Ok(())
}

fn draw_summary_table(root: &Area, doc: &ReportDocument, top: u32, width: u32) -> Result<()> {
    const HEADERS: [&str; 6] = ["Column", "Count", "Sum", "Average", "Min", "Max"];

    let top = top as i32;
    root.draw(&Text::new(
        doc.table_title.clone(),
        (PADDING, top + 14),
        ("sans-serif", 20).into_font().color(&TEXT),
    ))
    .context("Failed to draw table title")?;

    let column_width = (width as i32 - 2 * PADDING) / HEADERS.len() as i32;
    let header_top = top + TABLE_HEADER_HEIGHT as i32;
    let row_height = TABLE_ROW_HEIGHT as i32;

    root.draw(&Rectangle::new(
        [
            (PADDING, header_top),
            (width as i32 - PADDING, header_top + row_height),
        ],
        CARD_FILL.filled(),
    ))
    .context("Failed to draw table header")?;

    let cells = std::iter::once(HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>()).chain(
        doc.table.iter().map(|row| {
            vec![
                row.column.clone(),
                row.stats.count.to_string(),
                row.stats.sum.clone(),
                row.stats.avg.clone(),
                row.stats.min.clone(),
                row.stats.max.clone(),
            ]
        }),
    );

    for (row_idx, row) in cells.enumerate() {
        let y = header_top + row_idx as i32 * row_height;
        for (col_idx, cell) in row.into_iter().enumerate() {
            root.draw(&Text::new(
                cell,
                (PADDING + 8 + col_idx as i32 * column_width, y + 8),
                ("sans-serif", 14).into_font().color(&TEXT),
            ))
            .context("Failed to draw table cell")?;
        }
        root.draw(&PathElement::new(
            vec![
                (PADDING, y + row_height),
                (width as i32 - PADDING, y + row_height),
            ],
            CARD_BORDER.stroke_width(1),
        ))
        .context("Failed to draw table rule")?;
    }

    Ok(())
}
