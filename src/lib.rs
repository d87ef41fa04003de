// Library exports for csvreport

pub mod csv_reader;
pub mod data;
pub mod schema;
pub mod aggregate;

// Derived documents
pub mod ir;
pub mod charts;
pub mod report;
pub mod dashboard;

// Rendering and export
pub mod graph;
pub mod palette;
pub mod paginate;
pub mod export;
pub mod pdf;

use anyhow::{Context, Result};
use csv_reader::CsvOptions;
use paginate::{Orientation, PageGeometry};
use palette::ColorPalette;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct ReportOptions {
    #[serde(default = "default_dynamic_typing")]
    pub dynamic_typing: bool,
    /// Capture width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Height of each chart band in pixels
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub margin_mm: f64,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Series colours, names or `#rrggbb`; category10 when absent
    #[serde(default)]
    pub palette: Option<Vec<String>>,
}

fn default_dynamic_typing() -> bool { true }
fn default_width() -> u32 { 1200 }
fn default_chart_height() -> u32 { 420 }
fn default_output() -> PathBuf { PathBuf::from(export::DEFAULT_EXPORT_FILE) }

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            dynamic_typing: default_dynamic_typing(),
            width: default_width(),
            chart_height: default_chart_height(),
            orientation: Orientation::default(),
            margin_mm: 0.0,
            output: default_output(),
            palette: None,
        }
    }
}

impl ReportOptions {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse report options")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            dynamic_typing: self.dynamic_typing,
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::a4(self.orientation, self.margin_mm)
    }

    pub fn color_palette(&self) -> Result<ColorPalette> {
        match &self.palette {
            Some(specs) => ColorPalette::from_specs(specs),
            None => Ok(ColorPalette::category10()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let options = ReportOptions::from_json_str("{}").unwrap();
        assert!(options.dynamic_typing);
        assert_eq!(options.width, 1200);
        assert_eq!(options.chart_height, 420);
        assert_eq!(options.orientation, Orientation::Portrait);
        assert_eq!(options.margin_mm, 0.0);
        assert_eq!(options.output, PathBuf::from("csv-report.pdf"));
        assert_eq!(options.geometry(), PageGeometry::default());
    }

    #[test]
    fn test_default_matches_empty_config() {
        let parsed = ReportOptions::from_json_str("{}").unwrap();
        let default = ReportOptions::default();
        assert_eq!(parsed.dynamic_typing, default.dynamic_typing);
        assert_eq!(parsed.width, default.width);
        assert_eq!(parsed.chart_height, default.chart_height);
        assert_eq!(parsed.orientation, default.orientation);
        assert_eq!(parsed.margin_mm, default.margin_mm);
        assert_eq!(parsed.output, default.output);
        assert_eq!(parsed.palette, default.palette);
    }

    #[test]
    fn test_overrides() {
        let options = ReportOptions::from_json_str(
            r##"{"orientation": "landscape", "margin_mm": 10, "dynamic_typing": false, "palette": ["#ff0000"]}"##,
        )
        .unwrap();
        assert!(!options.csv_options().dynamic_typing);
        assert_eq!(options.geometry().width, 297.0);
        assert_eq!(options.geometry().content_height(), 190.0);
        assert_eq!(
            options.color_palette().unwrap().color(3),
            plotters::style::RGBColor(255, 0, 0)
        );
    }

    #[test]
    fn test_rejects_unknown_orientation() {
        assert!(ReportOptions::from_json_str(r#"{"orientation": "sideways"}"#).is_err());
    }
}
