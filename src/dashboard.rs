// Caller-held state: current dataset plus one immutable selection record

use crate::charts::build_chart_specs;
use crate::csv_reader::{parse_csv_bytes, CsvOptions};
use crate::data::Dataset;
use crate::ir::{ChartKind, ChartSpec, ReportDocument};
use crate::report::assemble_report;
use crate::schema::{infer_catalog, resolve_x_column, ColumnCatalog};
use anyhow::Result;
use serde::Serialize;
use tracing::debug;

/// What the user has picked. Replaced wholesale by every setter.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Selection {
    pub x_column: Option<String>,
    pub y_columns: Vec<String>,
    pub chart_kind: ChartKind,
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    options: CsvOptions,
    dataset: Dataset,
    catalog: ColumnCatalog,
    selection: Selection,
}

impl Dashboard {
    pub fn new(options: CsvOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Replace the dataset, catalog and selection in one step. A parse
    /// failure leaves the current state as it was.
    pub fn upload_csv(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        let dataset = parse_csv_bytes(data.as_ref(), &self.options)?;
        self.load(dataset);
        Ok(())
    }

    /// Install an already parsed dataset with a fresh selection
    pub fn load(&mut self, dataset: Dataset) {
        let catalog = infer_catalog(&dataset.rows, &dataset.headers);
        let selection = Selection {
            x_column: resolve_x_column(&dataset.headers, None),
            ..Selection::default()
        };
        debug!(
            rows = dataset.rows.len(),
            columns = catalog.columns.len(),
            numeric = catalog.numeric.len(),
            "loaded dataset"
        );

        self.dataset = dataset;
        self.catalog = catalog;
        self.selection = selection;
    }

    /// Select the x-axis column; unknown names fall back to the first header
    pub fn set_x_column(&mut self, name: &str) {
        self.selection = Selection {
            x_column: resolve_x_column(&self.dataset.headers, Some(name)),
            ..self.selection.clone()
        };
    }

    pub fn set_y_columns<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = Selection {
            y_columns: names.into_iter().map(Into::into).collect(),
            ..self.selection.clone()
        };
    }

    pub fn set_chart_type(&mut self, kind: ChartKind) {
        self.selection = Selection {
            chart_kind: kind,
            ..self.selection.clone()
        };
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Chart menu for the current data and selection
    pub fn charts(&self) -> Vec<ChartSpec> {
        match &self.selection.x_column {
            Some(x) => build_chart_specs(
                &self.dataset.rows,
                &self.catalog,
                x,
                &self.selection.y_columns,
            ),
            None => Vec::new(),
        }
    }

    /// The chart of the selected kind, when the menu contains one
    pub fn active_chart(&self) -> Option<ChartSpec> {
        self.charts()
            .into_iter()
            .find(|chart| chart.kind() == self.selection.chart_kind)
    }

    pub fn report(&self) -> ReportDocument {
        assemble_report(
            &self.dataset.rows,
            &self.catalog,
            self.charts(),
            self.selection.x_column.as_deref(),
        )
    }
}
