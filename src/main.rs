use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use csvreport::csv_reader::{read_csv_file, read_csv_from_stdin};
use csvreport::dashboard::Dashboard;
use csvreport::export::export_report;
use csvreport::graph::{render_chart_png, PlottersCapture};
use csvreport::ir::ChartKind;
use csvreport::paginate::Orientation;
use csvreport::pdf::PdfPageWriter;
use csvreport::ReportOptions;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "csvreport")]
#[command(about = "Summarise CSV data as charts, KPIs and a statistics table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the report document as JSON
    Report(InputArgs),
    /// Render one chart of the report as PNG on stdout
    Chart {
        #[command(flatten)]
        input: InputArgs,
        /// trend, distribution, comparison, grouped-bar, area or scatter
        #[arg(long, default_value = "trend")]
        kind: ChartKind,
        #[arg(long, default_value_t = 800)]
        height: u32,
    },
    /// Write the full report to a paginated PDF
    Export {
        #[command(flatten)]
        input: InputArgs,
        /// Output file (default csv-report.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        landscape: bool,
        /// Page margin in millimetres
        #[arg(long)]
        margin: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// CSV file to read; stdin when omitted
    input: Option<PathBuf>,
    /// X-axis column (defaults to the first header)
    #[arg(long)]
    x: Option<String>,
    /// Y column to chart; repeat for several
    #[arg(long = "y")]
    y: Vec<String>,
    /// Keep every field as text
    #[arg(long)]
    no_dynamic_typing: bool,
    /// JSON options file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl InputArgs {
    fn options(&self) -> Result<ReportOptions> {
        let mut options = match &self.config {
            Some(path) => ReportOptions::from_json_file(path)?,
            None => ReportOptions::default(),
        };
        if self.no_dynamic_typing {
            options.dynamic_typing = false;
        }
        Ok(options)
    }

    fn dashboard(&self, options: &ReportOptions) -> Result<Dashboard> {
        let csv_options = options.csv_options();
        let dataset = match &self.input {
            Some(path) => read_csv_file(path, &csv_options)?,
            None => read_csv_from_stdin(&csv_options).context("Failed to read CSV from stdin")?,
        };

        let mut dashboard = Dashboard::new(csv_options);
        dashboard.load(dataset);
        if let Some(x) = &self.x {
            dashboard.set_x_column(x);
        }
        if !self.y.is_empty() {
            dashboard.set_y_columns(self.y.iter().cloned());
        }
        Ok(dashboard)
    }
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(bytes)
        .context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Report(input) => {
            let options = input.options()?;
            let report = input.dashboard(&options)?.report();
            let mut json = serde_json::to_vec_pretty(&report).context("Failed to serialise report")?;
            json.push(b'\n');
            write_stdout(&json)?;
        }
        Command::Chart {
            input,
            kind,
            height,
        } => {
            let options = input.options()?;
            let mut dashboard = input.dashboard(&options)?;
            dashboard.set_chart_type(kind);

            let Some(chart) = dashboard.active_chart() else {
                bail!("No {} chart for this data and selection", kind);
            };
            let png = render_chart_png(&chart, options.width, height, &options.color_palette()?)
                .context("Failed to render chart")?;
            write_stdout(&png)?;
        }
        Command::Export {
            input,
            output,
            landscape,
            margin,
        } => {
            let mut options = input.options()?;
            if landscape {
                options.orientation = Orientation::Landscape;
            }
            if let Some(margin) = margin {
                options.margin_mm = margin;
            }
            if let Some(output) = output {
                options.output = output;
            }

            let report = input.dashboard(&options)?.report();
            let capture = PlottersCapture::new(options.width, options.chart_height, options.color_palette()?);
            let geometry = options.geometry();
            let pages = export_report(
                &report,
                &capture,
                Box::new(PdfPageWriter::new(geometry)),
                &geometry,
                &options.output,
            )?;
            eprintln!("Wrote {} page(s) to {}", pages, options.output.display());
        }
    }

    Ok(())
}
