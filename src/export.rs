// Export path: capture the report once, paginate, hand pages to a writer

use crate::ir::{ImagePlacement, ReportDocument};
use crate::paginate::{paginate_on, PageGeometry};
use anyhow::{Context, Result};
use image::ImageEncoder;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Default file name for exported reports
pub const DEFAULT_EXPORT_FILE: &str = "csv-report.pdf";

/// A rasterised report: tightly packed 8-bit RGB pixels
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl CapturedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            anyhow::bail!(
                "RGB buffer size mismatch (expected {} bytes for {}x{}, got {})",
                expected,
                width,
                height,
                pixels.len()
            );
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png_bytes)
            .write_image(&self.pixels, self.width, self.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
        Ok(png_bytes)
    }
}

/// Rasterises a report into one tall image
pub trait ReportCapture {
    fn capture(&self, doc: &ReportDocument) -> Result<CapturedImage>;
}

/// Receives one image draw per page and persists the finished document
pub trait PageWriter {
    /// Draw `image` at `placement` on a page. Every call after the first
    /// starts a new physical page.
    fn add_image_page(&mut self, image: &CapturedImage, placement: &ImagePlacement) -> Result<()>;

    fn finish(self: Box<Self>, path: &Path) -> Result<()>;
}

/// Capture, paginate and write `doc`. Returns the number of pages written.
pub fn export_report(
    doc: &ReportDocument,
    capture: &dyn ReportCapture,
    mut writer: Box<dyn PageWriter>,
    geometry: &PageGeometry,
    path: &Path,
) -> Result<usize> {
    let image = capture.capture(doc).context("Failed to capture report")?;
    debug!(width = image.width, height = image.height, "captured report");

    let pagination = paginate_on(geometry, image.height as f64, image.width as f64)
        .context("Failed to paginate report")?;

    for page in &pagination.pages {
        writer
            .add_image_page(&image, &page.placement)
            .with_context(|| format!("Failed to write page {}", page.page_index + 1))?;
    }
    writer.finish(path)?;

    info!(
        pages = pagination.page_count(),
        path = %path.display(),
        "exported report"
    );
    Ok(pagination.page_count())
}
