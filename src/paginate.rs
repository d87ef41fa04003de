//! Page arithmetic for exporting one tall captured image.
//!
//! The image is scaled so its width matches the page content width. Every
//! page draws the whole image; page `n` shifts it up by `n * page_height`
//! so the page edge clips it to the next band.

use crate::ir::{ImagePlacement, PageSlice};
use serde::Deserialize;
use thiserror::Error;

/// A4 sheet size in millimetres
pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaginateError {
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidDimension { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Physical page size and margin, in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl PageGeometry {
    pub fn a4(orientation: Orientation, margin: f64) -> Self {
        let (width, height) = match orientation {
            Orientation::Portrait => (A4_WIDTH_MM, A4_HEIGHT_MM),
            Orientation::Landscape => (A4_HEIGHT_MM, A4_WIDTH_MM),
        };
        Self {
            width,
            height,
            margin,
        }
    }

    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4(Orientation::Portrait, 0.0)
    }
}

/// Result of paginating one image
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    /// Image height once scaled to the page width, in page units
    pub scaled_height: f64,
    pub pages: Vec<PageSlice>,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

fn check(name: &'static str, value: f64) -> Result<f64, PaginateError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PaginateError::InvalidDimension { name, value })
    }
}

/// Slice an `image_width_px` x `image_height_px` capture into pages of
/// `page_width` x `page_height`. Always yields at least one page.
pub fn paginate(
    image_height_px: f64,
    image_width_px: f64,
    page_width: f64,
    page_height: f64,
) -> Result<Pagination, PaginateError> {
    let image_height_px = check("image height", image_height_px)?;
    let image_width_px = check("image width", image_width_px)?;
    let page_width = check("page width", page_width)?;
    let page_height = check("page height", page_height)?;

    let scaled_height = image_height_px * page_width / image_width_px;
    let px_per_unit = image_width_px / page_width;

    let slice = |page_index: usize, position: f64| PageSlice {
        page_index,
        source_offset_px: if position < 0.0 { -position * px_per_unit } else { 0.0 },
        height_px: page_height * px_per_unit,
        placement: ImagePlacement {
            x_offset: 0.0,
            y_offset: position,
            width: page_width,
            height: scaled_height,
        },
    };

    let mut position = 0.0;
    let mut pages = vec![slice(0, position)];
    let mut height_left = scaled_height - page_height;
    while height_left > 0.0 {
        position -= page_height;
        pages.push(slice(pages.len(), position));
        height_left -= page_height;
    }

    Ok(Pagination {
        scaled_height,
        pages,
    })
}

/// [`paginate`] against a page's content box, with placements shifted
/// inside the margin
pub fn paginate_on(
    geometry: &PageGeometry,
    image_height_px: f64,
    image_width_px: f64,
) -> Result<Pagination, PaginateError> {
    let mut pagination = paginate(
        image_height_px,
        image_width_px,
        geometry.content_width(),
        geometry.content_height(),
    )?;
    for page in &mut pagination.pages {
        page.placement.x_offset += geometry.margin;
        page.placement.y_offset += geometry.margin;
    }
    Ok(pagination)
}
