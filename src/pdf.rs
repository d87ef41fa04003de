// PageWriter backed by lopdf

use crate::export::{CapturedImage, PageWriter};
use crate::ir::ImagePlacement;
use crate::paginate::PageGeometry;
use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

const PT_PER_MM: f64 = 72.0 / 25.4;
const IMAGE_NAME: &str = "Im0";

/// Writes one page per image draw. The captured image is embedded once and
/// referenced from every page.
pub struct PdfPageWriter {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    geometry: PageGeometry,
    image: Option<(Arc<[u8]>, ObjectId)>,
}

impl PdfPageWriter {
    pub fn new(geometry: PageGeometry) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            geometry,
            image: None,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn image_object(&mut self, image: &CapturedImage) -> ObjectId {
        if let Some((pixels, id)) = &self.image {
            if Arc::ptr_eq(pixels, &image.pixels) {
                return *id;
            }
        }

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            image.pixels.to_vec(),
        );
        let id = self.doc.add_object(stream);
        self.image = Some((image.pixels.clone(), id));
        id
    }

    /// Finish the page tree and return the encoded document
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.close_document();
        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .context("Failed to encode PDF")?;
        Ok(bytes)
    }

    fn close_document(&mut self) {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
    }
}

fn pt(mm: f64) -> Object {
    Object::Real((mm * PT_PER_MM) as f32)
}

/// Content stream for one page: clip to the margin box, then draw the image
/// at its placement
fn page_content(geometry: &PageGeometry, placement: &ImagePlacement) -> Content {
    // PDF space grows upwards from the bottom-left corner
    let bottom = geometry.height - (placement.y_offset + placement.height);
    Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "re",
                vec![
                    pt(geometry.margin),
                    pt(geometry.margin),
                    pt(geometry.content_width()),
                    pt(geometry.content_height()),
                ],
            ),
            Operation::new("W", vec![]),
            Operation::new("n", vec![]),
            Operation::new(
                "cm",
                vec![
                    pt(placement.width),
                    pt(0.0),
                    pt(0.0),
                    pt(placement.height),
                    pt(placement.x_offset),
                    pt(bottom),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    }
}

impl PageWriter for PdfPageWriter {
    fn add_image_page(&mut self, image: &CapturedImage, placement: &ImagePlacement) -> Result<()> {
        let image_id = self.image_object(image);

        let content = page_content(&self.geometry, placement);
        let encoded = content.encode().context("Failed to encode page content")?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        });

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![pt(0.0), pt(0.0), pt(self.geometry.width), pt(self.geometry.height)],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    fn finish(self: Box<Self>, path: &Path) -> Result<()> {
        let bytes = self.into_bytes()?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create '{}'", path.display()))?;
        let mut out = BufWriter::new(file);
        out.write_all(&bytes)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        out.flush().context("Failed to flush PDF output")?;
        Ok(())
    }
}
