//! Minimal PDF document writer for the analysis report.
//!
//! A thin layout layer over `lopdf`: A4 pages, Helvetica text with a
//! descending cursor, fixed-column rows for tables, and PNG chart images
//! re-encoded as FlateDecode RGB image XObjects. Automatic page breaks
//! keep the cursor inside the margins.

use crate::error::AnalysisError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
const MARGIN: f64 = 56.0;

/// Line height multiplier over the font size.
const LEADING: f64 = 1.5;

pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    bold_font_id: ObjectId,
    page_ids: Vec<ObjectId>,
    ops: Vec<Operation>,
    page_images: Vec<(String, ObjectId)>,
    cursor_y: f64,
    image_count: usize,
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });

        Self {
            doc,
            pages_id,
            font_id,
            bold_font_id,
            page_ids: Vec::new(),
            ops: Vec::new(),
            page_images: Vec::new(),
            cursor_y: PAGE_HEIGHT - MARGIN,
            image_count: 0,
        }
    }

    /// Usable width between the margins.
    pub fn content_width() -> f64 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    /// Force a page break. The first page is opened implicitly.
    pub fn new_page(&mut self) -> Result<(), AnalysisError> {
        if !self.ops.is_empty() {
            self.flush_page()?;
        }
        self.cursor_y = PAGE_HEIGHT - MARGIN;
        Ok(())
    }

    /// Write one text line at the left margin and advance the cursor.
    pub fn text_line(&mut self, text: &str, size: f64, bold: bool) -> Result<(), AnalysisError> {
        self.text_row(&[(0.0, text)], size, bold)
    }

    /// Write one baseline of text cells at fixed offsets from the left
    /// margin, then advance the cursor.
    pub fn text_row(
        &mut self,
        cells: &[(f64, &str)],
        size: f64,
        bold: bool,
    ) -> Result<(), AnalysisError> {
        let line_height = size * LEADING;
        self.ensure_space(line_height)?;
        self.cursor_y -= line_height;

        let font = if bold { "F2" } else { "F1" };
        for (offset, text) in cells {
            self.ops.push(Operation::new("BT", vec![]));
            self.ops.push(Operation::new(
                "Tf",
                vec![Object::Name(font.into()), Object::Real(size as f32)],
            ));
            self.ops.push(Operation::new(
                "Td",
                vec![
                    Object::Real((MARGIN + offset) as f32),
                    Object::Real(self.cursor_y as f32),
                ],
            ));
            self.ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(*text)],
            ));
            self.ops.push(Operation::new("ET", vec![]));
        }
        Ok(())
    }

    /// Vertical whitespace.
    pub fn gap(&mut self, height: f64) -> Result<(), AnalysisError> {
        self.ensure_space(height)?;
        self.cursor_y -= height;
        Ok(())
    }

    /// Embed a PNG image scaled to at most `max_width` points.
    pub fn image(&mut self, png_bytes: &[u8], max_width: f64) -> Result<(), AnalysisError> {
        let (width, height, rgb) = decode_png_rgb(png_bytes)?;

        let display_width = max_width.min(Self::content_width());
        let display_height = display_width * height as f64 / width as f64;
        self.ensure_space(display_height)?;
        self.cursor_y -= display_height;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&rgb)
            .map_err(|e| AnalysisError::Report(format!("image stream: {}", e)))?;
        let compressed = encoder
            .finish()
            .map_err(|e| AnalysisError::Report(format!("image stream: {}", e)))?;

        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        ));

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        self.page_images.push((name.clone(), image_id));

        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                Object::Real(display_width as f32),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(display_height as f32),
                Object::Real(MARGIN as f32),
                Object::Real(self.cursor_y as f32),
            ],
        ));
        self.ops
            .push(Operation::new("Do", vec![Object::Name(name.into())]));
        self.ops.push(Operation::new("Q", vec![]));
        Ok(())
    }

    /// Close the document and return its bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, AnalysisError> {
        self.flush_page()?;

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let count = self.page_ids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| AnalysisError::Report(format!("PDF serialization: {}", e)))?;
        Ok(bytes)
    }

    fn ensure_space(&mut self, height: f64) -> Result<(), AnalysisError> {
        if self.cursor_y - height < MARGIN && !self.ops.is_empty() {
            self.flush_page()?;
            self.cursor_y = PAGE_HEIGHT - MARGIN;
        }
        Ok(())
    }

    fn flush_page(&mut self) -> Result<(), AnalysisError> {
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        let encoded = content
            .encode()
            .map_err(|e| AnalysisError::Report(format!("content stream: {}", e)))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

        let mut xobjects = lopdf::Dictionary::new();
        for (name, id) in self.page_images.drain(..) {
            xobjects.set(name, Object::Reference(id));
        }

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => self.font_id,
                "F2" => self.bold_font_id,
            },
            "XObject" => xobjects,
        };

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(PAGE_WIDTH as f32),
                Object::Real(PAGE_HEIGHT as f32),
            ],
            "Resources" => resources,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a PNG into 8-bit RGB rows, flattening alpha and grayscale.
fn decode_png_rgb(bytes: &[u8]) -> Result<(u32, u32, Vec<u8>), AnalysisError> {
    let decoder = png::Decoder::new(bytes);
    let mut reader = decoder
        .read_info()
        .map_err(|e| AnalysisError::Report(format!("PNG decode: {}", e)))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| AnalysisError::Report(format!("PNG frame: {}", e)))?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != png::BitDepth::Eight {
        return Err(AnalysisError::Report(format!(
            "unsupported PNG bit depth: {:?}",
            info.bit_depth
        )));
    }

    let rgb = match info.color_type {
        png::ColorType::Rgb => buf,
        png::ColorType::Rgba => buf.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g]).collect(),
        png::ColorType::GrayscaleAlpha => {
            buf.chunks_exact(2).flat_map(|px| [px[0], px[0], px[0]]).collect()
        }
        other => {
            return Err(AnalysisError::Report(format!(
                "unsupported PNG color type: {:?}",
                other
            )))
        }
    };

    Ok((info.width, info.height, rgb))
}
