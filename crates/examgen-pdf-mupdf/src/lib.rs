use std::io::Cursor;
use std::path::Path;

use mupdf::{Colorspace, Document, Matrix, TextPageFlags};

use examgen_pdf::{PageRasterizer, PdfBackend, PdfError};

/// Scale factor applied when rasterizing pages for OCR. 2x the nominal
/// 72 dpi keeps small exam-paper type legible to vision models.
const RASTER_SCALE: f32 = 2.0;

/// MuPDF-based implementation of [`PdfBackend`] and [`PageRasterizer`].
///
/// This crate is the sole AGPL island — it isolates the mupdf dependency
/// (which is AGPL-3.0) so that non-PDF code paths do not transitively
/// depend on it.
#[derive(Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<Document, PdfError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| PdfError::OpenError("invalid path encoding".into()))?;
        Document::open(path_str).map_err(|e| PdfError::OpenError(e.to_string()))
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, PdfError> {
        let document = Self::open(path)?;

        let mut pages_text = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| PdfError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| PdfError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| PdfError::ExtractionError(e.to_string()))?;

            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        Ok(pages_text.join("\n"))
    }
}

impl PageRasterizer for MupdfBackend {
    fn rasterize_pages(&self, path: &Path) -> Result<Vec<Vec<u8>>, PdfError> {
        let document = Self::open(path)?;
        let matrix = Matrix::new_scale(RASTER_SCALE, RASTER_SCALE);
        let colorspace = Colorspace::device_rgb();

        let mut pngs = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| PdfError::RasterError(e.to_string()))?
        {
            let page = page_result.map_err(|e| PdfError::RasterError(e.to_string()))?;
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, false)
                .map_err(|e| PdfError::RasterError(e.to_string()))?;

            let width = pixmap.width();
            let height = pixmap.height();
            let rgb = image::RgbImage::from_raw(width, height, pixmap.samples().to_vec())
                .ok_or_else(|| {
                    PdfError::RasterError("pixmap buffer size mismatch".to_string())
                })?;

            let mut png = Vec::new();
            image::DynamicImage::ImageRgb8(rgb)
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|e| PdfError::RasterError(e.to_string()))?;
            pngs.push(png);
        }

        Ok(pngs)
    }
}
