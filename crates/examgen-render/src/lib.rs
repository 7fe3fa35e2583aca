//! Renders a generated paper to PDF.
//!
//! Output is a plain A4 document with an optional institution header
//! (title, subtitle, detail lines, logo image) followed by the paper
//! body in a fixed-width layout with word wrapping and pagination.
//! Text is encoded in the base-font character sets, so code points
//! outside Latin-1 are replaced with '?'.

use thiserror::Error;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to assemble PDF: {0}")]
    Assembly(String),
    #[error("invalid logo image: {0}")]
    Logo(String),
}

/// A4 in PDF points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;

const BODY_FONT_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 15.0;

/// Approximate glyph advance for Helvetica as a fraction of font size.
/// Used for word wrapping; slightly generous so lines never overflow.
const CHAR_WIDTH_RATIO: f32 = 0.5;

const LOGO_MAX_HEIGHT: f32 = 60.0;

/// Visual role of one header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// Bold, large. Typically the institution name.
    Title,
    /// Bold, medium. Typically the exam title.
    Subtitle,
    /// Regular, small. Course codes, date, duration, marks.
    Details,
}

#[derive(Debug, Clone)]
pub struct HeaderLine {
    pub text: String,
    pub style: HeaderStyle,
}

impl HeaderLine {
    fn font_size(&self) -> f32 {
        match self.style {
            HeaderStyle::Title => 16.0,
            HeaderStyle::Subtitle => 13.0,
            HeaderStyle::Details => 10.0,
        }
    }

    fn is_bold(&self) -> bool {
        matches!(self.style, HeaderStyle::Title | HeaderStyle::Subtitle)
    }
}

/// Header block placed on the first page.
#[derive(Debug, Clone, Default)]
pub struct HeaderConfig {
    pub lines: Vec<HeaderLine>,
    /// PNG bytes of a logo, centered above the header lines.
    pub logo_png: Option<Vec<u8>>,
}

impl HeaderConfig {
    /// Turn free-form refined header lines into styled ones: first line
    /// title, second subtitle, the rest details. Headers are at most
    /// four lines; anything past that is dropped.
    pub fn from_lines(lines: &[String]) -> Self {
        let styled = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .take(4)
            .enumerate()
            .map(|(i, l)| HeaderLine {
                text: l.trim().to_string(),
                style: match i {
                    0 => HeaderStyle::Title,
                    1 => HeaderStyle::Subtitle,
                    _ => HeaderStyle::Details,
                },
            })
            .collect();
        Self {
            lines: styled,
            logo_png: None,
        }
    }
}

/// Render paper text to a PDF byte buffer.
pub fn render_paper(text: &str, header: &HeaderConfig) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let font_bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let logo = match &header.logo_png {
        Some(png) => Some(add_logo_xobject(&mut doc, png)?),
        None => None,
    };

    let mut resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_regular,
            "F2" => font_bold,
        },
    };
    if let Some(logo) = &logo {
        resources.set(
            "XObject",
            dictionary! {
                "Logo" => logo.id,
            },
        );
    }
    let resources_id = doc.add_object(resources);

    // Lay out pages: the first carries the header, the rest only body.
    let wrap_width = ((PAGE_WIDTH - 2.0 * MARGIN) / (BODY_FONT_SIZE * CHAR_WIDTH_RATIO)) as usize;
    let body_lines: Vec<String> = text
        .lines()
        .flat_map(|line| wrap_line(&strip_markup(line), wrap_width))
        .collect();

    let mut page_ids = Vec::new();
    let mut remaining = body_lines.as_slice();
    let mut first_page = true;

    loop {
        let mut ops = Vec::new();
        let mut cursor = PAGE_HEIGHT - MARGIN;

        if first_page {
            cursor = emit_header(&mut ops, header, logo.as_ref(), cursor);
        }

        let lines_that_fit = ((cursor - MARGIN) / LINE_HEIGHT).max(0.0) as usize;
        let (chunk, rest) = remaining.split_at(lines_that_fit.min(remaining.len()));
        remaining = rest;

        for line in chunk {
            cursor -= LINE_HEIGHT;
            emit_text(&mut ops, "F1", BODY_FONT_SIZE, MARGIN, cursor, line);
        }

        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content
                .encode()
                .map_err(|e| RenderError::Assembly(e.to_string()))?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        });
        page_ids.push(page_id.into());

        first_page = false;
        if remaining.is_empty() {
            break;
        }
    }

    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Assembly(e.to_string()))?;
    Ok(buffer)
}

struct LogoXObject {
    id: lopdf::ObjectId,
    width: f32,
    height: f32,
}

/// Decode the PNG and embed it as an uncompressed RGB image XObject.
fn add_logo_xobject(doc: &mut Document, png: &[u8]) -> Result<LogoXObject, RenderError> {
    let decoded = image::load_from_memory(png)
        .map_err(|e| RenderError::Logo(e.to_string()))?
        .to_rgb8();
    let (width, height) = decoded.dimensions();

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        decoded.into_raw(),
    );
    let id = doc.add_object(stream);

    // Scale down to the header slot, preserving aspect ratio.
    let scale = (LOGO_MAX_HEIGHT / height as f32).min(1.0);
    Ok(LogoXObject {
        id,
        width: width as f32 * scale,
        height: height as f32 * scale,
    })
}

/// Emit the header block, returning the new vertical cursor.
fn emit_header(
    ops: &mut Vec<Operation>,
    header: &HeaderConfig,
    logo: Option<&LogoXObject>,
    mut cursor: f32,
) -> f32 {
    if let Some(logo) = logo {
        cursor -= logo.height;
        let x = (PAGE_WIDTH - logo.width) / 2.0;
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                logo.width.into(),
                0.into(),
                0.into(),
                logo.height.into(),
                x.into(),
                cursor.into(),
            ],
        ));
        ops.push(Operation::new("Do", vec!["Logo".into()]));
        ops.push(Operation::new("Q", vec![]));
        cursor -= 10.0;
    }

    for line in &header.lines {
        let size = line.font_size();
        cursor -= size + 6.0;
        let font = if line.is_bold() { "F2" } else { "F1" };
        // Center using the same advance approximation as wrapping.
        let text_width = line.text.chars().count() as f32 * size * CHAR_WIDTH_RATIO;
        let x = ((PAGE_WIDTH - text_width) / 2.0).max(MARGIN);
        emit_text(ops, font, size, x, cursor, &line.text);
    }

    if !header.lines.is_empty() || logo.is_some() {
        cursor -= 14.0;
    }
    cursor
}

fn emit_text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(sanitize(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Replace code points the base fonts cannot encode.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 256 { c } else { '?' })
        .collect()
}

/// Markdown heading markers read poorly in a flat PDF layout.
fn strip_markup(line: &str) -> String {
    line.trim_start_matches('#').trim().to_string()
}

/// Greedy word wrap to `width` characters, never splitting words.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}
