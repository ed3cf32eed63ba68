//! Fixed-page rendering: blocks → paginated PDF.
//!
//! ## Layout model
//!
//! A single cursor walks down the page from `height - margin_y`. Each wrapped
//! line is drawn at the cursor and moves it down by `size × 1.5`; when the
//! cursor drops below `margin_y` the page is closed and a fresh one begins.
//! Blocks add a fixed trailing gap (blank 12, heading 6, bullet 4,
//! paragraph 8).
//!
//! Layout talks to a [`Canvas`] rather than to `lopdf` directly. A canvas
//! forgets its font when a page is shown, so the layout must reselect the font
//! after every page break; [`PdfCanvas`] refuses to draw text otherwise.
//!
//! ## PDF output
//!
//! Built-in fonts are referenced by name with WinAnsiEncoding. TrueType fonts
//! are embedded whole as a Type0/CIDFontType2 pair with Identity-H encoding,
//! so each character is written as its two-byte glyph id; a `ToUnicode` map
//! keeps the text searchable and copyable.

use crate::error::LegalDocsError;
use crate::pipeline::fonts::{FontProgram, Glyph, RegisteredFont, TrueTypeFont};
use crate::pipeline::normalize::Block;
use crate::pipeline::wrap::{wrap, TextMeasure};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

// ── Geometry and layout constants ────────────────────────────────────────────

/// Page size and margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_x: f32,
    pub margin_y: f32,
}

impl Default for PageGeometry {
    /// A4 with 50pt side margins and 60pt top/bottom margins.
    fn default() -> Self {
        Self {
            width: 595.2756,
            height: 841.8898,
            margin_x: 50.0,
            margin_y: 60.0,
        }
    }
}

impl PageGeometry {
    /// Usable line width between the side margins.
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin_x
    }

    /// Cursor position of the first line on a page.
    pub fn top(&self) -> f32 {
        self.height - self.margin_y
    }
}

pub const BODY_FONT_SIZE: f32 = 11.0;
pub const LINE_HEIGHT_FACTOR: f32 = 1.5;
pub const BLANK_GAP: f32 = 12.0;
pub const HEADING_GAP: f32 = 6.0;
pub const BULLET_GAP: f32 = 4.0;
pub const PARAGRAPH_GAP: f32 = 8.0;
pub const BULLET_INDENT_STEP: f32 = 18.0;
pub const BULLET_TEXT_OFFSET: f32 = 12.0;
pub const BULLET_GLYPH: &str = "\u{2022}";

/// Font size for a heading level; levels past 3 share the default size.
pub fn heading_font_size(level: usize) -> f32 {
    match level {
        1 => 18.0,
        2 => 15.0,
        3 => 13.0,
        _ => 12.0,
    }
}

/// Horizontal placement of one bullet block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletPlacement {
    /// Where the bullet glyph is drawn.
    pub bullet_x: f32,
    /// Where the item text (and its continuation lines) start.
    pub text_x: f32,
    /// Width available to the wrapped text.
    pub wrap_width: f32,
}

pub fn bullet_placement(indent: usize, geometry: &PageGeometry) -> BulletPlacement {
    let nesting = indent as f32 * BULLET_INDENT_STEP;
    let bullet_x = geometry.margin_x + nesting;
    BulletPlacement {
        bullet_x,
        text_x: bullet_x + BULLET_TEXT_OFFSET,
        wrap_width: geometry.content_width() - nesting - BULLET_TEXT_OFFSET,
    }
}

// ── Canvas ───────────────────────────────────────────────────────────────────

/// A page-at-a-time drawing surface bound to one font.
///
/// Font state is per page: after [`Canvas::show_page`] no font is selected.
pub trait Canvas {
    /// Select the document font at `size` points for subsequent text.
    fn set_font(&mut self, size: f32) -> Result<(), LegalDocsError>;

    /// Draw `text` with its baseline starting at (`x`, `y`).
    fn draw_string(&mut self, x: f32, y: f32, text: &str) -> Result<(), LegalDocsError>;

    /// Close the current page and start a new one.
    fn show_page(&mut self) -> Result<(), LegalDocsError>;
}

struct PageCursor {
    y: f32,
    top: f32,
    bottom: f32,
    pages: usize,
}

impl PageCursor {
    fn new(geometry: &PageGeometry) -> Self {
        Self {
            y: geometry.top(),
            top: geometry.top(),
            bottom: geometry.margin_y,
            pages: 1,
        }
    }

    /// Move down by `amount`, breaking the page if the cursor leaves the
    /// content area. Returns whether a break happened.
    fn advance<C: Canvas + ?Sized>(&mut self, canvas: &mut C, amount: f32) -> Result<bool, LegalDocsError> {
        self.y -= amount;
        if self.y < self.bottom {
            canvas.show_page()?;
            self.y = self.top;
            self.pages += 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Move past one drawn line, reselecting the font on a new page.
    fn advance_line<C: Canvas + ?Sized>(&mut self, canvas: &mut C, size: f32) -> Result<(), LegalDocsError> {
        if self.advance(canvas, size * LINE_HEIGHT_FACTOR)? {
            canvas.set_font(size)?;
        }
        Ok(())
    }
}

/// Lay `blocks` out on `canvas`, breaking pages as needed.
///
/// Returns the number of pages started. When the final line forces a break
/// the last of these pages is empty.
pub fn lay_out<C: Canvas + ?Sized>(
    blocks: &[Block],
    canvas: &mut C,
    font: &dyn TextMeasure,
    geometry: &PageGeometry,
) -> Result<usize, LegalDocsError> {
    let mut cursor = PageCursor::new(geometry);
    let content_width = geometry.content_width();

    for block in blocks {
        match block {
            Block::Blank => {
                cursor.advance(canvas, BLANK_GAP)?;
            }
            Block::Heading { level, text } => {
                let size = heading_font_size(*level);
                canvas.set_font(size)?;
                for line in wrap(text, font, size, content_width) {
                    canvas.draw_string(geometry.margin_x, cursor.y, &line)?;
                    cursor.advance_line(canvas, size)?;
                }
                cursor.y -= HEADING_GAP;
            }
            Block::Bullet { text, indent } => {
                let size = BODY_FONT_SIZE;
                let place = bullet_placement(*indent, geometry);
                canvas.set_font(size)?;
                let mut lines = wrap(text, font, size, place.wrap_width);
                if lines.is_empty() {
                    lines.push(String::new());
                }
                for (idx, line) in lines.iter().enumerate() {
                    if idx == 0 {
                        canvas.draw_string(place.bullet_x, cursor.y, BULLET_GLYPH)?;
                    }
                    canvas.draw_string(place.text_x, cursor.y, line)?;
                    cursor.advance_line(canvas, size)?;
                }
                cursor.y -= BULLET_GAP;
            }
            Block::Paragraph { text } => {
                let size = BODY_FONT_SIZE;
                canvas.set_font(size)?;
                for line in wrap(text, font, size, content_width) {
                    canvas.draw_string(geometry.margin_x, cursor.y, &line)?;
                    cursor.advance_line(canvas, size)?;
                }
                cursor.y -= PARAGRAPH_GAP;
            }
        }
    }
    Ok(cursor.pages)
}

// ── lopdf canvas ─────────────────────────────────────────────────────────────

const FONT_RESOURCE: &str = "F1";

/// What [`render_pages`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PdfSummary {
    pub pages: usize,
    pub bytes: u64,
}

/// A [`Canvas`] that builds a PDF object graph with `lopdf`.
pub struct PdfCanvas<'f> {
    font: &'f RegisteredFont,
    geometry: PageGeometry,
    document: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
    operations: Vec<Operation>,
    page_has_text: bool,
    active_size: Option<f32>,
    used_glyphs: BTreeMap<u16, Glyph>,
    title: Option<String>,
}

impl<'f> PdfCanvas<'f> {
    pub fn new(font: &'f RegisteredFont, geometry: PageGeometry) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        let font_id = document.new_object_id();
        Self {
            font,
            geometry,
            document,
            pages_id,
            font_id,
            page_ids: Vec::new(),
            operations: Vec::new(),
            page_has_text: false,
            active_size: None,
            used_glyphs: BTreeMap::new(),
            title: None,
        }
    }

    /// Document title recorded in the `/Info` dictionary.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn encode_text(&mut self, text: &str) -> Object {
        match self.font.program() {
            FontProgram::Standard(font) => Object::String(font.encode(text), StringFormat::Literal),
            FontProgram::TrueType(font) => {
                let glyphs = font.glyphs(text);
                let mut bytes = Vec::with_capacity(glyphs.len() * 2);
                for glyph in glyphs {
                    bytes.extend_from_slice(&glyph.id.to_be_bytes());
                    self.used_glyphs.entry(glyph.id).or_insert(glyph);
                }
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }

    fn flush_page(&mut self) -> Result<(), LegalDocsError> {
        let content = Content {
            operations: std::mem::take(&mut self.operations),
        };
        let encoded = content.encode().map_err(|e| LegalDocsError::Internal(format!("content stream: {e}")))?;
        let stream = Stream::new(dictionary! { "Filter" => "FlateDecode" }, deflate(&encoded)?);
        let content_id = self.document.add_object(stream);

        let page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), self.geometry.width.into(), self.geometry.height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { FONT_RESOURCE => self.font_id },
            },
        };
        let page_id = self.document.add_object(page);
        self.page_ids.push(page_id);
        self.page_has_text = false;
        self.active_size = None;
        Ok(())
    }

    /// Close the last page and write the document to `path`.
    ///
    /// A final page with no text (left over from a break after the last
    /// line) is dropped, but a document always has at least one page.
    pub fn save(mut self, path: &Path) -> Result<PdfSummary, LegalDocsError> {
        if self.page_has_text || self.page_ids.is_empty() {
            self.flush_page()?;
        }

        let font_object = match self.font.program() {
            FontProgram::Standard(font) => Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            }),
            FontProgram::TrueType(font) => {
                Object::Dictionary(embed_true_type(&mut self.document, font, &self.used_glyphs)?)
            }
        };
        self.document.objects.insert(self.font_id, font_object);

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let page_count = kids.len();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal(concat!("legal-docs ", env!("CARGO_PKG_VERSION"))),
        };
        if let Some(title) = &self.title {
            info.set("Title", text_string(title));
        }
        let info_id = self.document.add_object(info);
        self.document.trailer.set("Info", info_id);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LegalDocsError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        let mut buffer = Vec::new();
        self.document
            .save_to(&mut buffer)
            .map_err(|e| LegalDocsError::PdfWriteFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        std::fs::write(path, &buffer).map_err(|e| LegalDocsError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let bytes = buffer.len() as u64;
        debug!("Wrote {} ({} pages, {} bytes)", path.display(), page_count, bytes);
        Ok(PdfSummary {
            pages: page_count,
            bytes,
        })
    }
}

impl Canvas for PdfCanvas<'_> {
    fn set_font(&mut self, size: f32) -> Result<(), LegalDocsError> {
        self.active_size = Some(size);
        Ok(())
    }

    fn draw_string(&mut self, x: f32, y: f32, text: &str) -> Result<(), LegalDocsError> {
        let size = self.active_size.ok_or_else(|| {
            LegalDocsError::Internal(format!(
                "text drawn on page {} before a font was selected",
                self.page_ids.len() + 1
            ))
        })?;
        if text.is_empty() {
            return Ok(());
        }
        let encoded = self.encode_text(text);
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), size.into()],
        ));
        self.operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(Operation::new("Tj", vec![encoded]));
        self.operations.push(Operation::new("ET", vec![]));
        self.page_has_text = true;
        Ok(())
    }

    fn show_page(&mut self) -> Result<(), LegalDocsError> {
        self.flush_page()
    }
}

/// Lay out `blocks` and write them as a PDF to `output_path`.
pub fn render_pages(
    blocks: &[Block],
    output_path: &Path,
    font: &RegisteredFont,
    geometry: &PageGeometry,
) -> Result<PdfSummary, LegalDocsError> {
    let mut canvas = PdfCanvas::new(font, *geometry);
    let title = blocks.iter().find_map(|b| match b {
        Block::Heading { text, .. } if !text.is_empty() => Some(text.as_str()),
        _ => None,
    });
    if let Some(title) = title {
        canvas.set_title(title);
    }

    lay_out(blocks, &mut canvas, font, geometry)?;
    let summary = canvas.save(output_path)?;
    info!(
        "Rendered {} blocks onto {} pages in {} → {}",
        blocks.len(),
        summary.pages,
        font.name(),
        output_path.display()
    );
    Ok(summary)
}

// ── PDF helpers ──────────────────────────────────────────────────────────────

fn deflate(data: &[u8]) -> Result<Vec<u8>, LegalDocsError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| LegalDocsError::Internal(format!("deflate: {e}")))?;
    encoder
        .finish()
        .map_err(|e| LegalDocsError::Internal(format!("deflate: {e}")))
}

/// A PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Add the descendant font, descriptor, font file and ToUnicode map for an
/// embedded TrueType font and return its Type0 dictionary.
fn embed_true_type(
    document: &mut Document,
    font: &TrueTypeFont,
    used_glyphs: &BTreeMap<u16, Glyph>,
) -> Result<Dictionary, LegalDocsError> {
    let base_font = font.postscript_name().to_string();

    let font_file = Stream::new(
        dictionary! {
            "Length1" => font.data().len() as i64,
            "Filter" => "FlateDecode",
        },
        deflate(font.data())?,
    );
    let font_file_id = document.add_object(font_file);

    let [x_min, y_min, x_max, y_max] = font.bbox();
    let scaled = |v: i16| Object::Integer(i64::from(font.to_pdf_units(i32::from(v))));
    let descriptor_id = document.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => base_font.clone(),
        "Flags" => 4,
        "FontBBox" => vec![scaled(x_min), scaled(y_min), scaled(x_max), scaled(y_max)],
        "ItalicAngle" => 0,
        "Ascent" => scaled(font.ascent()),
        "Descent" => scaled(font.descent()),
        "CapHeight" => scaled(font.cap_height()),
        "StemV" => 80,
        "FontFile2" => font_file_id,
    });

    let mut widths = Vec::with_capacity(used_glyphs.len() * 2);
    for (id, glyph) in used_glyphs {
        widths.push(Object::Integer(i64::from(*id)));
        widths.push(Object::Array(vec![Object::Integer(i64::from(
            font.to_pdf_units(i32::from(glyph.advance)),
        ))]));
    }

    let cid_font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => base_font.clone(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "CIDToGIDMap" => "Identity",
        "DW" => 1000,
        "W" => widths,
    });

    let cmap = to_unicode_cmap(used_glyphs);
    let to_unicode_id = document.add_object(Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        deflate(cmap.as_bytes())?,
    ));

    Ok(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => base_font,
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

fn to_unicode_cmap(used_glyphs: &BTreeMap<u16, Glyph>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let mapped: Vec<&Glyph> = used_glyphs.values().filter(|g| g.id != 0).collect();
    // bfchar sections are limited to 100 entries each.
    for chunk in mapped.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for glyph in chunk {
            let mut buf = [0u16; 2];
            let unicode: String = glyph
                .ch
                .encode_utf16(&mut buf)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", glyph.id, unicode));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}
