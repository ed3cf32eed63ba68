//! Font resolution and metrics.
//!
//! Two kinds of font reach the page renderer:
//!
//! * **Built-in PDF fonts** (`Helvetica`, `Courier` and their oblique/bold
//!   variants). Every viewer ships these, so nothing is embedded; widths come
//!   from the Adobe font metrics compiled into this module.
//! * **TrueType/OpenType files** configured with a `font_path` (e.g. a CJK
//!   face for the Chinese documents). These are parsed with `ttf-parser`,
//!   measured with their real advances and embedded into the PDF.
//!
//! Fonts are registered in a [`FontRegistry`] keyed by identifier.
//! Registration is idempotent: once a name is known the file is never read
//! again, even if the path has since disappeared.

use crate::error::LegalDocsError;
use crate::pipeline::wrap::TextMeasure;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use ttf_parser::{Face, GlyphId};

// ── Built-in fonts ───────────────────────────────────────────────────────────

/// Base-14 PDF fonts with known metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaOblique,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// Look up a built-in font by its PDF base-font name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Helvetica" => Some(Self::Helvetica),
            "Helvetica-Oblique" => Some(Self::HelveticaOblique),
            "Courier" => Some(Self::Courier),
            "Courier-Bold" => Some(Self::CourierBold),
            "Courier-Oblique" => Some(Self::CourierOblique),
            "Courier-BoldOblique" => Some(Self::CourierBoldOblique),
            _ => None,
        }
    }

    /// The `/BaseFont` name written into the PDF.
    pub fn base_font(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Advance width of a WinAnsi code in 1/1000 em.
    pub fn glyph_width(self, code: u8) -> u16 {
        match self {
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                600
            }
            Self::Helvetica | Self::HelveticaOblique => helvetica_width(code),
        }
    }

    /// Encode `text` as WinAnsi bytes; characters outside the encoding become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        text.chars().map(|c| win_ansi_code(c).unwrap_or(b'?')).collect()
    }
}

/// Helvetica widths for the printable ASCII range 32..=126.
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a..z
    334, 260, 334, 584, // {..~
];

/// Helvetica widths for WinAnsi codes 0x80..=0xFF. Unassigned codes are 0.
const HELVETICA_HIGH_WIDTHS: [u16; 128] = [
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0, // 0x80
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667, // 0x90
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xF0
];

fn helvetica_width(code: u8) -> u16 {
    match code {
        32..=126 => HELVETICA_ASCII_WIDTHS[(code - 32) as usize],
        0x80..=0xFF => HELVETICA_HIGH_WIDTHS[(code - 0x80) as usize],
        _ => 0,
    }
}

/// Map a character to its WinAnsiEncoding code.
pub fn win_ansi_code(c: char) -> Option<u8> {
    let code = match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(code)
}

// ── TrueType fonts ───────────────────────────────────────────────────────────

/// A parsed TrueType/OpenType font program, kept whole for embedding.
pub struct TrueTypeFont {
    postscript_name: String,
    data: Vec<u8>,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("postscript_name", &self.postscript_name)
            .field("bytes", &self.data.len())
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

/// A glyph resolved for one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub id: u16,
    /// Horizontal advance in font units.
    pub advance: u16,
}

impl TrueTypeFont {
    /// Parse `data`, falling back to `fallback_name` when the font has no
    /// usable PostScript name.
    pub fn from_bytes(data: Vec<u8>, fallback_name: &str) -> Result<Self, ttf_parser::FaceParsingError> {
        let face = Face::parse(&data, 0)?;
        let postscript_name = postscript_name(&face)
            .unwrap_or_else(|| fallback_name.chars().filter(|c| !c.is_whitespace()).collect());
        let rect = face.global_bounding_box();
        let ascent = face.ascender();
        let descent = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascent);
        let units_per_em = face.units_per_em();
        let bbox = [rect.x_min, rect.y_min, rect.x_max, rect.y_max];
        drop(face);

        Ok(Self {
            postscript_name,
            data,
            units_per_em,
            ascent,
            descent,
            cap_height,
            bbox,
        })
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn ascent(&self) -> i16 {
        self.ascent
    }

    pub fn descent(&self) -> i16 {
        self.descent
    }

    pub fn cap_height(&self) -> i16 {
        self.cap_height
    }

    pub fn bbox(&self) -> [i16; 4] {
        self.bbox
    }

    /// Scale a value in font units to 1/1000 em.
    pub fn to_pdf_units(&self, value: i32) -> i32 {
        value * 1000 / i32::from(self.units_per_em.max(1))
    }

    /// Resolve every character of `text` to a glyph. Missing characters map
    /// to glyph 0 (`.notdef`).
    pub fn glyphs(&self, text: &str) -> Vec<Glyph> {
        // The bytes were validated in `from_bytes`.
        let Ok(face) = Face::parse(&self.data, 0) else {
            return Vec::new();
        };
        text.chars()
            .map(|ch| {
                let id = face.glyph_index(ch).unwrap_or(GlyphId(0));
                Glyph {
                    ch,
                    id: id.0,
                    advance: face.glyph_hor_advance(id).unwrap_or(0),
                }
            })
            .collect()
    }
}

fn postscript_name(face: &Face<'_>) -> Option<String> {
    let lookup = |id: u16| {
        face.names()
            .into_iter()
            .find(|n| n.name_id == id)
            .and_then(|n| n.to_string())
            .map(|s| s.replace(' ', ""))
            .filter(|s| !s.is_empty())
    };
    lookup(ttf_parser::name_id::POST_SCRIPT_NAME)
        .or_else(|| lookup(ttf_parser::name_id::FULL_NAME))
        .or_else(|| lookup(ttf_parser::name_id::FAMILY))
}

// ── Registered fonts ─────────────────────────────────────────────────────────

/// The font program behind a registered identifier.
#[derive(Debug)]
pub enum FontProgram {
    Standard(StandardFont),
    TrueType(TrueTypeFont),
}

/// A font ready for measuring and drawing.
#[derive(Debug)]
pub struct RegisteredFont {
    name: String,
    program: FontProgram,
}

impl RegisteredFont {
    pub fn new(name: impl Into<String>, program: FontProgram) -> Self {
        Self {
            name: name.into(),
            program,
        }
    }

    /// The identifier the font was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &FontProgram {
        &self.program
    }

    /// Whether the font program must be embedded into the PDF.
    pub fn is_embedded(&self) -> bool {
        matches!(self.program, FontProgram::TrueType(_))
    }
}

impl TextMeasure for RegisteredFont {
    fn string_width(&self, text: &str, size: f32) -> f32 {
        match &self.program {
            FontProgram::Standard(font) => {
                let units: u32 = font
                    .encode(text)
                    .into_iter()
                    .map(|code| u32::from(font.glyph_width(code)))
                    .sum();
                units as f32 * size / 1000.0
            }
            FontProgram::TrueType(font) => {
                let units: u32 = font.glyphs(text).iter().map(|g| u32::from(g.advance)).sum();
                units as f32 * size / f32::from(font.units_per_em().max(1))
            }
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────────────────

/// Turns a font file into a [`FontProgram`].
///
/// The registry calls this at most once per identifier.
pub trait FontLoader {
    fn load(&self, name: &str, path: &Path) -> Result<FontProgram, LegalDocsError>;
}

/// Reads TrueType/OpenType files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFontLoader;

impl FontLoader for FileFontLoader {
    fn load(&self, name: &str, path: &Path) -> Result<FontProgram, LegalDocsError> {
        if !path.exists() {
            return Err(LegalDocsError::FontNotFound {
                path: path.to_path_buf(),
            });
        }
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LegalDocsError::FontNotFound {
                path: path.to_path_buf(),
            },
            _ => LegalDocsError::InvalidFont {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })?;
        let font = TrueTypeFont::from_bytes(data, name).map_err(|e| LegalDocsError::InvalidFont {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        debug!(
            "Parsed font '{}' ({}, {} units/em)",
            name,
            font.postscript_name(),
            font.units_per_em()
        );
        Ok(FontProgram::TrueType(font))
    }
}

/// Fonts registered for the lifetime of a publishing run, keyed by identifier.
pub struct FontRegistry {
    fonts: HashMap<String, Arc<RegisteredFont>>,
    loader: Box<dyn FontLoader>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.fonts.keys().collect();
        names.sort();
        f.debug_struct("FontRegistry")
            .field("fonts", &names)
            .field("loader", &"<dyn FontLoader>")
            .finish()
    }
}

impl FontRegistry {
    /// A registry that loads font files from disk.
    pub fn new() -> Self {
        Self::with_loader(FileFontLoader)
    }

    pub fn with_loader(loader: impl FontLoader + 'static) -> Self {
        Self {
            fonts: HashMap::new(),
            loader: Box::new(loader),
        }
    }

    /// Resolve `name`, registering it on first use.
    ///
    /// Resolution order:
    /// 1. an identifier registered earlier is returned as-is
    /// 2. a built-in PDF font name needs no file (`path` is ignored)
    /// 3. otherwise `path` is loaded once through the [`FontLoader`]
    pub fn ensure(
        &mut self,
        name: &str,
        path: Option<&Path>,
    ) -> Result<Arc<RegisteredFont>, LegalDocsError> {
        if let Some(font) = self.fonts.get(name) {
            return Ok(Arc::clone(font));
        }

        let program = match (StandardFont::from_name(name), path) {
            (Some(standard), _) => FontProgram::Standard(standard),
            (None, Some(path)) => {
                info!("Registering font '{}' from {}", name, path.display());
                self.loader.load(name, path)?
            }
            (None, None) => {
                return Err(LegalDocsError::UnknownFont {
                    name: name.to_string(),
                })
            }
        };

        let font = Arc::new(RegisteredFont::new(name, program));
        self.fonts.insert(name.to_string(), Arc::clone(&font));
        Ok(font)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.fonts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts loads and hands back Courier metrics under any name.
    struct CountingLoader {
        calls: Rc<Cell<usize>>,
    }

    impl FontLoader for CountingLoader {
        fn load(&self, _name: &str, _path: &Path) -> Result<FontProgram, LegalDocsError> {
            self.calls.set(self.calls.get() + 1);
            Ok(FontProgram::Standard(StandardFont::Courier))
        }
    }

    #[test]
    fn test_registration_is_idempotent() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = FontRegistry::with_loader(CountingLoader {
            calls: Rc::clone(&calls),
        });
        let path = Path::new("/fonts/simhei.ttf");

        assert!(registry.is_empty());
        let first = registry.ensure("SimHei", Some(path)).unwrap();
        let second = registry.ensure("SimHei", Some(path)).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registered_font_ignores_later_path() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = FontRegistry::with_loader(CountingLoader {
            calls: Rc::clone(&calls),
        });
        registry.ensure("SimHei", Some(Path::new("a.ttf"))).unwrap();
        registry.ensure("SimHei", None).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_builtin_font_needs_no_file() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = FontRegistry::with_loader(CountingLoader {
            calls: Rc::clone(&calls),
        });
        let font = registry
            .ensure("Helvetica", Some(Path::new("/nowhere/helvetica.ttf")))
            .unwrap();
        assert_eq!(calls.get(), 0);
        assert!(!font.is_embedded());
    }

    #[test]
    fn test_unknown_font_without_path() {
        let mut registry = FontRegistry::new();
        let err = registry.ensure("SimHei", None).unwrap_err();
        assert!(matches!(err, LegalDocsError::UnknownFont { .. }), "got: {err}");
    }

    #[test]
    fn test_missing_font_file_is_not_found() {
        let mut registry = FontRegistry::new();
        let path = Path::new("/definitely/not/here/simhei.ttf");
        let err = registry.ensure("SimHei", Some(path)).unwrap_err();
        match err {
            LegalDocsError::FontNotFound { path: p } => assert_eq!(p, path),
            other => panic!("expected FontNotFound, got {other}"),
        }
        assert!(!registry.is_registered("SimHei"));
    }

    #[test]
    fn test_invalid_font_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let mut registry = FontRegistry::new();
        let err = registry.ensure("Broken", Some(&path)).unwrap_err();
        assert!(matches!(err, LegalDocsError::InvalidFont { .. }), "got: {err}");
    }

    #[test]
    fn test_helvetica_widths() {
        let font = RegisteredFont::new("Helvetica", FontProgram::Standard(StandardFont::Helvetica));
        // "Hi" = 722 + 222
        assert!((font.string_width("Hi", 10.0) - 9.44).abs() < 1e-4);
        assert_eq!(font.string_width("", 12.0), 0.0);
    }

    #[test]
    fn test_helvetica_latin1_and_cp1252_widths() {
        let font = RegisteredFont::new("Helvetica", FontProgram::Standard(StandardFont::Helvetica));
        for (text, width) in [
            ("©", 737.0),
            ("í", 278.0),
            ("Œ", 1000.0),
            ("‰", 1000.0),
            ("‚", 222.0),
            ("é", 556.0),
            ("Æ", 1000.0),
            ("ø", 611.0),
            ("¶", 537.0),
            ("ÿ", 500.0),
        ] {
            assert_eq!(font.string_width(text, 1000.0), width, "{text}");
        }
    }

    #[test]
    fn test_courier_is_monospaced() {
        let font = RegisteredFont::new("Courier", FontProgram::Standard(StandardFont::Courier));
        assert!((font.string_width("iiii", 10.0) - font.string_width("WWWW", 10.0)).abs() < 1e-6);
        assert!((font.string_width("abc", 10.0) - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(StandardFont::Helvetica.encode("A•é"), vec![b'A', 0x95, 0xE9]);
        assert_eq!(StandardFont::Helvetica.encode("条"), vec![b'?']);
    }

    #[test]
    fn test_unencodable_measures_as_question_mark() {
        let font = RegisteredFont::new("Helvetica", FontProgram::Standard(StandardFont::Helvetica));
        assert_eq!(font.string_width("条", 10.0), font.string_width("?", 10.0));
    }
}
