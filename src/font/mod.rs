use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use crate::{
    config::RenderConfig,
    data_structures::Matrix,
    error::PdfResult,
    geometry::Path,
    objects::Dictionary,
    Resolve,
};

use self::{
    cid::CidFontSubtype,
    descriptor::FontDescriptor,
    encoding::{BaseEncoding, SimpleEncoding},
    program::FontProgram,
    type0::Type0Font,
};

pub use self::glyph::Glyph;

mod cff;
mod cid;
mod descriptor;
mod encoding;
mod glyph;
mod program;
mod true_type;
mod type0;

#[pdf_enum]
enum FontSubtype {
    /// A composite font -- a font composed of glyphs from a descendant CIDFont
    Type0 = "Type0",

    /// A font that defines glyph shapes using Type 1 font technology
    Type1 = "Type1",

    /// A multiple master font -- an extension of the Type 1 font that allows
    /// the generation of a wide variety of typeface styles from a single font
    MmType1 = "MMType1",

    /// A font that defines glyphs with streams of PDF graphics operators
    Type3 = "Type3",

    /// A font based on the TrueType font format
    TrueType = "TrueType",
}

/// How a font asks its program for a glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GlyphSelector<'a> {
    /// A single byte code of a simple font, with the glyph name the font's encoding gives it
    Simple { code: u8, name: Option<&'a str> },

    /// A CID of a CID-keyed program
    Cid(u32),

    /// A glyph id, already mapped by the PDF
    GlyphId(u16),
}

/// The capability every glyph program backend provides
///
/// Outlines and advances are in glyph space scaled to a 1000 unit em
pub(crate) trait OutlineSource {
    fn glyph_id(&self, selector: GlyphSelector) -> Option<u16>;
    fn outline(&self, glyph_id: u16) -> anyhow::Result<Path>;
    fn advance(&self, glyph_id: u16) -> Option<f32>;
}

#[derive(Debug, Clone)]
pub struct Widths {
    /// The glyph width of `first_char + i`, in thousandths of text space
    widths: Vec<f32>,

    /// The first character code defined in the font's Widths array
    first_char: u32,

    missing_width: f32,
}

impl Widths {
    fn from_dict(dict: &Dictionary, missing_width: f32, resolver: &dyn Resolve) -> PdfResult<Self> {
        let first_char = dict.get_unsigned_integer("FirstChar", resolver)?.unwrap_or(0);
        let widths = dict.get_number_arr("Widths", resolver)?.unwrap_or_default();

        Ok(Self {
            widths,
            first_char,
            missing_width,
        })
    }

    /// `None` for codes outside the `/Widths` array
    pub fn get(&self, code: u32) -> Option<f32> {
        let idx = code.checked_sub(self.first_char)?;

        self.widths.get(usize::try_from(idx).ok()?).copied()
    }

    pub fn missing_width(&self) -> f32 {
        self.missing_width
    }
}

#[derive(Debug)]
enum FontKind {
    Simple {
        encoding: SimpleEncoding,
        widths: Widths,
    },
    Composite(Type0Font),

    /// Widths are in glyph space, mapped to text space by the font matrix
    Type3 { widths: Widths, font_matrix: Matrix },
}

/// A font as selected by `Tf`, caching each glyph the first time its code is shown
#[derive(Debug)]
pub struct Font {
    base_font: String,
    kind: FontKind,
    program: FontProgram,
    glyphs: Mutex<HashMap<u32, Glyph>>,
}

impl Font {
    const TYPE: &'static str = "Font";

    pub fn from_dict(dict: Dictionary, resolver: &dyn Resolve, config: &RenderConfig) -> PdfResult<Self> {
        dict.expect_type(Self::TYPE, resolver, true)?;

        let subtype = FontSubtype::from_str(&dict.expect_name("Subtype", resolver)?)?;

        let (base_font, kind, program) = match subtype {
            FontSubtype::Type0 => {
                let type0 = Type0Font::from_dict(&dict, resolver)?;
                let descendant = &type0.descendant;

                let program = FontProgram::load(
                    descendant
                        .descriptor
                        .as_ref()
                        .and_then(|descriptor| descriptor.font_file.as_ref()),
                    &descendant.base_font,
                    resolver,
                    config,
                );

                (type0.base_font.clone(), FontKind::Composite(type0), program)
            }
            FontSubtype::Type3 => {
                let font_matrix = dict
                    .get_typed::<Matrix>("FontMatrix", resolver)?
                    .unwrap_or_else(|| Matrix::new_scale(0.001, 0.001));
                let widths = Widths::from_dict(&dict, 0.0, resolver)?;

                (
                    dict.get_name("Name", resolver)?.unwrap_or_default(),
                    FontKind::Type3 {
                        widths,
                        font_matrix,
                    },
                    FontProgram::Missing,
                )
            }
            FontSubtype::Type1 | FontSubtype::MmType1 | FontSubtype::TrueType => {
                let base_font = dict.get_name("BaseFont", resolver)?.unwrap_or_default();
                let descriptor = dict
                    .get_dict("FontDescriptor", resolver)?
                    .map(|dict| FontDescriptor::from_dict(dict, resolver))
                    .transpose()?;

                let missing_width = descriptor.as_ref().map_or(0.0, |d| d.missing_width);
                let widths = Widths::from_dict(&dict, missing_width, resolver)?;

                let embedded = descriptor.as_ref().and_then(|d| d.font_file.as_ref());
                let program = FontProgram::load(embedded, &base_font, resolver, config);

                let encoding = match dict.get_object("Encoding", resolver)? {
                    Some(obj) => SimpleEncoding::from_obj(obj, resolver)?,
                    None => SimpleEncoding::default(),
                };

                // a symbolic or embedded font program knows its own encoding, anything else
                // is assumed to be standard Latin text
                let symbolic = descriptor.as_ref().map_or(false, |d| d.flags.is_symbolic());
                let encoding = if symbolic || (embedded.is_some() && subtype != FontSubtype::TrueType) {
                    encoding
                } else {
                    encoding.or_base(BaseEncoding::StandardEncoding)
                };

                (base_font, FontKind::Simple { encoding, widths }, program)
            }
        };

        if program.is_missing() && !matches!(kind, FontKind::Type3 { .. }) {
            log::debug!("{} has no glyph outlines", base_font);
        }

        Ok(Self {
            base_font,
            kind,
            program,
            glyphs: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    pub fn is_vertical(&self) -> bool {
        matches!(&self.kind, FontKind::Composite(type0) if type0.vertical)
    }

    /// Bytes per character code
    fn code_width(&self) -> usize {
        match self.kind {
            FontKind::Composite(..) => 2,
            FontKind::Simple { .. } | FontKind::Type3 { .. } => 1,
        }
    }

    /// Splits a shown string into character codes. A trailing partial code is dropped
    pub fn char_codes(&self, bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks_exact(self.code_width())
            .map(|code| code.iter().fold(0, |acc, &b| (acc << 8) | u32::from(b)))
            .collect()
    }

    /// Word spacing applies to the single byte code 32 only
    pub fn is_word_space(&self, code: u32) -> bool {
        code == 32 && self.code_width() == 1
    }

    fn glyph_cache(&self) -> MutexGuard<'_, HashMap<u32, Glyph>> {
        self.glyphs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The glyph for a character code. Codes with no glyph get an empty outline, never an error
    pub fn glyph(&self, code: u32) -> Glyph {
        if let Some(glyph) = self.glyph_cache().get(&code) {
            return glyph.clone();
        }

        let glyph = self.load_glyph(code);
        self.glyph_cache().insert(code, glyph.clone());

        glyph
    }

    fn load_glyph(&self, code: u32) -> Glyph {
        match &self.kind {
            FontKind::Simple { encoding, widths } => {
                let Ok(byte) = u8::try_from(code) else {
                    return Glyph::empty();
                };

                let pdf_width = widths.get(code);
                let selector = GlyphSelector::Simple {
                    code: byte,
                    name: encoding.glyph_name(byte),
                };

                let (outline, own_width) = self.outline(selector, pdf_width);
                let width = pdf_width.or(own_width).unwrap_or(widths.missing_width());

                Glyph::horizontal(outline, width / 1000.0)
            }
            FontKind::Composite(type0) => {
                let font = &type0.descendant;
                let selector = match font.subtype {
                    CidFontSubtype::CidFontType0 => Some(GlyphSelector::Cid(code)),
                    CidFontSubtype::CidFontType2 => {
                        font.cid_to_gid.glyph_id(code).map(GlyphSelector::GlyphId)
                    }
                };

                let width = font.widths.get(code);
                let outline = match selector {
                    Some(selector) => self.outline(selector, Some(width)).0,
                    None => Path::new(),
                };

                if type0.vertical {
                    let (w1, vx, vy) = font.vertical_metrics.get(code, width);
                    let outline = outline.transformed(Matrix::new_translation(-vx / 1000.0, -vy / 1000.0));

                    Glyph::vertical(outline, w1 / 1000.0)
                } else {
                    Glyph::horizontal(outline, width / 1000.0)
                }
            }
            FontKind::Type3 {
                widths,
                font_matrix,
            } => {
                let width = widths.get(code).unwrap_or(widths.missing_width());

                Glyph::horizontal(Path::new(), width * font_matrix.a)
            }
        }
    }

    /// The outline in text space, widened or narrowed to `pdf_width` when the font dictionary
    /// gives one, along with the program's own advance
    fn outline(&self, selector: GlyphSelector, pdf_width: Option<f32>) -> (Path, Option<f32>) {
        let Some(source) = self.program.source() else {
            return (Path::new(), None);
        };

        let Some(glyph_id) = source.glyph_id(selector) else {
            log::trace!("{}: no glyph for {:?}", self.base_font, selector);
            return (Path::new(), None);
        };

        let own_width = source.advance(glyph_id);

        let mut outline = match source.outline(glyph_id) {
            Ok(outline) => outline,
            Err(err) => {
                log::warn!("{}: glyph {}: {:#}", self.base_font, glyph_id, err);
                return (Path::new(), own_width);
            }
        };

        let x_scale = match (pdf_width, own_width) {
            (Some(pdf), Some(own)) if pdf > 0.0 && own > 0.0 => pdf / own,
            _ => 1.0,
        };

        outline.apply_transform(Matrix::new_scale(x_scale / 1000.0, 1.0 / 1000.0));

        (outline, own_width)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::{PathSegment, Point},
        objects::{Object, Reference},
        resolve::NoResolve,
        test_util::{parse_object, PdfBuilder},
    };

    fn assert_outline(path: &Path, expected: &[(f32, f32)]) {
        let points = path
            .segments()
            .iter()
            .filter_map(|segment| match *segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some(p),
                _ => None,
            })
            .collect::<Vec<Point>>();

        assert_eq!(points.len(), expected.len(), "{:?}", path);
        for (p, &(x, y)) in points.iter().zip(expected) {
            assert!((p.x - x).abs() < 1e-6 && (p.y - y).abs() < 1e-6, "{:?}", path);
        }
    }

    fn dict(src: &[u8]) -> Dictionary {
        match parse_object(src) {
            Object::Dictionary(dict) => dict,
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn undefined_glyph_is_empty_but_advances() {
        let font = Font::from_dict(
            dict(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /FirstChar 65 /Widths [722 667] >>"),
            &NoResolve,
            &RenderConfig::default(),
        )
        .unwrap();

        let glyph = font.glyph(65);
        assert!(glyph.is_blank());
        assert_eq!(glyph.advance, Point::new(0.722, 0.0));

        let glyph = font.glyph(200);
        assert!(glyph.outline.segments().is_empty());
        assert_eq!(glyph.advance, Point::new(0.0, 0.0));
    }

    #[test]
    fn embedded_true_type_is_scaled_to_pdf_width() {
        let pdf = PdfBuilder::new()
            .object(
                5,
                "<< /Type /Font /Subtype /TrueType /BaseFont /ABCDEF+Tri /FirstChar 65 /Widths [300] /FontDescriptor 6 0 R >>",
            )
            .object(6, "<< /Type /FontDescriptor /FontName /ABCDEF+Tri /Flags 32 /FontFile2 7 0 R >>")
            .stream(7, "", &true_type::test::test_font(true))
            .build();
        let store = pdf.store();

        let font_dict = store.assert_dict(Object::Reference(Reference::new(5, 0))).unwrap();
        let font = Font::from_dict(font_dict, &store, &RenderConfig::default()).unwrap();

        let glyph = font.glyph(u32::from(b'A'));
        assert_outline(&glyph.outline, &[(0.0, 0.0), (0.1, 0.0), (0.1, 0.2)]);
        assert_eq!(glyph.outline.segments().last(), Some(&PathSegment::Close));
        assert_eq!(glyph.advance, Point::new(0.3, 0.0));

        // outside /Widths the program's own advance is used
        assert_eq!(font.glyph(u32::from(b'B')).advance, Point::new(0.6, 0.0));
        assert!(font.glyph(u32::from(b'Z')).is_blank());
    }

    #[test]
    fn composite_codes_are_two_bytes() {
        let font = Font::from_dict(
            dict(
                b"<< /Type /Font /Subtype /Type0 /BaseFont /Mincho /Encoding /Identity-V
                   /DescendantFonts [<< /Subtype /CIDFontType0 /BaseFont /Mincho >>] >>",
            ),
            &NoResolve,
            &RenderConfig::default(),
        )
        .unwrap();

        assert!(font.is_vertical());
        assert_eq!(font.char_codes(&[0x01, 0x02, 0x00, 0x20, 0x05]), vec![0x0102, 0x20]);
        assert!(!font.is_word_space(0x20));
        assert_eq!(font.glyph(0x0102).advance, Point::new(0.0, -1.0));
    }

    #[test]
    fn type3_advance_uses_font_matrix() {
        let font = Font::from_dict(
            dict(b"<< /Type /Font /Subtype /Type3 /FontMatrix [0.5 0 0 0.5 0 0] /FirstChar 32 /Widths [1] /CharProcs << >> >>"),
            &NoResolve,
            &RenderConfig::default(),
        )
        .unwrap();

        assert!(font.is_word_space(32));
        assert_eq!(font.glyph(32).advance, Point::new(0.5, 0.0));
    }
}
