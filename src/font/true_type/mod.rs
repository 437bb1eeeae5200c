//! Outlines from TrueType font programs, as embedded by `FontFile2`
//!
//! Only the tables needed to map character codes to glyphs and to build their outlines are
//! read. Hinting instructions are skipped.

mod parse;
mod table;

use std::ops::Range;

use bytes::Bytes;

use crate::{
    data_structures::Matrix,
    font::{encoding::unicode_for_name, GlyphSelector, OutlineSource},
    geometry::Path,
};

use self::{
    parse::TrueTypeParser,
    table::{
        CmapTable, FontDirectory, HorizontalMetrics, LocaTable, PostTable, TableTag,
        TrueTypeGlyph,
    },
};

/// Compound glyphs nest at most this deep
const MAX_COMPONENT_DEPTH: usize = 8;

#[derive(Debug)]
pub(crate) struct TrueTypeFont {
    data: Bytes,
    units_per_em: u16,
    num_glyphs: u16,
    loca: LocaTable,

    /// Location of the `glyf` table
    glyf: Range<usize>,
    metrics: HorizontalMetrics,
    cmap: Option<CmapTable>,
    post: Option<PostTable>,
}

impl TrueTypeFont {
    pub fn parse(data: Bytes) -> anyhow::Result<Self> {
        let mut parser = TrueTypeParser::new(&data);
        let directory = parser.read_font_directory()?;
        let len = data.len();

        let required = |tag: TableTag| {
            directory
                .table_range(tag, len)
                .ok_or(anyhow::anyhow!("missing {:?} table", tag))
        };

        let head = parser.read_head_table(required(TableTag::HEAD)?)?;
        let maxp = parser.read_maxp_table(required(TableTag::MAXP)?)?;
        let loca = parser.read_loca_table(
            required(TableTag::LOCA)?,
            head.index_to_loc_format,
            maxp.num_glyphs,
        )?;
        let glyf = required(TableTag::GLYF)?;

        let metrics = match (
            directory.table_range(TableTag::HHEA, len),
            directory.table_range(TableTag::HMTX, len),
        ) {
            (Some(hhea), Some(hmtx)) => parser.read_horizontal_metrics(hhea, hmtx)?,
            _ => HorizontalMetrics::default(),
        };

        let cmap = directory
            .table_range(TableTag::CMAP, len)
            .and_then(|range| match parser.read_cmap_table(range) {
                Ok(cmap) => Some(cmap),
                Err(e) => {
                    log::warn!("ignoring malformed cmap table: {}", e);
                    None
                }
            });

        let post = directory
            .table_range(TableTag::POST, len)
            .and_then(|range| match parser.read_post_table(range) {
                Ok(post) => post,
                Err(e) => {
                    log::warn!("ignoring malformed post table: {}", e);
                    None
                }
            });

        Ok(Self {
            units_per_em: head.units_per_em,
            num_glyphs: maxp.num_glyphs,
            loca,
            glyf,
            metrics,
            cmap,
            post,
            data,
        })
    }

    /// The `CFF ` table of an OpenType font with PostScript outlines, if this is one
    pub fn open_type_cff_table(data: &Bytes) -> anyhow::Result<Option<Bytes>> {
        let directory = TrueTypeParser::new(data).read_font_directory()?;

        if directory.sfnt_version != FontDirectory::OPEN_TYPE_CFF {
            return Ok(None);
        }

        Ok(directory
            .table_range(TableTag::CFF, data.len())
            .map(|range| data.slice(range)))
    }

    fn font_units_to_glyph_space(&self) -> f32 {
        1000.0 / f32::from(self.units_per_em)
    }

    fn parse_glyph(&self, glyph_id: u16) -> anyhow::Result<TrueTypeGlyph> {
        let range = self
            .loca
            .glyf_range(glyph_id)
            .ok_or(anyhow::anyhow!("glyph {} not in loca table", glyph_id))?;

        let start = self.glyf.start + range.start;
        let end = self.glyf.start + range.end;

        anyhow::ensure!(end <= self.glyf.end, "glyph {} extends past glyf table", glyph_id);

        TrueTypeParser::new(&self.data).parse_glyph(start..end)
    }

    /// The outline in font units
    fn glyph_outline(&self, glyph_id: u16, depth: usize) -> anyhow::Result<Path> {
        anyhow::ensure!(depth <= MAX_COMPONENT_DEPTH, "compound glyphs nested too deeply");

        Ok(match self.parse_glyph(glyph_id)? {
            TrueTypeGlyph::Empty => Path::new(),
            TrueTypeGlyph::Simple(glyph) => glyph.outline(),
            TrueTypeGlyph::Compound(parts) => {
                let mut path = Path::new();

                for part in parts {
                    let component = self.glyph_outline(part.glyph_index, depth + 1)?;
                    path.extend(&component.transformed(part.transform));
                }

                path
            }
        })
    }

    fn lookup_simple(&self, code: u8, name: Option<&str>) -> Option<u16> {
        let Some(cmap) = &self.cmap else {
            return name
                .zip(self.post.as_ref())
                .and_then(|(name, post)| post.glyph_id(name))
                .or(Some(u16::from(code)));
        };

        let code = u32::from(code);

        let by_unicode_name = || {
            let unicode = unicode_for_name(name?)?;
            cmap.find_unicode()?.lookup(unicode)
        };

        // symbol fonts map their codes into the private use area
        let by_symbol = || {
            let subtable = cmap.find(3, 0)?;
            subtable
                .lookup(0xF000 + code)
                .or_else(|| subtable.lookup(code))
        };

        let by_mac_roman = || cmap.find(1, 0)?.lookup(code);

        let by_post_name = || self.post.as_ref()?.glyph_id(name?);

        let by_raw_code = || cmap.find_unicode()?.lookup(code);

        by_unicode_name()
            .or_else(by_symbol)
            .or_else(by_mac_roman)
            .or_else(by_post_name)
            .or_else(by_raw_code)
    }
}

impl OutlineSource for TrueTypeFont {
    fn glyph_id(&self, selector: GlyphSelector) -> Option<u16> {
        let glyph_id = match selector {
            GlyphSelector::GlyphId(glyph_id) => glyph_id,
            GlyphSelector::Cid(cid) => u16::try_from(cid).ok()?,
            GlyphSelector::Simple { code, name } => self.lookup_simple(code, name)?,
        };

        (glyph_id < self.num_glyphs).then_some(glyph_id)
    }

    fn outline(&self, glyph_id: u16) -> anyhow::Result<Path> {
        let scale = self.font_units_to_glyph_space();

        Ok(self
            .glyph_outline(glyph_id, 0)?
            .transformed(Matrix::new_scale(scale, scale)))
    }

    fn advance(&self, glyph_id: u16) -> Option<f32> {
        let advance = self.metrics.advance(glyph_id)?;

        Some(f32::from(advance) * self.font_units_to_glyph_space())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::geometry::{PathSegment, Point};

    use super::table::Head;

    fn be16(n: u16) -> [u8; 2] {
        n.to_be_bytes()
    }

    /// An sfnt wrapping the given tables
    fn build_sfnt(version: u32, tables: &[([u8; 4], Vec<u8>)]) -> Bytes {
        let mut out = version.to_be_bytes().to_vec();
        out.extend(be16(tables.len() as u16));
        out.extend([0; 6]);

        let mut offset = 12 + 16 * tables.len();

        for (tag, table) in tables {
            out.extend(tag);
            out.extend([0; 4]);
            out.extend((offset as u32).to_be_bytes());
            out.extend((table.len() as u32).to_be_bytes());
            offset += table.len();
        }

        for (_, table) in tables {
            out.extend(table);
        }

        Bytes::from(out)
    }

    fn head(units_per_em: u16) -> Vec<u8> {
        let mut head = Vec::new();
        head.extend(0x0001_0000u32.to_be_bytes());
        head.extend([0; 8]);
        head.extend(Head::MAGIC_NUMBER.to_be_bytes());
        head.extend(be16(0));
        head.extend(be16(units_per_em));
        head.extend([0; 30]);
        // long loca offsets
        head.extend(be16(1));
        head.extend(be16(0));
        head
    }

    /// A triangle of three on-curve points, each coordinate a 16 bit delta
    fn triangle() -> Vec<u8> {
        let mut glyph = Vec::new();
        glyph.extend(be16(1));
        glyph.extend([0; 8]);
        glyph.extend(be16(2));
        glyph.extend(be16(0));
        glyph.extend([0x01; 3]);
        for delta in [0i16, 100, 0, 0, 0, 100] {
            glyph.extend(delta.to_be_bytes());
        }
        glyph
    }

    /// Glyph 1 offset by (50, 0)
    fn compound() -> Vec<u8> {
        let mut glyph = Vec::new();
        glyph.extend((-1i16).to_be_bytes());
        glyph.extend([0; 8]);
        glyph.extend(be16(0x0003));
        glyph.extend(be16(1));
        glyph.extend(50i16.to_be_bytes());
        glyph.extend(0i16.to_be_bytes());
        glyph
    }

    /// Glyph 1 is a triangle reached from 'A' or by the name "A", glyph 2 a compound of it
    pub(crate) fn test_font(with_cmap: bool) -> Bytes {
        let glyphs = [Vec::new(), triangle(), compound()];

        let mut loca = Vec::new();
        let mut glyf = Vec::new();
        for glyph in &glyphs {
            loca.extend((glyf.len() as u32).to_be_bytes());
            glyf.extend(glyph);
        }
        loca.extend((glyf.len() as u32).to_be_bytes());

        let mut maxp = 0x0000_5000u32.to_be_bytes().to_vec();
        maxp.extend(be16(3));

        let mut hhea = vec![0; 34];
        hhea.extend(be16(2));

        let mut hmtx = Vec::new();
        for advance in [250u16, 300] {
            hmtx.extend(be16(advance));
            hmtx.extend(be16(0));
        }

        // (3, 1) format 6 mapping 'A' and 'B'
        let mut cmap = Vec::new();
        cmap.extend(be16(0));
        cmap.extend(be16(1));
        cmap.extend(be16(3));
        cmap.extend(be16(1));
        cmap.extend(12u32.to_be_bytes());
        for n in [6, 14, 0, 0x41, 2, 1, 2] {
            cmap.extend(be16(n));
        }

        // format 2, naming glyph 2 "tri.alt" and glyph 1 "A"
        let mut post = 0x0002_0000u32.to_be_bytes().to_vec();
        post.extend([0; 28]);
        post.extend(be16(3));
        for idx in [0, 36, 258] {
            post.extend(be16(idx));
        }
        post.push(7);
        post.extend(b"tri.alt");

        let mut tables = vec![
            (*b"glyf", glyf),
            (*b"head", head(500)),
            (*b"hhea", hhea),
            (*b"hmtx", hmtx),
            (*b"loca", loca),
            (*b"maxp", maxp),
            (*b"post", post),
        ];

        if with_cmap {
            tables.insert(0, (*b"cmap", cmap));
        }

        build_sfnt(0x0001_0000, &tables)
    }

    #[test]
    fn outline_scaled_to_thousand_unit_em() {
        let font = TrueTypeFont::parse(test_font(true)).unwrap();

        assert_eq!(
            font.outline(1).unwrap().segments(),
            &[
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(200.0, 0.0)),
                PathSegment::LineTo(Point::new(200.0, 200.0)),
                PathSegment::Close,
            ]
        );
        assert_eq!(font.advance(1), Some(600.0));
    }

    #[test]
    fn compound_glyph_places_components() {
        let font = TrueTypeFont::parse(test_font(true)).unwrap();

        let outline = font.outline(2).unwrap();

        assert_eq!(outline.segments()[0], PathSegment::MoveTo(Point::new(100.0, 0.0)));
        assert_eq!(outline.segments()[2], PathSegment::LineTo(Point::new(300.0, 200.0)));

        // past the last long metric, the last advance repeats
        assert_eq!(font.advance(2), Some(600.0));
    }

    #[test]
    fn empty_glyph_has_empty_outline() {
        let font = TrueTypeFont::parse(test_font(true)).unwrap();

        assert!(font.outline(0).unwrap().is_empty());
    }

    #[test]
    fn cmap_then_post_lookup() {
        let font = TrueTypeFont::parse(test_font(true)).unwrap();

        let simple = |code, name| font.glyph_id(GlyphSelector::Simple { code, name });

        assert_eq!(simple(b'A', Some("A")), Some(1));
        assert_eq!(simple(b'B', None), Some(2));
        assert_eq!(simple(0, Some("tri.alt")), Some(2));
        assert_eq!(simple(b'Z', Some("Z")), None);
    }

    #[test]
    fn without_cmap_codes_are_glyph_ids() {
        let font = TrueTypeFont::parse(test_font(false)).unwrap();

        assert_eq!(font.glyph_id(GlyphSelector::Simple { code: 2, name: None }), Some(2));
        assert_eq!(font.glyph_id(GlyphSelector::Simple { code: 3, name: None }), None);
    }

    #[test]
    fn missing_required_table() {
        let data = build_sfnt(0x0001_0000, &[(*b"head", head(1000))]);

        assert!(TrueTypeFont::parse(data).is_err());
    }

    #[test]
    fn open_type_cff_table() {
        let data = build_sfnt(FontDirectory::OPEN_TYPE_CFF, &[(*b"CFF ", vec![1, 0, 4, 4])]);

        assert_eq!(
            TrueTypeFont::open_type_cff_table(&data).unwrap().as_deref(),
            Some(&[1, 0, 4, 4][..])
        );
        assert_eq!(TrueTypeFont::open_type_cff_table(&test_font(true)).unwrap(), None);
    }
}
