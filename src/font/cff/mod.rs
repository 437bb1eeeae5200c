/*!
 * https://adobe-type-tools.github.io/font-tech-notes/pdfs/5176.CFF.pdf
 *
 * See also:
 *  - https://adobe-type-tools.github.io/font-tech-notes/pdfs/5177.Type2.pdf
 */

use bytes::Bytes;

use crate::{
    data_structures::Matrix,
    font::{GlyphSelector, OutlineSource},
    geometry::Path,
};

use self::{
    charset::CffCharset,
    charstring::{CharString, CharStringContext},
    consts::{NUM_STANDARD_STRINGS, STANDARD_SIDS},
    dict::PrivateDict,
    encoding::CffEncoding,
    index::CffIndex,
};

mod charset;
mod charstring;
mod consts;
mod dict;
mod encoding;
mod index;
mod parse;

/// A bare CFF font program, as embedded by `FontFile3` with subtype `Type1C` or `CIDFontType0C`
#[derive(Debug)]
pub(crate) struct CffFont {
    data: Bytes,
    charstrings: CffIndex,
    global_subrs: CffIndex,
    strings: CffIndex,
    charset: CffCharset,
    encoding: CffEncoding,
    font_matrix: Matrix,
    kind: CffKind,
}

#[derive(Debug)]
enum CffKind {
    Simple(PrivateData),
    Cid {
        fonts: Vec<PrivateData>,
        fd_select: Vec<u8>,
    },
}

#[derive(Debug)]
struct PrivateData {
    dict: PrivateDict,
    subrs: Option<CffIndex>,
    font_matrix: Option<Matrix>,
}

impl CffFont {
    pub fn parse(data: Bytes) -> anyhow::Result<Self> {
        parse::parse_font(data)
    }

    pub fn num_glyphs(&self) -> usize {
        self.charstrings.len()
    }

    fn is_cid(&self) -> bool {
        matches!(self.kind, CffKind::Cid { .. })
    }

    fn private_data(&self, glyph_id: u16) -> Option<&PrivateData> {
        match &self.kind {
            CffKind::Simple(private) => Some(private),
            CffKind::Cid { fonts, fd_select } => {
                let fd = *fd_select.get(usize::from(glyph_id))?;
                fonts.get(usize::from(fd))
            }
        }
    }

    /// Maps glyph space to a 1000 unit em
    fn glyph_matrix(&self, private: &PrivateData) -> Matrix {
        private.font_matrix.unwrap_or(self.font_matrix) * Matrix::new_scale(1000.0, 1000.0)
    }

    /// The SID of a glyph name, either standard or from the font's string INDEX
    fn sid_for_name(&self, name: &str) -> Option<u16> {
        if let Some(&sid) = STANDARD_SIDS.get(name) {
            return Some(sid);
        }

        self.strings
            .iter(&self.data)
            .position(|s| s == name.as_bytes())
            .and_then(|idx| u16::try_from(idx).ok())
            .and_then(|idx| idx.checked_add(NUM_STANDARD_STRINGS))
    }

    fn evaluate(&self, glyph_id: u16) -> anyhow::Result<(CharString, &PrivateData)> {
        let private = self
            .private_data(glyph_id)
            .ok_or(anyhow::anyhow!("glyph {} has no font dict", glyph_id))?;

        let ctx = CharStringContext {
            data: &self.data,
            charstrings: &self.charstrings,
            global_subrs: &self.global_subrs,
            local_subrs: private.subrs.as_ref(),
            private: &private.dict,
            charset: &self.charset,
        };

        Ok((ctx.evaluate(glyph_id)?, private))
    }
}

impl OutlineSource for CffFont {
    fn glyph_id(&self, selector: GlyphSelector) -> Option<u16> {
        let glyph_id = match selector {
            GlyphSelector::GlyphId(glyph_id) => glyph_id,
            // CID-keyed fonts name glyphs by CID through the charset
            GlyphSelector::Cid(cid) if self.is_cid() => {
                self.charset.glyph_id(u16::try_from(cid).ok()?)?
            }
            GlyphSelector::Cid(cid) => u16::try_from(cid).ok()?,
            GlyphSelector::Simple { code, name } => name
                .and_then(|name| self.sid_for_name(name))
                .and_then(|sid| self.charset.glyph_id(sid))
                .or_else(|| self.encoding.glyph_id(code, &self.charset))?,
        };

        (usize::from(glyph_id) < self.num_glyphs()).then_some(glyph_id)
    }

    fn outline(&self, glyph_id: u16) -> anyhow::Result<Path> {
        let (charstring, private) = self.evaluate(glyph_id)?;

        Ok(charstring.outline.transformed(self.glyph_matrix(private)))
    }

    fn advance(&self, glyph_id: u16) -> Option<f32> {
        let (charstring, private) = self.evaluate(glyph_id).ok()?;

        Some(charstring.width * self.glyph_matrix(private).a)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{PathSegment, Point};

    use super::index::build_index;

    /// An integer operand in its fixed five byte form
    fn operand(n: usize) -> Vec<u8> {
        let mut out = vec![29];
        out.extend_from_slice(&(n as i32).to_be_bytes());
        out
    }

    /// A font whose glyph `i` has SID `sids[i]`
    fn build_font(charstrings: &[&[u8]], sids: &[u16], font_matrix: Option<&[u8]>) -> Bytes {
        let private = [28, 0x01, 0xf4, 20, 28, 0x02, 0x58, 21];

        let matrix = font_matrix.unwrap_or(&[]);
        let top_dict_len = 6 + 6 + 11 + matrix.len();

        let mut data = vec![1, 0, 4, 4];
        data.extend(build_index(&[b"Test"]));

        // header, name index and a top dict index of one entry
        let top_dict_index_len = 2 + 1 + 8 + top_dict_len;
        let strings_at = data.len() + top_dict_index_len;
        let charset_at = strings_at + 4;

        let mut charset = vec![0];
        for sid in &sids[1..] {
            charset.extend_from_slice(&sid.to_be_bytes());
        }

        let charstrings_at = charset_at + charset.len();
        let charstrings_index = build_index(charstrings);
        let private_at = charstrings_at + charstrings_index.len();

        let mut top = operand(charset_at);
        top.push(15);
        top.extend(operand(charstrings_at));
        top.push(17);
        top.extend(operand(private.len()));
        top.extend(operand(private_at));
        top.push(18);
        top.extend_from_slice(matrix);
        assert_eq!(top.len(), top_dict_len);

        data.extend(build_index(&[top.as_slice()]));
        assert_eq!(data.len(), strings_at);

        // empty string and global subroutine indices
        data.extend([0, 0, 0, 0]);
        data.extend(charset);
        data.extend(charstrings_index);
        data.extend(private);

        Bytes::from(data)
    }

    const NOTDEF: &[u8] = &[14];

    // 0 0 rmoveto 10 0 rlineto endchar
    const LINE: &[u8] = &[139, 139, 21, 149, 139, 5, 14];

    #[test]
    fn glyph_lookup_by_name_and_code() {
        // "A" and "B"
        let font = CffFont::parse(build_font(&[NOTDEF, LINE, LINE], &[0, 34, 35], None)).unwrap();

        assert_eq!(
            font.glyph_id(GlyphSelector::Simple {
                code: 0,
                name: Some("B")
            }),
            Some(2)
        );
        assert_eq!(
            font.glyph_id(GlyphSelector::Simple {
                code: b'A',
                name: None
            }),
            Some(1)
        );
        assert_eq!(
            font.glyph_id(GlyphSelector::Simple {
                code: b'C',
                name: Some("C")
            }),
            None
        );
        assert_eq!(font.glyph_id(GlyphSelector::GlyphId(3)), None);
    }

    #[test]
    fn default_matrix_gives_thousand_unit_em() {
        let font = CffFont::parse(build_font(&[NOTDEF, LINE], &[0, 34], None)).unwrap();

        let outline = font.outline(1).unwrap();

        assert_eq!(outline.segments()[0], PathSegment::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(outline.segments()[1], PathSegment::LineTo(Point::new(10.0, 0.0)));
        assert_eq!(font.advance(1), Some(500.0));
    }

    #[test]
    fn font_matrix_scales_outline_and_advance() {
        // [0.002 0 0 0.002 0 0] FontMatrix
        let matrix = [
            30, 0x0a, 0x00, 0x2f, 139, 139, 30, 0x0a, 0x00, 0x2f, 139, 139, 12, 7,
        ];
        let font =
            CffFont::parse(build_font(&[NOTDEF, LINE], &[0, 34], Some(&matrix))).unwrap();

        let outline = font.outline(1).unwrap();

        assert_eq!(outline.segments()[1], PathSegment::LineTo(Point::new(20.0, 0.0)));
        assert_eq!(font.advance(1), Some(1000.0));
    }

    #[test]
    fn missing_glyph_is_an_error() {
        let font = CffFont::parse(build_font(&[NOTDEF], &[0], None)).unwrap();

        assert!(font.outline(5).is_err());
    }
}
