use crate::{font::encoding::standard_name, parse_binary::BinaryParser};

use super::{
    charset::CffCharset,
    consts::{EXPERT_ENCODING, STANDARD_SIDS},
};

/// A font program's built-in map from codes to glyphs
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CffEncoding {
    Standard,
    Expert,

    /// Formats 0 and 1, with any supplements
    Custom {
        /// Glyph id for each code, 0 where the code is unmapped
        codes: Vec<u16>,

        /// Extra codes mapped by SID
        supplements: Vec<(u8, u16)>,
    },
}

impl CffEncoding {
    pub fn parse(parser: &mut impl BinaryParser) -> anyhow::Result<Self> {
        let format = parser.next()?;
        let mut codes = vec![0u16; 256];

        match format & 0x7f {
            0 => {
                let n_codes = parser.next()?;

                for gid in 1..=u16::from(n_codes) {
                    let code = parser.next()?;
                    codes[usize::from(code)] = gid;
                }
            }
            1 => {
                let n_ranges = parser.next()?;
                let mut gid = 1;

                for _ in 0..n_ranges {
                    let first = parser.next()?;
                    let n_left = parser.next()?;

                    for code in u16::from(first)..=u16::from(first) + u16::from(n_left) {
                        if let Some(slot) = codes.get_mut(usize::from(code)) {
                            *slot = gid;
                        }
                        gid += 1;
                    }
                }
            }
            f => anyhow::bail!("invalid encoding format: {}", f),
        }

        let mut supplements = Vec::new();

        if format & 0x80 != 0 {
            let n_sups = parser.next()?;

            for _ in 0..n_sups {
                let code = parser.next()?;
                let sid = parser.parse_u16()?;
                supplements.push((code, sid));
            }
        }

        Ok(CffEncoding::Custom { codes, supplements })
    }

    pub fn glyph_id(&self, code: u8, charset: &CffCharset) -> Option<u16> {
        match self {
            CffEncoding::Standard => {
                let sid = *STANDARD_SIDS.get(standard_name(code)?)?;
                charset.glyph_id(sid)
            }
            CffEncoding::Expert => match EXPERT_ENCODING[usize::from(code)] {
                0 => None,
                sid => charset.glyph_id(sid),
            },
            CffEncoding::Custom { codes, supplements } => match codes[usize::from(code)] {
                0 => supplements
                    .iter()
                    .find(|&&(c, _)| c == code)
                    .and_then(|&(_, sid)| charset.glyph_id(sid)),
                gid => Some(gid),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_binary::ByteReader;

    #[test]
    fn format_0_with_supplement() {
        // codes 65 and 66 are glyphs 1 and 2, code 200 is the glyph named by SID 34
        let data = [0x80, 2, 65, 66, 1, 200, 0, 34];
        let encoding = CffEncoding::parse(&mut ByteReader::new(&data)).unwrap();
        let charset = CffCharset::Custom(vec![0, 40, 41, 34]);

        assert_eq!(encoding.glyph_id(65, &charset), Some(1));
        assert_eq!(encoding.glyph_id(66, &charset), Some(2));
        assert_eq!(encoding.glyph_id(200, &charset), Some(3));
        assert_eq!(encoding.glyph_id(67, &charset), None);
    }

    #[test]
    fn format_1() {
        let data = [1, 2, 32, 1, 97, 0];
        let encoding = CffEncoding::parse(&mut ByteReader::new(&data)).unwrap();
        let charset = CffCharset::IsoAdobe;

        assert_eq!(encoding.glyph_id(32, &charset), Some(1));
        assert_eq!(encoding.glyph_id(33, &charset), Some(2));
        assert_eq!(encoding.glyph_id(97, &charset), Some(3));
    }

    #[test]
    fn standard_goes_through_the_charset() {
        // "A" is SID 34
        let charset = CffCharset::Custom(vec![0, 34]);

        assert_eq!(CffEncoding::Standard.glyph_id(b'A', &charset), Some(1));
        assert_eq!(CffEncoding::Standard.glyph_id(b'B', &charset), None);
    }
}
