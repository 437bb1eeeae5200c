use crate::parse_binary::BinaryParser;

use super::consts::{EXPERT_CHARSET, EXPERT_SUBSET_CHARSET, ISO_ADOBE_LAST_SID};

/// Maps glyph ids to SIDs, or to CIDs in CID-keyed fonts. Glyph 0 is always `.notdef`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CffCharset {
    IsoAdobe,
    Expert,
    ExpertSubset,

    /// Formats 0, 1 and 2, expanded to one entry per glyph
    Custom(Vec<u16>),
}

impl CffCharset {
    pub fn parse(parser: &mut impl BinaryParser, num_glyphs: usize) -> anyhow::Result<Self> {
        let mut sids = Vec::with_capacity(num_glyphs);
        sids.push(0);

        match parser.next()? {
            0 => {
                while sids.len() < num_glyphs {
                    sids.push(parser.parse_u16()?);
                }
            }
            format @ (1 | 2) => {
                while sids.len() < num_glyphs {
                    let first = parser.parse_u16()?;
                    let n_left = if format == 1 {
                        u16::from(parser.next()?)
                    } else {
                        parser.parse_u16()?
                    };

                    for sid in first..=first.saturating_add(n_left) {
                        if sids.len() == num_glyphs {
                            break;
                        }
                        sids.push(sid);
                    }
                }
            }
            format => anyhow::bail!("invalid charset format: {}", format),
        }

        Ok(CffCharset::Custom(sids))
    }

    pub fn sid(&self, glyph_id: u16) -> Option<u16> {
        match self {
            CffCharset::IsoAdobe => (glyph_id <= ISO_ADOBE_LAST_SID).then_some(glyph_id),
            CffCharset::Expert => nth_in_runs(EXPERT_CHARSET, glyph_id),
            CffCharset::ExpertSubset => nth_in_runs(EXPERT_SUBSET_CHARSET, glyph_id),
            CffCharset::Custom(sids) => sids.get(usize::from(glyph_id)).copied(),
        }
    }

    pub fn glyph_id(&self, sid: u16) -> Option<u16> {
        match self {
            CffCharset::IsoAdobe => (sid <= ISO_ADOBE_LAST_SID).then_some(sid),
            CffCharset::Expert => position_in_runs(EXPERT_CHARSET, sid),
            CffCharset::ExpertSubset => position_in_runs(EXPERT_SUBSET_CHARSET, sid),
            CffCharset::Custom(sids) => sids
                .iter()
                .position(|&s| s == sid)
                .and_then(|gid| u16::try_from(gid).ok()),
        }
    }
}

fn nth_in_runs(runs: &[(u16, u16)], mut n: u16) -> Option<u16> {
    for &(first, last) in runs {
        let len = last - first + 1;

        if n < len {
            return Some(first + n);
        }

        n -= len;
    }

    None
}

fn position_in_runs(runs: &[(u16, u16)], sid: u16) -> Option<u16> {
    let mut base = 0;

    for &(first, last) in runs {
        if (first..=last).contains(&sid) {
            return Some(base + sid - first);
        }

        base += last - first + 1;
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_binary::ByteReader;

    #[test]
    fn format_0() {
        let data = [0, 0, 34, 0, 66];
        let charset = CffCharset::parse(&mut ByteReader::new(&data), 3).unwrap();

        assert_eq!(charset, CffCharset::Custom(vec![0, 34, 66]));
        assert_eq!(charset.glyph_id(66), Some(2));
    }

    #[test]
    fn format_1_ranges_stop_at_glyph_count() {
        // sids 34..=36, then 66..=75 of which only two are needed
        let data = [1, 0, 34, 2, 0, 66, 9];
        let charset = CffCharset::parse(&mut ByteReader::new(&data), 6).unwrap();

        assert_eq!(charset, CffCharset::Custom(vec![0, 34, 35, 36, 66, 67]));
    }

    #[test]
    fn format_2() {
        let data = [2, 0, 1, 1, 0];
        let charset = CffCharset::parse(&mut ByteReader::new(&data), 258).unwrap();

        assert_eq!(charset.sid(257), Some(257));
        assert_eq!(charset.sid(258), None);
    }

    #[test]
    fn predefined() {
        assert_eq!(CffCharset::IsoAdobe.glyph_id(34), Some(34));
        assert_eq!(CffCharset::IsoAdobe.glyph_id(300), None);

        assert_eq!(CffCharset::Expert.sid(2), Some(229));
        assert_eq!(CffCharset::Expert.glyph_id(13), Some(12));
        assert_eq!(CffCharset::ExpertSubset.sid(86), Some(346));
    }
}
