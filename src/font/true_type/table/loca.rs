use std::ops::Range;

/// Glyph offsets into the `glyf` table, one more than there are glyphs
#[derive(Debug, Clone)]
pub struct LocaTable {
    pub offsets: Vec<u32>,
}

impl LocaTable {
    /// Where a glyph's description lives, relative to the start of `glyf`. Empty ranges are
    /// glyphs without outlines
    pub fn glyf_range(&self, glyph_id: u16) -> Option<Range<usize>> {
        let idx = usize::from(glyph_id);

        let start = *self.offsets.get(idx)? as usize;
        let end = *self.offsets.get(idx + 1)? as usize;

        (start <= end).then_some(start..end)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ranges() {
        let loca = LocaTable {
            offsets: vec![0, 10, 10, 30],
        };

        assert_eq!(loca.glyf_range(0), Some(0..10));
        assert_eq!(loca.glyf_range(1), Some(10..10));
        assert_eq!(loca.glyf_range(2), Some(10..30));
        assert_eq!(loca.glyf_range(3), None);
    }
}
