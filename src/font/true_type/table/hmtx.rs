/// Advance widths from `hmtx`, in font units
///
/// Glyphs past the last long metric share its advance
#[derive(Debug, Clone, Default)]
pub struct HorizontalMetrics {
    pub advances: Vec<u16>,
}

impl HorizontalMetrics {
    pub fn advance(&self, glyph_id: u16) -> Option<u16> {
        self.advances
            .get(usize::from(glyph_id))
            .or_else(|| self.advances.last())
            .copied()
    }
}
