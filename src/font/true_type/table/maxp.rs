#[derive(Debug, Clone, Copy)]
pub struct MaxpTable {
    /// the number of glyphs in the font
    pub num_glyphs: u16,
}
