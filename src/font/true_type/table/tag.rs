use std::fmt::{self, Write};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableTag([u8; 4]);

impl TableTag {
    pub const CMAP: Self = Self::new(*b"cmap");
    pub const GLYF: Self = Self::new(*b"glyf");
    pub const HEAD: Self = Self::new(*b"head");
    pub const HHEA: Self = Self::new(*b"hhea");
    pub const HMTX: Self = Self::new(*b"hmtx");
    pub const LOCA: Self = Self::new(*b"loca");
    pub const MAXP: Self = Self::new(*b"maxp");
    pub const POST: Self = Self::new(*b"post");
    pub const CFF: Self = Self::new(*b"CFF ");

    pub const fn new(tag: [u8; 4]) -> Self {
        Self(tag)
    }
}

impl fmt::Debug for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            f.write_char(char::from(b))?;
        }

        Ok(())
    }
}
