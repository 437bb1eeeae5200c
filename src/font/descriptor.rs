use crate::{
    error::PdfResult,
    objects::Dictionary,
    stream::Stream,
    Resolve,
};

/// The parts of a `/FontDescriptor` that locate and drive a glyph program
#[derive(Debug, Clone)]
pub struct FontDescriptor {
    /// The PostScript name of the font, possibly with a subset prefix
    pub font_name: Option<String>,

    pub flags: FontDescriptorFlags,

    /// Width for character codes the `/Widths` array doesn't cover
    ///
    /// Default value: 0
    pub missing_width: f32,

    pub font_file: Option<FontFile>,
}

impl FontDescriptor {
    const TYPE: &'static str = "FontDescriptor";

    pub fn from_dict(dict: Dictionary, resolver: &dyn Resolve) -> PdfResult<Self> {
        dict.expect_type(Self::TYPE, resolver, true)?;

        let font_name = dict.get_name("FontName", resolver)?;
        let flags = FontDescriptorFlags(dict.get_integer("Flags", resolver)?.unwrap_or(0) as u32);
        let missing_width = dict.get_number("MissingWidth", resolver)?.unwrap_or(0.0);
        let font_file = FontFile::from_descriptor(&dict, resolver)?;

        Ok(Self {
            font_name,
            flags,
            missing_width,
            font_file,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontDescriptorFlags(pub u32);

impl FontDescriptorFlags {
    pub const FIXED_PITCH: u32 = 1 << 0;
    pub const SERIF: u32 = 1 << 1;

    /// The font contains glyphs outside the Adobe standard Latin character set
    pub const SYMBOLIC: u32 = 1 << 2;
    pub const SCRIPT: u32 = 1 << 3;
    pub const NONSYMBOLIC: u32 = 1 << 5;
    pub const ITALIC: u32 = 1 << 6;

    pub fn is_symbolic(self) -> bool {
        self.0 & Self::SYMBOLIC != 0
    }
}

#[pdf_enum]
pub enum FontFile3Subtype {
    /// A bare CFF font program for a simple font
    Type1C = "Type1C",

    /// A CID-keyed CFF font program
    CidFontType0C = "CIDFontType0C",

    /// An OpenType wrapper, around either `glyf` or `CFF ` outlines
    OpenType = "OpenType",
}

/// An embedded font program
#[derive(Debug, Clone)]
pub enum FontFile {
    /// `/FontFile`, a PostScript Type 1 program
    Type1(Stream),

    /// `/FontFile2`
    TrueType(Stream),

    /// `/FontFile3`
    Compact {
        subtype: FontFile3Subtype,
        stream: Stream,
    },
}

impl FontFile {
    fn from_descriptor(dict: &Dictionary, resolver: &dyn Resolve) -> PdfResult<Option<Self>> {
        if let Some(stream) = dict.get_stream("FontFile2", resolver)? {
            return Ok(Some(Self::TrueType(stream)));
        }

        if let Some(stream) = dict.get_stream("FontFile3", resolver)? {
            let subtype = stream.dict.expect_name("Subtype", resolver)?;
            let subtype = FontFile3Subtype::from_str(&subtype)?;

            return Ok(Some(Self::Compact { subtype, stream }));
        }

        Ok(dict.get_stream("FontFile", resolver)?.map(Self::Type1))
    }

    pub fn stream(&self) -> &Stream {
        match self {
            Self::Type1(stream) | Self::TrueType(stream) | Self::Compact { stream, .. } => stream,
        }
    }
}
