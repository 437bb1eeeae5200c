use crate::{
    error::{PdfError, PdfResult},
    objects::{Dictionary, Object},
    Resolve,
};

use super::cid::CidFont;

/// A composite font, whose glyphs come from a single descendant CIDFont
///
/// Codes are always two bytes wide, mapped to CIDs by identity
#[derive(Debug, Clone)]
pub struct Type0Font {
    pub base_font: String,
    pub vertical: bool,
    pub descendant: CidFont,
}

impl Type0Font {
    pub fn from_dict(dict: &Dictionary, resolver: &dyn Resolve) -> PdfResult<Self> {
        let base_font = dict.get_name("BaseFont", resolver)?.unwrap_or_default();
        let vertical = match dict.get_object("Encoding", resolver)? {
            Some(obj) => writing_mode(obj, resolver)?,
            None => false,
        };

        let mut descendants = dict.expect_arr("DescendantFonts", resolver)?;
        if descendants.len() != 1 {
            log::warn!(
                "{} has {} descendant fonts, using the first",
                base_font,
                descendants.len()
            );
        }

        let Some(descendant) = descendants.drain(..).next() else {
            return Err(PdfError::ArrayOfInvalidLength {
                expected: 1,
                found: 0,
            });
        };
        let descendant = CidFont::from_dict(resolver.assert_dict(descendant)?, resolver)?;

        Ok(Self {
            base_font,
            vertical,
            descendant,
        })
    }
}

/// Whether `/Encoding` selects vertical writing
///
/// Only the identity CMaps are interpreted. Any other CMap is read as identity too, keeping its
/// writing mode
fn writing_mode(obj: Object, resolver: &dyn Resolve) -> PdfResult<bool> {
    Ok(match resolver.resolve(obj)? {
        Object::Name(name) => {
            if name != "Identity-H" && name != "Identity-V" {
                log::warn!("unsupported CMap /{}, treating as identity", name);
            }

            name.ends_with("-V")
        }
        Object::Stream(stream) => {
            log::warn!("embedded CMaps are not supported, treating as identity");
            stream.dict.get_integer("WMode", resolver)?.unwrap_or(0) == 1
        }
        other => {
            log::warn!("invalid Type0 /Encoding {:?}", other.object_type());
            false
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{font::cid::CidFontSubtype, resolve::NoResolve, test_util::parse_object};

    fn dict(src: &[u8]) -> Dictionary {
        match parse_object(src) {
            Object::Dictionary(dict) => dict,
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn identity_v_is_vertical() {
        let font = Type0Font::from_dict(
            &dict(
                b"<< /Type /Font /Subtype /Type0 /BaseFont /Mincho /Encoding /Identity-V
                   /DescendantFonts [<< /Type /Font /Subtype /CIDFontType2 /BaseFont /Mincho
                   /DW 900 >>] >>",
            ),
            &NoResolve,
        )
        .unwrap();

        assert!(font.vertical);
        assert_eq!(font.descendant.subtype, CidFontSubtype::CidFontType2);
        assert_eq!(font.descendant.widths.get(3), 900.0);
    }

    #[test]
    fn missing_descendant() {
        let result = Type0Font::from_dict(
            &dict(b"<< /Subtype /Type0 /Encoding /Identity-H /DescendantFonts [] >>"),
            &NoResolve,
        );

        assert!(result.is_err());
    }
}
