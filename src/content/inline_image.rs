use crate::{
    error::{PdfError, PdfResult},
    lex::{LexBase, LexObject},
    objects::{Dictionary, Object},
    stream::Stream,
};

use super::ContentLexer;

/// Inline image dictionaries may use abbreviated keys
fn expand_key(key: &str) -> &str {
    match key {
        "BPC" => "BitsPerComponent",
        "CS" => "ColorSpace",
        "D" => "Decode",
        "DP" => "DecodeParms",
        "F" => "Filter",
        "H" => "Height",
        "IM" => "ImageMask",
        "I" => "Interpolate",
        "L" => "Length",
        "W" => "Width",
        key => key,
    }
}

/// Bytes per sample row times rows, for unfiltered images whose colour space is spelled out
fn unfiltered_length(dict: &Dictionary) -> Option<usize> {
    if dict.get("Filter").is_some() {
        return None;
    }

    let width = dict.get("Width")?.as_integer()?;
    let height = dict.get("Height")?.as_integer()?;

    let is_mask = matches!(dict.get("ImageMask"), Some(Object::True));

    let (components, bits) = if is_mask {
        (1, 1)
    } else {
        let components = match dict.get("ColorSpace")?.as_name()? {
            "G" | "DeviceGray" | "CalGray" => 1,
            "RGB" | "DeviceRGB" | "CalRGB" => 3,
            "CMYK" | "DeviceCMYK" => 4,
            _ => return None,
        };

        (components, dict.get("BitsPerComponent")?.as_integer()?)
    };

    if width <= 0 || height <= 0 || bits <= 0 {
        return None;
    }

    let row = (width as usize * components * bits as usize + 7) / 8;

    Some(row * height as usize)
}

impl ContentLexer {
    /// Reads the body of an inline image, the `BI` operator having been consumed
    pub(super) fn lex_inline_image(&mut self) -> PdfResult<Stream> {
        let mut dict = Dictionary::default();

        loop {
            self.skip_whitespace();

            if self.next_is_keyword(b"ID") {
                *self.cursor_mut() += 2;
                break;
            }

            match self.peek_byte() {
                Some(b'/') => {}
                Some(..) => {
                    let pos = self.cursor();
                    let found = self.lex_object()?;

                    return Err(PdfError::InvalidDictionaryKey {
                        found: found.object_type(),
                        pos,
                    });
                }
                None => return Err(PdfError::UnexpectedEof { pos: self.cursor() }),
            }

            let key = self.lex_name()?;
            let value = self.lex_object()?;

            dict.insert(expand_key(&key), value);
        }

        // exactly one whitespace byte separates `ID` from the data
        if self.next_is_whitespace() {
            self.next_byte();
        }

        let start = self.cursor();

        let explicit = dict
            .get("Length")
            .and_then(Object::as_integer)
            .and_then(|len| usize::try_from(len).ok())
            .or_else(|| unfiltered_length(&dict));

        if let Some(len) = explicit {
            if let Some(end) = self.ends_with_ei(start + len) {
                let data = self.slice(start, start + len);
                *self.cursor_mut() = end;
                return Ok(Stream::new(dict, data));
            }
        }

        // otherwise the data ends at the first `EI` surrounded by whitespace
        let buffer = self.buffer();
        let mut pos = start;

        while pos + 2 <= buffer.len() {
            let is_ei = &buffer[pos..pos + 2] == b"EI"
                && pos > start
                && Self::is_whitespace(buffer[pos - 1])
                && buffer.get(pos + 2).map_or(true, |&b| !Self::is_regular(b));

            if is_ei {
                let data = self.slice(start, pos - 1);
                *self.cursor_mut() = pos + 2;
                return Ok(Stream::new(dict, data));
            }

            pos += 1;
        }

        Err(PdfError::UnexpectedEof { pos: start })
    }

    /// Where `EI` ends, if only whitespace separates it from `pos`
    fn ends_with_ei(&self, pos: usize) -> Option<usize> {
        let buffer = self.buffer();
        let mut i = pos;

        while i < buffer.len() && Self::is_whitespace(buffer[i]) {
            i += 1;
        }

        let end = i + 2;

        if buffer.get(i..end)? == b"EI" && buffer.get(end).map_or(true, |&b| !Self::is_regular(b)) {
            Some(end)
        } else {
            None
        }
    }
}
