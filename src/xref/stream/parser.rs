use std::convert::TryFrom;

use crate::{
    error::{PdfError, PdfResult},
    xref::{
        stream::{XrefStreamField, XrefStreamFieldWidths},
        Xref, XrefEntry,
    },
};

#[derive(Debug)]
pub(crate) struct XrefStreamParser<'a> {
    stream: &'a [u8],
    cursor: usize,
    w: XrefStreamFieldWidths,
    index: Vec<(usize, usize)>,
}

/// Big-endian integer of at most 8 bytes. An absent field takes `default`
fn parse_integer(bytes: &[u8], default: Option<u64>) -> PdfResult<u64> {
    if bytes.is_empty() {
        return default
            .ok_or_else(|| PdfError::malformed_xref("missing field with no default value"));
    }

    Ok(bytes.iter().fold(0, |sum, &b| (sum << 8) | u64::from(b)))
}

impl<'a> XrefStreamParser<'a> {
    pub fn new(stream: &'a [u8], w: XrefStreamFieldWidths, index: Vec<(usize, usize)>) -> Self {
        Self {
            stream,
            cursor: 0,
            w,
            index,
        }
    }

    pub fn parse(mut self) -> PdfResult<Xref> {
        let mut xref = Xref::new();

        if self.w.total_width() == 0 {
            return Ok(xref);
        }

        for (first, count) in std::mem::take(&mut self.index) {
            for idx in 0..count {
                // a truncated stream keeps whatever entries were complete
                if self.cursor + self.w.total_width() > self.stream.len() {
                    log::warn!(
                        "xref stream ends after {} bytes, expected more entries",
                        self.stream.len()
                    );
                    return Ok(xref);
                }

                xref.insert(first + idx, self.parse_entry()?);
            }
        }

        Ok(xref)
    }

    fn parse_entry(&mut self) -> PdfResult<XrefEntry> {
        let entry_type = parse_integer(self.next_field(XrefStreamField::One), Some(1))?;

        match entry_type {
            0 => self.parse_type_zero_entry(),
            1 => self.parse_type_one_entry(),
            2 => self.parse_type_two_entry(),
            _ => self.parse_type_unknown_entry(),
        }
    }

    /// Equivalent to free entries in a regular xref table
    fn parse_type_zero_entry(&mut self) -> PdfResult<XrefEntry> {
        let next_free_object = parse_integer(self.next_field(XrefStreamField::Two), Some(0))?;
        let generation = u16::try_from(parse_integer(
            self.next_field(XrefStreamField::Three),
            Some(0),
        )?)?;

        Ok(XrefEntry::Free {
            next_free_object,
            generation,
        })
    }

    /// Equivalent to in-use entires in a regular xref table
    fn parse_type_one_entry(&mut self) -> PdfResult<XrefEntry> {
        let byte_offset =
            usize::try_from(parse_integer(self.next_field(XrefStreamField::Two), None)?)?;
        let generation = u16::try_from(parse_integer(
            self.next_field(XrefStreamField::Three),
            Some(0),
        )?)?;

        Ok(XrefEntry::InUse {
            byte_offset,
            generation,
        })
    }

    /// Compressed xref entries
    fn parse_type_two_entry(&mut self) -> PdfResult<XrefEntry> {
        let container =
            usize::try_from(parse_integer(self.next_field(XrefStreamField::Two), None)?)?;
        let index = usize::try_from(parse_integer(
            self.next_field(XrefStreamField::Three),
            Some(0),
        )?)?;

        Ok(XrefEntry::Compressed { container, index })
    }

    fn parse_type_unknown_entry(&mut self) -> PdfResult<XrefEntry> {
        self.next_field(XrefStreamField::Two);
        self.next_field(XrefStreamField::Three);

        Ok(XrefEntry::Null)
    }

    /// Callers check that a whole entry remains before reading its fields
    fn next_field(&mut self, field: XrefStreamField) -> &'a [u8] {
        let width = self.w.field_width(field);
        let end = (self.cursor + width).min(self.stream.len());
        let value = &self.stream[self.cursor..end];
        self.cursor = end;

        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn entries_of_each_type() {
        let data = [
            0, 0, 0, 255, //
            1, 0, 15, 0, //
            2, 0, 9, 3, //
        ];

        let xref = XrefStreamParser::new(&data, XrefStreamFieldWidths::new([1, 2, 1]), vec![(0, 3)])
            .parse()
            .unwrap();

        assert_eq!(
            xref.entry(0),
            Some(&XrefEntry::Free {
                next_free_object: 0,
                generation: 255
            })
        );
        assert_eq!(
            xref.entry(1),
            Some(&XrefEntry::InUse {
                byte_offset: 15,
                generation: 0
            })
        );
        assert_eq!(
            xref.entry(2),
            Some(&XrefEntry::Compressed {
                container: 9,
                index: 3
            })
        );
    }

    #[test]
    fn missing_type_field_defaults_to_in_use() {
        let data = [0x01, 0x00, 0x02, 0x00];

        let xref = XrefStreamParser::new(&data, XrefStreamFieldWidths::new([0, 2, 0]), vec![(5, 2)])
            .parse()
            .unwrap();

        assert_eq!(
            xref.entry(6),
            Some(&XrefEntry::InUse {
                byte_offset: 0x200,
                generation: 0
            })
        );
    }

    #[test]
    fn truncated_stream_keeps_complete_entries() {
        let data = [1, 0, 10, 0, 1, 0];

        let xref = XrefStreamParser::new(&data, XrefStreamFieldWidths::new([1, 2, 1]), vec![(0, 2)])
            .parse()
            .unwrap();

        assert_eq!(xref.len(), 1);
    }
}
