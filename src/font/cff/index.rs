use std::ops::Range;

use crate::parse_binary::BinaryParser;

/// A CFF INDEX: a count, `count + 1` offsets, and the data they point into
///
/// Every lookup into a font program (names, dictionaries, strings, subroutines, charstrings)
/// goes through the byte range of an entry. Offsets are stored as absolute positions in the
/// font program, so an index carries no borrow of it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CffIndex {
    /// `len() + 1` absolute positions, or empty for an index without entries
    offsets: Vec<usize>,
}

impl CffIndex {
    /// Reads an INDEX at the parser's cursor, leaving the cursor just past its data
    pub fn parse(parser: &mut impl BinaryParser) -> anyhow::Result<Self> {
        let count = parser.parse_u16()?;

        if count == 0 {
            return Ok(Self::default());
        }

        let offsize = parser.next()?;
        anyhow::ensure!((1..=4).contains(&offsize), "invalid INDEX offsize: {}", offsize);

        let mut relative = Vec::with_capacity(usize::from(count) + 1);
        for _ in 0..=count {
            relative.push(parser.parse_sized(offsize)? as usize);
        }

        // offsets are relative to the byte preceding the data
        let base = parser.cursor() - 1;

        let mut offsets = Vec::with_capacity(relative.len());
        let mut last = 1;

        for offset in relative {
            anyhow::ensure!(offset >= last, "INDEX offsets are not ascending");
            offsets.push(base + offset);
            last = offset;
        }

        let end = offsets[offsets.len() - 1];
        anyhow::ensure!(end <= parser.buffer().len(), "INDEX data extends past end of font");

        parser.seek(end)?;

        Ok(Self { offsets })
    }

    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Where the `idx`th entry lives in the font program
    pub fn entry_range(&self, idx: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(idx)?;
        let end = *self.offsets.get(idx + 1)?;

        Some(start..end)
    }

    pub fn get<'a>(&self, data: &'a [u8], idx: usize) -> Option<&'a [u8]> {
        data.get(self.entry_range(idx)?)
    }

    pub fn iter<'a>(&'a self, data: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
        (0..self.len()).filter_map(move |idx| self.get(data, idx))
    }
}

/// Serializes entries as an INDEX, for building font programs in tests
#[cfg(test)]
pub(crate) fn build_index(entries: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(entries.len() as u16).to_be_bytes());

    if entries.is_empty() {
        return out;
    }

    out.push(4);

    let mut offset = 1u32;
    out.extend_from_slice(&offset.to_be_bytes());
    for entry in entries {
        offset += entry.len() as u32;
        out.extend_from_slice(&offset.to_be_bytes());
    }

    for entry in entries {
        out.extend_from_slice(entry);
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_binary::ByteReader;

    #[test]
    fn entries_are_located_absolutely() {
        let mut data = b"junk".to_vec();
        data.extend(build_index(&[b"one", b"", b"three"]));
        data.extend_from_slice(b"after");

        let mut reader = ByteReader::at(&data, 4);
        let index = CffIndex::parse(&mut reader).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(&data, 0), Some(&b"one"[..]));
        assert_eq!(index.get(&data, 1), Some(&b""[..]));
        assert_eq!(index.get(&data, 2), Some(&b"three"[..]));
        assert_eq!(index.get(&data, 3), None);

        assert_eq!(&data[reader.cursor()..], b"after");
    }

    #[test]
    fn empty_index_is_two_bytes() {
        let data = [0, 0, 42];
        let mut reader = ByteReader::new(&data);

        let index = CffIndex::parse(&mut reader).unwrap();

        assert!(index.is_empty());
        assert_eq!(reader.cursor(), 2);
    }

    #[test]
    fn offsets_past_end_are_rejected() {
        let data = [0, 1, 1, 1, 9, b'a'];
        let mut reader = ByteReader::new(&data);

        assert!(CffIndex::parse(&mut reader).is_err());
    }
}
