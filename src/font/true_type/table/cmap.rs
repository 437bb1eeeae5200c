#[derive(Debug, Default)]
pub struct CmapTable {
    pub subtables: Vec<CmapEncodingRecord>,
}

impl CmapTable {
    pub fn find(&self, platform_id: u16, encoding_id: u16) -> Option<&CmapSubtable> {
        self.subtables
            .iter()
            .find(|record| record.platform_id == platform_id && record.encoding_id == encoding_id)
            .map(|record| &record.subtable)
    }

    /// Any Unicode subtable, preferring Windows over the Unicode platform
    pub fn find_unicode(&self) -> Option<&CmapSubtable> {
        self.find(3, 1)
            .or_else(|| self.find(3, 10))
            .or_else(|| {
                self.subtables
                    .iter()
                    .find(|record| record.platform_id == 0)
                    .map(|record| &record.subtable)
            })
    }
}

#[derive(Debug)]
pub struct CmapEncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub subtable: CmapSubtable,
}

#[derive(Debug)]
pub enum CmapSubtable {
    /// Byte encoding table
    Zero { glyph_index_array: Vec<u8> },

    /// Segment mapping to delta values
    Four {
        end_code: Vec<u16>,
        start_code: Vec<u16>,
        id_delta: Vec<i16>,
        id_range_offset: Vec<u16>,
        glyph_index_array: Vec<u16>,
    },

    /// Trimmed table mapping
    Six {
        first_code: u16,
        glyph_index_array: Vec<u16>,
    },

    /// Segmented coverage
    Twelve { groups: Vec<CmapGroup> },

    /// A format this crate doesn't read, mapping nothing
    Unsupported(u16),
}

#[derive(Debug, Clone, Copy)]
pub struct CmapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_code: u32,
}

impl CmapSubtable {
    /// The glyph a character code maps to. Glyph 0 means unmapped
    pub fn lookup(&self, code: u32) -> Option<u16> {
        let glyph_id = match self {
            CmapSubtable::Zero { glyph_index_array } => {
                u16::from(*glyph_index_array.get(usize::try_from(code).ok()?)?)
            }
            CmapSubtable::Four {
                end_code,
                start_code,
                id_delta,
                id_range_offset,
                glyph_index_array,
            } => {
                let code = u16::try_from(code).ok()?;

                // segments are sorted by end code
                let segment = end_code.partition_point(|&end| end < code);

                let start = *start_code.get(segment)?;
                if code < start {
                    return None;
                }

                let delta = *id_delta.get(segment)?;
                let range_offset = *id_range_offset.get(segment)?;

                if range_offset == 0 {
                    code.wrapping_add_signed(delta)
                } else {
                    // `idRangeOffset` is relative to its own position in the table, which is
                    // `seg_count - segment` entries before the glyph index array
                    let idx = usize::from(range_offset / 2) + usize::from(code - start);
                    let idx = idx.checked_sub(id_range_offset.len() - segment)?;

                    match *glyph_index_array.get(idx)? {
                        0 => 0,
                        glyph_id => glyph_id.wrapping_add_signed(delta),
                    }
                }
            }
            CmapSubtable::Six {
                first_code,
                glyph_index_array,
            } => {
                let idx = code.checked_sub(u32::from(*first_code))?;
                *glyph_index_array.get(usize::try_from(idx).ok()?)?
            }
            CmapSubtable::Twelve { groups } => {
                let idx = groups.partition_point(|group| group.end_char_code < code);
                let group = groups.get(idx)?;

                if code < group.start_char_code {
                    return None;
                }

                u16::try_from(group.start_glyph_code + (code - group.start_char_code)).ok()?
            }
            CmapSubtable::Unsupported(..) => return None,
        };

        (glyph_id != 0).then_some(glyph_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn format_4() -> CmapSubtable {
        // 'A'..='C' by delta, 'a'..='b' through the glyph index array
        CmapSubtable::Four {
            end_code: vec![0x43, 0x62, 0xffff],
            start_code: vec![0x41, 0x61, 0xffff],
            id_delta: vec![-0x40, 0, 1],
            id_range_offset: vec![0, 4, 0],
            glyph_index_array: vec![7, 0],
        }
    }

    #[test]
    fn format_4_delta() {
        let cmap = format_4();

        assert_eq!(cmap.lookup(0x41), Some(1));
        assert_eq!(cmap.lookup(0x43), Some(3));
        assert_eq!(cmap.lookup(0x44), None);
    }

    #[test]
    fn format_4_range_offset() {
        let cmap = format_4();

        assert_eq!(cmap.lookup(0x61), Some(7));
        assert_eq!(cmap.lookup(0x62), None);
    }

    #[test]
    fn format_12_groups() {
        let cmap = CmapSubtable::Twelve {
            groups: vec![
                CmapGroup {
                    start_char_code: 0x20,
                    end_char_code: 0x7e,
                    start_glyph_code: 3,
                },
                CmapGroup {
                    start_char_code: 0x1f600,
                    end_char_code: 0x1f601,
                    start_glyph_code: 500,
                },
            ],
        };

        assert_eq!(cmap.lookup(0x20), Some(3));
        assert_eq!(cmap.lookup(0x1f601), Some(501));
        assert_eq!(cmap.lookup(0x7f), None);
    }

    #[test]
    fn format_6_trimmed() {
        let cmap = CmapSubtable::Six {
            first_code: 10,
            glyph_index_array: vec![4, 5],
        };

        assert_eq!(cmap.lookup(9), None);
        assert_eq!(cmap.lookup(11), Some(5));
    }
}
