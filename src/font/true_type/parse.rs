use std::{fmt, ops::Range};

use crate::{data_structures::Matrix, parse_binary::BinaryParser};

use super::table::{
    CmapEncodingRecord, CmapGroup, CmapSubtable, CmapTable, CompoundGlyphComponentFlags,
    CompoundGlyphPart, DirectoryTableEntry, FontDirectory, GlyphPoint, Head, HorizontalMetrics,
    LocaTable, MaxpTable, OutlineFlag, PostTable, SimpleGlyph, TableTag, TrueTypeGlyph,
    MAC_GLYPH_NAMES,
};

pub(super) struct TrueTypeParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl fmt::Debug for TrueTypeParser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeParser")
            .field("cursor", &self.cursor)
            .field("buffer", &format!("[ {} bytes ]", self.buffer.len()))
            .finish()
    }
}

impl BinaryParser for TrueTypeParser<'_> {
    fn buffer(&self) -> &[u8] {
        self.buffer
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }
}

impl<'a> TrueTypeParser<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    fn read_tag(&mut self) -> anyhow::Result<TableTag> {
        let b1 = self.next()?;
        let b2 = self.next()?;
        let b3 = self.next()?;
        let b4 = self.next()?;

        Ok(TableTag::new([b1, b2, b3, b4]))
    }
}

/// Table parsing
impl TrueTypeParser<'_> {
    pub fn read_font_directory(&mut self) -> anyhow::Result<FontDirectory> {
        self.seek(0)?;

        let sfnt_version = self.parse_u32()?;
        let number_of_tables = self.parse_u16()?;

        // searchRange, entrySelector, rangeShift
        self.skip(6)?;

        let mut tables = Vec::with_capacity(usize::from(number_of_tables));

        for _ in 0..number_of_tables {
            let tag = self.read_tag()?;
            let _checksum = self.parse_u32()?;
            let offset = self.parse_u32()?;
            let length = self.parse_u32()?;

            tables.push(DirectoryTableEntry {
                tag,
                offset,
                length,
            });
        }

        Ok(FontDirectory {
            sfnt_version,
            tables,
        })
    }

    pub fn read_head_table(&mut self, range: Range<usize>) -> anyhow::Result<Head> {
        self.seek(range.start)?;

        let version = self.parse_u32()?;
        anyhow::ensure!(version >> 16 == 1, "unsupported head version: {:#x}", version);

        let _font_revision = self.parse_u32()?;
        let _check_sum_adjustment = self.parse_u32()?;

        let magic_number = self.parse_u32()?;
        anyhow::ensure!(
            magic_number == Head::MAGIC_NUMBER,
            "invalid head magic number: {:#x}",
            magic_number
        );

        let _flags = self.parse_u16()?;
        let units_per_em = self.parse_u16()?;

        // created, modified, bounding box, macStyle, lowestRecPPEM, fontDirectionHint
        self.skip(8 + 8 + 8 + 2 + 2 + 2)?;

        let index_to_loc_format = self.parse_i16()?;

        Ok(Head {
            units_per_em: if units_per_em == 0 { 1000 } else { units_per_em },
            index_to_loc_format,
        })
    }

    pub fn read_maxp_table(&mut self, range: Range<usize>) -> anyhow::Result<MaxpTable> {
        self.seek(range.start)?;

        // 0.5 for fonts with CFF outlines, 1.0 otherwise
        let _version = self.parse_u32()?;
        let num_glyphs = self.parse_u16()?;

        Ok(MaxpTable { num_glyphs })
    }

    pub fn read_loca_table(
        &mut self,
        range: Range<usize>,
        format: i16,
        num_glyphs: u16,
    ) -> anyhow::Result<LocaTable> {
        self.seek(range.start)?;

        let count = usize::from(num_glyphs) + 1;
        let mut offsets = Vec::with_capacity(count);

        for _ in 0..count {
            if self.cursor >= range.end {
                break;
            }

            offsets.push(match format {
                // short offsets are stored halved
                0 => u32::from(self.parse_u16()?) * 2,
                1 => self.parse_u32()?,
                _ => anyhow::bail!("unsupported loca table format: {}", format),
            });
        }

        Ok(LocaTable { offsets })
    }

    pub fn read_horizontal_metrics(
        &mut self,
        hhea: Range<usize>,
        hmtx: Range<usize>,
    ) -> anyhow::Result<HorizontalMetrics> {
        // numOfLongHorMetrics is the last field of hhea
        self.seek(hhea.start + 34)?;
        let num_long_metrics = self.parse_u16()?;

        self.seek(hmtx.start)?;

        let mut advances = Vec::with_capacity(usize::from(num_long_metrics));

        for _ in 0..num_long_metrics {
            if self.cursor + 4 > hmtx.end {
                break;
            }

            advances.push(self.parse_u16()?);
            let _left_side_bearing = self.parse_i16()?;
        }

        Ok(HorizontalMetrics { advances })
    }

    pub fn read_cmap_table(&mut self, range: Range<usize>) -> anyhow::Result<CmapTable> {
        self.seek(range.start)?;

        let _version = self.parse_u16()?;
        let number_subtables = self.parse_u16()?;

        let mut records = Vec::with_capacity(usize::from(number_subtables));

        for _ in 0..number_subtables {
            let platform_id = self.parse_u16()?;
            let encoding_id = self.parse_u16()?;
            let offset = self.parse_u32()? as usize;

            records.push((platform_id, encoding_id, offset));
        }

        let mut subtables = Vec::with_capacity(records.len());

        for (platform_id, encoding_id, offset) in records {
            self.seek(range.start + offset)?;

            match self.parse_cmap_subtable() {
                Ok(subtable) => subtables.push(CmapEncodingRecord {
                    platform_id,
                    encoding_id,
                    subtable,
                }),
                Err(e) => log::warn!(
                    "skipping malformed cmap subtable ({}, {}): {}",
                    platform_id,
                    encoding_id,
                    e
                ),
            }
        }

        Ok(CmapTable { subtables })
    }

    fn parse_cmap_subtable(&mut self) -> anyhow::Result<CmapSubtable> {
        let format = self.parse_u16()?;

        match format {
            0 => self.parse_cmap_subtable_0(),
            4 => self.parse_cmap_subtable_4(),
            6 => self.parse_cmap_subtable_6(),
            12 => self.parse_cmap_subtable_12(),
            _ => Ok(CmapSubtable::Unsupported(format)),
        }
    }

    fn parse_cmap_subtable_0(&mut self) -> anyhow::Result<CmapSubtable> {
        let _length = self.parse_u16()?;
        let _language = self.parse_u16()?;
        let glyph_index_array = self.take(256)?.to_vec();

        Ok(CmapSubtable::Zero { glyph_index_array })
    }

    fn parse_cmap_subtable_4(&mut self) -> anyhow::Result<CmapSubtable> {
        let start_pos = self.cursor - 2;
        let length = usize::from(self.parse_u16()?);
        let _language = self.parse_u16()?;
        let seg_count = usize::from(self.parse_u16()? / 2);

        // searchRange, entrySelector, rangeShift
        self.skip(6)?;

        let end_code = self.read_u16_array(seg_count)?;
        let _reserved_pad = self.parse_u16()?;
        let start_code = self.read_u16_array(seg_count)?;
        let id_delta = self
            .read_u16_array(seg_count)?
            .into_iter()
            .map(|delta| delta as i16)
            .collect();
        let id_range_offset = self.read_u16_array(seg_count)?;

        // some fonts get `length` wrong, so the array is bounded by the buffer too
        let end = (start_pos + length).min(self.buffer.len());
        let remaining = end.saturating_sub(self.cursor) / 2;
        let glyph_index_array = self.read_u16_array(remaining)?;

        Ok(CmapSubtable::Four {
            end_code,
            start_code,
            id_delta,
            id_range_offset,
            glyph_index_array,
        })
    }

    fn parse_cmap_subtable_6(&mut self) -> anyhow::Result<CmapSubtable> {
        let _length = self.parse_u16()?;
        let _language = self.parse_u16()?;
        let first_code = self.parse_u16()?;
        let entry_count = self.parse_u16()?;

        let glyph_index_array = self.read_u16_array(usize::from(entry_count))?;

        Ok(CmapSubtable::Six {
            first_code,
            glyph_index_array,
        })
    }

    fn parse_cmap_subtable_12(&mut self) -> anyhow::Result<CmapSubtable> {
        let _reserved = self.parse_u16()?;
        let _length = self.parse_u32()?;
        let _language = self.parse_u32()?;
        let n_groups = self.parse_u32()?;

        anyhow::ensure!(
            n_groups as usize <= self.buffer.len() / 12,
            "too many cmap groups: {}",
            n_groups
        );

        let mut groups = Vec::with_capacity(n_groups as usize);

        for _ in 0..n_groups {
            let start_char_code = self.parse_u32()?;
            let end_char_code = self.parse_u32()?;
            let start_glyph_code = self.parse_u32()?;

            anyhow::ensure!(start_char_code <= end_char_code, "invalid cmap group");

            groups.push(CmapGroup {
                start_char_code,
                end_char_code,
                start_glyph_code,
            });
        }

        Ok(CmapSubtable::Twelve { groups })
    }

    /// Glyph names, for the formats that carry them
    pub fn read_post_table(&mut self, range: Range<usize>) -> anyhow::Result<Option<PostTable>> {
        self.seek(range.start)?;

        let version = self.parse_u32()?;

        let glyph_names = match version {
            0x0001_0000 => MAC_GLYPH_NAMES.iter().map(|&name| name.to_owned()).collect(),
            0x0002_0000 => {
                // italicAngle, underlinePosition, underlineThickness, isFixedPitch, memory usage
                self.skip(4 + 2 + 2 + 4 + 16)?;

                let num_glyphs = usize::from(self.parse_u16()?);
                let indices = self.read_u16_array(num_glyphs)?;

                let mut custom = Vec::new();
                while self.cursor < range.end {
                    let len = usize::from(self.next()?);
                    custom.push(String::from_utf8_lossy(self.take(len)?).into_owned());
                }

                indices
                    .into_iter()
                    .map(|idx| {
                        let idx = usize::from(idx);

                        match MAC_GLYPH_NAMES.get(idx) {
                            Some(&name) => name.to_owned(),
                            None => custom
                                .get(idx - MAC_GLYPH_NAMES.len())
                                .cloned()
                                .unwrap_or_default(),
                        }
                    })
                    .collect()
            }
            _ => return Ok(None),
        };

        Ok(Some(PostTable { glyph_names }))
    }

    pub fn parse_glyph(&mut self, range: Range<usize>) -> anyhow::Result<TrueTypeGlyph> {
        if range.is_empty() {
            return Ok(TrueTypeGlyph::Empty);
        }

        self.seek(range.start)?;

        let number_of_contours = self.parse_i16()?;

        // xMin, yMin, xMax, yMax
        self.skip(8)?;

        if number_of_contours >= 0 {
            Ok(TrueTypeGlyph::Simple(
                self.parse_simple_glyph(number_of_contours as usize)?,
            ))
        } else {
            Ok(TrueTypeGlyph::Compound(self.parse_compound_glyph()?))
        }
    }

    fn parse_simple_glyph(&mut self, number_of_contours: usize) -> anyhow::Result<SimpleGlyph> {
        let end_points_of_contours = self.read_u16_array(number_of_contours)?;

        let instruction_length = self.parse_u16()?;
        self.skip(usize::from(instruction_length))?;

        let number_of_points = match end_points_of_contours.last() {
            Some(&last) => usize::from(last) + 1,
            None => 0,
        };

        let flags = self.parse_simple_glyph_flags(number_of_points)?;

        let xs = self.parse_coordinates(
            &flags,
            OutlineFlag::X_SHORT_VECTOR,
            OutlineFlag::X_SAME_OR_POSITIVE,
        )?;
        let ys = self.parse_coordinates(
            &flags,
            OutlineFlag::Y_SHORT_VECTOR,
            OutlineFlag::Y_SAME_OR_POSITIVE,
        )?;

        let points = flags
            .iter()
            .zip(xs.into_iter().zip(ys))
            .map(|(&flag, (x, y))| GlyphPoint {
                x,
                y,
                on_curve: flag & OutlineFlag::ON_CURVE != 0,
            })
            .collect();

        Ok(SimpleGlyph {
            end_points_of_contours,
            points,
        })
    }

    fn parse_simple_glyph_flags(&mut self, number_of_points: usize) -> anyhow::Result<Vec<u8>> {
        let mut flags = Vec::with_capacity(number_of_points);

        while flags.len() < number_of_points {
            let flag = self.next()?;
            flags.push(flag);

            if flag & OutlineFlag::REPEAT != 0 {
                let num_repeat = self.next()?;
                for _ in 0..num_repeat {
                    flags.push(flag);
                }
            }
        }

        flags.truncate(number_of_points);

        Ok(flags)
    }

    /// Coordinates are deltas from the previous point
    fn parse_coordinates(
        &mut self,
        flags: &[u8],
        short: u8,
        same_or_positive: u8,
    ) -> anyhow::Result<Vec<i32>> {
        let mut coords = Vec::with_capacity(flags.len());
        let mut last = 0i32;

        for &flag in flags {
            let is_short = flag & short != 0;
            let is_same_or_positive = flag & same_or_positive != 0;

            let delta = match (is_short, is_same_or_positive) {
                (false, false) => i32::from(self.parse_i16()?),
                (false, true) => 0,
                (true, false) => -i32::from(self.next()?),
                (true, true) => i32::from(self.next()?),
            };

            last += delta;
            coords.push(last);
        }

        Ok(coords)
    }

    fn parse_compound_glyph(&mut self) -> anyhow::Result<Vec<CompoundGlyphPart>> {
        let mut parts = Vec::new();

        loop {
            let flags = self.parse_u16()?;
            let glyph_index = self.parse_u16()?;

            let (arg1, arg2) = if flags & CompoundGlyphComponentFlags::ARG_1_AND_2_ARE_WORDS != 0 {
                (f32::from(self.parse_i16()?), f32::from(self.parse_i16()?))
            } else {
                (
                    f32::from(self.next()? as i8),
                    f32::from(self.next()? as i8),
                )
            };

            let (mut a, mut b, mut c, mut d) = (1.0, 0.0, 0.0, 1.0);

            if flags & CompoundGlyphComponentFlags::WE_HAVE_A_SCALE != 0 {
                a = self.parse_f2dot14()?;
                d = a;
            } else if flags & CompoundGlyphComponentFlags::WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                a = self.parse_f2dot14()?;
                d = self.parse_f2dot14()?;
            } else if flags & CompoundGlyphComponentFlags::WE_HAVE_A_TWO_BY_TWO != 0 {
                a = self.parse_f2dot14()?;
                b = self.parse_f2dot14()?;
                c = self.parse_f2dot14()?;
                d = self.parse_f2dot14()?;
            }

            // matching points of the parent and component is not supported, such components
            // are placed without an offset
            let (dx, dy) = if flags & CompoundGlyphComponentFlags::ARGS_ARE_XY_VALUES != 0 {
                (arg1, arg2)
            } else {
                log::trace!("compound glyph component placed by point matching");
                (0.0, 0.0)
            };

            parts.push(CompoundGlyphPart {
                glyph_index,
                transform: Matrix::new(a, b, c, d, dx, dy),
            });

            if flags & CompoundGlyphComponentFlags::MORE_COMPONENTS == 0 {
                break;
            }
        }

        Ok(parts)
    }

    fn read_u16_array(&mut self, len: usize) -> anyhow::Result<Vec<u16>> {
        (0..len).map(|_| self.parse_u16()).collect()
    }
}
