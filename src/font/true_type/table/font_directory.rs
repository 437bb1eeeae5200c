use std::ops::Range;

use super::TableTag;

/// The sfnt header's table of contents
#[derive(Debug)]
pub struct FontDirectory {
    pub sfnt_version: u32,
    pub tables: Vec<DirectoryTableEntry>,
}

impl FontDirectory {
    /// `OTTO`, for OpenType fonts carrying CFF outlines
    pub const OPEN_TYPE_CFF: u32 = 0x4f54_544f;

    pub fn find(&self, tag: TableTag) -> Option<&DirectoryTableEntry> {
        self.tables.iter().find(|entry| entry.tag == tag)
    }

    /// The byte range of a table, if the font has it and it lies within `len` bytes
    pub fn table_range(&self, tag: TableTag, len: usize) -> Option<Range<usize>> {
        let entry = self.find(tag)?;

        let start = entry.offset as usize;
        let end = start.checked_add(entry.length as usize)?;

        (end <= len).then_some(start..end)
    }
}

#[derive(Debug)]
pub struct DirectoryTableEntry {
    pub tag: TableTag,
    pub offset: u32,
    pub length: u32,
}
