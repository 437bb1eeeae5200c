mod cmap;
mod font_directory;
mod glyf;
mod head;
mod hmtx;
mod loca;
mod maxp;
mod post;
mod tag;

pub(super) use cmap::{CmapEncodingRecord, CmapGroup, CmapSubtable, CmapTable};
pub(super) use font_directory::{DirectoryTableEntry, FontDirectory};
pub(super) use glyf::{
    CompoundGlyphComponentFlags, CompoundGlyphPart, GlyphPoint, OutlineFlag, SimpleGlyph,
    TrueTypeGlyph,
};
pub(super) use head::Head;
pub(super) use hmtx::HorizontalMetrics;
pub(super) use loca::LocaTable;
pub(super) use maxp::MaxpTable;
pub(super) use post::{PostTable, MAC_GLYPH_NAMES};
pub(super) use tag::TableTag;
