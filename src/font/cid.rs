use crate::{
    error::PdfResult,
    objects::{Dictionary, Object},
    Resolve,
};

use super::descriptor::FontDescriptor;

#[pdf_enum]
pub enum CidFontSubtype {
    /// Glyphs from a CID-keyed CFF program, selected by CID
    CidFontType0 = "CIDFontType0",

    /// Glyphs from a TrueType program, selected through `/CIDToGIDMap`
    CidFontType2 = "CIDFontType2",
}

#[derive(Debug, Clone, PartialEq)]
pub enum CidToGidMap {
    Identity,

    /// Glyph ids indexed by CID
    Map(Vec<u16>),
}

impl CidToGidMap {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        match resolver.resolve(obj)? {
            Object::Name(name) if name == "Identity" => Ok(Self::Identity),
            Object::Stream(stream) => Ok(Self::Map(
                stream
                    .decode(resolver)?
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect(),
            )),
            other => {
                log::warn!("invalid /CIDToGIDMap {:?}, using identity", other.object_type());
                Ok(Self::Identity)
            }
        }
    }

    pub fn glyph_id(&self, cid: u32) -> Option<u16> {
        match self {
            Self::Identity => u16::try_from(cid).ok(),
            Self::Map(map) => map.get(usize::try_from(cid).ok()?).copied(),
        }
    }
}

/// A descendant font of a Type 0 font
#[derive(Debug, Clone)]
pub struct CidFont {
    pub subtype: CidFontSubtype,
    pub base_font: String,
    pub descriptor: Option<FontDescriptor>,
    pub widths: CidWidths,
    pub vertical_metrics: VerticalMetrics,

    /// Only meaningful for `CIDFontType2`
    pub cid_to_gid: CidToGidMap,
}

impl CidFont {
    pub fn from_dict(dict: Dictionary, resolver: &dyn Resolve) -> PdfResult<Self> {
        dict.expect_type("Font", resolver, true)?;

        let subtype = CidFontSubtype::from_str(&dict.expect_name("Subtype", resolver)?)?;
        let base_font = dict.get_name("BaseFont", resolver)?.unwrap_or_default();
        let descriptor = dict
            .get_dict("FontDescriptor", resolver)?
            .map(|dict| FontDescriptor::from_dict(dict, resolver))
            .transpose()?;

        let default_width = dict.get_number("DW", resolver)?.unwrap_or(1000.0);
        let widths = CidWidths::new(default_width, dict.get_arr("W", resolver)?, resolver)?;

        let vertical_metrics = VerticalMetrics::new(
            dict.get_number_arr("DW2", resolver)?,
            dict.get_arr("W2", resolver)?,
            resolver,
        )?;

        let cid_to_gid = match dict.get_object("CIDToGIDMap", resolver)? {
            Some(obj) => CidToGidMap::from_obj(obj, resolver)?,
            None => CidToGidMap::Identity,
        };

        Ok(Self {
            subtype,
            base_font,
            descriptor,
            widths,
            vertical_metrics,
            cid_to_gid,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CidRange<T> {
    first: u32,
    last: u32,
    value: T,
}

/// `/W` and `/DW`, in thousandths of text space
#[derive(Debug, Clone, PartialEq)]
pub struct CidWidths {
    default: f32,
    ranges: Vec<CidRange<f32>>,
}

impl CidWidths {
    fn new(default: f32, w: Option<Vec<Object>>, resolver: &dyn Resolve) -> PdfResult<Self> {
        let mut ranges = Vec::new();

        if let Some(w) = w {
            parse_cid_ranges(w, 1, resolver, |first, last, values| {
                ranges.push(CidRange {
                    first,
                    last,
                    value: values[0],
                })
            })?;
        }

        Ok(Self { default, ranges })
    }

    pub fn get(&self, cid: u32) -> f32 {
        find_range(&self.ranges, cid).unwrap_or(self.default)
    }
}

/// `/W2` and `/DW2`, for vertical writing
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalMetrics {
    /// The y component of the position vector, and the vertical displacement
    default: (f32, f32),

    /// `[w1y vx vy]` per CID
    ranges: Vec<CidRange<[f32; 3]>>,
}

impl VerticalMetrics {
    const DEFAULT: (f32, f32) = (880.0, -1000.0);

    fn new(
        dw2: Option<Vec<f32>>,
        w2: Option<Vec<Object>>,
        resolver: &dyn Resolve,
    ) -> PdfResult<Self> {
        let default = match dw2.as_deref() {
            Some(&[vy, w1]) => (vy, w1),
            Some(other) => {
                log::warn!("/DW2 has {} entries, expected 2", other.len());
                Self::DEFAULT
            }
            None => Self::DEFAULT,
        };

        let mut ranges = Vec::new();

        if let Some(w2) = w2 {
            parse_cid_ranges(w2, 3, resolver, |first, last, values| {
                ranges.push(CidRange {
                    first,
                    last,
                    value: [values[0], values[1], values[2]],
                })
            })?;
        }

        Ok(Self { default, ranges })
    }

    /// `(w1y, vx, vy)`, where `horizontal_width` supplies the default `vx`
    pub fn get(&self, cid: u32, horizontal_width: f32) -> (f32, f32, f32) {
        match find_range(&self.ranges, cid) {
            Some([w1, vx, vy]) => (w1, vx, vy),
            None => (self.default.1, horizontal_width / 2.0, self.default.0),
        }
    }
}

fn find_range<T: Copy>(ranges: &[CidRange<T>], cid: u32) -> Option<T> {
    ranges
        .iter()
        .find(|range| (range.first..=range.last).contains(&cid))
        .map(|range| range.value)
}

/// Both `/W` and `/W2` mix two forms: `c [v v v ...]`, giving consecutive CIDs from `c` their own
/// group of `group` values, and `c_first c_last v...`, sharing one group across a range
fn parse_cid_ranges(
    arr: Vec<Object>,
    group: usize,
    resolver: &dyn Resolve,
    mut push: impl FnMut(u32, u32, &[f32]),
) -> PdfResult<()> {
    let mut objs = arr.into_iter();

    while let Some(first) = objs.next() {
        let first = resolver.assert_unsigned_integer(first)?;

        let Some(next) = objs.next() else {
            log::warn!("truncated CID metrics array");
            break;
        };

        match resolver.resolve(next)? {
            Object::Array(values) => {
                let values = values
                    .into_iter()
                    .map(|obj| resolver.assert_number(obj))
                    .collect::<PdfResult<Vec<f32>>>()?;

                for (cid, chunk) in (first..).zip(values.chunks_exact(group)) {
                    push(cid, cid, chunk);
                }
            }
            last => {
                let last = resolver.assert_unsigned_integer(last)?;

                let values = objs
                    .by_ref()
                    .take(group)
                    .map(|obj| resolver.assert_number(obj))
                    .collect::<PdfResult<Vec<f32>>>()?;

                if values.len() < group {
                    log::warn!("truncated CID metrics array");
                    break;
                }

                push(first, last, &values);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{resolve::NoResolve, test_util::parse_object};

    fn arr(src: &[u8]) -> Vec<Object> {
        match parse_object(src) {
            Object::Array(arr) => arr,
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn widths_in_both_forms() {
        let widths = CidWidths::new(
            1000.0,
            Some(arr(b"[120 [400 325 500] 7080 8032 1000 2 [250]]")),
            &NoResolve,
        )
        .unwrap();

        assert_eq!(widths.get(120), 400.0);
        assert_eq!(widths.get(122), 500.0);
        assert_eq!(widths.get(123), 1000.0);
        assert_eq!(widths.get(8000), 1000.0);
        assert_eq!(widths.get(2), 250.0);

        let widths = CidWidths::new(500.0, Some(arr(b"[10 20 300]")), &NoResolve).unwrap();
        assert_eq!(widths.get(15), 300.0);
        assert_eq!(widths.get(9), 500.0);
    }

    #[test]
    fn vertical_metrics_defaults() {
        let metrics = VerticalMetrics::new(None, None, &NoResolve).unwrap();

        assert_eq!(metrics.get(5, 600.0), (-1000.0, 300.0, 880.0));
    }

    #[test]
    fn vertical_metrics_from_w2() {
        let metrics = VerticalMetrics::new(
            Some(vec![900.0, -1000.0]),
            Some(arr(b"[120 [-1000 250 772] 130 140 -500 300 800]")),
            &NoResolve,
        )
        .unwrap();

        assert_eq!(metrics.get(120, 500.0), (-1000.0, 250.0, 772.0));
        assert_eq!(metrics.get(135, 500.0), (-500.0, 300.0, 800.0));
        assert_eq!(metrics.get(1, 500.0), (-1000.0, 250.0, 900.0));
    }

    #[test]
    fn cid_to_gid_map() {
        assert_eq!(CidToGidMap::Identity.glyph_id(70_000), None);
        assert_eq!(CidToGidMap::Map(vec![0, 9, 4]).glyph_id(1), Some(9));
        assert_eq!(CidToGidMap::Map(vec![0, 9, 4]).glyph_id(3), None);
    }
}
