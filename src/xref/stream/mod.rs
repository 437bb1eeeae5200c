use std::convert::TryFrom;

use crate::{
    error::{PdfError, PdfResult},
    objects::Dictionary,
    resolve::{NoResolve, Resolve},
    stream::Stream,
    trailer::Trailer,
    xref::Xref,
};

use self::parser::XrefStreamParser;

pub(super) mod parser;

#[derive(Debug)]
pub(crate) struct XrefStream {
    pub(crate) dict: XrefStreamDict,
    pub(crate) stream: Stream,
}

impl XrefStream {
    pub fn from_stream(stream: Stream, is_previous: bool) -> PdfResult<Self> {
        let dict = XrefStreamDict::from_dict(&stream.dict, is_previous)?;

        Ok(Self { dict, stream })
    }

    /// Values in an xref stream's dictionary may not be indirect, and the stream itself is never
    /// encrypted, so this needs no resolver
    pub fn parse(self) -> PdfResult<(Xref, Trailer)> {
        let decoded = self.stream.decode(&NoResolve)?;

        let xref = XrefStreamParser::new(&decoded, self.dict.w, self.dict.index).parse()?;

        Ok((xref, self.dict.trailer))
    }
}

#[derive(Debug)]
pub(crate) struct XrefStreamDict {
    pub(crate) trailer: Trailer,

    /// An array containing a pair of integers for each subsection in this
    /// section. The first integer shall be the first object number in the
    /// subsection; the second integer shall be the number of entries in the
    /// subsection.
    ///
    /// Default value: [0 Size].
    pub(crate) index: Vec<(usize, usize)>,

    /// The byte width of each of the three fields of an entry. A width of zero means
    /// the field is absent and takes its default
    pub(crate) w: XrefStreamFieldWidths,
}

impl XrefStreamDict {
    const TYPE: &'static str = "XRef";

    pub fn from_dict(dict: &Dictionary, is_previous: bool) -> PdfResult<Self> {
        let resolver = &NoResolve;

        if let Some(ty) = dict.get_name("Type", resolver)? {
            if ty != Self::TYPE {
                return Err(PdfError::malformed_xref(format!(
                    "expected /Type /{}, found /{}",
                    Self::TYPE,
                    ty
                )));
            }
        }

        let trailer = Trailer::from_dict(dict, is_previous)?;

        let index = dict
            .get_arr("Index", resolver)?
            .map(|index| {
                index
                    .chunks_exact(2)
                    .map(|pair| {
                        Ok((
                            usize::try_from(resolver.assert_unsigned_integer(pair[0].clone())?)?,
                            usize::try_from(resolver.assert_unsigned_integer(pair[1].clone())?)?,
                        ))
                    })
                    .collect::<PdfResult<Vec<(usize, usize)>>>()
            })
            .transpose()?
            .unwrap_or_else(|| vec![(0, trailer.size)]);

        let w = XrefStreamFieldWidths::from_arr(dict.expect_arr("W", resolver)?, resolver)?;

        Ok(XrefStreamDict { trailer, index, w })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum XrefStreamField {
    One = 0,
    Two = 1,
    Three = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct XrefStreamFieldWidths([usize; 3]);

impl XrefStreamFieldWidths {
    pub fn new(widths: [usize; 3]) -> Self {
        Self(widths)
    }

    pub fn from_arr(arr: Vec<crate::Object>, resolver: &dyn Resolve) -> PdfResult<Self> {
        if arr.len() != 3 {
            return Err(PdfError::ArrayOfInvalidLength {
                expected: 3,
                found: arr.len(),
            });
        }

        let mut widths = [0; 3];

        for (width, obj) in widths.iter_mut().zip(arr) {
            *width = usize::try_from(resolver.assert_unsigned_integer(obj)?)?;

            if *width > 8 {
                return Err(PdfError::malformed_xref(format!(
                    "field width {} is too large",
                    width
                )));
            }
        }

        Ok(Self(widths))
    }

    pub fn field_width(&self, field: XrefStreamField) -> usize {
        self.0[field as usize]
    }

    pub fn total_width(&self) -> usize {
        self.0.iter().sum()
    }
}
