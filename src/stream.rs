use std::fmt;

use bytes::Bytes;

use crate::{
    error::PdfResult,
    filter::{decode_stream, FilterKind},
    objects::{Dictionary, Object},
    resolve::Resolve,
};

/// A stream object. `data` shares the file's buffer until something (decryption, decoding)
/// needs its own copy
#[derive(Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub(crate) data: Bytes,
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("dict", &self.dict)
            .field("data", &format!("[ {} bytes ]", self.data.len()))
            .finish()
    }
}

impl Stream {
    pub fn new(dict: Dictionary, data: Bytes) -> Self {
        Self { dict, data }
    }

    pub fn raw_data(&self) -> &Bytes {
        &self.data
    }

    pub(crate) fn with_data(self, data: Bytes) -> Self {
        Self {
            dict: self.dict,
            data,
        }
    }

    /// The `/Filter` entries paired with their `/DecodeParms`
    pub fn filters(&self, resolver: &dyn Resolve) -> PdfResult<Vec<(FilterKind, Option<Dictionary>)>> {
        let filters = match self.dict.get_object("Filter", resolver)? {
            Some(Object::Array(arr)) => arr
                .into_iter()
                .map(|obj| resolver.assert_name(obj))
                .collect::<PdfResult<Vec<String>>>()?,
            Some(obj) => vec![resolver.assert_name(obj)?],
            None => Vec::new(),
        };

        let params = match self.dict.get_object("DecodeParms", resolver)? {
            Some(Object::Array(arr)) => arr
                .into_iter()
                .map(|obj| match resolver.resolve(obj)? {
                    Object::Dictionary(dict) => Ok(Some(dict)),
                    _ => Ok(None),
                })
                .collect::<PdfResult<Vec<Option<Dictionary>>>>()?,
            Some(obj) => vec![Some(resolver.assert_dict(obj)?)],
            None => Vec::new(),
        };

        filters
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                Ok((
                    FilterKind::from_abbreviation(name)?,
                    params.get(idx).cloned().flatten(),
                ))
            })
            .collect()
    }

    /// Applies every filter
    pub fn decode(&self, resolver: &dyn Resolve) -> PdfResult<Bytes> {
        let filters = self.filters(resolver)?;
        let (data, _) = decode_stream(self.data.clone(), &filters, false, resolver)?;

        Ok(data)
    }

    /// Applies filters up to, but not including, an image codec such as DCTDecode, which is
    /// returned alongside the partially decoded data
    pub fn decode_until_image(
        &self,
        resolver: &dyn Resolve,
    ) -> PdfResult<(Bytes, Option<(FilterKind, Option<Dictionary>)>)> {
        let filters = self.filters(resolver)?;

        decode_stream(self.data.clone(), &filters, true, resolver)
    }
}
