use bytes::Bytes;

use crate::{
    data_structures::{Matrix, Rectangle},
    error::PdfResult,
    objects::Dictionary,
    stream::Stream,
    Resolve,
};

/// A form XObject: a self-contained content stream, drawn by `Do`
#[derive(Debug, Clone)]
pub struct Form {
    /// Clips everything the form draws, in form space
    pub bbox: Rectangle,

    /// Form space to the user space of the invoking content stream
    pub matrix: Matrix,

    /// When absent, names resolve through the resources of the invoking stream
    pub resources: Option<Dictionary>,

    /// The decoded content stream
    pub content: Bytes,
}

impl Form {
    pub fn from_stream(stream: &Stream, resolver: &dyn Resolve) -> PdfResult<Self> {
        let dict = &stream.dict;

        let bbox = dict
            .get_typed::<Rectangle>("BBox", resolver)?
            .ok_or(crate::PdfError::MissingRequiredKey { key: "BBox" })?;
        let matrix = dict
            .get_typed::<Matrix>("Matrix", resolver)?
            .unwrap_or_else(Matrix::identity);
        let resources = dict.get_dict("Resources", resolver)?;
        let content = stream.decode(resolver)?;

        Ok(Self {
            bbox,
            matrix,
            resources,
            content,
        })
    }
}
