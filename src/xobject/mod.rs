use crate::{error::PdfResult, stream::Stream, Resolve};

pub use self::{form::Form, image::Image};

mod form;
mod image;

#[pdf_enum]
pub enum XObjectSubtype {
    /// PostScript XObjects are never drawn
    PostScript = "PS",
    Image = "Image",
    Form = "Form",
}

impl XObjectSubtype {
    const TYPE: &'static str = "XObject";

    pub fn of(stream: &Stream, resolver: &dyn Resolve) -> PdfResult<Self> {
        stream.dict.expect_type(Self::TYPE, resolver, true)?;

        Self::from_str(&stream.dict.expect_name("Subtype", resolver)?)
    }
}
