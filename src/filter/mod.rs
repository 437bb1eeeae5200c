use bytes::Bytes;

use crate::{
    error::{PdfError, PdfResult},
    objects::Dictionary,
    resolve::Resolve,
};

use self::predictor::PredictorParams;

pub mod ascii;
pub mod dct;
pub mod flate;
pub mod lzw;
pub mod predictor;
pub mod run_length;

/// Applies `filters` in order. With `stop_at_image`, decoding halts before the first image codec,
/// which is returned so the caller can decode pixels itself
pub(crate) fn decode_stream(
    mut data: Bytes,
    filters: &[(FilterKind, Option<Dictionary>)],
    stop_at_image: bool,
    resolver: &dyn Resolve,
) -> PdfResult<(Bytes, Option<(FilterKind, Option<Dictionary>)>)> {
    for (idx, (filter, params)) in filters.iter().enumerate() {
        if filter.is_image_codec() {
            if stop_at_image && idx == filters.len() - 1 {
                return Ok((data, Some((*filter, params.clone()))));
            }

            return Err(PdfError::InvalidFilter {
                filter: filter.as_str().to_owned(),
            });
        }

        data = match filter {
            FilterKind::AsciiHex => Bytes::from(ascii::decode_ascii_hex(&data)),
            FilterKind::Ascii85 => Bytes::from(ascii::decode_ascii_85(&data)),
            FilterKind::Flate => {
                let params = PredictorParams::from_dict(params.as_ref(), resolver)?;
                Bytes::from(params.apply(flate::decode_flate(&data)?)?)
            }
            FilterKind::Lzw => {
                let predictor = PredictorParams::from_dict(params.as_ref(), resolver)?;
                let early_change = match params {
                    Some(dict) => dict.get_integer("EarlyChange", resolver)?.unwrap_or(1),
                    None => 1,
                };
                Bytes::from(predictor.apply(lzw::decode_lzw(&data, early_change != 0))?)
            }
            FilterKind::RunLength => Bytes::from(run_length::decode_run_length(&data)),
            // only the `/Identity` crypt filter is meaningful after decryption
            FilterKind::Crypt => data,
            FilterKind::CcittFax | FilterKind::Jbig2 | FilterKind::Dct | FilterKind::Jpx => {
                unreachable!("image codecs are handled above")
            }
        };
    }

    Ok((data, None))
}

#[pdf_enum]
pub enum FilterKind {
    /// Decodes data encoded in an ASCII hexadecimal representation, reproducing
    /// the original binary data
    AsciiHex = "ASCIIHexDecode",

    /// Decodes data encoded in an ASCII base-85 representation, reproducing the
    /// original binary data
    Ascii85 = "ASCII85Decode",

    /// Decompresses data encoded using the LZW (Lempel-Ziv-Welch) adaptive compression
    /// method, reproducing the original text or binary data
    Lzw = "LZWDecode",

    /// Decompresses data encoded using the zlib/deflate compression method,
    /// reproducing the original text or binary data
    Flate = "FlateDecode",

    /// Decompresses data encoded using a byte-oriented run-length encoding algorithm
    RunLength = "RunLengthDecode",

    /// Decompresses data encoded using the CCITT facsimile standard
    CcittFax = "CCITTFaxDecode",

    /// Decompresses data encoded using the JBIG2 standard
    Jbig2 = "JBIG2Decode",

    /// Decompresses data encoded using a DCT (discrete cosine transform) technique
    /// based on the JPEG standard
    Dct = "DCTDecode",

    /// Decompresses data encoded using the wavelet-based JPEG2000 standard
    Jpx = "JPXDecode",

    /// Decrypts data encrypted by a security handler
    Crypt = "Crypt",
}

impl FilterKind {
    /// Accepts both full names and the abbreviations allowed in inline images
    pub fn from_abbreviation(name: &str) -> PdfResult<Self> {
        Ok(match name {
            "AHx" => Self::AsciiHex,
            "A85" => Self::Ascii85,
            "LZW" => Self::Lzw,
            "Fl" => Self::Flate,
            "RL" => Self::RunLength,
            "CCF" => Self::CcittFax,
            "DCT" => Self::Dct,
            name => Self::from_str(name)?,
        })
    }

    pub fn is_image_codec(&self) -> bool {
        matches!(self, Self::CcittFax | Self::Jbig2 | Self::Dct | Self::Jpx)
    }
}
