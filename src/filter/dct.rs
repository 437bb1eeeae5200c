use std::io::Cursor;

use jpeg_decoder::PixelFormat;

use crate::error::{PdfError, PdfResult};

/// Samples produced by the JPEG decoder, 8 bits per component
#[derive(Debug)]
pub struct DecodedJpeg {
    pub width: usize,
    pub height: usize,
    pub components: usize,
    pub pixels: Vec<u8>,
}

pub struct DctDecoder<'a> {
    buffer: &'a [u8],
}

impl<'a> DctDecoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    pub fn decode(self) -> PdfResult<DecodedJpeg> {
        let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(self.buffer));

        let pixels = decoder.decode().map_err(|err| PdfError::MalformedStream {
            pos: 0,
            reason: format!("invalid JPEG data: {}", err),
        })?;

        let info = decoder.info().ok_or_else(|| PdfError::MalformedStream {
            pos: 0,
            reason: "JPEG data without a frame header".to_owned(),
        })?;

        let (components, pixels) = match info.pixel_format {
            PixelFormat::L8 => (1, pixels),
            PixelFormat::RGB24 => (3, pixels),
            PixelFormat::CMYK32 => (4, pixels),
            #[allow(unreachable_patterns)]
            format => {
                return Err(PdfError::MalformedStream {
                    pos: 0,
                    reason: format!("unsupported JPEG pixel format {:?}", format),
                })
            }
        };

        Ok(DecodedJpeg {
            width: usize::from(info.width),
            height: usize::from(info.height),
            components,
            pixels,
        })
    }
}
