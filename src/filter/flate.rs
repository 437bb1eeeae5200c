use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};

use crate::error::{PdfError, PdfResult};

/// Inflates zlib data. Truncated or corrupt streams yield whatever was decoded before the error
pub(crate) fn decode_flate(buffer: &[u8]) -> PdfResult<Vec<u8>> {
    let mut out = Vec::new();

    match ZlibDecoder::new(buffer).read_to_end(&mut out) {
        Ok(..) => return Ok(out),
        Err(err) if !out.is_empty() => {
            log::warn!("flate stream ended early: {}", err);
            return Ok(out);
        }
        Err(..) => {}
    }

    // some producers omit the zlib header
    out.clear();
    match DeflateDecoder::new(buffer).read_to_end(&mut out) {
        Ok(..) => Ok(out),
        Err(..) if !out.is_empty() => Ok(out),
        Err(err) => Err(PdfError::MalformedStream {
            pos: 0,
            reason: format!("invalid flate data: {}", err),
        }),
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use flate2::{write::ZlibEncoder, Compression};

    use super::*;

    #[test]
    fn inflates_zlib() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello hello hello").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decode_flate(&compressed).unwrap(), b"hello hello hello");
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_flate(b"\xff\xff\xff\xff").is_err());
    }
}
