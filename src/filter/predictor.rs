use std::cmp::min;

use crate::{
    error::{PdfError, PdfResult},
    objects::Dictionary,
    resolve::Resolve,
};

/// <https://www.adobe.com/content/dam/acom/en/devnet/postscript/pdfs/TN5603.Filters.pdf>
#[derive(Debug, Clone)]
pub struct PredictorParams {
    predictor: Predictor,

    /// Specifies the number of samples in the sampled row.
    ///
    /// The default value is 1
    columns: usize,

    /// Specifies the number of interleaved color components in a sample.
    ///
    /// The default value is 1
    colors: usize,

    /// The number of bits used to represent each component.
    ///
    /// The default value is 8
    bits_per_component: usize,

    dict: Option<Dictionary>,
}

#[pdf_enum(Integer)]
pub enum Predictor {
    /// No filter is applied *and* no byte precedes each row
    Unused = 1,

    /// TIFF predictor 2, each sample is the difference from the sample to its left
    Tiff = 2,

    /// No filter is applied
    None = 10,

    /// The pixel is subtracted by the pixel to the left of it
    Sub = 11,

    /// The pixel is subtracted by the pixel above it
    Up = 12,

    /// The pixel is subtracted by the average of the pixel to the left and above
    Average = 13,

    /// The pixel is subtracted by the pixel that comes out of a prediction algorithm
    Paeth = 14,

    /// A hybrid of all 4
    Optimum = 15,
}

impl PredictorParams {
    pub fn from_dict(dict: Option<&Dictionary>, resolver: &dyn Resolve) -> PdfResult<Self> {
        let Some(dict) = dict else {
            return Ok(Self {
                predictor: Predictor::Unused,
                columns: 1,
                colors: 1,
                bits_per_component: 8,
                dict: None,
            });
        };

        let predictor = match dict.get_integer("Predictor", resolver)? {
            Some(n) => Predictor::from_integer(n)?,
            None => Predictor::Unused,
        };

        let columns = dict.get_unsigned_integer("Columns", resolver)?.unwrap_or(1) as usize;
        let colors = dict.get_unsigned_integer("Colors", resolver)?.unwrap_or(1) as usize;
        let bits_per_component = dict
            .get_unsigned_integer("BitsPerComponent", resolver)?
            .unwrap_or(8) as usize;

        if !matches!(bits_per_component, 1 | 2 | 4 | 8 | 16) {
            return Err(PdfError::UnrecognizedVariant {
                ty: "BitsPerComponent",
                found: bits_per_component.to_string(),
            });
        }

        let columns = columns.max(1);
        let colors = colors.max(1);

        let row_bits = colors
            .checked_mul(bits_per_component)
            .and_then(|bits| bits.checked_mul(columns))
            .and_then(|bits| bits.checked_add(7));

        if row_bits.is_none() {
            return Err(PdfError::MalformedStream {
                pos: 0,
                reason: format!(
                    "predictor row of {} columns with {} colors overflows",
                    columns, colors
                ),
            });
        }

        Ok(Self {
            predictor,
            columns,
            colors,
            bits_per_component,
            dict: Some(dict.clone()),
        })
    }

    pub fn dict(&self) -> Option<&Dictionary> {
        self.dict.as_ref()
    }

    fn bits_per_pixel(&self) -> usize {
        self.colors * self.bits_per_component
    }

    /// Distance in bytes to the corresponding byte of the previous pixel, at least 1
    fn bytes_per_pixel(&self) -> usize {
        ((self.bits_per_pixel() + 7) / 8).max(1)
    }

    fn bytes_per_row(&self) -> usize {
        (self.bits_per_pixel() * self.columns + 7) / 8
    }

    pub fn apply(&self, buffer: Vec<u8>) -> PdfResult<Vec<u8>> {
        Ok(match self.predictor {
            Predictor::Unused => buffer,
            Predictor::Tiff => self.decode_tiff(buffer),
            Predictor::None
            | Predictor::Sub
            | Predictor::Up
            | Predictor::Average
            | Predictor::Paeth
            | Predictor::Optimum => self.decode_png(&buffer),
        })
    }

    fn decode_tiff(&self, mut buffer: Vec<u8>) -> Vec<u8> {
        if self.bits_per_component != 8 {
            log::warn!(
                "TIFF predictor with {} bits per component is not supported",
                self.bits_per_component
            );
            return buffer;
        }

        let bytes_per_row = self.bytes_per_row();
        let colors = self.colors;

        for row in buffer.chunks_mut(bytes_per_row) {
            for idx in colors..row.len() {
                row[idx] = row[idx].wrapping_add(row[idx - colors]);
            }
        }

        buffer
    }

    /// Every row is prefixed by a byte naming the PNG filter type used for that row
    fn decode_png(&self, buffer: &[u8]) -> Vec<u8> {
        let bytes_per_row = self.bytes_per_row();
        let bpp = self.bytes_per_pixel();

        let mut out = Vec::with_capacity(buffer.len());
        let mut row_above = vec![0; bytes_per_row];

        for chunk in buffer.chunks(bytes_per_row + 1) {
            let Some((&filter_type, encoded)) = chunk.split_first() else {
                break;
            };

            let mut row = vec![0; bytes_per_row];
            row[..encoded.len()].copy_from_slice(encoded);

            match filter_type {
                0 => {}
                1 => Self::decode_sub(&mut row, bpp),
                2 => Self::decode_up(&mut row, &row_above),
                3 => Self::decode_average(&mut row, &row_above, bpp),
                4 => Self::decode_paeth(&mut row, &row_above, bpp),
                n => log::warn!("unknown PNG filter type {}", n),
            }

            out.extend_from_slice(&row[..encoded.len()]);
            row_above = row;
        }

        out
    }

    fn decode_sub(this_row: &mut [u8], bpp: usize) {
        for idx in bpp..this_row.len() {
            this_row[idx] = this_row[idx].wrapping_add(this_row[idx - bpp]);
        }
    }

    fn decode_up(this_row: &mut [u8], row_above: &[u8]) {
        for (b, above) in this_row.iter_mut().zip(row_above) {
            *b = b.wrapping_add(*above);
        }
    }

    fn decode_average(this_row: &mut [u8], row_above: &[u8], bpp: usize) {
        for idx in 0..this_row.len() {
            let left = if idx >= bpp { this_row[idx - bpp] } else { 0 };
            let above = row_above[idx];

            this_row[idx] = this_row[idx].wrapping_add(((u16::from(left) + u16::from(above)) / 2) as u8);
        }
    }

    fn decode_paeth(this_row: &mut [u8], row_above: &[u8], bpp: usize) {
        for idx in 0..this_row.len() {
            let (left, above_left) = if idx >= bpp {
                (this_row[idx - bpp], row_above[idx - bpp])
            } else {
                (0, 0)
            };
            let above = row_above[idx];

            this_row[idx] = this_row[idx].wrapping_add(Self::paeth_predictor(
                i16::from(left),
                i16::from(above),
                i16::from(above_left),
            ));
        }
    }

    fn paeth_predictor(a: i16, b: i16, c: i16) -> u8 {
        let p = a + b - c;
        let pa = (p - a).abs();
        let pb = (p - b).abs();
        let pc = (p - c).abs();

        // order here for ties is important
        let smallest = min(min(pa, pb), pc);
        if smallest == pa {
            a as u8
        } else if smallest == pb {
            b as u8
        } else {
            c as u8
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::Object, resolve::NoResolve};

    fn params(predictor: Predictor, columns: usize) -> PredictorParams {
        PredictorParams {
            predictor,
            columns,
            colors: 1,
            bits_per_component: 8,
            dict: None,
        }
    }

    #[test]
    fn png_up() {
        let encoded = [2, 1, 2, 3, 2, 1, 1, 1];
        assert_eq!(
            params(Predictor::Up, 3).apply(encoded.to_vec()).unwrap(),
            [1, 2, 3, 2, 3, 4]
        );
    }

    #[test]
    fn png_sub_and_none_rows() {
        let encoded = [1, 5, 1, 1, 0, 7, 7, 7];
        assert_eq!(
            params(Predictor::Optimum, 3).apply(encoded.to_vec()).unwrap(),
            [5, 6, 7, 7, 7, 7]
        );
    }

    #[test]
    fn tiff() {
        assert_eq!(
            params(Predictor::Tiff, 4).apply(vec![1, 1, 1, 1]).unwrap(),
            [1, 2, 3, 4]
        );
    }

    #[test]
    fn oversized_rows_are_malformed() {
        let dict = match crate::test_util::parse_object(
            b"<< /Predictor 12 /Colors 2147483647 /Columns 2147483647 /BitsPerComponent 16 >>",
        ) {
            Object::Dictionary(dict) => dict,
            obj => panic!("expected a dictionary, found {:?}", obj),
        };

        assert!(matches!(
            PredictorParams::from_dict(Some(&dict), &NoResolve),
            Err(PdfError::MalformedStream { .. })
        ));
    }
}
