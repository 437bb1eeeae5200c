use crate::{
    color::ColorSpace,
    error::{PdfError, PdfResult},
    filter::{dct::DctDecoder, FilterKind},
    objects::{Dictionary, Object},
    stream::Stream,
    FromObj, Resolve,
};

/// Images larger than this many pixels are refused rather than allocated
const MAX_PIXELS: u64 = 1 << 28;

/// A decoded raster, RGBA8 with the top row first
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,

    /// A stencil mask. Opaque pixels are painted in the fill colour at the time of drawing,
    /// everything else is left untouched
    pub is_mask: bool,
}

impl Image {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;

        match self.pixels.get(idx..idx + 4) {
            Some(&[r, g, b, a]) => [r, g, b, a],
            _ => [0; 4],
        }
    }

    /// Decodes an image XObject or inline image. `color_space` has already been looked up in the
    /// resources, as inline images may name one there
    pub fn decode(
        stream: &Stream,
        color_space: Option<ColorSpace>,
        resolver: &dyn Resolve,
    ) -> PdfResult<Self> {
        let dict = &stream.dict;
        let (width, height) = dimensions(dict, resolver)?;

        if dict.get_bool("ImageMask", resolver)?.unwrap_or(false) {
            return decode_stencil(stream, width, height, resolver);
        }

        let hint = color_space.as_ref().map_or(1, ColorSpace::components);
        let samples = Samples::decode(stream, width, height, hint, resolver)?;

        let color_space = match (color_space, samples.jpeg_components) {
            (Some(space), Some(n)) if space.components() != n => {
                log::warn!("JPEG has {} components, colour space {}", n, space.components());
                jpeg_color_space(n)
            }
            (Some(space), _) => space,
            (None, Some(n)) => jpeg_color_space(n),
            (None, None) => return Err(PdfError::MissingRequiredKey { key: "ColorSpace" }),
        };

        let components = color_space.components();
        let decode = decode_array(dict, &color_space, samples.bits, resolver)?;
        let color_key = color_key_mask(dict, components, resolver)?;

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        let mut raw = vec![0u32; components];
        let mut values = vec![0.0f32; components];
        let max = ((1u64 << samples.bits) - 1) as f32;

        for y in 0..height {
            for x in 0..width {
                for c in 0..components {
                    let sample = samples.get(x, y, c, components);
                    raw[c] = sample;

                    let (lo, hi) = (decode[c * 2], decode[c * 2 + 1]);
                    values[c] = lo + sample as f32 * (hi - lo) / max;
                }

                let masked = color_key.as_ref().map_or(false, |ranges| {
                    raw.iter()
                        .zip(ranges.chunks_exact(2))
                        .all(|(&v, range)| range[0] <= v && v <= range[1])
                });

                let mut rgba = color_space.to_color(&values).to_rgba8();
                if masked {
                    rgba[3] = 0;
                }

                pixels.extend_from_slice(&rgba);
            }
        }

        let mut image = Image {
            width,
            height,
            pixels,
            is_mask: false,
        };

        if let Some(mask) = dict.get_stream("SMask", resolver)? {
            let alpha = decode_soft_mask(&mask, resolver)?;
            image.apply_alpha(&alpha, false);
        } else if let Some(Object::Stream(mask)) = dict.get_object("Mask", resolver)? {
            let (w, h) = dimensions(&mask.dict, resolver)?;
            let stencil = decode_stencil(&mask, w, h, resolver)?;
            image.apply_alpha(&stencil, true);
        }

        Ok(image)
    }

    /// Multiplies alpha by `mask`, resampled to this image's size. Soft masks carry coverage
    /// in their gray level, stencils in their own alpha
    fn apply_alpha(&mut self, mask: &Image, from_alpha: bool) {
        if mask.width == 0 || mask.height == 0 {
            return;
        }

        for y in 0..self.height {
            let my = (u64::from(y) * u64::from(mask.height) / u64::from(self.height)) as u32;

            for x in 0..self.width {
                let mx = (u64::from(x) * u64::from(mask.width) / u64::from(self.width)) as u32;
                let m = mask.pixel(mx, my);
                let coverage = if from_alpha { m[3] } else { m[0] };

                let idx = (y as usize * self.width as usize + x as usize) * 4 + 3;
                self.pixels[idx] = ((u16::from(self.pixels[idx]) * u16::from(coverage)) / 255) as u8;
            }
        }
    }
}

fn jpeg_color_space(components: usize) -> ColorSpace {
    match components {
        1 => ColorSpace::DeviceGray,
        4 => ColorSpace::DeviceCMYK,
        _ => ColorSpace::DeviceRGB,
    }
}

fn dimensions(dict: &Dictionary, resolver: &dyn Resolve) -> PdfResult<(u32, u32)> {
    let width = dict.get_unsigned_integer("Width", resolver)?.unwrap_or(0);
    let height = dict.get_unsigned_integer("Height", resolver)?.unwrap_or(0);

    if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(PdfError::MalformedStream {
            pos: 0,
            reason: format!("unsupported image size {}x{}", width, height),
        });
    }

    Ok((width, height))
}

fn decode_array(
    dict: &Dictionary,
    color_space: &ColorSpace,
    bits: u32,
    resolver: &dyn Resolve,
) -> PdfResult<Vec<f32>> {
    let default = color_space.default_decode(bits);

    Ok(match dict.get_number_arr("Decode", resolver)? {
        Some(decode) if decode.len() >= default.len() => decode,
        Some(decode) => {
            log::warn!("ignoring /Decode of length {}", decode.len());
            default
        }
        None => default,
    })
}

/// `/Mask [min0 max0 min1 max1 ...]`, masking pixels whose raw samples all fall in range
fn color_key_mask(dict: &Dictionary, components: usize, resolver: &dyn Resolve) -> PdfResult<Option<Vec<u32>>> {
    let Some(Object::Array(arr)) = dict.get_object("Mask", resolver)? else {
        return Ok(None);
    };

    let ranges = arr
        .into_iter()
        .map(|obj| resolver.assert_unsigned_integer(obj))
        .collect::<PdfResult<Vec<u32>>>()?;

    if ranges.len() != components * 2 {
        log::warn!("color key mask of length {} for {} components", ranges.len(), components);
        return Ok(None);
    }

    Ok(Some(ranges))
}

/// One bit per pixel. With the default `/Decode [0 1]`, a 0 sample is painted
fn decode_stencil(stream: &Stream, width: u32, height: u32, resolver: &dyn Resolve) -> PdfResult<Image> {
    let samples = Samples::decode(stream, width, height, 1, resolver)?;

    let inverted = match stream.dict.get_number_arr("Decode", resolver)? {
        Some(decode) => decode.first().copied().unwrap_or(0.0) > 0.5,
        None => false,
    };

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);

    for y in 0..height {
        for x in 0..width {
            let set = samples.get(x, y, 0, 1) != 0;
            let painted = set == inverted;

            pixels.extend_from_slice(&[0, 0, 0, if painted { 255 } else { 0 }]);
        }
    }

    Ok(Image {
        width,
        height,
        pixels,
        is_mask: true,
    })
}

fn decode_soft_mask(stream: &Stream, resolver: &dyn Resolve) -> PdfResult<Image> {
    let color_space = match stream.dict.get_object("ColorSpace", resolver)? {
        Some(obj) => ColorSpace::from_obj(obj, resolver)?,
        None => ColorSpace::DeviceGray,
    };

    let mut mask = Image::decode(stream, Some(color_space), resolver)?;

    // gray coverage lives in the red channel
    for px in mask.pixels.chunks_exact_mut(4) {
        px[3] = 255;
    }

    Ok(mask)
}

/// Raw samples, after any filters and codecs
struct Samples {
    data: Vec<u8>,
    bits: u32,
    row_bytes: usize,

    /// Set when the JPEG decoder decided the component count
    jpeg_components: Option<usize>,
}

impl Samples {
    fn decode(
        stream: &Stream,
        width: u32,
        height: u32,
        components: usize,
        resolver: &dyn Resolve,
    ) -> PdfResult<Self> {
        let dict = &stream.dict;
        let (data, codec) = stream.decode_until_image(resolver)?;

        match codec {
            None => {
                let is_mask = dict.get_bool("ImageMask", resolver)?.unwrap_or(false);
                let bits = if is_mask {
                    1
                } else {
                    dict.get_unsigned_integer("BitsPerComponent", resolver)?.unwrap_or(8)
                };

                if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
                    return Err(PdfError::MalformedStream {
                        pos: 0,
                        reason: format!("unsupported BitsPerComponent {}", bits),
                    });
                }

                if data.len() < Self::row_bytes(width, components, bits) * height as usize {
                    log::debug!("image data is short, missing samples read as zero");
                }

                Ok(Self {
                    data: data.to_vec(),
                    bits,
                    row_bytes: 0,
                    jpeg_components: None,
                }
                .with_row_bytes(width, components))
            }
            Some((FilterKind::Dct, _)) => {
                let jpeg = DctDecoder::new(&data).decode()?;

                if jpeg.width != width as usize || jpeg.height != height as usize {
                    log::warn!(
                        "JPEG is {}x{}, image dictionary says {}x{}",
                        jpeg.width,
                        jpeg.height,
                        width,
                        height
                    );
                }

                Ok(Self {
                    row_bytes: jpeg.width * jpeg.components,
                    data: jpeg.pixels,
                    bits: 8,
                    jpeg_components: Some(jpeg.components),
                })
            }
            Some((filter, _)) => Err(PdfError::InvalidFilter {
                filter: filter.as_str().to_owned(),
            }),
        }
    }

    fn row_bytes(width: u32, components: usize, bits: u32) -> usize {
        (width as usize * components * bits as usize + 7) / 8
    }

    fn with_row_bytes(mut self, width: u32, components: usize) -> Self {
        self.row_bytes = Self::row_bytes(width, components, self.bits);
        self
    }

    /// Component `c` of the pixel at `(x, y)`
    fn get(&self, x: u32, y: u32, c: usize, components: usize) -> u32 {
        let row = y as usize * self.row_bytes;
        let idx = x as usize * components + c;

        match self.bits {
            8 => u32::from(self.byte(row + idx)),
            16 => u32::from(self.byte(row + idx * 2)) << 8 | u32::from(self.byte(row + idx * 2 + 1)),
            bits => {
                let bit = idx * bits as usize;
                let byte = self.byte(row + bit / 8);
                let shift = 8 - bits as usize - bit % 8;

                u32::from(byte >> shift) & ((1 << bits) - 1)
            }
        }
    }

    fn byte(&self, idx: usize) -> u8 {
        self.data.get(idx).copied().unwrap_or(0)
    }
}
