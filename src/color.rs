use crate::{
    error::{PdfError, PdfResult},
    objects::Object,
    FromObj, Resolve,
};

/// Non-premultiplied RGBA, each channel in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn gray(level: f32) -> Self {
        let level = level.clamp(0.0, 1.0);
        Self::rgb(level, level, level)
    }

    pub fn cmyk(cyan: f32, magenta: f32, yellow: f32, key: f32) -> Self {
        Self::rgb(
            (1.0 - cyan) * (1.0 - key),
            (1.0 - magenta) * (1.0 - key),
            (1.0 - yellow) * (1.0 - key),
        )
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        fn channel(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }

        [channel(self.r), channel(self.g), channel(self.b), channel(self.a)]
    }

    /// Paints a stencil mask pixel: coverage from the mask, colour from the fill
    pub fn mask_pixel(self, mask: [u8; 4]) -> [u8; 4] {
        let [r, g, b, a] = self.to_rgba8();

        [r, g, b, ((u16::from(a) * u16::from(mask[3])) / 255) as u8]
    }
}

#[pdf_enum]
pub enum ColorSpaceName {
    DeviceGray = "DeviceGray",
    DeviceRGB = "DeviceRGB",
    DeviceCMYK = "DeviceCMYK",
    CalGray = "CalGray",
    CalRGB = "CalRGB",
    Lab = "Lab",
    ICCBased = "ICCBased",
    Indexed = "Indexed",
    Pattern = "Pattern",
    Separation = "Separation",
    DeviceN = "DeviceN",

    // abbreviations, only valid in inline images
    G = "G",
    RGB = "RGB",
    CMYK = "CMYK",
    I = "I",
}

/// Colour spaces reduced to what the rasterizer can show. CIE-based spaces are treated as
/// their device equivalents and spot colours as a gray tint
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    Lab {
        white_point: [f32; 3],
    },
    Indexed {
        base: Box<ColorSpace>,
        hival: u8,
        lookup: Vec<u8>,
    },
    Pattern,

    /// `Separation` and `DeviceN`, drawn as the darkness of the summed tints
    Tint {
        components: usize,
    },
}

impl FromObj for ColorSpace {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        match resolver.resolve(obj)? {
            Object::Name(name) => Self::from_family(ColorSpaceName::from_str(&name)?, &[], resolver),
            Object::Array(arr) => {
                let name = match arr.first() {
                    Some(first) => resolver.assert_name(first.clone())?,
                    None => {
                        return Err(PdfError::ArrayOfInvalidLength {
                            expected: 1,
                            found: 0,
                        })
                    }
                };

                Self::from_family(ColorSpaceName::from_str(&name)?, &arr[1..], resolver)
            }
            found => Err(PdfError::MismatchedObjectTypeAny {
                expected: &[crate::ObjectType::Name, crate::ObjectType::Array],
                found: found.object_type(),
            }),
        }
    }
}

impl ColorSpace {
    fn from_family(name: ColorSpaceName, params: &[Object], resolver: &dyn Resolve) -> PdfResult<Self> {
        Ok(match name {
            ColorSpaceName::DeviceGray | ColorSpaceName::CalGray | ColorSpaceName::G => {
                ColorSpace::DeviceGray
            }
            ColorSpaceName::DeviceRGB | ColorSpaceName::CalRGB | ColorSpaceName::RGB => {
                ColorSpace::DeviceRGB
            }
            ColorSpaceName::DeviceCMYK | ColorSpaceName::CMYK => ColorSpace::DeviceCMYK,
            ColorSpaceName::Lab => {
                let mut white_point = [0.9505, 1.0, 1.089];

                if let Some(dict) = params.first() {
                    let dict = resolver.assert_dict(dict.clone())?;

                    if let Some(wp) = dict.get_number_arr("WhitePoint", resolver)? {
                        if wp.len() == 3 {
                            white_point = [wp[0], wp[1], wp[2]];
                        }
                    }
                }

                ColorSpace::Lab { white_point }
            }
            ColorSpaceName::ICCBased => {
                let stream = match params.first() {
                    Some(obj) => resolver.assert_stream(obj.clone())?,
                    None => return Ok(ColorSpace::DeviceRGB),
                };

                match stream.dict.get_integer("N", resolver)? {
                    Some(1) => ColorSpace::DeviceGray,
                    Some(3) => ColorSpace::DeviceRGB,
                    Some(4) => ColorSpace::DeviceCMYK,
                    _ => match stream.dict.get_object("Alternate", resolver)? {
                        Some(alternate) => ColorSpace::from_obj(alternate, resolver)?,
                        None => ColorSpace::DeviceRGB,
                    },
                }
            }
            ColorSpaceName::Indexed | ColorSpaceName::I => {
                if params.len() != 3 {
                    return Err(PdfError::ArrayOfInvalidLength {
                        expected: 4,
                        found: params.len() + 1,
                    });
                }

                let base = ColorSpace::from_obj(params[0].clone(), resolver)?;
                let hival = resolver.assert_integer(params[1].clone())?.clamp(0, 255) as u8;
                let lookup = match resolver.resolve(params[2].clone())? {
                    Object::String(s) => s.0,
                    Object::Stream(stream) => stream.decode(resolver)?.to_vec(),
                    found => {
                        return Err(PdfError::MismatchedObjectTypeAny {
                            expected: &[crate::ObjectType::String, crate::ObjectType::Stream],
                            found: found.object_type(),
                        })
                    }
                };

                ColorSpace::Indexed {
                    base: Box::new(base),
                    hival,
                    lookup,
                }
            }
            ColorSpaceName::Pattern => ColorSpace::Pattern,
            ColorSpaceName::Separation => ColorSpace::Tint { components: 1 },
            ColorSpaceName::DeviceN => {
                let components = match params.first() {
                    Some(names) => resolver.assert_arr(names.clone())?.len().max(1),
                    None => 1,
                };

                ColorSpace::Tint { components }
            }
        })
    }

    pub fn components(&self) -> usize {
        match self {
            ColorSpace::DeviceGray | ColorSpace::Indexed { .. } | ColorSpace::Pattern => 1,
            ColorSpace::DeviceRGB | ColorSpace::Lab { .. } => 3,
            ColorSpace::DeviceCMYK => 4,
            ColorSpace::Tint { components } => *components,
        }
    }

    /// The colour selected by `cs`/`CS` before any `sc`
    pub fn initial_color(&self) -> Vec<f32> {
        match self {
            ColorSpace::DeviceCMYK => vec![0.0, 0.0, 0.0, 1.0],
            ColorSpace::Tint { components } => vec![1.0; *components],
            space => vec![0.0; space.components()],
        }
    }

    /// The `/Decode` array an image uses when it doesn't supply one
    pub fn default_decode(&self, bits_per_component: u32) -> Vec<f32> {
        match self {
            ColorSpace::Indexed { .. } => {
                vec![0.0, ((1u32 << bits_per_component.min(16)) - 1) as f32]
            }
            ColorSpace::Lab { .. } => vec![0.0, 100.0, -100.0, 100.0, -100.0, 100.0],
            space => [0.0, 1.0].repeat(space.components()),
        }
    }

    /// Missing components read as zero
    pub fn to_color(&self, components: &[f32]) -> Color {
        let c = |i: usize| components.get(i).copied().unwrap_or(0.0);

        match self {
            ColorSpace::DeviceGray => Color::gray(c(0)),
            ColorSpace::DeviceRGB => Color::rgb(
                c(0).clamp(0.0, 1.0),
                c(1).clamp(0.0, 1.0),
                c(2).clamp(0.0, 1.0),
            ),
            ColorSpace::DeviceCMYK => Color::cmyk(
                c(0).clamp(0.0, 1.0),
                c(1).clamp(0.0, 1.0),
                c(2).clamp(0.0, 1.0),
                c(3).clamp(0.0, 1.0),
            ),
            ColorSpace::Lab { white_point } => lab_to_rgb(c(0), c(1), c(2), *white_point),
            ColorSpace::Indexed {
                base,
                hival,
                lookup,
            } => {
                let index = (c(0).round().max(0.0) as usize).min(*hival as usize);
                let n = base.components();

                let entry = lookup
                    .get(index * n..(index + 1) * n)
                    .map(|bytes| bytes.iter().map(|&b| b as f32 / 255.0).collect::<Vec<f32>>())
                    .unwrap_or_else(|| base.initial_color());

                base.to_color(&entry)
            }
            // pattern fills are not drawn; a mid gray keeps shapes visible
            ColorSpace::Pattern => Color::gray(0.5),
            ColorSpace::Tint { components: n } => {
                let total = components_sum(components, *n);
                Color::gray(1.0 - total.clamp(0.0, 1.0))
            }
        }
    }
}

fn components_sum(components: &[f32], n: usize) -> f32 {
    components.iter().take(n).sum()
}

fn lab_to_rgb(l: f32, a: f32, b: f32, white_point: [f32; 3]) -> Color {
    fn g(x: f32) -> f32 {
        if x >= 6.0 / 29.0 {
            x * x * x
        } else {
            108.0 / 841.0 * (x - 4.0 / 29.0)
        }
    }

    fn gamma(c: f32) -> f32 {
        let c = c.clamp(0.0, 1.0);

        if c <= 0.003_130_8 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    }

    let m = (l + 16.0) / 116.0;
    let x = white_point[0] * g(m + a / 500.0);
    let y = white_point[1] * g(m);
    let z = white_point[2] * g(m - b / 200.0);

    Color::rgb(
        gamma(3.2406 * x - 1.5372 * y - 0.4986 * z),
        gamma(-0.9689 * x + 1.8758 * y + 0.0415 * z),
        gamma(0.0557 * x - 0.2040 * y + 1.0570 * z),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::PdfString, resolve::NoResolve};

    #[test]
    fn cmyk_black() {
        assert_eq!(
            ColorSpace::DeviceCMYK.to_color(&[0.0, 0.0, 0.0, 1.0]).to_rgba8(),
            [0, 0, 0, 255]
        );
    }

    #[test]
    fn indexed_lookup() {
        let obj = Object::Array(vec![
            Object::Name("Indexed".to_owned()),
            Object::Name("DeviceRGB".to_owned()),
            Object::Integer(1),
            Object::String(PdfString(vec![255, 0, 0, 0, 0, 255])),
        ]);

        let space = ColorSpace::from_obj(obj, &NoResolve).unwrap();

        assert_eq!(space.components(), 1);
        assert_eq!(space.to_color(&[1.0]), Color::rgb(0.0, 0.0, 1.0));
        // out of range indices clamp to hival
        assert_eq!(space.to_color(&[7.0]), Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(space.default_decode(8), vec![0.0, 255.0]);
    }

    #[test]
    fn separation_is_a_gray_tint() {
        let obj = Object::Array(vec![
            Object::Name("Separation".to_owned()),
            Object::Name("Spot".to_owned()),
            Object::Name("DeviceCMYK".to_owned()),
            Object::Null,
        ]);

        let space = ColorSpace::from_obj(obj, &NoResolve).unwrap();

        assert_eq!(space.to_color(&[0.0]), Color::WHITE);
        assert_eq!(space.to_color(&[1.0]), Color::BLACK);
    }

    #[test]
    fn device_n_sums_its_own_tints() {
        let obj = Object::Array(vec![
            Object::Name("DeviceN".to_owned()),
            Object::Array(vec![
                Object::Name("Cyan".to_owned()),
                Object::Name("Spot".to_owned()),
            ]),
            Object::Name("DeviceCMYK".to_owned()),
            Object::Null,
        ]);

        let space = ColorSpace::from_obj(obj, &NoResolve).unwrap();

        assert_eq!(space.components(), 2);
        assert_eq!(space.to_color(&[0.25, 0.5, 1.0]), Color::gray(0.25));
        assert_eq!(space.to_color(&[1.0, 1.0]), Color::BLACK);
    }
}
