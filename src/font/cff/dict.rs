use std::collections::HashMap;

use crate::parse_binary::{BinaryParser, ByteReader};

/// Two byte operators are keyed as `1200 + second byte`
const ESCAPE: u16 = 1200;

mod op {
    pub const CHARSET: u16 = 15;
    pub const ENCODING: u16 = 16;
    pub const CHAR_STRINGS: u16 = 17;
    pub const PRIVATE: u16 = 18;
    pub const SUBRS: u16 = 19;
    pub const DEFAULT_WIDTH_X: u16 = 20;
    pub const NOMINAL_WIDTH_X: u16 = 21;
    pub const CHARSTRING_TYPE: u16 = super::ESCAPE + 6;
    pub const FONT_MATRIX: u16 = super::ESCAPE + 7;
    pub const ROS: u16 = super::ESCAPE + 30;
    pub const FD_ARRAY: u16 = super::ESCAPE + 36;
    pub const FD_SELECT: u16 = super::ESCAPE + 37;
}

/// Operator to operands, the last occurrence of an operator winning
#[derive(Debug, Default)]
pub(super) struct CffDict {
    entries: HashMap<u16, Vec<f32>>,
}

impl CffDict {
    pub fn parse(buffer: &[u8]) -> anyhow::Result<Self> {
        let mut parser = ByteReader::new(buffer);
        let mut operands = Vec::new();
        let mut entries = HashMap::new();

        while let Some(b0) = parser.peek() {
            parser.next()?;

            match b0 {
                12 => {
                    let b1 = parser.next()?;
                    entries.insert(ESCAPE + u16::from(b1), std::mem::take(&mut operands));
                }
                0..=21 => {
                    entries.insert(u16::from(b0), std::mem::take(&mut operands));
                }
                28 => operands.push(f32::from(parser.parse_i16()?)),
                29 => operands.push(parser.parse_i32()? as f32),
                30 => operands.push(parse_real(&mut parser)?),
                32..=246 => operands.push(f32::from(b0) - 139.0),
                247..=250 => {
                    let b1 = parser.next()?;
                    operands.push((f32::from(b0) - 247.0) * 256.0 + f32::from(b1) + 108.0);
                }
                251..=254 => {
                    let b1 = parser.next()?;
                    operands.push(-(f32::from(b0) - 251.0) * 256.0 - f32::from(b1) - 108.0);
                }
                _ => anyhow::bail!("invalid dict byte: {}", b0),
            }
        }

        Ok(Self { entries })
    }

    fn get(&self, op: u16) -> Option<&[f32]> {
        self.entries.get(&op).map(Vec::as_slice)
    }

    fn number(&self, op: u16) -> Option<f32> {
        self.get(op)?.first().copied()
    }

    fn offset(&self, op: u16) -> anyhow::Result<Option<usize>> {
        match self.number(op) {
            Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(Some(n as usize)),
            Some(n) => anyhow::bail!("invalid offset: {}", n),
            None => Ok(None),
        }
    }
}

/// A real number, as a sequence of nibbles
fn parse_real(parser: &mut ByteReader) -> anyhow::Result<f32> {
    let mut s = String::new();

    'outer: loop {
        let b = parser.next()?;

        for nibble in [b >> 4, b & 0xf] {
            match nibble {
                0..=9 => s.push(char::from(b'0' + nibble)),
                0xa => s.push('.'),
                0xb => s.push('E'),
                0xc => s.push_str("E-"),
                0xe => s.push('-'),
                0xf => break 'outer,
                _ => anyhow::bail!("invalid nibble in real number: {:x}", nibble),
            }
        }
    }

    Ok(s.parse::<f32>()?)
}

#[derive(Debug, Clone)]
pub(super) struct TopDict {
    /// Offset to the charset, or 0 to 2 for the predefined ones
    pub charset: usize,

    /// Offset to the encoding, or 0 to 1 for the predefined ones
    pub encoding: usize,
    pub char_strings: usize,

    /// Private DICT size and offset
    pub private: Option<(usize, usize)>,
    pub font_matrix: Option<[f32; 6]>,

    /// Present only for CID-keyed fonts
    pub is_cid: bool,
    pub fd_array: Option<usize>,
    pub fd_select: Option<usize>,
}

impl TopDict {
    pub fn parse(buffer: &[u8]) -> anyhow::Result<Self> {
        let dict = CffDict::parse(buffer)?;

        let charstring_type = dict.number(op::CHARSTRING_TYPE).unwrap_or(2.0);
        anyhow::ensure!(
            charstring_type == 2.0,
            "unsupported CFF charstring type: {}",
            charstring_type
        );

        let char_strings = dict
            .offset(op::CHAR_STRINGS)?
            .ok_or(anyhow::anyhow!("top dict has no CharStrings"))?;

        Ok(Self {
            charset: dict.offset(op::CHARSET)?.unwrap_or(0),
            encoding: dict.offset(op::ENCODING)?.unwrap_or(0),
            char_strings,
            private: private_range(&dict)?,
            font_matrix: font_matrix(&dict),
            is_cid: dict.get(op::ROS).is_some(),
            fd_array: dict.offset(op::FD_ARRAY)?,
            fd_select: dict.offset(op::FD_SELECT)?,
        })
    }
}

/// An entry of a CID-keyed font's FDArray
#[derive(Debug, Clone)]
pub(super) struct FontDict {
    pub private: Option<(usize, usize)>,
    pub font_matrix: Option<[f32; 6]>,
}

impl FontDict {
    pub fn parse(buffer: &[u8]) -> anyhow::Result<Self> {
        let dict = CffDict::parse(buffer)?;

        Ok(Self {
            private: private_range(&dict)?,
            font_matrix: font_matrix(&dict),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct PrivateDict {
    /// Offset to the local subroutines, relative to the start of the private dict
    pub subrs: Option<usize>,
    pub default_width_x: f32,
    pub nominal_width_x: f32,
}

impl PrivateDict {
    pub fn parse(buffer: &[u8]) -> anyhow::Result<Self> {
        let dict = CffDict::parse(buffer)?;

        Ok(Self {
            subrs: dict.offset(op::SUBRS)?,
            default_width_x: dict.number(op::DEFAULT_WIDTH_X).unwrap_or(0.0),
            nominal_width_x: dict.number(op::NOMINAL_WIDTH_X).unwrap_or(0.0),
        })
    }
}

fn private_range(dict: &CffDict) -> anyhow::Result<Option<(usize, usize)>> {
    match dict.get(op::PRIVATE) {
        Some(&[size, offset]) => {
            anyhow::ensure!(size >= 0.0 && offset >= 0.0, "negative private dict range");
            Ok(Some((size as usize, offset as usize)))
        }
        Some(other) => anyhow::bail!("expected 2 operands to Private, found {}", other.len()),
        None => Ok(None),
    }
}

fn font_matrix(dict: &CffDict) -> Option<[f32; 6]> {
    dict.get(op::FONT_MATRIX)?.try_into().ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn operand_encodings() {
        // 100 (one byte), 1000 (two bytes), -1000, 10000 (shortint), 2.5 (real)
        let dict = CffDict::parse(&[
            239, 250, 124, 254, 124, 28, 0x27, 0x10, 30, 0x2a, 0x5f, 5,
        ])
        .unwrap();

        assert_eq!(dict.get(5), Some(&[100.0, 1000.0, -1000.0, 10000.0, 2.5][..]));
    }

    #[test]
    fn negative_exponent_real() {
        // -2.5E-3
        let dict = CffDict::parse(&[30, 0xe2, 0xa5, 0xc3, 0xff, 20]).unwrap();

        assert!((dict.number(op::DEFAULT_WIDTH_X).unwrap() + 0.0025).abs() < 1e-7);
    }

    #[test]
    fn top_dict_defaults() {
        // 400 CharStrings, 20 100 Private
        let top = TopDict::parse(&[248, 36, 17, 159, 239, 18]).unwrap();

        assert_eq!(top.char_strings, 400);
        assert_eq!(top.private, Some((20, 100)));
        assert_eq!(top.charset, 0);
        assert_eq!(top.encoding, 0);
        assert!(!top.is_cid);
        assert_eq!(top.font_matrix, None);
    }

    #[test]
    fn top_dict_requires_charstrings() {
        assert!(TopDict::parse(&[239, 15]).is_err());
    }
}
