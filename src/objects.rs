use std::{collections::HashMap, fmt};

use crate::{
    error::{PdfError, PdfResult},
    resolve::{FromObj, Resolve},
    stream::Stream,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Null,
    Boolean,
    Integer,
    Real,
    String,
    Name,
    Array,
    Dictionary,
    Stream,
    Reference,
}

/// Every value a PDF file can hold
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    True,
    False,
    Integer(i32),
    Real(f32),
    String(PdfString),
    Name(String),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(Reference),
}

impl Object {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Null => ObjectType::Null,
            Self::True | Self::False => ObjectType::Boolean,
            Self::Integer(..) => ObjectType::Integer,
            Self::Real(..) => ObjectType::Real,
            Self::String(..) => ObjectType::String,
            Self::Name(..) => ObjectType::Name,
            Self::Array(..) => ObjectType::Array,
            Self::Dictionary(..) => ObjectType::Dictionary,
            Self::Stream(..) => ObjectType::Stream,
            Self::Reference(..) => ObjectType::Reference,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_number(&self) -> Option<f32> {
        match *self {
            Self::Integer(i) => Some(i as f32),
            Self::Real(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match *self {
            Self::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<Reference> {
        match *self {
            Self::Reference(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub object_number: usize,
    pub generation: usize,
}

impl Reference {
    pub fn new(object_number: usize, generation: usize) -> Self {
        Self {
            object_number,
            generation,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.object_number, self.generation)
    }
}

/// A PDF string, which is an arbitrary sequence of bytes
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct PdfString(pub Vec<u8>);

impl PdfString {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes a text string, which is either UTF-16BE with a byte order mark or PDFDocEncoding
    pub fn to_text(&self) -> String {
        match self.0.as_slice() {
            [0xfe, 0xff, rest @ ..] => {
                let units = rest
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect::<Vec<u16>>();

                String::from_utf16_lossy(&units)
            }
            [0xef, 0xbb, 0xbf, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
            bytes => bytes.iter().map(|&b| pdf_doc_encoding_to_char(b)).collect(),
        }
    }
}

impl fmt::Debug for PdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for PdfString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// PDFDocEncoding agrees with Latin-1 except for the 0x18..=0x1f and 0x80..=0xa0 blocks
fn pdf_doc_encoding_to_char(b: u8) -> char {
    match b {
        0x18 => '\u{02d8}',
        0x19 => '\u{02c7}',
        0x1a => '\u{02c6}',
        0x1b => '\u{02d9}',
        0x1c => '\u{02dd}',
        0x1d => '\u{02db}',
        0x1e => '\u{02da}',
        0x1f => '\u{02dc}',
        0x80 => '\u{2022}',
        0x81 => '\u{2020}',
        0x82 => '\u{2021}',
        0x83 => '\u{2026}',
        0x84 => '\u{2014}',
        0x85 => '\u{2013}',
        0x86 => '\u{0192}',
        0x87 => '\u{2044}',
        0x88 => '\u{2039}',
        0x89 => '\u{203a}',
        0x8a => '\u{2212}',
        0x8b => '\u{2030}',
        0x8c => '\u{201e}',
        0x8d => '\u{201c}',
        0x8e => '\u{201d}',
        0x8f => '\u{2018}',
        0x90 => '\u{2019}',
        0x91 => '\u{201a}',
        0x92 => '\u{2122}',
        0x93 => '\u{fb01}',
        0x94 => '\u{fb02}',
        0x95 => '\u{0141}',
        0x96 => '\u{0152}',
        0x97 => '\u{0160}',
        0x98 => '\u{0178}',
        0x99 => '\u{017d}',
        0x9a => '\u{0131}',
        0x9b => '\u{0142}',
        0x9c => '\u{0153}',
        0x9d => '\u{0161}',
        0x9e => '\u{017e}',
        0xa0 => '\u{20ac}',
        b => b as char,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    dict: HashMap<String, Object>,
}

impl Dictionary {
    pub fn new(dict: HashMap<String, Object>) -> Self {
        Self { dict }
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.dict.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Object) -> Option<Object> {
        self.dict.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.dict.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.dict.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.dict.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Object)> {
        self.dict.iter_mut()
    }

    /// Resolves the value at `key`, treating an explicit `null` the same as an absent key
    pub fn get_object(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<Object>> {
        match self.dict.get(key) {
            Some(obj) => match resolver.resolve(obj.clone())? {
                Object::Null => Ok(None),
                obj => Ok(Some(obj)),
            },
            None => Ok(None),
        }
    }

    pub fn get_reference(&self, key: &str) -> Option<Reference> {
        self.dict.get(key).and_then(Object::as_reference)
    }

    pub fn expect_reference(&self, key: &'static str) -> PdfResult<Reference> {
        self.get_reference(key)
            .ok_or(PdfError::MissingRequiredKey { key })
    }

    pub fn get_integer(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<i32>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_integer(obj))
            .transpose()
    }

    pub fn expect_integer(&self, key: &'static str, resolver: &dyn Resolve) -> PdfResult<i32> {
        self.get_integer(key, resolver)?
            .ok_or(PdfError::MissingRequiredKey { key })
    }

    pub fn get_unsigned_integer(
        &self,
        key: &str,
        resolver: &dyn Resolve,
    ) -> PdfResult<Option<u32>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_unsigned_integer(obj))
            .transpose()
    }

    pub fn get_number(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<f32>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_number(obj))
            .transpose()
    }

    pub fn expect_number(&self, key: &'static str, resolver: &dyn Resolve) -> PdfResult<f32> {
        self.get_number(key, resolver)?
            .ok_or(PdfError::MissingRequiredKey { key })
    }

    pub fn get_bool(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<bool>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_bool(obj))
            .transpose()
    }

    pub fn get_name(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<String>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_name(obj))
            .transpose()
    }

    pub fn expect_name(&self, key: &'static str, resolver: &dyn Resolve) -> PdfResult<String> {
        self.get_name(key, resolver)?
            .ok_or(PdfError::MissingRequiredKey { key })
    }

    pub fn get_string(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<PdfString>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_string(obj))
            .transpose()
    }

    pub fn expect_string(&self, key: &'static str, resolver: &dyn Resolve) -> PdfResult<PdfString> {
        self.get_string(key, resolver)?
            .ok_or(PdfError::MissingRequiredKey { key })
    }

    pub fn get_dict(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<Dictionary>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_dict(obj))
            .transpose()
    }

    pub fn expect_dict(&self, key: &'static str, resolver: &dyn Resolve) -> PdfResult<Dictionary> {
        self.get_dict(key, resolver)?
            .ok_or(PdfError::MissingRequiredKey { key })
    }

    pub fn get_arr(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<Vec<Object>>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_arr(obj))
            .transpose()
    }

    pub fn expect_arr(&self, key: &'static str, resolver: &dyn Resolve) -> PdfResult<Vec<Object>> {
        self.get_arr(key, resolver)?
            .ok_or(PdfError::MissingRequiredKey { key })
    }

    pub fn get_stream(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<Stream>> {
        self.get_object(key, resolver)?
            .map(|obj| resolver.assert_stream(obj))
            .transpose()
    }

    pub fn get_number_arr(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<Vec<f32>>> {
        self.get_arr(key, resolver)?
            .map(|arr| {
                arr.into_iter()
                    .map(|obj| resolver.assert_number(obj))
                    .collect::<PdfResult<Vec<f32>>>()
            })
            .transpose()
    }

    pub fn get_type_or_arr<T: FromObj>(
        &self,
        key: &str,
        resolver: &dyn Resolve,
    ) -> PdfResult<Option<TypeOrArray<T>>> {
        self.get_object(key, resolver)?
            .map(|obj| TypeOrArray::from_obj(obj, resolver))
            .transpose()
    }

    pub fn get_typed<T: FromObj>(&self, key: &str, resolver: &dyn Resolve) -> PdfResult<Option<T>> {
        self.get_object(key, resolver)?
            .map(|obj| T::from_obj(obj, resolver))
            .transpose()
    }

    /// Checks `/Type`. When `is_optional`, a missing entry is accepted
    pub fn expect_type(
        &self,
        ty: &'static str,
        resolver: &dyn Resolve,
        is_optional: bool,
    ) -> PdfResult<()> {
        match self.get_name("Type", resolver)? {
            Some(found) if found == ty => Ok(()),
            Some(found) => Err(PdfError::UnrecognizedVariant { ty, found }),
            None if is_optional => Ok(()),
            None => Err(PdfError::MissingRequiredKey { key: "Type" }),
        }
    }
}

/// Many dictionary entries may be either a single value or an array of them
#[derive(Debug, Clone, PartialEq)]
pub enum TypeOrArray<T> {
    Type(T),
    Array(Vec<T>),
}

impl<T> TypeOrArray<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Type(t) => vec![t],
            Self::Array(arr) => arr,
        }
    }
}

impl<T: FromObj> FromObj for TypeOrArray<T> {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        Ok(match resolver.resolve(obj)? {
            Object::Array(arr) => Self::Array(
                arr.into_iter()
                    .map(|obj| T::from_obj(obj, resolver))
                    .collect::<PdfResult<Vec<T>>>()?,
            ),
            obj => Self::Type(T::from_obj(obj, resolver)?),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn utf16_text_string() {
        let s = PdfString(vec![0xfe, 0xff, 0x00, b'H', 0x00, b'i']);
        assert_eq!(s.to_text(), "Hi");
    }

    #[test]
    fn pdf_doc_encoding_text_string() {
        let s = PdfString(vec![b'a', 0x84, b'b']);
        assert_eq!(s.to_text(), "a\u{2014}b");
    }
}
