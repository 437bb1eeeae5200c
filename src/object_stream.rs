use std::convert::TryFrom;

use bytes::Bytes;

use crate::{
    error::{PdfError, PdfResult},
    lex::{LexBase, LexObject, Lexer},
    objects::{Dictionary, Object},
    resolve::Resolve,
    stream::Stream,
};

/// A decoded `/Type /ObjStm` container
#[derive(Debug)]
pub(crate) struct ObjectStream {
    /// `(object number, offset relative to First)` pairs, in stream order
    offsets: Vec<(usize, usize)>,
    first: usize,
    decoded: Bytes,
}

#[derive(Debug)]
pub(crate) struct ObjectStreamDict {
    /// The number of indirect objects stored in the stream
    pub(crate) n: usize,

    /// The byte offset in the decoded stream of the first compressed object
    pub(crate) first: usize,
}

impl ObjectStreamDict {
    const TYPE: &'static str = "ObjStm";

    pub fn from_dict(dict: &Dictionary, resolver: &dyn Resolve) -> PdfResult<Self> {
        if let Some(ty) = dict.get_name("Type", resolver)? {
            if ty != Self::TYPE {
                return Err(PdfError::malformed(format!(
                    "expected /Type /{}, found /{}",
                    Self::TYPE,
                    ty
                )));
            }
        }

        let n = usize::try_from(dict.expect_integer("N", resolver)?)?;
        let first = usize::try_from(dict.expect_integer("First", resolver)?)?;

        Ok(Self { n, first })
    }
}

impl ObjectStream {
    pub fn from_stream(stream: &Stream, resolver: &dyn Resolve) -> PdfResult<Self> {
        let dict = ObjectStreamDict::from_dict(&stream.dict, resolver)?;
        let decoded = stream.decode(resolver)?;

        Self::new(decoded, dict)
    }

    pub fn new(decoded: Bytes, dict: ObjectStreamDict) -> PdfResult<Self> {
        let mut lexer = Lexer::new(decoded.clone());
        // every header pair takes at least two bytes
        let mut offsets = Vec::with_capacity(dict.n.min(decoded.len() / 2));

        for _ in 0..dict.n {
            lexer.skip_whitespace();
            let object_number = lexer.lex_whole_number().parse::<usize>();
            lexer.skip_whitespace();
            let byte_offset = lexer.lex_whole_number().parse::<usize>();

            match (object_number, byte_offset) {
                (Ok(number), Ok(offset)) => offsets.push((number, offset)),
                _ => {
                    log::warn!(
                        "object stream header ends after {} of {} entries",
                        offsets.len(),
                        dict.n
                    );
                    break;
                }
            }
        }

        Ok(Self {
            offsets,
            first: dict.first,
            decoded,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `index` comes from the cross-reference entry. It is checked against the header, which is
    /// scanned for `object_number` when the two disagree
    pub fn parse_object(&self, object_number: usize, index: usize) -> PdfResult<Object> {
        let offset = match self.offsets.get(index) {
            Some(&(number, offset)) if number == object_number => offset,
            _ => match self.offsets.iter().find(|(number, _)| *number == object_number) {
                Some(&(_, offset)) => offset,
                None => return Ok(Object::Null),
            },
        };

        let mut lexer = Lexer::at(self.decoded.clone(), self.first + offset);

        lexer.lex_object()
    }
}
