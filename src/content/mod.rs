use bytes::Bytes;

use crate::{
    error::{PdfError, PdfResult},
    lex::{LexBase, LexObject},
    objects::Object,
    stream::Stream,
};

pub(crate) use operator::PdfGraphicsOperator;
pub(crate) use stream::content_bytes;

mod inline_image;
mod operator;
mod stream;

/// Splits a decoded content stream into operands and operators
pub(crate) struct ContentLexer {
    buffer: Bytes,
    cursor: usize,

    /// Depth of nested `BX`/`EX` sections, inside which unknown operators are skipped
    compatibility_depth: usize,
}

#[derive(Debug, PartialEq)]
pub(crate) enum ContentToken {
    Object(Object),
    Operator(PdfGraphicsOperator),

    /// A complete `BI ... ID ... EI` sequence
    InlineImage(Stream),
}

impl Iterator for ContentLexer {
    type Item = PdfResult<ContentToken>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

impl ContentLexer {
    pub fn new(buffer: Bytes) -> Self {
        Self {
            buffer,
            cursor: 0,
            compatibility_depth: 0,
        }
    }

    pub fn in_compatibility_section(&self) -> bool {
        self.compatibility_depth != 0
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Reads the next token. Unknown operators are errors outside of `BX`/`EX`, in which case
    /// the lexer has already moved past them
    pub fn next_token(&mut self) -> PdfResult<Option<ContentToken>> {
        loop {
            self.skip_whitespace();

            let token = match self.peek_byte() {
                Some(b'"' | b'\'' | b'a'..=b'z' | b'A'..=b'Z') => match self.lex_operator()? {
                    Some(token) => token,
                    None => continue,
                },
                Some(b']' | b'>' | b')' | b'{' | b'}') => {
                    let pos = self.cursor;
                    self.next_byte();

                    return Err(PdfError::UnexpectedToken {
                        found: char::from(self.buffer[pos]).to_string(),
                        pos,
                    });
                }
                Some(..) => ContentToken::Object(self.lex_object()?),
                None => return Ok(None),
            };

            return Ok(Some(token));
        }
    }

    /// `None` for an unknown operator skipped inside a compatibility section
    fn lex_operator(&mut self) -> PdfResult<Option<ContentToken>> {
        let start = self.cursor;

        while let Some(b) = self.peek_byte() {
            // terminal characters that end operators but are not alphanumeric
            if b == b'*' || b == b'\'' || b == b'"' {
                self.next_byte();
                break;
            }

            if !Self::is_regular(b) {
                break;
            }

            self.next_byte();
        }

        let keyword = String::from_utf8_lossy(&self.buffer[start..self.cursor]).into_owned();

        let token = match keyword.as_str() {
            "true" => ContentToken::Object(Object::True),
            "false" => ContentToken::Object(Object::False),
            "null" => ContentToken::Object(Object::Null),
            _ => match PdfGraphicsOperator::from_str(&keyword) {
                Ok(PdfGraphicsOperator::BX) => {
                    self.compatibility_depth += 1;
                    ContentToken::Operator(PdfGraphicsOperator::BX)
                }
                Ok(PdfGraphicsOperator::EX) => {
                    self.compatibility_depth = self.compatibility_depth.saturating_sub(1);
                    ContentToken::Operator(PdfGraphicsOperator::EX)
                }
                Ok(PdfGraphicsOperator::BI) => ContentToken::InlineImage(self.lex_inline_image()?),
                Ok(op) => ContentToken::Operator(op),
                Err(..) if self.in_compatibility_section() => {
                    log::debug!("skipping unknown operator {:?} inside BX/EX", keyword);
                    return Ok(None);
                }
                Err(..) => return Err(PdfError::UnknownOperator { operator: keyword }),
            },
        };

        Ok(Some(token))
    }
}

impl LexBase for ContentLexer {
    fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }
}

impl LexObject for ContentLexer {
    fn slice(&self, start: usize, end: usize) -> Bytes {
        self.buffer.slice(start..end)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::objects::PdfString;

    fn tokens(buffer: &'static [u8]) -> PdfResult<Vec<ContentToken>> {
        ContentLexer::new(Bytes::from_static(buffer)).collect()
    }

    #[test]
    fn rg_operator_is_not_parsed_as_reference() {
        assert_eq!(
            tokens(b"1 1 1 RG").unwrap(),
            vec![
                ContentToken::Object(Object::Integer(1)),
                ContentToken::Object(Object::Integer(1)),
                ContentToken::Object(Object::Integer(1)),
                ContentToken::Operator(PdfGraphicsOperator::RG)
            ]
        );
    }

    #[test]
    fn empty_line() {
        assert_eq!(tokens(b"\n\n  \n\n").unwrap(), vec![]);
    }

    #[test]
    fn quote_operators() {
        assert_eq!(
            tokens(b"( )'\"").unwrap(),
            vec![
                ContentToken::Object(Object::String(PdfString::from(" "))),
                ContentToken::Operator(PdfGraphicsOperator::single_quote),
                ContentToken::Operator(PdfGraphicsOperator::double_quote),
            ]
        );
    }

    #[test]
    fn no_space_after_star_operator() {
        assert_eq!(
            tokens(b"b*RG").unwrap(),
            vec![
                ContentToken::Operator(PdfGraphicsOperator::b_star),
                ContentToken::Operator(PdfGraphicsOperator::RG),
            ]
        );
    }

    #[test]
    fn unknown_operator_outside_compatibility_section() {
        let mut lexer = ContentLexer::new(Bytes::from_static(b"foo 1 0 0 RG"));

        assert!(matches!(
            lexer.next_token(),
            Err(PdfError::UnknownOperator { ref operator }) if operator == "foo"
        ));

        // the lexer moves past the bad operator
        assert_eq!(
            lexer.next_token().unwrap(),
            Some(ContentToken::Object(Object::Integer(1)))
        );
    }

    #[test]
    fn unknown_operator_inside_compatibility_section() {
        assert_eq!(
            tokens(b"BX foo EX q").unwrap(),
            vec![
                ContentToken::Operator(PdfGraphicsOperator::BX),
                ContentToken::Operator(PdfGraphicsOperator::EX),
                ContentToken::Operator(PdfGraphicsOperator::q),
            ]
        );
    }
}
