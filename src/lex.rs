use std::collections::HashMap;

use bytes::Bytes;

use crate::{
    error::{PdfError, PdfResult},
    objects::{Dictionary, Object, PdfString, Reference},
    stream::Stream,
};

const FORM_FEED: u8 = b'\x0C';
const BACKSPACE: u8 = b'\x08';

/// Arrays and dictionaries nested deeper than this are rejected
const MAX_OBJECT_NESTING: usize = 256;

/// Version from the `%PDF-M.m` file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    /// Finds the header within the first kilobyte, where some producers prepend junk
    pub fn from_header(buffer: &[u8]) -> Option<Self> {
        let window = &buffer[..buffer.len().min(1024)];
        let start = window.windows(5).position(|w| w == b"%PDF-")? + 5;

        let major = *buffer.get(start)?;
        let dot = *buffer.get(start + 1)?;
        let minor = *buffer.get(start + 2)?;

        if !major.is_ascii_digit() || dot != b'.' || !minor.is_ascii_digit() {
            return None;
        }

        Some(Self {
            major: major - b'0',
            minor: minor - b'0',
        })
    }

    /// `#hh` escapes in names were introduced after PDF 1.1
    pub fn allows_name_escapes(&self) -> bool {
        !(self.major == 1 && self.minor == 1)
    }
}

/// The result of lexing something that starts with a number
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lexeme {
    Object(Object),
    /// An `N G obj` header
    ObjectDefinition(Reference),
}

pub(crate) trait LexBase {
    fn buffer(&self) -> &[u8];
    fn cursor(&self) -> usize;
    fn cursor_mut(&mut self) -> &mut usize;

    fn allows_name_escapes(&self) -> bool {
        true
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_byte() {
            if Self::is_whitespace(b) {
                self.next_byte();
            } else if b == b'%' {
                self.next_byte();
                self.skip_comment();
            } else {
                break;
            }
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.buffer().get(self.cursor()).copied().map(|b| {
            *self.cursor_mut() += 1;
            b
        })
    }

    fn peek_byte(&self) -> Option<u8> {
        self.buffer().get(self.cursor()).copied()
    }

    fn peek_byte_offset(&self, offset: usize) -> Option<u8> {
        self.buffer().get(self.cursor() + offset).copied()
    }

    fn next_is_delimiter(&self) -> bool {
        self.peek_byte().map_or(false, Self::is_delimiter)
    }

    fn next_is_whitespace(&self) -> bool {
        self.peek_byte().map_or(false, Self::is_whitespace)
    }

    fn at_end(&self) -> bool {
        self.cursor() >= self.buffer().len()
    }

    /// Whitespace chars are defined as
    ///
    /// * NUL             0x0
    /// * Horizontal tab  0x9
    /// * Line feed       0xa
    /// * Form feed       0xc
    /// * Carriage return 0xd
    /// * Space           0x20
    ///
    fn is_whitespace(b: u8) -> bool {
        matches!(b, b'\0' | 0x9 | b'\n' | FORM_FEED | b'\r' | b' ')
    }

    fn is_delimiter(b: u8) -> bool {
        matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
    }

    fn is_regular(b: u8) -> bool {
        !Self::is_whitespace(b) && !Self::is_delimiter(b)
    }

    /// Assumes the leading `%` has already been consumed
    fn skip_comment(&mut self) {
        while !self.next_is_eol() {
            self.next_byte();
        }
    }

    fn next_is_eol(&self) -> bool {
        match self.peek_byte() {
            Some(b'\r' | b'\n') => true,
            Some(..) => false,
            None => true,
        }
    }

    /// Does not modify the cursor
    fn next_matches(&self, bytes: &[u8]) -> bool {
        self.buffer()
            .get(self.cursor()..)
            .map_or(false, |rest| rest.starts_with(bytes))
    }

    /// Like [`LexBase::next_matches`], but the keyword must also end at a token boundary
    fn next_is_keyword(&self, keyword: &[u8]) -> bool {
        self.next_matches(keyword)
            && self
                .buffer()
                .get(self.cursor() + keyword.len())
                .map_or(true, |&b| !Self::is_regular(b))
    }

    fn next_byte_err(&mut self) -> PdfResult<u8> {
        let pos = self.cursor();
        self.next_byte().ok_or(PdfError::UnexpectedEof { pos })
    }

    fn expect_byte(&mut self, expected: u8) -> PdfResult<()> {
        let pos = self.cursor();
        match self.next_byte() {
            Some(found) if expected == found => Ok(()),
            found => Err(PdfError::MismatchedByte {
                expected,
                found,
                pos,
            }),
        }
    }

    fn expect_bytes(&mut self, bytes: &[u8]) -> PdfResult<()> {
        for &b in bytes {
            self.expect_byte(b)?;
        }

        Ok(())
    }

    fn expect_eol(&mut self) -> PdfResult<()> {
        let pos = self.cursor();
        match self.next_byte() {
            Some(b'\n') => {}
            Some(b'\r') => {
                if self.peek_byte() == Some(b'\n') {
                    self.next_byte();
                }
            }
            found => {
                return Err(PdfError::MismatchedByteMany {
                    expected: b"\n\r",
                    found,
                    pos,
                });
            }
        }

        Ok(())
    }

    fn lex_name(&mut self) -> PdfResult<String> {
        self.expect_byte(b'/')?;

        let mut name = String::new();

        while let Some(b) = self.peek_byte() {
            if !Self::is_regular(b) {
                break;
            }

            self.next_byte();

            if b == b'#' && self.allows_name_escapes() {
                match (
                    self.peek_byte().and_then(hex_digit),
                    self.peek_byte_offset(1).and_then(hex_digit),
                ) {
                    (Some(high), Some(low)) => {
                        self.next_byte();
                        self.next_byte();
                        name.push(char::from(high * 16 + low));
                    }
                    // a lone `#` is kept literally
                    _ => name.push('#'),
                }
            } else {
                name.push(char::from(b));
            }
        }

        Ok(name)
    }

    /// Reads a literal string, `(...)`
    fn lex_string(&mut self) -> PdfResult<Vec<u8>> {
        self.expect_byte(b'(')?;

        let mut string = Vec::new();
        let mut num_open_parens = 0_usize;

        loop {
            match self.next_byte_err()? {
                b')' if num_open_parens == 0 => break,
                b')' => {
                    num_open_parens -= 1;
                    string.push(b')');
                }
                b'(' => {
                    num_open_parens += 1;
                    string.push(b'(');
                }
                b'\\' => match self.next_byte_err()? {
                    b'n' => string.push(b'\n'),
                    b'r' => string.push(b'\r'),
                    b't' => string.push(b'\t'),
                    b'b' => string.push(BACKSPACE),
                    b'f' => string.push(FORM_FEED),
                    b'(' => string.push(b'('),
                    b')' => string.push(b')'),
                    b'\\' => string.push(b'\\'),
                    // line continuation
                    b'\r' => {
                        if self.peek_byte() == Some(b'\n') {
                            self.next_byte();
                        }
                    }
                    b'\n' => {}
                    // octal escape of the form `\ddd`, where there may be fewer than 3 digits
                    c @ b'0'..=b'7' => {
                        let mut n = u32::from(c - b'0');

                        for _ in 0..2 {
                            match self.peek_byte() {
                                Some(d @ b'0'..=b'7') => {
                                    self.next_byte();
                                    n = n * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }

                        string.push((n & 0xff) as u8);
                    }
                    // unknown escapes drop the backslash
                    c => string.push(c),
                },
                // an unescaped end-of-line is read as a single line feed
                b'\r' => {
                    if self.peek_byte() == Some(b'\n') {
                        self.next_byte();
                    }
                    string.push(b'\n');
                }
                b => string.push(b),
            }
        }

        Ok(string)
    }

    /// Reads a hex string, `<...>`. An odd trailing digit is read as if followed by `0`
    fn lex_hex_string(&mut self) -> PdfResult<Vec<u8>> {
        self.expect_byte(b'<')?;

        let mut string = Vec::new();
        let mut high: Option<u8> = None;

        loop {
            let pos = self.cursor();
            let b = self.next_byte_err()?;

            if b == b'>' {
                break;
            }

            if Self::is_whitespace(b) {
                continue;
            }

            let digit = hex_digit(b).ok_or(PdfError::UnexpectedToken {
                found: char::from(b).to_string(),
                pos,
            })?;

            match high.take() {
                Some(h) => string.push(h * 16 + digit),
                None => high = Some(digit),
            }
        }

        if let Some(h) = high {
            string.push(h * 16);
        }

        Ok(string)
    }

    // TODO: throw error on empty string
    fn lex_whole_number(&mut self) -> String {
        let mut whole_number = String::new();

        while let Some(b) = self.peek_byte() {
            if !b.is_ascii_digit() {
                break;
            }

            self.next_byte();

            whole_number.push(b as char);
        }

        whole_number
    }

    /// Reads a single integer or real. Integers too large for 32 bits degrade to reals
    fn lex_number(&mut self) -> PdfResult<Object> {
        let start = self.cursor();

        let negative = match self.peek_byte() {
            Some(b'+') => {
                self.next_byte();
                false
            }
            Some(b'-') => {
                self.next_byte();
                // tolerate doubled signs, `--5`
                while self.peek_byte() == Some(b'-') {
                    self.next_byte();
                }
                true
            }
            Some(..) => false,
            None => return Err(PdfError::UnexpectedEof { pos: start }),
        };

        let whole_number = self.lex_whole_number();

        if self.peek_byte() == Some(b'.') {
            self.next_byte();
            let fraction = self.lex_whole_number();

            let value = format!(
                "{}.{}",
                if whole_number.is_empty() { "0" } else { &whole_number },
                if fraction.is_empty() { "0" } else { &fraction }
            )
            .parse::<f32>()
            .map_err(|_| PdfError::UnexpectedToken {
                found: String::from_utf8_lossy(&self.buffer()[start..self.cursor()]).into_owned(),
                pos: start,
            })?;

            return Ok(Object::Real(if negative { -value } else { value }));
        }

        if whole_number.is_empty() {
            // a bare sign is read as zero
            return Ok(Object::Integer(0));
        }

        Ok(match whole_number.parse::<i64>() {
            Ok(n) => {
                let n = if negative { -n } else { n };
                match i32::try_from(n) {
                    Ok(n) => Object::Integer(n),
                    Err(..) => Object::Real(n as f32),
                }
            }
            Err(..) => {
                let value = whole_number.parse::<f64>().unwrap_or(0.0) as f32;
                Object::Real(if negative { -value } else { value })
            }
        })
    }
}

pub(crate) trait LexObject: LexBase {
    /// A zero-copy view of `start..end` of the underlying buffer
    fn slice(&self, start: usize, end: usize) -> Bytes;

    fn lex_object(&mut self) -> PdfResult<Object> {
        self.lex_nested_object(0)
    }

    /// `depth` counts the arrays and dictionaries enclosing the object
    fn lex_nested_object(&mut self, depth: usize) -> PdfResult<Object> {
        self.skip_whitespace();
        let pos = self.cursor();

        if depth > MAX_OBJECT_NESTING {
            return Err(PdfError::UnexpectedToken {
                found: format!("object nested deeper than {} levels", MAX_OBJECT_NESTING),
                pos,
            });
        }

        let obj = match self.peek_byte() {
            Some(b't') => self.lex_keyword(b"true", Object::True),
            Some(b'f') => self.lex_keyword(b"false", Object::False),
            Some(b'n') => self.lex_keyword(b"null", Object::Null),
            Some(b'<') => self.lex_gt(depth),
            Some(b'+' | b'-' | b'0'..=b'9' | b'.') => match self.lex_number_or_reference()? {
                Lexeme::Object(obj) => Ok(obj),
                Lexeme::ObjectDefinition(..) => {
                    Err(PdfError::UnexpectedObjectDefinition { pos })
                }
            },
            Some(b'(') => Ok(Object::String(PdfString(self.lex_string()?))),
            Some(b'/') => Ok(Object::Name(self.lex_name()?)),
            Some(b'[') => self.lex_array(depth),
            Some(b) => Err(PdfError::UnexpectedToken {
                found: char::from(b).to_string(),
                pos,
            }),
            None => Err(PdfError::UnexpectedEof { pos }),
        }?;
        self.skip_whitespace();
        Ok(obj)
    }

    fn lex_keyword(&mut self, keyword: &'static [u8], value: Object) -> PdfResult<Object> {
        let pos = self.cursor();

        if !self.next_is_keyword(keyword) {
            let end = (pos + keyword.len()).min(self.buffer().len());
            return Err(PdfError::UnexpectedToken {
                found: String::from_utf8_lossy(&self.buffer()[pos..end]).into_owned(),
                pos,
            });
        }

        *self.cursor_mut() += keyword.len();

        Ok(value)
    }

    fn lex_gt(&mut self, depth: usize) -> PdfResult<Object> {
        match self.peek_byte_offset(1) {
            Some(b'<') => self.lex_nested_dict(depth).map(Object::Dictionary),
            _ => Ok(Object::String(PdfString(self.lex_hex_string()?))),
        }
    }

    /// Reads a dictionary. A following `stream` keyword is left unconsumed
    fn lex_dict(&mut self) -> PdfResult<Dictionary> {
        self.lex_nested_dict(0)
    }

    fn lex_nested_dict(&mut self, depth: usize) -> PdfResult<Dictionary> {
        self.skip_whitespace();
        self.expect_bytes(b"<<")?;
        self.skip_whitespace();

        let mut dict = HashMap::new();

        loop {
            self.skip_whitespace();
            let pos = self.cursor();

            match self.peek_byte() {
                Some(b'>') => {
                    self.expect_bytes(b">>")?;
                    break;
                }
                Some(b'/') => {}
                Some(..) => {
                    let found = self.lex_nested_object(depth + 1)?;
                    return Err(PdfError::InvalidDictionaryKey {
                        found: found.object_type(),
                        pos,
                    });
                }
                None => return Err(PdfError::UnexpectedEof { pos }),
            }

            let name = self.lex_name()?;
            let value = self.lex_nested_object(depth + 1)?;

            // a null value is equivalent to the key being absent
            if !value.is_null() {
                dict.insert(name, value);
            }
        }

        Ok(Dictionary::new(dict))
    }

    fn lex_array(&mut self, depth: usize) -> PdfResult<Object> {
        let mut arr = Vec::new();
        self.expect_byte(b'[')?;
        loop {
            self.skip_whitespace();
            match self.peek_byte() {
                Some(b']') => {
                    self.next_byte();
                    break;
                }
                Some(..) => arr.push(self.lex_nested_object(depth + 1)?),
                None => return Err(PdfError::UnexpectedEof { pos: self.cursor() }),
            }
        }

        Ok(Object::Array(arr))
    }

    /// Lexes a number, looking ahead up to two tokens to detect `N G R` and `N G obj`.
    ///
    /// When the lookahead does not match, the cursor is left directly after the first number
    fn lex_number_or_reference(&mut self) -> PdfResult<Lexeme> {
        let start = self.cursor();
        let first = self.lex_number()?;

        let object_number = match first {
            Object::Integer(n) if n >= 0 && self.buffer()[start].is_ascii_digit() => n as usize,
            _ => return Ok(Lexeme::Object(first)),
        };

        let after_first = self.cursor();

        self.skip_whitespace();

        if self.peek_byte().map_or(false, |b| b.is_ascii_digit()) {
            let generation = self.lex_whole_number();

            if self.next_is_whitespace() {
                self.skip_whitespace();

                let generation = generation.parse::<usize>().ok();

                if let Some(generation) = generation {
                    let reference = Reference::new(object_number, generation);

                    if self.next_is_keyword(b"R") {
                        self.next_byte();
                        return Ok(Lexeme::Object(Object::Reference(reference)));
                    }

                    if self.next_is_keyword(b"obj") {
                        *self.cursor_mut() += 3;
                        return Ok(Lexeme::ObjectDefinition(reference));
                    }
                }
            }
        }

        *self.cursor_mut() = after_first;

        Ok(Lexeme::Object(first))
    }

    /// Reads `N G obj` and returns the reference it defines
    fn lex_object_header(&mut self) -> PdfResult<Reference> {
        self.skip_whitespace();
        let pos = self.cursor();

        match self.lex_number_or_reference()? {
            Lexeme::ObjectDefinition(reference) => Ok(reference),
            Lexeme::Object(obj) => Err(PdfError::UnexpectedToken {
                found: format!("{:?}", obj),
                pos,
            }),
        }
    }

    /// Consumes `endobj` if present. Missing terminators are common enough to tolerate
    fn lex_object_trailer(&mut self) {
        self.skip_whitespace();

        if self.next_is_keyword(b"endobj") {
            *self.cursor_mut() += b"endobj".len();
        }
    }

    fn next_is_stream(&mut self) -> bool {
        self.skip_whitespace();
        self.next_is_keyword(b"stream")
    }

    /// Reads `stream`, exactly `length` bytes, then `endstream`.
    ///
    /// When `length` is unknown the data extends to the next `endstream`
    fn lex_stream(&mut self, dict: Dictionary, length: Option<usize>) -> PdfResult<Stream> {
        self.skip_whitespace();
        self.expect_bytes(b"stream")?;

        // the keyword is followed by CRLF or LF. A lone CR is tolerated
        match self.peek_byte() {
            Some(b'\r') => {
                self.next_byte();
                if self.peek_byte() == Some(b'\n') {
                    self.next_byte();
                }
            }
            Some(b'\n') => {
                self.next_byte();
            }
            _ => {}
        }

        let start = self.cursor();

        let end = match length {
            Some(length) => {
                let end = start + length;

                if end > self.buffer().len() {
                    return Err(PdfError::MalformedStream {
                        pos: start,
                        reason: format!("length {} runs past the end of the file", length),
                    });
                }

                end
            }
            None => {
                let offset = self.buffer()[start..]
                    .windows(b"endstream".len())
                    .position(|w| w == b"endstream")
                    .ok_or(PdfError::MalformedStream {
                        pos: start,
                        reason: "missing endstream".to_owned(),
                    })?;

                let mut end = start + offset;

                if end > start && self.buffer()[end - 1] == b'\n' {
                    end -= 1;
                }
                if end > start && self.buffer()[end - 1] == b'\r' {
                    end -= 1;
                }

                end
            }
        };

        let data = self.slice(start, end);

        *self.cursor_mut() = end;

        self.skip_whitespace();

        if !self.next_matches(b"endstream") {
            return Err(PdfError::MalformedStream {
                pos: self.cursor(),
                reason: "expected endstream".to_owned(),
            });
        }

        *self.cursor_mut() += b"endstream".len();

        Ok(Stream::new(dict, data))
    }
}

pub(crate) fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Lexer over a shared byte buffer, used for file bodies and decoded object streams
#[derive(Debug, Clone)]
pub(crate) struct Lexer {
    buffer: Bytes,
    cursor: usize,
    name_escapes: bool,
}

impl Lexer {
    pub fn new(buffer: Bytes) -> Self {
        Self {
            buffer,
            cursor: 0,
            name_escapes: true,
        }
    }

    pub fn at(buffer: Bytes, cursor: usize) -> Self {
        Self {
            buffer,
            cursor,
            name_escapes: true,
        }
    }

    pub fn with_version(mut self, version: Option<PdfVersion>) -> Self {
        self.name_escapes = version.map_or(true, |v| v.allows_name_escapes());
        self
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }
}

impl LexBase for Lexer {
    fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }

    fn allows_name_escapes(&self) -> bool {
        self.name_escapes
    }
}

impl LexObject for Lexer {
    fn slice(&self, start: usize, end: usize) -> Bytes {
        self.buffer.slice(start..end)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lexer(s: &str) -> Lexer {
        Lexer::new(Bytes::copy_from_slice(s.as_bytes()))
    }

    fn string(bytes: &[u8]) -> Object {
        Object::String(PdfString(bytes.to_vec()))
    }

    #[test]
    fn octal_escapes() {
        assert_eq!(lexer("(\\101\\102)").lex_object().unwrap(), string(b"AB"));
        assert_eq!(lexer("(\\7x)").lex_object().unwrap(), string(b"\x07x"));
    }

    #[test]
    fn hex_strings() {
        assert_eq!(lexer("<4142>").lex_object().unwrap(), string(b"AB"));
        assert_eq!(lexer("<41 4 2>").lex_object().unwrap(), string(b"AB"));
        assert_eq!(lexer("<>").lex_object().unwrap(), string(b""));
    }

    #[test]
    fn odd_hex_string_pads_low_nibble() {
        let obj = lexer("<414>").lex_object().unwrap();
        assert_eq!(obj, string(&[0x41, 0x40]));
    }

    #[test]
    fn nested_parens_and_continuation() {
        assert_eq!(
            lexer("(a(b)c\\\nd\\)\\n)").lex_object().unwrap(),
            string(b"a(b)cd)\n")
        );
    }

    #[test]
    fn reference() {
        assert_eq!(
            lexer("3 0 R").lex_object().unwrap(),
            Object::Reference(Reference::new(3, 0))
        );
    }

    #[test]
    fn references_inside_array() {
        assert_eq!(
            lexer("[1 0 R 2 5 R]").lex_object().unwrap(),
            Object::Array(vec![
                Object::Reference(Reference::new(1, 0)),
                Object::Reference(Reference::new(2, 5)),
            ])
        );
    }

    #[test]
    fn object_definition() {
        let mut lexer = lexer("3 0 obj 42 endobj");
        assert_eq!(lexer.lex_object_header().unwrap(), Reference::new(3, 0));
        assert_eq!(lexer.lex_object().unwrap(), Object::Integer(42));
        lexer.lex_object_trailer();
        assert!(lexer.at_end());
    }

    #[test]
    fn object_definition_is_not_a_value() {
        assert!(matches!(
            lexer("3 0 obj 42 endobj").lex_object(),
            Err(PdfError::UnexpectedObjectDefinition { pos: 0 })
        ));
    }

    #[test]
    fn bare_number_leaves_lookahead_unconsumed() {
        let mut lexer = lexer("3 4 5");

        assert_eq!(
            lexer.lex_number_or_reference().unwrap(),
            Lexeme::Object(Object::Integer(3))
        );
        assert_eq!(lexer.cursor(), 1);

        assert_eq!(lexer.lex_object().unwrap(), Object::Integer(4));
        assert_eq!(lexer.lex_object().unwrap(), Object::Integer(5));
    }

    #[test]
    fn number_followed_by_name() {
        let mut lexer = lexer("[3 0 /R]");
        assert_eq!(
            lexer.lex_object().unwrap(),
            Object::Array(vec![
                Object::Integer(3),
                Object::Integer(0),
                Object::Name("R".to_owned())
            ])
        );
    }

    #[test]
    fn reals() {
        assert_eq!(lexer(".5").lex_object().unwrap(), Object::Real(0.5));
        assert_eq!(lexer("-.5").lex_object().unwrap(), Object::Real(-0.5));
        assert_eq!(lexer("4.").lex_object().unwrap(), Object::Real(4.0));
        assert_eq!(lexer("+17").lex_object().unwrap(), Object::Integer(17));
    }

    #[test]
    fn name_escapes() {
        assert_eq!(
            lexer("/A#20B").lex_object().unwrap(),
            Object::Name("A B".to_owned())
        );

        let mut old = lexer("/A#20B").with_version(Some(PdfVersion { major: 1, minor: 1 }));
        assert_eq!(old.lex_object().unwrap(), Object::Name("A#20B".to_owned()));
    }

    #[test]
    fn dictionary_with_non_name_key() {
        assert!(matches!(
            lexer("<< 1 2 >>").lex_object(),
            Err(PdfError::InvalidDictionaryKey { pos: 3, .. })
        ));
    }

    #[test]
    fn stream_requires_endstream() {
        let mut ok = lexer("stream\nabcde\nendstream");
        let stream = ok.lex_stream(Dictionary::default(), Some(5)).unwrap();
        assert_eq!(&stream.raw_data()[..], b"abcde");

        let mut bad = lexer("stream\nabcde\nendstream");
        assert!(matches!(
            bad.lex_stream(Dictionary::default(), Some(3)),
            Err(PdfError::MalformedStream { .. })
        ));
    }

    #[test]
    fn dictionary_after_line_break() {
        let dict = lexer("\n<< /A 1 >>").lex_dict().unwrap();
        assert_eq!(dict.get("A"), Some(&Object::Integer(1)));
    }

    #[test]
    fn deeply_nested_arrays_are_rejected() {
        let nested = format!("{}{}", "[".repeat(100_000), "]".repeat(100_000));
        assert!(matches!(
            lexer(&nested).lex_object(),
            Err(PdfError::UnexpectedToken { .. })
        ));

        let dicts = format!("{}1{}", "<< /A ".repeat(100_000), " >>".repeat(100_000));
        assert!(matches!(
            lexer(&dicts).lex_object(),
            Err(PdfError::UnexpectedToken { .. })
        ));

        let shallow = format!("{}{}", "[".repeat(64), "]".repeat(64));
        assert!(lexer(&shallow).lex_object().is_ok());
    }

    #[test]
    fn version_header() {
        assert_eq!(
            PdfVersion::from_header(b"%PDF-1.7\n"),
            Some(PdfVersion { major: 1, minor: 7 })
        );
        assert_eq!(PdfVersion::from_header(b"garbage"), None);
    }
}
