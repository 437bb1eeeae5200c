use std::collections::HashSet;

use bytes::Bytes;

use crate::{
    error::{PdfError, PdfResult},
    lex::{LexBase, LexObject, Lexer},
    objects::Object,
    resolve::NoResolve,
    trailer::Trailer,
    xref::{stream::XrefStream, Xref, XrefEntry},
};

const START_XREF_SIGNATURE: &[u8; 9] = b"startxref";
const KILOBYTE: usize = 1024;

#[derive(Debug)]
pub(crate) struct XrefParser {
    lexer: Lexer,
}

/// The merged table of every revision, and the trailer of the newest one
#[derive(Debug)]
pub(crate) struct XrefAndTrailer {
    pub(crate) xref: Xref,
    pub(crate) trailer: Trailer,
}

impl XrefParser {
    pub fn new(file: Bytes) -> Self {
        Self {
            lexer: Lexer::new(file),
        }
    }

    /// Locates the newest section through `startxref` and follows the `/Prev` chain
    pub fn read_xref(&mut self) -> PdfResult<XrefAndTrailer> {
        let start = self.find_startxref()?;

        let mut visited = HashSet::new();
        let mut next = Some(start);
        let mut xref = Xref::new();
        let mut newest: Option<Trailer> = None;

        while let Some(pos) = next {
            if !visited.insert(pos) {
                log::warn!("cross-reference /Prev chain loops back to byte {}", pos);
                break;
            }

            let (section, trailer) = match self.read_section(pos, newest.is_some()) {
                Ok(v) => v,
                // a broken older revision still leaves the newer ones usable
                Err(err) if newest.is_some() => {
                    log::warn!("skipping unreadable xref section at byte {}: {}", pos, err);
                    break;
                }
                Err(err) => return Err(err),
            };

            log::debug!("xref section at byte {} has {} entries", pos, section.len());

            xref.merge_with_previous(section);
            next = trailer.prev;

            if newest.is_none() {
                newest = Some(trailer);
            }
        }

        let trailer = newest.ok_or_else(|| PdfError::malformed("no cross-reference section"))?;

        Ok(XrefAndTrailer { xref, trailer })
    }

    /// We read backwards in 1024 byte chunks, looking for `"startxref"`
    fn find_startxref(&mut self) -> PdfResult<usize> {
        let file = self.lexer.buffer();

        if file.len() < START_XREF_SIGNATURE.len() {
            return Err(PdfError::malformed("file too short"));
        }

        let mut end = file.len();

        let idx = loop {
            let start = end.saturating_sub(KILOBYTE);

            if let Some(offset) = file[start..end]
                .windows(START_XREF_SIGNATURE.len())
                .rposition(|window| window == START_XREF_SIGNATURE)
            {
                break start + offset;
            }

            if start == 0 {
                return Err(PdfError::malformed("no startxref"));
            }

            // overlap so a signature straddling two chunks is still found
            end = start + START_XREF_SIGNATURE.len() - 1;
        };

        self.lexer.set_cursor(idx);
        self.lexer.expect_bytes(START_XREF_SIGNATURE)?;
        self.lexer.skip_whitespace();

        let offset = self.lexer.lex_whole_number();

        offset
            .parse::<usize>()
            .map_err(|_| PdfError::malformed(format!("bad startxref offset {:?}", offset)))
    }

    fn seek_section(&mut self, pos: usize) -> PdfResult<()> {
        if pos >= self.lexer.buffer().len() {
            return Err(PdfError::malformed(format!(
                "xref offset {} lies past the end of the file",
                pos
            )));
        }

        self.lexer.set_cursor(pos);
        self.lexer.skip_whitespace();

        Ok(())
    }

    fn read_section(&mut self, pos: usize, is_previous: bool) -> PdfResult<(Xref, Trailer)> {
        self.seek_section(pos)?;

        if self.lexer.next_is_keyword(b"xref") {
            self.read_classic_section(is_previous)
        } else {
            self.read_stream_section(is_previous)
        }
    }

    fn read_classic_section(&mut self, is_previous: bool) -> PdfResult<(Xref, Trailer)> {
        let mut xref = self.lex_xref_table()?;

        self.lexer.skip_whitespace();
        if !self.lexer.next_is_keyword(b"trailer") {
            return Err(PdfError::malformed(format!(
                "expected trailer at byte {}",
                self.lexer.cursor()
            )));
        }
        self.lexer.expect_bytes(b"trailer")?;

        let dict = self
            .lexer
            .lex_dict()
            .map_err(|err| PdfError::malformed(format!("bad trailer dictionary: {}", err)))?;
        let trailer = Trailer::from_dict(&dict, is_previous)?;

        // a hybrid file's `/XRefStm` names a stream section, never another table
        if let Some(stm) = trailer.xref_stm {
            let stream_section = self
                .seek_section(stm)
                .and_then(|()| self.read_stream_section(true));

            match stream_section {
                Ok((stream_xref, _)) => xref.merge_hybrid(stream_xref),
                Err(err) => log::warn!("ignoring unreadable /XRefStm at byte {}: {}", stm, err),
            }
        }

        Ok((xref, trailer))
    }

    fn lex_xref_table(&mut self) -> PdfResult<Xref> {
        self.lexer.expect_bytes(b"xref")?;
        self.lexer.skip_whitespace();

        let mut xref = Xref::new();

        while self.lexer.peek_byte().map_or(false, |b| b.is_ascii_digit()) {
            let first = self.lex_row_number("subsection start")?;
            self.lexer.skip_whitespace();
            let count = self.lex_row_number("subsection length")?;
            self.lexer.skip_whitespace();

            for idx in 0..count {
                let entry = self.lex_row()?;
                xref.insert(first + idx, entry);
            }
        }

        Ok(xref)
    }

    /// `oooooooooo ggggg n` or `... f`
    fn lex_row(&mut self) -> PdfResult<XrefEntry> {
        let offset = self.lex_row_number("offset")?;
        self.lexer.skip_whitespace();
        let generation = self.lex_row_number("generation")?;
        self.lexer.skip_whitespace();

        let pos = self.lexer.cursor();
        let kind = self.lexer.next_byte();
        self.lexer.skip_whitespace();

        let generation = u16::try_from(generation)
            .map_err(|_| PdfError::malformed(format!("bad generation at byte {}", pos)))?;

        match kind {
            Some(b'n') => Ok(XrefEntry::InUse {
                byte_offset: offset,
                generation,
            }),
            Some(b'f') => Ok(XrefEntry::Free {
                next_free_object: offset as u64,
                generation,
            }),
            found => Err(PdfError::malformed(format!(
                "bad xref row type {:?} at byte {}",
                found.map(char::from),
                pos
            ))),
        }
    }

    fn lex_row_number(&mut self, what: &str) -> PdfResult<usize> {
        let pos = self.lexer.cursor();
        self.lexer
            .lex_whole_number()
            .parse::<usize>()
            .map_err(|_| PdfError::malformed(format!("bad xref {} at byte {}", what, pos)))
    }

    fn read_stream_section(&mut self, is_previous: bool) -> PdfResult<(Xref, Trailer)> {
        let pos = self.lexer.cursor();

        self.lexer
            .lex_object_header()
            .map_err(|_| PdfError::malformed(format!("no xref table or stream at byte {}", pos)))?;

        let dict = self.lexer.lex_dict()?;

        if !self.lexer.next_is_stream() {
            return Err(PdfError::malformed(format!(
                "xref object at byte {} is not a stream",
                pos
            )));
        }

        // `/Length` must be direct here. Anything else is recovered by scanning for `endstream`
        let length = match dict.get("Length") {
            Some(Object::Integer(n)) if *n >= 0 => Some(*n as usize),
            _ => None,
        };

        let stream = match self.lexer.lex_stream(dict.clone(), length) {
            Ok(stream) => stream,
            Err(..) => {
                self.lexer.set_cursor(pos);
                self.lexer.lex_object_header()?;
                self.lexer.lex_dict()?;
                self.lexer.next_is_stream();
                self.lexer.lex_stream(dict, None)?
            }
        };

        XrefStream::from_stream(stream, is_previous)?.parse()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::Reference, test_util::PdfBuilder, xref::ByteOffset};

    #[test]
    fn classic_table() {
        let file = PdfBuilder::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [] /Count 0 >>")
            .build();

        let XrefAndTrailer { xref, trailer } = XrefParser::new(file.bytes.clone()).read_xref().unwrap();

        assert_eq!(trailer.size, 3);
        assert_eq!(trailer.root, Some(Reference::new(1, 0)));
        assert_eq!(
            xref.locate(Reference::new(1, 0)),
            Some(ByteOffset::MainFile(file.offsets[&1]))
        );
        assert!(xref.entry(0).map_or(false, XrefEntry::is_free));
    }

    #[test]
    fn stream_table() {
        let file = PdfBuilder::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [] /Count 0 >>")
            .xref_stream()
            .build();

        let XrefAndTrailer { xref, trailer } = XrefParser::new(file.bytes.clone()).read_xref().unwrap();

        assert_eq!(trailer.root, Some(Reference::new(1, 0)));
        assert_eq!(
            xref.locate(Reference::new(2, 0)),
            Some(ByteOffset::MainFile(file.offsets[&2]))
        );
    }

    #[test]
    fn bad_row_is_malformed() {
        let file = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 x \ntrailer\n<< /Size 1 /Root 1 0 R >>\nstartxref\n9\n%%EOF";

        assert!(matches!(
            XrefParser::new(Bytes::from_static(file)).read_xref(),
            Err(PdfError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn missing_startxref_is_malformed() {
        assert!(matches!(
            XrefParser::new(Bytes::from_static(b"%PDF-1.4\n1 0 obj 1 endobj")).read_xref(),
            Err(PdfError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn prev_loop_is_broken() {
        let file = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Root 1 0 R /Prev 9 >>\nstartxref\n9\n%%EOF";

        let XrefAndTrailer { xref, .. } = XrefParser::new(Bytes::from_static(file)).read_xref().unwrap();

        assert_eq!(xref.len(), 1);
    }

    #[test]
    fn xref_stm_pointing_at_a_table_is_ignored() {
        let file = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Root 1 0 R /XRefStm 9 >>\nstartxref\n9\n%%EOF";

        let XrefAndTrailer { xref, trailer } =
            XrefParser::new(Bytes::from_static(file)).read_xref().unwrap();

        assert_eq!(xref.len(), 1);
        assert_eq!(trailer.xref_stm, Some(9));
    }
}
