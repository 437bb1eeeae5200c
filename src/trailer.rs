use std::convert::TryFrom;

use crate::{
    error::{PdfError, PdfResult},
    objects::{Dictionary, Object, PdfString, Reference},
    resolve::NoResolve,
};

/// Trailer values are read before any object can be located, so every lookup here goes
/// through [`NoResolve`]
#[derive(Debug, Clone)]
pub struct Trailer {
    /// The total number of entries in the
    /// file's cross-reference table, as
    /// defined by the combination of the
    /// original section and all update sections.
    ///
    /// Equivalently, this value shall be 1 greater
    /// than the highest object number defined in the
    /// file. Any object in a cross-reference section
    /// whose number is greater than this value shall
    /// be ignored and defined to be missing by a
    /// conforming reader.
    pub size: usize,

    /// The byte offset in the decoded stream from the
    /// beginning of the file to the beginning of the
    /// previous cross-reference section
    ///
    /// Present only if the file has more than one
    /// cross-reference section.
    pub prev: Option<usize>,

    /// Only absent from the trailers of earlier revisions
    pub root: Option<Reference>,

    /// The `/Encrypt` entry, either a dictionary or a reference to one
    pub encrypt: Option<Object>,

    /// The two halves of the file identifier
    pub id: Option<(PdfString, PdfString)>,

    pub info: Option<Reference>,

    /// Offset of the cross-reference stream of a hybrid-reference file
    pub xref_stm: Option<usize>,
}

impl Trailer {
    pub(crate) fn from_dict(dict: &Dictionary, is_previous: bool) -> PdfResult<Self> {
        let resolver = &NoResolve;

        let size = usize::try_from(dict.expect_integer("Size", resolver)?)?;
        let prev = dict
            .get_integer("Prev", resolver)?
            .map(usize::try_from)
            .transpose()?;

        let root = dict.get_reference("Root");

        if root.is_none() && !is_previous {
            return Err(PdfError::malformed("trailer has no /Root"));
        }

        let encrypt = dict.get("Encrypt").cloned();

        let id = match dict.get("ID") {
            Some(Object::Array(arr)) => match arr.as_slice() {
                [Object::String(first), Object::String(second)] => {
                    Some((first.clone(), second.clone()))
                }
                _ => None,
            },
            _ => None,
        };

        let info = dict.get_reference("Info");
        let xref_stm = dict
            .get_integer("XRefStm", resolver)?
            .map(usize::try_from)
            .transpose()?;

        Ok(Trailer {
            size,
            prev,
            root,
            encrypt,
            id,
            info,
            xref_stm,
        })
    }

    /// The first half of `/ID`, which feeds the encryption key. Empty when absent
    pub fn first_id(&self) -> &[u8] {
        self.id.as_ref().map_or(&[], |(first, _)| first.as_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dict(entries: Vec<(&str, Object)>) -> Dictionary {
        let mut dict = Dictionary::default();
        for (key, value) in entries {
            dict.insert(key, value);
        }
        dict
    }

    #[test]
    fn missing_root_is_malformed() {
        let trailer = dict(vec![("Size", Object::Integer(4))]);

        assert!(matches!(
            Trailer::from_dict(&trailer, false),
            Err(PdfError::MalformedDocument { .. })
        ));
        assert!(Trailer::from_dict(&trailer, true).is_ok());
    }

    #[test]
    fn reads_entries() {
        let trailer = dict(vec![
            ("Size", Object::Integer(4)),
            ("Prev", Object::Integer(120)),
            ("Root", Object::Reference(Reference::new(1, 0))),
            (
                "ID",
                Object::Array(vec![
                    Object::String(PdfString::from("ab")),
                    Object::String(PdfString::from("cd")),
                ]),
            ),
        ]);

        let trailer = Trailer::from_dict(&trailer, false).unwrap();

        assert_eq!(trailer.size, 4);
        assert_eq!(trailer.prev, Some(120));
        assert_eq!(trailer.root, Some(Reference::new(1, 0)));
        assert_eq!(trailer.first_id(), b"ab");
        assert!(trailer.encrypt.is_none());
    }
}
