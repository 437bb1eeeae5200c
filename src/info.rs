use crate::{
    error::PdfResult,
    objects::{Dictionary, Object},
    FromObj, Resolve,
};

/// The document information dictionary, referenced by the trailer's `/Info`
///
/// Text strings are decoded from PDFDocEncoding, or UTF-16BE when they start with a byte order
/// mark. Dates are left in their raw `D:YYYYMMDDHHmmSSOHH'mm` form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Info {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,

    /// The application that created the original document
    pub creator: Option<String>,

    /// The application that converted it to PDF
    pub producer: Option<String>,

    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
}

impl FromObj for Info {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        let dict = resolver.assert_dict(obj)?;

        Ok(Self {
            title: text(&dict, "Title", resolver),
            author: text(&dict, "Author", resolver),
            subject: text(&dict, "Subject", resolver),
            keywords: text(&dict, "Keywords", resolver),
            creator: text(&dict, "Creator", resolver),
            producer: text(&dict, "Producer", resolver),
            creation_date: text(&dict, "CreationDate", resolver),
            mod_date: text(&dict, "ModDate", resolver),
        })
    }
}

/// A malformed entry is treated as missing
fn text(dict: &Dictionary, key: &str, resolver: &dyn Resolve) -> Option<String> {
    match dict.get_string(key, resolver) {
        Ok(s) => s.map(|s| s.to_text()),
        Err(err) => {
            log::warn!("/Info /{}: {}", key, err);
            None
        }
    }
}

impl Info {
    pub fn is_empty(&self) -> bool {
        *self == Info::default()
    }

    /// Entries that are present, in display order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
            ("CreationDate", &self.creation_date),
            ("ModDate", &self.mod_date),
        ]
        .into_iter()
        .filter_map(|(key, value)| Some((key, value.as_deref()?)))
        .collect()
    }
}
