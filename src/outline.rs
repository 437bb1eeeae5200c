use std::collections::{HashMap, HashSet};

use crate::{
    data_structures::NameTree,
    error::PdfResult,
    objects::{Dictionary, Object, ObjectType, Reference},
    FromObj, PdfError, Resolve,
};

/// Outlines nested deeper than this are cut off
const MAX_OUTLINE_DEPTH: usize = 64;

/// An entry in the document outline, or bookmarks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub title: String,

    /// The 1-based page the item jumps to, if it jumps to a page in this document
    pub page: Option<usize>,

    pub children: Vec<OutlineItem>,
}

/// Where a link or bookmark leads
#[derive(Debug, Clone)]
enum Destination {
    /// `[page /Fit ...]`. The view parameters do not affect which page is shown
    Explicit(Object),

    /// Instead of being defined directly with the explicit syntax, a destination may be referred
    /// to indirectly by means of a name object or a byte string
    Named(Vec<u8>),
}

impl FromObj for Destination {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        match resolver.resolve(obj)? {
            Object::Array(mut arr) if !arr.is_empty() => Ok(Destination::Explicit(arr.swap_remove(0))),
            Object::String(s) => Ok(Destination::Named(s.0)),
            Object::Name(s) => Ok(Destination::Named(s.into_bytes())),
            // entries of the /Dests dictionary and name tree may wrap the array as /D
            Object::Dictionary(dict) => match dict.get("D") {
                Some(d) => Destination::from_obj(d.clone(), resolver),
                None => Err(PdfError::MissingRequiredKey { key: "D" }),
            },
            found => Err(PdfError::MismatchedObjectTypeAny {
                expected: &[ObjectType::Array, ObjectType::String, ObjectType::Name],
                found: found.object_type(),
            }),
        }
    }
}

/// Reads the `/Outlines` tree of a document catalog
pub(crate) struct OutlineReader<'a> {
    catalog: &'a Dictionary,
    resolver: &'a dyn Resolve,
    page_numbers: HashMap<Reference, usize>,
    visited: HashSet<Reference>,
}

impl<'a> OutlineReader<'a> {
    pub fn new(
        catalog: &'a Dictionary,
        page_numbers: HashMap<Reference, usize>,
        resolver: &'a dyn Resolve,
    ) -> Self {
        Self {
            catalog,
            resolver,
            page_numbers,
            visited: HashSet::new(),
        }
    }

    pub fn read(mut self) -> PdfResult<Vec<OutlineItem>> {
        let root = match self.catalog.get_dict("Outlines", self.resolver)? {
            Some(root) => root,
            None => return Ok(Vec::new()),
        };

        Ok(self.children(&root, 0))
    }

    fn children(&mut self, parent: &Dictionary, depth: usize) -> Vec<OutlineItem> {
        let mut items = Vec::new();

        if depth > MAX_OUTLINE_DEPTH {
            log::warn!("outline deeper than {} levels", MAX_OUTLINE_DEPTH);
            return items;
        }

        let mut next = parent.get("First").cloned();

        while let Some(obj) = next.take() {
            if let Object::Reference(reference) = obj {
                if !self.visited.insert(reference) {
                    log::warn!("outline revisits {}", reference);
                    break;
                }
            }

            let dict = match self.resolver.assert_dict(obj) {
                Ok(dict) => dict,
                Err(err) => {
                    log::warn!("unreadable outline item: {}", err);
                    break;
                }
            };

            let title = match dict.get_string("Title", self.resolver) {
                Ok(title) => title.map(|t| t.to_text()).unwrap_or_default(),
                Err(err) => {
                    log::warn!("outline item /Title: {}", err);
                    String::new()
                }
            };

            let page = self.target_page(&dict).unwrap_or_else(|err| {
                log::warn!("outline item {:?} has no usable destination: {}", title, err);
                None
            });

            let children = self.children(&dict, depth + 1);

            items.push(OutlineItem {
                title,
                page,
                children,
            });

            next = dict.get("Next").cloned();
        }

        items
    }

    fn target_page(&self, item: &Dictionary) -> PdfResult<Option<usize>> {
        let destination = match item.get_typed::<Destination>("Dest", self.resolver)? {
            Some(dest) => dest,
            None => match item.get_dict("A", self.resolver)? {
                Some(action) if action.get_name("S", self.resolver)?.as_deref() == Some("GoTo") => {
                    match action.get_typed::<Destination>("D", self.resolver)? {
                        Some(dest) => dest,
                        None => return Err(PdfError::MissingRequiredKey { key: "D" }),
                    }
                }
                _ => return Ok(None),
            },
        };

        self.page_of(destination)
    }

    fn page_of(&self, destination: Destination) -> PdfResult<Option<usize>> {
        let page = match destination {
            Destination::Explicit(page) => page,
            Destination::Named(name) => match self.lookup_name(&name)? {
                Some(Destination::Explicit(page)) => page,
                Some(Destination::Named(..)) | None => return Ok(None),
            },
        };

        Ok(match page {
            Object::Reference(reference) => self.page_numbers.get(&reference).copied(),
            // remote-style destinations count pages from zero
            Object::Integer(index) if index >= 0 => Some(index as usize + 1),
            _ => None,
        })
    }

    /// Named destinations live in the catalog's `/Dests` dictionary, or, since PDF 1.2, the
    /// `/Dests` name tree of the `/Names` dictionary
    fn lookup_name(&self, name: &[u8]) -> PdfResult<Option<Destination>> {
        if let Some(dests) = self.catalog.get_dict("Dests", self.resolver)? {
            let key = String::from_utf8_lossy(name);

            if let Some(obj) = dests.get(&key) {
                return Ok(Some(Destination::from_obj(obj.clone(), self.resolver)?));
            }
        }

        let tree = match self.catalog.get_dict("Names", self.resolver)? {
            Some(names) => names.get_typed::<NameTree>("Dests", self.resolver)?,
            None => None,
        };

        match tree {
            Some(tree) => tree
                .get(name, self.resolver)?
                .map(|obj| Destination::from_obj(obj, self.resolver))
                .transpose(),
            None => Ok(None),
        }
    }
}
