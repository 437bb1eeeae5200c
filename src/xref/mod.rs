use std::collections::HashMap;

use crate::objects::Reference;

pub(crate) use parser::{XrefAndTrailer, XrefParser};

mod parser;
pub(crate) mod stream;

/// The cross-reference table contains information
/// that permits random access to indirect objects
/// within the file so that the entire file need
/// not be read to locate any particular object
#[derive(Debug, Clone, Default)]
pub struct Xref {
    pub(crate) objects: HashMap<usize, XrefEntry>,
}

/// Where the bytes of an in-use object live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOffset {
    MainFile(usize),
    ObjectStream {
        /// Object number of the containing object stream
        container: usize,
        index: usize,
    },
}

impl Xref {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn entry(&self, object_number: usize) -> Option<&XrefEntry> {
        self.objects.get(&object_number)
    }

    pub(crate) fn insert(&mut self, object_number: usize, entry: XrefEntry) {
        self.objects.insert(object_number, entry);
    }

    /// `None` for free, null and unlisted objects
    /// References whose generation differs from the entry's point at an older, deleted object
    pub fn locate(&self, reference: Reference) -> Option<ByteOffset> {
        match *self.objects.get(&reference.object_number)? {
            XrefEntry::Free { .. } | XrefEntry::Null => None,
            XrefEntry::InUse {
                byte_offset,
                generation,
            } if usize::from(generation) == reference.generation => {
                Some(ByteOffset::MainFile(byte_offset))
            }
            XrefEntry::InUse { .. } => None,
            // compressed objects always have generation zero
            XrefEntry::Compressed { container, index } if reference.generation == 0 => {
                Some(ByteOffset::ObjectStream { container, index })
            }
            XrefEntry::Compressed { .. } => None,
        }
    }

    /// Sections are read newest first, so entries already present win
    pub fn merge_with_previous(&mut self, previous: Xref) {
        for (key, value) in previous.objects.into_iter() {
            self.objects.entry(key).or_insert(value);
        }
    }

    /// Merges the `/XRefStm` section of a hybrid file. Its entries replace any of the classic
    /// table that are free or missing, and nothing else
    pub fn merge_hybrid(&mut self, stream: Xref) {
        for (key, value) in stream.objects.into_iter() {
            match self.objects.get(&key) {
                None | Some(XrefEntry::Free { .. } | XrefEntry::Null) => {
                    self.objects.insert(key, value);
                }
                Some(..) => {}
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    InUse {
        byte_offset: usize,
        generation: u16,
    },
    Free {
        next_free_object: u64,
        generation: u16,
    },
    Compressed {
        /// The object number of the object stream in which this object is stored
        ///
        /// The generation number of the object stream shall be implicitly 0
        container: usize,

        /// The index of this object within the object stream
        index: usize,
    },

    /// Entries of an unknown type in a cross-reference stream, to be read as the null object
    Null,
}

impl XrefEntry {
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free { .. } | Self::Null)
    }
}
