use std::{
    cell::RefCell,
    sync::{Arc, Mutex, MutexGuard},
};

use bytes::Bytes;

use crate::{
    cache::Cache,
    config::RenderConfig,
    encryption::{DecryptionTarget, SecurityHandler},
    error::{PdfError, PdfResult},
    lex::{LexBase, LexObject, Lexer, PdfVersion},
    object_stream::ObjectStream,
    objects::{Dictionary, Object, PdfString, Reference},
    resolve::Resolve,
    stream::Stream,
    xref::{ByteOffset, Xref},
};

/// Guards against `/Length` entries that refer, through other streams, back to themselves
const MAX_NESTED_DEREFERENCE: usize = 8;

/// Owns the file bytes and the cross-reference table. Every read of the file goes through the
/// mutex in [`Store`], so at most one dereference is in flight at a time
pub(crate) struct ObjectStore {
    buffer: Bytes,

    /// The shared read position. Restored after every dereference
    cursor: usize,

    xref: Xref,

    /// `/Size` from the newest trailer
    size: usize,

    version: Option<PdfVersion>,
    security: Option<Arc<SecurityHandler>>,
    objects: Cache<Reference, Object>,

    /// Decoded object streams, keyed by their object number
    containers: Cache<usize, Arc<ObjectStream>>,
}

pub struct Store {
    inner: Mutex<ObjectStore>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

/// Lends a locked store out as a [`Resolve`], for the decoding that happens while the lock is
/// held
struct Locked<'a> {
    store: RefCell<&'a mut ObjectStore>,
    depth: usize,
}

impl Resolve for Locked<'_> {
    fn lex_object_from_reference(&self, reference: Reference) -> PdfResult<Object> {
        let mut store = self
            .store
            .try_borrow_mut()
            .map_err(|_| PdfError::malformed("reentrant dereference"))?;

        store.dereference(reference, self.depth + 1)
    }
}

impl Store {
    pub(crate) fn new(buffer: Bytes, xref: Xref, size: usize, config: &RenderConfig) -> Self {
        let version = PdfVersion::from_header(&buffer);

        Self {
            inner: Mutex::new(ObjectStore {
                buffer,
                cursor: 0,
                xref,
                size,
                version,
                security: None,
                objects: Cache::new(config.object_cache_capacity),
                containers: Cache::new(config.object_stream_cache_capacity),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ObjectStore> {
        // a panic while parsing leaves the store itself consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Installs the security handler. Anything cached before this point was read undecrypted
    pub(crate) fn set_security(&self, security: Arc<SecurityHandler>) {
        let mut store = self.lock();
        store.security = Some(security);
        store.objects.clear();
        store.containers.clear();
    }

    pub fn version(&self) -> Option<PdfVersion> {
        self.lock().version
    }

    /// Where the object currently lives, if it is in use
    pub fn locate(&self, reference: Reference) -> Option<ByteOffset> {
        self.lock().xref.locate(reference)
    }

    pub fn size(&self) -> usize {
        self.lock().size
    }

    /// The shared read position of the underlying bytes
    pub fn cursor_position(&self) -> usize {
        self.lock().cursor
    }

    /// Reads an indirect object. Fails with `MalformedXref` for object numbers outside the
    /// table; anything else that goes wrong reads as [`Object::Null`]
    pub fn dereference(&self, reference: Reference) -> PdfResult<Object> {
        self.lock().dereference(reference, 0)
    }

    pub fn evict(&self, reference: Reference) {
        self.lock().objects.evict(&reference);
    }

    pub fn retain(&self, keep: impl FnMut(&Reference, &Object) -> bool) {
        self.lock().objects.retain(keep);
    }

    pub fn clear_caches(&self) {
        let mut store = self.lock();
        store.objects.clear();
        store.containers.clear();
    }

    pub fn cached_objects(&self) -> usize {
        self.lock().objects.len()
    }
}

impl Resolve for Store {
    fn lex_object_from_reference(&self, reference: Reference) -> PdfResult<Object> {
        self.dereference(reference)
    }
}

impl ObjectStore {
    fn dereference(&mut self, reference: Reference, depth: usize) -> PdfResult<Object> {
        if reference.object_number >= self.size {
            return Err(PdfError::malformed_xref(format!(
                "object {} is outside the table of {} entries",
                reference, self.size
            )));
        }

        if let Some(obj) = self.objects.get(&reference) {
            return Ok(obj);
        }

        if depth > MAX_NESTED_DEREFERENCE {
            return Err(PdfError::malformed(format!(
                "dereferencing {} nests too deeply",
                reference
            )));
        }

        let saved_cursor = self.cursor;
        let result = self.load(reference, depth);
        self.cursor = saved_cursor;

        let obj = match result {
            Ok(obj) => obj,
            Err(err @ PdfError::MalformedXref { .. }) => return Err(err),
            Err(err) => {
                log::warn!("failed to read object {}: {}", reference, err);
                Object::Null
            }
        };

        self.objects.insert(reference, obj.clone());

        Ok(obj)
    }

    fn load(&mut self, reference: Reference, depth: usize) -> PdfResult<Object> {
        match self.xref.locate(reference) {
            None => Ok(Object::Null),
            Some(ByteOffset::MainFile(offset)) => {
                if offset >= self.buffer.len() {
                    return Err(PdfError::malformed_xref(format!(
                        "object {} at byte {} lies past the end of the file",
                        reference, offset
                    )));
                }

                self.parse_at(reference, offset, depth)
            }
            Some(ByteOffset::ObjectStream { container, index }) => {
                // objects in object streams were decrypted along with their container
                self.container(container, depth)?
                    .parse_object(reference.object_number, index)
            }
        }
    }

    fn parse_at(&mut self, reference: Reference, offset: usize, depth: usize) -> PdfResult<Object> {
        self.cursor = offset;

        let mut lexer = Lexer::at(self.buffer.clone(), offset).with_version(self.version);

        let header = lexer.lex_object_header()?;

        if header.object_number != reference.object_number {
            return Err(PdfError::malformed(format!(
                "expected object {}, found {}",
                reference, header
            )));
        }

        let obj = match lexer.lex_object()? {
            Object::Dictionary(dict) => {
                if lexer.next_is_stream() {
                    let length = {
                        let locked = Locked {
                            store: RefCell::new(&mut *self),
                            depth,
                        };
                        stream_length(&dict, &locked)
                    };

                    Object::Stream(lexer.lex_stream(dict, length)?)
                } else {
                    Object::Dictionary(dict)
                }
            }
            obj => obj,
        };

        lexer.lex_object_trailer();
        self.cursor = lexer.cursor();

        match &self.security {
            Some(security) => decrypt_object(security, reference, obj),
            None => Ok(obj),
        }
    }

    fn container(&mut self, number: usize, depth: usize) -> PdfResult<Arc<ObjectStream>> {
        if let Some(container) = self.containers.get(&number) {
            return Ok(container);
        }

        let stream = match self.dereference(Reference::new(number, 0), depth + 1)? {
            Object::Stream(stream) => stream,
            found => {
                return Err(PdfError::malformed(format!(
                    "object stream {} is a {:?}",
                    number,
                    found.object_type()
                )))
            }
        };

        let container = {
            let locked = Locked {
                store: RefCell::new(&mut *self),
                depth,
            };
            Arc::new(ObjectStream::from_stream(&stream, &locked)?)
        };

        log::debug!(
            "decoded object stream {} with {} objects",
            number,
            container.len()
        );

        self.containers.insert(number, Arc::clone(&container));

        Ok(container)
    }
}

/// `None` when `/Length` is missing or unusable, in which case the data runs to `endstream`
fn stream_length(dict: &Dictionary, resolver: &dyn Resolve) -> Option<usize> {
    match dict.get_integer("Length", resolver) {
        Ok(Some(length)) if length >= 0 => Some(length as usize),
        Ok(..) => None,
        Err(err) => {
            log::warn!("unusable stream /Length: {}", err);
            None
        }
    }
}

fn decrypt_object(
    security: &SecurityHandler,
    reference: Reference,
    obj: Object,
) -> PdfResult<Object> {
    Ok(match obj {
        Object::String(s) => Object::String(PdfString(security.decrypt(
            reference,
            s.as_bytes(),
            DecryptionTarget::String,
        )?)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|obj| decrypt_object(security, reference, obj))
                .collect::<PdfResult<Vec<Object>>>()?,
        ),
        Object::Dictionary(dict) => Object::Dictionary(decrypt_dict(security, reference, dict)?),
        Object::Stream(stream) => {
            let skip = match stream.dict.get("Type").and_then(Object::as_name) {
                Some("XRef") => true,
                Some("Metadata") => !security.encrypts_metadata(),
                _ => false,
            } || first_filter_is_crypt(&stream.dict);

            let dict = decrypt_dict(security, reference, stream.dict.clone())?;

            if skip {
                Object::Stream(Stream::new(dict, stream.raw_data().clone()))
            } else {
                let data =
                    security.decrypt(reference, stream.raw_data(), DecryptionTarget::Stream)?;
                Object::Stream(Stream::new(dict, Bytes::from(data)))
            }
        }
        obj => obj,
    })
}

fn decrypt_dict(
    security: &SecurityHandler,
    reference: Reference,
    mut dict: Dictionary,
) -> PdfResult<Dictionary> {
    for (_, value) in dict.iter_mut() {
        let obj = std::mem::replace(value, Object::Null);
        *value = decrypt_object(security, reference, obj)?;
    }

    Ok(dict)
}

/// A stream naming its own `/Crypt` filter is left to that filter, which can only be
/// `/Identity` here
fn first_filter_is_crypt(dict: &Dictionary) -> bool {
    match dict.get("Filter") {
        Some(Object::Name(name)) => name == "Crypt",
        Some(Object::Array(arr)) => arr.first().and_then(Object::as_name) == Some("Crypt"),
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{test_util::PdfBuilder, xref::XrefParser};

    fn open(bytes: Bytes) -> Store {
        let parsed = XrefParser::new(bytes.clone()).read_xref().unwrap();
        Store::new(
            bytes,
            parsed.xref,
            parsed.trailer.size,
            &RenderConfig::default(),
        )
    }

    fn sample(xref_stream: bool) -> Bytes {
        let builder = PdfBuilder::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [] /Count 0 >>")
            .object(3, "(hello)")
            .object(5, "[1 2 3]")
            .stream(6, "/Extra 42", b"BT ET");

        if xref_stream {
            builder.xref_stream().build().bytes
        } else {
            builder.build().bytes
        }
    }

    #[test]
    fn every_entry_dereferences_consistently() {
        for xref_stream in [false, true] {
            let store = open(sample(xref_stream));

            for number in 0..store.size() {
                let reference = Reference::new(number, 0);
                let first = store.dereference(reference).unwrap();
                let second = store.dereference(reference).unwrap();

                assert_eq!(first, second);

                match store.locate(reference) {
                    Some(..) => assert!(!first.is_null(), "object {} read as null", number),
                    None => assert!(first.is_null()),
                }
            }
        }
    }

    #[test]
    fn dereference_restores_cursor() {
        let store = open(sample(false));
        let before = store.cursor_position();

        store.dereference(Reference::new(6, 0)).unwrap();
        store.dereference(Reference::new(3, 0)).unwrap();
        store.evict(Reference::new(3, 0));
        store.dereference(Reference::new(3, 0)).unwrap();

        assert_eq!(store.cursor_position(), before);
    }

    #[test]
    fn out_of_range_is_malformed_xref() {
        let store = open(sample(false));

        assert!(matches!(
            store.dereference(Reference::new(store.size() + 3, 0)),
            Err(PdfError::MalformedXref { .. })
        ));
    }

    #[test]
    fn free_entries_read_as_null() {
        let store = open(sample(false));
        assert_eq!(store.dereference(Reference::new(4, 0)).unwrap(), Object::Null);
    }

    #[test]
    fn stream_data_is_sliced_by_length() {
        let store = open(sample(false));

        match store.dereference(Reference::new(6, 0)).unwrap() {
            Object::Stream(stream) => {
                assert_eq!(&stream.raw_data()[..], b"BT ET");
                assert_eq!(stream.dict.get("Extra"), Some(&Object::Integer(42)));
            }
            found => panic!("expected stream, found {:?}", found),
        }
    }

    #[test]
    fn indirect_length() {
        let bytes = PdfBuilder::new()
            .object(1, "<< /Type /Catalog >>")
            .object(2, "<< /Length 3 0 R >>\nstream\nabcdef\nendstream")
            .object(3, "6")
            .build()
            .bytes;

        let store = open(bytes);

        match store.dereference(Reference::new(2, 0)).unwrap() {
            Object::Stream(stream) => assert_eq!(&stream.raw_data()[..], b"abcdef"),
            found => panic!("expected stream, found {:?}", found),
        }
    }

    #[test]
    fn wrong_length_reads_as_null() {
        let bytes = PdfBuilder::new()
            .object(1, "<< /Type /Catalog >>")
            .object(2, "<< /Length 2 >>\nstream\nabcdef\nendstream")
            .build()
            .bytes;

        let store = open(bytes);

        assert_eq!(store.dereference(Reference::new(2, 0)).unwrap(), Object::Null);
    }

    #[test]
    fn compressed_objects_share_one_container() {
        let bytes = PdfBuilder::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object_stream(4, &[(2, "<< /Type /Pages /Count 0 >>"), (3, "(inside)")])
            .build()
            .bytes;

        let store = open(bytes);

        assert!(matches!(
            store.locate(Reference::new(3, 0)),
            Some(ByteOffset::ObjectStream {
                container: 4,
                index: 1
            })
        ));

        assert_eq!(
            store.dereference(Reference::new(3, 0)).unwrap(),
            Object::String(PdfString::from("inside"))
        );
        assert!(matches!(
            store.dereference(Reference::new(2, 0)).unwrap(),
            Object::Dictionary(..)
        ));
        assert_eq!(store.lock().containers.len(), 1);
    }
}
