use bytes::{Bytes, BytesMut};

use crate::{
    error::{PdfError, PdfResult},
    objects::{Object, ObjectType},
    resolve::Resolve,
};

/// Decodes a page's `/Contents`, which is either one stream or an array of streams to be read
/// as if concatenated. Pieces are joined by a newline so tokens never run together
pub(crate) fn content_bytes(obj: Object, resolver: &dyn Resolve) -> PdfResult<Bytes> {
    match resolver.resolve(obj)? {
        Object::Stream(stream) => stream.decode(resolver),
        Object::Array(arr) => {
            let mut combined = BytesMut::new();

            for obj in arr {
                let decoded = match resolver.resolve(obj)? {
                    Object::Stream(stream) => stream.decode(resolver),
                    Object::Null => continue,
                    found => Err(PdfError::MismatchedObjectType {
                        expected: ObjectType::Stream,
                        found: found.object_type(),
                    }),
                };

                match decoded {
                    Ok(bytes) => {
                        combined.extend_from_slice(&bytes);
                        combined.extend_from_slice(b"\n");
                    }
                    Err(e) => log::warn!("skipping unreadable content stream: {}", e),
                }
            }

            Ok(combined.freeze())
        }
        // a page without contents is blank
        Object::Null => Ok(Bytes::new()),
        found => Err(PdfError::MismatchedObjectTypeAny {
            expected: &[ObjectType::Array, ObjectType::Stream],
            found: found.object_type(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::Reference, test_util::PdfBuilder};

    #[test]
    fn arrays_are_joined() {
        let pdf = PdfBuilder::new()
            .object(1, "<< /Type /Catalog >>")
            .stream(2, "", b"q 1 0 0")
            .stream(3, "", b"1 0 0 cm Q")
            .object(4, "[2 0 R 3 0 R]")
            .build();

        let store = pdf.store();
        let bytes = content_bytes(Object::Reference(Reference::new(4, 0)), &store).unwrap();

        assert_eq!(bytes.as_ref(), b"q 1 0 0\n1 0 0 cm Q\n");
    }
}
