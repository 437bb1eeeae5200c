use std::convert::TryFrom;

use crate::{
    error::{PdfError, PdfResult},
    objects::{Dictionary, Object, ObjectType, PdfString, Reference},
    stream::Stream,
};

/// Chains of references longer than this are treated as cycles
const MAX_REFERENCE_CHAIN: usize = 32;

pub trait Resolve {
    fn lex_object_from_reference(&self, reference: Reference) -> PdfResult<Object>;

    /// Follows references until a direct object is reached
    fn resolve(&self, obj: Object) -> PdfResult<Object> {
        let mut obj = obj;

        for _ in 0..MAX_REFERENCE_CHAIN {
            match obj {
                Object::Reference(r) => obj = self.lex_object_from_reference(r)?,
                obj => return Ok(obj),
            }
        }

        Err(PdfError::malformed("reference chain too long"))
    }

    fn assert_integer(&self, obj: Object) -> PdfResult<i32> {
        match self.resolve(obj)? {
            Object::Integer(i) => Ok(i),
            // some producers write integral values as reals
            Object::Real(r) if r.fract() == 0.0 => Ok(r as i32),
            found => Err(mismatch(ObjectType::Integer, &found)),
        }
    }

    fn assert_unsigned_integer(&self, obj: Object) -> PdfResult<u32> {
        let i = self.assert_integer(obj)?;

        Ok(u32::try_from(i)?)
    }

    /// Either an integer, or a real
    fn assert_number(&self, obj: Object) -> PdfResult<f32> {
        match self.resolve(obj)? {
            Object::Integer(i) => Ok(i as f32),
            Object::Real(r) => Ok(r),
            found => Err(mismatch(ObjectType::Real, &found)),
        }
    }

    fn assert_dict(&self, obj: Object) -> PdfResult<Dictionary> {
        match self.resolve(obj)? {
            Object::Dictionary(d) => Ok(d),
            found => Err(mismatch(ObjectType::Dictionary, &found)),
        }
    }

    fn assert_name(&self, obj: Object) -> PdfResult<String> {
        match self.resolve(obj)? {
            Object::Name(n) => Ok(n),
            found => Err(mismatch(ObjectType::Name, &found)),
        }
    }

    fn assert_string(&self, obj: Object) -> PdfResult<PdfString> {
        match self.resolve(obj)? {
            Object::String(s) => Ok(s),
            found => Err(mismatch(ObjectType::String, &found)),
        }
    }

    fn assert_arr(&self, obj: Object) -> PdfResult<Vec<Object>> {
        match self.resolve(obj)? {
            Object::Array(a) => Ok(a),
            found => Err(mismatch(ObjectType::Array, &found)),
        }
    }

    fn assert_bool(&self, obj: Object) -> PdfResult<bool> {
        match self.resolve(obj)? {
            Object::True => Ok(true),
            Object::False => Ok(false),
            found => Err(mismatch(ObjectType::Boolean, &found)),
        }
    }

    fn assert_stream(&self, obj: Object) -> PdfResult<Stream> {
        match self.resolve(obj)? {
            Object::Stream(s) => Ok(s),
            found => Err(mismatch(ObjectType::Stream, &found)),
        }
    }

    /// Accepts either a stream or a dictionary, returning the dictionary part
    fn assert_dict_or_stream(&self, obj: Object) -> PdfResult<Dictionary> {
        match self.resolve(obj)? {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(s.dict),
            found => Err(PdfError::MismatchedObjectTypeAny {
                expected: &[ObjectType::Dictionary, ObjectType::Stream],
                found: found.object_type(),
            }),
        }
    }

    fn assert_number_arr(&self, obj: Object) -> PdfResult<Vec<f32>> {
        self.assert_arr(obj)?
            .into_iter()
            .map(|obj| self.assert_number(obj))
            .collect()
    }
}

fn mismatch(expected: ObjectType, found: &Object) -> PdfError {
    PdfError::MismatchedObjectType {
        expected,
        found: found.object_type(),
    }
}

/// Conversion from a (possibly indirect) object into a typed value
pub trait FromObj: Sized {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self>;
}

impl FromObj for f32 {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        resolver.assert_number(obj)
    }
}

impl FromObj for i32 {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        resolver.assert_integer(obj)
    }
}

impl FromObj for String {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        resolver.assert_name(obj)
    }
}

impl FromObj for Dictionary {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        resolver.assert_dict(obj)
    }
}

impl FromObj for Object {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        resolver.resolve(obj)
    }
}

/// Used while the cross-reference table is still being built, when no indirect object can be
/// located yet
pub(crate) struct NoResolve;

impl Resolve for NoResolve {
    fn lex_object_from_reference(&self, reference: Reference) -> PdfResult<Object> {
        Err(PdfError::malformed_xref(format!(
            "indirect reference {} cannot be resolved here",
            reference
        )))
    }
}
