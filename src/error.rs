use std::{fmt, io, num::TryFromIntError};

use crate::objects::ObjectType;

pub type PdfResult<T> = Result<T, PdfError>;

/// Why an `/Encrypt` dictionary could not be honoured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedEncryption {
    /// The platform lacks a primitive the handler needs
    NotSupportedOnPlatform(String),

    /// This build does not implement the handler, revision or crypt filter
    NotSupportedByBuild(String),
}

impl fmt::Display for UnsupportedEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupportedOnPlatform(what) => write!(f, "not supported on this platform: {}", what),
            Self::NotSupportedByBuild(what) => write!(f, "not supported by this build: {}", what),
        }
    }
}

#[derive(Debug)]
pub enum PdfError {
    /// Bad trailer, missing `/Root`, bad cross-reference row
    MalformedDocument {
        reason: String,
    },
    MalformedXref {
        reason: String,
    },
    MalformedStream {
        pos: usize,
        reason: String,
    },
    MismatchedByte {
        expected: u8,
        found: Option<u8>,
        pos: usize,
    },
    MismatchedByteMany {
        expected: &'static [u8],
        found: Option<u8>,
        pos: usize,
    },
    UnexpectedEof {
        pos: usize,
    },
    InvalidDictionaryKey {
        found: ObjectType,
        pos: usize,
    },
    UnexpectedToken {
        found: String,
        pos: usize,
    },
    /// An `N G obj` header appeared where a plain value was expected
    UnexpectedObjectDefinition {
        pos: usize,
    },
    MismatchedObjectType {
        expected: ObjectType,
        found: ObjectType,
    },
    MismatchedObjectTypeAny {
        expected: &'static [ObjectType],
        found: ObjectType,
    },
    MissingRequiredKey {
        key: &'static str,
    },
    ArrayOfInvalidLength {
        expected: usize,
        found: usize,
    },
    UnrecognizedVariant {
        ty: &'static str,
        found: String,
    },
    UnknownOperator {
        operator: String,
    },
    StackUnderflow,
    /// A content stream names a resource its resource dictionary lacks
    MissingResource {
        category: &'static str,
        name: String,
    },
    /// A page number outside `1..=page_count`
    PageOutOfRange {
        page: usize,
        page_count: usize,
    },
    InvalidFilter {
        filter: String,
    },
    /// A drawing command whose transform collapses user space
    NonInvertibleTransform,
    /// More restores than saves in a command list
    UnbalancedRestore,
    AuthenticationRequired,
    AuthenticationFailed,
    UnsupportedEncryption(UnsupportedEncryption),
    IntegerConversion,
    Font(anyhow::Error),
    Io(io::Error),
}

impl PdfError {
    /// Structural token mismatches; fatal to the object being parsed but never to the document
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MismatchedByte { .. }
                | Self::MismatchedByteMany { .. }
                | Self::UnexpectedEof { .. }
                | Self::InvalidDictionaryKey { .. }
                | Self::UnexpectedToken { .. }
                | Self::UnexpectedObjectDefinition { .. }
                | Self::MismatchedObjectType { .. }
                | Self::MismatchedObjectTypeAny { .. }
                | Self::MalformedStream { .. }
        )
    }

    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::AuthenticationRequired | Self::AuthenticationFailed)
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_xref(reason: impl Into<String>) -> Self {
        Self::MalformedXref {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDocument { reason } => write!(f, "malformed document: {}", reason),
            Self::MalformedXref { reason } => write!(f, "malformed cross-reference: {}", reason),
            Self::MalformedStream { pos, reason } => {
                write!(f, "malformed stream at byte {}: {}", pos, reason)
            }
            Self::MismatchedByte {
                expected,
                found,
                pos,
            } => write!(
                f,
                "expected {:?} at byte {}, found {:?}",
                *expected as char,
                pos,
                found.map(char::from)
            ),
            Self::MismatchedByteMany {
                expected,
                found,
                pos,
            } => write!(
                f,
                "expected one of {:?} at byte {}, found {:?}",
                String::from_utf8_lossy(expected),
                pos,
                found.map(char::from)
            ),
            Self::UnexpectedEof { pos } => write!(f, "unexpected end of input at byte {}", pos),
            Self::InvalidDictionaryKey { found, pos } => {
                write!(f, "dictionary key at byte {} is {:?}, not a name", pos, found)
            }
            Self::UnexpectedToken { found, pos } => {
                write!(f, "unexpected token {:?} at byte {}", found, pos)
            }
            Self::UnexpectedObjectDefinition { pos } => {
                write!(f, "unexpected object definition at byte {}", pos)
            }
            Self::MismatchedObjectType { expected, found } => {
                write!(f, "expected {:?}, found {:?}", expected, found)
            }
            Self::MismatchedObjectTypeAny { expected, found } => {
                write!(f, "expected one of {:?}, found {:?}", expected, found)
            }
            Self::MissingRequiredKey { key } => write!(f, "missing required key /{}", key),
            Self::ArrayOfInvalidLength { expected, found } => {
                write!(f, "expected array of length {}, found {}", expected, found)
            }
            Self::UnrecognizedVariant { ty, found } => {
                write!(f, "unrecognized variant {:?} for {}", found, ty)
            }
            Self::UnknownOperator { operator } => write!(f, "unknown operator {:?}", operator),
            Self::StackUnderflow => f.write_str("operand stack underflow"),
            Self::MissingResource { category, name } => {
                write!(f, "no /{} resource named /{}", category, name)
            }
            Self::PageOutOfRange { page, page_count } => {
                write!(f, "page {} is out of range, the document has {}", page, page_count)
            }
            Self::InvalidFilter { filter } => write!(f, "unsupported filter /{}", filter),
            Self::NonInvertibleTransform => f.write_str("transform is not invertible"),
            Self::UnbalancedRestore => f.write_str("restore without a matching save"),
            Self::AuthenticationRequired => f.write_str("a password is required"),
            Self::AuthenticationFailed => f.write_str("the supplied password is incorrect"),
            Self::UnsupportedEncryption(inner) => write!(f, "unsupported encryption, {}", inner),
            Self::IntegerConversion => f.write_str("integer out of range"),
            Self::Font(err) => write!(f, "font error: {}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for PdfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PdfError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TryFromIntError> for PdfError {
    fn from(_: TryFromIntError) -> Self {
        Self::IntegerConversion
    }
}

impl From<anyhow::Error> for PdfError {
    fn from(err: anyhow::Error) -> Self {
        Self::Font(err)
    }
}
