use crate::codes::Handle;
use crate::content::ContentId;
use thiserror::Error;

/// Result type for all stream-decoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while decoding a serialization stream
///
/// Validity errors carry the offending datum. `ExceptionInStream` is a
/// control signal rather than a failure: it unwinds a nested read when the
/// writer recorded a thrown exception, and is consumed by the top-level read
/// loop, which replaces the enclosing partial item with an
/// [`crate::content::ExceptionState`]. It never escapes a parse.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error reading the stream")]
    Io(#[from] std::io::Error),
    #[error("not a serialization stream (magic 0x{0:04X})")]
    BadMagic(u16),
    #[error("unsupported stream version {0}")]
    BadVersion(u16),
    #[error("unknown type code 0x{0:02X}")]
    UnknownTypeCode(u8),
    #[error("type code 0x{0:02X} is not valid while reading {1}")]
    UnexpectedTypeCode(u8, &'static str),
    #[error("unknown field type code '{0}'")]
    UnknownFieldType(char),
    #[error("malformed type descriptor '{0}'")]
    BadDescriptor(String),
    #[error("negative {1} ({0})")]
    NegativeCount(i64, &'static str),
    #[error("long-string length {0} out of range")]
    StringLength(i64),
    #[error("malformed modified UTF-8: {0}")]
    BadUtf(&'static str),
    #[error("handle 0x{0:X} is already bound")]
    HandleCollision(Handle),
    #[error("back-reference to unbound handle 0x{0:X}")]
    DanglingHandle(Handle),
    #[error("expected {expected} but found {found}")]
    WrongVariant {
        expected: &'static str,
        found: &'static str,
    },
    #[error("null class descriptor for {0}")]
    NullClassDesc(&'static str),
    #[error("class descriptor flags 0x{0:02X}: {1}")]
    BadFlags(u8, &'static str),
    #[error("externalizable class '{0}' carries protocol-1 data")]
    ExternalContents(String),
    #[error("class '{0}' has an outer-class reference but is not a member-class name")]
    BadMemberName(String),
    #[error("member class '{0}' has no outer class in the stream")]
    MissingOuter(String),
    #[error("outer-reference field of '{0}' does not name its outer class")]
    OuterMismatch(String),
    #[error("renaming '{0}' to '{1}' collides with an existing class")]
    RenameCollision(String, String),
    #[error("invalid class filter: {0}")]
    BadFilter(String),
    #[error("serialized exception unwound past the top of the stream")]
    ExceptionInStream { instance: ContentId, data: Vec<u8> },
}
