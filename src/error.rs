//! Crate-wide error type.

use crate::value::Reference;

/// The result type used throughout this crate.
pub type PdfResult<T> = Result<T, PdfError>;

/// Everything that can go wrong while parsing, mutating or writing a PDF
/// object graph.
#[derive(thiserror::Error, Debug)]
pub enum PdfError {
    /// A typed accessor was called on a value of the wrong variant, or the
    /// parser found a token shape that didn't match what it expected.
    #[error("invalid data type: expected {expected}, found {found}")]
    InvalidDataType {
        /// The variant name that was expected.
        expected: &'static str,
        /// The variant name that was actually found.
        found: &'static str,
    },

    /// A null or unset owner was used where one is required.
    #[error("invalid handle")]
    InvalidHandle,

    /// A name contained a byte that cannot appear in PdfDocEncoding.
    #[error("invalid name: byte {byte:#04x} at position {position}")]
    InvalidName {
        /// The offending byte.
        byte: u8,
        /// Its position within the name.
        position: usize,
    },

    /// A reference did not resolve to any object in the store.
    #[error("no object for reference {0:?}")]
    NoObject(Reference),

    /// The document has no cross-reference section at all.
    #[error("no xref")]
    NoXRef,

    /// The cross-reference stream's encoding is malformed.
    #[error("invalid xref stream: {reason}")]
    InvalidXRefStream {
        /// What about the stream was invalid.
        reason: &'static str,
    },

    /// A cross-reference entry named an unknown type byte.
    #[error("invalid xref entry type {0}")]
    InvalidXRefType(u8),

    /// The tokenizer hit end-of-input in the middle of a construct.
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// An integer or real token was expected but the lexed text is not
    /// numeric.
    #[error("not a number: {0:?}")]
    NoNumber(String),

    /// CMap or content-stream syntax is broken.
    #[error("invalid stream syntax: {0}")]
    InvalidStream(String),

    /// A ToUnicode lookup could not map a code point required by a font
    /// program.
    #[error("invalid font file: {0}")]
    InvalidFontFile(String),

    /// A value fell outside its legal range (object-count overflow,
    /// negative `/W` entry, generation reaching 65535, ...).
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),

    /// A mutation was attempted on an object marked immutable.
    #[error("change attempted on immutable object {0:?}")]
    ChangeOnImmutable(Reference),

    /// An internal invariant was broken.
    #[error("internal logic error: {0}")]
    InternalLogic(&'static str),

    /// The requested operation is deliberately unsupported (e.g. exporting
    /// a dummy encoding).
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A buffer failed to grow.
    #[error("out of memory")]
    OutOfMemory,

    /// Propagated I/O failure from an `InputDevice`/`OutputDevice`.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
