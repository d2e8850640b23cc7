//! The PDF value model: [`Value`], [`Name`], [`StringVal`], [`Reference`].

use std::cell::OnceCell;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::buf::BufExt;
use crate::container::{Array, Dictionary};
use crate::device::OutputDevice;
use crate::error::{PdfError, PdfResult};

/// A Unicode scalar value, as used throughout the encoding subsystem.
pub type CodePoint = char;

/// An ordered pair identifying an indirect object.
///
/// `(0, 65535)` is reserved as the free-list head. A generation of `65535`
/// or above is never reusable.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Reference {
    /// The object number. `0` means "no object" / direct value.
    pub object_number: u32,
    /// The generation number.
    pub generation: u16,
}

impl Reference {
    /// The reserved free-list head, `(0, 65535)`.
    pub const FREE_LIST_HEAD: Reference = Reference { object_number: 0, generation: 65535 };

    /// A generation at or above this value is never reusable.
    pub const MAX_REUSABLE_GENERATION: u16 = 65535;

    /// Create a new reference.
    pub fn new(object_number: u32, generation: u16) -> Self {
        Self { object_number, generation }
    }

    /// Whether this is the `(0, 0)` direct-value sentinel (not a real
    /// indirect reference).
    pub fn is_direct(&self) -> bool {
        self.object_number == 0 && self.generation == 0
    }

    /// Whether the generation has reached the point where the slot can
    /// never be reused.
    pub fn is_generation_exhausted(&self) -> bool {
        self.generation >= Self::MAX_REUSABLE_GENERATION
    }

    pub(crate) fn write(&self, buf: &mut Vec<u8>) {
        buf.push_int(self.object_number as i64);
        buf.push(b' ');
        buf.push_int(self.generation as i64);
        buf.push_bytes(b" R");
    }
}

/// An interned PDF name.
///
/// Carries the raw on-disk bytes (PdfDocEncoded) plus a lazily computed
/// UTF-8 view. Equality and hashing are on the raw byte form only, matching
/// the on-disk identity of a name.
#[derive(Clone)]
pub struct Name(Rc<NameInner>);

struct NameInner {
    raw: Box<[u8]>,
    utf8: OnceCell<String>,
}

impl Name {
    /// Create a name from raw (PdfDocEncoded) bytes.
    pub fn from_bytes(raw: impl Into<Box<[u8]>>) -> Self {
        Self(Rc::new(NameInner { raw: raw.into(), utf8: OnceCell::new() }))
    }

    /// Create a name from an ASCII/UTF-8 literal, for the common case where
    /// the name has no non-ASCII bytes.
    pub fn from_str(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// The raw on-disk bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0.raw
    }

    /// The lazily expanded UTF-8 view. Bytes that are not valid UTF-8 are
    /// replaced with the Unicode replacement character, matching how most
    /// PDF names (which are 7-bit ASCII in practice) are displayed.
    pub fn as_utf8(&self) -> &str {
        self.0.utf8.get_or_init(|| String::from_utf8_lossy(&self.0.raw).into_owned())
    }

    /// Serialize with `#XX` escaping of every non-regular byte, per PDF
    /// lexical rules (escape anything outside the printable range, and `#`
    /// itself).
    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.push(b'/');
        for &byte in self.0.raw.iter() {
            if matches!(byte, b'!'..=b'~') && byte != b'#' {
                buf.push(byte);
            } else {
                buf.push(b'#');
                buf.push_hex(byte);
            }
        }
    }

    /// Parse the interior of a name (after the leading `/` and lexer split)
    /// by reversing `#XX` escapes.
    pub fn unescape(lexed: &[u8]) -> PdfResult<Self> {
        let mut raw = Vec::with_capacity(lexed.len());
        let mut i = 0;
        while i < lexed.len() {
            if lexed[i] == b'#' && i + 2 < lexed.len() {
                let hi = hex_digit(lexed[i + 1]);
                let lo = hex_digit(lexed[i + 2]);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    raw.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            raw.push(lexed[i]);
            i += 1;
        }
        let table = crate::predefined_tables::pdf_doc_table();
        for (position, &byte) in raw.iter().enumerate() {
            if table[byte as usize].is_none() {
                log::warn!("name has byte {byte:#04x} at position {position} with no PdfDocEncoding mapping");
            }
        }
        Ok(Self::from_bytes(raw))
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.as_utf8())
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.raw == other.0.raw
    }
}
impl Eq for Name {}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.raw.hash(state);
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Whether the output should use the hex `<...>` or literal `(...)` string
/// presentation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StringPresentation {
    /// Parenthesis-escaped literal form.
    Literal,
    /// Hexadecimal `<...>` form.
    Hex,
}

/// The decoded internal representation of a [`StringVal`].
#[derive(Debug, Clone)]
enum StringRepr {
    /// Bytes as parsed, interpretation unknown (possibly with a leading
    /// UTF-16 BOM that was never unwrapped).
    Raw(Vec<u8>),
    /// Decoded as PdfDocEncoding text.
    PdfDoc(String),
    /// Decoded as Unicode text (UTF-16BE with BOM on the wire).
    Unicode(String),
}

/// A PDF string value: content plus a presentation flag controlling whether
/// it serializes as a literal or as hex.
#[derive(Debug, Clone)]
pub struct StringVal {
    repr: StringRepr,
    presentation: StringPresentation,
}

impl StringVal {
    /// Wrap raw bytes with no assumed text encoding.
    pub fn from_raw(bytes: Vec<u8>, presentation: StringPresentation) -> Self {
        Self { repr: StringRepr::Raw(bytes), presentation }
    }

    /// Wrap already-decoded Unicode text; serializes as a `(FE FF ...)`
    /// UTF-16BE literal (or hex) string.
    pub fn from_unicode(text: String, presentation: StringPresentation) -> Self {
        Self { repr: StringRepr::Unicode(text), presentation }
    }

    /// Wrap already-decoded PdfDocEncoding text.
    pub fn from_pdf_doc(text: String, presentation: StringPresentation) -> Self {
        Self { repr: StringRepr::PdfDoc(text), presentation }
    }

    /// Decode to a Rust `String`, interpreting raw bytes as PdfDocEncoding
    /// (stripping a UTF-16 BOM and reinterpreting as Unicode when present).
    pub fn as_text(&self) -> String {
        match &self.repr {
            StringRepr::Unicode(s) | StringRepr::PdfDoc(s) => s.clone(),
            StringRepr::Raw(bytes) => decode_raw_string(bytes),
        }
    }

    /// The string's raw bytes, as they would be parsed from an unescaped
    /// literal/hex string (not the serialized form).
    pub fn as_bytes(&self) -> Vec<u8> {
        match &self.repr {
            StringRepr::Raw(b) => b.clone(),
            StringRepr::PdfDoc(s) => crate::predefined_tables::encode_pdf_doc(s),
            StringRepr::Unicode(s) => {
                let mut out = vec![0xFE, 0xFF];
                for unit in s.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                out
            }
        }
    }

    /// Serialize per the presentation flag, escaping literals and padding
    /// odd-length hex strings with a trailing `0`.
    pub fn write(&self, buf: &mut Vec<u8>) {
        let bytes = self.as_bytes();
        match self.presentation {
            StringPresentation::Hex => {
                buf.push(b'<');
                for b in &bytes {
                    buf.push_hex(*b);
                }
                buf.push(b'>');
            }
            StringPresentation::Literal => {
                buf.push(b'(');
                let mut depth = 0i32;
                for &b in &bytes {
                    match b {
                        b'(' => {
                            depth += 1;
                            buf.push(b);
                        }
                        b')' => {
                            if depth > 0 {
                                depth -= 1;
                                buf.push(b);
                            } else {
                                buf.push(b'\\');
                                buf.push(b);
                            }
                        }
                        b'\\' => buf.push_bytes(b"\\\\"),
                        b'\n' => buf.push_bytes(b"\\n"),
                        b'\r' => buf.push_bytes(b"\\r"),
                        b'\t' => buf.push_bytes(b"\\t"),
                        _ => buf.push(b),
                    }
                }
                buf.push(b')');
            }
        }
    }
}

/// Comparison requires both operands be in a decoded textual state; two raw
/// byte strings compare by byte equality instead.
impl PartialEq for StringVal {
    fn eq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (StringRepr::Raw(a), StringRepr::Raw(b)) => a == b,
            _ => self.as_text() == other.as_text(),
        }
    }
}

fn decode_raw_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    crate::predefined_tables::decode_pdf_doc(bytes)
}

/// The tag of a [`Value`], used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Integer(_) => "integer",
        Value::Real(_) => "real",
        Value::Name(_) => "name",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Dictionary(_) => "dictionary",
        Value::Reference(_) => "reference",
        Value::RawData(_) => "raw data",
    }
}

/// A PDF value: the tagged union every object, array slot, and dictionary
/// value is built from.
///
/// `Real` is strictly floating point; use [`Value::as_f64_lenient`] for
/// accessors that accept either `Integer` or `Real`.
#[derive(Debug, Clone)]
pub enum Value {
    /// The `null` object.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A strictly-floating-point real number.
    Real(f64),
    /// An interned name.
    Name(Name),
    /// A string.
    String(StringVal),
    /// An array of values.
    Array(Array),
    /// A dictionary.
    Dictionary(Dictionary),
    /// An indirect reference.
    Reference(Reference),
    /// Raw bytes that pass through unparsed (e.g. content stream operands
    /// the core does not interpret).
    RawData(Vec<u8>),
}

impl Value {
    /// The discriminant name, for error messages.
    pub fn data_type(&self) -> &'static str {
        type_name(self)
    }

    /// Fallible equality-preserving accessor, fails with `InvalidDataType`.
    pub fn as_bool(&self) -> PdfResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_type("bool", other)),
        }
    }

    /// Typed integer accessor.
    pub fn as_i64(&self) -> PdfResult<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            other => Err(wrong_type("integer", other)),
        }
    }

    /// Typed real accessor (does not accept `Integer`; see
    /// [`Self::as_f64_lenient`] for that).
    pub fn as_f64(&self) -> PdfResult<f64> {
        match self {
            Value::Real(r) => Ok(*r),
            other => Err(wrong_type("real", other)),
        }
    }

    /// Lenient numeric accessor: accepts either `Integer` or `Real`.
    pub fn as_f64_lenient(&self) -> PdfResult<f64> {
        match self {
            Value::Integer(i) => Ok(*i as f64),
            Value::Real(r) => Ok(*r),
            other => Err(wrong_type("number", other)),
        }
    }

    /// Typed name accessor.
    pub fn as_name(&self) -> PdfResult<&Name> {
        match self {
            Value::Name(n) => Ok(n),
            other => Err(wrong_type("name", other)),
        }
    }

    /// Typed string accessor.
    pub fn as_str(&self) -> PdfResult<&StringVal> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(wrong_type("string", other)),
        }
    }

    /// Typed reference accessor.
    pub fn as_reference(&self) -> PdfResult<Reference> {
        match self {
            Value::Reference(r) => Ok(*r),
            other => Err(wrong_type("reference", other)),
        }
    }

    /// Typed array accessor.
    pub fn as_array(&self) -> PdfResult<&Array> {
        match self {
            Value::Array(a) => Ok(a),
            other => Err(wrong_type("array", other)),
        }
    }

    /// Typed mutable array accessor.
    pub fn as_array_mut(&mut self) -> PdfResult<&mut Array> {
        let found = type_name(self);
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(PdfError::InvalidDataType { expected: "array", found }),
        }
    }

    /// Typed dictionary accessor.
    pub fn as_dict(&self) -> PdfResult<&Dictionary> {
        match self {
            Value::Dictionary(d) => Ok(d),
            other => Err(wrong_type("dictionary", other)),
        }
    }

    /// Typed mutable dictionary accessor.
    pub fn as_dict_mut(&mut self) -> PdfResult<&mut Dictionary> {
        let found = type_name(self);
        match self {
            Value::Dictionary(d) => Ok(d),
            _ => Err(PdfError::InvalidDataType { expected: "dictionary", found }),
        }
    }

    /// Non-failing variant of [`Self::as_bool`].
    pub fn try_as_bool(&self) -> Option<bool> {
        self.as_bool().ok()
    }

    /// Write the textual serialization of this value to an [`OutputDevice`].
    pub fn write(&self, device: &mut dyn OutputDevice) -> PdfResult<()> {
        let mut buf = Vec::new();
        self.write_to_buf(&mut buf);
        device.write(&buf)
    }

    pub(crate) fn write_to_buf(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Null => buf.push_bytes(b"null"),
            Value::Bool(true) => buf.push_bytes(b"true"),
            Value::Bool(false) => buf.push_bytes(b"false"),
            Value::Integer(i) => buf.push_int(*i),
            Value::Real(r) => write_real(buf, *r),
            Value::Name(n) => n.write(buf),
            Value::String(s) => s.write(buf),
            Value::Array(a) => a.write_to_buf(buf),
            Value::Dictionary(d) => d.write_to_buf(buf),
            Value::Reference(r) => r.write(buf),
            Value::RawData(bytes) => buf.push_bytes(bytes),
        }
    }
}

/// Real numbers serialize with a locale-independent decimal representation
/// via `ryu`, trimmed of a redundant trailing `.0` the way PDF writers
/// conventionally emit numbers (`ryu` always prints at least one fraction
/// digit; PDF consumers accept integral reals without it but we keep the
/// single digit for round-trip simplicity).
fn write_real(buf: &mut Vec<u8>, value: f64) {
    if !value.is_finite() {
        buf.push(b'0');
        return;
    }
    let mut tmp = ryu::Buffer::new();
    let formatted = tmp.format(value);
    buf.push_bytes(formatted.as_bytes());
}

fn wrong_type(expected: &'static str, found: &Value) -> PdfError {
    PdfError::InvalidDataType { expected, found: type_name(found) }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = Vec::new();
        self.write_to_buf(&mut buf);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_escape_round_trip() {
        let name = Name::from_bytes(*b"Hello#World");
        let mut buf = Vec::new();
        name.write(&mut buf);
        assert_eq!(buf, b"/Hello#23World");

        let parsed = Name::unescape(b"Hello#23World").unwrap();
        assert_eq!(parsed.as_bytes(), b"Hello#World");
    }

    #[test]
    fn name_with_unmapped_byte_is_kept_not_rejected() {
        // 0x81 has no PdfDocEncoding mapping; unescape still succeeds and
        // keeps the raw byte rather than failing with `InvalidName`.
        let name = Name::unescape(b"Weird#81Name").unwrap();
        assert_eq!(name.as_bytes(), b"Weird\x81Name");
    }

    #[test]
    fn hex_string_odd_length_padding() {
        // <48656C6C6> (odd length) pads with a trailing 0 -> bytes
        // 48 65 6C 6C 60, i.e. "Hell" followed by a backtick, not "Hello".
        let raw = parse_hex_literal(b"48656C6C6");
        assert_eq!(raw, b"Hell\x60");
    }

    fn parse_hex_literal(hex: &[u8]) -> Vec<u8> {
        let mut digits: Vec<u8> = hex.iter().filter_map(|&b| hex_digit(b)).collect();
        if digits.len() % 2 == 1 {
            digits.push(0);
        }
        digits.chunks_exact(2).map(|c| (c[0] << 4) | c[1]).collect()
    }

    #[test]
    fn literal_string_escapes() {
        let s = StringVal::from_raw(
            b"Line1\nLine2\\(end)".to_vec(),
            StringPresentation::Literal,
        );
        assert_eq!(s.as_bytes().len(), 18);
    }

    #[test]
    fn string_write_round_trip() {
        let s = StringVal::from_unicode("héllo".to_string(), StringPresentation::Literal);
        let mut buf = Vec::new();
        s.write(&mut buf);
        assert!(buf.starts_with(b"("));
    }
}
