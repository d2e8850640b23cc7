//! [`Tokenizer`]: the shared lexer for both PDF object syntax and the
//! PostScript-style CMap sub-language.
//!
//! Grounded on `PdfTokenizer.h`'s `PdfTokenType` enum and its
//! `TryReadNextToken`/`ReadNextVariant`/`IsWhitespace`/`IsDelimiter`/
//! `GetHexValue` public surface, reimplemented against [`InputDevice`]
//! rather than a C++ stream.

use std::collections::VecDeque;

use crate::container::{Array, Dictionary};
use crate::device::InputDevice;
use crate::error::{PdfError, PdfResult};
use crate::object::Object;
use crate::value::{Name, Reference, StringPresentation, StringVal, Value};

/// The lexical class of a token.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TokenType {
    /// A run of regular characters (number, keyword, bare operator).
    Literal,
    /// A single delimiter byte with no more specific class below.
    Delimiter,
    /// `(`
    ParenL,
    /// `)`
    ParenR,
    /// `{`
    BraceL,
    /// `}`
    BraceR,
    /// `<` (single)
    AngleL,
    /// `>` (single)
    AngleR,
    /// `<<`
    DoubleAngleL,
    /// `>>`
    DoubleAngleR,
    /// `[`
    SquareL,
    /// `]`
    SquareR,
    /// `/`
    Slash,
    /// A literal run recognized as a CMap sub-language operator.
    Keyword,
}

/// How [`Tokenizer::determine_literal_type`] classifies a lexed literal run.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LiteralType {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool,
    /// An integer.
    Number,
    /// A real (contains `.` or an exponent).
    Real,
    /// `n g R`.
    Reference,
    /// A literal string.
    String,
    /// A hex string.
    HexString,
    /// A name.
    Name,
    /// An array.
    Array,
    /// A dictionary.
    Dictionary,
    /// Anything else (content-stream operator, CMap keyword, ...).
    Unknown,
}

const CMAP_KEYWORDS: &[&str] = &[
    "begincodespacerange",
    "endcodespacerange",
    "beginbfchar",
    "endbfchar",
    "beginbfrange",
    "endbfrange",
    "begincidrange",
    "endcidrange",
    "begincidchar",
    "endcidchar",
    "begincmap",
    "endcmap",
    "usecmap",
    "findresource",
    "defineresource",
    "currentdict",
    "def",
    "dict",
    "dup",
    "pop",
    "begin",
    "end",
];

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Lexes an [`InputDevice`] into `(token_bytes, TokenType)` pairs and
/// assembles them into [`Value`]s. A bounded look-ahead queue lets the
/// parser push tokens back, used for `n g R` reference disambiguation.
pub struct Tokenizer<'d> {
    device: &'d mut dyn InputDevice,
    queue: VecDeque<(Vec<u8>, TokenType)>,
}

impl<'d> Tokenizer<'d> {
    /// Wrap a device for lexing.
    pub fn new(device: &'d mut dyn InputDevice) -> Self {
        Self { device, queue: VecDeque::new() }
    }

    /// Push a previously read token back onto the front of the queue.
    pub fn push_back(&mut self, token: (Vec<u8>, TokenType)) {
        self.queue.push_front(token);
    }

    fn peek_byte(&mut self) -> PdfResult<Option<u8>> {
        let mut b = [0u8; 1];
        Ok(if self.device.peek(&mut b)? == 0 { None } else { Some(b[0]) })
    }

    fn read_byte(&mut self) -> PdfResult<Option<u8>> {
        let mut b = [0u8; 1];
        Ok(if self.device.read(&mut b)? == 0 { None } else { Some(b[0]) })
    }

    fn skip_whitespace_and_comments(&mut self) -> PdfResult<()> {
        loop {
            match self.peek_byte()? {
                Some(b) if is_whitespace(b) => {
                    self.read_byte()?;
                }
                Some(b'%') => {
                    while let Some(b) = self.read_byte()? {
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn read_regular_run(&mut self) -> PdfResult<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(b) = self.peek_byte()? {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            out.push(b);
            self.read_byte()?;
        }
        Ok(out)
    }

    /// Read the next token, honoring pushed-back tokens first.
    pub fn next_token(&mut self) -> PdfResult<Option<(Vec<u8>, TokenType)>> {
        if let Some(t) = self.queue.pop_front() {
            return Ok(Some(t));
        }
        self.skip_whitespace_and_comments()?;
        let Some(b) = self.peek_byte()? else { return Ok(None) };
        let token = match b {
            b'(' => {
                self.read_byte()?;
                (vec![b'('], TokenType::ParenL)
            }
            b')' => {
                self.read_byte()?;
                (vec![b')'], TokenType::ParenR)
            }
            b'[' => {
                self.read_byte()?;
                (vec![b'['], TokenType::SquareL)
            }
            b']' => {
                self.read_byte()?;
                (vec![b']'], TokenType::SquareR)
            }
            b'{' => {
                self.read_byte()?;
                (vec![b'{'], TokenType::BraceL)
            }
            b'}' => {
                self.read_byte()?;
                (vec![b'}'], TokenType::BraceR)
            }
            b'/' => {
                self.read_byte()?;
                let name = self.read_regular_run()?;
                (name, TokenType::Slash)
            }
            b'<' => {
                self.read_byte()?;
                if self.peek_byte()? == Some(b'<') {
                    self.read_byte()?;
                    (vec![b'<', b'<'], TokenType::DoubleAngleL)
                } else {
                    (vec![b'<'], TokenType::AngleL)
                }
            }
            b'>' => {
                self.read_byte()?;
                if self.peek_byte()? == Some(b'>') {
                    self.read_byte()?;
                    (vec![b'>', b'>'], TokenType::DoubleAngleR)
                } else {
                    (vec![b'>'], TokenType::AngleR)
                }
            }
            _ => {
                let run = self.read_regular_run()?;
                let kind = if CMAP_KEYWORDS.iter().any(|kw| kw.as_bytes() == run.as_slice()) {
                    TokenType::Keyword
                } else {
                    TokenType::Literal
                };
                (run, kind)
            }
        };
        Ok(Some(token))
    }

    /// Classify a lexed literal run (not structural delimiters, which are
    /// already unambiguous from their `TokenType`).
    pub fn determine_literal_type(text: &[u8]) -> LiteralType {
        if text == b"null" {
            return LiteralType::Null;
        }
        if text == b"true" || text == b"false" {
            return LiteralType::Bool;
        }
        let Ok(s) = std::str::from_utf8(text) else { return LiteralType::Unknown };
        if s.parse::<i64>().is_ok() {
            return LiteralType::Number;
        }
        if s.parse::<f64>().is_ok() {
            return LiteralType::Real;
        }
        LiteralType::Unknown
    }

    /// Parse the next complete value, resolving the `n g R` reference
    /// ambiguity by a three-token lookahead.
    pub fn read_next_variant(&mut self) -> PdfResult<Value> {
        let Some((text, kind)) = self.next_token()? else { return Err(PdfError::UnexpectedEof) };
        match kind {
            TokenType::ParenL => Ok(Value::String(self.read_string()?)),
            TokenType::AngleL => Ok(Value::String(self.read_hex_string()?)),
            TokenType::DoubleAngleL => Ok(Value::Dictionary(self.read_dictionary()?)),
            TokenType::SquareL => Ok(Value::Array(self.read_array()?)),
            TokenType::Slash => Ok(Value::Name(self.read_name(&text)?)),
            TokenType::Literal | TokenType::Keyword => match Self::determine_literal_type(&text) {
                LiteralType::Null => Ok(Value::Null),
                LiteralType::Bool => Ok(Value::Bool(text == b"true")),
                LiteralType::Number => self.read_number_or_reference(&text),
                LiteralType::Real => {
                    let s = std::str::from_utf8(&text).map_err(|_| PdfError::NoNumber(lossy(&text)))?;
                    let value: f64 = s.parse().map_err(|_| PdfError::NoNumber(s.to_string()))?;
                    Ok(Value::Real(value))
                }
                _ => Ok(Value::RawData(text)),
            },
            _ => Err(PdfError::InvalidStream(format!("unexpected token {:?}", kind))),
        }
    }

    fn read_number_or_reference(&mut self, first: &[u8]) -> PdfResult<Value> {
        let object_number: i64 =
            std::str::from_utf8(first).ok().and_then(|s| s.parse().ok()).ok_or_else(|| PdfError::NoNumber(lossy(first)))?;
        let Some((second_text, second_kind)) = self.next_token()? else {
            return Ok(Value::Integer(object_number));
        };
        if second_kind != TokenType::Literal || Self::determine_literal_type(&second_text) != LiteralType::Number {
            self.push_back((second_text, second_kind));
            return Ok(Value::Integer(object_number));
        }
        let Some((third_text, third_kind)) = self.next_token()? else {
            self.push_back((second_text, second_kind));
            return Ok(Value::Integer(object_number));
        };
        if third_kind == TokenType::Literal && third_text == b"R" {
            let generation: i64 = std::str::from_utf8(&second_text)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| PdfError::NoNumber(lossy(&second_text)))?;
            Ok(Value::Reference(Reference::new(object_number as u32, generation as u16)))
        } else {
            self.push_back((third_text, third_kind));
            self.push_back((second_text, second_kind));
            Ok(Value::Integer(object_number))
        }
    }

    /// Parse a literal string (the opening `(` has already been consumed).
    pub fn read_string(&mut self) -> PdfResult<StringVal> {
        let mut bytes = Vec::new();
        let mut depth = 0i32;
        loop {
            let Some(b) = self.read_byte()? else { return Err(PdfError::UnexpectedEof) };
            match b {
                b'(' => {
                    depth += 1;
                    bytes.push(b);
                }
                b')' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    bytes.push(b);
                }
                b'\\' => {
                    let Some(escaped) = self.read_byte()? else { return Err(PdfError::UnexpectedEof) };
                    match escaped {
                        b'n' => bytes.push(b'\n'),
                        b'r' => bytes.push(b'\r'),
                        b't' => bytes.push(b'\t'),
                        b'b' => bytes.push(0x08),
                        b'f' => bytes.push(0x0C),
                        b'(' => bytes.push(b'('),
                        b')' => bytes.push(b')'),
                        b'\\' => bytes.push(b'\\'),
                        b'\n' => {}
                        b'\r' => {
                            if self.peek_byte()? == Some(b'\n') {
                                self.read_byte()?;
                            }
                        }
                        d @ b'0'..=b'7' => {
                            let mut value = (d - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek_byte()? {
                                    Some(o @ b'0'..=b'7') => {
                                        value = value * 8 + (o - b'0') as u32;
                                        self.read_byte()?;
                                    }
                                    _ => break,
                                }
                            }
                            bytes.push(value as u8);
                        }
                        other => bytes.push(other),
                    }
                }
                other => bytes.push(other),
            }
        }
        Ok(StringVal::from_raw(bytes, StringPresentation::Literal))
    }

    /// Parse a hex string (the opening `<` has already been consumed).
    pub fn read_hex_string(&mut self) -> PdfResult<StringVal> {
        let mut digits = Vec::new();
        loop {
            let Some(b) = self.read_byte()? else { return Err(PdfError::UnexpectedEof) };
            if b == b'>' {
                break;
            }
            if is_whitespace(b) {
                continue;
            }
            digits.push(hex_value(b).ok_or(PdfError::InvalidStream("non-hex digit in hex string".into()))?);
        }
        if digits.len() % 2 == 1 {
            digits.push(0);
        }
        let bytes: Vec<u8> = digits.chunks_exact(2).map(|c| (c[0] << 4) | c[1]).collect();
        Ok(StringVal::from_raw(bytes, StringPresentation::Hex))
    }

    /// Reverse `#XX` escapes in an already-lexed name run (the leading `/`
    /// was consumed by [`Self::next_token`]).
    pub fn read_name(&self, lexed: &[u8]) -> PdfResult<Name> {
        Name::unescape(lexed)
    }

    /// Parse an array (the opening `[` has already been consumed).
    pub fn read_array(&mut self) -> PdfResult<Array> {
        let mut array = Array::new();
        loop {
            let Some((text, kind)) = self.next_token()? else { return Err(PdfError::UnexpectedEof) };
            if kind == TokenType::SquareR {
                break;
            }
            self.push_back((text, kind));
            let value = self.read_next_variant()?;
            array.push(Object::new_direct(value));
        }
        Ok(array)
    }

    /// Parse a dictionary (the opening `<<` has already been consumed).
    pub fn read_dictionary(&mut self) -> PdfResult<Dictionary> {
        let mut dict = Dictionary::new();
        loop {
            let Some((text, kind)) = self.next_token()? else { return Err(PdfError::UnexpectedEof) };
            if kind == TokenType::DoubleAngleR {
                break;
            }
            if kind != TokenType::Slash {
                return Err(PdfError::InvalidStream("expected a name key in dictionary".into()));
            }
            let key = self.read_name(&text)?;
            let value = self.read_next_variant()?;
            dict.set(key, Object::new_direct(value));
        }
        Ok(dict)
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tokenize(input: &[u8]) -> Value {
        let mut cursor = Cursor::new(input);
        let mut tokenizer = Tokenizer::new(&mut cursor);
        tokenizer.read_next_variant().unwrap()
    }

    #[test]
    fn reads_integer() {
        assert!(matches!(tokenize(b"42"), Value::Integer(42)));
    }

    #[test]
    fn reads_reference_not_two_integers() {
        let mut cursor = Cursor::new(&b"1 0 R"[..]);
        let mut tokenizer = Tokenizer::new(&mut cursor);
        let value = tokenizer.read_next_variant().unwrap();
        assert_eq!(value.as_reference().unwrap(), Reference::new(1, 0));
    }

    #[test]
    fn distinguishes_two_bare_integers_from_a_reference() {
        let mut cursor = Cursor::new(&b"1 2"[..]);
        let mut tokenizer = Tokenizer::new(&mut cursor);
        let first = tokenizer.read_next_variant().unwrap();
        assert!(matches!(first, Value::Integer(1)));
        let second = tokenizer.read_next_variant().unwrap();
        assert!(matches!(second, Value::Integer(2)));
    }

    #[test]
    fn reads_literal_string_with_escapes() {
        let value = tokenize(b"(Line1\\nLine2\\\\(end\\))");
        let s = value.as_str().unwrap();
        assert_eq!(s.as_text(), "Line1\nLine2\\(end)");
    }

    #[test]
    fn reads_hex_string_with_odd_padding() {
        // Odd trailing digit "6" pads with a "0" nibble -> final byte 0x60,
        // so "48656C6C6" decodes to "Hell" plus a backtick, not "Hello".
        let value = tokenize(b"<48656C6C6>");
        assert_eq!(value.as_str().unwrap().as_bytes(), b"Hell\x60");
    }

    #[test]
    fn reads_dictionary() {
        let value = tokenize(b"<< /Type /Catalog /Count 3 >>");
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn reads_array() {
        let value = tokenize(b"[1 2 3]");
        assert_eq!(value.as_array().unwrap().len(), 3);
    }
}
