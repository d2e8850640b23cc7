//! The CMap grammar parser (Adobe Technical Note #5014): turns a decoded
//! CMap stream into a [`CMapDerivedMap`].
//!
//! Grounded on the simple `beginbfchar`/`endbfchar` line-scanner in
//! `examples/other_examples/*Velli20-safe-pdf*characther_map.rs.rs`,
//! generalized to the full section grammar named in spec.md §4.12 and
//! built on top of [`crate::tokenizer::Tokenizer`] rather than ad hoc line
//! splitting.

use crate::char_code::CharCode;
use crate::device::InputDevice;
use crate::encoding_map::CMapDerivedMap;
use crate::error::{PdfError, PdfResult};
use crate::value::Value;
use crate::tokenizer::{LiteralType, TokenType, Tokenizer};

/// Parse a CMap stream's decoded bytes into a [`CMapDerivedMap`], reading
/// `codespacerange`/`bfchar`/`bfrange`/`cidrange`/`cidchar` sections and
/// ignoring everything else (the surrounding PostScript procedure
/// boilerplate, `usecmap`, resource registration, ...).
pub fn parse_cmap(device: &mut dyn InputDevice) -> PdfResult<CMapDerivedMap> {
    let mut tokenizer = Tokenizer::new(device);
    let mut map = CMapDerivedMap::new();
    loop {
        let Some((text, kind)) = tokenizer.next_token()? else { break };
        if kind != TokenType::Keyword && kind != TokenType::Literal {
            continue;
        }
        match text.as_slice() {
            b"begincodespacerange" => parse_codespacerange(&mut tokenizer, &mut map)?,
            b"beginbfchar" => parse_bfchar(&mut tokenizer, &mut map)?,
            b"beginbfrange" => parse_bfrange(&mut tokenizer, &mut map)?,
            b"begincidrange" => parse_cidrange(&mut tokenizer, &mut map)?,
            b"begincidchar" => parse_cidchar(&mut tokenizer, &mut map)?,
            _ => {}
        }
    }
    Ok(map)
}

/// Read the next hex-string token, failing if a different token shape is
/// found or the section terminator keyword is hit first.
fn next_hex_code(tokenizer: &mut Tokenizer<'_>, terminator: &[u8]) -> PdfResult<Option<CharCode>> {
    let Some((text, kind)) = tokenizer.next_token()? else { return Err(PdfError::UnexpectedEof) };
    if kind == TokenType::Keyword && text == terminator {
        return Ok(None);
    }
    if kind != TokenType::AngleL {
        return Err(PdfError::InvalidStream("expected a hex code in CMap section".into()));
    }
    let bytes = tokenizer.read_hex_string()?.as_bytes();
    let size = bytes.len().max(1) as u8;
    let mut code = 0u32;
    for b in &bytes {
        code = (code << 8) | *b as u32;
    }
    Ok(Some(CharCode::new(code, size)))
}

fn next_integer(tokenizer: &mut Tokenizer<'_>) -> PdfResult<i64> {
    let Some((text, kind)) = tokenizer.next_token()? else { return Err(PdfError::UnexpectedEof) };
    if kind != TokenType::Literal || Tokenizer::determine_literal_type(&text) != LiteralType::Number {
        return Err(PdfError::InvalidStream("expected an integer in CMap section".into()));
    }
    std::str::from_utf8(&text)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PdfError::NoNumber(String::from_utf8_lossy(&text).into_owned()))
}

fn parse_codespacerange(tokenizer: &mut Tokenizer<'_>, map: &mut CMapDerivedMap) -> PdfResult<()> {
    loop {
        let Some(lo) = next_hex_code(tokenizer, b"endcodespacerange")? else { return Ok(()) };
        let Some(hi) = next_hex_code(tokenizer, b"endcodespacerange")? else {
            return Err(PdfError::InvalidStream("codespacerange pair missing high bound".into()));
        };
        map.observe_codespace_size(lo.size);
        map.observe_codespace_size(hi.size);
    }
}

fn parse_bfchar(tokenizer: &mut Tokenizer<'_>, map: &mut CMapDerivedMap) -> PdfResult<()> {
    loop {
        let Some(src) = next_hex_code(tokenizer, b"endbfchar")? else { return Ok(()) };
        let dst = tokenizer.read_next_variant()?;
        let code_points = destination_code_points(&dst)?;
        map.observe_code(src);
        map.code_points.push_mapping(src, code_points);
    }
}

fn parse_bfrange(tokenizer: &mut Tokenizer<'_>, map: &mut CMapDerivedMap) -> PdfResult<()> {
    loop {
        let Some(lo) = next_hex_code(tokenizer, b"endbfrange")? else { return Ok(()) };
        let Some(hi) = next_hex_code(tokenizer, b"endbfrange")? else {
            return Err(PdfError::InvalidStream("bfrange triple missing high bound".into()));
        };
        let dst = tokenizer.read_next_variant()?;
        let span = hi.code.saturating_sub(lo.code);
        match &dst {
            Value::Array(array) => {
                for offset in 0..=span {
                    let Some(obj) = array.get(offset as usize) else { break };
                    let code = CharCode::new(lo.code + offset, lo.size);
                    let value_ref = obj.value()?;
                    let code_points = destination_code_points(&value_ref)?;
                    map.observe_code(code);
                    map.code_points.push_mapping(code, code_points);
                }
            }
            _ => {
                let base = destination_code_points(&dst)?;
                for offset in 0..=span {
                    let code = CharCode::new(lo.code + offset, lo.size);
                    let mut code_points = base.clone();
                    if let Some(last) = code_points.last_mut() {
                        *last = char::from_u32((*last as u32) + offset).unwrap_or(*last);
                    }
                    map.observe_code(code);
                    map.code_points.push_mapping(code, code_points);
                }
            }
        }
    }
}

fn parse_cidrange(tokenizer: &mut Tokenizer<'_>, map: &mut CMapDerivedMap) -> PdfResult<()> {
    loop {
        let Some(lo) = next_hex_code(tokenizer, b"endcidrange")? else { return Ok(()) };
        let Some(hi) = next_hex_code(tokenizer, b"endcidrange")? else {
            return Err(PdfError::InvalidStream("cidrange triple missing high bound".into()));
        };
        let cid_lo = next_integer(tokenizer)? as u32;
        let span = hi.code.saturating_sub(lo.code);
        for offset in 0..=span {
            let code = CharCode::new(lo.code + offset, lo.size);
            map.observe_code(code);
            map.cids.insert(code, cid_lo + offset);
        }
    }
}

fn parse_cidchar(tokenizer: &mut Tokenizer<'_>, map: &mut CMapDerivedMap) -> PdfResult<()> {
    loop {
        let Some(src) = next_hex_code(tokenizer, b"endcidchar")? else { return Ok(()) };
        let cid = next_integer(tokenizer)? as u32;
        map.observe_code(src);
        map.cids.insert(src, cid);
    }
}

/// A `bfchar`/`bfrange` destination is either a hex string (decoded as
/// UTF-16BE, surrogate pairs included) or a name (resolved through the
/// standard glyph list).
fn destination_code_points(value: &Value) -> PdfResult<Vec<char>> {
    match value {
        Value::String(s) => {
            let bytes = s.as_bytes();
            let units: Vec<u16> = bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
            Ok(char::decode_utf16(units).map(|r| r.unwrap_or('\u{FFFD}')).collect())
        }
        Value::Name(name) => {
            let resolved = crate::glyph_list::lookup(name.as_utf8());
            if resolved.is_none() {
                log::warn!("CMap destination glyph name {:?} is not in the glyph list", name.as_utf8());
            }
            Ok(resolved.into_iter().collect())
        }
        other => Err(PdfError::InvalidDataType { expected: "string or name", found: other.data_type() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(bytes: &[u8]) -> CMapDerivedMap {
        let mut cursor = Cursor::new(bytes);
        parse_cmap(&mut cursor).unwrap()
    }

    #[test]
    fn parses_bfchar_section() {
        let map = parse(b"1 beginbfchar\n<41> <0042>\nendbfchar\n");
        let code_points = map.code_points.get_code_points(CharCode::new(0x41, 1));
        assert_eq!(code_points, Some(&['B'][..]));
    }

    #[test]
    fn parses_bfrange_array_form() {
        let map = parse(b"1 beginbfrange\n<00> <02> [<0041> <0042> <0043>]\nendbfrange\n");
        assert_eq!(map.code_points.get_code_points(CharCode::new(0x00, 1)), Some(&['A'][..]));
        assert_eq!(map.code_points.get_code_points(CharCode::new(0x02, 1)), Some(&['C'][..]));
    }

    #[test]
    fn parses_bfrange_last_codepoint_increment_form() {
        let map = parse(b"1 beginbfrange\n<00> <02> <0041>\nendbfrange\n");
        assert_eq!(map.code_points.get_code_points(CharCode::new(0x01, 1)), Some(&['B'][..]));
    }

    #[test]
    fn parses_cidrange_section() {
        let map = parse(b"1 begincidrange\n<0000> <0002> 10\nendcidrange\n");
        assert_eq!(map.cids.get(&CharCode::new(0x0001, 2)), Some(&11));
    }

    #[test]
    fn parses_cidchar_section() {
        let map = parse(b"2 begincidchar\n<0005> 7\n<0006> 8\nendcidchar\n");
        assert_eq!(map.cids.get(&CharCode::new(0x0006, 2)), Some(&8));
    }

    #[test]
    fn parses_codespacerange_widens_limits() {
        let map = parse(b"1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");
        assert_eq!(map.declared_limits.min_code_size, 2);
        assert_eq!(map.declared_limits.max_code_size, 2);
    }
}
