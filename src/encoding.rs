//! [`Encoding`]: the façade a font wraps around a primary [`EncodingMapKind`]
//! plus an optional `/ToUnicode` map, implementing the conversions and
//! `/Encoding` export described in spec.md §4.11.
//!
//! Grounded on `font.rs`'s `UnicodeCmap`/`Cmap` writer for the CMap stream
//! emission shape (PostScript header, `begincidchar`/`beginbfchar` body),
//! generalized to the full fallback rules spec.md names.

use bitflags::bitflags;

use crate::char_code::{CharCode, EncodingLimits};
use crate::container::{direct, Dictionary};
use crate::encoding_map::{Cid, EncodingMapKind};
use crate::error::PdfResult;
use crate::object::Object;
use crate::object_store::ObjectStore;
use crate::stream::Stream;
use crate::value::{CodePoint, Name, Value};

bitflags! {
    /// Controls what [`Encoding::export_to_dictionary`] writes.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct ExportFlags: u8 {
        /// Write a synthesized CID CMap stream rather than the primary
        /// map's own export (name or `/Differences` dictionary).
        const EXPORT_CID_CMAP = 0b01;
        /// Do not write a `/ToUnicode` entry even if one is available.
        const SKIP_TO_UNICODE = 0b10;
    }
}

/// Either an already-encoded byte string or already-decoded UTF-8 text, the
/// two shapes [`Encoding::convert_to_cids`] accepts.
pub enum ConvertInput<'a> {
    /// Raw on-wire bytes in this encoding's code-unit space.
    Encoded(&'a [u8]),
    /// Already-decoded Unicode text.
    Utf8(&'a str),
}

/// A font's encoding: the code-unit ↔ code-point/CID mapping it writes (or
/// was parsed from), plus an optional separate map used only for
/// Unicode round-tripping (`/ToUnicode`).
#[derive(Debug)]
pub struct Encoding {
    /// An identifying name (the font's base name or resource key), used
    /// only for diagnostics and CMap naming on export.
    pub id: Name,
    /// The map that governs actual glyph selection/encoding.
    pub primary_map: EncodingMapKind,
    /// The map used for "what text does this code represent" round trips,
    /// independent of `primary_map` when the two diverge (e.g. a CID font
    /// whose primary map is `Identity-H`).
    pub to_unicode_map: Option<EncodingMapKind>,
    /// Explicit `/FirstChar`/`/LastChar` overrides, when the consumer has
    /// set them; otherwise limits are derived from `primary_map`.
    pub explicit_limits: Option<EncodingLimits>,
}

impl Encoding {
    /// Wrap a primary map with no `/ToUnicode` map yet.
    pub fn new(id: Name, primary_map: EncodingMapKind) -> Self {
        Self { id, primary_map, to_unicode_map: None, explicit_limits: None }
    }

    /// Install (or replace) the `/ToUnicode` map.
    pub fn set_to_unicode_map(&mut self, map: EncodingMapKind) {
        self.to_unicode_map = Some(map);
    }

    /// Override the derived `/FirstChar`/`/LastChar` limits.
    pub fn set_explicit_limits(&mut self, limits: EncodingLimits) {
        self.explicit_limits = Some(limits);
    }

    /// The effective `/FirstChar`/`/LastChar` limits: the explicit override
    /// if set, otherwise the primary map's own limits.
    pub fn limits(&self) -> EncodingLimits {
        self.explicit_limits.unwrap_or_else(|| self.primary_map.limits())
    }

    fn text_map(&self) -> &EncodingMapKind {
        self.to_unicode_map.as_ref().unwrap_or(&self.primary_map)
    }

    /// Decode an encoded byte string to Unicode text, running the
    /// `/ToUnicode` map (or the primary map, if none) in longest-match
    /// mode. Unmapped bytes are skipped per the "missing code unit"
    /// fallback rule (§4.11) rather than aborting the whole string.
    pub fn convert_to_utf8(&self, encoded: &[u8]) -> String {
        let map = self.text_map();
        let limits = map.limits();
        let fallback_width = if limits.is_valid() { limits.min_code_size.max(1) as usize } else { 1 };
        let mut out = String::new();
        let mut pos = 0;
        while pos < encoded.len() {
            match map.try_get_next_code_points(&encoded[pos..]) {
                Some((code, code_points)) => {
                    out.extend(code_points);
                    pos += code.size as usize;
                }
                None => {
                    pos += fallback_width.min(encoded.len() - pos).max(1);
                }
            }
        }
        out
    }

    /// Encode Unicode text back to on-wire bytes. For a parsed (loaded)
    /// encoding this runs the `/ToUnicode` reverse map only; for a
    /// freshly-built encoding with no `/ToUnicode` map yet it runs the
    /// primary map's own reverse lookup, applying the "missing CharCode"
    /// fallback rule so conversion never fails.
    pub fn convert_to_encoded(&self, text: &str) -> Vec<u8> {
        let map = self.text_map();
        let chars: Vec<char> = text.chars().collect();
        let mut out = Vec::new();
        let mut pos = 0;
        while pos < chars.len() {
            let (code, consumed) = map.try_get_next_char_code_for_text(&chars[pos..]);
            write_code_bytes(&mut out, code);
            pos += consumed.max(1);
        }
        out
    }

    /// Resolve either an encoded byte string or UTF-8 text to a CID
    /// sequence.
    pub fn convert_to_cids(&self, input: ConvertInput<'_>) -> Vec<Cid> {
        match input {
            ConvertInput::Encoded(bytes) => {
                let mut out = Vec::new();
                let mut pos = 0;
                while pos < bytes.len() {
                    match self.primary_map.try_get_next_char_code(&bytes[pos..]) {
                        Some((code, consumed)) => {
                            out.push(self.primary_map.try_get_cid(code).unwrap_or(code.code));
                            pos += consumed;
                        }
                        None => pos += 1,
                    }
                }
                out
            }
            ConvertInput::Utf8(text) => text.chars().map(|cp| self.get_cid(cp)).collect(),
        }
    }

    /// The CID a single code point maps to, via the primary map (falling
    /// back to the synthesized CharCode's own code value, per the "missing
    /// CID" rule).
    pub fn get_cid(&self, cp: CodePoint) -> Cid {
        let (code, _) = self.primary_map.try_get_next_char_code_for_text(&[cp]);
        self.primary_map.try_get_cid(code).unwrap_or(code.code)
    }

    /// Write this encoding's `/Encoding` (and, unless suppressed,
    /// `/ToUnicode`) entries onto `dict`.
    pub fn export_to_dictionary(
        &self,
        dict: &mut Dictionary,
        flags: ExportFlags,
        store: &ObjectStore,
    ) -> PdfResult<()> {
        if flags.contains(ExportFlags::EXPORT_CID_CMAP) {
            let bytes = self.render_cid_cmap();
            let object = store.create_dictionary()?;
            {
                let mut value = object.value_mut()?;
                let cmap_dict = value.as_dict_mut()?;
                cmap_dict.set(Name::from_str("Type"), direct(Value::Name(Name::from_str("CMap"))));
                cmap_dict.set(Name::from_str("CMapName"), direct(Value::Name(self.id.clone())));
            }
            let mut stream = Stream::new();
            stream.set(&bytes, None)?;
            object.set_stream(stream)?;
            dict.set(Name::from_str("Encoding"), direct(Value::Reference(object.reference())));
        } else {
            let (name, object) = self.primary_map.get_export_object(store)?;
            if let Some(name) = name {
                dict.set(Name::from_str("Encoding"), direct(Value::Name(name)));
            } else if let Some(object) = object {
                dict.set(Name::from_str("Encoding"), direct(Value::Reference(object.reference())));
            }
        }

        if !flags.contains(ExportFlags::SKIP_TO_UNICODE) {
            if let Some(to_unicode) = &self.to_unicode_map {
                let object = store.create_dictionary()?;
                to_unicode.write_to_unicode_cmap(&object)?;
                dict.set(Name::from_str("ToUnicode"), direct(Value::Reference(object.reference())));
            }
        }
        Ok(())
    }

    fn render_cid_cmap(&self) -> Vec<u8> {
        let limits = self.limits();
        let mut entries: Vec<(CharCode, Cid)> = Vec::new();
        if limits.is_valid() {
            for code_value in limits.first_char..=limits.last_char {
                let code = CharCode::new(code_value, limits.max_code_size.max(1));
                if let Some(cid) = self.primary_map.try_get_cid(code) {
                    entries.push((code, cid));
                }
            }
        }
        let mut out = String::new();
        out.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (");
        out.push_str(self.id.as_utf8());
        out.push_str(") /Supplement 0 >> def\n");
        out.push_str(&format!("/CMapName /{} def\n/CMapType 1 def\n", self.id.as_utf8()));
        out.push_str(&format!("{} begincidchar\n", entries.len()));
        for (code, cid) in &entries {
            out.push_str(&format!("<{}> {}\n", code.to_hex(), cid));
        }
        out.push_str("endcidchar\nendcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        out.into_bytes()
    }
}

fn write_code_bytes(out: &mut Vec<u8>, code: CharCode) {
    let size = code.size.max(1);
    for shift in (0..size).rev() {
        out.push((code.code >> (shift as u32 * 8)) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding_map::{OneByteMap, PredefinedEncoding};

    #[test]
    fn round_trips_ascii_through_one_byte_encoding() {
        let encoding = Encoding::new(
            Name::from_str("F1"),
            EncodingMapKind::OneByte(OneByteMap::new(PredefinedEncoding::WinAnsi)),
        );
        let encoded = encoding.convert_to_encoded("Hi");
        assert_eq!(encoding.convert_to_utf8(&encoded), "Hi");
    }

    #[test]
    fn get_cid_falls_back_to_code_minus_first_char() {
        let encoding = Encoding::new(
            Name::from_str("F1"),
            EncodingMapKind::OneByte(OneByteMap::new(PredefinedEncoding::WinAnsi)),
        );
        let first_char = encoding.primary_map.limits().first_char;
        let cid = encoding.get_cid('A');
        assert_eq!(cid, b'A' as u32 - first_char);
    }

    #[test]
    fn missing_code_unit_is_skipped_not_fatal() {
        let encoding = Encoding::new(
            Name::from_str("F1"),
            EncodingMapKind::OneByte(OneByteMap::new(PredefinedEncoding::Symbol)),
        );
        // Symbol's curated table only covers a handful of codes; unmapped
        // bytes must not abort decoding of the rest of the string.
        let text = encoding.convert_to_utf8(&[0x20, 0xFF, 0x21]);
        assert!(!text.is_empty());
    }
}
