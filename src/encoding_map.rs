//! [`EncodingMapKind`]: the six concrete shapes a code-unit ↔ code-point
//! (and, for CID fonts, code-unit → CID) mapping can take, behind one
//! shared operation set.
//!
//! Grounded on `PdfEncodingMapFactory`/`PdfEncodingMapBase`'s split between
//! a handful of static simple-font tables, the identity CID maps, a
//! `/Differences` overlay, and CMap-derived maps — reimplemented as a
//! closed `enum` rather than a class hierarchy, since every shape is known
//! up front and nothing else in this crate needs to add a new one.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::char_code::{CharCode, CharCodeMap, EncodingLimits};
use crate::container::{direct, Dictionary};
use crate::error::{PdfError, PdfResult};
use crate::object::Object;
use crate::object_store::ObjectStore;
use crate::predefined_tables as tables;
use crate::value::{CodePoint, Name, Value};

/// A CID, as assigned in a `/CIDSystemInfo` font's encoding.
pub type Cid = u32;

/// One of the nine static single-byte tables.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PredefinedEncoding {
    /// `WinAnsiEncoding`.
    WinAnsi,
    /// `MacRomanEncoding`.
    MacRoman,
    /// `MacExpertEncoding`.
    MacExpert,
    /// `StandardEncoding`.
    Standard,
    /// The symbolic `Symbol` font's built-in encoding.
    Symbol,
    /// The symbolic `ZapfDingbats` font's built-in encoding.
    ZapfDingbats,
    /// `PdfDocEncoding`, used for text strings, not glyph selection.
    PdfDoc,
    /// Windows code page 1250 (Central European).
    Win1250,
    /// ISO 8859-2 (Latin-2).
    Iso88592,
}

impl PredefinedEncoding {
    fn table(self) -> &'static [Option<char>; 256] {
        match self {
            PredefinedEncoding::WinAnsi => tables::win_ansi_table(),
            PredefinedEncoding::MacRoman => tables::mac_roman_table(),
            PredefinedEncoding::MacExpert => tables::mac_expert_table(),
            PredefinedEncoding::Standard => tables::standard_encoding_table(),
            PredefinedEncoding::Symbol => tables::symbol_table(),
            PredefinedEncoding::ZapfDingbats => tables::zapf_dingbats_table(),
            PredefinedEncoding::PdfDoc => tables::pdf_doc_table(),
            PredefinedEncoding::Win1250 => tables::win1250_table(),
            PredefinedEncoding::Iso88592 => tables::iso8859_2_table(),
        }
    }

    /// The `/Encoding` name this variant exports as.
    pub fn pdf_name(self) -> &'static str {
        match self {
            PredefinedEncoding::WinAnsi => "WinAnsiEncoding",
            PredefinedEncoding::MacRoman => "MacRomanEncoding",
            PredefinedEncoding::MacExpert => "MacExpertEncoding",
            PredefinedEncoding::Standard => "StandardEncoding",
            PredefinedEncoding::Symbol => "Symbol",
            PredefinedEncoding::ZapfDingbats => "ZapfDingbats",
            PredefinedEncoding::PdfDoc => "PdfDocEncoding",
            PredefinedEncoding::Win1250 => "Windows-1250",
            PredefinedEncoding::Iso88592 => "ISO-8859-2",
        }
    }
}

/// A predefined one-byte table plus its lazily built reverse map.
#[derive(Debug)]
pub struct OneByteMap {
    kind: PredefinedEncoding,
    reverse: OnceLock<BTreeMap<char, u8>>,
    limits: EncodingLimits,
}

impl OneByteMap {
    /// Wrap a predefined table, deriving limits from its populated range.
    pub fn new(kind: PredefinedEncoding) -> Self {
        let table = kind.table();
        let mut limits = EncodingLimits::default();
        for (byte, slot) in table.iter().enumerate() {
            if slot.is_some() {
                limits.observe(CharCode::new(byte as u32, 1));
            }
        }
        Self { kind, reverse: OnceLock::new(), limits }
    }

    fn reverse(&self) -> &BTreeMap<char, u8> {
        self.reverse.get_or_init(|| {
            let mut map = BTreeMap::new();
            for (byte, slot) in self.kind.table().iter().enumerate() {
                if let Some(ch) = slot {
                    map.entry(*ch).or_insert(byte as u8);
                }
            }
            map
        })
    }
}

/// Horizontal or vertical identity CID encoding: code equals CID, with no
/// meaningful code-point semantics of its own (text extraction goes through
/// a separate `/ToUnicode` map).
#[derive(Debug, Clone, Copy)]
pub struct IdentityMap {
    /// Whether this is `Identity-V` rather than `Identity-H`.
    pub vertical: bool,
    /// The fixed code-unit width, in bytes (2 for `Identity-H`/`-V`, but
    /// configurable for non-standard identity codespaces).
    pub codespace_size: u8,
}

impl IdentityMap {
    /// An identity map of the given orientation and code width.
    pub fn new(vertical: bool, codespace_size: u8) -> Self {
        Self { vertical, codespace_size }
    }
}

/// A sparse overlay of `(code -> (name, code_point))` entries over a base
/// predefined table, round-tripping to a PDF `/Differences` array.
#[derive(Debug)]
pub struct DifferenceMap {
    base: PredefinedEncoding,
    entries: BTreeMap<u8, (Name, Option<CodePoint>)>,
}

impl DifferenceMap {
    /// An overlay with no differences yet, falling back entirely to `base`.
    pub fn new(base: PredefinedEncoding) -> Self {
        Self { base, entries: BTreeMap::new() }
    }

    /// Overlay one entry, replacing the base table's glyph for `code`.
    pub fn set_difference(&mut self, code: u8, name: Name, code_point: Option<CodePoint>) {
        self.entries.insert(code, (name, code_point));
    }

    fn code_point_for(&self, code: u8) -> Option<CodePoint> {
        if let Some((_, cp)) = self.entries.get(&code) {
            return *cp;
        }
        self.base.table()[code as usize]
    }
}

/// A map built by the CMap parser (§4.12): a `CharCodeMap` for
/// code-unit/code-point (`bfchar`/`bfrange`) data, plus an optional
/// code-unit → CID table (`cidrange`/`cidchar` data). The same structure
/// backs both `/ToUnicode` streams and embedded CID CMaps.
#[derive(Debug, Default)]
pub struct CMapDerivedMap {
    /// The `bfchar`/`bfrange` code-unit → code-point table.
    pub code_points: CharCodeMap,
    /// The `cidrange`/`cidchar` code-unit → CID table.
    pub cids: std::collections::HashMap<CharCode, Cid>,
    /// Merged codespace/code limits: code-size bounds from
    /// `begincodespacerange`, `first_char`/`last_char` from every code
    /// actually observed across `bfchar`/`bfrange`/`cidrange`/`cidchar`.
    pub declared_limits: EncodingLimits,
}

impl CMapDerivedMap {
    /// An empty map with no entries or declared limits yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a code actually seen in a `bfchar`/`bfrange`/`cidrange`/
    /// `cidchar` section.
    pub fn observe_code(&mut self, code: CharCode) {
        self.declared_limits.observe(code);
    }

    /// Record a codespace width declared by `begincodespacerange`.
    pub fn observe_codespace_size(&mut self, size: u8) {
        self.declared_limits.observe_code_size(size);
    }

    fn limits(&self) -> EncodingLimits {
        let mut merged = self.declared_limits;
        let from_code_points = self.code_points.limits();
        if from_code_points.is_valid() {
            merged.first_char = merged.first_char.min(from_code_points.first_char);
            merged.last_char = merged.last_char.max(from_code_points.last_char);
            merged.observe_code_size(from_code_points.min_code_size);
            merged.observe_code_size(from_code_points.max_code_size);
        }
        merged
    }
}

/// The encoding embedded in a Type 1 font program's own `/Encoding`
/// PostScript array; exports nothing since the mapping is implicit in the
/// font program itself.
#[derive(Debug, Default)]
pub struct Type1FontProgramMap {
    /// The font program's built-in code-unit ↔ code-point table.
    pub map: CharCodeMap,
}

/// Placeholder primary map for a "dynamic" encoding under construction,
/// before any glyph has actually been registered. Every operation fails.
#[derive(Debug, Default)]
pub struct DummyMap;

/// One of the six shapes an encoding's primary (or ToUnicode) map can take.
#[derive(Debug)]
pub enum EncodingMapKind {
    /// A flat 256-entry table, one of the predefined simple encodings.
    OneByte(OneByteMap),
    /// `Identity-H`/`Identity-V`: code equals CID directly.
    Identity(IdentityMap),
    /// A predefined base encoding overlaid with a sparse `/Differences`.
    Difference(DifferenceMap),
    /// A map parsed from an embedded CMap stream.
    CMapDerived(CMapDerivedMap),
    /// A bare Type 1 font's built-in encoding.
    Type1FontProgram(Type1FontProgramMap),
    /// Every operation fails; placeholder before any mapping is known.
    Dummy(DummyMap),
}

impl EncodingMapKind {
    /// Consume 1..=max_code_size bytes from the front of `bytes`, returning
    /// the longest mapped code plus how many bytes it consumed.
    pub fn try_get_next_char_code(&self, bytes: &[u8]) -> Option<(CharCode, usize)> {
        if bytes.is_empty() {
            return None;
        }
        match self {
            EncodingMapKind::OneByte(_) => Some((CharCode::new(bytes[0] as u32, 1), 1)),
            EncodingMapKind::Identity(m) => {
                let size = m.codespace_size as usize;
                if bytes.len() < size {
                    return None;
                }
                let mut code = 0u32;
                for &b in &bytes[..size] {
                    code = (code << 8) | b as u32;
                }
                Some((CharCode::new(code, size as u8), size))
            }
            EncodingMapKind::Difference(_) => Some((CharCode::new(bytes[0] as u32, 1), 1)),
            EncodingMapKind::CMapDerived(m) => {
                let limits = m.limits();
                if !limits.is_valid() {
                    return None;
                }
                for width in (limits.min_code_size..=limits.max_code_size).rev() {
                    let width = width as usize;
                    if bytes.len() < width {
                        continue;
                    }
                    let mut code = 0u32;
                    for &b in &bytes[..width] {
                        code = (code << 8) | b as u32;
                    }
                    let candidate = CharCode::new(code, width as u8);
                    if m.code_points.get_code_points(candidate).is_some() || m.cids.contains_key(&candidate) {
                        return Some((candidate, width));
                    }
                }
                None
            }
            EncodingMapKind::Type1FontProgram(m) => {
                let limits = m.map.limits();
                if !limits.is_valid() {
                    return None;
                }
                for width in (limits.min_code_size..=limits.max_code_size).rev() {
                    let width = width as usize;
                    if bytes.len() < width {
                        continue;
                    }
                    let mut code = 0u32;
                    for &b in &bytes[..width] {
                        code = (code << 8) | b as u32;
                    }
                    let candidate = CharCode::new(code, width as u8);
                    if m.map.get_code_points(candidate).is_some() {
                        return Some((candidate, width));
                    }
                }
                None
            }
            EncodingMapKind::Dummy(_) => None,
        }
    }

    /// Reverse lookup for a single code point.
    pub fn try_get_char_code(&self, cp: CodePoint) -> Option<CharCode> {
        match self {
            EncodingMapKind::OneByte(m) => m.reverse().get(&cp).map(|&b| CharCode::new(b as u32, 1)),
            EncodingMapKind::Identity(m) => {
                let code = cp as u32;
                Some(CharCode::new(code, m.codespace_size))
            }
            EncodingMapKind::Difference(m) => m
                .entries
                .iter()
                .find(|(_, (_, ecp))| *ecp == Some(cp))
                .map(|(&code, _)| CharCode::new(code as u32, 1))
                .or_else(|| m.base.table().iter().position(|s| *s == Some(cp)).map(|b| CharCode::new(b as u32, 1))),
            EncodingMapKind::CMapDerived(m) => m.code_points.get_char_code_span(&[cp]),
            EncodingMapKind::Type1FontProgram(m) => m.map.get_char_code_span(&[cp]),
            EncodingMapKind::Dummy(_) => None,
        }
    }

    /// Reverse lookup for a ligature span; fails unless
    /// [`Self::has_ligatures_support`].
    pub fn try_get_char_code_span(&self, cps: &[CodePoint]) -> Option<CharCode> {
        if !self.has_ligatures_support() {
            if cps.len() != 1 {
                return None;
            }
            return self.try_get_char_code(cps[0]);
        }
        match self {
            EncodingMapKind::CMapDerived(m) => m.code_points.get_char_code_span(cps),
            EncodingMapKind::Type1FontProgram(m) => m.map.get_char_code_span(cps),
            _ => None,
        }
    }

    /// Forward lookup: the code points a code maps to.
    pub fn try_get_code_points(&self, code: CharCode) -> Option<Vec<CodePoint>> {
        match self {
            EncodingMapKind::OneByte(m) => {
                m.kind.table().get(code.code as usize).copied().flatten().map(|c| vec![c])
            }
            EncodingMapKind::Identity(_) => None,
            EncodingMapKind::Difference(m) => {
                if code.code > u8::MAX as u32 {
                    return None;
                }
                m.code_point_for(code.code as u8).map(|c| vec![c])
            }
            EncodingMapKind::CMapDerived(m) => m.code_points.get_code_points(code).map(|s| s.to_vec()),
            EncodingMapKind::Type1FontProgram(m) => m.map.get_code_points(code).map(|s| s.to_vec()),
            EncodingMapKind::Dummy(_) => None,
        }
    }

    /// Longest-match forward decode, within the declared codespace.
    pub fn try_get_next_code_points(&self, bytes: &[u8]) -> Option<(CharCode, Vec<CodePoint>)> {
        let (code, consumed) = self.try_get_next_char_code(bytes)?;
        let code_points = self.try_get_code_points(code).unwrap_or_default();
        Some((CharCode::new(code.code, consumed as u8), code_points))
    }

    /// CID for a code; when this map has no CID table of its own, falls
    /// back to `code.code - first_char`.
    pub fn try_get_cid(&self, code: CharCode) -> Option<Cid> {
        match self {
            EncodingMapKind::Identity(_) => Some(code.code),
            EncodingMapKind::CMapDerived(m) => {
                if let Some(&cid) = m.cids.get(&code) {
                    return Some(cid);
                }
                let limits = m.limits();
                Some(code.code.saturating_sub(limits.first_char))
            }
            EncodingMapKind::Dummy(_) => None,
            _ => {
                let limits = self.limits();
                Some(code.code.saturating_sub(limits.first_char))
            }
        }
    }

    /// Forward lookup with the "missing CharCode" fallback rule applied:
    /// consume as many leading code points of `chars` as the map's longest
    /// ligature match allows (always at least one), and when none of them
    /// map to a known code, synthesize one by clamping the code point into
    /// `[min_code_size, max_code_size]`/`[0, max_value_for_size]`.
    pub fn try_get_next_char_code_for_text(&self, chars: &[CodePoint]) -> (CharCode, usize) {
        if self.has_ligatures_support() {
            let matched = match self {
                EncodingMapKind::CMapDerived(m) => m.code_points.try_get_next_char_code(chars),
                EncodingMapKind::Type1FontProgram(m) => m.map.try_get_next_char_code(chars),
                _ => None,
            };
            if let Some(hit) = matched {
                return hit;
            }
        } else if let Some(code) = self.try_get_char_code(chars[0]) {
            return (code, 1);
        }
        let limits = self.limits();
        let min_size = if limits.min_code_size == 0 || limits.min_code_size == u8::MAX { 1 } else { limits.min_code_size };
        let max_size = limits.max_code_size.max(min_size);
        let natural_size = natural_size_for_codepoint(chars[0]).clamp(min_size, max_size);
        let max_value = max_value_for_size(natural_size);
        let code = (chars[0] as u32).min(max_value);
        (CharCode::new(code, natural_size), 1)
    }

    /// Whether this map carries an explicit code-unit → CID table.
    pub fn has_cid_mapping(&self) -> bool {
        matches!(self, EncodingMapKind::Identity(_))
            || matches!(self, EncodingMapKind::CMapDerived(m) if !m.cids.is_empty())
    }

    /// Whether reverse lookup supports multi-code-point ligature spans.
    pub fn has_ligatures_support(&self) -> bool {
        matches!(self, EncodingMapKind::CMapDerived(_) | EncodingMapKind::Type1FontProgram(_))
    }

    /// The observed (or inherent) codespace limits.
    pub fn limits(&self) -> EncodingLimits {
        match self {
            EncodingMapKind::OneByte(m) => m.limits,
            EncodingMapKind::Identity(m) => {
                let mut l = EncodingLimits::default();
                let max_value = (m.codespace_size as u32).min(4);
                let max_value = if max_value >= 4 { u32::MAX } else { (1u32 << (max_value * 8)) - 1 };
                l.observe(CharCode::new(0, m.codespace_size));
                l.observe(CharCode::new(max_value, m.codespace_size));
                l
            }
            EncodingMapKind::Difference(_) => {
                let mut l = EncodingLimits::default();
                l.observe(CharCode::new(0, 1));
                l.observe(CharCode::new(255, 1));
                l
            }
            EncodingMapKind::CMapDerived(m) => m.limits(),
            EncodingMapKind::Type1FontProgram(m) => m.map.limits(),
            EncodingMapKind::Dummy(_) => EncodingLimits::default(),
        }
    }

    /// How this map appears as an `/Encoding` value: a bare name, a
    /// dictionary object, or neither.
    pub fn get_export_object(&self, store: &ObjectStore) -> PdfResult<(Option<Name>, Option<Object>)> {
        match self {
            EncodingMapKind::OneByte(m) => Ok((Some(Name::from_str(m.kind.pdf_name())), None)),
            EncodingMapKind::Identity(m) => {
                let name = if m.vertical { "Identity-V" } else { "Identity-H" };
                Ok((Some(Name::from_str(name)), None))
            }
            EncodingMapKind::Difference(m) => {
                let mut dict = Dictionary::new();
                dict.set(Name::from_str("Type"), direct(Value::Name(Name::from_str("Encoding"))));
                dict.set(
                    Name::from_str("BaseEncoding"),
                    direct(Value::Name(Name::from_str(m.base.pdf_name()))),
                );
                dict.set(Name::from_str("Differences"), direct(Value::Array(differences_array(m))));
                let object = store.create_from_value(Value::Dictionary(dict))?;
                Ok((None, Some(object)))
            }
            EncodingMapKind::CMapDerived(_) | EncodingMapKind::Type1FontProgram(_) | EncodingMapKind::Dummy(_) => {
                Err(PdfError::NotImplemented("this encoding map exports nothing of its own"))
            }
        }
    }

    /// Emit a `/ToUnicode` CMap stream onto `obj`. The predefined one-byte
    /// tables export as a single `beginbfrange` section spanning
    /// `first_char..last_char` (Adobe TN#5014 §4); every other variant emits
    /// `beginbfchar` sections chunked at 100 entries each, the per-section
    /// cap TN#5014 places on both forms.
    pub fn write_to_unicode_cmap(&self, obj: &Object) -> PdfResult<()> {
        if matches!(self, EncodingMapKind::Dummy(_)) {
            return Err(PdfError::NotImplemented("dummy encoding has no ToUnicode mapping"));
        }
        let limits = self.limits();
        if !limits.is_valid() {
            return Err(PdfError::InternalLogic("encoding has no observed codespace"));
        }
        let code_size = limits.max_code_size.max(1);
        let bytes = if matches!(self, EncodingMapKind::OneByte(_)) {
            render_bfrange_span(code_size, limits.first_char, limits.last_char, |code_value| {
                self.try_get_code_points(CharCode::new(code_value, code_size))
            })
        } else {
            let mut entries = Vec::new();
            for code_value in limits.first_char..=limits.last_char {
                let code = CharCode::new(code_value, code_size);
                if let Some(code_points) = self.try_get_code_points(code) {
                    if !code_points.is_empty() {
                        entries.push((code, code_points));
                    }
                }
            }
            render_bfchar_chunked(code_size, &entries)
        };
        {
            let mut value = obj.value_mut()?;
            let dict = value.as_dict_mut()?;
            dict.set(Name::from_str("Type"), direct(Value::Name(Name::from_str("CMap"))));
            dict.set(Name::from_str("CMapName"), direct(Value::Name(Name::from_str("Adobe-Identity-UCS"))));
        }
        let mut stream = crate::stream::Stream::new();
        stream.set(&bytes, None)?;
        obj.set_stream(stream)
    }
}

fn natural_size_for_codepoint(cp: CodePoint) -> u8 {
    if (cp as u32) <= 0xFF {
        1
    } else if (cp as u32) <= 0xFFFF {
        2
    } else {
        4
    }
}

fn max_value_for_size(size: u8) -> u32 {
    match size {
        0 | 1 => 0xFF,
        2 => 0xFFFF,
        3 => 0x00FF_FFFF,
        _ => u32::MAX,
    }
}

fn differences_array(m: &DifferenceMap) -> crate::container::Array {
    let mut array = crate::container::Array::new();
    let mut last_code: Option<i32> = None;
    for (&code, (name, _)) in &m.entries {
        if last_code != Some(code as i32 - 1) {
            array.push(direct(Value::Integer(code as i64)));
        }
        array.push(direct(Value::Name(name.clone())));
        last_code = Some(code as i32);
    }
    array
}

fn push_cmap_preamble(out: &mut String, code_size: u8) {
    out.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n");
    out.push_str(&format!(
        "1 begincodespacerange\n<{}> <{}>\nendcodespacerange\n",
        "0".repeat(code_size as usize * 2),
        "F".repeat(code_size as usize * 2)
    ));
}

fn push_cmap_epilogue(out: &mut String) {
    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
}

fn code_points_to_utf16_hex(code_points: &[CodePoint]) -> String {
    let mut utf16 = Vec::new();
    for cp in code_points {
        utf16.extend(encode_utf16_be(*cp));
    }
    hex_bytes(&utf16)
}

/// A single `beginbfrange` section covering every code from `first` to
/// `last` inclusive, as an array destination (one entry per code, in
/// order). Codes the map has no entry for fall back to a space, since a
/// contiguous predefined table's span otherwise has no gaps to speak of.
fn render_bfrange_span(
    code_size: u8,
    first: u32,
    last: u32,
    lookup: impl Fn(u32) -> Option<Vec<CodePoint>>,
) -> Vec<u8> {
    let mut out = String::new();
    push_cmap_preamble(&mut out, code_size);
    out.push_str("1 beginbfrange\n");
    out.push_str(&format!(
        "<{}> <{}> [\n",
        CharCode::new(first, code_size).to_hex(),
        CharCode::new(last, code_size).to_hex()
    ));
    for code_value in first..=last {
        let code_points = lookup(code_value).filter(|cps| !cps.is_empty()).unwrap_or_else(|| vec![' ']);
        out.push_str(&format!("<{}>\n", code_points_to_utf16_hex(&code_points)));
    }
    out.push_str("]\nendbfrange\n");
    push_cmap_epilogue(&mut out);
    out.into_bytes()
}

/// `beginbfchar` sections, flushed every 100 entries (Adobe TN#5014's
/// per-section limit), grounded on `UnicodeCmap::flush_range`.
fn render_bfchar_chunked(code_size: u8, entries: &[(CharCode, Vec<CodePoint>)]) -> Vec<u8> {
    let mut out = String::new();
    push_cmap_preamble(&mut out, code_size);
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (code, code_points) in chunk {
            out.push_str(&format!("<{}> <{}>\n", code.to_hex(), code_points_to_utf16_hex(code_points)));
        }
        out.push_str("endbfchar\n");
    }
    push_cmap_epilogue(&mut out);
    out.into_bytes()
}

fn encode_utf16_be(cp: char) -> Vec<u8> {
    let mut buf = [0u16; 2];
    let units = cp.encode_utf16(&mut buf);
    units.iter().flat_map(|u| u.to_be_bytes()).collect()
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_byte_round_trips_printable_ascii() {
        let map = EncodingMapKind::OneByte(OneByteMap::new(PredefinedEncoding::WinAnsi));
        let code = map.try_get_char_code('A').unwrap();
        assert_eq!(map.try_get_code_points(code).unwrap(), vec!['A']);
    }

    #[test]
    fn identity_cid_equals_code() {
        let map = EncodingMapKind::Identity(IdentityMap::new(false, 2));
        let (code, consumed) = map.try_get_next_char_code(&[0x00, 0x2A]).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(map.try_get_cid(code), Some(0x2A));
    }

    #[test]
    fn difference_overlay_shadows_base() {
        let mut diff = DifferenceMap::new(PredefinedEncoding::WinAnsi);
        diff.set_difference(0x41, Name::from_str("Agrave"), Some('\u{00C0}'));
        let map = EncodingMapKind::Difference(diff);
        let code = CharCode::new(0x41, 1);
        assert_eq!(map.try_get_code_points(code), Some(vec!['\u{00C0}']));
        let untouched = CharCode::new(0x42, 1);
        assert_eq!(map.try_get_code_points(untouched), Some(vec!['B']));
    }

    #[test]
    fn cmap_derived_falls_back_to_code_minus_first_char() {
        let mut inner = CMapDerivedMap::new();
        inner.code_points.push_mapping(CharCode::new(10, 2), vec!['x']);
        inner.code_points.push_mapping(CharCode::new(12, 2), vec!['y']);
        let map = EncodingMapKind::CMapDerived(inner);
        let code = CharCode::new(11, 2);
        assert_eq!(map.try_get_cid(code), Some(1));
    }

    #[test]
    fn dummy_map_fails_every_operation() {
        let map = EncodingMapKind::Dummy(DummyMap);
        assert!(map.try_get_next_char_code(b"A").is_none());
        assert!(map.try_get_char_code('A').is_none());
    }

    #[test]
    fn one_byte_to_unicode_cmap_uses_a_single_bfrange() {
        let map = EncodingMapKind::OneByte(OneByteMap::new(PredefinedEncoding::WinAnsi));
        let limits = map.limits();
        let bytes = render_bfrange_span(limits.max_code_size.max(1), limits.first_char, limits.last_char, |v| {
            map.try_get_code_points(CharCode::new(v, limits.max_code_size.max(1)))
        });
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.matches("beginbfrange").count(), 1);
        assert!(!text.contains("beginbfchar"));
    }

    #[test]
    fn bfchar_emission_chunks_every_hundred_entries() {
        let mut inner = CMapDerivedMap::new();
        let entries: Vec<(CharCode, Vec<CodePoint>)> = (0..250)
            .map(|i| (CharCode::new(i, 2), vec![char::from_u32(0x41 + (i % 26)).unwrap()]))
            .collect();
        for (code, cps) in &entries {
            inner.code_points.push_mapping(*code, cps.clone());
        }
        let bytes = render_bfchar_chunked(2, &entries);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.matches("beginbfchar").count(), 3);
        assert!(text.contains("100 beginbfchar"));
        assert!(text.contains("50 beginbfchar"));
    }
}
