//! [`CharCode`] and [`CharCodeMap`]: the bidirectional code-unit ↔
//! code-point table underlying every [`crate::encoding_map::EncodingMapKind`]
//! variant that isn't a flat 256-entry table.
//!
//! Grounded on `PdfCharCodeMap.h`'s `CUMap` forward hash map plus a
//! `CPMapNode` binary tree keyed on the first code point, chaining into a
//! nested "ligatures" subtree for multi-code-point sequences (so `"ffi"`
//! resolves as one char code via longest match rather than three).

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

/// A 1-4 byte character code read from a content stream or CMap range.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct CharCode {
    /// The numeric code value.
    pub code: u32,
    /// The width in bytes this code was (or should be) lexed as.
    pub size: u8,
}

impl CharCode {
    /// Construct a code of the given byte width.
    pub fn new(code: u32, size: u8) -> Self {
        Self { code, size }
    }

    /// Render as fixed-width hex of `size` bytes, e.g. `0041` for a 2-byte
    /// code of value `0x41`.
    pub fn to_hex(self) -> String {
        format!("{:0width$X}", self.code, width = (self.size as usize) * 2)
    }
}

/// The observed (or explicitly set) bounds of an encoding's codespace.
/// The sentinel default is an inverted range so the first observation
/// always "wins" on both ends.
#[derive(Debug, Clone, Copy)]
pub struct EncodingLimits {
    /// Narrowest code-unit width seen.
    pub min_code_size: u8,
    /// Widest code-unit width seen.
    pub max_code_size: u8,
    /// Lowest code value seen.
    pub first_char: u32,
    /// Highest code value seen.
    pub last_char: u32,
}

impl Default for EncodingLimits {
    fn default() -> Self {
        Self { min_code_size: u8::MAX, max_code_size: 0, first_char: u32::MAX, last_char: 0 }
    }
}

impl EncodingLimits {
    /// Whether the range has been observed at least once and is coherent.
    pub fn is_valid(&self) -> bool {
        self.first_char <= self.last_char && self.min_code_size <= self.max_code_size
    }

    /// Widen the limits to include `code`, touching only the bound(s) it
    /// actually extends.
    pub fn observe(&mut self, code: CharCode) {
        self.observe_code_size(code.size);
        self.first_char = self.first_char.min(code.code);
        self.last_char = self.last_char.max(code.code);
    }

    /// Widen only the code-size bounds, leaving `first_char`/`last_char`
    /// untouched — used for `begincodespacerange` declarations, which
    /// constrain code width without implying any code was actually mapped.
    pub fn observe_code_size(&mut self, size: u8) {
        self.min_code_size = self.min_code_size.min(size);
        self.max_code_size = self.max_code_size.max(size);
    }
}

#[derive(Debug, Default)]
struct LigatureNode {
    code: Option<CharCode>,
    children: BTreeMap<char, LigatureNode>,
}

/// A bidirectional `CharCode <-> Vec<char>` table supporting ligatures.
#[derive(Debug, Default)]
pub struct CharCodeMap {
    forward: HashMap<CharCode, Vec<char>>,
    inverse_root: RefCell<BTreeMap<char, LigatureNode>>,
    inverse_dirty: Cell<bool>,
    limits: EncodingLimits,
}

impl CharCodeMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The observed codespace limits.
    pub fn limits(&self) -> EncodingLimits {
        self.limits
    }

    /// Add (or replace) a forward mapping, widening the limits and marking
    /// the inverse ligature tree stale.
    pub fn push_mapping(&mut self, code: CharCode, code_points: Vec<char>) {
        self.limits.observe(code);
        self.forward.insert(code, code_points);
        self.inverse_dirty.set(true);
    }

    /// Forward lookup: the code points a code maps to.
    pub fn get_code_points(&self, code: CharCode) -> Option<&[char]> {
        self.forward.get(&code).map(Vec::as_slice)
    }

    fn ensure_inverse_fresh(&self) {
        if !self.inverse_dirty.get() {
            return;
        }
        let mut root = self.inverse_root.borrow_mut();
        root.clear();
        for (code, cps) in &self.forward {
            if cps.is_empty() {
                continue;
            }
            let mut node = root.entry(cps[0]).or_default();
            for &cp in &cps[1..] {
                node = node.children.entry(cp).or_default();
            }
            node.code = Some(*code);
        }
        self.inverse_dirty.set(false);
    }

    /// Reverse lookup for an exact code-point sequence (a single code point
    /// or a ligature span).
    pub fn get_char_code_span(&self, code_points: &[char]) -> Option<CharCode> {
        self.ensure_inverse_fresh();
        if code_points.is_empty() {
            return None;
        }
        let root = self.inverse_root.borrow();
        let mut node = root.get(&code_points[0])?;
        for &cp in &code_points[1..] {
            node = node.children.get(&cp)?;
        }
        node.code
    }

    /// Consume code points from `chars`, longest-match style: descend the
    /// ligature tree as long as subsequent code points continue a known
    /// sequence, and back off to the longest complete match found. Returns
    /// the matched code plus how many code points were consumed.
    pub fn try_get_next_char_code(&self, chars: &[char]) -> Option<(CharCode, usize)> {
        self.ensure_inverse_fresh();
        if chars.is_empty() {
            return None;
        }
        let root = self.inverse_root.borrow();
        let mut node = root.get(&chars[0])?;
        let mut best = node.code.map(|c| (c, 1));
        let mut consumed = 1;
        while consumed < chars.len() {
            let Some(next) = node.children.get(&chars[consumed]) else { break };
            node = next;
            consumed += 1;
            if let Some(code) = node.code {
                best = Some((code, consumed));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bidirectional_round_trip() {
        let mut map = CharCodeMap::new();
        map.push_mapping(CharCode::new(0x41, 1), vec!['A']);
        assert_eq!(map.get_code_points(CharCode::new(0x41, 1)), Some(&['A'][..]));
        assert_eq!(map.get_char_code_span(&['A']), Some(CharCode::new(0x41, 1)));
    }

    #[test]
    fn ligature_longest_match_wins() {
        let mut map = CharCodeMap::new();
        map.push_mapping(CharCode::new(0xFB03, 2), vec!['f', 'f', 'i']);
        map.push_mapping(CharCode::new(0x66, 1), vec!['f']);
        let chars = ['f', 'f', 'i', 'x'];
        let (code, consumed) = map.try_get_next_char_code(&chars).unwrap();
        assert_eq!(code, CharCode::new(0xFB03, 2));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn limits_monotonicity() {
        let mut map = CharCodeMap::new();
        map.push_mapping(CharCode::new(0x20, 1), vec![' ']);
        let after_first = map.limits();
        map.push_mapping(CharCode::new(0x7E, 1), vec!['~']);
        let after_second = map.limits();
        assert_eq!(after_second.first_char, after_first.first_char);
        assert_eq!(after_second.last_char, 0x7E);
        assert_eq!(after_second.min_code_size, after_first.min_code_size);
        assert_eq!(after_second.max_code_size, after_first.max_code_size);
    }
}
