//! The [`FontMetrics`] capability: the interface through which
//! [`crate::encoding::Encoding`] reaches font-program data without this
//! crate parsing TrueType/Type1/OpenType itself.

use crate::error::PdfResult;
use crate::value::CodePoint;

/// A font-file-internal glyph ordinal.
pub type GlyphId = u32;

/// Glyph lookup and subsetting, implemented by an external font-parsing
/// collaborator. No concrete implementation ships in this crate.
pub trait FontMetrics {
    /// The glyph a Unicode code point maps to, if the font has one.
    fn glyph_index_for_codepoint(&self, cp: CodePoint) -> Option<GlyphId>;
    /// A glyph's advance width in glyph-space units.
    fn glyph_width(&self, gid: GlyphId) -> f64;
    /// Restrict the embedded font program to exactly these glyphs.
    fn subset_glyphs(&self, gids: &[GlyphId]) -> PdfResult<()>;
}
