/*!
The object store, cross-reference, stream and character-encoding core of a
PDF engine.

This crate does not build a page tree or a content stream; it gives you the
pieces underneath that: a [`value::Value`] model shared by parsed and
freshly-constructed documents, an [`object_store::ObjectStore`] that owns
indirect objects and their free list, [`stream::Stream`] with a pluggable
[`filters::FilterChain`], classic and cross-reference-stream serialization in
[`xref`], and the character-code/encoding subsystem (`char_code`,
`encoding_map`, `encoding`, `cmap_parser`) a font needs to move between bytes
on the wire, code points, and CIDs.

Encryption ([`encrypt::Encrypt`]) and font-program introspection
([`font_metrics::FontMetrics`]) are modeled as traits only — this crate
provides the interface a collaborator implements, not a cipher or a
TrueType/Type1 parser.
*/

#![deny(missing_docs)]

mod buf;
mod char_code;
mod cmap_parser;
mod container;
mod device;
mod encoding;
mod encoding_map;
mod encrypt;
mod error;
mod filters;
mod font_metrics;
mod glyph_list;
mod object;
mod object_store;
mod predefined_tables;
mod stream;
mod tokenizer;
mod value;
mod xref;

pub use char_code::{CharCode, CharCodeMap, EncodingLimits};
pub use cmap_parser::parse_cmap;
pub use container::{direct, Array, Dictionary};
pub use device::{FileOutput, InputDevice, MemoryOutput, OutputDevice};
pub use encoding::{ConvertInput, Encoding, ExportFlags};
pub use encoding_map::{
    Cid, CMapDerivedMap, DifferenceMap, DummyMap, EncodingMapKind, IdentityMap, OneByteMap,
    PredefinedEncoding, Type1FontProgramMap,
};
pub use encrypt::Encrypt;
pub use error::{PdfError, PdfResult};
pub use filters::{Filter, FilterChain, FilterKind};
pub use font_metrics::{FontMetrics, GlyphId};
pub use object::{DelayedLoad, Object, ValueMut, WeakObject};
pub use object_store::{ObjectStore, ObjectStoreHandle, MAX_OBJECT_COUNT};
pub use stream::Stream;
pub use value::{CodePoint, Name, Reference, StringPresentation, StringVal, Value};
pub use xref::{XRef, XRefEntry, XRefStream};
