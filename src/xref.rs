//! [`XRef`] / [`XRefStream`]: the two on-disk forms of the cross-reference
//! section.
//!
//! Classic-table byte layout uses 20-byte entries (`0000000000 65535
//! f\r\n`); the stream form's field layout (`type: u8, variant: u32 BE,
//! generation: u16 BE`, `/W [1 4 2]`) follows the packed-record shape used
//! by `PdfXRefStream.cpp`.

use std::collections::BTreeMap;

use crate::buf::BufExt;
use crate::container::Dictionary;
use crate::device::OutputDevice;
use crate::error::{PdfError, PdfResult};
use crate::filters::{FilterChain, FilterKind};
use crate::value::{Name, Reference, Value};

/// One entry of the cross-reference table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum XRefEntry {
    /// A free slot, linking to the next free object number.
    Free { next_free_objnum: u32, gennum: u16 },
    /// A live object at a byte offset.
    InUse { offset: u64, gennum: u16 },
    /// An object packed into an object stream.
    Compressed { stream_objnum: u32, index_in_stream: u32 },
}

/// Decompose a set of object numbers into maximal contiguous runs — one
/// subsection per run, per the "any monotone decomposition" reading of the
/// open compaction question.
fn subsections(numbers: &[u32]) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut iter = numbers.iter().copied();
    let Some(mut start) = iter.next() else { return runs };
    let mut prev = start;
    for n in iter {
        if n == prev + 1 {
            prev = n;
            continue;
        }
        runs.push((start, prev - start + 1));
        start = n;
        prev = n;
    }
    runs.push((start, prev - start + 1));
    runs
}

/// The classic ASCII cross-reference table.
#[derive(Debug, Default)]
pub struct XRef {
    entries: BTreeMap<u32, (XRefEntry, Reference)>,
}

impl XRef {
    /// An empty table (the caller is expected to `add_in_use`/`add_free`
    /// the `(0, 65535)` free-list head itself, matching the explicit
    /// scenario named in spec.md §8).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live object's byte offset.
    pub fn add_in_use(&mut self, reference: Reference, offset: u64) {
        self.entries.insert(
            reference.object_number,
            (XRefEntry::InUse { offset, gennum: reference.generation }, reference),
        );
    }

    /// Record a free slot.
    pub fn add_free(&mut self, reference: Reference, next_free_objnum: u32) {
        self.entries.insert(
            reference.object_number,
            (XRefEntry::Free { next_free_objnum, gennum: reference.generation }, reference),
        );
    }

    /// Whether `should_skip_write` would exclude this object number (the
    /// classic table never owns its own describing object, unlike the
    /// stream form, so this always returns `false`).
    pub fn should_skip_write(&self, _reference: Reference) -> bool {
        false
    }

    /// Emit `xref\n<subsections>\ntrailer\n<<...>>\nstartxref\n<offset>\n%%EOF\n`.
    /// Returns the byte offset the section itself started at (the value a
    /// caller records as `startxref` on a later incremental update).
    pub fn write(&self, device: &mut dyn OutputDevice, trailer: &Dictionary) -> PdfResult<u64> {
        let xref_offset = device.tell();
        let numbers: Vec<u32> = self.entries.keys().copied().collect();
        let mut buf = Vec::new();
        buf.push_bytes(b"xref\n");
        for (first, count) in subsections(&numbers) {
            buf.push_int(first as i64);
            buf.push(b' ');
            buf.push_int(count as i64);
            buf.push(b'\n');
            for n in first..first + count {
                let (entry, _) = self.entries.get(&n).expect("contiguous run");
                match *entry {
                    XRefEntry::Free { next_free_objnum, gennum } => {
                        buf.push_int_aligned(next_free_objnum as i64, 10);
                        buf.push(b' ');
                        buf.push_int_aligned(gennum as i64, 5);
                        buf.push_bytes(b" f\r\n");
                    }
                    XRefEntry::InUse { offset, gennum } => {
                        buf.push_int_aligned(offset as i64, 10);
                        buf.push(b' ');
                        buf.push_int_aligned(gennum as i64, 5);
                        buf.push_bytes(b" n\r\n");
                    }
                    XRefEntry::Compressed { .. } => {
                        return Err(PdfError::InternalLogic(
                            "compressed entries require the xref stream form",
                        ));
                    }
                }
            }
        }
        buf.push_bytes(b"trailer\n");
        trailer.write_to_buf(&mut buf);
        buf.push_bytes(b"\nstartxref\n");
        buf.push_int(xref_offset as i64);
        buf.push_bytes(b"\n%%EOF\n");
        device.write(&buf)?;
        Ok(xref_offset)
    }

    /// Parse a previously written classic table back into entries, for the
    /// round-trip test named in spec.md §8.
    pub fn parse(text: &str) -> PdfResult<Self> {
        let mut xref = Self::new();
        let mut lines = text.lines();
        let header = lines.next().ok_or(PdfError::NoXRef)?;
        if header.trim() != "xref" {
            return Err(PdfError::NoXRef);
        }
        loop {
            let Some(subsection_header) = lines.next() else { break };
            let subsection_header = subsection_header.trim();
            if subsection_header.is_empty() || subsection_header == "trailer" {
                break;
            }
            let mut parts = subsection_header.split_whitespace();
            let first: u32 = parts.next().ok_or(PdfError::NoXRef)?.parse().map_err(|_| PdfError::NoNumber(subsection_header.into()))?;
            let count: u32 = parts.next().ok_or(PdfError::NoXRef)?.parse().map_err(|_| PdfError::NoNumber(subsection_header.into()))?;
            for i in 0..count {
                let line = lines.next().ok_or(PdfError::UnexpectedEof)?;
                let mut fields = line.split_whitespace();
                let a: u64 = fields.next().ok_or(PdfError::InvalidXRefStream { reason: "missing field" })?.parse().map_err(|_| PdfError::InvalidXRefStream { reason: "non-numeric field" })?;
                let gen: u16 = fields.next().ok_or(PdfError::InvalidXRefStream { reason: "missing generation" })?.parse().map_err(|_| PdfError::InvalidXRefStream { reason: "non-numeric generation" })?;
                let kind = fields.next().ok_or(PdfError::InvalidXRefStream { reason: "missing type" })?;
                let object_number = first + i;
                let reference = Reference::new(object_number, gen);
                match kind {
                    "n" => xref.add_in_use(reference, a),
                    "f" => xref.add_free(reference, a as u32),
                    _ => return Err(PdfError::InvalidXRefStream { reason: "unknown entry type" }),
                }
            }
        }
        Ok(xref)
    }

    /// The entries currently recorded, for test assertions.
    pub fn entries(&self) -> impl Iterator<Item = (Reference, XRefEntry)> + '_ {
        self.entries.values().map(|(entry, reference)| (*reference, *entry))
    }
}

/// The Flate-compressed cross-reference stream form.
#[derive(Debug, Default)]
pub struct XRefStream {
    entries: BTreeMap<u32, (XRefEntry, Reference)>,
    self_reference: Option<Reference>,
}

impl XRefStream {
    /// An empty stream-form table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the reference this stream will be written under, so
    /// [`Self::should_skip_write`] can exclude it from a generic
    /// dirty-object write pass.
    pub fn set_self_reference(&mut self, reference: Reference) {
        self.self_reference = Some(reference);
    }

    /// Record a live object's byte offset.
    pub fn add_in_use(&mut self, reference: Reference, offset: u64) {
        self.entries.insert(
            reference.object_number,
            (XRefEntry::InUse { offset, gennum: reference.generation }, reference),
        );
    }

    /// Record a free slot.
    pub fn add_free(&mut self, reference: Reference, next_free_objnum: u32) {
        self.entries.insert(
            reference.object_number,
            (XRefEntry::Free { next_free_objnum, gennum: reference.generation }, reference),
        );
    }

    /// Record an object packed into an object stream.
    pub fn add_compressed(&mut self, reference: Reference, stream_objnum: u32, index_in_stream: u32) {
        self.entries.insert(
            reference.object_number,
            (XRefEntry::Compressed { stream_objnum, index_in_stream }, reference),
        );
    }

    /// The xref stream owns the object describing itself; a caller walking
    /// "objects to write normally" (e.g. [`crate::object_store::ObjectStore::write_dirty`])
    /// must skip this reference once it has been set via
    /// [`Self::set_self_reference`], so the generic write loop doesn't also
    /// serialize the dictionary [`Self::write`] already wrote directly.
    pub fn should_skip_write(&self, reference: Reference) -> bool {
        self.self_reference == Some(reference)
    }

    /// Serialize as `N G obj\n<< /Type /XRef /W [1 4 2] ... >>\nstream\n...
    /// \nendstream\nendobj\n` directly to `device` (the xref stream is
    /// self-describing, so it is not routed through [`crate::object::Object`]).
    pub fn write(
        &self,
        device: &mut dyn OutputDevice,
        reference: Reference,
        mut trailer_extra: Dictionary,
    ) -> PdfResult<u64> {
        let xref_offset = device.tell();
        let numbers: Vec<u32> = self.entries.keys().copied().collect();
        let mut body = Vec::new();
        let mut index = Vec::new();
        for (first, count) in subsections(&numbers) {
            index.push(first);
            index.push(count);
            for n in first..first + count {
                let (entry, _) = self.entries.get(&n).expect("contiguous run");
                let (ty, variant, generation): (u8, u32, u16) = match *entry {
                    XRefEntry::Free { next_free_objnum, gennum } => (0, next_free_objnum, gennum),
                    XRefEntry::InUse { offset, gennum } => (1, offset as u32, gennum),
                    XRefEntry::Compressed { stream_objnum, index_in_stream } => {
                        (2, stream_objnum, index_in_stream as u16)
                    }
                };
                body.push(ty);
                body.extend_from_slice(&variant.to_be_bytes());
                body.extend_from_slice(&generation.to_be_bytes());
            }
        }
        let mut chain = FilterChain::new();
        chain.push(FilterKind::FlateDecode);
        let encoded = chain.encode(&body)?;

        trailer_extra.set(Name::from_str("Type"), crate::container::direct(Value::Name(Name::from_str("XRef"))));
        trailer_extra.set(
            Name::from_str("W"),
            crate::container::direct(Value::Array(
                [1i64, 4, 2]
                    .into_iter()
                    .map(|n| crate::container::direct(Value::Integer(n)))
                    .collect(),
            )),
        );
        trailer_extra.set(
            Name::from_str("Index"),
            crate::container::direct(Value::Array(
                index.into_iter().map(|n| crate::container::direct(Value::Integer(n as i64))).collect(),
            )),
        );
        chain.sync_dict(&mut trailer_extra, true);
        trailer_extra.set(Name::from_str("Length"), crate::container::direct(Value::Integer(encoded.len() as i64)));

        let mut buf = Vec::new();
        buf.push_int(reference.object_number as i64);
        buf.push(b' ');
        buf.push_int(reference.generation as i64);
        buf.push_bytes(b" obj\n");
        trailer_extra.write_to_buf(&mut buf);
        buf.push_bytes(b"\nstream\n");
        buf.extend_from_slice(&encoded);
        buf.push_bytes(b"\nendstream\nendobj\n");
        device.write(&buf)?;
        Ok(xref_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_single_subsection() {
        let mut xref = XRef::new();
        xref.add_free(Reference::new(0, 65535), 0);
        xref.add_in_use(Reference::new(1, 0), 15);
        xref.add_in_use(Reference::new(2, 0), 60);
        xref.add_in_use(Reference::new(3, 0), 120);

        let mut device = crate::device::MemoryOutput::new();
        let trailer = Dictionary::new();
        xref.write(&mut device, &trailer).unwrap();
        let text = String::from_utf8(device.into_inner()).unwrap();
        assert!(text.starts_with("xref\n0 4\n"));
        assert!(text.contains("0000000000 65535 f\r\n"));
        assert!(text.contains("0000000015 00000 n\r\n"));
    }

    #[test]
    fn classic_round_trips_through_parse() {
        let mut xref = XRef::new();
        xref.add_free(Reference::new(0, 65535), 0);
        xref.add_in_use(Reference::new(1, 0), 15);
        xref.add_in_use(Reference::new(2, 0), 60);

        let mut device = crate::device::MemoryOutput::new();
        xref.write(&mut device, &Dictionary::new()).unwrap();
        let text = String::from_utf8(device.into_inner()).unwrap();
        let xref_section = text.split("trailer").next().unwrap();
        let parsed = XRef::parse(xref_section).unwrap();
        let original: Vec<_> = xref.entries().collect();
        let round_tripped: Vec<_> = parsed.entries().collect();
        assert_eq!(original.len(), round_tripped.len());
    }

    #[test]
    fn non_contiguous_numbers_split_into_subsections() {
        let numbers = vec![0, 1, 2, 5, 6, 9];
        assert_eq!(subsections(&numbers), vec![(0, 3), (5, 2), (9, 1)]);
    }

    #[test]
    fn xref_stream_skips_only_its_own_reference() {
        let mut stream = XRefStream::new();
        let own = Reference::new(7, 0);
        stream.set_self_reference(own);
        assert!(stream.should_skip_write(own));
        assert!(!stream.should_skip_write(Reference::new(8, 0)));
    }

    #[test]
    fn xref_stream_skips_nothing_before_self_reference_is_set() {
        let stream = XRefStream::new();
        assert!(!stream.should_skip_write(Reference::new(7, 0)));
    }

    #[test]
    fn classic_table_never_skips_a_reference() {
        let xref = XRef::new();
        assert!(!xref.should_skip_write(Reference::new(1, 0)));
    }
}
