//! [`Stream`]: a typed byte payload attached to a dictionary object.

use crate::device::OutputDevice;
use crate::error::{PdfError, PdfResult};
use crate::filters::{FilterChain, FilterKind, Filter};
use crate::object::WeakObject;
use crate::value::Name;

/// Where a stream's encoded bytes live while being written.
enum Backing {
    /// Buffered in RAM; supports arbitrary re-reads and copies.
    Memory(Vec<u8>),
    /// Written directly to an `OutputDevice` as it is appended; the final
    /// length is only known after `end_append`.
    File { device: Box<dyn OutputDevice>, start: u64, written: u64 },
}

impl std::fmt::Debug for Backing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backing::Memory(bytes) => f.debug_tuple("Memory").field(&bytes.len()).finish(),
            Backing::File { written, .. } => f.debug_struct("File").field("written", written).finish(),
        }
    }
}

/// An open [`Stream::begin_append`] session. Dropping it without calling
/// [`Stream::end_append`] is a logic error (mirrors the RAII guard pattern
/// spec.md §9 calls for); `Stream` asserts at most one session is open.
///
/// `encoders` are built once, in `begin_append`, and carry their running
/// codec state across every `append()` call in this session — so the bytes
/// from several `append()` calls form one continuous encoded stream
/// instead of each call producing its own self-terminated one.
struct AppendSession {
    encoders: Vec<Box<dyn Filter>>,
    filters: FilterChain,
    delete_filters: bool,
}

impl std::fmt::Debug for AppendSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppendSession")
            .field("filters", &self.filters)
            .field("delete_filters", &self.delete_filters)
            .finish()
    }
}

/// A stream object: an opaque byte buffer plus the active filter chain.
/// Only one append session may be open at a time; a file-backed stream
/// additionally requires that no other file-backed stream in the document
/// is appending concurrently (enforced by the caller via
/// `ObjectStore::begin_append_stream`/`end_append_stream`).
#[derive(Debug)]
pub struct Stream {
    backing: Backing,
    filters: FilterChain,
    session: Option<AppendSession>,
    owner: Option<WeakObject>,
    encryption_overhead: usize,
}

impl Stream {
    /// A fresh, empty memory-backed stream.
    pub fn new() -> Self {
        Self {
            backing: Backing::Memory(Vec::new()),
            filters: FilterChain::new(),
            session: None,
            owner: None,
            encryption_overhead: 0,
        }
    }

    /// Wrap already-encoded bytes read back from disk, with a filter chain
    /// the caller has already determined from the dictionary's `/Filter`
    /// key (used by delayed loading; see [`crate::object::DelayedLoad`]).
    pub fn from_raw_existing(encoded: Vec<u8>) -> Self {
        Self {
            backing: Backing::Memory(encoded),
            filters: FilterChain::new(),
            session: None,
            owner: None,
            encryption_overhead: 0,
        }
    }

    pub(crate) fn attach_owner(&mut self, owner: WeakObject) {
        self.owner = Some(owner);
    }

    /// Atomically replace the stream's content, running `data` through
    /// `filters` (Flate by default when `filters` is empty).
    pub fn set(&mut self, data: &[u8], filters: Option<FilterChain>) -> PdfResult<()> {
        let chain = filters.unwrap_or_else(|| {
            let mut c = FilterChain::new();
            c.push(FilterKind::FlateDecode);
            c
        });
        let encoded = chain.encode(data)?;
        self.filters = chain;
        self.backing = Backing::Memory(encoded);
        self.sync_dict(true)?;
        Ok(())
    }

    /// Store `bytes` verbatim, asserting they already match the declared
    /// `/Filter` chain (no further encoding is applied).
    pub fn set_raw(&mut self, bytes: Vec<u8>) -> PdfResult<()> {
        self.backing = Backing::Memory(bytes);
        self.sync_dict(false)?;
        Ok(())
    }

    /// Open an append session. Exactly one session may be open at a time.
    pub fn begin_append(
        &mut self,
        filters: Option<FilterChain>,
        clear_existing: bool,
        delete_filters: bool,
    ) -> PdfResult<()> {
        assert!(self.session.is_none(), "a stream append session is already open");
        let chain = filters.unwrap_or_default();
        if clear_existing {
            self.backing = Backing::Memory(Vec::new());
        }
        self.filters = chain.clone();
        self.sync_dict(delete_filters)?;
        let encoders = chain.build_encoders()?;
        self.session = Some(AppendSession { encoders, filters: chain, delete_filters });
        Ok(())
    }

    /// Append bytes into the open session, encoding them through the
    /// active filter chain's running state.
    pub fn append(&mut self, bytes: &[u8]) -> PdfResult<()> {
        let session = self.session.as_mut().ok_or(PdfError::InternalLogic("append outside a session"))?;
        let encoded = crate::filters::encode_chunk(&mut session.encoders, bytes)?;
        match &mut self.backing {
            Backing::Memory(buf) => buf.extend_from_slice(&encoded),
            Backing::File { device, written, .. } => {
                device.write(&encoded)?;
                *written += encoded.len() as u64;
            }
        }
        Ok(())
    }

    /// Close the append session: flush every filter's remaining state,
    /// write its tail bytes, then resynchronize `/Length` (and `/Filter`,
    /// if it changed) on the owning dictionary.
    pub fn end_append(&mut self) -> PdfResult<()> {
        let mut session = self.session.take().ok_or(PdfError::InternalLogic("no open session"))?;
        let tail = crate::filters::flush_chain(&mut session.encoders)?;
        if !tail.is_empty() {
            match &mut self.backing {
                Backing::Memory(buf) => buf.extend_from_slice(&tail),
                Backing::File { device, written, .. } => {
                    device.write(&tail)?;
                    *written += tail.len() as u64;
                }
            }
        }
        self.filters = session.filters;
        self.sync_dict(session.delete_filters)?;
        Ok(())
    }

    /// Decode via the declared filter chain; returns raw bytes unchanged
    /// when no filters are declared.
    pub fn get_filtered_copy(&self) -> PdfResult<Vec<u8>> {
        if self.filters.is_empty() {
            return Ok(self.raw_bytes().to_vec());
        }
        self.filters.decode(self.raw_bytes())
    }

    /// The on-wire (encoded) length, including any installed encryption
    /// overhead.
    pub fn get_length(&self) -> usize {
        let body_len = match &self.backing {
            Backing::Memory(bytes) => bytes.len() as u64,
            Backing::File { written, .. } => *written,
        };
        body_len as usize + self.encryption_overhead
    }

    /// Install the per-object encryption length overhead (see
    /// `Encrypt::stream_length_overhead`); affects `/Length` accounting
    /// only, the actual encryption happens at write time.
    pub fn set_encryption_overhead(&mut self, overhead: usize) {
        self.encryption_overhead = overhead;
    }

    /// The bytes as currently stored on the wire (encoded form).
    pub fn encoded_bytes(&self) -> PdfResult<Vec<u8>> {
        Ok(self.raw_bytes().to_vec())
    }

    fn raw_bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Memory(bytes) => bytes,
            Backing::File { .. } => &[],
        }
    }

    fn sync_dict(&self, delete_filters: bool) -> PdfResult<()> {
        let Some(owner) = self.owner.as_ref().and_then(|w| w.upgrade()) else { return Ok(()) };
        let mut value = owner.value_mut()?;
        let dict = value.as_dict_mut()?;
        self.filters.sync_dict(dict, delete_filters);
        let length = self.get_length();
        dict.set(
            Name::from_str("Length"),
            crate::container::direct(crate::value::Value::Integer(length as i64)),
        );
        Ok(())
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_filtered_copy_round_trips() {
        let mut stream = Stream::new();
        let data = b"stream payload, compressed on write".to_vec();
        stream.set(&data, None).unwrap();
        assert_eq!(stream.get_filtered_copy().unwrap(), data);
    }

    #[test]
    fn append_session_state_machine() {
        let mut stream = Stream::new();
        stream.begin_append(None, true, true).unwrap();
        stream.append(b"hello ").unwrap();
        stream.append(b"world").unwrap();
        stream.end_append().unwrap();
        assert_eq!(stream.get_filtered_copy().unwrap(), b"hello world");
    }

    #[test]
    fn append_session_through_flate_is_one_continuous_stream() {
        let mut stream = Stream::new();
        let mut chain = FilterChain::new();
        chain.push(FilterKind::FlateDecode);
        stream.begin_append(Some(chain), true, true).unwrap();
        stream.append(b"hello ").unwrap();
        stream.append(b"world, this is more than one chunk").unwrap();
        stream.end_append().unwrap();
        assert_eq!(
            stream.get_filtered_copy().unwrap(),
            b"hello world, this is more than one chunk".to_vec()
        );
    }

    #[test]
    #[should_panic]
    fn double_append_session_panics() {
        let mut stream = Stream::new();
        stream.begin_append(None, true, true).unwrap();
        stream.begin_append(None, true, true).unwrap();
    }

    #[test]
    fn file_backed_length_counts_written_bytes() {
        let mut stream = Stream::new();
        stream.backing = Backing::File {
            device: Box::new(crate::device::MemoryOutput::new()),
            start: 0,
            written: 0,
        };
        stream.begin_append(None, false, true).unwrap();
        stream.append(b"twelve bytes").unwrap();
        stream.end_append().unwrap();
        assert_eq!(stream.get_length(), 12);
    }
}
