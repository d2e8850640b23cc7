//! The stream codec pipeline: [`Filter`], [`FilterKind`], [`FilterChain`].

mod ascii85;
mod ascii_hex;
mod flate;
mod lzw;
mod predictor;

pub use ascii85::Ascii85Filter;
pub use ascii_hex::AsciiHexFilter;
pub use flate::FlateFilter;
pub use lzw::LzwFilter;
pub use predictor::PredictorParams;

use crate::container::direct;
use crate::container::Dictionary;
use crate::error::{PdfError, PdfResult};
use crate::value::{Name, Value};

/// A byte-stream transducer plugged into a [`FilterChain`]. Concrete
/// compression algorithms (Flate, ASCIIHex, ASCII85, LZW) implement this;
/// image/fax codecs (`DCTDecode`, `JPXDecode`, `CCITTFaxDecode`,
/// `JBIG2Decode`) and `Crypt` are named but left to external collaborators
/// (out of scope per spec.md §1) and fail with `NotImplemented`.
///
/// `*_step` feeds one chunk through the filter's running state and returns
/// whatever output that state has produced so far (possibly none, for
/// codecs that buffer internally); `flush_*` drains and closes the state,
/// producing the final bytes. A stream append session calls `*_step` once
/// per `append()` and `flush_encode` once at `end_append`, so the whole
/// session's bytes form one continuous codec stream rather than one
/// restarted per call.
pub trait Filter {
    /// The `/Filter` name this implementation corresponds to.
    fn name(&self) -> Name;
    /// Feed a chunk into the encode state, returning output produced so far.
    fn encode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>>;
    /// Close the encode state, returning its final bytes.
    fn flush_encode(&mut self) -> PdfResult<Vec<u8>>;
    /// Feed a chunk into the decode state, returning output produced so far.
    fn decode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>>;
    /// Close the decode state, returning its final bytes.
    fn flush_decode(&mut self) -> PdfResult<Vec<u8>>;

    /// Whole-buffer convenience: step once over `input`, then flush.
    fn encode(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        let mut out = self.encode_step(input)?;
        out.extend(self.flush_encode()?);
        Ok(out)
    }
    /// Whole-buffer convenience: step once over `input`, then flush.
    fn decode(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        let mut out = self.decode_step(input)?;
        out.extend(self.flush_decode()?);
        Ok(out)
    }
}

/// Run one chunk through every stage of a built encoder pipeline in order,
/// threading each stage's step output into the next stage's step input.
pub(crate) fn encode_chunk(encoders: &mut [Box<dyn Filter>], bytes: &[u8]) -> PdfResult<Vec<u8>> {
    let mut data = bytes.to_vec();
    for filter in encoders.iter_mut() {
        data = filter.encode_step(&data)?;
    }
    Ok(data)
}

/// Close every stage of a built encoder pipeline in order: a stage's flush
/// tail is fed through every later stage's own step/flush before the next
/// stage closes, so the final bytes are one coherent tail end to end.
pub(crate) fn flush_chain(encoders: &mut [Box<dyn Filter>]) -> PdfResult<Vec<u8>> {
    let mut carry = Vec::new();
    for filter in encoders.iter_mut() {
        let mut out = filter.encode_step(&carry)?;
        out.extend(filter.flush_encode()?);
        carry = out;
    }
    Ok(carry)
}

/// The ten standard PDF filter names.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FilterKind {
    /// `/ASCIIHexDecode`.
    AsciiHexDecode,
    /// `/ASCII85Decode`.
    Ascii85Decode,
    /// `/LZWDecode`.
    LzwDecode,
    /// `/FlateDecode`.
    FlateDecode,
    /// `/RunLengthDecode`.
    RunLengthDecode,
    /// `/CCITTFaxDecode`.
    CcittFaxDecode,
    /// `/JBIG2Decode`.
    Jbig2Decode,
    /// `/DCTDecode`.
    DctDecode,
    /// `/JPXDecode`.
    JpxDecode,
    /// `/Crypt`.
    Crypt,
}

impl FilterKind {
    /// The `/Filter` name for this kind.
    pub fn name(self) -> Name {
        Name::from_str(match self {
            Self::AsciiHexDecode => "ASCIIHexDecode",
            Self::Ascii85Decode => "ASCII85Decode",
            Self::LzwDecode => "LZWDecode",
            Self::FlateDecode => "FlateDecode",
            Self::RunLengthDecode => "RunLengthDecode",
            Self::CcittFaxDecode => "CCITTFaxDecode",
            Self::Jbig2Decode => "JBIG2Decode",
            Self::DctDecode => "DCTDecode",
            Self::JpxDecode => "JPXDecode",
            Self::Crypt => "Crypt",
        })
    }

    /// Parse a `/Filter` name back into a kind.
    pub fn from_name(name: &Name) -> Option<Self> {
        Some(match name.as_bytes() {
            b"ASCIIHexDecode" => Self::AsciiHexDecode,
            b"ASCII85Decode" => Self::Ascii85Decode,
            b"LZWDecode" => Self::LzwDecode,
            b"FlateDecode" => Self::FlateDecode,
            b"RunLengthDecode" => Self::RunLengthDecode,
            b"CCITTFaxDecode" => Self::CcittFaxDecode,
            b"JBIG2Decode" => Self::Jbig2Decode,
            b"DCTDecode" => Self::DctDecode,
            b"JPXDecode" => Self::JpxDecode,
            b"Crypt" => Self::Crypt,
            _ => return None,
        })
    }

    fn build(self) -> Option<Box<dyn Filter>> {
        match self {
            Self::AsciiHexDecode => Some(Box::new(AsciiHexFilter::default())),
            Self::Ascii85Decode => Some(Box::new(Ascii85Filter::default())),
            Self::LzwDecode => Some(Box::new(LzwFilter::default())),
            Self::FlateDecode => Some(Box::new(FlateFilter::default())),
            _ => None,
        }
    }
}

/// A composable chain of filters. Encoding runs left to right (the order
/// filters were pushed); decoding runs right to left (undoing the most
/// recently applied filter first).
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    kinds: Vec<FilterKind>,
    /// Predictor parameters applied once after the whole chain has
    /// decoded, undoing the PNG/TIFF row-differencing some image streams
    /// layer on top of Flate/LZW (`/DecodeParms`).
    pub predictor: Option<PredictorParams>,
}

impl FilterChain {
    /// An empty chain (raw bytes pass through unchanged).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter to the end of the chain.
    pub fn push(&mut self, kind: FilterKind) -> &mut Self {
        self.kinds.push(kind);
        self
    }

    /// The filters in encode order.
    pub fn kinds(&self) -> &[FilterKind] {
        &self.kinds
    }

    /// Whether the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Build one fresh, stateful encoder per filter, left to right, ready
    /// to be driven across a multi-chunk session via [`encode_chunk`]/
    /// [`flush_chain`].
    pub(crate) fn build_encoders(&self) -> PdfResult<Vec<Box<dyn Filter>>> {
        self.kinds.iter().map(|k| k.build().ok_or(PdfError::NotImplemented("filter encode"))).collect()
    }

    /// Run the whole of `bytes` through every filter's encode state, left
    /// to right, in one shot.
    pub fn encode(&self, bytes: &[u8]) -> PdfResult<Vec<u8>> {
        let mut encoders = self.build_encoders()?;
        let mut data = encode_chunk(&mut encoders, bytes)?;
        data.extend(flush_chain(&mut encoders)?);
        Ok(data)
    }

    /// Run `bytes` through every filter's decode state, right to left, then
    /// undo the predictor if one is configured.
    pub fn decode(&self, bytes: &[u8]) -> PdfResult<Vec<u8>> {
        let mut data = bytes.to_vec();
        for kind in self.kinds.iter().rev() {
            let mut filter = kind.build().ok_or(PdfError::NotImplemented("filter decode"))?;
            data = filter.decode(&data)?;
        }
        if let Some(params) = &self.predictor {
            data = params.decode(&data);
        }
        Ok(data)
    }

    /// Synchronize the parent dictionary's `/Filter` key:
    /// 0 filters -> remove (if `delete_filters`), 1 -> `Name`, >=2 -> array
    /// of names preserving order.
    pub fn sync_dict(&self, dict: &mut Dictionary, delete_filters: bool) {
        let key = Name::from_str("Filter");
        match self.kinds.len() {
            0 => {
                if delete_filters {
                    dict.remove(&key);
                }
            }
            1 => {
                dict.set(key, direct(Value::Name(self.kinds[0].name())));
            }
            _ => {
                let array = self
                    .kinds
                    .iter()
                    .map(|k| direct(Value::Name(k.name())))
                    .collect::<crate::container::Array>();
                dict.set(key, direct(Value::Array(array)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_composes_in_order() {
        let mut chain = FilterChain::new();
        chain.push(FilterKind::AsciiHexDecode);
        chain.push(FilterKind::FlateDecode);
        let data = b"hello world, this is a filter chain test".repeat(3);
        let encoded = chain.encode(&data).unwrap();
        let decoded = chain.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn sync_dict_variants() {
        let mut dict = Dictionary::new();
        let mut chain = FilterChain::new();
        chain.sync_dict(&mut dict, true);
        assert!(dict.get(&Name::from_str("Filter")).is_none());

        chain.push(FilterKind::FlateDecode);
        chain.sync_dict(&mut dict, true);
        assert!(matches!(
            &*dict.get(&Name::from_str("Filter")).unwrap().value().unwrap(),
            Value::Name(_)
        ));

        chain.push(FilterKind::AsciiHexDecode);
        chain.sync_dict(&mut dict, true);
        assert!(matches!(
            &*dict.get(&Name::from_str("Filter")).unwrap().value().unwrap(),
            Value::Array(_)
        ));
    }
}
