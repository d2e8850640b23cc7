use weezl::decode::Decoder;
use weezl::encode::Encoder;
use weezl::BitOrder;

use crate::error::PdfResult;
use crate::value::Name;

use super::Filter;

const MIN_BITS: u8 = 9;

/// `/LZWDecode`, grounded on `lopdf`'s `decompress_lzw`/`compress` (`weezl`
/// MSB-first codes, `EarlyChange` defaulting to `true`). `weezl`'s encoder
/// and decoder only expose a whole-buffer `encode_all`/`decode_all`, so a
/// session's bytes are buffered across `*_step` calls and run through the
/// codec once, at `flush_*` — one LZW stream per session either way, not
/// one restarted per `append()`.
#[derive(Debug, Clone)]
pub struct LzwFilter {
    /// Whether codes shrink one early (PDF's historical default, `true`).
    pub early_change: bool,
    encode_buf: Vec<u8>,
    decode_buf: Vec<u8>,
}

impl Default for LzwFilter {
    fn default() -> Self {
        Self { early_change: true, encode_buf: Vec::new(), decode_buf: Vec::new() }
    }
}

impl Filter for LzwFilter {
    fn name(&self) -> Name {
        Name::from_str("LZWDecode")
    }

    fn encode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        self.encode_buf.extend_from_slice(input);
        Ok(Vec::new())
    }

    fn flush_encode(&mut self) -> PdfResult<Vec<u8>> {
        let mut encoder = if self.early_change {
            Encoder::with_tiff_size_switch(BitOrder::Msb, MIN_BITS - 1)
        } else {
            Encoder::new(BitOrder::Msb, MIN_BITS - 1)
        };
        let mut out = Vec::new();
        encoder
            .into_stream(&mut out)
            .encode_all(&self.encode_buf)
            .status
            .map_err(|e| crate::error::PdfError::InvalidStream(e.to_string()))?;
        self.encode_buf.clear();
        Ok(out)
    }

    fn decode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        self.decode_buf.extend_from_slice(input);
        Ok(Vec::new())
    }

    fn flush_decode(&mut self) -> PdfResult<Vec<u8>> {
        let mut decoder = if self.early_change {
            Decoder::with_tiff_size_switch(BitOrder::Msb, MIN_BITS - 1)
        } else {
            Decoder::new(BitOrder::Msb, MIN_BITS - 1)
        };
        let mut out = Vec::new();
        let result = decoder.into_stream(&mut out).decode_all(&self.decode_buf);
        if let Err(err) = result.status {
            log::warn!("{err}");
        }
        self.decode_buf.clear();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lzw_round_trip() {
        let mut filter = LzwFilter::default();
        let data = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let encoded = filter.encode(&data).unwrap();
        let mut filter = LzwFilter::default();
        let decoded = filter.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn multi_chunk_session_produces_one_stream() {
        let mut encoder = LzwFilter::default();
        encoder.encode_step(b"hello ").unwrap();
        encoder.encode_step(b"world").unwrap();
        let encoded = encoder.flush_encode().unwrap();

        let mut decoder = LzwFilter::default();
        let decoded = decoder.decode(&encoded).unwrap();
        assert_eq!(decoded, b"hello world");
    }
}
