use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::PdfResult;

use super::Filter;
use crate::value::Name;

/// `/FlateDecode`, grounded on `lopdf`'s `decompress_zlib`/`compress`
/// (`flate2`'s streaming `Zlib{En,De}coder`). The encoder is kept alive
/// across a whole append session so repeated `append()` calls extend one
/// continuous zlib stream instead of each starting and finishing its own.
#[derive(Default)]
pub struct FlateFilter {
    encoder: Option<ZlibEncoder<Vec<u8>>>,
    decode_buf: Vec<u8>,
}

impl std::fmt::Debug for FlateFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlateFilter")
            .field("encoding", &self.encoder.is_some())
            .field("decode_buf_len", &self.decode_buf.len())
            .finish()
    }
}

impl Filter for FlateFilter {
    fn name(&self) -> Name {
        Name::from_str("FlateDecode")
    }

    fn encode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        let encoder = self.encoder.get_or_insert_with(|| ZlibEncoder::new(Vec::new(), Compression::default()));
        encoder.write_all(input)?;
        Ok(std::mem::take(encoder.get_mut()))
    }

    fn flush_encode(&mut self) -> PdfResult<Vec<u8>> {
        let encoder = self.encoder.take().unwrap_or_else(|| ZlibEncoder::new(Vec::new(), Compression::default()));
        Ok(encoder.finish()?)
    }

    fn decode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        self.decode_buf.extend_from_slice(input);
        Ok(Vec::new())
    }

    fn flush_decode(&mut self) -> PdfResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.decode_buf.len() * 2);
        if !self.decode_buf.is_empty() {
            ZlibDecoder::new(self.decode_buf.as_slice()).read_to_end(&mut out)?;
        }
        self.decode_buf.clear();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flate_round_trip() {
        let mut filter = FlateFilter::default();
        let data = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let encoded = filter.encode(&data).unwrap();
        let mut filter = FlateFilter::default();
        let decoded = filter.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn multi_chunk_session_is_one_continuous_stream() {
        let mut encoder = FlateFilter::default();
        let mut encoded = encoder.encode_step(b"hello ").unwrap();
        encoded.extend(encoder.encode_step(b"world").unwrap());
        encoded.extend(encoder.flush_encode().unwrap());

        let mut decoder = FlateFilter::default();
        let decoded = decoder.decode(&encoded).unwrap();
        assert_eq!(decoded, b"hello world");
    }
}
