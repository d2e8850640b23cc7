use crate::buf::BufExt;
use crate::error::PdfResult;
use crate::value::Name;

use super::Filter;

/// `/ASCIIHexDecode`: pairs of hex digits terminated by `>`, whitespace
/// ignored between pairs, odd trailing digit padded with `0` (same padding
/// rule as hex string literals, per spec.md §6). A leftover odd nibble is
/// held across `decode_step` calls and resolved at `flush_decode`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiHexFilter {
    pending_nibble: Option<u8>,
}

impl Filter for AsciiHexFilter {
    fn name(&self) -> Name {
        Name::from_str("ASCIIHexDecode")
    }

    fn encode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() * 2);
        for &byte in input {
            out.push_hex(byte);
        }
        Ok(out)
    }

    fn flush_encode(&mut self) -> PdfResult<Vec<u8>> {
        Ok(vec![b'>'])
    }

    fn decode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() / 2);
        for &byte in input {
            if byte == b'>' {
                break;
            }
            let Some(d) = hex_digit(byte) else { continue };
            match self.pending_nibble.take() {
                Some(hi) => out.push((hi << 4) | d),
                None => self.pending_nibble = Some(d),
            }
        }
        Ok(out)
    }

    fn flush_decode(&mut self) -> PdfResult<Vec<u8>> {
        match self.pending_nibble.take() {
            Some(hi) => Ok(vec![hi << 4]),
            None => Ok(Vec::new()),
        }
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_hex_round_trip() {
        let mut filter = AsciiHexFilter::default();
        let data = b"Hello";
        let encoded = filter.encode(data).unwrap();
        let mut filter = AsciiHexFilter::default();
        let decoded = filter.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn odd_length_padded() {
        // "48656C6C6" is nine hex digits; the trailing lone "6" pads with a
        // "0" nibble, giving a final byte of 0x60, not a sixth "o".
        let decoded = AsciiHexFilter::default().decode(b"48656C6C6>").unwrap();
        assert_eq!(&decoded, b"Hell\x60");
    }

    #[test]
    fn odd_nibble_spans_decode_steps() {
        let mut filter = AsciiHexFilter::default();
        let mut out = filter.decode_step(b"48656C6C6").unwrap();
        out.extend(filter.decode_step(b">").unwrap());
        out.extend(filter.flush_decode().unwrap());
        assert_eq!(&out, b"Hell\x60");
    }
}
