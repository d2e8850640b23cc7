use crate::error::{PdfError, PdfResult};
use crate::value::Name;

use super::Filter;

/// `/ASCII85Decode`, grounded on `lopdf`'s `decode_ascii85` (the `z`
/// all-zero-group shortcut, `~>` end marker, base-85 group packing).
/// Buffers a partial trailing group across `encode_step` calls and a
/// partial trailing digit-run across `decode_step` calls, so a session
/// split across several `append()` calls still produces the same bytes as
/// one whole-buffer call.
#[derive(Debug, Default)]
pub struct Ascii85Filter {
    encode_pending: Vec<u8>,
    decode_buffer: u32,
    decode_count: usize,
    decode_done: bool,
}

impl Filter for Ascii85Filter {
    fn name(&self) -> Name {
        Name::from_str("ASCII85Decode")
    }

    fn encode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        self.encode_pending.extend_from_slice(input);
        let mut out = Vec::new();
        while self.encode_pending.len() >= 4 {
            let chunk: Vec<u8> = self.encode_pending.drain(..4).collect();
            encode_group(&chunk, &mut out);
        }
        Ok(out)
    }

    fn flush_encode(&mut self) -> PdfResult<Vec<u8>> {
        let mut out = Vec::new();
        if !self.encode_pending.is_empty() {
            let chunk = std::mem::take(&mut self.encode_pending);
            encode_group(&chunk, &mut out);
        }
        out.extend_from_slice(b"~>");
        Ok(out)
    }

    fn decode_step(&mut self, input: &[u8]) -> PdfResult<Vec<u8>> {
        if self.decode_done {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for &ch in input {
            if ch == b'z' {
                if self.decode_count != 0 {
                    return Err(PdfError::InvalidStream(
                        "'z' shortcut inside an ASCII85 group".into(),
                    ));
                }
                out.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            if ch.is_ascii_whitespace() {
                continue;
            }
            if !(b'!'..=b'u').contains(&ch) {
                self.decode_done = true;
                break;
            }
            self.decode_buffer = self
                .decode_buffer
                .checked_mul(85)
                .ok_or_else(|| PdfError::InvalidStream("ASCII85 overflow".into()))?;
            self.decode_buffer += (ch - b'!') as u32;
            self.decode_count += 1;
            if self.decode_count == 5 {
                out.extend_from_slice(&self.decode_buffer.to_be_bytes());
                self.decode_buffer = 0;
                self.decode_count = 0;
            }
        }
        Ok(out)
    }

    fn flush_decode(&mut self) -> PdfResult<Vec<u8>> {
        if !self.decode_done {
            log::warn!("ASCII85 stream is missing its EOD marker");
        }
        let mut out = Vec::new();
        if self.decode_count > 0 {
            for _ in self.decode_count..5 {
                self.decode_buffer = self
                    .decode_buffer
                    .checked_mul(85)
                    .ok_or_else(|| PdfError::InvalidStream("ASCII85 overflow".into()))?;
                self.decode_buffer += 84;
            }
            let bytes = self.decode_buffer.to_be_bytes();
            out.extend_from_slice(&bytes[..self.decode_count - 1]);
            self.decode_count = 0;
        }
        Ok(out)
    }
}

fn encode_group(chunk: &[u8], out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    buf[..chunk.len()].copy_from_slice(chunk);
    let value = u32::from_be_bytes(buf);
    if chunk.len() == 4 && value == 0 {
        out.push(b'z');
        return;
    }
    let mut digits = [0u8; 5];
    let mut v = value;
    for d in digits.iter_mut().rev() {
        *d = (v % 85) as u8;
        v /= 85;
    }
    let take = chunk.len() + 1;
    for &d in &digits[..take] {
        out.push(d + b'!');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii85_round_trip() {
        let mut filter = Ascii85Filter::default();
        let data = b"Man is distinguished, not only by his reason";
        let encoded = filter.encode(data).unwrap();
        let mut filter = Ascii85Filter::default();
        let decoded = filter.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn ascii85_zero_group_shortcut() {
        let decoded = Ascii85Filter::default().decode(b"z~>").unwrap();
        assert_eq!(decoded, vec![0, 0, 0, 0]);
    }

    #[test]
    fn multi_chunk_session_matches_whole_buffer_encode() {
        let data = b"Man is distinguished, not only by his reason";
        let mut whole = Ascii85Filter::default();
        let expected = whole.encode(data).unwrap();

        let mut chunked = Ascii85Filter::default();
        let mut out = chunked.encode_step(&data[..10]).unwrap();
        out.extend(chunked.encode_step(&data[10..]).unwrap());
        out.extend(chunked.flush_encode().unwrap());
        assert_eq!(out, expected);
    }
}
