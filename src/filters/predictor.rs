//! PNG-style predictor post-processing for `FlateDecode`/`LZWDecode`
//! streams, grounded on `decompress_predictor`/`png::decode_frame` from the
//! `lopdf` reference (`/DecodeParms` carrying `Predictor`, `Columns`,
//! `Colors`, `BitsPerComponent`).

/// The subset of `/DecodeParms` relevant to predictor undoing.
#[derive(Debug, Copy, Clone)]
pub struct PredictorParams {
    /// `/Predictor`. `1` = none, `2` = TIFF, `10..=15` = PNG (per-row tag
    /// byte selects the filter).
    pub predictor: i64,
    /// `/Columns`, sample count per row.
    pub columns: usize,
    /// `/Colors`, components per sample.
    pub colors: usize,
    /// `/BitsPerComponent`.
    pub bits_per_component: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self { predictor: 1, columns: 1, colors: 1, bits_per_component: 8 }
    }
}

impl PredictorParams {
    fn bytes_per_pixel(&self) -> usize {
        (self.colors * self.bits_per_component / 8).max(1)
    }

    fn row_bytes(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component + 7) / 8
    }

    /// Undo the predictor, if any (`predictor <= 1` is a no-op).
    pub fn decode(&self, data: &[u8]) -> Vec<u8> {
        if self.predictor <= 1 {
            return data.to_vec();
        }
        if self.predictor == 2 {
            return decode_tiff(data, self.row_bytes(), self.bytes_per_pixel());
        }
        decode_png(data, self.row_bytes(), self.bytes_per_pixel())
    }
}

fn decode_tiff(data: &[u8], row_bytes: usize, bpp: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    for row in out.chunks_mut(row_bytes) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    out
}

/// Each row in `data` is prefixed by a one-byte filter tag (0=None,
/// 1=Sub, 2=Up, 3=Average, 4=Paeth), per the PNG predictor scheme PDF
/// reuses for `Predictor` values 10-15.
fn decode_png(data: &[u8], row_bytes: usize, bpp: usize) -> Vec<u8> {
    let stride = row_bytes + 1;
    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_bytes];

    for chunk in data.chunks(stride) {
        if chunk.is_empty() {
            break;
        }
        let tag = chunk[0];
        let mut row = chunk[1..].to_vec();
        row.resize(row_bytes, 0);

        for i in 0..row.len() {
            let a = if i >= bpp { row[i - bpp] } else { 0 };
            let b = prev[i];
            let c = if i >= bpp { prev[i - bpp] } else { 0 };
            row[i] = match tag {
                0 => row[i],
                1 => row[i].wrapping_add(a),
                2 => row[i].wrapping_add(b),
                3 => row[i].wrapping_add(((a as u16 + b as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(a, b, c)),
                _ => row[i],
            };
        }

        out.extend_from_slice(&row);
        prev = row;
    }

    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i32, b as i32, c as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_none_filter_is_identity() {
        let row_bytes = 3;
        let data = [0u8, 10, 20, 30];
        let decoded = decode_png(&data, row_bytes, 1);
        assert_eq!(decoded, vec![10, 20, 30]);
    }

    #[test]
    fn png_sub_filter_accumulates() {
        let row_bytes = 3;
        let data = [1u8, 10, 5, 5];
        let decoded = decode_png(&data, row_bytes, 1);
        assert_eq!(decoded, vec![10, 15, 20]);
    }
}
