use std::io::{Cursor, Write};
use byteorder::{LittleEndian, ReadBytesExt};

use super::constants::{CHAN_ADC, CHAN_ADC_SWAP, COLUMNS_PER_ROW};

/// Width in bytes of one sample on the given acquisition channel
pub fn sample_width(channel: u32) -> usize {
    if channel == CHAN_ADC || channel == CHAN_ADC_SWAP {
        2
    } else {
        4
    }
}

/// # Curve
/// Raw samples of one acquisition. Samples are interleaved by antenna (A, B, C, D), so every
/// row holds four values. Raw ADC channels carry 16-bit samples, every processed channel 32-bit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    pub rows: Vec<[i32; COLUMNS_PER_ROW]>
}

impl Curve {

    /// Decode little-endian samples. Bytes that do not complete a row are dropped.
    pub fn decode(channel: u32, raw: &[u8]) -> Result<Self, std::io::Error> {
        let width = sample_width(channel);
        let row_bytes = width * COLUMNS_PER_ROW;
        let mut rows: Vec<[i32; COLUMNS_PER_ROW]> = Vec::with_capacity(raw.len() / row_bytes);

        for chunk in raw.chunks_exact(row_bytes) {
            let mut cursor = Cursor::new(chunk);
            let mut row = [0i32; COLUMNS_PER_ROW];
            for value in row.iter_mut() {
                *value = match width {
                    2 => cursor.read_i16::<LittleEndian>()? as i32,
                    _ => cursor.read_i32::<LittleEndian>()?
                };
            }
            rows.push(row);
        }

        Ok(Curve { rows })
    }

    pub fn num_samples(&self) -> usize {
        self.rows.len()
    }

    /// One row per line, each value right-aligned in 8 characters, as the client prints them
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        for row in self.rows.iter() {
            writeln!(writer, "{:8}\t {:8}\t {:8}\t {:8}", row[0], row[1], row[2], row[3])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acq::constants::CHAN_TBT_AMP;

    fn adc_bytes() -> Vec<u8> {
        let samples: [i16; 9] = [1, -2, 300, -4000, 5, 6, 7, 8, 99];
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn adc_channels_are_16_bit() {
        let curve = Curve::decode(CHAN_ADC, &adc_bytes()).unwrap();
        assert_eq!(curve.num_samples(), 2);
        assert_eq!(curve.rows[0], [1, -2, 300, -4000]);
        assert_eq!(curve.rows[1], [5, 6, 7, 8]);
    }

    #[test]
    fn processed_channels_are_32_bit() {
        let samples: [i32; 4] = [100_000, -1, 0, i32::MIN];
        let raw: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let curve = Curve::decode(CHAN_TBT_AMP, &raw).unwrap();
        assert_eq!(curve.rows, vec![samples]);
    }

    #[test]
    fn text_output_matches_client_layout() {
        let curve = Curve::decode(CHAN_ADC_SWAP, &adc_bytes()).unwrap();
        let mut out: Vec<u8> = Vec::new();
        curve.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next().unwrap(), "       1\t       -2\t      300\t    -4000");
        assert_eq!(text.lines().count(), 2);
    }
}
