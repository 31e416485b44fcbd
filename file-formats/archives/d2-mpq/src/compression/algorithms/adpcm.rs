//! IMA ADPCM decoder for Diablo II wave sectors
//!
//! Audio sectors are Huffman coded first and then ADPCM coded. The stream
//! starts with a pad byte and a shift byte, followed by one raw 16-bit sample
//! per channel. Every following byte is either a control byte (high bit set)
//! or a 7-bit delta for the current channel.

use crate::error::{Error, Result};

/// Maximum number of channels supported
const MAX_ADPCM_CHANNEL_COUNT: usize = 2;

/// Initial step index for every channel
const INITIAL_ADPCM_STEP_INDEX: usize = 0x2C;

/// Highest valid step index
const MAX_STEP_INDEX: usize = 0x58;

/// Table for determining the next step index
const NEXT_STEP_TABLE: [i8; 32] = [
    -1, 0, -1, 4, -1, 2, -1, 6, -1, 1, -1, 5, -1, 3, -1, 7, -1, 1, -1, 5, -1, 3, -1, 7, -1, 2, -1,
    4, -1, 6, -1, 8,
];

/// Step size table for ADPCM encoding/decoding
const STEP_SIZE_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408, 449,
    494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066, 2272,
    2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630, 9493,
    10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794, 32767,
];

/// Decompress a mono ADPCM stream into 16-bit little-endian PCM
pub(crate) fn decompress_mono(input: &[u8]) -> Result<Vec<u8>> {
    decompress_internal(input, 1)
}

/// Decompress an interleaved stereo ADPCM stream into 16-bit little-endian PCM
pub(crate) fn decompress_stereo(input: &[u8]) -> Result<Vec<u8>> {
    decompress_internal(input, 2)
}

fn decompress_internal(input: &[u8], channel_count: usize) -> Result<Vec<u8>> {
    if channel_count == 0 || channel_count > MAX_ADPCM_CHANNEL_COUNT {
        return Err(Error::compression(format!(
            "Invalid channel count: {channel_count}. \
             ADPCM supports 1-{MAX_ADPCM_CHANNEL_COUNT} channels"
        )));
    }

    let header_len = 2 + 2 * channel_count;
    if input.len() < header_len {
        return Err(Error::compression(format!(
            "ADPCM stream of {} bytes is shorter than its {header_len} byte header",
            input.len()
        )));
    }

    let bit_shift = input[1];
    let mut predicted = [0i32; MAX_ADPCM_CHANNEL_COUNT];
    let mut step_index = [INITIAL_ADPCM_STEP_INDEX; MAX_ADPCM_CHANNEL_COUNT];
    let mut output = Vec::with_capacity(input.len() * 4);

    for (channel, sample) in input[2..header_len].chunks_exact(2).enumerate() {
        let initial = i16::from_le_bytes([sample[0], sample[1]]);
        predicted[channel] = initial as i32;
        write_sample(&mut output, initial);
    }

    let stereo = channel_count == 2;
    let mut channel = channel_count - 1;

    for &value in &input[header_len..] {
        if stereo {
            channel = 1 - channel;
        }

        if value & 0x80 != 0 {
            match value & 0x7F {
                0 => {
                    step_index[channel] = step_index[channel].saturating_sub(1);
                    write_sample(&mut output, predicted[channel] as i16);
                }
                1 => {
                    step_index[channel] = (step_index[channel] + 8).min(MAX_STEP_INDEX);
                    if stereo {
                        channel = 1 - channel;
                    }
                }
                2 => {}
                _ => {
                    step_index[channel] = step_index[channel].saturating_sub(8);
                    if stereo {
                        channel = 1 - channel;
                    }
                }
            }
            continue;
        }

        let step_size = STEP_SIZE_TABLE[step_index[channel]];
        predicted[channel] = decode_sample(predicted[channel], value, step_size, bit_shift);
        write_sample(&mut output, predicted[channel] as i16);
        step_index[channel] = next_step_index(step_index[channel], value);
    }

    Ok(output)
}

fn write_sample(output: &mut Vec<u8>, sample: i16) {
    output.extend_from_slice(&sample.to_le_bytes());
}

fn next_step_index(step_index: usize, encoded_sample: u8) -> usize {
    let change = NEXT_STEP_TABLE[(encoded_sample & 0x1F) as usize] as i32;
    (step_index as i32 + change).clamp(0, MAX_STEP_INDEX as i32) as usize
}

fn apply_difference(predicted: i32, encoded_sample: u8, difference: i32) -> i32 {
    if encoded_sample & 0x40 != 0 {
        (predicted - difference).max(-32768)
    } else {
        (predicted + difference).min(32767)
    }
}

fn decode_sample(predicted: i32, encoded_sample: u8, step_size: i32, bit_shift: u8) -> i32 {
    let mut difference = step_size.checked_shr(bit_shift as u32).unwrap_or(0);

    for bit in 0..6 {
        if encoded_sample & (1 << bit) != 0 {
            difference += step_size >> bit;
        }
    }

    apply_difference(predicted, encoded_sample, difference)
}

/// Encoder counterpart used to build audio fixtures
#[cfg(any(test, feature = "test-utils"))]
pub(crate) mod encode {
    use super::*;

    /// Compress 16-bit PCM with the given compression level (1-6)
    pub(crate) fn compress(input: &[u8], channel_count: usize, level: u8) -> Result<Vec<u8>> {
        if channel_count == 0 || channel_count > MAX_ADPCM_CHANNEL_COUNT {
            return Err(Error::compression(format!(
                "Invalid channel count: {channel_count}"
            )));
        }
        if input.len() % (2 * channel_count) != 0 {
            return Err(Error::compression("Input must hold whole sample frames"));
        }

        let samples: Vec<i16> = input
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
            .collect();
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let bit_shift = level.saturating_sub(1);
        let mut output = vec![0, bit_shift];
        let mut predicted = [0i32; MAX_ADPCM_CHANNEL_COUNT];
        let mut step_index = [INITIAL_ADPCM_STEP_INDEX; MAX_ADPCM_CHANNEL_COUNT];

        for (channel, &sample) in samples.iter().take(channel_count).enumerate() {
            predicted[channel] = sample as i32;
            write_sample(&mut output, sample);
        }

        let mut channel = channel_count - 1;
        for &sample in &samples[channel_count..] {
            channel = (channel + 1) % channel_count;

            let mut difference = sample as i32 - predicted[channel];
            let mut encoded: u8 = 0;
            if difference < 0 {
                difference = -difference;
                encoded |= 0x40;
            }

            let mut step_size = STEP_SIZE_TABLE[step_index[channel]];
            if difference < (step_size >> level) {
                step_index[channel] = step_index[channel].saturating_sub(1);
                output.push(0x80);
                continue;
            }

            while difference > (step_size << 1) && step_index[channel] < MAX_STEP_INDEX {
                step_index[channel] = (step_index[channel] + 8).min(MAX_STEP_INDEX);
                step_size = STEP_SIZE_TABLE[step_index[channel]];
                output.push(0x81);
            }

            let max_bit = if bit_shift > 0 {
                (1u8 << (bit_shift - 1)).min(0x20)
            } else {
                0
            };
            let mut total = 0;
            let mut work = step_size;
            let mut bit = 1u8;
            while max_bit > 0 && bit <= max_bit {
                if total + work <= difference {
                    total += work;
                    encoded |= bit;
                }
                work >>= 1;
                bit <<= 1;
            }

            predicted[channel] =
                apply_difference(predicted[channel], encoded, (step_size >> bit_shift) + total);
            output.push(encoded);
            step_index[channel] = next_step_index(step_index[channel], encoded);
        }

        Ok(output)
    }
}
