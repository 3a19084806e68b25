//! G.711 µ-law companding between 16-bit linear PCM and 8-bit codes.
//!
//! Both directions are table lookups; the tables are built once on
//! first use. Compression is lossy and many-to-one: `decode(encode(x))`
//! lands within one quantization step of `x`, with larger steps at
//! larger magnitudes.

use std::sync::LazyLock;

/// Bias added to the magnitude before segment search.
const BIAS: i32 = 0x84;
/// Largest magnitude the codec can represent (BIAS below i16::MAX).
const CLIP: i32 = 32_635;

static ULAW_TO_LINEAR: LazyLock<[i16; 256]> = LazyLock::new(|| {
    let mut table = [0i16; 256];
    for (code, slot) in table.iter_mut().enumerate() {
        *slot = expand(code as u8);
    }
    table
});

static LINEAR_TO_ULAW: LazyLock<Box<[u8; 65_536]>> = LazyLock::new(|| {
    let mut table = Box::new([0u8; 65_536]);
    for (index, slot) in table.iter_mut().enumerate() {
        *slot = compress(index as u16 as i16);
    }
    table
});

/// Compress one linear sample to its µ-law code.
#[inline]
pub fn encode(sample: i16) -> u8 {
    LINEAR_TO_ULAW[sample as u16 as usize]
}

/// Expand one µ-law code to a linear sample.
#[inline]
pub fn decode(code: u8) -> i16 {
    ULAW_TO_LINEAR[code as usize]
}

/// Compress a whole frame, one byte per sample.
pub fn encode_frame(pcm: &[i16]) -> Vec<u8> {
    pcm.iter().map(|&s| encode(s)).collect()
}

/// Expand a whole payload, one sample per byte.
pub fn decode_frame(data: &[u8]) -> Vec<i16> {
    data.iter().map(|&b| decode(b)).collect()
}

fn compress(sample: i16) -> u8 {
    let sign: u8 = if sample < 0 { 0x80 } else { 0x00 };
    let magnitude = (sample as i32).abs().min(CLIP) + BIAS;

    // Locate the logarithmic segment: the position of the highest set
    // bit between bit 7 (segment 0) and bit 14 (segment 7).
    let mut exponent: u8 = 7;
    let mut mask = 0x4000;
    while exponent > 0 && magnitude & mask == 0 {
        mask >>= 1;
        exponent -= 1;
    }

    let mantissa = ((magnitude >> (exponent + 3)) & 0x0F) as u8;
    // µ-law transmits everything inverted.
    !(sign | (exponent << 4) | mantissa)
}

fn expand(code: u8) -> i16 {
    let code = !code;
    let sign = code & 0x80;
    let exponent = (code >> 4) & 0x07;
    let mantissa = (code & 0x0F) as i32;

    let magnitude = (((mantissa << 3) + BIAS) << exponent) - BIAS;
    if sign != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_maps_to_all_ones_code() {
        assert_eq!(encode(0), 0xFF);
        assert_eq!(decode(0xFF), 0);
        // The redundant "negative zero" code also decodes to silence.
        assert_eq!(decode(0x7F), 0);
    }

    #[test]
    fn test_total_and_bounded_round_trip() {
        // Every i16 encodes, and decode(encode(x)) stays within half a
        // quantization step of the clipped input. Step size for segment
        // `exp` is 1 << (exp + 3).
        for raw in i16::MIN..=i16::MAX {
            let code = encode(raw);
            let back = decode(code) as i32;

            let clipped = (raw as i32).clamp(-CLIP, CLIP);
            let exponent = ((!code) >> 4) & 0x07;
            let half_step = 1i32 << (exponent + 2);
            assert!(
                (back - clipped).abs() <= half_step,
                "sample {raw}: decoded {back}, clipped {clipped}, half step {half_step}"
            );
        }
    }

    #[test]
    fn test_codes_are_fixed_points() {
        // Re-encoding a decoded value must reproduce the code. The one
        // exception is negative zero (0x7F), which collapses onto 0xFF.
        for code in 0u8..=255 {
            if code == 0x7F {
                continue;
            }
            assert_eq!(encode(decode(code)), code, "code {code:#04x}");
        }
    }

    #[test]
    fn test_sign_symmetry() {
        for x in 1i16..=i16::MAX {
            assert_eq!(decode(encode(-x)), -decode(encode(x)), "sample {x}");
        }
    }

    #[test]
    fn test_steps_grow_with_magnitude() {
        // Quiet samples quantize finer than loud ones.
        let quiet_err = (decode(encode(100)) as i32 - 100).abs();
        let loud_err = (decode(encode(30_000)) as i32 - 30_000).abs();
        assert!(quiet_err <= 4);
        assert!(loud_err > quiet_err);
    }

    #[test]
    fn test_frame_helpers() {
        let pcm = [0i16, 1000, -1000, 32_767, -32_768];
        let coded = encode_frame(&pcm);
        assert_eq!(coded.len(), pcm.len());
        let back = decode_frame(&coded);
        assert_eq!(back.len(), pcm.len());
        assert_eq!(back[0], 0);
    }
}
