//! Datagram payload packing.
//!
//! One datagram carries one frame: either raw little-endian 16-bit PCM
//! or one µ-law byte per sample, selected by [`CodecMode`]. There is no
//! header, sequence number, or timestamp; the peer is assumed to speak
//! the same representation.

use crate::config::CodecMode;

use super::g711;

/// Pack linear samples as little-endian bytes.
pub fn pcm_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        buf.extend_from_slice(&s.to_le_bytes());
    }
    buf
}

/// Unpack little-endian bytes into linear samples. A trailing odd byte
/// is dropped rather than rejected; short packets are a transport
/// reality, not an error.
pub fn bytes_to_pcm(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Build the outbound payload for one conditioned frame.
pub fn encode_payload(mode: CodecMode, frame: &[i16]) -> Vec<u8> {
    match mode {
        CodecMode::Ulaw => g711::encode_frame(frame),
        CodecMode::Pcm => pcm_to_bytes(frame),
    }
}

/// Recover linear samples from an inbound payload of any length.
pub fn decode_payload(mode: CodecMode, payload: &[u8]) -> Vec<i16> {
    match mode {
        CodecMode::Ulaw => g711::decode_frame(payload),
        CodecMode::Pcm => bytes_to_pcm(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_bytes_round_trip() {
        let samples = [0i16, 1, -1, 12_345, -12_345, i16::MAX, i16::MIN];
        let bytes = pcm_to_bytes(&samples);
        assert_eq!(bytes.len(), samples.len() * 2);
        assert_eq!(bytes_to_pcm(&bytes), samples);
    }

    #[test]
    fn test_trailing_odd_byte_is_dropped() {
        let bytes = [0x34, 0x12, 0xFF];
        assert_eq!(bytes_to_pcm(&bytes), vec![0x1234]);
        assert!(bytes_to_pcm(&[0x42]).is_empty());
    }

    #[test]
    fn test_ulaw_payload_is_one_byte_per_sample() {
        let frame = [0i16; 512];
        let payload = encode_payload(CodecMode::Ulaw, &frame);
        assert_eq!(payload.len(), 512);
        assert_eq!(decode_payload(CodecMode::Ulaw, &payload), vec![0i16; 512]);
    }

    #[test]
    fn test_pcm_payload_matches_wire_layout() {
        let frame = [258i16];
        // 258 = 0x0102, little-endian on the wire.
        assert_eq!(encode_payload(CodecMode::Pcm, &frame), vec![0x02, 0x01]);
    }

    #[test]
    fn test_empty_payload_decodes_empty() {
        assert!(decode_payload(CodecMode::Ulaw, &[]).is_empty());
        assert!(decode_payload(CodecMode::Pcm, &[]).is_empty());
    }
}
