//! Audio capture, playback, and signal processing for one call leg.
//!
//! Uses ALSA for device I/O, G.711 µ-law for the compressed wire
//! format, and an in-house conditioner (noise gate + AGC) on the
//! capture path.

pub mod alsa_device;
pub mod conditioner;
pub mod g711;
pub mod jitter;
pub mod play;
pub mod record;
pub mod wire;

/// Sample rate fixed by the wire format, in Hz.
pub const SAMPLE_RATE: u32 = 8000;
/// Mono throughout.
pub const CHANNELS: u32 = 1;
/// Largest inbound datagram accepted.
pub const MAX_DATAGRAM: usize = 4096;
