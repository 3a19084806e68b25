//! voicelink - one bidirectional real-time voice leg over UDP.
//!
//! Captures 8 kHz mono PCM from a local device, conditions it (noise
//! gate + AGC), optionally compresses it to G.711 µ-law, and ships one
//! datagram per frame to a peer; inbound datagrams are decoded, passed
//! through a bounded jitter buffer, and played back. Call signaling is
//! an external collaborator's job: it hands [`VoiceSession::start`] a
//! resolved `(remote_host, remote_port, local_port)` triple and calls
//! [`VoiceSession::stop`] on teardown.

pub mod audio;
pub mod config;
pub mod session;

pub use config::{CodecMode, Config};
pub use session::VoiceSession;
