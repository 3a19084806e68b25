//! Inbound pipelines: socket receive → codec → jitter buffer, and
//! jitter buffer → device write.
//!
//! Receiving and playing run in separate threads so the buffer can
//! absorb network arrival-time variance while the device drains at its
//! own pace.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

use super::MAX_DATAGRAM;
use super::alsa_device;
use super::jitter::JitterBuffer;
use super::wire;
use crate::config::Config;

/// Playback write retries before the rest of a frame is abandoned.
const MAX_RECOVERY_RETRIES: u32 = 3;

/// Run the receive pipeline until `running` clears. Datagrams from any
/// source are accepted; whatever length arrives is decoded and queued.
pub fn receive_loop(
    config: &Config,
    socket: &UdpSocket,
    jitter: &JitterBuffer,
    running: &AtomicBool,
) -> Result<()> {
    let mut buf = [0u8; MAX_DATAGRAM];

    log::info!("receive started: codec={:?}", config.codec);

    while running.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            // Empty datagrams carry no audio; the shutdown wakeup is
            // one of these, and the loop condition handles it.
            Ok((0, _)) => continue,
            Ok((len, _)) => {
                let frame = wire::decode_payload(config.codec, &buf[..len]);
                if !frame.is_empty() {
                    jitter.push(frame);
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => {
                if !running.load(Ordering::Relaxed) {
                    // Socket torn down during stop: clean termination.
                    break;
                }
                return Err(e).context("socket receive failed");
            }
        }
    }

    log::info!("receive stopped");
    Ok(())
}

/// Run the playback pipeline until the jitter buffer closes or
/// `running` clears. Short writes retry with xrun recovery.
pub fn playback_loop(config: &Config, jitter: &JitterBuffer, running: &AtomicBool) -> Result<()> {
    let (pcm, params) = alsa_device::open_playback(&config.playback_device, config.period_samples)?;
    let io = pcm.io_i16()?;

    log::info!(
        "playback started: device=\"{}\", period={} samples",
        config.playback_device,
        params.period_size,
    );

    while running.load(Ordering::Relaxed) {
        let Some(frame) = jitter.pop() else {
            // Buffer closed during stop.
            break;
        };

        let mut written = 0;
        let mut retries = 0u32;
        while written < frame.len() {
            match io.writei(&frame[written..]) {
                Ok(n) => {
                    written += n;
                    retries = 0;
                }
                Err(e) => {
                    log::warn!("ALSA playback error: {}, recovering...", e);
                    pcm.prepare()
                        .context("playback device did not recover from error")?;
                    retries += 1;
                    if retries >= MAX_RECOVERY_RETRIES {
                        log::warn!(
                            "dropping {} unplayed samples after repeated device errors",
                            frame.len() - written,
                        );
                        break;
                    }
                }
            }
        }
    }

    log::info!("playback stopped");
    Ok(())
}
