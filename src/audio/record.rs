//! Capture pipeline: device read → conditioner → codec → socket send.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

use super::alsa_device;
use super::conditioner::Conditioner;
use super::wire;
use crate::config::Config;

/// Run the capture pipeline until `running` clears. Each ALSA period
/// becomes exactly one datagram; a short read is sent at its actual
/// length so the packet cadence stays tied to the device clock.
pub fn capture_loop(
    config: &Config,
    socket: &UdpSocket,
    remote: SocketAddr,
    running: &AtomicBool,
    muted: &AtomicBool,
) -> Result<()> {
    let (pcm, params) = alsa_device::open_capture(&config.capture_device, config.period_samples)?;
    let io = pcm.io_i16()?;

    let mut conditioner = Conditioner::new(
        config.gate_threshold,
        config.agc_target,
        config.agc_gain_step,
    );
    let mut buf = vec![0i16; params.period_size];

    log::info!(
        "capture started: device=\"{}\", period={} samples, codec={:?}",
        config.capture_device,
        params.period_size,
        config.codec,
    );

    while running.load(Ordering::Relaxed) {
        match io.readi(&mut buf) {
            Ok(0) => continue,
            Ok(frames) => {
                let frame = &mut buf[..frames];
                conditioner.process(frame, muted.load(Ordering::Relaxed));

                let payload = wire::encode_payload(config.codec, frame);
                if let Err(e) = socket.send_to(&payload, remote) {
                    if !running.load(Ordering::Relaxed) {
                        break;
                    }
                    // Transient network trouble drops this frame only.
                    log::warn!("dropped outbound frame: {}", e);
                }
            }
            Err(e) => {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                log::warn!("ALSA capture error: {}, recovering...", e);
                pcm.prepare()
                    .context("capture device did not recover from error")?;
            }
        }
    }

    log::info!("capture stopped");
    Ok(())
}
