//! ALSA PCM device wrappers for audio capture and playback.
//!
//! Every device runs at the wire format: 8000 Hz, signed 16-bit
//! little-endian, mono. A device that cannot negotiate that rate is
//! treated as unavailable rather than silently resampled.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result, bail};

use super::{CHANNELS, SAMPLE_RATE};

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct AlsaParams {
    /// Actual sample rate after negotiation
    pub sample_rate: u32,
    /// Period size in frames (one frame = one mono sample here)
    pub period_size: usize,
}

/// Open a PCM device for capture (the microphone side).
pub fn open_capture(device: &str, period_size: usize) -> Result<(PCM, AlsaParams)> {
    open_pcm(device, Direction::Capture, period_size, "capture")
}

/// Open a PCM device for playback (the speaker side).
pub fn open_playback(device: &str, period_size: usize) -> Result<(PCM, AlsaParams)> {
    open_pcm(device, Direction::Playback, period_size, "playback")
}

fn open_pcm(
    device: &str,
    direction: Direction,
    period_size: usize,
    dir_name: &str,
) -> Result<(PCM, AlsaParams)> {
    let pcm = PCM::new(device, direction, false)
        .with_context(|| format!("failed to open PCM device '{}' for {}", device, dir_name))?;

    {
        let hwp = HwParams::any(&pcm).context("failed to initialize HwParams")?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::S16LE)?;
        hwp.set_channels(CHANNELS)?;
        hwp.set_rate_near(SAMPLE_RATE, ValueOr::Nearest)?;
        if period_size > 0 {
            hwp.set_period_size_near(period_size as alsa::pcm::Frames, ValueOr::Nearest)?;
        }
        pcm.hw_params(&hwp)?;
    }

    // Read back what the hardware actually agreed to.
    let (actual_rate, actual_period) = {
        let hwp = pcm.hw_params_current()?;
        (hwp.get_rate()?, hwp.get_period_size()? as usize)
    };

    if actual_rate != SAMPLE_RATE {
        bail!(
            "device '{}' negotiated {} Hz, the wire format requires {} Hz",
            device,
            actual_rate,
            SAMPLE_RATE,
        );
    }

    log::info!(
        "ALSA {}: device={}, rate={}, period_size={}",
        dir_name,
        device,
        actual_rate,
        actual_period,
    );

    Ok((
        pcm,
        AlsaParams {
            sample_rate: actual_rate,
            period_size: actual_period,
        },
    ))
}

/// List the sound cards ALSA can see, for startup logging and device
/// pickers. Enumeration failures skip the card rather than failing the
/// whole probe.
pub fn probe_cards() -> Vec<String> {
    let mut cards = Vec::new();
    for card in alsa::card::Iter::new() {
        let Ok(card) = card else { continue };
        let index = card.get_index();
        let name = card.get_name().unwrap_or_else(|_| "?".to_string());
        let longname = card.get_longname().unwrap_or_else(|_| "?".to_string());
        cards.push(format!("hw:{} {} ({})", index, name, longname));
    }
    cards
}
