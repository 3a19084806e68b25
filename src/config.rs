//! Session configuration.
//!
//! The core takes this struct as-is; only the demo binary reads it
//! from a TOML file. Both ends of a call must agree on the codec mode,
//! there is no negotiation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Wire representation of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecMode {
    /// One µ-law byte per sample.
    Ulaw,
    /// Raw little-endian 16-bit PCM.
    Pcm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ALSA capture device name (e.g. "default", "plughw:0,0")
    pub capture_device: String,
    /// ALSA playback device name
    pub playback_device: String,
    /// Wire codec, must match the peer
    pub codec: CodecMode,
    /// Requested ALSA period in samples; one period = one datagram
    pub period_samples: usize,
    /// Peak magnitude at or below which a frame is gated to silence
    pub gate_threshold: i16,
    /// Peak magnitude the AGC steers frames toward
    pub agc_target: i16,
    /// Largest AGC gain change per frame
    pub agc_gain_step: f32,
    /// Jitter buffer capacity in frames; overflow drops the oldest
    pub jitter_max_frames: usize,
    /// Frames buffered before playback starts (and after an underrun)
    pub jitter_prefill: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture_device: "default".to_string(),
            playback_device: "default".to_string(),
            codec: CodecMode::Ulaw,
            period_samples: 512,
            gate_threshold: 500,
            agc_target: 20_000,
            agc_gain_step: 0.05,
            jitter_max_frames: 8,
            jitter_prefill: 2,
        }
    }
}

impl Config {
    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.period_samples == 0 {
            bail!("period_samples must be positive");
        }
        if self.agc_target <= 0 {
            bail!("agc_target must be positive");
        }
        if !(self.agc_gain_step > 0.0) {
            bail!("agc_gain_step must be positive; zero would freeze the gain");
        }
        if self.jitter_max_frames == 0 {
            bail!("jitter_max_frames must be at least 1");
        }
        if self.jitter_prefill > self.jitter_max_frames {
            bail!("jitter_prefill cannot exceed jitter_max_frames");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.codec, CodecMode::Ulaw);
        assert_eq!(config.period_samples, 512);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("codec = \"pcm\"\ngate_threshold = 300\n").unwrap();
        assert_eq!(config.codec, CodecMode::Pcm);
        assert_eq!(config.gate_threshold, 300);
        assert_eq!(config.agc_target, 20_000);
    }

    #[test]
    fn test_validate_rejects_bad_tuning() {
        let mut config = Config::default();
        config.agc_gain_step = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.jitter_prefill = 20;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.period_samples = 0;
        assert!(config.validate().is_err());
    }
}
