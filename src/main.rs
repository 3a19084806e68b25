//! Local loopback harness: the session sends to its own port, so the
//! microphone should come back out of the speaker with one jitter
//! buffer of delay. Speak to check gating and gain, stay quiet to
//! check that the noise floor disappears.

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Result;

use voicelink::audio::alsa_device;
use voicelink::{Config, VoiceSession};

const CONFIG_FILE: &str = "voicelink.toml";
const LOOPBACK_PORT: u16 = 55_555;
const RUN_SECONDS: u64 = 25;

fn main() -> Result<()> {
    env_logger::init();

    let config = if Path::new(CONFIG_FILE).exists() {
        Config::from_file(CONFIG_FILE)?
    } else {
        Config::default()
    };

    for card in alsa_device::probe_cards() {
        log::info!("sound card: {}", card);
    }

    let session = VoiceSession::new(config);
    session.start("127.0.0.1", LOOPBACK_PORT, LOOPBACK_PORT)?;
    log::info!("loopback running on port {} for {}s", LOOPBACK_PORT, RUN_SECONDS);

    thread::sleep(Duration::from_secs(RUN_SECONDS));
    session.stop();

    if let Some(fault) = session.take_fault() {
        anyhow::bail!("session ended with a fault: {}", fault);
    }
    Ok(())
}
