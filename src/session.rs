//! The voice session controller.
//!
//! Owns the UDP socket and the three pipeline threads (capture/send,
//! receive, playback) for one call leg. Lifecycle is cooperative: a
//! shared `running` flag, one empty wakeup datagram to unblock the
//! receive thread, and a jitter-buffer close to unblock playback.

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::audio::jitter::JitterBuffer;
use crate::audio::{play, record};
use crate::config::Config;

/// Backstop for a lost wakeup datagram: the receive thread re-checks
/// the running flag at least this often.
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

type PipelineJob = Box<dyn FnOnce() -> Result<()> + Send>;

pub struct VoiceSession {
    config: Config,
    running: Arc<AtomicBool>,
    muted: Arc<AtomicBool>,
    fault: Arc<Mutex<Option<String>>>,
    active: Mutex<Option<Active>>,
}

/// Resources that exist only between `start` and `stop`.
struct Active {
    socket: Arc<UdpSocket>,
    local_port: u16,
    jitter: Arc<JitterBuffer>,
    handles: Vec<JoinHandle<()>>,
}

impl VoiceSession {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            muted: Arc::new(AtomicBool::new(false)),
            fault: Arc::new(Mutex::new(None)),
            active: Mutex::new(None),
        }
    }

    /// Bind the socket and launch the pipelines. Returns immediately;
    /// a no-op if the session is already running. Bind and resolve
    /// failures leave the session idle.
    pub fn start(&self, remote_host: &str, remote_port: u16, local_port: u16) -> Result<()> {
        let mut active = self.active.lock().expect("session state poisoned");
        if self.running.load(Ordering::SeqCst) {
            log::info!("session already running, start ignored");
            return Ok(());
        }
        // Reap leftovers of a session that was force-stopped by a
        // pipeline fault.
        if let Some(stale) = active.take() {
            join_pipelines(stale.handles);
        }

        self.config.validate()?;

        let remote: SocketAddr = (remote_host, remote_port)
            .to_socket_addrs()
            .with_context(|| format!("cannot resolve {}:{}", remote_host, remote_port))?
            .next()
            .with_context(|| format!("no usable address for {}:{}", remote_host, remote_port))?;

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, local_port))
            .with_context(|| format!("cannot bind UDP port {}", local_port))?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .context("cannot set socket read timeout")?;
        // Port 0 means "any free port"; record what we actually got so
        // the shutdown wakeup reaches the right place.
        let local_port = socket
            .local_addr()
            .context("cannot read bound socket address")?
            .port();
        let socket = Arc::new(socket);

        let jitter = Arc::new(JitterBuffer::new(
            self.config.jitter_max_frames,
            self.config.jitter_prefill,
        ));

        self.muted.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);

        log::info!(
            "voice session starting: local_port={}, remote={}, codec={:?}",
            local_port,
            remote,
            self.config.codec,
        );

        let jobs: Vec<(&'static str, PipelineJob)> = vec![
            ("voice-capture", {
                let config = self.config.clone();
                let socket = socket.clone();
                let running = self.running.clone();
                let muted = self.muted.clone();
                Box::new(move || record::capture_loop(&config, &socket, remote, &running, &muted))
            }),
            ("voice-receive", {
                let config = self.config.clone();
                let socket = socket.clone();
                let jitter = jitter.clone();
                let running = self.running.clone();
                Box::new(move || play::receive_loop(&config, &socket, &jitter, &running))
            }),
            ("voice-playback", {
                let config = self.config.clone();
                let jitter = jitter.clone();
                let running = self.running.clone();
                Box::new(move || play::playback_loop(&config, &jitter, &running))
            }),
        ];

        let mut handles = Vec::with_capacity(jobs.len());
        for (name, job) in jobs {
            match self.spawn_pipeline(name, socket.clone(), local_port, jitter.clone(), job) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    self.running.store(false, Ordering::SeqCst);
                    wake_pipelines(&socket, local_port, &jitter);
                    join_pipelines(handles);
                    return Err(e);
                }
            }
        }

        *active = Some(Active {
            socket,
            local_port,
            jitter,
            handles,
        });
        Ok(())
    }

    /// Tear the session down: clear the flag first so the pipelines
    /// observe it, then unblock them and join. A no-op when idle.
    pub fn stop(&self) {
        let mut active = self.active.lock().expect("session state poisoned");
        let was_running = self.running.swap(false, Ordering::SeqCst);
        let Some(session) = active.take() else {
            return;
        };

        if was_running {
            log::info!("voice session stopping");
        } else {
            log::info!("reaping session stopped by a pipeline fault");
        }

        wake_pipelines(&session.socket, session.local_port, &session.jitter);
        join_pipelines(session.handles);
        log::info!("voice session stopped");
    }

    /// Takes effect on the next captured frame; allowed while idle.
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
        log::info!("microphone {}", if muted { "muted" } else { "unmuted" });
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Consume the first fault recorded by a dead pipeline, if any.
    /// A faulted session has already forced its own stop sequence.
    pub fn take_fault(&self) -> Option<String> {
        self.fault.lock().expect("fault slot poisoned").take()
    }

    fn spawn_pipeline(
        &self,
        name: &'static str,
        socket: Arc<UdpSocket>,
        local_port: u16,
        jitter: Arc<JitterBuffer>,
        job: PipelineJob,
    ) -> Result<JoinHandle<()>> {
        let running = self.running.clone();
        let fault = self.fault.clone();
        thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                if let Err(e) = job() {
                    log::error!("{} pipeline failed: {:#}", name, e);
                    let mut slot = fault.lock().expect("fault slot poisoned");
                    if slot.is_none() {
                        *slot = Some(format!("{}: {:#}", name, e));
                    }
                    drop(slot);
                    // A one-sided call is worse than none: force the
                    // whole session down.
                    if running.swap(false, Ordering::SeqCst) {
                        wake_pipelines(&socket, local_port, &jitter);
                    }
                }
            })
            .with_context(|| format!("cannot spawn {} thread", name))
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn wake_pipelines(socket: &UdpSocket, local_port: u16, jitter: &JitterBuffer) {
    // An empty datagram to ourselves unblocks the receive thread; the
    // socket's read timeout backstops it if this is ever lost.
    let _ = socket.send_to(&[], (Ipv4Addr::LOCALHOST, local_port));
    jitter.close();
}

fn join_pipelines(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // None of these touch audio hardware: device acquisition happens
    // inside the pipeline threads and surfaces as a fault, while the
    // lifecycle contract below holds either way.

    #[test]
    fn test_stop_before_start_is_a_noop() {
        let session = VoiceSession::new(Config::default());
        session.stop();
        session.stop();
        assert!(!session.is_running());
    }

    #[test]
    fn test_mute_is_allowed_while_idle() {
        let session = VoiceSession::new(Config::default());
        session.set_muted(true);
        assert!(session.is_muted());
        session.set_muted(false);
        assert!(!session.is_muted());
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let session = VoiceSession::new(Config::default());
        // Port 0 avoids collisions between test runs.
        session.start("127.0.0.1", 40_001, 0).unwrap();
        session.start("127.0.0.1", 40_001, 0).unwrap();
        session.stop();
        session.stop();
        assert!(!session.is_running());
    }

    #[test]
    fn test_bind_conflict_fails_start_synchronously() {
        let holder = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let taken_port = holder.local_addr().unwrap().port();

        let session = VoiceSession::new(Config::default());
        let result = session.start("127.0.0.1", 40_001, taken_port);
        assert!(result.is_err());
        assert!(!session.is_running());
    }

    #[test]
    fn test_unresolvable_remote_fails_start() {
        let session = VoiceSession::new(Config::default());
        let result = session.start("host.invalid.", 40_001, 0);
        assert!(result.is_err());
        assert!(!session.is_running());
    }

    #[test]
    fn test_invalid_config_fails_start() {
        let mut config = Config::default();
        config.agc_gain_step = 0.0;
        let session = VoiceSession::new(config);
        assert!(session.start("127.0.0.1", 40_001, 0).is_err());
        assert!(!session.is_running());
    }
}
