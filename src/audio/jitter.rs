//! Bounded playout buffer between the receive and playback pipelines.
//!
//! The wire format carries no sequence numbers, so frames play in
//! arrival order; this buffer only absorbs arrival-time variance.
//! Playback does not drain until `prefill` frames have queued, and the
//! same depth is rebuilt after an underrun. When the buffer is full the
//! oldest frame is dropped in favor of fresh audio.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

pub struct JitterBuffer {
    max_frames: usize,
    prefill: usize,
    state: Mutex<State>,
    frame_ready: Condvar,
}

struct State {
    queue: VecDeque<Vec<i16>>,
    priming: bool,
    closed: bool,
}

impl JitterBuffer {
    pub fn new(max_frames: usize, prefill: usize) -> Self {
        let max_frames = max_frames.max(1);
        Self {
            max_frames,
            prefill: prefill.clamp(1, max_frames),
            state: Mutex::new(State {
                queue: VecDeque::with_capacity(max_frames),
                priming: true,
                closed: false,
            }),
            frame_ready: Condvar::new(),
        }
    }

    /// Queue one decoded frame. Never blocks; overflow drops the
    /// oldest queued frame.
    pub fn push(&self, frame: Vec<i16>) {
        let mut st = self.state.lock().expect("jitter state poisoned");
        if st.closed {
            return;
        }
        if st.queue.len() >= self.max_frames {
            st.queue.pop_front();
        }
        st.queue.push_back(frame);
        if st.priming && st.queue.len() >= self.prefill {
            st.priming = false;
        }
        if !st.priming {
            self.frame_ready.notify_one();
        }
    }

    /// Take the next frame, blocking while the buffer is priming or
    /// empty. Returns `None` once the buffer has been closed.
    pub fn pop(&self) -> Option<Vec<i16>> {
        let mut st = self.state.lock().expect("jitter state poisoned");
        loop {
            if st.closed {
                return None;
            }
            if !st.priming {
                if let Some(frame) = st.queue.pop_front() {
                    return Some(frame);
                }
                // Underrun: rebuild the playout depth before resuming.
                st.priming = true;
            }
            st = self.frame_ready.wait(st).expect("jitter state poisoned");
        }
    }

    /// Wake every blocked `pop`; used at shutdown only.
    pub fn close(&self) {
        let mut st = self.state.lock().expect("jitter state poisoned");
        st.closed = true;
        st.queue.clear();
        drop(st);
        self.frame_ready.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("jitter state poisoned").queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
