//! Windowed streaming counters.
//!
//! Process-wide counters for frames, packets, and send errors, reset every
//! completed 1-second window. Read-only outside the streaming path: the
//! numbers feed the log sink and never steer control flow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

const WINDOW: Duration = Duration::from_secs(1);

/// Per-window stream counters, shared between the control and send loops.
///
/// Counters are plain atomics; the window clock sits behind a mutex taken
/// once per send-loop cycle.
#[derive(Debug)]
pub struct StreamStats {
    frames: AtomicU64,
    packets: AtomicU64,
    errors: AtomicU64,
    window_start: Mutex<Instant>,
}

impl StreamStats {
    pub fn new() -> Self {
        Self {
            frames: AtomicU64::new(0),
            packets: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            window_start: Mutex::new(Instant::now()),
        }
    }

    /// One frame fully handed to the transport (complete or partially dropped).
    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// `n` RTP packets sent.
    pub fn record_packets(&self, n: u64) {
        self.packets.fetch_add(n, Ordering::Relaxed);
    }

    /// One error event: a rejected frame, or a packet dropped after its
    /// retry budget. A packet retried N times then dropped counts once.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn packet_count(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Start a fresh window, discarding current counts. Called on PLAY.
    pub fn reset_window(&self) {
        self.frames.store(0, Ordering::Relaxed);
        self.packets.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        *self.window_start.lock() = Instant::now();
    }

    /// Emit the window's counters to the log and reset, if a full second
    /// has elapsed. Quiet windows (all zeros) are skipped.
    pub fn maybe_report(&self) {
        let mut start = self.window_start.lock();
        if start.elapsed() < WINDOW {
            return;
        }
        *start = Instant::now();
        drop(start);

        let frames = self.frames.swap(0, Ordering::Relaxed);
        let packets = self.packets.swap(0, Ordering::Relaxed);
        let errors = self.errors.swap(0, Ordering::Relaxed);

        if frames == 0 && packets == 0 && errors == 0 {
            return;
        }
        tracing::info!(frames, packets, errors, "stream window");
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}
