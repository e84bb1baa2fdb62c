//! Session state shared between the control and send loops.
//!
//! The server is single-slot: one control connection is served to
//! completion before the next accept, so there is exactly one live session
//! at a time and its state collapses into one [`SessionHandle`] passed to
//! both loops.
//!
//! Write discipline (who mutates what):
//!
//! - Control loop: `streaming` flag and the transport descriptor
//!   (SETUP/PLAY/TEARDOWN/disconnect).
//! - Send loop: the RTP sequence/timestamp state it owns privately, plus
//!   one exception — it clears `streaming` on a fatal transport error so
//!   the client must re-PLAY or reconnect.
//!
//! ## Session lifecycle
//!
//! ```text
//! accept         -> streaming=false, transport unset
//! SETUP          -> transport configured (TCP interleaved or UDP pair)
//! PLAY           -> streaming=true
//! TEARDOWN       -> streaming=false, transport released, loop exits
//! disconnect     -> same as TEARDOWN, via cleanup
//! ```

pub mod transport;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::stats::StreamStats;
pub use transport::{RtpTransport, TransportHeader, TransportMode};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Session timeout advertised in `Session` response headers (RFC 2326 §12.37).
pub const SESSION_TIMEOUT_SECS: u64 = 60;

/// Allocate the next session identifier (16-char hex, monotonic).
pub fn next_session_id() -> String {
    format!("{:016X}", SESSION_COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// Format a `Session` header value, e.g. `"0000000000000001;timeout=60"`.
pub fn session_header_value(id: &str) -> String {
    format!("{};timeout={}", id, SESSION_TIMEOUT_SECS)
}

/// The one shared state object of the server.
///
/// Cheap to share (`Arc`), cheap to read on the per-frame path: the flag
/// is an atomic and the transport snapshot is a handle clone under a read
/// lock.
#[derive(Debug)]
pub struct SessionHandle {
    streaming: AtomicBool,
    transport: RwLock<Option<RtpTransport>>,
    stats: StreamStats,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            streaming: AtomicBool::new(false),
            transport: RwLock::new(None),
            stats: StreamStats::new(),
        }
    }

    pub fn set_streaming(&self, on: bool) {
        self.streaming.store(on, Ordering::SeqCst);
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Install the negotiated transport, releasing any previous one
    /// (dropping the old descriptor closes its UDP sockets once the send
    /// loop lets go of its snapshot).
    pub fn set_transport(&self, transport: RtpTransport) {
        tracing::debug!(mode = ?transport.mode(), "transport configured");
        *self.transport.write() = Some(transport);
    }

    /// Release the transport (TEARDOWN or disconnect).
    pub fn clear_transport(&self) {
        *self.transport.write() = None;
    }

    /// Snapshot the current transport descriptor for one frame's sends.
    pub fn transport(&self) -> Option<RtpTransport> {
        self.transport.read().clone()
    }

    pub fn transport_mode(&self) -> Option<TransportMode> {
        self.transport.read().as_ref().map(RtpTransport::mode)
    }

    /// Admission predicate: a client is attached with a negotiated
    /// transport and has issued PLAY.
    pub fn is_client_ready(&self) -> bool {
        self.is_streaming() && self.transport.read().is_some()
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}
