//! Frame pacing, admission, and the send loop.
//!
//! The [`Streamer`] runs on its own thread, pulling frames from a
//! [`FrameSource`] at the configured rate — but only while a client is
//! attached and playing. Each pulled frame goes through the packetizer
//! and out the negotiated transport under the retry policy and the
//! whole-frame deadline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::StreamConfig;
use crate::media::rtcp::{self, RtcpReporter};
use crate::media::JpegPacketizer;
use crate::session::{RtpTransport, SessionHandle};
use crate::transport::retry::{self, RetryPolicy, SendOutcome};
use crate::transport::tcp;

/// Sleep while no client is attached or playing.
const IDLE_POLL: Duration = Duration::from_millis(10);
/// Sleep while waiting for the next frame deadline.
const PACING_POLL: Duration = Duration::from_millis(2);

/// Produces complete JPEG frames on demand.
///
/// Implemented by the camera capture glue; may transiently have nothing
/// to hand out (sensor not ready, queue empty).
pub trait FrameSource: Send {
    fn get_next_frame(&mut self) -> Option<Vec<u8>>;
}

/// Schedules frame pulls at the target rate against the monotonic clock.
///
/// The deadline advances by one frame interval per pull and never moves
/// backward; after a long stall it re-anchors to the present instead of
/// bursting to catch up.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    next_due: Instant,
}

impl FramePacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: Instant::now(),
        }
    }

    /// Whether a frame is due at `now`; advances the schedule when it is.
    pub fn ready(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }
}

/// Result of sending one packet on the negotiated transport.
enum PacketOutcome {
    Sent,
    Dropped,
    Fatal,
}

/// The send loop: admission gate, packetizer, transport sends, RTCP.
///
/// Sole owner of the RTP stream state (sequence/timestamp); reads the
/// `streaming` flag and transport descriptor the control loop maintains.
pub struct Streamer {
    handle: Arc<SessionHandle>,
    config: Arc<StreamConfig>,
    packetizer: JpegPacketizer,
    retry: RetryPolicy,
    rtcp: RtcpReporter,
}

impl Streamer {
    pub fn new(handle: Arc<SessionHandle>, config: Arc<StreamConfig>) -> Self {
        Self {
            packetizer: JpegPacketizer::with_random_ssrc(&config),
            retry: RetryPolicy::default(),
            rtcp: RtcpReporter::new(config.rtcp_interval),
            handle,
            config,
        }
    }

    /// Drive the loop until `running` clears.
    pub fn run(mut self, mut source: Box<dyn FrameSource>, running: Arc<AtomicBool>) {
        let mut pacer = FramePacer::new(self.config.frame_interval());
        tracing::debug!("send loop started");

        while running.load(Ordering::SeqCst) {
            self.handle.stats().maybe_report();
            self.send_rtcp_if_due();

            if !self.handle.is_client_ready() {
                thread::sleep(IDLE_POLL);
                continue;
            }
            if !pacer.ready(Instant::now()) {
                thread::sleep(PACING_POLL);
                continue;
            }

            let Some(frame) = source.get_next_frame() else {
                continue;
            };
            self.push_frame_if_streaming(&frame);
        }

        tracing::debug!("send loop exited");
    }

    /// Packetize and send one frame, if a client is attached and playing.
    /// No-op (no packets, no state change) when the gates are closed.
    pub fn push_frame_if_streaming(&mut self, frame: &[u8]) {
        if !self.handle.is_client_ready() {
            return;
        }
        let Some(transport) = self.handle.transport() else {
            return;
        };

        let packets = match self.packetizer.packetize(frame) {
            Ok(packets) => packets,
            Err(e) => {
                self.handle.stats().record_error();
                tracing::warn!(error = %e, "frame rejected");
                return;
            }
        };

        let deadline = Instant::now() + self.config.frame_send_deadline;
        let mut sent = 0u64;

        for (index, packet) in packets.iter().enumerate() {
            // TEARDOWN can land mid-frame; stop before the next fragment.
            if !self.handle.is_streaming() {
                break;
            }
            if Instant::now() > deadline {
                tracing::warn!(
                    abandoned = packets.len() - index,
                    "frame send deadline exceeded"
                );
                self.handle.stats().record_error();
                break;
            }

            match self.send_packet(&transport, packet) {
                PacketOutcome::Sent => sent += 1,
                PacketOutcome::Dropped => {
                    self.handle.stats().record_error();
                    if index == 0 {
                        // A frame missing its first fragment cannot be
                        // decoded; the rest would be wasted bytes.
                        break;
                    }
                }
                PacketOutcome::Fatal => {
                    self.handle.set_streaming(false);
                    break;
                }
            }
        }

        self.handle.stats().record_packets(sent);
        self.handle.stats().record_frame();
    }

    fn send_packet(&self, transport: &RtpTransport, packet: &[u8]) -> PacketOutcome {
        match transport {
            RtpTransport::TcpInterleaved { stream } => {
                match tcp::send_interleaved(stream, tcp::RTP_CHANNEL, packet) {
                    Ok(()) => PacketOutcome::Sent,
                    Err(e) => {
                        // The control channel is also the data channel;
                        // losing it ends the session.
                        tracing::error!(error = %e, "interleaved write failed");
                        PacketOutcome::Fatal
                    }
                }
            }
            RtpTransport::Udp { rtp, client_rtp, .. } => {
                match retry::send_with_retry(&self.retry, || rtp.send_to(packet, *client_rtp)) {
                    SendOutcome::Sent => PacketOutcome::Sent,
                    SendOutcome::Dropped => PacketOutcome::Dropped,
                    SendOutcome::Fatal(e) => {
                        tracing::error!(error = %e, %client_rtp, "RTP send failed");
                        PacketOutcome::Fatal
                    }
                }
            }
        }
    }

    /// Emit a Sender Report when due — wall-clock cadence, independent of
    /// frames. Requires a UDP transport; failures are logged, never fatal.
    fn send_rtcp_if_due(&mut self) {
        if !self.rtcp.due(Instant::now()) {
            return;
        }
        let Some(RtpTransport::Udp { rtcp, client_rtcp, .. }) = self.handle.transport() else {
            return;
        };
        let report = rtcp::sender_report(self.packetizer.ssrc(), self.packetizer.rtp_timestamp());
        if let Err(e) = rtcp.send_to(&report, client_rtcp) {
            tracing::debug!(error = %e, "RTCP send failed");
        }
    }
}
