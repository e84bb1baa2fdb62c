//! RTCP Sender Reports (RFC 3550 §6.4.1).
//!
//! A fixed 28-byte Sender Report accompanies the RTP stream on the UDP
//! transport, carrying the SSRC, an NTP-style wall-clock timestamp, and
//! the current RTP timestamp. Packet/octet counts are zeroed — receivers
//! in this deployment use the report only for liveness and clock mapping.
//!
//! ```text
//! +--------+--------+----------------+
//! | 0x80   | PT=200 |   length=6     |  header
//! +--------+--------+----------------+
//! |              SSRC               |
//! +---------------------------------+
//! |      NTP timestamp (64 bit)     |
//! +---------------------------------+
//! |          RTP timestamp          |
//! +---------------------------------+
//! |      sender's packet count      |
//! +---------------------------------+
//! |      sender's octet count       |
//! +---------------------------------+
//! ```

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Size of the fixed Sender Report packet.
pub const SENDER_REPORT_LEN: usize = 28;

/// RTCP packet type for Sender Reports.
pub const PT_SENDER_REPORT: u8 = 200;

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// Build a 28-byte Sender Report for the stream identified by `ssrc`,
/// stamped with the current wall clock and the given RTP timestamp.
pub fn sender_report(ssrc: u32, rtp_timestamp: u32) -> [u8; SENDER_REPORT_LEN] {
    let (ntp_secs, ntp_frac) = ntp_now();

    let mut pkt = [0u8; SENDER_REPORT_LEN];
    pkt[0] = 2 << 6; // version 2, no padding, zero report blocks
    pkt[1] = PT_SENDER_REPORT;
    // Length in 32-bit words minus one: 28 bytes -> 6.
    pkt[2..4].copy_from_slice(&((SENDER_REPORT_LEN as u16 / 4) - 1).to_be_bytes());
    pkt[4..8].copy_from_slice(&ssrc.to_be_bytes());
    pkt[8..12].copy_from_slice(&ntp_secs.to_be_bytes());
    pkt[12..16].copy_from_slice(&ntp_frac.to_be_bytes());
    pkt[16..20].copy_from_slice(&rtp_timestamp.to_be_bytes());
    // Packet and octet counts stay zero.
    pkt
}

/// Current wall clock as a truncated NTP timestamp (seconds, 2^-32 fraction).
fn ntp_now() -> (u32, u32) {
    let since_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    let secs = (since_unix.as_secs().wrapping_add(NTP_UNIX_OFFSET)) as u32;
    let frac = ((since_unix.subsec_nanos() as u64) << 32) / 1_000_000_000;
    (secs, frac as u32)
}

/// Wall-clock cadence for Sender Reports, independent of frame timing.
#[derive(Debug)]
pub struct RtcpReporter {
    interval: Duration,
    next_due: Instant,
}

impl RtcpReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: Instant::now() + interval,
        }
    }

    /// Whether a report is due at `now`; advances the schedule when it is.
    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_layout() {
        let pkt = sender_report(0xCAFEBABE, 54_321);
        assert_eq!(pkt.len(), SENDER_REPORT_LEN);
        assert_eq!(pkt[0], 0x80);
        assert_eq!(pkt[1], PT_SENDER_REPORT);
        assert_eq!(u16::from_be_bytes([pkt[2], pkt[3]]), 6);
        assert_eq!(
            u32::from_be_bytes([pkt[4], pkt[5], pkt[6], pkt[7]]),
            0xCAFEBABE
        );
        assert_eq!(
            u32::from_be_bytes([pkt[16], pkt[17], pkt[18], pkt[19]]),
            54_321
        );
        assert_eq!(&pkt[20..28], &[0u8; 8], "counts must stay zero");
    }

    #[test]
    fn ntp_timestamp_is_nonzero() {
        let pkt = sender_report(1, 0);
        let ntp_secs = u32::from_be_bytes([pkt[8], pkt[9], pkt[10], pkt[11]]);
        assert!(ntp_secs > 0);
    }

    #[test]
    fn reporter_fires_on_interval() {
        let mut reporter = RtcpReporter::new(Duration::from_secs(5));
        let start = Instant::now();
        assert!(!reporter.due(start));
        assert!(reporter.due(start + Duration::from_secs(6)));
        // Schedule advanced; not due again immediately.
        assert!(!reporter.due(start + Duration::from_secs(7)));
        assert!(reporter.due(start + Duration::from_secs(12)));
    }
}
