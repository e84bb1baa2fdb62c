//! Stream and server configuration.

use std::time::Duration;

/// RTP clock rate for video payloads, in Hz (RFC 3551 §4).
pub const RTP_CLOCK_RATE: u32 = 90_000;

/// Configuration for one MJPEG stream and the server that carries it.
///
/// Defaults match the camera firmware this core was built for: 15 fps,
/// 1500-byte packets, TCP interleaved transport allowed, baseline JPEG
/// with no inline quantization tables.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Session name advertised in the SDP `s=` line.
    pub stream_name: String,
    /// Target frame rate, also declared via `a=framerate:`.
    pub frame_rate: u32,
    /// Upper bound on a whole RTP packet (12-byte RTP header + 8-byte JPEG
    /// payload header + payload). Payload chunks are `max_packet_size - 20`.
    pub max_packet_size: usize,
    /// Whether `SETUP` may negotiate `RTP/AVP/TCP` (interleaved). When
    /// false, such requests are answered `461 Unsupported Transport`.
    pub enable_tcp_transport: bool,
    /// Local UDP port bound for outbound RTP; RTCP binds this + 1.
    pub server_rtp_port: u16,
    /// Write timeout on the RTP socket, bounding each `send_to`.
    pub send_timeout: Duration,
    /// SO_SNDBUF requested for the RTP socket.
    pub send_buffer_bytes: usize,
    /// RFC 2435 `type` field (0 = baseline, 4:2:2/4:2:0 per table).
    pub jpeg_type_code: u8,
    /// RFC 2435 `Q` field; 255 = no inline quantization table.
    pub quantization_factor: u8,
    /// Wall-clock budget for sending all fragments of one frame; exceeded
    /// means the rest of the frame is abandoned (freshness over completeness).
    pub frame_send_deadline: Duration,
    /// Interval between RTCP sender reports.
    pub rtcp_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            stream_name: "Camera Stream".to_string(),
            frame_rate: 15,
            max_packet_size: 1500,
            enable_tcp_transport: true,
            server_rtp_port: 50_000,
            send_timeout: Duration::from_millis(250),
            send_buffer_bytes: 128 * 1024,
            jpeg_type_code: 0,
            quantization_factor: 255,
            frame_send_deadline: Duration::from_millis(80),
            rtcp_interval: Duration::from_secs(5),
        }
    }
}

impl StreamConfig {
    /// RTP timestamp increment per frame at the 90 kHz media clock.
    pub fn timestamp_increment(&self) -> u32 {
        RTP_CLOCK_RATE / self.frame_rate.max(1)
    }

    /// Interval between frames at the target rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_increment_at_15fps() {
        let config = StreamConfig::default();
        assert_eq!(config.timestamp_increment(), 6000);
    }

    #[test]
    fn frame_interval_at_25fps() {
        let config = StreamConfig {
            frame_rate: 25,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(40));
    }

    #[test]
    fn zero_frame_rate_does_not_panic() {
        let config = StreamConfig {
            frame_rate: 0,
            ..Default::default()
        };
        assert_eq!(config.timestamp_increment(), RTP_CLOCK_RATE);
    }
}
