//! SDP session description for the DESCRIBE response (RFC 4566).
//!
//! One video track, static JPEG payload type 26. The exact line order
//! below — including `m=` ahead of `c=` — is what the viewers this server
//! targets were validated against; reordering is a wire-format change:
//!
//! ```text
//! v=0
//! o=- 0 0 IN IP4 0.0.0.0
//! s=<name>
//! m=video 0 RTP/AVP 26
//! c=IN IP4 0.0.0.0
//! a=control:streamid=0
//! a=framerate:<N>
//! a=rtpmap:26 JPEG/90000
//! ```

use crate::config::RTP_CLOCK_RATE;
use crate::media::JPEG_PAYLOAD_TYPE;

/// Generate the SDP body for the stream.
pub fn describe_body(stream_name: &str, frame_rate: u32) -> String {
    let sdp = [
        "v=0".to_string(),
        "o=- 0 0 IN IP4 0.0.0.0".to_string(),
        format!("s={}", stream_name),
        format!("m=video 0 RTP/AVP {}", JPEG_PAYLOAD_TYPE),
        "c=IN IP4 0.0.0.0".to_string(),
        "a=control:streamid=0".to_string(),
        format!("a=framerate:{}", frame_rate),
        format!("a=rtpmap:{} JPEG/{}", JPEG_PAYLOAD_TYPE, RTP_CLOCK_RATE),
    ];

    tracing::debug!("SDP: {}", sdp.join("\r\n"));

    format!("{}\r\n", sdp.join("\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_jpeg_sdp() {
        let sdp = describe_body("Camera Stream", 15);
        assert!(sdp.contains("v=0\r\n"));
        assert!(sdp.contains("o=- 0 0 IN IP4 0.0.0.0\r\n"));
        assert!(sdp.contains("s=Camera Stream\r\n"));
        assert!(sdp.contains("m=video 0 RTP/AVP 26\r\n"));
        assert!(sdp.contains("a=control:streamid=0\r\n"));
        assert!(sdp.contains("a=framerate:15\r\n"));
        assert!(sdp.contains("a=rtpmap:26 JPEG/90000\r\n"));
        assert!(sdp.ends_with("\r\n"));
    }

    #[test]
    fn line_order_matches_wire_contract() {
        let sdp = describe_body("s", 15);
        let m_idx = sdp.find("m=video").unwrap();
        let c_idx = sdp.find("c=IN IP4").unwrap();
        let rtpmap_idx = sdp.find("a=rtpmap").unwrap();
        assert!(m_idx < c_idx, "m= precedes c= in this description");
        assert!(c_idx < rtpmap_idx);
    }
}
