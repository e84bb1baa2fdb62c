use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::sync::Arc;

use parking_lot::Mutex;

/// Negotiated RTP delivery mode (RFC 2326 §12.39).
///
/// The near-duplicate firmware variants this core replaces hardcoded one
/// transport each; here the choice is a runtime value set by SETUP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// RTP multiplexed onto the RTSP control connection with `$` framing
    /// (channel 0; channel 1 is reserved for RTCP and unused).
    TcpInterleaved,
    /// RTP and RTCP as UDP datagrams to the client's negotiated port pair.
    UdpRtp,
}

/// The negotiated transport descriptor, written by the control loop during
/// SETUP and read (snapshotted) by the send loop each frame.
///
/// Handles are reference-counted so the send loop can keep sending on a
/// snapshot while the control loop replaces or clears the descriptor; a
/// stale snapshot surfaces as a send error and is handled by the retry
/// policy.
#[derive(Debug, Clone)]
pub enum RtpTransport {
    /// Interleaved on the control socket. The mutex serializes RTP frames
    /// against RTSP response writes on the same stream.
    TcpInterleaved { stream: Arc<Mutex<TcpStream>> },
    /// Dedicated UDP socket pair.
    Udp {
        rtp: Arc<UdpSocket>,
        rtcp: Arc<UdpSocket>,
        /// Client's RTP destination (`client_addr:client_port`).
        client_rtp: SocketAddr,
        /// Client's RTCP destination (RTP port + 1).
        client_rtcp: SocketAddr,
    },
}

impl RtpTransport {
    pub fn mode(&self) -> TransportMode {
        match self {
            Self::TcpInterleaved { .. } => TransportMode::TcpInterleaved,
            Self::Udp { .. } => TransportMode::UdpRtp,
        }
    }
}

/// Client port pair parsed from the RTSP `Transport` header.
///
/// Only the first port of `client_port=<rtp>[-<rtcp>]` is authoritative;
/// RTCP is assumed at RTP + 1 whether or not the client spelled it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportHeader {
    pub client_rtp_port: u16,
    pub client_rtcp_port: u16,
}

impl TransportHeader {
    /// Parse the `Transport` header value (RFC 2326 §12.39), looking for
    /// `client_port=` among the semicolon-separated parameters.
    ///
    /// ## Examples
    ///
    /// ```
    /// use mjpeg_rtsp::session::transport::TransportHeader;
    ///
    /// let th = TransportHeader::parse("RTP/AVP;unicast;client_port=6000-6001").unwrap();
    /// assert_eq!(th.client_rtp_port, 6000);
    /// assert_eq!(th.client_rtcp_port, 6001);
    ///
    /// assert!(TransportHeader::parse("RTP/AVP;unicast").is_none());
    /// ```
    pub fn parse(header: &str) -> Option<Self> {
        for part in header.split(';') {
            let part = part.trim();
            if let Some(ports) = part.strip_prefix("client_port=") {
                let rtp_port: u16 = ports.split('-').next()?.trim().parse().ok()?;
                let rtcp_port = rtp_port.checked_add(1)?;
                return Some(TransportHeader {
                    client_rtp_port: rtp_port,
                    client_rtcp_port: rtcp_port,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_port_pair() {
        let th = TransportHeader::parse("RTP/AVP;unicast;client_port=5000-5001").unwrap();
        assert_eq!(th.client_rtp_port, 5000);
        assert_eq!(th.client_rtcp_port, 5001);
    }

    #[test]
    fn parse_single_port_assumes_rtcp_adjacent() {
        let th = TransportHeader::parse("RTP/AVP;unicast;client_port=6000").unwrap();
        assert_eq!(th.client_rtp_port, 6000);
        assert_eq!(th.client_rtcp_port, 6001);
    }

    #[test]
    fn parse_no_client_port() {
        assert!(TransportHeader::parse("RTP/AVP;unicast").is_none());
    }

    #[test]
    fn parse_garbage_port() {
        assert!(TransportHeader::parse("RTP/AVP;client_port=abc-def").is_none());
    }

    #[test]
    fn parse_max_port_has_no_rtcp_room() {
        assert!(TransportHeader::parse("RTP/AVP;client_port=65535").is_none());
    }
}
