//! UDP transport for RTP media and RTCP reports.
//!
//! SETUP in UDP mode opens one socket pair on fixed local ports: RTP on
//! the configured port, RTCP on the next. The RTP socket gets a bounded
//! write timeout (so a congested stack cannot stall the send loop past
//! the frame deadline) and an enlarged send buffer — the one option std
//! cannot set, hence `socket2` for the socket's construction.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};

use crate::config::StreamConfig;
use crate::error::Result;

/// The server-side RTP/RTCP socket pair opened during SETUP.
pub struct UdpPair {
    pub rtp: Arc<UdpSocket>,
    pub rtcp: Arc<UdpSocket>,
    pub rtp_port: u16,
    pub rtcp_port: u16,
}

impl UdpPair {
    /// Bind the pair on `config.server_rtp_port` / `+1`.
    pub fn open(config: &StreamConfig) -> Result<Self> {
        let rtp_port = config.server_rtp_port;
        let rtcp_port = rtp_port.checked_add(1).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "RTP port 65535 leaves no room for the RTCP port",
            )
        })?;

        let rtp = bind_rtp(rtp_port, config)?;
        let rtcp = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], rtcp_port)))?;

        tracing::debug!(rtp_port, rtcp_port, "UDP transport sockets bound");

        Ok(Self {
            rtp: Arc::new(rtp),
            rtcp: Arc::new(rtcp),
            rtp_port,
            rtcp_port,
        })
    }
}

/// Bind the RTP socket with its tuned options.
fn bind_rtp(port: u16, config: &StreamConfig) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    if let Err(err) = socket.set_send_buffer_size(config.send_buffer_bytes) {
        // Deliveries still work with the kernel default, just drop sooner
        // under burst.
        tracing::warn!(error = %err, "could not enlarge RTP send buffer");
    }
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    socket.bind(&addr.into())?;

    let socket: UdpSocket = socket.into();
    socket.set_write_timeout(Some(config.send_timeout))?;
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_pair_binds_adjacent_ports() {
        let config = StreamConfig {
            server_rtp_port: 57_342,
            ..Default::default()
        };
        let pair = UdpPair::open(&config).expect("bind socket pair");
        assert_eq!(pair.rtp_port, 57_342);
        assert_eq!(pair.rtcp_port, 57_343);
        assert_eq!(pair.rtp.local_addr().unwrap().port(), 57_342);
        assert_eq!(pair.rtcp.local_addr().unwrap().port(), 57_343);
    }

    #[test]
    fn open_pair_rejects_port_overflow() {
        let config = StreamConfig {
            server_rtp_port: u16::MAX,
            ..Default::default()
        };
        assert!(UdpPair::open(&config).is_err());
    }
}
