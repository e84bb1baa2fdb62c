use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::StreamConfig;
use crate::protocol::request::RtspRequest;
use crate::protocol::response::RtspResponse;
use crate::protocol::sdp;
use crate::session::{self, RtpTransport, SessionHandle, TransportHeader};
use crate::transport::udp::UdpPair;

/// What the connection loop should do after writing the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Keep reading requests on this connection.
    Continue,
    /// Close the connection: TEARDOWN, or a protocol error that makes the
    /// session unrecoverable (unparseable SETUP transport).
    EndSession,
}

/// Handles RTSP methods for the one live control connection.
///
/// Owns this session's identity and writes the negotiated transport and
/// `streaming` flag into the shared [`SessionHandle`]; the send loop only
/// ever observes those fields.
pub struct MethodHandler {
    handle: Arc<SessionHandle>,
    config: Arc<StreamConfig>,
    client_addr: SocketAddr,
    /// The control socket, shared with the connection's response writer;
    /// becomes the media channel when SETUP picks interleaved transport.
    control: Arc<Mutex<TcpStream>>,
    session_id: String,
}

impl MethodHandler {
    pub fn new(
        handle: Arc<SessionHandle>,
        config: Arc<StreamConfig>,
        client_addr: SocketAddr,
        control: Arc<Mutex<TcpStream>>,
    ) -> Self {
        MethodHandler {
            handle,
            config,
            client_addr,
            control,
            session_id: session::next_session_id(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn handle(&mut self, request: &RtspRequest) -> (RtspResponse, HandlerOutcome) {
        let cseq = request.cseq();

        match request.method.as_str() {
            "OPTIONS" => (self.handle_options(cseq), HandlerOutcome::Continue),
            "DESCRIBE" => (self.handle_describe(cseq), HandlerOutcome::Continue),
            "SETUP" => self.handle_setup(cseq, request),
            "PLAY" => (self.handle_play(cseq), HandlerOutcome::Continue),
            "TEARDOWN" => (self.handle_teardown(cseq), HandlerOutcome::EndSession),
            method => {
                // Unknown verbs get a bare 200: viewers probe with methods
                // this server does not implement, and the session must
                // survive every one of them.
                tracing::debug!(method, cseq, "unrecognized method answered 200");
                (RtspResponse::ok().add_header("CSeq", cseq), HandlerOutcome::Continue)
            }
        }
    }

    fn handle_options(&self, cseq: &str) -> RtspResponse {
        tracing::debug!(cseq, "OPTIONS");
        RtspResponse::ok()
            .add_header("CSeq", cseq)
            .add_header("Public", "OPTIONS, DESCRIBE, SETUP, PLAY, TEARDOWN")
    }

    fn handle_describe(&self, cseq: &str) -> RtspResponse {
        tracing::debug!(cseq, "DESCRIBE");
        let body = sdp::describe_body(&self.config.stream_name, self.config.frame_rate);
        RtspResponse::ok()
            .add_header("CSeq", cseq)
            .add_header("Content-Type", "application/sdp")
            .with_body(body)
    }

    fn handle_setup(
        &mut self,
        cseq: &str,
        request: &RtspRequest,
    ) -> (RtspResponse, HandlerOutcome) {
        let Some(transport_header) = request.get_header("Transport") else {
            tracing::warn!(cseq, "SETUP without Transport header");
            return (
                RtspResponse::unsupported_transport().add_header("CSeq", cseq),
                HandlerOutcome::Continue,
            );
        };

        if transport_header.contains("RTP/AVP/TCP") {
            return (self.setup_interleaved(cseq, transport_header), HandlerOutcome::Continue);
        }
        if transport_header.contains("RTP/AVP") {
            return self.setup_udp(cseq, transport_header);
        }

        tracing::warn!(cseq, transport = transport_header, "unsupported transport token");
        (
            RtspResponse::unsupported_transport().add_header("CSeq", cseq),
            HandlerOutcome::Continue,
        )
    }

    fn setup_interleaved(&mut self, cseq: &str, transport_header: &str) -> RtspResponse {
        if !self.config.enable_tcp_transport {
            tracing::warn!(cseq, transport = transport_header, "interleaved transport disabled");
            return RtspResponse::unsupported_transport().add_header("CSeq", cseq);
        }

        // Replaces (and thereby releases) any UDP sockets from an earlier
        // SETUP on this connection.
        self.handle.set_transport(RtpTransport::TcpInterleaved {
            stream: self.control.clone(),
        });

        tracing::info!(
            session_id = %self.session_id,
            peer = %self.client_addr,
            "interleaved transport configured"
        );

        RtspResponse::ok()
            .add_header("CSeq", cseq)
            .add_header("Transport", "RTP/AVP/TCP;unicast;interleaved=0-1")
            .add_header("Session", &session::session_header_value(&self.session_id))
    }

    fn setup_udp(
        &mut self,
        cseq: &str,
        transport_header: &str,
    ) -> (RtspResponse, HandlerOutcome) {
        let Some(ports) = TransportHeader::parse(transport_header) else {
            tracing::warn!(cseq, transport = transport_header, "unparseable client_port");
            return (
                RtspResponse::bad_request().add_header("CSeq", cseq),
                HandlerOutcome::EndSession,
            );
        };

        let pair = match UdpPair::open(&self.config) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "could not open UDP transport sockets");
                return (
                    RtspResponse::unsupported_transport().add_header("CSeq", cseq),
                    HandlerOutcome::Continue,
                );
            }
        };

        let client_rtp = SocketAddr::new(self.client_addr.ip(), ports.client_rtp_port);
        let client_rtcp = SocketAddr::new(self.client_addr.ip(), ports.client_rtcp_port);

        let transport_response = format!(
            "RTP/AVP;unicast;client_port={}-{};server_port={}-{}",
            ports.client_rtp_port, ports.client_rtcp_port, pair.rtp_port, pair.rtcp_port
        );

        tracing::info!(
            session_id = %self.session_id,
            %client_rtp,
            server_rtp_port = pair.rtp_port,
            "UDP transport configured"
        );

        self.handle.set_transport(RtpTransport::Udp {
            rtp: pair.rtp,
            rtcp: pair.rtcp,
            client_rtp,
            client_rtcp,
        });

        (
            RtspResponse::ok()
                .add_header("CSeq", cseq)
                .add_header("Transport", &transport_response)
                .add_header("Session", &session::session_header_value(&self.session_id)),
            HandlerOutcome::Continue,
        )
    }

    fn handle_play(&self, cseq: &str) -> RtspResponse {
        self.handle.stats().reset_window();
        self.handle.set_streaming(true);
        tracing::info!(session_id = %self.session_id, "streaming started");

        RtspResponse::ok()
            .add_header("CSeq", cseq)
            .add_header("Session", &session::session_header_value(&self.session_id))
            .add_header("Range", "npt=0.000-")
    }

    fn handle_teardown(&self, cseq: &str) -> RtspResponse {
        self.handle.set_streaming(false);
        self.handle.clear_transport();
        tracing::info!(session_id = %self.session_id, "session ended via TEARDOWN");

        RtspResponse::ok()
            .add_header("CSeq", cseq)
            .add_header("Session", &session::session_header_value(&self.session_id))
    }
}
