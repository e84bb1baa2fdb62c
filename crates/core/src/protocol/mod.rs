//! RTSP protocol implementation (RFC 2326).
//!
//! Text-based signaling for the stream: parsing requests, building
//! responses, dispatching methods, and generating the SDP description.
//!
//! ## RTSP message format (RFC 2326 §4)
//!
//! ```text
//! DESCRIBE rtsp://server/stream RTSP/1.0\r\n
//! CSeq: 2\r\n
//! Accept: application/sdp\r\n
//! \r\n
//! ```
//!
//! ## Supported methods
//!
//! | Method | Purpose |
//! |--------|---------|
//! | OPTIONS | Capability discovery |
//! | DESCRIBE | SDP session description |
//! | SETUP | Transport negotiation (interleaved TCP or UDP ports) |
//! | PLAY | Start media delivery |
//! | TEARDOWN | End the session |
//!
//! Anything else is answered with a bare `200 OK`: common viewers probe
//! with methods this server does not implement, and rejecting them costs
//! more interoperability than it buys correctness.

pub mod handler;
pub mod request;
pub mod response;
pub mod sdp;

pub use handler::{HandlerOutcome, MethodHandler};
pub use request::RtspRequest;
pub use response::RtspResponse;
