//! RTP media framing for the JPEG stream.
//!
//! Each captured JPEG frame is split into one or more RTP packets.
//! Every packet carries the 12-byte fixed header ([`rtp::RtpHeader`],
//! RFC 3550 §5.1) followed by the 8-byte JPEG payload header and a
//! fragment of the frame ([`jpeg::JpegPacketizer`], RFC 2435).
//!
//! [`rtcp`] builds the periodic Sender Report that accompanies the RTP
//! stream on the UDP transport.

pub mod jpeg;
pub mod rtcp;
pub mod rtp;

pub use jpeg::JpegPacketizer;

/// Static RTP payload type for JPEG video (RFC 3551 table 5).
pub const JPEG_PAYLOAD_TYPE: u8 = 26;

/// RTP fixed header length in bytes.
pub const RTP_HEADER_LEN: usize = 12;

/// RFC 2435 JPEG payload header length in bytes.
pub const JPEG_HEADER_LEN: usize = 8;
