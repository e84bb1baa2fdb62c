//! JPEG RTP packetizer (RFC 2435).
//!
//! Converts one complete JPEG frame into a sequence of wire-ready RTP
//! packets. Simpler than NAL-based codecs: fragmentation happens at the
//! frame level, with every packet carrying an 8-byte JPEG payload header
//! after the RTP fixed header:
//!
//! ```text
//!  0                   1                   2                   3
//! +---------------+---------------+---------------+---------------+
//! | Type-specific |              Fragment Offset                  |
//! +---------------+---------------+---------------+---------------+
//! |     Type      |       Q       |     Width     |    Height     |
//! +---------------+---------------+---------------+---------------+
//! ```
//!
//! Width and height are carried in units of 8 pixels and are read from the
//! frame's own SOF segment, so the advertised geometry always matches the
//! payload. Uses static payload type 26 (`a=rtpmap:26 JPEG/90000`).

use crate::config::StreamConfig;
use crate::error::{Result, RtspError};

use super::rtp::RtpHeader;
use super::{JPEG_HEADER_LEN, JPEG_PAYLOAD_TYPE, RTP_HEADER_LEN};

/// Fixed-capacity packet assembly buffer.
///
/// Appends are bounds-checked against the capacity chosen at construction,
/// so a header/payload accounting mistake fails loudly instead of growing
/// the packet past the negotiated size.
struct PacketBuf {
    buf: Vec<u8>,
    cap: usize,
}

impl PacketBuf {
    fn new(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
            cap,
        }
    }

    fn put(&mut self, bytes: &[u8]) {
        assert!(
            self.buf.len() + bytes.len() <= self.cap,
            "packet overflow: {} + {} > {}",
            self.buf.len(),
            bytes.len(),
            self.cap
        );
        self.buf.extend_from_slice(bytes);
    }

    fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// MJPEG RTP packetizer (RFC 2435).
///
/// Owns the [`RtpHeader`] stream state: the sequence number advances once
/// per emitted packet, the timestamp once per frame. One instance lives in
/// the send loop and survives across frames within a session.
#[derive(Debug)]
pub struct JpegPacketizer {
    header: RtpHeader,
    max_packet_size: usize,
    timestamp_increment: u32,
    type_code: u8,
    q: u8,
}

impl JpegPacketizer {
    /// Create with explicit SSRC.
    pub fn new(config: &StreamConfig, ssrc: u32) -> Self {
        Self {
            header: RtpHeader::new(JPEG_PAYLOAD_TYPE, ssrc),
            max_packet_size: config.max_packet_size,
            timestamp_increment: config.timestamp_increment(),
            type_code: config.jpeg_type_code,
            q: config.quantization_factor,
        }
    }

    /// Create with a random SSRC (RFC 3550 §8.1).
    pub fn with_random_ssrc(config: &StreamConfig) -> Self {
        Self {
            header: RtpHeader::with_random_ssrc(JPEG_PAYLOAD_TYPE),
            max_packet_size: config.max_packet_size,
            timestamp_increment: config.timestamp_increment(),
            type_code: config.jpeg_type_code,
            q: config.quantization_factor,
        }
    }

    pub fn ssrc(&self) -> u32 {
        self.header.ssrc
    }

    /// Sequence number the next packet will carry.
    pub fn next_sequence(&self) -> u16 {
        self.header.sequence()
    }

    /// RTP timestamp of the most recently packetized frame.
    pub fn rtp_timestamp(&self) -> u32 {
        self.header.timestamp()
    }

    /// Packetize one validated JPEG frame into RTP packets, ascending
    /// fragment offsets, marker bit on the final packet.
    ///
    /// The frame must begin with the start-of-image marker and contain an
    /// SOF segment to derive its dimensions from; anything else is
    /// rejected before a single packet is built. Concatenating the payload
    /// bytes of the returned packets reconstructs the frame exactly.
    pub fn packetize(&mut self, frame: &[u8]) -> Result<Vec<Vec<u8>>> {
        if frame.len() < 2 || frame[0] != 0xFF || frame[1] != 0xD8 {
            return Err(RtspError::InvalidFrame("missing start-of-image marker"));
        }
        let (width, height) = frame_dimensions(frame)
            .ok_or(RtspError::InvalidFrame("no SOF segment with dimensions"))?;

        // Once per frame, never per packet.
        self.header.advance_timestamp(self.timestamp_increment);

        let max_payload = self.max_packet_size - RTP_HEADER_LEN - JPEG_HEADER_LEN;
        let width8 = (width / 8) as u8;
        let height8 = (height / 8) as u8;

        let mut packets = Vec::with_capacity(frame.len() / max_payload + 1);
        let mut offset = 0usize;

        while offset < frame.len() {
            let chunk = usize::min(max_payload, frame.len() - offset);
            let last = offset + chunk >= frame.len();

            let rtp = self.header.write(last);
            let mut pkt = PacketBuf::new(RTP_HEADER_LEN + JPEG_HEADER_LEN + chunk);
            pkt.put(&rtp);
            pkt.put(&payload_header(
                offset == 0,
                offset as u32,
                self.type_code,
                self.q,
                width8,
                height8,
            ));
            pkt.put(&frame[offset..offset + chunk]);
            packets.push(pkt.into_inner());

            offset += chunk;
        }

        tracing::trace!(
            frame_bytes = frame.len(),
            rtp_packets = packets.len(),
            width,
            height,
            seq = self.header.sequence(),
            ts = self.header.timestamp(),
            "frame packetized"
        );

        Ok(packets)
    }
}

/// Build the 8-byte RFC 2435 payload header.
///
/// The first byte is 0x00 on the frame's first fragment and 0x80 on every
/// continuation fragment — the receivers this sender is paired with key on
/// that bit to resynchronize after loss.
fn payload_header(
    first: bool,
    offset: u32,
    type_code: u8,
    q: u8,
    width8: u8,
    height8: u8,
) -> [u8; JPEG_HEADER_LEN] {
    [
        if first { 0x00 } else { 0x80 },
        (offset >> 16) as u8,
        (offset >> 8) as u8,
        offset as u8,
        type_code,
        q,
        width8,
        height8,
    ]
}

/// Scan a JPEG buffer's marker segments for the SOF frame header and return
/// `(width, height)` in pixels.
///
/// Walks marker-to-marker from just past SOI: fill bytes and standalone
/// markers (RST, TEM) carry no length field; every other segment is skipped
/// by its declared length. Stops without an answer at SOS or EOI — a frame
/// whose scan data starts before any SOF has no usable geometry.
pub fn frame_dimensions(data: &[u8]) -> Option<(u16, u16)> {
    let mut i = 2usize;
    while i + 3 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        match marker {
            0xFF => {
                i += 1;
                continue;
            }
            0x01 | 0xD0..=0xD8 => {
                i += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if len < 2 || i + 2 + len > data.len() {
            return None;
        }

        // SOF0–SOF15, excluding DHT (C4), JPG (C8), DAC (CC)
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            if len < 7 {
                return None;
            }
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]);
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]);
            return Some((width, height));
        }

        i += 2 + len;
    }
    None
}
