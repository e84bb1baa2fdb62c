//! Error types for the MJPEG RTSP streaming core.

use std::fmt;

/// Errors that can occur in the streaming core.
///
/// Variants map to the failure taxonomy of the stack:
///
/// - **Protocol**: [`Parse`](Self::Parse) — malformed RTSP messages.
/// - **Media**: [`InvalidFrame`](Self::InvalidFrame) — a frame that must
///   never reach the wire.
/// - **Transport**: [`Io`](Self::Io) — socket/network failures.
/// - **Server**: [`AlreadyRunning`](Self::AlreadyRunning).
#[derive(Debug, thiserror::Error)]
pub enum RtspError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an RTSP request message (RFC 2326 §6).
    #[error("RTSP parse error: {kind}")]
    Parse { kind: ParseErrorKind },

    /// Frame rejected before packetization: missing the JPEG start-of-image
    /// marker, or no parseable SOF segment to derive dimensions from.
    #[error("invalid JPEG frame: {0}")]
    InvalidFrame(&'static str),

    /// [`Server::start`](crate::Server::start) was called while already running.
    #[error("server already running")]
    AlreadyRunning,
}

/// Specific kind of RTSP parse failure.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// Input was empty (no request line).
    EmptyRequest,
    /// Request line did not contain a method token.
    MissingMethod,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRequest => write!(f, "empty request"),
            Self::MissingMethod => write!(f, "missing method token"),
        }
    }
}

/// Convenience alias for `Result<T, RtspError>`.
pub type Result<T> = std::result::Result<T, RtspError>;
