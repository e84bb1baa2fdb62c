use crate::error::{ParseErrorKind, RtspError};

/// A parsed RTSP request (RFC 2326 §6).
///
/// ```text
/// Method SP Request-URI SP RTSP-Version CRLF
/// *(Header: Value CRLF)
/// CRLF
/// ```
///
/// Parsing is deliberately lenient: only the method token is required.
/// A missing URI becomes `*`, the version is not validated, and header
/// lines without a colon are skipped rather than failing the request —
/// viewers in the field produce all of these.
#[derive(Debug)]
pub struct RtspRequest {
    /// RTSP method (OPTIONS, DESCRIBE, SETUP, PLAY, TEARDOWN, ...).
    pub method: String,
    /// Request-URI (e.g. `rtsp://host:554/stream`).
    pub uri: String,
    /// Headers as ordered (name, value) pairs. Names are stored
    /// as-received; lookups are case-insensitive (RFC 2326 §4.2).
    pub headers: Vec<(String, String)>,
}

impl RtspRequest {
    /// Parse an RTSP request from its text representation.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let mut lines = raw.lines();

        let request_line = lines.next().ok_or(RtspError::Parse {
            kind: ParseErrorKind::EmptyRequest,
        })?;

        let mut parts = request_line.split_whitespace();
        let method = parts
            .next()
            .ok_or(RtspError::Parse {
                kind: ParseErrorKind::MissingMethod,
            })?
            .to_string();
        let uri = parts.next().unwrap_or("*").to_string();

        if let Some(version) = parts.next()
            && version != "RTSP/1.0"
        {
            tracing::warn!(version, "client sent non-RTSP/1.0 version");
        }

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            match line.find(':') {
                Some(colon) => {
                    let name = line[..colon].trim().to_string();
                    let value = line[colon + 1..].trim().to_string();
                    headers.push((name, value));
                }
                None => {
                    tracing::debug!(line, "skipping malformed header line");
                }
            }
        }

        Ok(RtspRequest {
            method,
            uri,
            headers,
        })
    }

    /// Look up a header value by name (case-insensitive, RFC 2326 §4.2).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The CSeq value to echo in the response (RFC 2326 §12.17).
    ///
    /// Defaults to `"0"` when the client omitted the header — a request is
    /// never rejected over a missing CSeq.
    pub fn cseq(&self) -> &str {
        self.get_header("CSeq").unwrap_or("0")
    }
}
