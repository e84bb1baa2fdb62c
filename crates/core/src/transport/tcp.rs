//! RTSP control transport: single-slot accept loop and request loop.
//!
//! One TCP connection is served to completion before the next `accept` is
//! issued — the server intentionally has no concurrent-session handling,
//! matching its one-viewer deployment. A second viewer connecting while
//! the first is attached waits in the listen backlog.
//!
//! When the negotiated transport is interleaved, the same socket carries
//! RTP data frames (`$`-framed, channel 0); [`send_interleaved`] is the
//! send loop's entry point onto the control socket.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::StreamConfig;
use crate::protocol::{HandlerOutcome, MethodHandler, RtspRequest};
use crate::session::SessionHandle;

/// Interleaved channel carrying RTP (RFC 2326 §10.12). Channel 1 is
/// reserved for RTCP and never written.
pub const RTP_CHANNEL: u8 = 0;

/// Poll interval for the non-blocking accept loop.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Single-slot accept loop.
///
/// Checks the `running` flag between accepts so that
/// [`crate::server::Server::stop`] can terminate it promptly. Each
/// accepted connection runs inline: no new session can start until the
/// current one reaches TEARDOWN or disconnects.
pub fn accept_loop(
    listener: TcpListener,
    handle: Arc<SessionHandle>,
    config: Arc<StreamConfig>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                if stream.set_nonblocking(false).is_err() {
                    continue;
                }
                Connection::handle(stream, peer_addr, &handle, &config, &running);
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            }
        }
    }
    tracing::debug!("accept loop exited");
}

/// Frame an RTP packet for the interleaved channel:
/// `$`, channel byte, 16-bit big-endian length, packet.
pub fn frame_interleaved(channel: u8, packet: &[u8]) -> Vec<u8> {
    debug_assert!(packet.len() <= u16::MAX as usize);
    let mut framed = Vec::with_capacity(4 + packet.len());
    framed.push(b'$');
    framed.push(channel);
    framed.extend_from_slice(&(packet.len() as u16).to_be_bytes());
    framed.extend_from_slice(packet);
    framed
}

/// Write one `$`-framed RTP packet onto the control socket.
///
/// The mutex is shared with the control loop's response writer, so a data
/// frame can never tear an RTSP response (and vice versa).
pub fn send_interleaved(stream: &Mutex<TcpStream>, channel: u8, packet: &[u8]) -> io::Result<()> {
    let framed = frame_interleaved(channel, packet);
    let mut guard = stream.lock();
    guard.write_all(&framed)
}

/// One RTSP client connection: reader, write-mutexed socket, and the
/// method handler holding this session's identity.
struct Connection {
    reader: BufReader<TcpStream>,
    writer: Arc<Mutex<TcpStream>>,
    handler: MethodHandler,
    peer_addr: SocketAddr,
}

impl Connection {
    /// Serve one accepted connection to completion.
    fn handle(
        stream: TcpStream,
        peer_addr: SocketAddr,
        handle: &Arc<SessionHandle>,
        config: &Arc<StreamConfig>,
        running: &Arc<AtomicBool>,
    ) {
        tracing::info!(%peer_addr, "client connected");

        // Fresh session: no streaming, no transport, until negotiated anew.
        handle.set_streaming(false);
        handle.clear_transport();

        let reader_stream = match stream.try_clone() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "could not clone control socket");
                return;
            }
        };
        let writer = Arc::new(Mutex::new(stream));

        let handler = MethodHandler::new(
            handle.clone(),
            config.clone(),
            peer_addr,
            writer.clone(),
        );

        let mut conn = Connection {
            reader: BufReader::new(reader_stream),
            writer,
            handler,
            peer_addr,
        };

        let reason = conn.run(running);

        // Closing: release everything the session held.
        handle.set_streaming(false);
        handle.clear_transport();

        tracing::info!(%peer_addr, reason, "client disconnected");
    }

    /// RTSP request/response loop. Returns the reason for exiting.
    fn run(&mut self, running: &Arc<AtomicBool>) -> &'static str {
        while running.load(Ordering::SeqCst) {
            let request_text = match self.next_request() {
                Ok(Some(text)) => text,
                Ok(None) => return "connection closed by client",
                Err(_) => return "read error",
            };

            if request_text.trim().is_empty() {
                continue;
            }

            match RtspRequest::parse(&request_text) {
                Ok(request) => {
                    tracing::debug!(
                        peer = %self.peer_addr,
                        method = %request.method,
                        uri = %request.uri,
                        "request"
                    );

                    let (response, outcome) = self.handler.handle(&request);

                    tracing::debug!(
                        peer = %self.peer_addr,
                        status = response.status_code,
                        "response"
                    );

                    if self
                        .writer
                        .lock()
                        .write_all(response.serialize().as_bytes())
                        .is_err()
                    {
                        return "write error";
                    }

                    if matches!(outcome, HandlerOutcome::EndSession) {
                        return "session ended";
                    }
                }
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "parse error");
                }
            }
        }

        "server shutting down"
    }

    /// Read the next complete request (headers through blank line).
    ///
    /// `$`-prefixed interleaved frames arriving from the client (its RTCP
    /// over the control channel) are consumed and discarded instead of
    /// being fed to the text parser. `Ok(None)` signals end-of-stream.
    fn next_request(&mut self) -> io::Result<Option<String>> {
        let first = {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }
            buf[0]
        };

        if first == b'$' {
            let mut header = [0u8; 4];
            self.reader.read_exact(&mut header)?;
            let len = u16::from_be_bytes([header[2], header[3]]) as u64;
            io::copy(&mut (&mut self.reader).take(len), &mut io::sink())?;
            tracing::trace!(channel = header[1], len, "skipped interleaved client data");
            return Ok(Some(String::new()));
        }

        let mut request_text = String::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return if request_text.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(request_text))
                };
            }
            request_text.push_str(&line);
            if line == "\r\n" || line == "\n" {
                break;
            }
        }
        Ok(Some(request_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_frame_layout() {
        let packet = [0x80u8, 0x9A, 0x00, 0x01];
        let framed = frame_interleaved(RTP_CHANNEL, &packet);
        assert_eq!(framed[0], b'$');
        assert_eq!(framed[1], 0);
        assert_eq!(u16::from_be_bytes([framed[2], framed[3]]), 4);
        assert_eq!(&framed[4..], &packet);
    }

    #[test]
    fn interleaved_length_is_big_endian() {
        let packet = vec![0u8; 300];
        let framed = frame_interleaved(RTP_CHANNEL, &packet);
        assert_eq!(framed[2], 0x01);
        assert_eq!(framed[3], 0x2C);
    }
}
