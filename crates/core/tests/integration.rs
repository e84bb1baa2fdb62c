//! Integration test: full RTSP handshake OPTIONS → DESCRIBE → SETUP →
//! PLAY over one control connection, with the first RTP datagram arriving
//! on the client's UDP port.
//!
//! TCP transport is disabled in the test config, so the interleaved SETUP
//! exercises the 461 path and the session must stay alive afterwards.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use mjpeg_rtsp::stream::FrameSource;
use mjpeg_rtsp::{Server, StreamConfig};

/// Fixed port for the control connection; bind_addr must be explicit.
const TEST_BIND: &str = "127.0.0.1:18554";

/// A frame source that replays one synthetic JPEG forever.
struct TestPattern {
    frame: Vec<u8>,
}

impl FrameSource for TestPattern {
    fn get_next_frame(&mut self) -> Option<Vec<u8>> {
        Some(self.frame.clone())
    }
}

/// Minimal well-formed JPEG: SOI, SOF0 with the given geometry, filler, EOI.
fn test_jpeg(width: u16, height: u16, body: usize) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    jpeg.extend_from_slice(&height.to_be_bytes());
    jpeg.extend_from_slice(&width.to_be_bytes());
    jpeg.extend_from_slice(&[0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    jpeg.extend(std::iter::repeat_n(0xA5, body));
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

fn rtsp_request(stream: &mut TcpStream, request: &str) -> std::io::Result<String> {
    stream.write_all(request.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(stream);
    let mut response = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        response.push_str(&line);
        if line == "\r\n" || line == "\n" {
            break;
        }
    }

    // Read the body if the headers declared one.
    if let Some(len) = response
        .lines()
        .find(|l| l.to_lowercase().starts_with("content-length:"))
        .and_then(|l| l.split(':').nth(1))
        .and_then(|v| v.trim().parse::<usize>().ok())
        && len > 0
    {
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body)?;
        response.push_str(&String::from_utf8_lossy(&body));
    }

    Ok(response)
}

fn connect() -> TcpStream {
    let addr = TEST_BIND.to_socket_addrs().unwrap().next().unwrap();
    let stream =
        TcpStream::connect_timeout(&addr, Duration::from_secs(2)).expect("connect to server");
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    stream
        .set_write_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    stream
}

#[test]
fn full_handshake_and_first_datagram() {
    let config = StreamConfig {
        frame_rate: 30,
        enable_tcp_transport: false,
        server_rtp_port: 58_400,
        ..Default::default()
    };
    let mut server = Server::with_config(TEST_BIND, config);
    server
        .start(Box::new(TestPattern {
            frame: test_jpeg(320, 240, 4000),
        }))
        .expect("server start");

    let mut stream = connect();
    let base_uri = "rtsp://127.0.0.1:18554/stream";

    // OPTIONS: CSeq echoed, method list advertised.
    let resp = rtsp_request(
        &mut stream,
        &format!("OPTIONS {} RTSP/1.0\r\nCSeq: 1\r\n\r\n", base_uri),
    )
    .expect("OPTIONS response");
    assert!(resp.starts_with("RTSP/1.0 200 OK"), "OPTIONS: {}", resp);
    assert!(resp.contains("CSeq: 1\r\n"));
    assert!(resp.contains("Public: OPTIONS, DESCRIBE, SETUP, PLAY, TEARDOWN"));

    // DESCRIBE: SDP with the JPEG track.
    let resp = rtsp_request(
        &mut stream,
        &format!("DESCRIBE {} RTSP/1.0\r\nCSeq: 2\r\n\r\n", base_uri),
    )
    .expect("DESCRIBE response");
    assert!(resp.starts_with("RTSP/1.0 200 OK"), "DESCRIBE: {}", resp);
    assert!(resp.contains("Content-Type: application/sdp"));
    assert!(resp.contains("m=video 0 RTP/AVP 26"));
    assert!(resp.contains("a=rtpmap:26 JPEG/90000"));
    assert!(resp.contains("a=framerate:30"));

    // Interleaved SETUP while TCP transport is disabled: 461, session lives.
    let resp = rtsp_request(
        &mut stream,
        &format!(
            "SETUP {} RTSP/1.0\r\nCSeq: 3\r\nTransport: RTP/AVP/TCP;unicast;interleaved=0-1\r\n\r\n",
            base_uri
        ),
    )
    .expect("SETUP/TCP response");
    assert!(
        resp.starts_with("RTSP/1.0 461 Unsupported Transport"),
        "SETUP/TCP: {}",
        resp
    );

    let resp = rtsp_request(
        &mut stream,
        &format!("OPTIONS {} RTSP/1.0\r\nCSeq: 4\r\n\r\n", base_uri),
    )
    .expect("OPTIONS after 461");
    assert!(
        resp.starts_with("RTSP/1.0 200 OK"),
        "session must survive a 461: {}",
        resp
    );

    // UDP SETUP against a real client socket.
    let rtp_client = UdpSocket::bind("127.0.0.1:0").expect("bind client RTP socket");
    rtp_client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let client_port = rtp_client.local_addr().unwrap().port();

    let resp = rtsp_request(
        &mut stream,
        &format!(
            "SETUP {} RTSP/1.0\r\nCSeq: 5\r\nTransport: RTP/AVP;unicast;client_port={}-{}\r\n\r\n",
            base_uri,
            client_port,
            client_port + 1
        ),
    )
    .expect("SETUP/UDP response");
    assert!(resp.starts_with("RTSP/1.0 200 OK"), "SETUP/UDP: {}", resp);
    assert!(resp.contains(&format!(
        "Transport: RTP/AVP;unicast;client_port={}-{};server_port=58400-58401",
        client_port,
        client_port + 1
    )));
    assert!(resp.contains("Session:"));

    // PLAY starts the stream.
    let resp = rtsp_request(
        &mut stream,
        &format!("PLAY {} RTSP/1.0\r\nCSeq: 6\r\n\r\n", base_uri),
    )
    .expect("PLAY response");
    assert!(resp.starts_with("RTSP/1.0 200 OK"), "PLAY: {}", resp);
    assert!(resp.contains("Range: npt=0.000-"));
    assert!(resp.contains("Session:"));

    // First RTP datagram: version 2, payload type 26, first fragment at
    // offset zero with the type-specific byte clear.
    let mut buf = [0u8; 2048];
    let (len, _) = rtp_client.recv_from(&mut buf).expect("first RTP datagram");
    assert!(len > 20, "datagram must carry RTP + JPEG headers");
    assert_eq!(buf[0], 0x80);
    assert_eq!(buf[1] & 0x7F, 26);
    assert_eq!(buf[12], 0x00, "first fragment type-specific byte");
    assert_eq!(&buf[13..16], &[0, 0, 0], "first fragment offset");
    assert_eq!(&buf[20..22], &[0xFF, 0xD8], "payload starts at SOI");

    // Unknown methods are answered 200 without ending the session.
    let resp = rtsp_request(
        &mut stream,
        &format!("GET_PARAMETER {} RTSP/1.0\r\nCSeq: 7\r\n\r\n", base_uri),
    )
    .expect("GET_PARAMETER response");
    assert!(resp.starts_with("RTSP/1.0 200 OK"), "unknown method: {}", resp);
    assert!(resp.contains("CSeq: 7\r\n"));

    // TEARDOWN ends the session; the single-slot server then accepts a
    // fresh connection.
    let resp = rtsp_request(
        &mut stream,
        &format!("TEARDOWN {} RTSP/1.0\r\nCSeq: 8\r\n\r\n", base_uri),
    )
    .expect("TEARDOWN response");
    assert!(resp.starts_with("RTSP/1.0 200 OK"), "TEARDOWN: {}", resp);

    let mut second = connect();
    let resp = rtsp_request(
        &mut second,
        &format!("OPTIONS {} RTSP/1.0\r\nCSeq: 1\r\n\r\n", base_uri),
    )
    .expect("OPTIONS on reconnect");
    assert!(
        resp.starts_with("RTSP/1.0 200 OK"),
        "server must accept again after TEARDOWN: {}",
        resp
    );

    server.stop();
}
