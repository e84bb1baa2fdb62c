use std::io;
use std::path::PathBuf;

use clap::Parser;
use mjpeg_rtsp::stream::FrameSource;
use mjpeg_rtsp::{Server, StreamConfig};

#[derive(Parser)]
#[command(
    name = "mjpeg-rtsp-server",
    about = "RTSP server replaying a JPEG file as a live MJPEG stream"
)]
struct Args {
    /// Bind address (host:port)
    #[arg(long, short, default_value = "0.0.0.0:554")]
    bind: String,

    /// JPEG file replayed as every frame
    jpeg: PathBuf,

    /// Target frame rate
    #[arg(long, default_value_t = 15)]
    fps: u32,

    /// Local UDP port for RTP (RTCP binds the next port)
    #[arg(long, default_value_t = 50_000)]
    rtp_port: u16,

    /// Refuse interleaved TCP transport (serve UDP only)
    #[arg(long)]
    no_tcp: bool,
}

/// Replays one JPEG file as an endless frame stream.
struct FileSource {
    frame: Vec<u8>,
}

impl FrameSource for FileSource {
    fn get_next_frame(&mut self) -> Option<Vec<u8>> {
        Some(self.frame.clone())
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let frame = match std::fs::read(&args.jpeg) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read {}: {}", args.jpeg.display(), e);
            return;
        }
    };

    let config = StreamConfig {
        frame_rate: args.fps,
        enable_tcp_transport: !args.no_tcp,
        server_rtp_port: args.rtp_port,
        ..Default::default()
    };

    let mut server = Server::with_config(&args.bind, config);

    if let Err(e) = server.start(Box::new(FileSource { frame })) {
        eprintln!("Failed to start server: {}", e);
        return;
    }

    println!("RTSP server on {} — press Enter to stop", args.bind);
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();

    server.stop();
}
