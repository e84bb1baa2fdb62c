use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::config::StreamConfig;
use crate::error::{Result, RtspError};
use crate::session::SessionHandle;
use crate::stream::{FrameSource, Streamer};
use crate::transport::tcp;

/// High-level RTSP server orchestrator.
///
/// Owns the shared [`SessionHandle`] and the running flag, and spawns the
/// two loops of the system: the single-slot control loop
/// ([`tcp::accept_loop`]) and the frame send loop ([`Streamer`]).
pub struct Server {
    handle: Arc<SessionHandle>,
    config: Arc<StreamConfig>,
    bind_addr: String,
    running: Arc<AtomicBool>,
}

impl Server {
    pub fn new(bind_addr: &str) -> Self {
        Self::with_config(bind_addr, StreamConfig::default())
    }

    /// Create a server with custom stream configuration.
    pub fn with_config(bind_addr: &str, config: StreamConfig) -> Self {
        Self {
            handle: Arc::new(SessionHandle::new()),
            config: Arc::new(config),
            bind_addr: bind_addr.to_string(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Begin listening for one control connection at a time and spawn the
    /// send loop over the given frame source.
    pub fn start(&mut self, source: Box<dyn FrameSource>) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(RtspError::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.bind_addr)?;
        listener.set_nonblocking(true)?;

        self.running.store(true, Ordering::SeqCst);

        tracing::info!(addr = %self.bind_addr, "RTSP server listening");

        let handle = self.handle.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        thread::spawn(move || {
            tcp::accept_loop(listener, handle, config, running);
        });

        let streamer = Streamer::new(self.handle.clone(), self.config.clone());
        let running = self.running.clone();
        thread::spawn(move || {
            streamer.run(source, running);
        });

        Ok(())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("server stopping");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether a viewer is attached, has negotiated a transport, and has
    /// issued PLAY.
    pub fn is_client_ready(&self) -> bool {
        self.handle.is_client_ready()
    }

    /// The shared session state (admission flag, transport, statistics).
    pub fn session(&self) -> Arc<SessionHandle> {
        self.handle.clone()
    }

    /// The server's stream configuration.
    pub fn config(&self) -> Arc<StreamConfig> {
        self.config.clone()
    }
}
