pub mod config;
pub mod error;
pub mod media;
pub mod protocol;
pub mod server;
pub mod session;
pub mod stats;
pub mod stream;
pub mod transport;

pub use config::StreamConfig;
pub use error::{Result, RtspError};
pub use server::Server;
pub use stream::{FrameSource, Streamer};
