//! Video decoding boundary
//!
//! Decoding is blocking work owned by a capture thread, so these traits are
//! synchronous. An implementation wraps whatever RTSP/H.264 stack the binary
//! links (ffmpeg, gstreamer, a hardware decoder).

use bytes::Bytes;

use crate::device::redact_uri;

/// Errors raised while opening or reading a video stream
///
/// Cloneable so the terminal error can be parked in the frame slot and read by
/// every session operation that follows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The stream could not be opened
    #[error("failed to open stream {uri}: {reason}")]
    Open {
        /// Stream URI with the password masked
        uri: String,
        reason: String,
    },

    /// Reading or decoding a frame failed
    #[error("stream read failed: {0}")]
    Read(String),

    /// The server closed the stream
    #[error("end of stream")]
    EndOfStream,

    /// The capture thread could not be started
    #[error("failed to spawn capture thread: {0}")]
    Spawn(String),

    /// The capture thread panicked before it could be joined
    #[error("capture thread panicked")]
    WorkerPanicked,
}

impl CaptureError {
    /// Build an [`CaptureError::Open`] without leaking credentials from `uri`
    pub fn open(uri: &str, reason: impl std::fmt::Display) -> Self {
        CaptureError::Open {
            uri: redact_uri(uri),
            reason: reason.to_string(),
        }
    }
}

/// An opened video stream
pub trait VideoSource: Send {
    /// Frame size of the stream, fixed for the lifetime of the source
    fn dimensions(&self) -> (u32, u32);

    /// Block until the next frame is decoded
    ///
    /// Returns tightly packed RGB8 pixels (`width * height * 3` bytes).
    /// Implementations should bound the wait with a read timeout; that timeout
    /// is the worst-case latency of stopping a capture.
    fn read_frame(&mut self) -> Result<Bytes, CaptureError>;
}

/// Opens video streams by URI
pub trait StreamOpener: Send + Sync {
    /// Connect to the stream and prepare the decoder
    fn open(&self, uri: &str) -> Result<Box<dyn VideoSource>, CaptureError>;
}
