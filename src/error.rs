//! Error types

use crate::capture::CaptureError;
use crate::device::DeviceError;

/// Result alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by session operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown, expired or terminated session token
    #[error("unauthorized")]
    Unauthorized,

    /// The device could not be reached at connect or profile switch
    #[error("connection error: {0}")]
    Connection(String),

    /// A capture failed to start or stop
    #[error("stream error: {0}")]
    Stream(#[from] CaptureError),

    /// The device has no profile with this name
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// A forwarded command failed on the device
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// The snapshot could not be encoded
    #[error("encode error: {0}")]
    Encode(String),
}

impl Error {
    /// Whether the caller must create a new session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }
}
