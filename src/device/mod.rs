//! Device-control boundary
//!
//! The camera protocol (ONVIF discovery, profile negotiation, PTZ moves) lives
//! outside this crate. Sessions see it through two traits:
//!
//! - [`DeviceConnector`] opens one control connection per session.
//! - [`PtzDevice`] is that connection: it lists profiles, resolves a profile's
//!   stream URI and executes [`PtzCommand`]s.

pub mod command;
pub mod endpoint;

use std::sync::Arc;

use async_trait::async_trait;

pub use command::{
    AxisRange, CommandOutput, DeviceConfigs, MovingStatus, Preset, PtzCommand, PtzPosition,
    PtzVector, StreamProfile,
};
pub use endpoint::{inject_credentials, redact_uri, Credentials, Endpoint};

/// Errors reported by the device-control implementation
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeviceError {
    /// The camera could not be reached or refused the login
    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// The camera answered but rejected the request
    #[error("device rejected request: {0}")]
    Rejected(String),

    /// The camera's answer could not be understood
    #[error("device protocol error: {0}")]
    Protocol(String),
}

/// Opens control connections to a camera
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Connect and log in
    ///
    /// Succeeds only once the camera has answered a capability query, so a
    /// returned device is known to be reachable.
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Arc<dyn PtzDevice>, DeviceError>;
}

/// A connected camera
#[async_trait]
pub trait PtzDevice: Send + Sync {
    /// Names of the selectable media profiles
    fn profiles(&self) -> Vec<String>;

    /// Profile selected right after connecting
    fn default_profile(&self) -> String;

    /// Resolve the RTSP URI of a profile's video stream
    async fn stream_uri(&self, profile: &str) -> Result<String, DeviceError>;

    /// Execute a command under the given profile
    async fn send_command(
        &self,
        profile: &str,
        command: PtzCommand,
    ) -> Result<CommandOutput, DeviceError>;
}
