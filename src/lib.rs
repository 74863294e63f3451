//! Shared PTZ camera sessions
//!
//! Several web clients can control one pan-tilt-zoom camera at the same
//! time. Each client holds a session token; each session owns a device
//! connection and a capture thread that keeps the latest video frame ready
//! for snapshots. Sessions that stop hearing from their client are reaped.
//!
//! ```text
//!   HTTP layer ──► PtzService ──► SessionRegistry ──► Session ──► FrameCapture
//!                                      ▲                 │            │
//!                                   reaper          PtzDevice    StreamOpener
//! ```
//!
//! The camera protocol and the video decoder are supplied by the caller
//! through [`device::DeviceConnector`] and [`capture::StreamOpener`].
//!
//! # Example
//!
//! ```ignore
//! let service = PtzService::new(connector, opener);
//! service.spawn_reaper();
//!
//! let token = service
//!     .create_session(&Endpoint::new("192.168.1.64", 80), &Credentials::new("admin", "pw"))
//!     .await?;
//! service.forward_command(&token, PtzCommand::GotoHome).await?;
//! if let Some(snapshot) = service.get_snapshot(&token).await? {
//!     println!("{}", snapshot.to_data_uri());
//! }
//! ```

pub mod capture;
pub mod device;
pub mod error;
pub mod registry;
pub mod service;
pub mod session;
pub mod stats;

#[cfg(test)]
mod testing;

pub use device::{Credentials, Endpoint, PtzCommand};
pub use error::{Error, Result};
pub use registry::{RegistryConfig, SessionRegistry};
pub use service::PtzService;
pub use session::{Session, SessionPhase, SessionToken, Snapshot};
