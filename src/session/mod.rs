//! Client sessions
//!
//! A session owns one device connection and one capture worker. Its phase
//! moves strictly forward apart from the switch round trip:
//!
//! ```text
//!   Initializing ──► Active ◄──► SwitchingProfile
//!        │             │                │
//!        └─────────────┴───► Terminated ◄┘
//! ```

pub mod handle;
pub mod snapshot;
pub mod state;

pub use handle::Session;
pub use snapshot::{Snapshot, DEFAULT_JPEG_QUALITY};
pub use state::{EndReason, Lifecycle, SessionPhase, SessionToken};
