//! Video capture
//!
//! Each live session runs one [`FrameCapture`] thread that decodes its
//! camera stream into a [`FrameSlot`]. Decoding itself sits behind the
//! [`StreamOpener`] / [`VideoSource`] traits.
//!
//! ```text
//!   StreamOpener::open(uri)
//!           │
//!           ▼
//!   [capture thread] ── read_frame() ──► FrameSlot (watch<Feed>)
//!           ▲                                 │
//!   CancellationToken                 snapshot readers
//! ```

pub mod frame;
pub mod source;
pub mod worker;

pub use frame::{Feed, Frame, FrameSlot};
pub use source::{CaptureError, StreamOpener, VideoSource};
pub use worker::{CaptureExit, FrameCapture};
