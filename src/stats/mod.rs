//! Capture, session and registry statistics

pub mod metrics;

pub use metrics::{CaptureCounters, RegistryStats, SessionStats};
