//! Statistics for capture workers, sessions and the registry

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::device::Endpoint;
use crate::session::{EndReason, SessionPhase, SessionToken};

/// Live counters shared between a session and its capture threads
///
/// Counters survive profile switches: they describe the session, not one
/// stream. Dimensions are those of the stream opened last.
#[derive(Debug)]
pub struct CaptureCounters {
    started_at: Instant,
    frames_decoded: AtomicU64,
    frames_dropped: AtomicU64,
    bytes_decoded: AtomicU64,
    captures_started: AtomicU32,
    width: AtomicU32,
    height: AtomicU32,
}

impl CaptureCounters {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_decoded: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            captures_started: AtomicU32::new(0),
            width: AtomicU32::new(0),
            height: AtomicU32::new(0),
        }
    }

    /// Record that a stream was opened with the given frame size
    pub fn stream_opened(&self, width: u32, height: u32) {
        self.captures_started.fetch_add(1, Ordering::Relaxed);
        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);
    }

    /// Record a published frame and return its sequence number
    pub fn record_frame(&self, bytes: usize) -> u64 {
        self.bytes_decoded.fetch_add(bytes as u64, Ordering::Relaxed);
        self.frames_decoded.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a frame discarded for not matching the stream dimensions
    pub fn record_drop(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Next sequence number to be assigned
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn bytes_decoded(&self) -> u64 {
        self.bytes_decoded.load(Ordering::Relaxed)
    }

    /// Number of streams opened over the session's life
    pub fn captures_started(&self) -> u32 {
        self.captures_started.load(Ordering::Relaxed)
    }

    /// Frame size of the latest stream, if one was opened
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let width = self.width.load(Ordering::Relaxed);
        let height = self.height.load(Ordering::Relaxed);
        if width == 0 || height == 0 {
            None
        } else {
            Some((width, height))
        }
    }

    /// Average decoded frames per second since the session started
    pub fn calculated_framerate(&self) -> f64 {
        let secs = self.started_at.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.frames_decoded() as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for CaptureCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of one session
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub token: SessionToken,
    pub endpoint: Endpoint,
    pub phase: SessionPhase,
    /// Selected profile (None until the device connected)
    pub profile: Option<String>,
    /// Why the session ended, once terminated
    pub end_reason: Option<EndReason>,
    /// Time since the session was created
    pub age: Duration,
    /// Time since the last client activity
    pub idle: Duration,
    pub frames_decoded: u64,
    pub frames_dropped: u64,
    pub bytes_decoded: u64,
    /// Streams opened, one per start or profile switch
    pub captures_started: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Average decode rate over the session's life
    pub framerate: f64,
}

/// Registry-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Sessions currently in the registry
    pub sessions: usize,
    pub initializing: usize,
    pub active: usize,
    pub switching_profile: usize,
    /// Terminated sessions awaiting the next sweep
    pub terminated: usize,
    /// Sessions created since the registry started
    pub total_created: u64,
    /// Sessions removed by the reaper since the registry started
    pub total_reaped: u64,
}

impl RegistryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a session in the given phase
    pub fn count(&mut self, phase: SessionPhase) {
        self.sessions += 1;
        match phase {
            SessionPhase::Initializing => self.initializing += 1,
            SessionPhase::Active => self.active += 1,
            SessionPhase::SwitchingProfile => self.switching_profile += 1,
            SessionPhase::Terminated => self.terminated += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_counters_new() {
        let counters = CaptureCounters::new();
        assert_eq!(counters.frames_decoded(), 0);
        assert_eq!(counters.frames_dropped(), 0);
        assert_eq!(counters.bytes_decoded(), 0);
        assert_eq!(counters.captures_started(), 0);
        assert!(counters.dimensions().is_none());
    }

    #[test]
    fn test_record_frame_returns_sequence() {
        let counters = CaptureCounters::new();

        assert_eq!(counters.record_frame(100), 0);
        assert_eq!(counters.record_frame(100), 1);
        assert_eq!(counters.frames_decoded(), 2);
        assert_eq!(counters.bytes_decoded(), 200);
    }

    #[test]
    fn test_stream_opened_tracks_latest_dimensions() {
        let counters = CaptureCounters::new();

        counters.stream_opened(1920, 1080);
        counters.stream_opened(640, 360);

        assert_eq!(counters.captures_started(), 2);
        assert_eq!(counters.dimensions(), Some((640, 360)));
    }

    #[test]
    fn test_record_drop() {
        let counters = CaptureCounters::new();
        counters.record_drop();
        counters.record_drop();
        assert_eq!(counters.frames_dropped(), 2);
        assert_eq!(counters.frames_decoded(), 0);
    }

    #[test]
    fn test_framerate_without_frames() {
        let counters = CaptureCounters::new();
        assert!(counters.calculated_framerate() >= 0.0);
    }

    #[test]
    fn test_registry_stats_count() {
        let mut stats = RegistryStats::new();
        stats.count(SessionPhase::Active);
        stats.count(SessionPhase::Active);
        stats.count(SessionPhase::Terminated);
        stats.count(SessionPhase::SwitchingProfile);

        assert_eq!(stats.sessions, 4);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.terminated, 1);
        assert_eq!(stats.switching_profile, 1);
        assert_eq!(stats.initializing, 0);
    }
}
