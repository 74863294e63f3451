//! Session state machine
//!
//! Tracks a session from the connect request to termination. The pure
//! transition logic lives on [`Lifecycle`]; `Session` keeps one `Lifecycle`
//! in a watch cell and applies these transitions under its lock.

use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::capture::CaptureError;

/// Opaque session identifier handed to clients (cookie value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Generate a fresh random token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for thread names and compact logs
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connecting to the device and starting the first capture
    Initializing,
    /// Capturing under the selected profile
    Active,
    /// Replacing the capture for a new profile
    SwitchingProfile,
    /// Ended; every further operation is rejected
    Terminated,
}

impl SessionPhase {
    /// Phases subject to the idle timeout
    pub fn is_live(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::SwitchingProfile)
    }
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// No client activity within the session timeout
    IdleTimeout,
    /// The video stream failed
    StreamEnded(CaptureError),
    /// The device could not be reached while starting
    ConnectFailed(String),
    /// Ended on request (client logout, shutdown)
    Closed,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::IdleTimeout => write!(f, "idle_timeout"),
            EndReason::StreamEnded(e) => write!(f, "stream_ended: {}", e),
            EndReason::ConnectFailed(e) => write!(f, "connect_failed: {}", e),
            EndReason::Closed => write!(f, "closed"),
        }
    }
}

/// Mutable session state guarded as one unit
#[derive(Debug, Clone)]
pub struct Lifecycle {
    /// Current phase
    pub phase: SessionPhase,

    /// Last client activity
    pub last_activity: Instant,

    /// Selected profile, set once the device answered
    pub profile: Option<String>,

    /// Set when the session terminates
    pub end_reason: Option<EndReason>,
}

impl Lifecycle {
    /// Create a lifecycle in the initializing phase
    pub fn new(now: Instant) -> Self {
        Self {
            phase: SessionPhase::Initializing,
            last_activity: now,
            profile: None,
            end_reason: None,
        }
    }

    /// Check if the session has terminated
    pub fn is_terminated(&self) -> bool {
        self.phase == SessionPhase::Terminated
    }

    /// Record client activity
    ///
    /// Returns false for terminated sessions. The timestamp never moves
    /// backwards, even if callers race with stale `now` readings.
    pub fn touch(&mut self, now: Instant) -> bool {
        if self.is_terminated() {
            return false;
        }
        if now > self.last_activity {
            self.last_activity = now;
        }
        true
    }

    /// Time since the last activity
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Whether the idle timeout has been reached
    ///
    /// Only live sessions expire; an initializing session is bounded by the
    /// device connect instead.
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.phase.is_live() && self.idle_for(now) >= timeout
    }

    /// Enter `Active` with `profile` selected (from `Initializing` or `SwitchingProfile`)
    pub fn activate(&mut self, profile: String, now: Instant) -> bool {
        match self.phase {
            SessionPhase::Initializing | SessionPhase::SwitchingProfile => {
                self.phase = SessionPhase::Active;
                self.profile = Some(profile);
                self.touch(now);
                true
            }
            SessionPhase::Active | SessionPhase::Terminated => false,
        }
    }

    /// Enter `SwitchingProfile` (from `Active` only)
    pub fn begin_switch(&mut self) -> bool {
        if self.phase == SessionPhase::Active {
            self.phase = SessionPhase::SwitchingProfile;
            true
        } else {
            false
        }
    }

    /// Abandon a switch and return to `Active` with the old profile
    pub fn cancel_switch(&mut self) -> bool {
        if self.phase == SessionPhase::SwitchingProfile {
            self.phase = SessionPhase::Active;
            true
        } else {
            false
        }
    }

    /// Enter `Terminated`
    ///
    /// Returns false if already terminated; the first reason is kept.
    pub fn terminate(&mut self, reason: EndReason) -> bool {
        if self.is_terminated() {
            return false;
        }
        self.phase = SessionPhase::Terminated;
        self.end_reason = Some(reason);
        true
    }
}
