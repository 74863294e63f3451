//! Registry configuration

use std::time::Duration;

use crate::session::DEFAULT_JPEG_QUALITY;

/// Default idle timeout before a session is reaped
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the device handshake at session creation
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between expiry sweeps
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(1);

/// Session registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Idle time after which a live session is terminated
    pub session_timeout: Duration,

    /// How often the reaper sweeps for expired sessions
    pub reap_interval: Duration,

    /// Longest a new session may spend connecting before it fails
    pub connect_timeout: Duration,

    /// JPEG quality for snapshots (1-100)
    pub jpeg_quality: u8,

    /// Reject reuse of an endpoint's session with different credentials
    pub require_matching_credentials: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            reap_interval: DEFAULT_REAP_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            require_matching_credentials: true,
        }
    }
}

impl RegistryConfig {
    /// Set the idle timeout
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Set the sweep interval (zero is raised to 1ms)
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the connect timeout (zero is raised to 1ms)
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    /// Set snapshot JPEG quality
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Share an endpoint's session regardless of the credentials presented
    pub fn allow_credential_mismatch(mut self) -> Self {
        self.require_matching_credentials = false;
        self
    }
}
