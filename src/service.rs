//! Session-boundary interface
//!
//! [`PtzService`] is what an HTTP layer calls. Every operation takes the
//! client's session token; unknown, expired and terminated tokens all come
//! back as [`Error::Unauthorized`], at which point the client has to create
//! a new session.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::capture::StreamOpener;
use crate::device::{CommandOutput, Credentials, DeviceConnector, Endpoint, PtzCommand};
use crate::error::{Error, Result};
use crate::registry::{RegistryConfig, SessionRegistry};
use crate::session::{Session, SessionToken, Snapshot};
use crate::stats::{RegistryStats, SessionStats};

/// Entry point for client requests
#[derive(Clone)]
pub struct PtzService {
    registry: Arc<SessionRegistry>,
}

impl PtzService {
    pub fn new(connector: Arc<dyn DeviceConnector>, opener: Arc<dyn StreamOpener>) -> Self {
        Self::with_config(connector, opener, RegistryConfig::default())
    }

    pub fn with_config(
        connector: Arc<dyn DeviceConnector>,
        opener: Arc<dyn StreamOpener>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::with_config(connector, opener, config)),
        }
    }

    /// The underlying registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Start the background reaper
    pub fn spawn_reaper(&self) -> JoinHandle<()> {
        self.registry.spawn_reaper()
    }

    /// Parse a token from its cookie form
    pub fn parse_token(raw: &str) -> Result<SessionToken> {
        raw.parse().map_err(|_| Error::Unauthorized)
    }

    /// Connect to a camera, or join the live session already serving it
    pub async fn create_session(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<SessionToken> {
        let (token, _) = self.registry.get_or_create(endpoint, credentials).await?;
        Ok(token)
    }

    /// Keep a session alive
    pub async fn touch_session(&self, token: &SessionToken) -> Result<()> {
        self.session(token).await?.touch()
    }

    /// Latest frame as JPEG, or `None` while the first frame is pending
    pub async fn get_snapshot(&self, token: &SessionToken) -> Result<Option<Snapshot>> {
        self.session(token).await?.snapshot().await
    }

    /// Select another media profile for the session's feed
    pub async fn switch_profile(&self, token: &SessionToken, profile: &str) -> Result<()> {
        self.session(token).await?.switch_profile(profile).await
    }

    /// Send a PTZ command to the session's camera
    pub async fn forward_command(
        &self,
        token: &SessionToken,
        command: PtzCommand,
    ) -> Result<CommandOutput> {
        self.session(token).await?.forward(command).await
    }

    /// Whether the token no longer refers to a usable session
    ///
    /// Does not count as activity.
    pub async fn is_expired(&self, token: &SessionToken) -> bool {
        match self.registry.lookup(token).await {
            Some(session) => session.is_expired(self.registry.config().session_timeout),
            None => true,
        }
    }

    /// End a session on client request
    pub async fn end_session(&self, token: &SessionToken) -> Result<()> {
        self.registry.end_session(token).await
    }

    /// Statistics for one session, without touching it
    pub async fn session_stats(&self, token: &SessionToken) -> Result<SessionStats> {
        Ok(self.session(token).await?.stats())
    }

    pub async fn stats(&self) -> RegistryStats {
        self.registry.stats().await
    }

    /// Terminate every session
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }

    async fn session(&self, token: &SessionToken) -> Result<Arc<Session>> {
        self.registry
            .lookup(token)
            .await
            .ok_or(Error::Unauthorized)
    }
}
