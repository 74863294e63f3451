//! Session registry implementation
//!
//! The central registry that owns every session and deduplicates connect
//! requests by device endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::capture::StreamOpener;
use crate::device::{Credentials, DeviceConnector, Endpoint};
use crate::error::{Error, Result};
use crate::session::{EndReason, Session, SessionToken};
use crate::stats::RegistryStats;

use super::config::RegistryConfig;

/// Sessions plus the endpoint index, guarded as one unit
#[derive(Default)]
pub(super) struct Inner {
    pub(super) sessions: HashMap<SessionToken, Arc<Session>>,
    by_endpoint: HashMap<Endpoint, SessionToken>,
}

impl Inner {
    fn insert(&mut self, session: Arc<Session>) {
        self.by_endpoint
            .insert(session.endpoint().clone(), session.token());
        self.sessions.insert(session.token(), session);
    }

    pub(super) fn remove(&mut self, token: &SessionToken) -> Option<Arc<Session>> {
        let session = self.sessions.remove(token)?;
        if self.by_endpoint.get(session.endpoint()) == Some(token) {
            self.by_endpoint.remove(session.endpoint());
        }
        Some(session)
    }

    /// Non-terminated session currently serving `endpoint`
    fn live_for(&self, endpoint: &Endpoint) -> Option<Arc<Session>> {
        self.by_endpoint
            .get(endpoint)
            .and_then(|token| self.sessions.get(token))
            .filter(|session| !session.is_terminated())
            .cloned()
    }
}

/// Central registry for all sessions
///
/// Thread-safe via `RwLock`. Lookups from request handlers take the read
/// lock; creation, removal and the reaper's sweep take the write lock.
/// Device I/O never happens while the lock is held.
pub struct SessionRegistry {
    pub(super) inner: Arc<RwLock<Inner>>,

    pub(super) config: RegistryConfig,

    connector: Arc<dyn DeviceConnector>,
    opener: Arc<dyn StreamOpener>,

    total_created: AtomicU64,
    pub(super) total_reaped: AtomicU64,
}

impl SessionRegistry {
    /// Create a registry with default configuration
    pub fn new(connector: Arc<dyn DeviceConnector>, opener: Arc<dyn StreamOpener>) -> Self {
        Self::with_config(connector, opener, RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(
        connector: Arc<dyn DeviceConnector>,
        opener: Arc<dyn StreamOpener>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            config,
            connector,
            opener,
            total_created: AtomicU64::new(0),
            total_reaped: AtomicU64::new(0),
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Return the live session for `endpoint`, or create and start one
    ///
    /// The boolean is true when this call created the session. Concurrent
    /// callers for one endpoint share a single session and device
    /// connection; those that arrive while it is still connecting wait for
    /// the outcome.
    pub async fn get_or_create(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<(SessionToken, bool)> {
        loop {
            let (session, created) = {
                let mut inner = self.inner.write().await;

                match inner.live_for(endpoint) {
                    Some(existing) => (existing, false),
                    None => {
                        let session = Arc::new(Session::new(
                            SessionToken::new(),
                            endpoint.clone(),
                            credentials.clone(),
                            self.opener.clone(),
                            self.config.jpeg_quality,
                        ));
                        inner.insert(session.clone());
                        (session, true)
                    }
                }
            };

            if created {
                return self.start(session).await.map(|token| (token, true));
            }

            if self.config.require_matching_credentials && session.credentials() != credentials {
                tracing::warn!(
                    session = %session.token(),
                    endpoint = %endpoint,
                    "Rejected session reuse with different credentials"
                );
                return Err(Error::Unauthorized);
            }

            match session.wait_ready().await.and_then(|_| session.touch()) {
                Ok(()) => {
                    tracing::debug!(
                        session = %session.token(),
                        endpoint = %endpoint,
                        "Reusing session"
                    );
                    return Ok((session.token(), false));
                }
                // Ended while we waited; the next pass creates a fresh one
                Err(Error::Unauthorized) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Start a freshly inserted session on its own task
    ///
    /// The task owns the rollback, so a caller that stops waiting cannot
    /// leave the entry stuck in `Initializing`.
    async fn start(&self, session: Arc<Session>) -> Result<SessionToken> {
        let token = session.token();
        self.total_created.fetch_add(1, Ordering::Relaxed);

        tracing::info!(session = %token, endpoint = %session.endpoint(), "Creating session");

        let inner = Arc::clone(&self.inner);
        let connector = Arc::clone(&self.connector);
        let connect_timeout = self.config.connect_timeout;

        let task = tokio::spawn(async move {
            let result = session.start(connector.as_ref(), connect_timeout).await;
            if let Err(e) = &result {
                inner.write().await.remove(&token);
                tracing::warn!(
                    session = %token,
                    endpoint = %session.endpoint(),
                    error = %e,
                    "Session creation failed"
                );
            }
            result
        });

        match task.await {
            Ok(result) => result.map(|_| token),
            Err(e) => {
                self.inner.write().await.remove(&token);
                Err(Error::Connection(e.to_string()))
            }
        }
    }

    /// Find a session by token
    pub async fn lookup(&self, token: &SessionToken) -> Option<Arc<Session>> {
        self.inner.read().await.sessions.get(token).cloned()
    }

    /// Remove a session without terminating it
    pub async fn remove(&self, token: &SessionToken) -> Option<Arc<Session>> {
        self.inner.write().await.remove(token)
    }

    /// Remove a session and terminate it
    pub async fn end_session(&self, token: &SessionToken) -> Result<()> {
        let session = self.remove(token).await.ok_or(Error::Unauthorized)?;
        session.terminate(EndReason::Closed).await
    }

    /// Get total number of sessions, terminated ones awaiting a sweep included
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Tokens of all non-terminated sessions
    pub async fn active_tokens(&self) -> Vec<SessionToken> {
        self.inner
            .read()
            .await
            .sessions
            .values()
            .filter(|session| !session.is_terminated())
            .map(|session| session.token())
            .collect()
    }

    /// Get registry statistics
    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.read().await;
        let mut stats = RegistryStats::new();

        for session in inner.sessions.values() {
            stats.count(session.phase());
        }
        stats.total_created = self.total_created.load(Ordering::Relaxed);
        stats.total_reaped = self.total_reaped.load(Ordering::Relaxed);
        stats
    }

    /// Terminate and remove every session
    ///
    /// Returns the number of sessions removed.
    pub async fn shutdown(&self) -> usize {
        let sessions: Vec<Arc<Session>> = {
            let mut inner = self.inner.write().await;
            inner.by_endpoint.clear();
            inner.sessions.drain().map(|(_, session)| session).collect()
        };

        for session in &sessions {
            if let Err(e) = session.terminate(EndReason::Closed).await {
                tracing::warn!(session = %session.token(), error = %e, "Session did not stop cleanly");
            }
        }

        tracing::info!(sessions = sessions.len(), "Registry shut down");
        sessions.len()
    }
}
