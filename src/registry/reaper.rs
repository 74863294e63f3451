//! Expiry reaper
//!
//! One background task per registry owns all idle-timeout bookkeeping.
//! Each sweep marks expired sessions terminated and unlinks them under the
//! registry lock, then stops their capture threads with the lock released.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::session::{EndReason, Session, SessionToken};

use super::store::SessionRegistry;

impl SessionRegistry {
    /// Run one expiry sweep
    ///
    /// Removes terminated sessions and terminates live ones idle for at least
    /// the session timeout. Sessions still initializing are left alone; the
    /// connect timeout ends those.
    /// Returns the number of sessions removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let timeout = self.config.session_timeout;

        let (reaped, remaining): (Vec<Arc<Session>>, usize) = {
            let mut inner = self.inner.write().await;

            let tokens: Vec<SessionToken> = inner
                .sessions
                .values()
                .filter(|session| session.is_terminated() || session.expire_if_idle(now, timeout))
                .map(|session| session.token())
                .collect();

            let reaped = tokens.iter().filter_map(|token| inner.remove(token)).collect();
            (reaped, inner.sessions.len())
        };

        if reaped.is_empty() {
            return 0;
        }

        for session in &reaped {
            if let Err(e) = session.terminate(EndReason::IdleTimeout).await {
                tracing::warn!(
                    session = %session.token(),
                    endpoint = %session.endpoint(),
                    error = %e,
                    "Failed to stop reaped session"
                );
            }
        }

        self.total_reaped
            .fetch_add(reaped.len() as u64, Ordering::Relaxed);

        tracing::info!(
            reaped = reaped.len(),
            remaining = remaining,
            "Expired sessions removed"
        );

        reaped.len()
    }

    /// Spawn the background reaper task
    ///
    /// Sweeps every `reap_interval`. Returns a handle that can be used to
    /// abort the task.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.reap_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                registry.sweep().await;
            }
        })
    }
}
