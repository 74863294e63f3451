//! Session registry with endpoint dedup and idle expiry
//!
//! The registry owns every session, hands out tokens, and makes sure that at
//! most one live session (and so one device connection and one capture
//! thread) exists per camera endpoint.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<SessionRegistry>
//!                  ┌──────────────────────────────┐
//!                  │ RwLock<Inner {               │
//!                  │   sessions:    token ─► Arc<Session>
//!                  │   by_endpoint: endpoint ─► token
//!                  │ }>                           │
//!                  └──────┬─────────────────┬─────┘
//!                         │                 │
//!          get_or_create / lookup        sweep() every reap_interval
//!                         │                 │
//!                  [request tasks]      [reaper task]
//! ```
//!
//! Creation inserts an `Initializing` session under the write lock and
//! connects with the lock released. Callers that arrive for the same
//! endpoint meanwhile wait on the session's state instead of connecting
//! again.

pub mod config;
pub mod reaper;
pub mod store;

pub use config::RegistryConfig;
pub use store::SessionRegistry;
