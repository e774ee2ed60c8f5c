//! Coordination service sessions
//!
//! The wire protocol and session management live in a client library. This
//! module is the seam: [`SessionFactory`] creates one session object per
//! endpoint attempt, and [`Session`] exposes the handful of calls the settings
//! operations need.
//!
//! - [`memory`]: in-process ensemble with per-member failure behavior
//! - `zookeeper`: adapter over the `zookeeper-client` crate (feature `zookeeper`)

pub mod memory;
#[cfg(feature = "zookeeper")]
pub mod zookeeper;

use async_trait::async_trait;

use crate::locator::Endpoint;

pub use memory::{Member, MemoryEnsemble, MemoryStore};

/// Failures reported by the coordination client
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("node does not exist: {0}")]
    NoNode(String),

    #[error("connection lost: {0}")]
    ConnectionLoss(String),

    #[error("connection refused: {0}")]
    Refused(String),

    #[error("session is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// One live (or connecting) session to a single endpoint
#[async_trait]
pub trait Session: Send + Sync {
    /// Resolve once the session reports "connected"
    ///
    /// May never resolve; callers bound it with their own deadline.
    async fn wait_connected(&mut self) -> Result<(), SessionError>;

    /// Whether the "connected" signal has been observed
    fn is_connected(&self) -> bool;

    async fn exists(&self, path: &str) -> Result<bool, SessionError>;

    /// Create `path` and every missing parent with empty data
    async fn create_recursive(&self, path: &str) -> Result<(), SessionError>;

    async fn get_data(&self, path: &str) -> Result<Vec<u8>, SessionError>;

    /// Replace the data stored at an existing node
    async fn set_data(&self, path: &str, data: &[u8]) -> Result<(), SessionError>;

    /// Tear the session down. Safe to call more than once.
    async fn close(&mut self);
}

/// Creates sessions, one per call
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session + 'static;

    fn open(&self, endpoint: &Endpoint) -> Result<Self::Session, SessionError>;
}
