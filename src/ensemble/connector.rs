//! Connect to one endpoint within a fixed deadline
//!
//! The connect attempt races the deadline. Whichever side resolves first
//! decides the outcome, and the session's own connected flag settles the case
//! where both are ready in the same poll: a session that already reports
//! "connected" is kept. On every failure path the session is closed before
//! returning, so an attempt never leaves a session behind.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::error::SettingsError;
use crate::locator::Endpoint;
use crate::session::{Session, SessionError, SessionFactory};

/// Default per-endpoint connect deadline
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);

/// Outcome of the connect race, assigned once
enum ConnectOutcome {
    Connected,
    Failed(SessionError),
    DeadlineElapsed,
}

#[derive(Debug, Clone, Copy)]
pub struct BoundedConnector {
    timeout: Duration,
}

impl Default for BoundedConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl BoundedConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open exactly one session to `endpoint` and wait for it to connect
    pub async fn connect<F: SessionFactory>(
        &self,
        factory: &F,
        endpoint: &Endpoint,
    ) -> Result<F::Session, SettingsError> {
        let mut session = factory
            .open(endpoint)
            .map_err(|source| SettingsError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let started = Instant::now();
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let signalled = tokio::select! {
            biased;
            result = session.wait_connected() => Some(result),
            _ = &mut deadline => None,
        };

        let outcome = match signalled {
            Some(Ok(())) => ConnectOutcome::Connected,
            Some(Err(err)) => ConnectOutcome::Failed(err),
            // Deadline won the race, but the connected flag was already set.
            None if session.is_connected() => ConnectOutcome::Connected,
            None => ConnectOutcome::DeadlineElapsed,
        };

        match outcome {
            ConnectOutcome::Connected => {
                debug!(
                    endpoint = %endpoint,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Connected"
                );
                Ok(session)
            }
            ConnectOutcome::Failed(source) => {
                session.close().await;
                warn!(endpoint = %endpoint, error = %source, "Connect failed");
                Err(SettingsError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                })
            }
            ConnectOutcome::DeadlineElapsed => {
                session.close().await;
                warn!(
                    endpoint = %endpoint,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Timeout trying to connect"
                );
                Err(SettingsError::ConnectTimeout {
                    endpoint: endpoint.clone(),
                    timeout: self.timeout,
                })
            }
        }
    }
}
