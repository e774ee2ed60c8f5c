//! Sequential failover across an ensemble
//!
//! Endpoints are tried strictly in locator order, one at a time. Each attempt
//! opens its own session, runs the operation, and closes the session whatever
//! the result. The first success ends the walk; otherwise the error from the
//! last endpoint attempted is reported.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::connector::BoundedConnector;
use crate::core::error::SettingsError;
use crate::locator::{Endpoint, Locator};
use crate::session::{Session, SessionFactory};

/// Default bound on one read or write round trip
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Work performed against one connected session
#[async_trait]
pub trait Operation<S: Session>: Send + Sync {
    type Output: Send;

    /// Short label for logs
    fn name(&self) -> &'static str;

    async fn run(&self, session: &S, endpoint: &Endpoint, path: &str) -> Result<Self::Output, SettingsError>;
}

/// A successful result and the endpoint that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub endpoint: Endpoint,
    pub value: T,
}

#[derive(Debug, Clone, Copy)]
pub struct FailoverDriver {
    connector: BoundedConnector,
    operation_timeout: Duration,
}

impl Default for FailoverDriver {
    fn default() -> Self {
        Self::new(BoundedConnector::default(), DEFAULT_OPERATION_TIMEOUT)
    }
}

impl FailoverDriver {
    pub fn new(connector: BoundedConnector, operation_timeout: Duration) -> Self {
        Self {
            connector,
            operation_timeout,
        }
    }

    pub fn connector(&self) -> &BoundedConnector {
        &self.connector
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Run `operation` against the locator's endpoints until one succeeds
    pub async fn run<F, Op>(
        &self,
        factory: &F,
        locator: &Locator,
        operation: &Op,
    ) -> Result<Served<Op::Output>, SettingsError>
    where
        F: SessionFactory,
        Op: Operation<F::Session>,
    {
        let path = locator.path();
        let mut last_error: Option<(Endpoint, SettingsError)> = None;

        for (attempt, endpoint) in locator.endpoints().iter().enumerate() {
            debug!(
                endpoint = %endpoint,
                path = %path,
                attempt = attempt + 1,
                operation = operation.name(),
                "Trying endpoint"
            );

            let mut session = match self.connector.connect(factory, endpoint).await {
                Ok(session) => session,
                Err(err) => {
                    last_error = Some((endpoint.clone(), err));
                    continue;
                }
            };

            let result = match tokio::time::timeout(
                self.operation_timeout,
                operation.run(&session, endpoint, path),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(SettingsError::OperationTimeout {
                    endpoint: endpoint.clone(),
                    timeout: self.operation_timeout,
                }),
            };

            session.close().await;

            match result {
                Ok(value) => {
                    info!(
                        endpoint = %endpoint,
                        path = %path,
                        operation = operation.name(),
                        "Settings operation served"
                    );
                    return Ok(Served {
                        endpoint: endpoint.clone(),
                        value,
                    });
                }
                Err(err) => {
                    warn!(
                        endpoint = %endpoint,
                        path = %path,
                        operation = operation.name(),
                        error = %err,
                        "Settings operation failed, trying next endpoint"
                    );
                    last_error = Some((endpoint.clone(), err));
                }
            }
        }

        let attempts = locator.endpoints().len();
        let (endpoint, source) = last_error.ok_or_else(|| SettingsError::MalformedLocator {
            locator: locator.to_string(),
            reason: "no endpoints".to_string(),
        })?;

        Err(SettingsError::Exhausted {
            endpoint,
            attempts,
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::session::{Member, MemoryEnsemble, MemoryStore};
    use crate::settings::ReadSettings;
    use serde_json::{json, Value};

    fn driver() -> FailoverDriver {
        FailoverDriver::new(
            BoundedConnector::new(Duration::from_millis(50)),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_first_success_stops_walk() {
        let store = MemoryStore::new();
        store.insert("/app", br#"{"a":1}"#.to_vec());
        let ensemble = MemoryEnsemble::new()
            .with_member("a:1", Member::up(store.clone()))
            .with_member("b:2", Member::up(store));
        let locator = Locator::parse("zk://a:1,b:2/app").unwrap();

        let served = driver()
            .run(&ensemble, &locator, &ReadSettings::<Value>::new())
            .await
            .unwrap();

        assert_eq!(served.endpoint, Endpoint::from("a:1"));
        assert_eq!(served.value, json!({"a": 1}));
        assert_eq!(ensemble.attempts(), vec![Endpoint::from("a:1")]);
        assert_eq!(ensemble.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_operation_timeout_fails_over() {
        let store = MemoryStore::new();
        store.insert("/app", b"{}".to_vec());
        let slow = Member::up(store.clone()).with_operation_delay(Duration::from_secs(5));
        let ensemble = MemoryEnsemble::new()
            .with_member("a:1", slow)
            .with_member("b:2", Member::up(store));
        let locator = Locator::parse("zk://a:1,b:2/app").unwrap();

        let served = driver()
            .run(&ensemble, &locator, &ReadSettings::<Value>::new())
            .await
            .unwrap();
        assert_eq!(served.endpoint, Endpoint::from("b:2"));
        assert_eq!(ensemble.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_single_endpoint_exhausted() {
        let ensemble = MemoryEnsemble::new().with_member("a:1", Member::refusing());
        let locator = Locator::parse("zk://a:1/app").unwrap();

        let err = driver()
            .run(&ensemble, &locator, &ReadSettings::<Value>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::Exhausted { attempts: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
