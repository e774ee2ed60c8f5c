//! ZooKeeper sessions backed by the `zookeeper-client` crate

use async_trait::async_trait;
use tracing::debug;
use zookeeper_client as zk;

use super::{Session, SessionError, SessionFactory};
use crate::locator::Endpoint;

/// Opens one ZooKeeper session per endpoint attempt
#[derive(Debug, Clone, Default)]
pub struct ZookeeperFactory;

impl ZookeeperFactory {
    pub fn new() -> Self {
        Self
    }
}

impl SessionFactory for ZookeeperFactory {
    type Session = ZookeeperSession;

    fn open(&self, endpoint: &Endpoint) -> Result<Self::Session, SessionError> {
        Ok(ZookeeperSession {
            endpoint: endpoint.clone(),
            client: None,
        })
    }
}

/// Session against a single ensemble member
///
/// The session is established inside [`Session::wait_connected`]; dropping
/// that future abandons the handshake.
pub struct ZookeeperSession {
    endpoint: Endpoint,
    client: Option<zk::Client>,
}

impl ZookeeperSession {
    fn client(&self) -> Result<&zk::Client, SessionError> {
        self.client.as_ref().ok_or(SessionError::Closed)
    }
}

fn map_error(err: zk::Error) -> SessionError {
    match err {
        zk::Error::NoNode => SessionError::NoNode(String::new()),
        zk::Error::ConnectionLoss | zk::Error::SessionExpired => {
            SessionError::ConnectionLoss(err.to_string())
        }
        other => SessionError::Other(other.to_string()),
    }
}

fn map_path_error(path: &str) -> impl Fn(zk::Error) -> SessionError + '_ {
    move |err| match map_error(err) {
        SessionError::NoNode(_) => SessionError::NoNode(path.to_string()),
        other => other,
    }
}

#[async_trait]
impl Session for ZookeeperSession {
    async fn wait_connected(&mut self) -> Result<(), SessionError> {
        let client = zk::Client::connect(self.endpoint.as_str())
            .await
            .map_err(|err| SessionError::Refused(format!("{}: {}", self.endpoint, err)))?;
        debug!(endpoint = %self.endpoint, "ZooKeeper session connected");
        self.client = Some(client);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn exists(&self, path: &str) -> Result<bool, SessionError> {
        let stat = self
            .client()?
            .check_stat(path)
            .await
            .map_err(map_path_error(path))?;
        Ok(stat.is_some())
    }

    async fn create_recursive(&self, path: &str) -> Result<(), SessionError> {
        let client = self.client()?;
        let options = zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all());

        let mut prefix = String::with_capacity(path.len());
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            match client.create(&prefix, &[], &options).await {
                Ok(_) | Err(zk::Error::NodeExists) => {}
                Err(err) => return Err(map_path_error(&prefix)(err)),
            }
        }
        Ok(())
    }

    async fn get_data(&self, path: &str) -> Result<Vec<u8>, SessionError> {
        let (data, _stat) = self
            .client()?
            .get_data(path)
            .await
            .map_err(map_path_error(path))?;
        Ok(data)
    }

    async fn set_data(&self, path: &str, data: &[u8]) -> Result<(), SessionError> {
        self.client()?
            .set_data(path, data, None)
            .await
            .map_err(map_path_error(path))?;
        Ok(())
    }

    async fn close(&mut self) {
        // Dropping the last handle ends the session.
        if self.client.take().is_some() {
            debug!(endpoint = %self.endpoint, "ZooKeeper session closed");
        }
    }
}
