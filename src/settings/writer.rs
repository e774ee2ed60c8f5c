use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::core::error::{SettingsError, WriteStage};
use crate::ensemble::Operation;
use crate::locator::Endpoint;
use crate::session::{Session, SessionError};

/// Serialize settings to the stored byte format
pub fn encode_settings<T: Serialize + ?Sized>(settings: &T) -> Result<Vec<u8>, SettingsError> {
    serde_json::to_vec(settings).map_err(SettingsError::Encode)
}

/// Store `bytes` at `path`, creating the node and its parents if needed
///
/// Creation and the data write are separate calls. If the write fails after
/// the node was created, the node is left in place without this data.
pub async fn write_settings<S>(session: &S, path: &str, bytes: &[u8]) -> Result<usize, SettingsError>
where
    S: Session + ?Sized,
{
    let write_error = |stage: WriteStage| {
        move |source: SessionError| SettingsError::Write {
            path: path.to_string(),
            stage,
            source,
        }
    };

    let exists = session
        .exists(path)
        .await
        .map_err(write_error(WriteStage::Exists))?;

    if !exists {
        debug!(path = %path, "Creating settings node");
        session
            .create_recursive(path)
            .await
            .map_err(write_error(WriteStage::CreatePath))?;
    }

    session
        .set_data(path, bytes)
        .await
        .map_err(write_error(WriteStage::SetData))?;

    Ok(bytes.len())
}

/// Write operation for the failover driver, holding pre-encoded settings
pub struct WriteSettings {
    bytes: Vec<u8>,
}

impl WriteSettings {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encode `settings` once, before any endpoint is contacted
    pub fn encode<T: Serialize + ?Sized>(settings: &T) -> Result<Self, SettingsError> {
        Ok(Self::new(encode_settings(settings)?))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[async_trait]
impl<S: Session> Operation<S> for WriteSettings {
    type Output = usize;

    fn name(&self) -> &'static str {
        "write"
    }

    async fn run(&self, session: &S, _endpoint: &Endpoint, path: &str) -> Result<usize, SettingsError> {
        write_settings(session, path, &self.bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::session::memory::MemorySession;
    use crate::session::{Member, MemoryEnsemble, MemoryStore, SessionFactory};
    use serde_json::{json, Value};

    async fn connected(member: Member) -> MemorySession {
        let ensemble = MemoryEnsemble::new().with_member("a:1", member);
        let mut session = ensemble.open(&Endpoint::from("a:1")).unwrap();
        session.wait_connected().await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_write_creates_intermediate_nodes() {
        let store = MemoryStore::new();
        let session = connected(Member::up(store.clone())).await;

        let bytes = encode_settings(&json!({"Product": "X"})).unwrap();
        let written = write_settings(&session, "/apps/demo/settings", &bytes).await.unwrap();

        assert_eq!(written, bytes.len());
        assert!(store.contains("/apps"));
        assert!(store.contains("/apps/demo"));
        assert_eq!(store.get("/apps/demo/settings"), Some(bytes));
    }

    #[tokio::test]
    async fn test_write_replaces_existing_value() {
        let store = MemoryStore::new();
        store.insert("/app", br#"{"Old":true,"Product":"A"}"#.to_vec());
        let session = connected(Member::up(store.clone())).await;

        let bytes = encode_settings(&json!({"Product": "B"})).unwrap();
        write_settings(&session, "/app", &bytes).await.unwrap();

        let stored: Value = serde_json::from_slice(&store.get("/app").unwrap()).unwrap();
        assert_eq!(stored, json!({"Product": "B"}));
    }

    #[tokio::test]
    async fn test_write_failure_reports_stage() {
        let session = connected(Member::up(MemoryStore::new()).with_failing_operations()).await;

        let err = write_settings(&session, "/app", b"{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert!(matches!(
            err,
            SettingsError::Write {
                stage: WriteStage::Exists,
                ..
            }
        ));
    }

    #[test]
    fn test_encode_failure() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);
        let err = WriteSettings::encode(&bad).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Encode);
    }
}
