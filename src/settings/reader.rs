use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::{DecodeFailure, SettingsError};
use crate::ensemble::Operation;
use crate::locator::Endpoint;
use crate::session::Session;

/// Decode stored bytes as UTF-8 JSON
pub fn decode_settings<T: DeserializeOwned>(path: &str, bytes: &[u8]) -> Result<T, SettingsError> {
    let decode_error = |source: DecodeFailure| SettingsError::Decode {
        path: path.to_string(),
        source,
    };

    let text = std::str::from_utf8(bytes).map_err(|e| decode_error(e.into()))?;
    serde_json::from_str(text).map_err(|e| decode_error(e.into()))
}

/// Fetch the node at `path` and decode it
///
/// A failed fetch (missing node, lost connection) is a `Read` error; bytes
/// that are present but not JSON are a `Decode` error.
pub async fn read_settings<S, T>(session: &S, path: &str) -> Result<T, SettingsError>
where
    S: Session + ?Sized,
    T: DeserializeOwned,
{
    let bytes = session
        .get_data(path)
        .await
        .map_err(|source| SettingsError::Read {
            path: path.to_string(),
            source,
        })?;

    decode_settings(path, &bytes)
}

/// Read operation for the failover driver
pub struct ReadSettings<T = Value> {
    _output: PhantomData<fn() -> T>,
}

impl<T> ReadSettings<T> {
    pub fn new() -> Self {
        Self {
            _output: PhantomData,
        }
    }
}

impl<T> Default for ReadSettings<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S, T> Operation<S> for ReadSettings<T>
where
    S: Session,
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn name(&self) -> &'static str {
        "read"
    }

    async fn run(&self, session: &S, _endpoint: &Endpoint, path: &str) -> Result<T, SettingsError> {
        read_settings(session, path).await
    }
}
