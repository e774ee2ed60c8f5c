//! Error types for settings operations

use std::time::Duration;

use thiserror::Error;

use crate::locator::Endpoint;
use crate::session::SessionError;

/// Stage of a write that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Exists,
    CreatePath,
    SetData,
}

impl std::fmt::Display for WriteStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WriteStage::Exists => "existence check",
            WriteStage::CreatePath => "path creation",
            WriteStage::SetData => "data write",
        };
        f.write_str(name)
    }
}

/// Why stored bytes could not be decoded
#[derive(Debug, Error)]
pub enum DecodeFailure {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Malformed locator {locator:?}: {reason}")]
    MalformedLocator { locator: String, reason: String },

    #[error("Timed out after {timeout:?} connecting to {endpoint}")]
    ConnectTimeout { endpoint: Endpoint, timeout: Duration },

    #[error("Transport failure on {endpoint}: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: SessionError,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: SessionError,
    },

    #[error("Settings at {path} are not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeFailure,
    },

    #[error("Failed to write {path} ({stage}): {source}")]
    Write {
        path: String,
        stage: WriteStage,
        #[source]
        source: SessionError,
    },

    #[error("Operation on {endpoint} did not finish within {timeout:?}")]
    OperationTimeout { endpoint: Endpoint, timeout: Duration },

    #[error("Failed to encode settings as JSON: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("All {attempts} endpoints failed, last was {endpoint}: {source}")]
    Exhausted {
        endpoint: Endpoint,
        attempts: usize,
        #[source]
        source: Box<SettingsError>,
    },

    #[error("Blocking settings call made from a thread of the client's own runtime")]
    BlockingOnOwnRuntime,

    #[error("Settings operation ended without reporting a result")]
    Interrupted,
}

/// Flat classification of a [`SettingsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedLocator,
    ConnectTimeout,
    Transport,
    Read,
    Decode,
    Write,
    OperationTimeout,
    Encode,
    BlockingOnOwnRuntime,
    Interrupted,
}

impl SettingsError {
    /// Kind of the underlying failure. For an exhausted ensemble this is the
    /// kind of the last endpoint's error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettingsError::MalformedLocator { .. } => ErrorKind::MalformedLocator,
            SettingsError::ConnectTimeout { .. } => ErrorKind::ConnectTimeout,
            SettingsError::Transport { .. } => ErrorKind::Transport,
            SettingsError::Read { .. } => ErrorKind::Read,
            SettingsError::Decode { .. } => ErrorKind::Decode,
            SettingsError::Write { .. } => ErrorKind::Write,
            SettingsError::OperationTimeout { .. } => ErrorKind::OperationTimeout,
            SettingsError::Encode(_) => ErrorKind::Encode,
            SettingsError::Exhausted { source, .. } => source.kind(),
            SettingsError::BlockingOnOwnRuntime => ErrorKind::BlockingOnOwnRuntime,
            SettingsError::Interrupted => ErrorKind::Interrupted,
        }
    }

    /// True when the last failure was a read of a node that does not exist
    pub fn is_missing_node(&self) -> bool {
        match self {
            SettingsError::Read { source, .. } => matches!(source, SessionError::NoNode(_)),
            SettingsError::Exhausted { source, .. } => source.is_missing_node(),
            _ => false,
        }
    }

    /// Endpoint the error is attributed to, if any
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            SettingsError::ConnectTimeout { endpoint, .. }
            | SettingsError::Transport { endpoint, .. }
            | SettingsError::OperationTimeout { endpoint, .. }
            | SettingsError::Exhausted { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_reports_inner_kind() {
        let err = SettingsError::Exhausted {
            endpoint: Endpoint::from("b:2"),
            attempts: 2,
            source: Box::new(SettingsError::Read {
                path: "/x".to_string(),
                source: SessionError::NoNode("/x".to_string()),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::Read);
        assert!(err.is_missing_node());
        assert_eq!(err.endpoint(), Some(&Endpoint::from("b:2")));
    }

    #[test]
    fn test_write_stage_in_message() {
        let err = SettingsError::Write {
            path: "/x".to_string(),
            stage: WriteStage::CreatePath,
            source: SessionError::ConnectionLoss("reset".to_string()),
        };
        assert!(err.to_string().contains("path creation"));
        assert!(!err.is_missing_node());
    }
}
