//! Error types for the release administration engine.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::github::Release;

/// Failures talking to the API, reading its responses, or moving bytes.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a status the caller did not expect.
    /// `dump` holds the status line, headers and (when read) the body.
    #[error("unexpected response {status}:\n{dump}")]
    Status { status: StatusCode, dump: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unable to download the required file size {actual}/{expected}")]
    ShortRead { expected: u64, actual: u64 },
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("{pattern:?} cannot be compiled as regular expression: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to read {path:?}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{source} (after {} release(s) had already been processed)", completed.len())]
    PartialFailure {
        completed: Vec<Release>,
        #[source]
        source: Box<AdminError>,
    },
    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T, E = AdminError> = std::result::Result<T, E>;

impl AdminError {
    /// Whether this error was raised by local validation, before any
    /// request was sent.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            AdminError::InvalidArgument(_)
                | AdminError::InvalidEndpoint(_)
                | AdminError::InvalidConfiguration(_)
                | AdminError::InvalidPattern { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminError::NotFound(_))
    }

    /// Wraps `self` into a `PartialFailure` when some items were already
    /// applied, otherwise returns it unchanged.
    pub fn after(self, completed: Vec<Release>) -> AdminError {
        if completed.is_empty() {
            self
        } else {
            AdminError::PartialFailure {
                completed,
                source: Box::new(self),
            }
        }
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(error: reqwest::Error) -> Self {
        AdminError::Transport(TransportError::Request(error))
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(error: serde_json::Error) -> Self {
        AdminError::Transport(TransportError::Decode(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_usage() {
        assert!(AdminError::InvalidArgument("x".into()).is_usage());
        assert!(AdminError::InvalidEndpoint("x".into()).is_usage());
        assert!(AdminError::InvalidConfiguration("x".into()).is_usage());
        assert!(
            AdminError::InvalidPattern {
                pattern: "(".into(),
                reason: "unclosed group".into()
            }
            .is_usage()
        );
        assert!(!AdminError::NotFound("release".into()).is_usage());
        assert!(!AdminError::Cancelled.is_usage());
    }

    #[test]
    fn test_after_without_completed_keeps_error() {
        let err = AdminError::NotFound("release".into()).after(vec![]);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_after_with_completed_wraps_error() {
        let done = Release {
            id: 1,
            tag_name: "v1.0.0".into(),
            ..Default::default()
        };
        let err = AdminError::Cancelled.after(vec![done]);
        match err {
            AdminError::PartialFailure { completed, source } => {
                assert_eq!(completed.len(), 1);
                assert!(matches!(*source, AdminError::Cancelled));
            }
            other => panic!("Expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_short_read_display() {
        let err = TransportError::ShortRead {
            expected: 10,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "unable to download the required file size 4/10"
        );
    }
}
