//! Client error hierarchy
//!
//! Three families of failures are distinguished:
//! - transport failures, retried against every known cluster member and
//!   surfaced as [`Error::ClusterUnavailable`] once all members failed
//! - service failures, well-formed error documents returned by a reachable
//!   member, never retried
//! - local failures (malformed bodies, bad configuration), never retried
//!
//! Service codes live in `[100, 500]`; local codes start at 1000.

use std::sync::Arc;

use config::ConfigError;
use serde::Deserialize;

use crate::constants::ERROR_CLUSTER_FAILED;
use crate::constants::ERROR_INVALID_CONFIG;
use crate::constants::ERROR_RESPONSE_PARSE_FAILED;
use crate::constants::ERROR_SEND_REQUEST_FAILED;
use crate::constants::ERROR_WATCH_NOT_FOUND;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Error document returned by a reachable cluster member
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Body could not be interpreted as a response or error document
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A single member could not be reached
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every known member failed at the transport level
    #[error("All {attempted} cluster members failed, last error: {last}")]
    ClusterUnavailable { attempted: usize, last: TransportError },

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(Arc<ConfigError>),

    /// Certificate or key material could not be loaded
    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// No running asynchronous watch group carries this id
    #[error("Watch group {0} not found")]
    WatchNotFound(String),
}

impl Error {
    /// Numeric code of this error
    ///
    /// Service errors keep the code assigned by the service, local failures
    /// map onto the reserved range starting at 1000.
    pub fn code(&self) -> u32 {
        match self {
            Error::Service(e) => e.code,
            Error::Parse(_) => ERROR_RESPONSE_PARSE_FAILED,
            Error::Transport(_) => ERROR_SEND_REQUEST_FAILED,
            Error::ClusterUnavailable { .. } => ERROR_CLUSTER_FAILED,
            Error::Config(_) | Error::Tls(_) => ERROR_INVALID_CONFIG,
            Error::WatchNotFound(_) => ERROR_WATCH_NOT_FOUND,
        }
    }

    /// Cluster index at which a service error occurred
    pub fn index(&self) -> Option<u64> {
        match self {
            Error::Service(e) => Some(e.index),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(Arc::new(e))
    }
}

/// Error document sent by the service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("[{code}] {message} at index {index}")]
pub struct ServiceError {
    #[serde(rename = "errorCode")]
    pub code: u32,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub cause: Option<String>,

    #[serde(default)]
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, reset or name resolution failure
    Connect,
    /// Connect or request deadline elapsed
    Timeout,
    /// Any other failure while exchanging the request
    Io,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?} error on {url}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(
        kind: TransportErrorKind,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }
}
