//! Error types used by the feedguard runtime.
//!
//! Three enums cover the distinct failure domains:
//!
//! - [`ClientError`] — connectivity failures raised by socket operations.
//! - [`EscalationError`] — incident API failures, contained inside the escalator.
//! - [`ConfigError`] — invalid configuration, reported once at startup.
//!
//! [`ClientError`] provides helper methods (`as_label`, `is_retryable`) for
//! logging and for the supervisor's retry decision.

use std::time::Duration;
use thiserror::Error;

/// # Connectivity errors raised by socket operations.
///
/// Every variant except [`ClientError::Canceled`] is a connectivity failure:
/// the supervisor logs it, notifies the escalator, and retries after the fixed
/// delay. `Canceled` is the only variant that unwinds the reconnect loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// An operation's deadline elapsed before it completed.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// DNS resolution yielded no usable address records.
    #[error("no address records found for {host}")]
    ResolutionFailed {
        /// The host name that failed to resolve.
        host: String,
    },

    /// A lower-level socket error (connection refused, reset, remote close).
    #[error("transport error: {message}")]
    Transport {
        /// The underlying error message.
        message: String,
    },

    /// The caller requested shutdown; never retried.
    #[error("context cancelled")]
    Canceled,
}

impl ClientError {
    /// Wraps a lower-level error into [`ClientError::Transport`].
    pub fn transport(err: impl std::fmt::Display) -> Self {
        ClientError::Transport {
            message: err.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use feedguard::ClientError;
    /// use std::time::Duration;
    ///
    /// let err = ClientError::Timeout { timeout: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ClientError::Timeout { .. } => "timeout",
            ClientError::ResolutionFailed { .. } => "resolution_failed",
            ClientError::Transport { .. } => "transport",
            ClientError::Canceled => "canceled",
        }
    }

    /// Indicates whether the supervisor should retry after this error.
    ///
    /// Returns `true` for every connectivity-class failure and `false` for
    /// [`ClientError::Canceled`], which always unwinds the loop.
    ///
    /// # Example
    /// ```
    /// use feedguard::ClientError;
    ///
    /// let refused = ClientError::transport("connection refused");
    /// assert!(refused.is_retryable());
    /// assert!(!ClientError::Canceled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ClientError::Canceled)
    }
}

/// # Errors raised by the incident API.
///
/// These never surface to the supervisor: the escalator logs them via the
/// event bus and swallows them, since escalation is best-effort.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EscalationError {
    /// The HTTP request to the incident API failed or returned an error status.
    #[error("incident api request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Catch-all for non-HTTP escalation backends (used by fakes in tests).
    #[error("incident api unavailable: {message}")]
    Unavailable {
        /// The underlying error message.
        message: String,
    },
}

/// # Invalid configuration, rejected before the monitor starts.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The host string was empty.
    #[error("host must be provided")]
    EmptyHost,
}
