//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the keep-alive monitor.
//!
//! ## Field semantics
//! - `host` / `port`: the monitored endpoint; immutable once the supervisor starts.
//! - `incident_id`: optional incident integration id; presence enables escalation.
//! - `connect_timeout`: budget for connect + handshake send, per attempt.
//! - `receive_timeout`: budget for each blocking receive.
//! - `close_timeout`: budget for the graceful session close.
//! - `retry_delay`: fixed wait between reconnect attempts (no backoff; the
//!   monitored service is a single pinned endpoint, not a fleet).
//! - `handshake`: fixed ASCII line sent right after connect to request the
//!   remote begin streaming status.
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped).

use std::time::Duration;

use crate::error::ConfigError;
use crate::resolve::Endpoint;

/// Default outbound handshake line.
pub const DEFAULT_HANDSHAKE: &str = "S,CONNECT\r\n";

/// Global configuration for the keep-alive monitor.
///
/// All fields are public for flexibility. Prefer the helper accessors over
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Host to monitor: a literal IP address or a DNS name.
    pub host: String,

    /// TCP port of the monitored endpoint.
    pub port: u16,

    /// Incident integration id. `None` disables escalation entirely.
    pub incident_id: Option<String>,

    /// Deadline for connect and the handshake send, per attempt.
    pub connect_timeout: Duration,

    /// Deadline for each blocking receive; silence beyond this counts as loss
    /// of liveness.
    pub receive_timeout: Duration,

    /// Deadline for the graceful half-close on session teardown.
    pub close_timeout: Duration,

    /// Fixed delay between reconnect attempts.
    pub retry_delay: Duration,

    /// Outbound handshake line sent once per connection.
    pub handshake: String,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Validates the configuration, rejecting values the supervisor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        Ok(())
    }

    /// Returns the monitored endpoint as a resolvable [`Endpoint`].
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Returns whether incident escalation is enabled.
    #[inline]
    pub fn escalation_enabled(&self) -> bool {
        self.incident_id.is_some()
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `host = "127.0.0.1"`, `port = 9300`
    /// - `incident_id = None` (escalation disabled)
    /// - `connect_timeout = 5s`, `receive_timeout = 5s`, `close_timeout = 1s`
    /// - `retry_delay = 15s`
    /// - `handshake = "S,CONNECT\r\n"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9300,
            incident_id: None,
            connect_timeout: Duration::from_secs(5),
            receive_timeout: Duration::from_secs(5),
            close_timeout: Duration::from_secs(1),
            retry_delay: Duration::from_secs(15),
            handshake: DEFAULT_HANDSHAKE.to_string(),
            bus_capacity: 1024,
        }
    }
}
