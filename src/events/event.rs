//! # Runtime events emitted by the supervisor and the escalator.
//!
//! [`EventKind`] classifies the keep-alive lifecycle; [`Event`] carries the
//! metadata (timestamps, failure reasons, addresses, incident ids).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact ordering when events are
//! delivered out of order.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Connection lifecycle ===
    /// A connection attempt is starting (address about to be resolved).
    Connecting,

    /// Connect and handshake completed.
    ///
    /// Sets:
    /// - `addr`: the resolved remote address
    Connected,

    /// A liveness payload arrived; the remote is alive.
    Active,

    /// Connect, receive, or resolution failed; the session (if any) was closed.
    ///
    /// Sets:
    /// - `reason`: failure message
    ConnectionLost,

    /// Reconnect scheduled after the fixed retry delay.
    ///
    /// Sets:
    /// - `delay_ms`: the configured retry delay (ms)
    RetryScheduled,

    // === Incident escalation ===
    /// An incident was opened with the external integration.
    ///
    /// Sets:
    /// - `incident`: the incident id
    IncidentOpened,

    /// The open incident was resolved.
    ///
    /// Sets:
    /// - `incident`: the incident id
    IncidentResolved,

    /// An incident API call failed; escalation continues best-effort.
    ///
    /// Sets:
    /// - `reason`: the API error message
    EscalationFailed,

    // === Shutdown ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// The supervisor exited; any open session was closed.
    Stopped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Human-readable reason (failure or API error message).
    pub reason: Option<Arc<str>>,
    /// Resolved remote address, for connection events.
    pub addr: Option<SocketAddr>,
    /// Retry delay in milliseconds (compact).
    pub delay_ms: Option<u64>,
    /// Incident id, for escalation events.
    pub incident: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            reason: None,
            addr: None,
            delay_ms: None,
            incident: None,
        }
    }

    /// Attaches a failure or error reason.
    pub fn with_reason(mut self, reason: impl AsRef<str>) -> Self {
        self.reason = Some(Arc::from(reason.as_ref()));
        self
    }

    /// Attaches the resolved remote address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Attaches the retry delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(delay.as_millis() as u64);
        self
    }

    /// Attaches the incident id.
    pub fn with_incident(mut self, id: impl AsRef<str>) -> Self {
        self.incident = Some(Arc::from(id.as_ref()));
        self
    }
}
