//! # feedguard
//!
//! **feedguard** maintains a persistent keep-alive connection to a streaming
//! feed endpoint, detects when the remote stops emitting liveness messages,
//! and reconnects automatically. Prolonged unavailability can be escalated to
//! an external incident integration, auto-resolved once connectivity returns.
//!
//! ## Architecture
//! ```text
//!              ┌─────────────────────────────────────────────┐
//!              │  Supervisor (reconnect state machine)       │
//!              │  Disconnected → Connecting → Active         │
//!              │        ▲                        │           │
//!              │        └──── RetryWait ◄────────┘           │
//!              └──┬───────────────┬──────────────┬───────────┘
//!                 ▼               ▼              ▼
//!          ┌────────────┐  ┌─────────────┐  ┌────────────┐
//!          │  Endpoint  │  │   Session   │  │ Escalator  │
//!          │ (resolve)  │  │ (one socket)│  │ (incident) │
//!          └────────────┘  └──────┬──────┘  └─────┬──────┘
//!                                 ▼                ▼
//!                          deadline executor   IncidentApi
//!                                 ▼            (HTTP POST)
//!                          Transport (TCP)
//!
//!          Bus ──► listener task ──► ConsoleWriter (status lines)
//! ```
//!
//! Every blocking socket call runs through the deadline executor, which races
//! the operation against its deadline and the shared cancellation token —
//! caller-requested cancellation always wins over the timer, and a timeout is
//! always distinguishable from a remote failure.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use feedguard::{
//!     Bus, Config, ConsoleWriter, Escalator, Subscribe, Supervisor, TcpTransport,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let cfg = Config::default();
//!     let bus = Bus::new(cfg.bus_capacity_clamped());
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleWriter)];
//!     feedguard::spawn_listener(&bus, subs);
//!
//!     let escalator = Escalator::new(None, bus.clone());
//!     let mut supervisor = Supervisor::new(cfg, TcpTransport::factory(), escalator, bus);
//!
//!     let token = CancellationToken::new();
//!     supervisor.run(token).await;
//! }
//! ```

mod config;
mod deadline;
mod error;
mod escalate;
mod events;
mod resolve;
mod session;
mod shutdown;
mod subscribers;
mod supervisor;
mod transport;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_HANDSHAKE};
pub use deadline::run as with_deadline;
pub use error::{ClientError, ConfigError, EscalationError};
pub use escalate::{Escalator, Incident, IncidentApi, PagerTreeApi, INCIDENT_TITLE};
pub use events::{Bus, Event, EventKind};
pub use resolve::Endpoint;
pub use session::Session;
pub use shutdown::wait_for_shutdown_signal;
pub use subscribers::{spawn_listener, ConsoleWriter, Subscribe};
pub use supervisor::Supervisor;
pub use transport::{TcpTransport, Transport, TransportFactory};
