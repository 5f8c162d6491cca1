//! # Console status reporting.
//!
//! [`ConsoleWriter`] prints the monitor's status lines: liveness and
//! connection lines to stdout, failures to stderr.
//!
//! ## Output format
//! ```text
//! stdout:  Connected
//! stdout:  Active
//! stderr:  transport error: connection refused
//! stderr:  retrying in 15s
//! stderr:  incident opened: 9c5f...
//! stdout:  Goodbye
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Prints status lines to stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleWriter;

#[async_trait]
impl Subscribe for ConsoleWriter {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::Connecting => {}
            EventKind::Connected => println!("Connected"),
            EventKind::Active => println!("Active"),
            EventKind::ConnectionLost => {
                if let Some(reason) = &ev.reason {
                    eprintln!("{reason}");
                }
            }
            EventKind::RetryScheduled => {
                if let Some(ms) = ev.delay_ms {
                    eprintln!("retrying in {}s", ms / 1000);
                }
            }
            EventKind::IncidentOpened => {
                if let Some(id) = &ev.incident {
                    eprintln!("incident opened: {id}");
                }
            }
            EventKind::IncidentResolved => {
                if let Some(id) = &ev.incident {
                    eprintln!("incident resolved: {id}");
                }
            }
            EventKind::EscalationFailed => {
                if let Some(reason) = &ev.reason {
                    eprintln!("escalation failed: {reason}");
                }
            }
            EventKind::ShutdownRequested => eprintln!("shutdown requested"),
            EventKind::Stopped => println!("Goodbye"),
        }
    }
}
