//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging custom event handlers
//! (logging, metrics, alerting) into the runtime. Events arrive sequentially,
//! in publish order, on a dedicated listener task.

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
///
/// Handlers should return quickly; a slow subscriber delays delivery to the
/// subscribers behind it on the shared listener task.
#[async_trait]
pub trait Subscribe: Send + Sync {
    /// Handles one event.
    async fn on_event(&self, ev: &Event);
}
