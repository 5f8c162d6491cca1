//! # Incident escalation.
//!
//! The [`Escalator`] mirrors the supervisor's failure/recovery transitions
//! onto an external incident integration: the first failure after a healthy
//! period opens an incident, the next recovery resolves it.
//!
//! ## Rules
//! - **At most one incident open**, no matter how many consecutive failures
//!   occur: `on_failing` is a no-op while a handle is remembered.
//! - Escalation is **best-effort**: API errors are published to the bus and
//!   swallowed; they never block or crash the reconnect loop.
//! - Calls are awaited inline with the supervisor's transitions — the strict
//!   ordering is what makes the at-most-one-open invariant hold without extra
//!   bookkeeping.
//!
//! The production backend is [`PagerTreeApi`], a JSON POST per event to the
//! integration URL. The escalator itself depends only on the [`IncidentApi`]
//! trait.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EscalationError;
use crate::events::{Bus, Event, EventKind};

/// Fixed title for every incident this monitor opens.
pub const INCIDENT_TITLE: &str = "Feed connection down";

/// An incident opened with the external integration.
///
/// The id is generated locally (UUIDv4) and carried by both the create and
/// the resolve event, which is how the integration pairs them up.
#[derive(Clone, Debug)]
pub struct Incident {
    /// Locally generated unique id.
    pub id: String,
    /// Fixed incident title.
    pub title: String,
    /// The failure reason that triggered escalation.
    pub description: String,
}

impl Incident {
    /// Creates a new incident with a fresh unique id.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// # External incident API.
///
/// Two logical operations; the transport behind them is an implementation
/// detail.
#[async_trait]
pub trait IncidentApi: Send + Sync {
    /// Issues a creation event for the incident.
    async fn open(&self, incident: &Incident) -> Result<(), EscalationError>;

    /// Issues a resolution event for the incident.
    async fn resolve(&self, incident: &Incident) -> Result<(), EscalationError>;
}

/// Maps supervisor transitions onto incident open/resolve calls.
///
/// Owned by the supervisor and driven strictly by its state transitions;
/// never polled independently.
pub struct Escalator {
    api: Option<Arc<dyn IncidentApi>>,
    bus: Bus,
    open: Option<Incident>,
}

impl Escalator {
    /// Creates an escalator. `api = None` disables escalation entirely.
    pub fn new(api: Option<Arc<dyn IncidentApi>>, bus: Bus) -> Self {
        Self {
            api,
            bus,
            open: None,
        }
    }

    /// Returns whether an incident is currently remembered as open.
    pub fn has_open_incident(&self) -> bool {
        self.open.is_some()
    }

    /// Reacts to a failing transition.
    ///
    /// Opens an incident with the failure reason as description, unless
    /// escalation is unconfigured or one is already open. A failed open leaves
    /// no handle behind, so a later failing transition may try again — the
    /// invariant is at most one *successfully opened* incident.
    pub async fn on_failing(&mut self, reason: &str) {
        let Some(api) = &self.api else { return };
        if self.open.is_some() {
            return;
        }

        let incident = Incident::new(INCIDENT_TITLE, reason);
        match api.open(&incident).await {
            Ok(()) => {
                self.bus
                    .publish(Event::now(EventKind::IncidentOpened).with_incident(&incident.id));
                self.open = Some(incident);
            }
            Err(err) => {
                self.bus
                    .publish(Event::now(EventKind::EscalationFailed).with_reason(err.to_string()));
            }
        }
    }

    /// Reacts to a recovery transition.
    ///
    /// Resolves and forgets the open incident, if any. The handle is cleared
    /// even when the resolve call fails; the remote may end up with a stale
    /// open incident, but the next outage opens a fresh one rather than
    /// wedging escalation on a dead handle.
    pub async fn on_recovered(&mut self) {
        let Some(incident) = self.open.take() else {
            return;
        };
        // `open` is only ever set when an API is configured.
        let Some(api) = &self.api else { return };

        match api.resolve(&incident).await {
            Ok(()) => {
                self.bus
                    .publish(Event::now(EventKind::IncidentResolved).with_incident(&incident.id));
            }
            Err(err) => {
                self.bus
                    .publish(Event::now(EventKind::EscalationFailed).with_reason(err.to_string()));
            }
        }
    }
}

/// PagerTree-style incident backend.
///
/// Both operations POST a small JSON object to the integration URL; create
/// carries the title and description, resolve only the id.
pub struct PagerTreeApi {
    client: reqwest::Client,
    url: String,
}

const PAGERTREE_URL_BASE: &str = "https://api.pagertree.com/integration/int_";

impl PagerTreeApi {
    /// Creates a backend for the given integration id.
    pub fn new(integration_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{PAGERTREE_URL_BASE}{integration_id}"),
        }
    }

    async fn post(&self, body: serde_json::Value) -> Result<(), EscalationError> {
        self.client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl IncidentApi for PagerTreeApi {
    async fn open(&self, incident: &Incident) -> Result<(), EscalationError> {
        self.post(serde_json::json!({
            "event_type": "create",
            "Id": incident.id,
            "Title": incident.title,
            "Description": incident.description,
        }))
        .await
    }

    async fn resolve(&self, incident: &Incident) -> Result<(), EscalationError> {
        self.post(serde_json::json!({
            "event_type": "resolve",
            "Id": incident.id,
        }))
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockApi;
    use super::*;

    fn bus() -> Bus {
        Bus::new(64)
    }

    #[tokio::test]
    async fn first_failure_opens_one_incident() {
        let api = MockApi::arc();
        let mut esc = Escalator::new(Some(api.clone()), bus());

        esc.on_failing("timed out after 5s").await;
        assert_eq!(api.opens(), 1);
        assert!(esc.has_open_incident());
    }

    #[tokio::test]
    async fn repeated_failures_never_double_open() {
        let api = MockApi::arc();
        let mut esc = Escalator::new(Some(api.clone()), bus());

        esc.on_failing("connection refused").await;
        esc.on_failing("connection refused").await;
        esc.on_failing("timed out after 5s").await;
        assert_eq!(api.opens(), 1);
    }

    #[tokio::test]
    async fn recovery_resolves_and_clears() {
        let api = MockApi::arc();
        let mut esc = Escalator::new(Some(api.clone()), bus());

        esc.on_failing("connection refused").await;
        esc.on_recovered().await;
        assert_eq!(api.resolves(), 1);
        assert!(!esc.has_open_incident());

        // A second recovery has nothing to resolve.
        esc.on_recovered().await;
        assert_eq!(api.resolves(), 1);
    }

    #[tokio::test]
    async fn recovery_without_incident_is_a_noop() {
        let api = MockApi::arc();
        let mut esc = Escalator::new(Some(api.clone()), bus());

        esc.on_recovered().await;
        assert_eq!(api.resolves(), 0);
    }

    #[tokio::test]
    async fn unconfigured_escalator_never_calls_out() {
        let mut esc = Escalator::new(None, bus());
        esc.on_failing("connection refused").await;
        esc.on_recovered().await;
        assert!(!esc.has_open_incident());
    }

    #[tokio::test]
    async fn failed_open_is_swallowed_and_retried_later() {
        let api = MockApi::failing();
        let b = bus();
        let mut rx = b.subscribe();
        let mut esc = Escalator::new(Some(api.clone()), b);

        esc.on_failing("connection refused").await;
        assert!(!esc.has_open_incident());

        // No handle was stored, so the next failing transition tries again.
        esc.on_failing("connection refused").await;
        assert_eq!(api.opens(), 2);

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::EscalationFailed);
    }

    #[tokio::test]
    async fn failed_resolve_clears_the_handle() {
        let api = MockApi::arc();
        let mut esc = Escalator::new(Some(api.clone()), bus());

        esc.on_failing("connection refused").await;
        api.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        esc.on_recovered().await;

        assert_eq!(api.resolves(), 1);
        assert!(!esc.has_open_incident());
    }

    #[test]
    fn incident_ids_are_unique() {
        let a = Incident::new(INCIDENT_TITLE, "x");
        let b = Incident::new(INCIDENT_TITLE, "x");
        assert_ne!(a.id, b.id);
    }
}
