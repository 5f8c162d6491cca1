//! # Keep-alive supervisor: the reconnect state machine.
//!
//! The [`Supervisor`] owns the whole connection lifecycle: it resolves the
//! endpoint, opens a session, waits for liveness payloads, and on any
//! connectivity failure tears down and retries after a fixed delay. Escalation
//! calls are awaited inline with the transitions that trigger them.
//!
//! ## State machine
//! ```text
//! Disconnected ──loop tick──► Connecting
//! Connecting ──connect ok───► Active       (escalator recovered, Connected event)
//! Connecting ──failure──────► RetryWait    (escalator failing, ConnectionLost event)
//! Active ──payload──────────► Active       (Active event, liveness renewed)
//! Active ──failure/timeout──► RetryWait    (session closed, escalator failing)
//! RetryWait ──delay elapsed─► Disconnected
//! any ──cancellation────────► exit         (session closed, Stopped event)
//! ```
//!
//! ## Rules
//! - At most one session exists at a time; it lives inside [`State::Active`],
//!   so the invariant holds by construction.
//! - The address is **re-resolved on every attempt**; a load-balanced name
//!   whose records change between attempts is picked up automatically.
//! - The retry delay is a fixed interval, deliberately without backoff: the
//!   monitored service is a single pinned endpoint, not a fleet with
//!   thundering-herd risk.
//! - Every failure path funnels through one `on_failing` call and every
//!   successful connect through one `on_recovered` call, which is what lets
//!   the escalator keep its at-most-one-open invariant without bookkeeping.
//! - Cancellation is observed at every suspension point (resolve, connect,
//!   receive, retry sleep) and is the only way the loop ends.

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::ClientError;
use crate::escalate::Escalator;
use crate::events::{Bus, Event, EventKind};
use crate::resolve::Endpoint;
use crate::session::Session;
use crate::transport::TransportFactory;

/// Supervisor state. Exactly one state holds at any instant; the live session
/// is owned by the `Active` variant.
enum State {
    Disconnected,
    Connecting,
    Active(Session),
    RetryWait,
}

/// Drives the reconnect loop for a single monitored endpoint.
///
/// One supervisor instance exists for the process lifetime; all socket
/// operations run sequentially within [`Supervisor::run`].
pub struct Supervisor {
    cfg: Config,
    endpoint: Endpoint,
    factory: TransportFactory,
    escalator: Escalator,
    bus: Bus,
}

impl Supervisor {
    /// Creates a supervisor for the endpoint described by `cfg`.
    pub fn new(cfg: Config, factory: TransportFactory, escalator: Escalator, bus: Bus) -> Self {
        let endpoint = cfg.endpoint();
        Self {
            cfg,
            endpoint,
            factory,
            escalator,
            bus,
        }
    }

    /// Runs the keep-alive loop until `ctx` is cancelled.
    ///
    /// Connectivity failures never terminate the loop; they are logged,
    /// escalated, and followed by the fixed retry delay. On cancellation any
    /// open session is closed before this returns.
    pub async fn run(&mut self, ctx: CancellationToken) {
        let mut state = State::Disconnected;

        loop {
            state = match state {
                State::Disconnected => {
                    if ctx.is_cancelled() {
                        break;
                    }
                    State::Connecting
                }

                State::Connecting => {
                    self.bus.publish(Event::now(EventKind::Connecting));
                    match self.connect(&ctx).await {
                        Ok(session) => {
                            self.escalator.on_recovered().await;
                            State::Active(session)
                        }
                        Err(ClientError::Canceled) => break,
                        Err(err) => {
                            self.report_failure(&err).await;
                            State::RetryWait
                        }
                    }
                }

                State::Active(mut session) => {
                    match session.await_message(self.cfg.receive_timeout, &ctx).await {
                        Ok(_payload) => {
                            self.bus.publish(Event::now(EventKind::Active));
                            State::Active(session)
                        }
                        Err(ClientError::Canceled) => {
                            session.close().await;
                            break;
                        }
                        Err(err) => {
                            session.close().await;
                            self.report_failure(&err).await;
                            State::RetryWait
                        }
                    }
                }

                State::RetryWait => {
                    self.bus.publish(
                        Event::now(EventKind::RetryScheduled).with_delay(self.cfg.retry_delay),
                    );
                    let delay = time::sleep(self.cfg.retry_delay);
                    tokio::pin!(delay);
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => break,
                        _ = &mut delay => State::Disconnected,
                    }
                }
            };
        }

        self.bus.publish(Event::now(EventKind::Stopped));
    }

    /// One connection attempt: fresh resolution, fresh transport, handshake.
    async fn connect(&self, ctx: &CancellationToken) -> Result<Session, ClientError> {
        let addr = self.endpoint.resolve(ctx).await?;
        let transport = (self.factory)();
        let session = Session::open(
            transport,
            addr,
            &self.cfg.handshake,
            self.cfg.connect_timeout,
            self.cfg.close_timeout,
            ctx,
        )
        .await?;
        self.bus
            .publish(Event::now(EventKind::Connected).with_addr(addr));
        Ok(session)
    }

    /// Single funnel for every connectivity failure: log, then escalate.
    async fn report_failure(&mut self, err: &ClientError) {
        self.bus
            .publish(Event::now(EventKind::ConnectionLost).with_reason(err.to_string()));
        self.escalator.on_failing(&err.to_string()).await;
    }
}
