//! Observability: the [`Subscribe`] trait, the console writer, and the
//! listener task that drains the bus into subscribers.

mod console;
mod subscribe;

pub use console::ConsoleWriter;
pub use subscribe::Subscribe;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::events::Bus;

/// Spawns the listener task that forwards bus events to every subscriber in
/// order.
///
/// The task exits once every bus sender has been dropped (all buffered events
/// are delivered first), so awaiting the handle after the supervisor returns
/// flushes pending status lines.
pub fn spawn_listener(bus: &Bus, subs: Vec<Arc<dyn Subscribe>>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    for sub in &subs {
                        sub.on_event(&ev).await;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}
