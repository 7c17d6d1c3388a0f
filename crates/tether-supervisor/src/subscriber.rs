//! # Subscriber interface
//!
//! [`Subscribe`] is how a UI layer hooks into lifecycle transitions. Each
//! registered subscriber gets its own queue and worker task:
//!
//! ```text
//! publish(state)
//!     ├──► [queue S1] ─► worker S1 ─► on_state()
//!     └──► [queue SN] ─► worker SN ─► on_state()
//! ```
//!
//! - Delivery is FIFO per subscriber; every transition is delivered.
//! - A slow subscriber only delays its own queue, never the state machine.
//! - Panics inside `on_state` are caught and logged.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::state::ServiceState;

/// Receives every published [`ServiceState`], in order.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Called on the subscriber's own worker task for every transition
    async fn on_state(&self, state: &ServiceState);

    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::UnboundedSender<Arc<ServiceState>>,
}

/// Fan-out to subscribers with one worker per subscriber
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Spawn one worker per subscriber
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subscribers.len());
        let mut workers = Vec::with_capacity(subscribers.len());

        for subscriber in subscribers {
            let name = subscriber.name();
            let (tx, mut rx) = mpsc::unbounded_channel::<Arc<ServiceState>>();

            workers.push(tokio::spawn(async move {
                while let Some(state) = rx.recv().await {
                    let delivery = subscriber.on_state(state.as_ref());
                    if AssertUnwindSafe(delivery).catch_unwind().await.is_err() {
                        warn!(subscriber = name, state = %state, "Subscriber panicked");
                    }
                }
            }));
            channels.push(SubscriberChannel { name, sender: tx });
        }

        Self { channels, workers }
    }

    /// Queue a state for every subscriber without waiting
    pub fn emit(&self, state: &ServiceState) {
        let state = Arc::new(state.clone());
        for channel in &self.channels {
            if channel.sender.send(Arc::clone(&state)).is_err() {
                warn!(subscriber = channel.name, "Subscriber worker closed, dropping state");
            }
        }
    }

    /// Close all queues and wait until every queued state was delivered
    pub async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field(
                "subscribers",
                &self.channels.iter().map(|c| c.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
