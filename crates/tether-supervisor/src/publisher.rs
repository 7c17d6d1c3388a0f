//! Delivery of state transitions to observers

use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::state::ServiceState;
use crate::subscriber::SubscriberSet;

/// Holds the current state and pushes every replacement to all observers:
/// the `watch` getter, `broadcast` receivers and registered subscribers.
#[derive(Debug)]
pub(crate) struct Publisher {
    current: ServiceState,
    latest: watch::Sender<ServiceState>,
    stream: broadcast::Sender<ServiceState>,
    subscribers: SubscriberSet,
}

impl Publisher {
    pub(crate) fn new(
        latest: watch::Sender<ServiceState>,
        stream: broadcast::Sender<ServiceState>,
        subscribers: SubscriberSet,
    ) -> Self {
        let current = latest.borrow().clone();
        Self {
            current,
            latest,
            stream,
            subscribers,
        }
    }

    pub(crate) fn current(&self) -> &ServiceState {
        &self.current
    }

    pub(crate) fn publish(&mut self, next: ServiceState) {
        info!(
            from = %self.current.status(),
            to = %next.status(),
            "Service state changed"
        );
        self.current = next.clone();
        self.latest.send_replace(next.clone());
        self.subscribers.emit(&next);
        // No receivers is fine.
        let _ = self.stream.send(next);
    }

    /// Flush subscriber queues
    pub(crate) async fn shutdown(&mut self) {
        let subscribers = std::mem::replace(&mut self.subscribers, SubscriberSet::new(Vec::new()));
        subscribers.shutdown().await;
    }
}
