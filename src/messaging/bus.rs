use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
/// Change bus for pub/sub notifications
///
/// Lets hosts subscribe to stepper changes; one bus may serve many steppers.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::events::StepperChange;

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<StepperChange>,
}

/// Bus broadcasting changes to subscribers; clones share subscribers
#[derive(Clone, Default)]
pub struct ChangeBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    next_id: Arc<AtomicUsize>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to changes, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<StepperChange>, SubscriberId) {
        let (tx, rx) = unbounded();
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.subscribers.write().push(Subscriber { id, sender: tx });

        (rx, id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    /// Publish a change to all subscribers, dropping closed ones
    pub fn publish(&self, change: StepperChange) {
        tracing::trace!("{}", change.description());

        let mut closed = Vec::new();
        for subscriber in self.subscribers.read().iter() {
            if subscriber.sender.try_send(change.clone()).is_err() {
                closed.push(subscriber.id);
            }
        }

        if !closed.is_empty() {
            self.subscribers.write().retain(|s| !closed.contains(&s.id));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
