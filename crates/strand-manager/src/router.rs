use std::sync::RwLock;

use strand_store::FilterSet;
use strand_types::{Object, ObjectHash};
use tokio::sync::mpsc;

/// An object on its way to subscribers, with its hash precomputed.
#[derive(Clone, Debug)]
pub struct Routed {
    pub hash: ObjectHash,
    pub object: Object,
}

/// Internal subscriber: a filter paired with its queue.
struct Subscriber {
    filter: FilterSet,
    sender: mpsc::UnboundedSender<Routed>,
}

/// Fan-out router that delivers new objects to matching subscribers.
pub struct SubscriberRouter {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl SubscriberRouter {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register a new subscriber with the given filter.
    ///
    /// The returned queue is unbounded: a slow reader holds every matching
    /// object until it catches up or is dropped.
    pub fn subscribe(&self, filter: FilterSet) -> mpsc::UnboundedReceiver<Routed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .push(Subscriber { filter, sender: tx });
        rx
    }

    /// Route an object to all matching subscribers.
    /// Subscribers whose receivers are gone are pruned.
    pub fn route(&self, hash: &ObjectHash, object: &Object) {
        let mut subs = self.subscribers.write().expect("router lock poisoned");
        subs.retain(|sub| {
            if sub.filter.matches(object, hash) {
                // If send fails (no receivers), the subscriber is stale.
                sub.sender
                    .send(Routed {
                        hash: hash.clone(),
                        object: object.clone(),
                    })
                    .is_ok()
            } else {
                !sub.sender.is_closed()
            }
        });
    }

    /// Number of registered subscribers, including stale ones not yet pruned.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("router lock poisoned")
            .len()
    }
}

impl Default for SubscriberRouter {
    fn default() -> Self {
        Self::new()
    }
}
