//! Ordered observer registry with stable handles.
//!
//! Entries live in insertion order inside a slot vector; removal leaves a
//! tombstone that is compacted once tombstones outnumber live entries, so
//! both add and remove are amortised O(1). Notification always works on a
//! snapshot, so callbacks may subscribe or unsubscribe while being called.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use wayfinder_model::ExplorationStep;

/// Callback invoked once per replayed step.
pub type StepCallback = Arc<dyn Fn(&ExplorationStep) + Send + Sync>;

/// Stable identity of a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    next_id: u64,
    slots: Vec<Option<(SubscriptionId, StepCallback)>>,
    index: HashMap<SubscriptionId, usize>,
}

impl SubscriberRegistry {
    pub(crate) fn insert(&mut self, callback: StepCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.slots.len());
        self.slots.push(Some((id, callback)));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let Some(slot) = self.index.remove(&id) else {
            return false;
        };
        self.slots[slot] = None;
        if self.slots.len() > 2 * self.index.len() {
            self.compact();
        }
        true
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        self.index.clear();
        for (position, entry) in self.slots.iter().enumerate() {
            if let Some((id, _)) = entry {
                self.index.insert(*id, position);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Live callbacks in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<StepCallback> {
        self.slots
            .iter()
            .flatten()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }
}

/// Handle returned by `subscribe`; call [`Subscription::unsubscribe`] to
/// stop receiving steps. Dropping the handle keeps the callback registered.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<Mutex<SubscriberRegistry>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, registry: &Arc<Mutex<SubscriberRegistry>>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the callback. Returns false if the controller is gone or the
    /// callback was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.lock().remove(self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("live", &self.index.len())
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wayfinder_model::StepAction;

    fn tagging(log: &Arc<Mutex<Vec<u32>>>, tag: u32) -> StepCallback {
        let log = Arc::clone(log);
        Arc::new(move |_| log.lock().push(tag))
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SubscriberRegistry::default();
        registry.insert(tagging(&log, 1));
        let middle = registry.insert(tagging(&log, 2));
        registry.insert(tagging(&log, 3));
        registry.remove(middle);

        let step = ExplorationStep::new(0, StepAction::Start, "a");
        for callback in registry.snapshot() {
            callback(&step);
        }
        assert_eq!(*log.lock(), vec![1, 3]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = SubscriberRegistry::default();
        let id = registry.insert(Arc::new(|_| {}));
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn compaction_keeps_remaining_entries() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut registry = SubscriberRegistry::default();
        let ids: Vec<_> = (0..10)
            .map(|_| {
                let hits = Arc::clone(&hits);
                registry.insert(Arc::new(move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                }))
            })
            .collect();
        for id in &ids[..8] {
            registry.remove(*id);
        }
        assert_eq!(registry.len(), 2);
        assert!(registry.remove(ids[9]));

        let step = ExplorationStep::new(0, StepAction::Start, "a");
        for callback in registry.snapshot() {
            callback(&step);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_after_registry_dropped() {
        let registry = Arc::new(Mutex::new(SubscriberRegistry::default()));
        let id = registry.lock().insert(Arc::new(|_| {}));
        let subscription = Subscription::new(id, &registry);
        drop(registry);
        assert!(!subscription.unsubscribe());
    }
}
