//! Publication channel for message updates and invalidations.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use clarion_types::{MessageInvalidation, MessageUpdate};

use crate::subscription::Subscription;

pub type UpdateListener = Rc<dyn Fn(&MessageUpdate)>;
pub type InvalidationListener = Rc<dyn Fn(&MessageInvalidation)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    updates: Vec<(u64, UpdateListener)>,
    invalidations: Vec<(u64, InvalidationListener)>,
    closed: bool,
}

impl Listeners {
    /// Ids are unique across both lists.
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove(&mut self, id: u64) -> (Option<UpdateListener>, Option<InvalidationListener>) {
        let update = take_entry(&mut self.updates, id);
        let invalidation = take_entry(&mut self.invalidations, id);
        (update, invalidation)
    }
}

fn take_entry<T>(entries: &mut Vec<(u64, T)>, id: u64) -> Option<T> {
    let index = entries.iter().position(|(other, _)| *other == id)?;
    Some(entries.remove(index).1)
}

/// Synchronous fan-out to registered listeners, in registration order.
///
/// Delivery iterates over a snapshot, so a listener may register or release
/// listeners (including itself) while being called.
#[derive(Default)]
pub struct MessagePublisher {
    listeners: Rc<RefCell<Listeners>>,
}

impl MessagePublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message_update(&self, listener: impl Fn(&MessageUpdate) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.closed {
            return Subscription::inert();
        }
        let id = listeners.allocate_id();
        listeners.updates.push((id, Rc::new(listener)));
        let weak = Rc::downgrade(&self.listeners);
        Subscription::new(move || remove_listener(&weak, id))
    }

    pub fn on_message_invalidation(
        &self,
        listener: impl Fn(&MessageInvalidation) + 'static,
    ) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.closed {
            return Subscription::inert();
        }
        let id = listeners.allocate_id();
        listeners.invalidations.push((id, Rc::new(listener)));
        let weak = Rc::downgrade(&self.listeners);
        Subscription::new(move || remove_listener(&weak, id))
    }

    pub fn publish_update(&self, update: &MessageUpdate) {
        let snapshot: Vec<UpdateListener> = self
            .listeners
            .borrow()
            .updates
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(update);
        }
    }

    pub fn publish_invalidation(&self, invalidation: &MessageInvalidation) {
        let snapshot: Vec<InvalidationListener> = self
            .listeners
            .borrow()
            .invalidations
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(invalidation);
        }
    }

    #[must_use]
    pub fn update_listener_count(&self) -> usize {
        self.listeners.borrow().updates.len()
    }

    #[must_use]
    pub fn invalidation_listener_count(&self) -> usize {
        self.listeners.borrow().invalidations.len()
    }

    /// Drop every listener. Later publishes are no-ops and later
    /// registrations return inert subscriptions.
    pub fn close(&self) {
        let (updates, invalidations) = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.closed = true;
            (
                std::mem::take(&mut listeners.updates),
                std::mem::take(&mut listeners.invalidations),
            )
        };
        // Listener captures may own subscriptions; drop them outside the borrow.
        drop(updates);
        drop(invalidations);
    }
}

fn remove_listener(weak: &Weak<RefCell<Listeners>>, id: u64) {
    if let Some(listeners) = weak.upgrade() {
        let removed = listeners.borrow_mut().remove(id);
        // The listener may own other subscriptions; drop it after the borrow ends.
        drop(removed);
    }
}
