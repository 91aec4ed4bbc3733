//! # Subscription — Observing Component Updates
//!
//! External observers (the renderer, the HUD, dialog boxes) need to react
//! when a specific component on a specific entity changes, without being
//! wired into simulation internals. The bus keeps one listener list per
//! `(entity, kind)` pair and fires it synchronously from
//! [`World::update`](super::world::World::update).
//!
//! ## Rules
//!
//! - Attach never notifies; observation starts with the first `update` after
//!   registration.
//! - Listeners on the same pair fire in registration order. No ordering is
//!   promised across different pairs.
//! - Unsubscribe is idempotent; once it returns, the callback never runs
//!   again.
//! - Destroying an entity cancels all of its subscriptions, so no dangling
//!   callback can fire for a recycled slot.
//!
//! ## No world access inside callbacks
//!
//! A callback receives the entity and the new value, nothing else. The world
//! is mutably borrowed for the whole of `update`, so a callback cannot
//! reach back in to attach, detach, or destroy mid-notification; that class
//! of re-entrancy is unrepresentable rather than merely forbidden. A
//! callback that needs a structural change records a
//! [`Command`](super::world::Command) through a captured
//! [`CommandQueue`](super::world::CommandQueue) handle, and the scheduler
//! drains it at the start of the next tick.

use std::collections::HashMap;

use super::component::{ComponentKind, ComponentValue};
use super::entity::Entity;

/// Callback invoked with the entity and the freshly stored value.
pub type SubscriberFn = Box<dyn FnMut(Entity, &ComponentValue)>;

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
///
/// Plain data, so collaborators can store or copy it freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub(crate) id: u64,
    pub(crate) entity: Entity,
    pub(crate) kind: ComponentKind,
}

struct Listener {
    id: u64,
    callback: SubscriberFn,
}

/// Listener registry, owned by the [`World`](super::world::World).
pub(crate) struct SubscriptionBus {
    listeners: HashMap<(Entity, ComponentKind), Vec<Listener>>,
    next_id: u64,
}

impl SubscriptionBus {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register a callback. Entity liveness is the caller's check.
    pub fn subscribe(
        &mut self,
        entity: Entity,
        kind: ComponentKind,
        callback: SubscriberFn,
    ) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners
            .entry((entity, kind))
            .or_default()
            .push(Listener { id, callback });
        Subscription { id, entity, kind }
    }

    /// Remove one listener. Unknown or already-removed handles are a no-op.
    pub fn unsubscribe(&mut self, subscription: &Subscription) {
        let key = (subscription.entity, subscription.kind);
        if let Some(list) = self.listeners.get_mut(&key) {
            list.retain(|listener| listener.id != subscription.id);
            if list.is_empty() {
                self.listeners.remove(&key);
            }
        }
    }

    /// Drop every listener naming `entity`, across all kinds.
    pub fn cancel_entity(&mut self, entity: Entity) {
        for kind in ComponentKind::ALL {
            self.listeners.remove(&(entity, kind));
        }
    }

    /// Invoke the listeners for `(entity, kind)` in registration order.
    ///
    /// The list is taken out of the map while firing and restored after, so
    /// the bus itself is never aliased by a running callback.
    pub fn fire(&mut self, entity: Entity, kind: ComponentKind, value: &ComponentValue) {
        let key = (entity, kind);
        let Some(mut list) = self.listeners.remove(&key) else {
            return;
        };
        for listener in &mut list {
            (listener.callback)(entity, value);
        }
        self.listeners.insert(key, list);
    }

    /// Number of live listeners for one pair.
    #[cfg(test)]
    pub fn listener_count(&self, entity: Entity, kind: ComponentKind) -> usize {
        self.listeners
            .get(&(entity, kind))
            .map_or(0, |list| list.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Component, Health, Position};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn health(current: i32) -> ComponentValue {
        Health { current, max: 100 }.wrap()
    }

    fn entity(index: u32) -> Entity {
        Entity::from_raw_parts(index, 0)
    }

    #[test]
    fn fires_in_registration_order() {
        let mut bus = SubscriptionBus::new();
        let e = entity(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            bus.subscribe(
                e,
                ComponentKind::Health,
                Box::new(move |_, _| order.borrow_mut().push(tag)),
            );
        }

        bus.fire(e, ComponentKind::Health, &health(1));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let mut bus = SubscriptionBus::new();
        let e = entity(0);
        let hits = Rc::new(RefCell::new(0));

        let hits_cb = Rc::clone(&hits);
        let sub = bus.subscribe(
            e,
            ComponentKind::Health,
            Box::new(move |_, _| *hits_cb.borrow_mut() += 1),
        );

        bus.fire(e, ComponentKind::Health, &health(1));
        bus.unsubscribe(&sub);
        bus.unsubscribe(&sub); // second call is a no-op
        bus.fire(e, ComponentKind::Health, &health(2));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn cancel_entity_drops_every_kind() {
        let mut bus = SubscriptionBus::new();
        let e = entity(3);
        bus.subscribe(e, ComponentKind::Health, Box::new(|_, _| {}));
        bus.subscribe(e, ComponentKind::Position, Box::new(|_, _| {}));
        let other = entity(4);
        bus.subscribe(other, ComponentKind::Health, Box::new(|_, _| {}));

        bus.cancel_entity(e);
        assert_eq!(bus.listener_count(e, ComponentKind::Health), 0);
        assert_eq!(bus.listener_count(e, ComponentKind::Position), 0);
        assert_eq!(bus.listener_count(other, ComponentKind::Health), 1);
    }

    #[test]
    fn firing_is_scoped_to_the_exact_pair() {
        let mut bus = SubscriptionBus::new();
        let e = entity(0);
        let hits = Rc::new(RefCell::new(0));

        let hits_cb = Rc::clone(&hits);
        bus.subscribe(
            e,
            ComponentKind::Health,
            Box::new(move |_, _| *hits_cb.borrow_mut() += 1),
        );

        // Same entity, different kind; different entity, same kind.
        bus.fire(e, ComponentKind::Position, &Position::default().wrap());
        bus.fire(entity(9), ComponentKind::Health, &health(5));
        assert_eq!(*hits.borrow(), 0);

        bus.fire(e, ComponentKind::Health, &health(5));
        assert_eq!(*hits.borrow(), 1);
    }
}
