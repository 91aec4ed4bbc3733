//! # World — The Central Container
//!
//! The [`World`] owns everything the simulation knows: which entities are
//! alive, which component kinds each one carries, the per-kind value tables,
//! the query cache, the subscription bus, and the deferred command queue.
//! It is the single shared resource of the substrate; the fixed-timestep
//! loop owns it and lends it to one system at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ World                                                     │
//! │                                                           │
//! │  EntityAllocator: issues / recycles generational handles  │
//! │                                                           │
//! │  records: HashMap<Entity, KindSet>                        │
//! │    the authoritative membership record per live entity    │
//! │                                                           │
//! │  tables: [HashMap<Entity, ComponentValue>; COUNT]         │
//! │    one value table per kind, indexed by discriminant      │
//! │                                                           │
//! │  cache: QueryCache          (invalidated on mutation)     │
//! │  subscriptions: SubscriptionBus                           │
//! │  pending: CommandQueue      (drained at tick start)       │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The membership invariant
//!
//! A kind is set in an entity's record **iff** that kind's table holds a
//! value for the entity. Every mutating path updates both sides before
//! returning, and nothing else can write either side, so the two can never
//! diverge.
//!
//! ## Reading vs. writing values
//!
//! [`get`](World::get) and [`get_mut`](World::get_mut) hand out borrows into
//! the store; a `get_mut` write is real but fires no notifications. When a
//! change must be observable, write it back through [`update`](World::update)
//! so subscribers see it. Holding a borrow across other world calls is ruled
//! out by the borrow checker, which is the point: nothing outside the store
//! mutates a component behind its back.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::EcsError;

use super::component::{Component, ComponentKind, ComponentValue, KindSet};
use super::entity::{Entity, EntityAllocator};
use super::query::QueryCache;
use super::subscription::{Subscription, SubscriptionBus};

// ── Deferred commands ────────────────────────────────────────────────────

/// A structural mutation recorded now and applied at the next tick start.
///
/// Subscription callbacks (and any collaborator running inside a frame)
/// cannot mutate the world directly; they record one of these instead. The
/// scheduler drains the queue before running the first system of a tick, so
/// every deferred change lands at a well-defined synchronization point.
#[derive(Debug, Clone)]
pub enum Command {
    /// Create a fresh entity carrying `components`.
    Spawn { components: Vec<ComponentValue> },
    /// Attach `value` to an existing entity.
    Attach { entity: Entity, value: ComponentValue },
    /// Detach a kind from an entity.
    Detach { entity: Entity, kind: ComponentKind },
    /// Destroy an entity outright.
    Destroy { entity: Entity },
}

/// Cloneable handle onto the world's deferred-command queue.
///
/// Hand clones to subscription callbacks or UI code; everything pushed here
/// is applied, in order, when the scheduler next drains the queue. The
/// queue is single-threaded by design, like the rest of the substrate.
#[derive(Clone)]
pub struct CommandQueue {
    inner: Rc<RefCell<Vec<Command>>>,
}

impl CommandQueue {
    fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Record a command for the next drain.
    pub fn push(&self, command: Command) {
        self.inner.borrow_mut().push(command);
    }

    /// Number of commands waiting to be applied.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    fn drain(&self) -> Vec<Command> {
        self.inner.borrow_mut().drain(..).collect()
    }
}

// ── World ────────────────────────────────────────────────────────────────

/// The entity registry, component store, query engine, and subscription bus
/// in one container. See the module docs for the layout.
pub struct World {
    allocator: EntityAllocator,
    /// Authoritative membership: which kinds each live entity carries.
    records: HashMap<Entity, KindSet>,
    /// One value table per kind, indexed by `ComponentKind::index()`.
    tables: [HashMap<Entity, ComponentValue>; ComponentKind::COUNT],
    cache: QueryCache,
    subscriptions: SubscriptionBus,
    pending: CommandQueue,
    /// Deferred loop-control flags, honored by the loop after the frame.
    /// Cells, so the read-only render callback can file requests too.
    stop_requested: Cell<bool>,
    pause_request: Cell<Option<bool>>,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            records: HashMap::new(),
            tables: std::array::from_fn(|_| HashMap::new()),
            cache: QueryCache::new(),
            subscriptions: SubscriptionBus::new(),
            pending: CommandQueue::new(),
            stop_requested: Cell::new(false),
            pause_request: Cell::new(None),
        }
    }

    // ── Entity lifecycle ─────────────────────────────────────────────

    /// Create an entity with no components. Cannot fail.
    pub fn create_empty(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.records.insert(entity, KindSet::EMPTY);
        entity
    }

    /// Create an entity carrying an initial set of components.
    ///
    /// Each value goes through the normal [`attach`](World::attach) path. A
    /// duplicate kind in the initial set is an error; the half-built entity
    /// is destroyed again before the error is returned, so a failed create
    /// leaves no trace.
    pub fn create(
        &mut self,
        components: impl IntoIterator<Item = ComponentValue>,
    ) -> Result<Entity, EcsError> {
        let entity = self.create_empty();
        for value in components {
            if let Err(err) = self.attach(entity, value) {
                self.destroy(entity);
                return Err(err);
            }
        }
        Ok(entity)
    }

    /// Destroy an entity and every trace of it: component values, membership
    /// record, affected query-cache entries, and all of its subscriptions.
    ///
    /// Idempotent: destroying a dead or stale handle returns `false` and has
    /// no side effects, because several collaborators may race to clean up
    /// the same entity.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        let kinds = self.records.remove(&entity).unwrap_or(KindSet::EMPTY);
        for kind in kinds.iter() {
            self.tables[kind.index()].remove(&entity);
        }
        self.cache.invalidate(kinds);
        self.subscriptions.cancel_entity(entity);
        self.allocator.deallocate(entity);
        true
    }

    /// Whether the handle names a live entity.
    pub fn exists(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// The kinds currently attached to an entity, `None` if it is dead.
    pub fn kinds(&self, entity: Entity) -> Option<KindSet> {
        self.records.get(&entity).copied()
    }

    // ── Component store ──────────────────────────────────────────────

    /// Attach a component the entity does not yet have.
    ///
    /// Errors with [`EcsError::DuplicateComponent`] if the kind is already
    /// present (use [`update`](World::update) to replace a value) and
    /// [`EcsError::UnknownEntity`] for dead handles.
    ///
    /// Attaching is silent: subscribers observe a component from its first
    /// `update`, not from the initial attach. Detach is symmetric and fires
    /// nothing either.
    pub fn attach(&mut self, entity: Entity, value: ComponentValue) -> Result<(), EcsError> {
        let kind = value.kind();
        let Some(kinds) = self.records.get_mut(&entity) else {
            return Err(EcsError::UnknownEntity(entity));
        };
        if kinds.contains(kind) {
            return Err(EcsError::DuplicateComponent { entity, kind });
        }
        kinds.insert(kind);
        self.tables[kind.index()].insert(entity, value);
        self.cache.invalidate(KindSet::of(&[kind]));
        Ok(())
    }

    /// Replace a component's value and notify its subscribers.
    ///
    /// Errors with [`EcsError::MissingComponent`] if the kind is absent and
    /// [`EcsError::UnknownEntity`] for dead handles. On success the new
    /// value is stored first, then every subscription on exactly this
    /// (entity, kind) pair fires synchronously, in registration order, with
    /// the new value.
    pub fn update(&mut self, entity: Entity, value: ComponentValue) -> Result<(), EcsError> {
        let kind = value.kind();
        let Some(kinds) = self.records.get(&entity) else {
            return Err(EcsError::UnknownEntity(entity));
        };
        if !kinds.contains(kind) {
            return Err(EcsError::MissingComponent { entity, kind });
        }
        self.tables[kind.index()].insert(entity, value);
        // Membership did not change, so the cache stays put. Fire with the
        // stored value; callbacks have no world access (see subscription
        // module docs), so these disjoint field borrows are the whole story.
        let stored = &self.tables[kind.index()][&entity];
        self.subscriptions.fire(entity, kind, stored);
        Ok(())
    }

    /// Typed read access. Absent is `None`, never an error, and is distinct
    /// from any stored value.
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.tables[C::KIND.index()]
            .get(&entity)
            .and_then(C::unwrap_ref)
    }

    /// Typed in-place write access for system inner loops.
    ///
    /// Writes through this borrow fire no subscriptions; route the final
    /// value through [`update`](World::update) when observers must see it.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.tables[C::KIND.index()]
            .get_mut(&entity)
            .and_then(C::unwrap_mut)
    }

    /// Kind-tagged read access when the caller works with [`ComponentValue`]
    /// directly (serialization, debug overlays).
    pub fn get_value(&self, entity: Entity, kind: ComponentKind) -> Option<&ComponentValue> {
        self.tables[kind.index()].get(&entity)
    }

    /// Remove a kind from an entity. Returns `false` (silently) when the
    /// kind is absent or the entity is dead.
    pub fn detach(&mut self, entity: Entity, kind: ComponentKind) -> bool {
        let Some(kinds) = self.records.get_mut(&entity) else {
            return false;
        };
        if !kinds.contains(kind) {
            return false;
        }
        kinds.remove(kind);
        self.tables[kind.index()].remove(&entity);
        self.cache.invalidate(KindSet::of(&[kind]));
        true
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Every entity whose kind set is a superset of `kinds`, sorted by
    /// entity index. Memoized per kind set; the empty set matches nothing.
    ///
    /// The order is stable for a fixed world state, so iterating systems
    /// behave identically frame to frame until something mutates.
    pub fn query(&mut self, kinds: &[ComponentKind]) -> Vec<Entity> {
        let required = KindSet::of(kinds);
        if required.is_empty() {
            return Vec::new();
        }
        self.cache.get_or_compute(required, &self.records)
    }

    /// The uncached reference scan. Same contract and same result as
    /// [`query`](World::query); exists so the equivalence between the two is
    /// testable.
    #[cfg(test)]
    pub(crate) fn query_uncached(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        let required = KindSet::of(kinds);
        if required.is_empty() {
            return Vec::new();
        }
        super::query::scan(&self.records, required)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Observe updates to `(entity, kind)`. The callback fires on every
    /// [`update`](World::update) of that pair until unsubscribed or the
    /// entity is destroyed; destruction cancels proactively, so the callback
    /// can never fire for a recycled slot.
    ///
    /// Errors with [`EcsError::UnknownEntity`] if the entity is already dead
    /// at subscribe time. Liveness is not re-checked afterward; it does not
    /// need to be.
    pub fn subscribe(
        &mut self,
        entity: Entity,
        kind: ComponentKind,
        callback: impl FnMut(Entity, &ComponentValue) + 'static,
    ) -> Result<Subscription, EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        Ok(self
            .subscriptions
            .subscribe(entity, kind, Box::new(callback)))
    }

    /// Cancel a subscription. Idempotent; safe after the entity is gone.
    pub fn unsubscribe(&mut self, subscription: &Subscription) {
        self.subscriptions.unsubscribe(subscription);
    }

    // ── Deferred commands ────────────────────────────────────────────

    /// A handle for recording deferred structural mutations. Clone it into
    /// subscription callbacks or collaborator code.
    pub fn commands(&self) -> CommandQueue {
        self.pending.clone()
    }

    /// Apply every queued command, in recording order. Called by the
    /// scheduler at the start of each tick; hosts without a scheduler may
    /// call it at any point outside a tick.
    ///
    /// A command that fails (say, an attach racing a destroy that was queued
    /// first) is logged at warn level and dropped; deferred mutations have
    /// no caller left to hand the error to.
    pub fn apply_commands(&mut self) {
        for command in self.pending.drain() {
            match command {
                Command::Spawn { components } => {
                    if let Err(err) = self.create(components) {
                        log::warn!("deferred spawn dropped: {err}");
                    }
                }
                Command::Attach { entity, value } => {
                    if let Err(err) = self.attach(entity, value) {
                        log::warn!("deferred attach dropped: {err}");
                    }
                }
                Command::Detach { entity, kind } => {
                    self.detach(entity, kind);
                }
                Command::Destroy { entity } => {
                    self.destroy(entity);
                }
            }
        }
    }

    // ── Loop control ─────────────────────────────────────────────────

    /// Ask the driving loop to stop after the current frame completes. The
    /// in-frame form of [`GameLoop::stop`](crate::runner::GameLoop::stop);
    /// works from a system (`&mut World`) and from the read-only render
    /// callback alike.
    pub fn request_stop(&self) {
        self.stop_requested.set(true);
    }

    /// Ask the driving loop to pause or resume after the current frame.
    pub fn request_pause(&self, paused: bool) {
        self.pause_request.set(Some(paused));
    }

    /// Take and reset the deferred control flags. Loop-internal.
    pub(crate) fn take_control(&mut self) -> (bool, Option<bool>) {
        (self.stop_requested.replace(false), self.pause_request.replace(None))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
