//! # Entity/Component Data Store
//!
//! The simulation substrate's data half: entities composed dynamically from
//! a closed set of component kinds, queried repeatedly under continuous
//! mutation, observed from the outside through subscriptions.
//!
//! ## Module Overview
//!
//! - [`entity`] — generational entity handles
//! - [`component`] — the closed kind enum, payload structs, kind sets
//! - [`world`] — central container: registry, per-kind stores, commands
//! - [`query`] — cached kind-set queries with eager invalidation
//! - [`subscription`] — per-(entity, kind) update listeners
//! - [`system`] — the priority-ordered schedule a tick executes

pub mod component;
pub mod entity;
pub(crate) mod query;
pub mod subscription;
pub mod system;
pub mod world;

pub use component::{
    Collider, Component, ComponentKind, ComponentValue, Health, KindSet, Lifetime, Position,
    Sprite, Velocity,
};
pub use entity::Entity;
pub use subscription::Subscription;
pub use system::{Schedule, System};
pub use world::{Command, CommandQueue, World};
