//! # Component — A Closed Vocabulary of Plain Data
//!
//! Components are plain data records: a `Position`, a `Velocity`, a
//! `Health`. This module fixes the full set of kinds at compile time:
//!
//! - [`ComponentKind`] — the tag enum, one variant per kind.
//! - One payload struct per kind (`Position`, `Health`, ...), all dumb data.
//! - [`ComponentValue`] — the sum type a store slot actually holds.
//! - [`Component`] — the trait that ties a payload struct to its tag, so a
//!   typed accessor like `world.get::<Health>(e)` resolves its return shape
//!   from the kind once, with no per-call-site downcasting.
//! - [`KindSet`] — a bitmask over kinds, used both as an entity's membership
//!   record and as the canonical (order-independent) query key.
//!
//! ## Why a closed enum instead of `TypeId`?
//!
//! A `TypeId`-keyed store accepts any `'static` type, which is flexible but
//! means every read site re-asserts the payload shape and nothing enumerates
//! the vocabulary. With the kinds closed, membership compresses to one `u32`
//! bitmask, query keys are `Copy + Eq + Hash` for free, and a mismatch
//! between tag and payload is unrepresentable.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: open registries keyed by `TypeId`, type-erased
//!   columns underneath.
//! - **taktr**: closed enum, one match away from the concrete payload, zero
//!   unsafe and zero downcasts.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag identifying one component kind. The set is closed: adding a kind
/// means adding a variant here, a payload struct, and one line in the
/// `impl_component!` invocation below.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum ComponentKind {
    Position,
    Velocity,
    Health,
    Sprite,
    Collider,
    Lifetime,
}

impl ComponentKind {
    /// Every kind, in declaration order.
    pub const ALL: [ComponentKind; Self::COUNT] = [
        ComponentKind::Position,
        ComponentKind::Velocity,
        ComponentKind::Health,
        ComponentKind::Sprite,
        ComponentKind::Collider,
        ComponentKind::Lifetime,
    ];

    /// Number of kinds in the closed set.
    pub const COUNT: usize = 6;

    /// Index into per-kind storage tables.
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// This kind's bit in a [`KindSet`].
    pub(crate) fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

// ── Payloads ─────────────────────────────────────────────────────────────

/// World-space position, in world units.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Position(pub Vec2);

/// Velocity in world units per second. Applied by the movement system once
/// per tick.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

/// Hit points. `current` may legitimately be zero or negative; whether that
/// means death is combat-rules territory, outside this crate.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

/// Which cell of which atlas the external renderer should draw for this
/// entity. The substrate never interprets these fields.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Sprite {
    pub atlas: u32,
    pub frame: u32,
    /// Draw order; higher layers render on top.
    pub layer: i8,
}

/// Axis-aligned collision bounds, centered on the entity's position.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Collider {
    pub half_extents: Vec2,
}

/// Seconds of simulated time left before the owning entity should be
/// destroyed (projectiles, particles, timed pickups).
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining: f32,
}

// ── Sum type ─────────────────────────────────────────────────────────────

/// One stored component: a tag plus its matching payload, inseparable.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum ComponentValue {
    Position(Position),
    Velocity(Velocity),
    Health(Health),
    Sprite(Sprite),
    Collider(Collider),
    Lifetime(Lifetime),
}

impl ComponentValue {
    /// The tag for this value.
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentValue::Position(_) => ComponentKind::Position,
            ComponentValue::Velocity(_) => ComponentKind::Velocity,
            ComponentValue::Health(_) => ComponentKind::Health,
            ComponentValue::Sprite(_) => ComponentKind::Sprite,
            ComponentValue::Collider(_) => ComponentKind::Collider,
            ComponentValue::Lifetime(_) => ComponentKind::Lifetime,
        }
    }
}

/// Ties a payload struct to its [`ComponentKind`] so accessors can go from
/// type to tag (and back) without runtime casts.
pub trait Component: Sized {
    /// The tag this payload belongs to.
    const KIND: ComponentKind;

    /// Wrap the payload into a storable [`ComponentValue`].
    fn wrap(self) -> ComponentValue;

    /// Borrow the payload out of a value, `None` if the tag differs.
    fn unwrap_ref(value: &ComponentValue) -> Option<&Self>;

    /// Mutably borrow the payload out of a value, `None` if the tag differs.
    fn unwrap_mut(value: &mut ComponentValue) -> Option<&mut Self>;
}

macro_rules! impl_component {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn wrap(self) -> ComponentValue {
                    ComponentValue::$ty(self)
                }

                fn unwrap_ref(value: &ComponentValue) -> Option<&Self> {
                    match value {
                        ComponentValue::$ty(payload) => Some(payload),
                        _ => None,
                    }
                }

                fn unwrap_mut(value: &mut ComponentValue) -> Option<&mut Self> {
                    match value {
                        ComponentValue::$ty(payload) => Some(payload),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for ComponentValue {
                fn from(payload: $ty) -> Self {
                    ComponentValue::$ty(payload)
                }
            }
        )+
    };
}

impl_component!(Position, Velocity, Health, Sprite, Collider, Lifetime);

// ── KindSet ──────────────────────────────────────────────────────────────

/// An order-independent set of [`ComponentKind`]s packed into one `u32`.
///
/// Doubles as an entity's membership record and as the canonical query-cache
/// key: `{A, B}` and `{B, A}` are the same bits, so no sorting or
/// deduplication is ever needed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u32);

impl KindSet {
    /// The empty set.
    pub const EMPTY: KindSet = KindSet(0);

    /// Build a set from a slice of kinds. Duplicates collapse.
    pub fn of(kinds: &[ComponentKind]) -> Self {
        kinds.iter().copied().collect()
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Superset test: does `self` contain every kind in `required`?
    pub fn contains_all(self, required: KindSet) -> bool {
        self.0 & required.0 == required.0
    }

    /// Whether the two sets share any kind.
    pub fn intersects(self, other: KindSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate the contained kinds in declaration order.
    pub fn iter(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<ComponentKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = ComponentKind>>(iter: I) -> Self {
        let mut set = KindSet::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_knows_its_kind() {
        let value = ComponentValue::Health(Health {
            current: 50,
            max: 100,
        });
        assert_eq!(value.kind(), ComponentKind::Health);
        assert_eq!(Position::KIND, ComponentKind::Position);
    }

    #[test]
    fn wrap_and_unwrap_round_trip() {
        let value = Velocity(Vec2::new(10.0, 0.0)).wrap();
        assert_eq!(
            Velocity::unwrap_ref(&value),
            Some(&Velocity(Vec2::new(10.0, 0.0)))
        );
        // Wrong tag: the accessor refuses rather than reinterpreting.
        assert_eq!(Position::unwrap_ref(&value), None);
    }

    #[test]
    fn unwrap_mut_edits_in_place() {
        let mut value = Health {
            current: 10,
            max: 10,
        }
        .wrap();
        Health::unwrap_mut(&mut value).unwrap().current = 3;
        assert_eq!(Health::unwrap_ref(&value).unwrap().current, 3);
    }

    #[test]
    fn kind_set_is_order_independent() {
        let ab = KindSet::of(&[ComponentKind::Position, ComponentKind::Velocity]);
        let ba = KindSet::of(&[ComponentKind::Velocity, ComponentKind::Position]);
        assert_eq!(ab, ba);
        // Duplicates collapse rather than corrupting the key.
        let aab = KindSet::of(&[
            ComponentKind::Position,
            ComponentKind::Position,
            ComponentKind::Velocity,
        ]);
        assert_eq!(aab, ab);
        assert_eq!(ab.len(), 2);
    }

    #[test]
    fn kind_set_superset_and_intersection() {
        let held = KindSet::of(&[
            ComponentKind::Position,
            ComponentKind::Velocity,
            ComponentKind::Sprite,
        ]);
        let wanted = KindSet::of(&[ComponentKind::Position, ComponentKind::Velocity]);
        assert!(held.contains_all(wanted));
        assert!(!wanted.contains_all(held));

        let other = KindSet::of(&[ComponentKind::Health]);
        assert!(!held.intersects(other));
        assert!(held.intersects(wanted));
    }

    #[test]
    fn kind_set_insert_remove_iter() {
        let mut set = KindSet::EMPTY;
        assert!(set.is_empty());
        set.insert(ComponentKind::Lifetime);
        set.insert(ComponentKind::Health);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![ComponentKind::Health, ComponentKind::Lifetime]
        );
        set.remove(ComponentKind::Health);
        assert!(!set.contains(ComponentKind::Health));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn all_kinds_have_distinct_bits() {
        let every: KindSet = ComponentKind::ALL.into_iter().collect();
        assert_eq!(every.len(), ComponentKind::COUNT);
    }
}
