//! # Query — "All Entities Having X and Y"
//!
//! Systems ask the world for every entity carrying a required set of kinds,
//! every tick, for the same handful of sets. This module answers that
//! question and memoizes it.
//!
//! ## How a query runs
//!
//! ```text
//! world.query(&[Position, Velocity])
//!
//! 1. Collapse the slice to a KindSet — {A, B} and {B, A} are one key.
//! 2. Cache hit?  → clone the stored result.
//! 3. Cache miss? → linear scan of the membership records (superset test
//!    per entity), sort by entity index, store, clone.
//! ```
//!
//! ## Invalidation, eagerly
//!
//! Any attach, detach, or destroy that touches kind `k` removes every cached
//! entry whose key contains `k`, *before* the mutation returns. A stale
//! result is a correctness bug, not a performance one, so correctness beats
//! cleverness: we never patch entries in place.
//!
//! ## Ordering
//!
//! Results are sorted by entity index. Callers only rely on the order being
//! stable within a tick; sorting gives the stronger guarantee of one
//! deterministic order for a given world state, which keeps iteration-driven
//! systems reproducible frame to frame.
//!
//! The uncached scan is kept as the reference implementation; the cached
//! path must agree with it exactly (see the equivalence test).

use std::collections::HashMap;

use super::component::KindSet;
use super::entity::Entity;

/// Memoized query results keyed by the canonical kind set.
pub(crate) struct QueryCache {
    entries: HashMap<KindSet, Vec<Entity>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Fetch the result for `required`, computing and storing it on a miss.
    pub fn get_or_compute(
        &mut self,
        required: KindSet,
        records: &HashMap<Entity, KindSet>,
    ) -> Vec<Entity> {
        self.entries
            .entry(required)
            .or_insert_with(|| scan(records, required))
            .clone()
    }

    /// Drop every entry whose key intersects `touched`.
    pub fn invalidate(&mut self, touched: KindSet) {
        self.entries.retain(|key, _| !key.intersects(touched));
    }

    #[cfg(test)]
    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }
}

/// Uncached reference scan: every entity whose kind set is a superset of
/// `required`, sorted by entity index. The cached path must produce exactly
/// this.
pub(crate) fn scan(records: &HashMap<Entity, KindSet>, required: KindSet) -> Vec<Entity> {
    let mut result: Vec<Entity> = records
        .iter()
        .filter(|(_, kinds)| kinds.contains_all(required))
        .map(|(entity, _)| *entity)
        .collect();
    result.sort_by_key(|entity| (entity.index(), entity.generation()));
    result
}
