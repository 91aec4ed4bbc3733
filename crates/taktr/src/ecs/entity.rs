//! # Entity — Identity Without Data
//!
//! An [`Entity`] is a handle and nothing more. It carries no components
//! itself; the [`World`](super::world::World) maps handles to data. Keeping
//! identity separate from data is the core move of the ECS pattern.
//!
//! ## Design: Generational Indices
//!
//! Handles must never silently alias. A bare incrementing counter fails the
//! moment an id is recycled:
//!
//! ```text
//! 1. Create entity #5, hand the id to the combat overlay
//! 2. Destroy entity #5
//! 3. Create a new entity, slot #5 is recycled
//! 4. The overlay's stale handle now points at a stranger
//! ```
//!
//! The fix is to pair each slot index with a **generation** counter that is
//! bumped on every destroy. A stale handle keeps the old generation, so every
//! lookup through it fails validation instead of touching the wrong entity.
//! An index is therefore only ever reissued after all component data for the
//! previous occupant has been reclaimed, and never to a handle that could be
//! confused with it.
//!
//! ## Comparison
//!
//! - **hecs**: packs index + generation into one `u64`.
//! - **bevy_ecs**: same generational scheme behind more layers.
//!
//! Two plain `u32` fields are enough here; no bit packing.

use std::fmt;

/// A lightweight handle to one simulated game object.
///
/// Created by [`World::create`](super::world::World::create) and only valid
/// for the world that issued it, while its generation matches. Stale handles
/// are inert: every operation on one reports
/// [`UnknownEntity`](crate::error::EcsError::UnknownEntity) or returns
/// absent.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// Slot index in the allocator; recycled after destroy.
    pub(crate) index: u32,
    /// Bumped each time the slot is reissued, so stale handles are caught.
    pub(crate) generation: u32,
}

impl Entity {
    /// Raw slot index. For diagnostics and stable ordering, not for lookup.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation counter. For diagnostics.
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Issues and recycles entity handles.
///
/// ## Memory Layout
///
/// ```text
/// generations: [0, 1, 0, 2, 0]   ← one counter per slot ever issued
/// free_list:   [1, 3]            ← slots available for reuse
/// len:         5                 ← next fresh index when free_list is empty
/// ```
///
/// Create pops the free list (generation was already bumped on destroy) or
/// grows a fresh slot. Destroy bumps the generation and pushes the index.
pub(crate) struct EntityAllocator {
    /// Current generation for each slot, indexed by `Entity::index`.
    generations: Vec<u32>,
    /// Indices of destroyed entities, available for reuse.
    free_list: Vec<u32>,
    /// Total slots ever issued; also the next fresh index.
    len: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Issue a handle, recycling a freed slot when one exists.
    pub fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index as usize];
            Entity { index, generation }
        } else {
            let index = self.len;
            self.len += 1;
            self.generations.push(0);
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Retire a handle, making its slot reusable under a new generation.
    ///
    /// Returns `false` if the handle was already stale, in which case nothing
    /// changes.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        let idx = entity.index as usize;
        if idx < self.generations.len() && self.generations[idx] == entity.generation {
            self.generations[idx] += 1;
            self.free_list.push(entity.index);
            true
        } else {
            false
        }
    }

    /// Whether the handle still names a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index as usize;
        idx < self.generations.len() && self.generations[idx] == entity.generation
    }

    /// Number of currently live entities.
    pub fn alive_count(&self) -> usize {
        (self.len as usize) - self.free_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        let e1 = alloc.allocate();
        assert_eq!(e0.index, 0);
        assert_eq!(e1.index, 1);
        assert_eq!(e0.generation, 0);
        assert_eq!(e1.generation, 0);
    }

    #[test]
    fn recycle_bumps_generation() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        assert!(alloc.deallocate(e0));
        let reused = alloc.allocate();
        assert_eq!(reused.index, 0); // same slot
        assert_eq!(reused.generation, 1); // new occupant
        assert_ne!(e0, reused);
    }

    #[test]
    fn stale_handle_detected() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        assert!(alloc.is_alive(e0));
        alloc.deallocate(e0);
        assert!(!alloc.is_alive(e0));
    }

    #[test]
    fn double_free_is_inert() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        assert!(alloc.deallocate(e0));
        assert!(!alloc.deallocate(e0));
        assert_eq!(alloc.free_list.len(), 1); // not pushed twice
    }

    #[test]
    fn alive_count_tracks_lifecycle() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.alive_count(), 0);
        let e0 = alloc.allocate();
        let _e1 = alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);
        alloc.deallocate(e0);
        assert_eq!(alloc.alive_count(), 1);
    }
}
