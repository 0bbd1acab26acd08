//! Entity handles and allocation.
//!
//! An [`Entity`] is a 64-bit opaque handle. Handles are handed out
//! sequentially starting at 0 and are never recycled: once an entity is
//! destroyed its handle stays invalid for the lifetime of the world, so there
//! is no need for generation counters to detect stale references.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An opaque entity handle, unique for the lifetime of a [`World`](crate::world::World).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    /// The sequential index of this entity (its allocation order).
    #[inline]
    pub fn index(self) -> u64 {
        self.0
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    ///
    /// The result is only meaningful for handles previously produced by the
    /// same world; anything else is simply reported as not alive.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates strictly increasing [`Entity`] handles.
///
/// Destruction never feeds handles back into the allocator, so the sequence
/// of returned ids has no gaps and no repeats.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    /// Create a new allocator whose first handle is `Entity(0)`.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next handle.
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next += 1;
        entity
    }

    /// The handle the next call to [`allocate`](Self::allocate) will return.
    pub fn peek_next(&self) -> Entity {
        Entity(self.next)
    }

    /// Total number of handles ever allocated (alive or destroyed).
    pub fn allocated_count(&self) -> u64 {
        self.next
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sequentially_from_zero() {
        let mut alloc = EntityAllocator::new();
        let ids: Vec<u64> = (0..5).map(|_| alloc.allocate().index()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.peek_next(), Entity(0));
        assert_eq!(alloc.peek_next(), Entity(0));
        assert_eq!(alloc.allocate(), Entity(0));
        assert_eq!(alloc.peek_next(), Entity(1));
        assert_eq!(alloc.allocated_count(), 1);
    }

    #[test]
    fn entity_raw_roundtrip_and_formatting() {
        let e = Entity::from_raw(42);
        assert_eq!(e.to_raw(), 42);
        assert_eq!(format!("{e:?}"), "Entity(42)");
        assert_eq!(e.to_string(), "42");
    }

    #[test]
    fn entity_ordering_follows_allocation() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert!(a < b);
    }
}
