//! Fixed-capacity sparse set, the foundational container of the ECS.
//!
//! A [`SparseSet`] maps a small dense integer key (an [`Entity`] id) to a value
//! with O(1) insert, remove, contains, and lookup. It maintains two arrays:
//!
//! - a **dense** array of `(entity, value)` entries packed at the front
//! - a **sparse** array mapping entity id to its dense slot, with a sentinel
//!   "null" slot value equal to the capacity
//!
//! Removal swaps the removed dense slot with the last occupied slot, so
//! iteration order is NOT stable across removals. Capacity is fixed at
//! construction; out-of-range ids are always rejected rather than growing the
//! structure.

use crate::ecs::entity::Entity;

/// A set of entity ids with no attached values.
pub type EntitySet = SparseSet<()>;

#[derive(Debug, Clone)]
struct Entry<T> {
    id: Entity,
    value: T,
}

/// A dense-array-backed associative container keyed by entity id.
///
/// Invariants:
/// - `sparse[e] == null` iff `e` is absent, where `null == capacity`
/// - for a present `e`, `dense[sparse[e]].id == e`
/// - entity ids satisfy `0 <= e < capacity`; out-of-range or duplicate
///   inserts are rejected with `false` and no mutation
#[derive(Debug, Clone)]
pub struct SparseSet<T> {
    dense: Vec<Entry<T>>,
    sparse: Vec<u32>,
    capacity: u32,
}

impl<T> SparseSet<T> {
    /// Construct an empty set able to hold ids in `0..capacity`.
    pub fn new(capacity: u32) -> Self {
        Self {
            dense: Vec::new(),
            sparse: vec![capacity; capacity as usize],
            capacity,
        }
    }

    /// The fixed id capacity of this set. Also the sentinel slot value.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The number of entries currently present.
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the set holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Insert a value for the given id.
    ///
    /// Returns `false` with no mutation if the id is out of range, the set is
    /// at capacity, or the id is already present. Duplicate inserts are an
    /// error at this level; callers wanting upsert semantics remove first.
    pub fn insert(&mut self, id: Entity, value: T) -> bool {
        if id.id() >= self.capacity || self.dense.len() >= self.capacity as usize {
            return false;
        }
        if self.contains(id) {
            return false;
        }
        self.sparse[id.index()] = self.dense.len() as u32;
        self.dense.push(Entry { id, value });
        true
    }

    /// Remove the entry for the given id in O(1) via last-element swap.
    ///
    /// Returns `false` if the id is absent. The swap may change the dense
    /// position of one other entry, which is why iteration order is unstable.
    pub fn remove(&mut self, id: Entity) -> bool {
        if !self.contains(id) {
            return false;
        }
        let slot = self.sparse[id.index()] as usize;
        self.dense.swap_remove(slot);
        // Fix up the sparse pointer of the entry that moved into the hole.
        if slot < self.dense.len() {
            self.sparse[self.dense[slot].id.index()] = slot as u32;
        }
        self.sparse[id.index()] = self.capacity;
        true
    }

    /// Whether the given id is present. O(1) bounds + sparse-pointer check.
    #[inline]
    pub fn contains(&self, id: Entity) -> bool {
        id.id() < self.capacity && self.sparse[id.index()] != self.capacity
    }

    /// Get the value for the given id, or `None` if absent.
    #[inline]
    pub fn get(&self, id: Entity) -> Option<&T> {
        if !self.contains(id) {
            return None;
        }
        Some(&self.dense[self.sparse[id.index()] as usize].value)
    }

    /// Get a mutable reference to the value for the given id, or `None` if absent.
    #[inline]
    pub fn get_mut(&mut self, id: Entity) -> Option<&mut T> {
        if !self.contains(id) {
            return None;
        }
        let slot = self.sparse[id.index()] as usize;
        Some(&mut self.dense[slot].value)
    }

    /// Remove every entry, resetting all sparse pointers to null. O(capacity).
    pub fn clear(&mut self) {
        self.dense.clear();
        self.sparse.fill(self.capacity);
    }

    /// A one-shot iterator over `(id, value)` pairs in current dense-array
    /// order. The order is arbitrary and may change after any removal.
    /// Mutating the set while iterating is prevented by the borrow.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.dense.iter(),
        }
    }

    /// Copy just the membership of this set into an [`EntitySet`].
    pub fn ids(&self) -> EntitySet {
        let mut result = EntitySet::new(self.capacity);
        for entry in &self.dense {
            result.insert(entry.id, ());
        }
        result
    }
}

impl<T: Clone> SparseSet<T> {
    /// A new set holding the entries of `self` whose ids are also present in
    /// `other`. Values come from `self`. Read-only with respect to both
    /// operands; result capacity is the min of the operand capacities.
    pub fn intersect_by_id(&self, other: &SparseSet<T>) -> SparseSet<T> {
        let mut result = SparseSet::new(self.capacity.min(other.capacity));
        // Walk the smaller operand, probe the larger.
        if self.len() <= other.len() {
            for (id, value) in self.iter() {
                if other.contains(id) {
                    result.insert(id, value.clone());
                }
            }
        } else {
            for (id, _) in other.iter() {
                if let Some(value) = self.get(id) {
                    result.insert(id, value.clone());
                }
            }
        }
        result
    }

    /// A new set holding the entries of both operands. Where an id is present
    /// in both, the value from `self` wins (the later duplicate insert is a
    /// no-op). Result capacity is the max of the operand capacities.
    pub fn union_by_id(&self, other: &SparseSet<T>) -> SparseSet<T> {
        let mut result = SparseSet::new(self.capacity.max(other.capacity));
        for (id, value) in self.iter() {
            result.insert(id, value.clone());
        }
        for (id, value) in other.iter() {
            result.insert(id, value.clone());
        }
        result
    }

    /// A new set holding the entries of `self` whose ids are not present in
    /// `other`. Result capacity is the receiver's.
    pub fn difference_by_id(&self, other: &SparseSet<T>) -> SparseSet<T> {
        let mut result = SparseSet::new(self.capacity);
        for (id, value) in self.iter() {
            if !other.contains(id) {
                result.insert(id, value.clone());
            }
        }
        result
    }
}

impl EntitySet {
    /// Insert just an id into an id-only set.
    #[inline]
    pub fn insert_id(&mut self, id: Entity) -> bool {
        self.insert(id, ())
    }
}

/// Iterator over the entries of a [`SparseSet`] in dense-array order.
pub struct Iter<'a, T> {
    inner: std::slice::Iter<'a, Entry<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Entity, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (entry.id, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T> IntoIterator for &'a SparseSet<T> {
    type Item = (Entity, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
