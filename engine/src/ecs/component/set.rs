use std::any::Any;
use std::fmt;

use crate::ecs::component::BoxedComponent;
use crate::ecs::entity::Entity;
use crate::ecs::sparse::{EntitySet, SparseSet};

/// The dense index from entity to component value for a single registered
/// type. Values are stored type-erased; the storage facade guarantees a set
/// never mixes value types.
pub(crate) struct ComponentSet {
    /// Human-readable type name, kept for diagnostics.
    name: &'static str,
    values: SparseSet<BoxedComponent>,
}

impl ComponentSet {
    pub(crate) fn new(name: &'static str, capacity: u32) -> Self {
        Self {
            name,
            values: SparseSet::new(capacity),
        }
    }

    #[inline]
    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    /// Insert a value for an entity. An entity appears in a component set at
    /// most once; a duplicate insert is rejected, not overwritten.
    pub(crate) fn insert(&mut self, entity: Entity, value: BoxedComponent) -> bool {
        self.values.insert(entity, value)
    }

    /// Remove-then-reinsert, the upsert used by replace.
    pub(crate) fn replace(&mut self, entity: Entity, value: BoxedComponent) -> bool {
        self.values.remove(entity);
        self.values.insert(entity, value)
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> bool {
        self.values.remove(entity)
    }

    #[inline]
    pub(crate) fn contains(&self, entity: Entity) -> bool {
        self.values.contains(entity)
    }

    /// Downcast the stored value for an entity to its concrete type.
    pub(crate) fn get<C: Any>(&self, entity: Entity) -> Option<&C> {
        self.values.get(entity)?.downcast_ref::<C>()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    /// The membership of this set as an id-only sparse set, the form the
    /// matcher algebra operates on.
    pub(crate) fn ids(&self) -> EntitySet {
        self.values.ids()
    }

    /// The single entity holding this component, when exactly one does.
    pub(crate) fn sole_entity(&self) -> Option<Entity> {
        if self.values.len() != 1 {
            return None;
        }
        self.values.iter().next().map(|(id, _)| id)
    }
}

// Values are type-erased trait objects, so only the membership is printable.
impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSet")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed<C: Send + Sync + 'static>(value: C) -> BoxedComponent {
        Box::new(value)
    }

    #[test]
    fn insert_and_typed_get() {
        let mut set = ComponentSet::new("Health", 8);
        assert!(set.insert(Entity::from(1), boxed(100u32)));

        assert_eq!(set.get::<u32>(Entity::from(1)), Some(&100));
        // Wrong type downcasts to None rather than panicking
        assert_eq!(set.get::<i64>(Entity::from(1)), None);
        assert_eq!(set.name(), "Health");
    }

    #[test]
    fn duplicate_insert_rejected_replace_allowed() {
        let mut set = ComponentSet::new("Health", 8);
        assert!(set.insert(Entity::from(1), boxed(100u32)));
        assert!(!set.insert(Entity::from(1), boxed(50u32)));
        assert_eq!(set.get::<u32>(Entity::from(1)), Some(&100));

        assert!(set.replace(Entity::from(1), boxed(50u32)));
        assert_eq!(set.get::<u32>(Entity::from(1)), Some(&50));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn sole_entity_requires_exactly_one() {
        let mut set = ComponentSet::new("Grid", 8);
        assert_eq!(set.sole_entity(), None);
        set.insert(Entity::from(3), boxed(1u8));
        assert_eq!(set.sole_entity(), Some(Entity::from(3)));
        set.insert(Entity::from(4), boxed(2u8));
        assert_eq!(set.sole_entity(), None);
    }
}
