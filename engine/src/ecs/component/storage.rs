use std::any::{TypeId, type_name};

use dashmap::DashMap;
use log::error;

use crate::ecs::component::{Bundle, Component, ComponentSet};
use crate::ecs::entity::Entity;
use crate::ecs::sparse::EntitySet;

/// Default entity id capacity of a storage.
pub const MAX_ENTITIES: u32 = 8192;

/// Owns one [`ComponentSet`] per registered component type plus the set of
/// live entity ids, and assigns new entity identifiers.
///
/// Component types are registered lazily: the first time a value of a type is
/// seen it is assigned the next dense set slot. The `TypeId` to slot map is a
/// concurrent map so matcher evaluation can resolve types lock-free while
/// groups re-evaluate on worker threads; all mutation goes through `&mut self`
/// and is serialized by the world.
///
/// Misuse (duplicate adds, wrong unique cardinality) is logged and ignored
/// rather than returned as an error; callers guard with presence checks.
#[derive(Debug)]
pub struct ComponentStorage {
    /// Map from component TypeId to its dense slot in `sets`.
    registry: DashMap<TypeId, usize>,

    /// One component set per registered type, indexed by slot.
    sets: Vec<ComponentSet>,

    /// The set of live entity ids.
    entities: EntitySet,

    /// Next sequential entity id. Ids are never recycled, so a long-lived
    /// world that churns entities will eventually exhaust the capacity; the
    /// insert guard makes that loud rather than silent.
    next_id: u32,

    capacity: u32,
}

impl ComponentStorage {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTITIES)
    }

    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            registry: DashMap::new(),
            sets: Vec::new(),
            entities: EntitySet::new(capacity),
            next_id: 0,
            capacity,
        }
    }

    /// The fixed entity id capacity.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The set of live entity ids.
    #[inline]
    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    /// Whether the given entity is live.
    #[inline]
    pub fn is_live(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// The number of component types registered so far.
    pub fn type_count(&self) -> usize {
        self.sets.len()
    }

    /// Resolve a component type to its set, if the type has been registered.
    pub(crate) fn set_for(&self, type_id: TypeId) -> Option<&ComponentSet> {
        let slot = *self.registry.get(&type_id)?;
        self.sets.get(slot)
    }

    /// Register a component type if unseen and return its set slot.
    fn register(&mut self, type_id: TypeId, name: &'static str) -> usize {
        if let Some(slot) = self.registry.get(&type_id) {
            return *slot;
        }
        let slot = self.sets.len();
        self.sets.push(ComponentSet::new(name, self.capacity));
        self.registry.insert(type_id, slot);
        slot
    }

    /// Allocate the next sequential id, mark it live, and insert each bundled
    /// component value into its type's set.
    ///
    /// Supplying the same component type twice in one bundle is a logged
    /// error; the duplicate value is dropped and creation continues.
    pub(crate) fn create_entity(&mut self, bundle: impl Bundle) -> Entity {
        let entity = Entity::new(self.next_id);
        self.next_id += 1;

        if !self.entities.insert_id(entity) {
            error!(
                "entity capacity {} exhausted, {entity} was not created",
                self.capacity
            );
            return entity;
        }

        for (type_id, name, value) in bundle.into_parts() {
            let slot = self.register(type_id, name);
            if !self.sets[slot].insert(entity, value) {
                error!("duplicate component {name} in bundle for {entity}, value dropped");
            }
        }
        entity
    }

    /// Remove the entity from the live set and from every component set.
    /// The id is not recycled.
    pub(crate) fn delete_entity(&mut self, entity: Entity) {
        self.entities.remove(entity);
        for set in &mut self.sets {
            set.remove(entity);
        }
    }

    /// Add a component to an entity. Registers the type if unseen. Adding a
    /// type the entity already has is a logged no-op; use replace instead.
    pub(crate) fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> bool {
        let slot = self.register(TypeId::of::<C>(), type_name::<C>());
        let set = &mut self.sets[slot];
        if set.contains(entity) {
            error!("{entity} already has component {}, add skipped", set.name());
            return false;
        }
        if !set.insert(entity, Box::new(component)) {
            error!("{entity} is outside storage capacity, {} not added", set.name());
            return false;
        }
        true
    }

    /// Upsert a component value: behaves as add when the entity lacks the
    /// component, otherwise removes-then-reinserts the value.
    pub(crate) fn replace_component<C: Component>(&mut self, entity: Entity, component: C) -> bool {
        let slot = self.register(TypeId::of::<C>(), type_name::<C>());
        let set = &mut self.sets[slot];
        if !set.replace(entity, Box::new(component)) {
            error!(
                "{entity} is outside storage capacity, {} not replaced",
                set.name()
            );
            return false;
        }
        true
    }

    /// Remove an entity's component of type `C`. A no-op returning `false` if
    /// the type is unknown or the entity lacks it.
    pub(crate) fn remove_component<C: Component>(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.registry.get(&TypeId::of::<C>()).map(|s| *s) else {
            return false;
        };
        self.sets[slot].remove(entity)
    }

    /// Non-erroring component lookup.
    pub fn get_component<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.set_for(TypeId::of::<C>())?.get::<C>(entity)
    }

    /// Whether the entity currently has a component of type `C`.
    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        self.set_for(TypeId::of::<C>())
            .is_some_and(|set| set.contains(entity))
    }

    /// Get the component of a singleton-style type held by exactly one entity
    /// (e.g. a global grid). Cardinality other than one is a logged error
    /// returning `None`; this is a usage convention, not an enforced invariant.
    pub fn get_unique<C: Component>(&self) -> Option<&C> {
        let entity = self.unique_entity::<C>()?;
        self.get_component::<C>(entity)
    }

    /// The single entity holding a component of type `C`, with the same
    /// cardinality contract as [`get_unique`](Self::get_unique).
    pub fn unique_entity<C: Component>(&self) -> Option<Entity> {
        let Some(set) = self.set_for(TypeId::of::<C>()) else {
            error!("component {} not registered in storage", type_name::<C>());
            return None;
        };
        let Some(entity) = set.sole_entity() else {
            error!(
                "expected 1 entity with component {}, found {}",
                set.name(),
                set.len()
            );
            return None;
        };
        Some(entity)
    }
}

impl Default for ComponentStorage {
    fn default() -> Self {
        Self::new()
    }
}
