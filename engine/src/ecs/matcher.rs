//! Composable predicates over component membership.
//!
//! A [`Matcher`] selects the entities that satisfy an AND/OR/NOT composition
//! of component-set membership tests. The leaf forms name component types
//! directly; the combinator forms recurse into sub-matchers with identical
//! edge rules.
//!
//! Every matcher supports two evaluation modes that are required to agree:
//! [`matches`](Matcher::matches) evaluates against the whole live-entity
//! universe, while [`matches_entity`](Matcher::matches_entity) evaluates one
//! entity incrementally. For any entity `e`, `e` is in `matches(storage)`
//! exactly when `matches_entity(storage, e)` holds (restricted to live
//! entities; liveness is the group's concern).
//!
//! Edge rules, deliberate and mirrored between the leaf and combinator forms:
//! - all-of over an empty list matches nothing (not the full universe)
//! - any-of over an empty list matches nothing
//! - none-of over an empty list matches every live entity
//! - a component type no storage has registered behaves as an empty set
//!
//! `Matcher` is `Eq + Hash`, so the world can use it as the memoization key
//! for groups.

use std::any::TypeId;

use crate::ecs::component::{ComponentStorage, ComponentTypes};
use crate::ecs::entity::Entity;
use crate::ecs::sparse::EntitySet;

/// A predicate over component membership, composable via AND/OR/NOT.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// Entities present in every named component set.
    AllOfComponents(Vec<TypeId>),
    /// Entities present in at least one named component set.
    AnyOfComponents(Vec<TypeId>),
    /// Live entities present in none of the named component sets.
    NoneOfComponents(Vec<TypeId>),
    /// Entities matched by every sub-matcher.
    AllOf(Vec<Matcher>),
    /// Entities matched by at least one sub-matcher.
    AnyOf(Vec<Matcher>),
    /// Live entities matched by no sub-matcher.
    NoneOf(Vec<Matcher>),
}

impl Matcher {
    /// Entities holding every component in the type list `T`:
    /// `Matcher::all_of::<(Position, Velocity)>()`.
    pub fn all_of<T: ComponentTypes>() -> Self {
        Matcher::AllOfComponents(T::type_ids())
    }

    /// Entities holding any component in the type list `T`.
    pub fn any_of<T: ComponentTypes>() -> Self {
        Matcher::AnyOfComponents(T::type_ids())
    }

    /// Live entities holding no component in the type list `T`.
    pub fn none_of<T: ComponentTypes>() -> Self {
        Matcher::NoneOfComponents(T::type_ids())
    }

    /// Full evaluation: the set of live entities satisfying this matcher.
    pub fn matches(&self, storage: &ComponentStorage) -> EntitySet {
        let capacity = storage.capacity();
        match self {
            Matcher::AllOfComponents(types) => {
                let mut result: Option<EntitySet> = None;
                for type_id in types {
                    let Some(set) = storage.set_for(*type_id) else {
                        return EntitySet::new(capacity);
                    };
                    result = Some(match result {
                        None => set.ids(),
                        Some(acc) => acc.intersect_by_id(&set.ids()),
                    });
                }
                result.unwrap_or_else(|| EntitySet::new(capacity))
            }
            Matcher::AnyOfComponents(types) => {
                let mut result = EntitySet::new(capacity);
                for type_id in types {
                    if let Some(set) = storage.set_for(*type_id) {
                        result = result.union_by_id(&set.ids());
                    }
                }
                result
            }
            Matcher::NoneOfComponents(types) => {
                let mut result = storage.entities().ids();
                for type_id in types {
                    if let Some(set) = storage.set_for(*type_id) {
                        result = result.difference_by_id(&set.ids());
                    }
                }
                result
            }
            Matcher::AllOf(matchers) => {
                let mut result: Option<EntitySet> = None;
                for matcher in matchers {
                    let sub = matcher.matches(storage);
                    result = Some(match result {
                        None => sub,
                        Some(acc) => acc.intersect_by_id(&sub),
                    });
                }
                result.unwrap_or_else(|| EntitySet::new(capacity))
            }
            Matcher::AnyOf(matchers) => {
                let mut result = EntitySet::new(capacity);
                for matcher in matchers {
                    result = result.union_by_id(&matcher.matches(storage));
                }
                result
            }
            Matcher::NoneOf(matchers) => {
                let mut result = storage.entities().ids();
                for matcher in matchers {
                    result = result.difference_by_id(&matcher.matches(storage));
                }
                result
            }
        }
    }

    /// Incremental evaluation against a single entity, used when only that
    /// entity changed. Agrees with [`matches`](Self::matches) on every live
    /// entity; liveness itself is not checked here.
    pub fn matches_entity(&self, storage: &ComponentStorage, entity: Entity) -> bool {
        match self {
            Matcher::AllOfComponents(types) => {
                !types.is_empty()
                    && types.iter().all(|type_id| {
                        storage
                            .set_for(*type_id)
                            .is_some_and(|set| set.contains(entity))
                    })
            }
            Matcher::AnyOfComponents(types) => types.iter().any(|type_id| {
                storage
                    .set_for(*type_id)
                    .is_some_and(|set| set.contains(entity))
            }),
            Matcher::NoneOfComponents(types) => !types.iter().any(|type_id| {
                storage
                    .set_for(*type_id)
                    .is_some_and(|set| set.contains(entity))
            }),
            Matcher::AllOf(matchers) => {
                !matchers.is_empty()
                    && matchers
                        .iter()
                        .all(|matcher| matcher.matches_entity(storage, entity))
            }
            Matcher::AnyOf(matchers) => matchers
                .iter()
                .any(|matcher| matcher.matches_entity(storage, entity)),
            Matcher::NoneOf(matchers) => !matchers
                .iter()
                .any(|matcher| matcher.matches_entity(storage, entity)),
        }
    }
}
