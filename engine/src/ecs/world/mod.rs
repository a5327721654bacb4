//! The world is the orchestrator owning storage, groups, and the tick loop.
//!
//! Every entity/component mutation goes through the world: it delegates the
//! mutation to the [`ComponentStorage`], then re-evaluates every live
//! [`Group`] against the touched entity before returning. Each group is
//! evaluated on its own scoped thread and the mutating call joins them all,
//! so callers get a strict ordering guarantee: once a mutation call returns,
//! every group's cached result and notification channels reflect it.
//!
//! Requesting a group for a matcher is memoized; asking twice with an equal
//! matcher returns the same group rather than creating a duplicate.
//!
//! # Lifecycle
//!
//! `Created -> Running (simulate) -> Closed (close)`. The tick loop runs
//! update-capable systems at a fixed interval until the shared stop handle is
//! set, observing cancellation between ticks. [`close()`](World::close) then
//! invokes each distinct system's release hook once. A system that wants to
//! shut the world down from inside a hook sets the stop handle rather than
//! calling `close` on itself.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::core::state::State;
use crate::core::time::{SIXTY_HZ, Time};
use crate::ecs::component::{Bundle, Component, ComponentStorage, MAX_ENTITIES};
use crate::ecs::entity::Entity;
use crate::ecs::group::{Group, NOTIFY_CAPACITY};
use crate::ecs::matcher::Matcher;
use crate::ecs::system::System;

/// Construction-time knobs for a world.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Fixed entity id capacity of the component storage.
    pub entity_capacity: u32,
    /// Interval between ticks of the simulation loop.
    pub timestep: Duration,
    /// Bound of each group notification channel.
    pub notify_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: MAX_ENTITIES,
            timestep: SIXTY_HZ,
            notify_capacity: NOTIFY_CAPACITY,
        }
    }
}

type SharedSystem = Arc<Mutex<dyn System>>;

/// The central orchestrator of the ECS: component storage, memoized groups,
/// registered systems, and the fixed-tick simulation loop.
pub struct World {
    config: WorldConfig,
    state: State,
    storage: ComponentStorage,

    /// Memoized groups keyed by matcher identity.
    groups: HashMap<Matcher, Group>,

    /// Every distinct system instance, in registration order. Used by close.
    systems: Vec<SharedSystem>,
    /// Initialize-capable systems, in registration order.
    initialize_list: Vec<SharedSystem>,
    /// Update-capable systems, in registration order.
    update_list: Vec<SharedSystem>,

    time: Time,

    /// Cooperative cancellation flag for the tick loop, observed between
    /// ticks. In-flight hooks are not preempted.
    stop: Arc<AtomicBool>,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            storage: ComponentStorage::with_capacity(config.entity_capacity),
            time: Time::new(config.timestep),
            config,
            state: State::Created,
            groups: HashMap::new(),
            systems: Vec::new(),
            initialize_list: Vec::new(),
            update_list: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Read access to the component storage. All mutation goes through the
    /// world's helper methods so group caches stay consistent.
    #[inline]
    pub fn storage(&self) -> &ComponentStorage {
        &self.storage
    }

    /// The simulation clock, advanced once per tick.
    #[inline]
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// A handle that stops the simulation loop when set. Cloneable into
    /// signal handlers, control threads, or systems.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Register a system, filing it under the phases it declares.
    pub fn add_system(&mut self, system: impl System) -> &mut Self {
        let phases = system.phases();
        let shared: SharedSystem = Arc::new(Mutex::new(system));
        if phases.initializes() {
            self.initialize_list.push(Arc::clone(&shared));
        }
        if phases.updates() {
            self.update_list.push(Arc::clone(&shared));
        }
        self.systems.push(shared);
        self
    }

    /// Allocate a new entity holding the bundled components, and bring every
    /// group up to date with it before returning.
    ///
    /// On a closed world this logs and returns an out-of-range id that no
    /// storage or group will ever contain.
    pub fn create_entity(&mut self, bundle: impl Bundle) -> Entity {
        if !self.guard_open("create_entity") {
            return Entity::new(self.storage.capacity());
        }
        let entity = self.storage.create_entity(bundle);
        self.refresh_groups(entity);
        entity
    }

    /// Delete an entity and its components, and bring every group up to date
    /// before returning. The id is not recycled.
    pub fn delete_entity(&mut self, entity: Entity) {
        if !self.guard_open("delete_entity") {
            return;
        }
        self.storage.delete_entity(entity);
        self.refresh_groups(entity);
    }

    /// Add a component to an entity. Adding a duplicate type is a logged
    /// no-op; use [`replace_component`](Self::replace_component) to overwrite.
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) {
        if !self.guard_open("add_component") {
            return;
        }
        if self.storage.add_component(entity, component) {
            self.refresh_groups(entity);
        }
    }

    /// Upsert a component value on an entity.
    pub fn replace_component<C: Component>(&mut self, entity: Entity, component: C) {
        if !self.guard_open("replace_component") {
            return;
        }
        if self.storage.replace_component(entity, component) {
            self.refresh_groups(entity);
        }
    }

    /// Remove an entity's component of type `C`; a no-op if absent.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) {
        if !self.guard_open("remove_component") {
            return;
        }
        if self.storage.remove_component::<C>(entity) {
            self.refresh_groups(entity);
        }
    }

    /// Non-erroring component lookup.
    pub fn get_entity_component<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.storage.get_component::<C>(entity)
    }

    /// Get the component of a singleton-style type held by exactly one
    /// entity. Wrong cardinality is a logged `None`.
    pub fn get_unique<C: Component>(&self) -> Option<&C> {
        self.storage.get_unique::<C>()
    }

    /// Replace the component of a singleton-style type on whichever single
    /// entity holds it. Wrong cardinality is a logged no-op.
    pub fn replace_unique<C: Component>(&mut self, component: C) {
        if !self.guard_open("replace_unique") {
            return;
        }
        let Some(entity) = self.storage.unique_entity::<C>() else {
            return;
        };
        self.replace_component(entity, component);
    }

    /// Get the group maintaining the given matcher, creating and eagerly
    /// evaluating it on first request. Equal matchers share one group.
    pub fn get_group(&mut self, matcher: Matcher) -> &Group {
        let storage = &self.storage;
        let notify_capacity = self.config.notify_capacity;
        self.groups
            .entry(matcher)
            .or_insert_with_key(|key| Group::new(key.clone(), storage, notify_capacity))
    }

    /// Run the simulation loop on the calling thread until the stop handle
    /// is set: initialize-capable systems once, then update-capable systems
    /// every tick at the configured interval, advancing the clock after each
    /// tick. Hook errors and panics are logged and isolated per system.
    pub fn simulate(&mut self) {
        if !self.state.can_transition(State::Running) {
            error!("cannot simulate a world in state {:?}", self.state);
            return;
        }
        self.state = State::Running;
        self.stop.store(false, Ordering::Relaxed);

        for system in self.initialize_list.clone() {
            self.run_hook(&system, Hook::Initialize);
        }

        self.time.reset_now();
        let timestep = self.time.timestep();
        let mut next_tick = Instant::now() + timestep;
        while !self.stop.load(Ordering::Relaxed) {
            for system in self.update_list.clone() {
                self.run_hook(&system, Hook::Update);
            }
            self.time.advance();

            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            }
            next_tick += timestep;
        }
        debug!("simulation stopped after {} ticks", self.time.ticks);
    }

    /// Stop the tick loop and invoke the release hook on every distinct
    /// system instance, each visited once even if filed under multiple
    /// phases. Idempotent; further mutation is invalid after close.
    pub fn close(&mut self) {
        if self.state == State::Closed {
            return;
        }
        self.stop.store(true, Ordering::Relaxed);
        self.state = State::Closed;

        for system in std::mem::take(&mut self.systems) {
            let outcome = catch_unwind(AssertUnwindSafe(|| match system.lock() {
                Ok(mut guard) => guard.close().map_err(|err| err.to_string()),
                Err(_) => Err("system mutex poisoned by an earlier panic".to_string()),
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(message)) => error!("system failed to close: {message}"),
                Err(_) => error!("system panicked during close"),
            }
        }
        self.initialize_list.clear();
        self.update_list.clear();
    }

    /// Whether mutation is currently legal; logs the refused operation.
    fn guard_open(&self, operation: &str) -> bool {
        if self.state == State::Closed {
            error!("{operation} on a closed world ignored");
            return false;
        }
        true
    }

    /// Fan out re-evaluation of one mutated entity to every group, one scoped
    /// thread per group, and join them all before returning.
    fn refresh_groups(&mut self, entity: Entity) {
        if self.groups.is_empty() {
            return;
        }
        let storage = &self.storage;
        thread::scope(|scope| {
            for group in self.groups.values_mut() {
                scope.spawn(move || group.evaluate(entity, storage));
            }
        });
    }

    /// Run one hook of one system inside an error boundary: a returned error
    /// or a panic is logged and contained.
    fn run_hook(&mut self, system: &SharedSystem, hook: Hook) {
        let outcome = catch_unwind(AssertUnwindSafe(|| match system.lock() {
            Ok(mut guard) => match hook {
                Hook::Initialize => guard.initialize(self).map_err(|err| err.to_string()),
                Hook::Update => guard.update(self).map_err(|err| err.to_string()),
            },
            Err(_) => Err("system mutex poisoned by an earlier panic".to_string()),
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(message)) => error!("system failed during {hook:?}: {message}"),
            Err(_) => error!("system panicked during {hook:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Initialize,
    Update,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::system::{Phases, SystemError};
    use std::sync::atomic::AtomicU32;

    struct A;
    struct B;
    struct C;

    fn fast_world() -> World {
        World::with_config(WorldConfig {
            timestep: Duration::from_millis(1),
            ..WorldConfig::default()
        })
    }

    fn sorted_ids(entities: Vec<Entity>) -> Vec<u32> {
        let mut ids: Vec<u32> = entities.iter().map(|e| e.id()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn groups_are_memoized_per_matcher() {
        let mut world = World::new();
        world.create_entity((A,));

        let first = world.get_group(Matcher::all_of::<(A,)>()) as *const Group;
        let second = world.get_group(Matcher::all_of::<(A,)>()) as *const Group;
        let other = world.get_group(Matcher::all_of::<(B,)>()) as *const Group;

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn scenario_component_matchers() {
        // Storage with entities {0: A, 1: B, 2: A+B, 3: C}
        let mut world = World::new();
        world.create_entity((A,));
        world.create_entity((B,));
        world.create_entity((A, B));
        world.create_entity((C,));

        let all = world.get_group(Matcher::all_of::<(A, B)>()).entities();
        assert_eq!(sorted_ids(all), vec![2]);

        let any = world.get_group(Matcher::any_of::<(A, B)>()).entities();
        assert_eq!(sorted_ids(any), vec![0, 1, 2]);

        let none = world.get_group(Matcher::none_of::<(A, B)>()).entities();
        assert_eq!(sorted_ids(none), vec![3]);

        let combined = world
            .get_group(Matcher::AllOf(vec![
                Matcher::all_of::<(A,)>(),
                Matcher::none_of::<(B,)>(),
            ]))
            .entities();
        assert_eq!(sorted_ids(combined), vec![0]);
    }

    #[test]
    fn mutation_updates_groups_before_returning() {
        let mut world = World::new();
        let added = world.get_group(Matcher::all_of::<(A, B)>()).added();
        let removed = world.get_group(Matcher::all_of::<(A, B)>()).removed();

        let entity = world.create_entity((A,));
        assert!(!world.get_group(Matcher::all_of::<(A, B)>()).contains(entity));

        world.add_component(entity, B);
        // The call has returned, so cache and channel already reflect it
        assert!(world.get_group(Matcher::all_of::<(A, B)>()).contains(entity));
        assert_eq!(added.try_recv(), Ok(entity));

        world.remove_component::<A>(entity);
        assert!(!world.get_group(Matcher::all_of::<(A, B)>()).contains(entity));
        assert_eq!(removed.try_recv(), Ok(entity));
    }

    #[test]
    fn delete_and_recreate_never_reuses_ids() {
        let mut world = World::new();
        let group_matcher = Matcher::all_of::<(A,)>();
        world.get_group(group_matcher.clone());

        let entity = world.create_entity((A,));
        world.delete_entity(entity);

        assert!(!world.storage().is_live(entity));
        assert!(world.get_entity_component::<A>(entity).is_none());
        assert!(!world.get_group(group_matcher).contains(entity));

        let next = world.create_entity((A,));
        assert_ne!(next, entity);
        assert!(next.id() > entity.id());
    }

    #[test]
    fn group_cache_equals_fresh_match_after_churn() {
        let mut world = World::new();
        let matcher = Matcher::AnyOf(vec![Matcher::all_of::<(A,)>(), Matcher::all_of::<(B, C)>()]);
        world.get_group(matcher.clone());

        let e0 = world.create_entity((A,));
        let e1 = world.create_entity((B,));
        world.add_component(e1, C);
        let e2 = world.create_entity((A, B, C));
        world.remove_component::<A>(e0);
        world.delete_entity(e2);
        world.replace_component(e1, B);

        let cached = sorted_ids(world.get_group(matcher.clone()).entities());
        let fresh = sorted_ids(
            matcher
                .matches(world.storage())
                .iter()
                .map(|(id, _)| id)
                .collect(),
        );
        assert_eq!(cached, fresh);
    }

    #[test]
    fn unique_component_replace_routes_through_groups() {
        struct Score(u32);

        let mut world = World::new();
        world.get_group(Matcher::all_of::<(Score,)>());
        world.create_entity((Score(1),));

        world.replace_unique(Score(7));

        assert_eq!(world.get_unique::<Score>().map(|s| s.0), Some(7));
        assert_eq!(world.get_group(Matcher::all_of::<(Score,)>()).len(), 1);
    }

    // ==================== Systems & lifecycle ====================

    struct CountingSystem {
        updates: Arc<AtomicU32>,
        initialized: Arc<AtomicBool>,
        stop_after: u32,
        stop: Arc<AtomicBool>,
    }

    impl System for CountingSystem {
        fn name(&self) -> &str {
            "counting"
        }

        fn phases(&self) -> Phases {
            Phases::InitializeUpdate
        }

        fn initialize(&mut self, _world: &mut World) -> Result<(), SystemError> {
            self.initialized.store(true, Ordering::Relaxed);
            Ok(())
        }

        fn update(&mut self, _world: &mut World) -> Result<(), SystemError> {
            let done = self.updates.fetch_add(1, Ordering::Relaxed) + 1;
            if done >= self.stop_after {
                self.stop.store(true, Ordering::Relaxed);
            }
            Ok(())
        }
    }

    struct FaultySystem;

    impl System for FaultySystem {
        fn phases(&self) -> Phases {
            Phases::Update
        }

        fn update(&mut self, _world: &mut World) -> Result<(), SystemError> {
            panic!("faulty system blew up");
        }
    }

    struct ClosingSystem {
        closes: Arc<AtomicU32>,
    }

    impl System for ClosingSystem {
        fn phases(&self) -> Phases {
            Phases::InitializeUpdate
        }

        fn close(&mut self) -> Result<(), SystemError> {
            self.closes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    #[test]
    fn simulate_runs_phases_until_stopped() {
        let updates = Arc::new(AtomicU32::new(0));
        let initialized = Arc::new(AtomicBool::new(false));

        let mut world = fast_world();
        world.add_system(CountingSystem {
            updates: Arc::clone(&updates),
            initialized: Arc::clone(&initialized),
            stop_after: 3,
            stop: world.stop_handle(),
        });

        world.simulate();

        assert!(initialized.load(Ordering::Relaxed));
        assert_eq!(updates.load(Ordering::Relaxed), 3);
        assert_eq!(world.state(), State::Running);
        assert!(world.time().ticks >= 3);
    }

    #[test]
    fn panicking_system_does_not_stall_the_loop() {
        let updates = Arc::new(AtomicU32::new(0));
        let initialized = Arc::new(AtomicBool::new(false));

        let mut world = fast_world();
        // The faulty system runs first every tick and panics every time
        world.add_system(FaultySystem);
        world.add_system(CountingSystem {
            updates: Arc::clone(&updates),
            initialized: Arc::clone(&initialized),
            stop_after: 2,
            stop: world.stop_handle(),
        });

        world.simulate();

        // The counting system still ran to completion
        assert_eq!(updates.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn close_visits_each_distinct_system_once() {
        let closes = Arc::new(AtomicU32::new(0));

        let mut world = World::new();
        // Filed under both phase lists, but one instance
        world.add_system(ClosingSystem {
            closes: Arc::clone(&closes),
        });

        world.close();
        assert_eq!(closes.load(Ordering::Relaxed), 1);
        assert_eq!(world.state(), State::Closed);

        // Idempotent
        world.close();
        assert_eq!(closes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn mutation_after_close_is_ignored() {
        let mut world = World::new();
        let live_before = world.create_entity((A,));
        world.close();

        let dead = world.create_entity((B,));
        assert!(!world.storage().is_live(dead));
        assert_eq!(dead.id(), world.storage().capacity());

        world.add_component(live_before, B);
        assert!(world.get_entity_component::<B>(live_before).is_none());

        world.delete_entity(live_before);
        assert!(world.storage().is_live(live_before));
    }

    #[test]
    fn world_moves_to_a_dedicated_thread() {
        let updates = Arc::new(AtomicU32::new(0));
        let mut world = fast_world();
        world.add_system(CountingSystem {
            updates: Arc::clone(&updates),
            initialized: Arc::new(AtomicBool::new(false)),
            stop_after: 2,
            stop: world.stop_handle(),
        });

        let handle = thread::spawn(move || {
            world.simulate();
            world.close();
            world.state()
        });

        assert_eq!(handle.join().unwrap(), State::Closed);
        assert_eq!(updates.load(Ordering::Relaxed), 2);
    }
}
