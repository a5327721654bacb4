//! A sparse-set entity component system runtime for grid puzzle games.
//!
//! Entities are bare ids, components are plain values stored in per-type
//! sparse sets, and matchers describe component-shape predicates whose
//! results are cached incrementally by groups. A [`ecs::World`] ties it all
//! together: it owns the storage, keeps every group consistent on each
//! mutation, and drives registered systems on a fixed-interval tick loop.
//!
//! ```no_run
//! use burrow_engine::ecs::{Matcher, Phases, System, SystemError, World};
//!
//! struct Position { x: i32, y: i32 }
//! struct Velocity { dx: i32, dy: i32 }
//!
//! struct MovementSystem;
//!
//! impl System for MovementSystem {
//!     fn name(&self) -> &str {
//!         "movement"
//!     }
//!
//!     fn phases(&self) -> Phases {
//!         Phases::Update
//!     }
//!
//!     fn update(&mut self, world: &mut World) -> Result<(), SystemError> {
//!         let moving = world
//!             .get_group(Matcher::all_of::<(Position, Velocity)>())
//!             .entities();
//!         for entity in moving {
//!             let (dx, dy) = {
//!                 let v = world.get_entity_component::<Velocity>(entity).unwrap();
//!                 (v.dx, v.dy)
//!             };
//!             let p = world.get_entity_component::<Position>(entity).unwrap();
//!             let next = Position { x: p.x + dx, y: p.y + dy };
//!             world.replace_component(entity, next);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut world = World::new();
//! world.add_system(MovementSystem);
//! world.create_entity((Position { x: 0, y: 0 }, Velocity { dx: 1, dy: 0 }));
//! world.simulate();
//! ```

pub mod core;
pub mod ecs;

pub use crate::core::{State, Time};
pub use crate::ecs::{Entity, Matcher, System, World};
