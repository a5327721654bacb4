pub mod component;
pub mod entity;
pub mod group;
pub mod matcher;
pub mod sparse;
pub mod system;
pub mod world;

pub use component::{Bundle, Component, ComponentStorage, ComponentTypes, MAX_ENTITIES};
pub use entity::Entity;
pub use group::Group;
pub use matcher::Matcher;
pub use sparse::{EntitySet, SparseSet};
pub use system::{Phases, System, SystemError};
pub use world::{World, WorldConfig};
