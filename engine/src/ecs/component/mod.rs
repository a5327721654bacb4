//! Component types and the bundles used to spawn entities with them.
//!
//! A component is any plain `'static` value type; there is nothing to derive or
//! implement. Types are registered with the storage lazily the first time a
//! value of that type is seen, and each registered type is assigned a stable
//! dense slot.

mod set;
mod storage;

use std::any::{Any, TypeId, type_name};

pub(crate) use set::ComponentSet;
pub use storage::{ComponentStorage, MAX_ENTITIES};

/// Marker trait for component types. Blanket-implemented for every plain value
/// type; `Send + Sync` is required because groups re-evaluate entities on
/// worker threads while reading the storage.
pub trait Component: Any + Send + Sync {}

impl<T: Any + Send + Sync> Component for T {}

/// A type-erased component value as held by the storage.
pub(crate) type BoxedComponent = Box<dyn Any + Send + Sync>;

/// A group of component values used to create an entity, typically a tuple:
/// `world.create_entity((Position { x: 0, y: 0 }, Pushable))`.
pub trait Bundle {
    /// Decompose into `(type tag, type name, boxed value)` triples.
    fn into_parts(self) -> Vec<(TypeId, &'static str, BoxedComponent)>;
}

/// A list of component types named by a matcher, typically a tuple:
/// `Matcher::all_of::<(Position, Pushable)>()`.
pub trait ComponentTypes {
    /// The type tags of every member, in declaration order.
    fn type_ids() -> Vec<TypeId>;
}

macro_rules! impl_component_tuple {
    ($($name:ident),*) => {
        impl<$($name: Component),*> Bundle for ($($name,)*) {
            #[allow(non_snake_case)]
            fn into_parts(self) -> Vec<(TypeId, &'static str, BoxedComponent)> {
                let ($($name,)*) = self;
                vec![$(
                    (TypeId::of::<$name>(), type_name::<$name>(), Box::new($name) as BoxedComponent),
                )*]
            }
        }

        impl<$($name: Component),*> ComponentTypes for ($($name,)*) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>(),)*]
            }
        }
    };
}

/// Apply a macro to every tuple prefix of the given type parameters.
macro_rules! for_every_tuple {
    ($m:ident !! $head:ident) => {
        $m!($head);
    };
    ($m:ident !! $head:ident, $($tail:ident),*) => {
        $m!($head, $($tail),*);
        for_every_tuple!($m !! $($tail),*);
    };
}

for_every_tuple!(impl_component_tuple !! A, B, C, D, E, F, G, H);

impl Bundle for () {
    fn into_parts(self) -> Vec<(TypeId, &'static str, BoxedComponent)> {
        Vec::new()
    }
}

impl ComponentTypes for () {
    fn type_ids() -> Vec<TypeId> {
        Vec::new()
    }
}
