//! Object model
//!
//! Objects are `hecs` entities with a local transform, a name, an active flag
//! and a parent/children link. Their behavior comes from the extra components
//! attached to them (mesh, collider, physics body, particle emitter or a
//! user-defined [`Behavior`](crate::core::scene::Behavior)).

pub mod components;
pub mod hierarchy;
pub mod objects;

pub use components::{Active, Hierarchy, Name, ObjectId, Transform};
pub use objects::Objects;
