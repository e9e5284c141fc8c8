//! Component definitions for the settlement ECS.
//!
//! Components are pure data structs attached to entities. A building entity
//! is composed from a [`Building`] plus optional capabilities: a [`Producer`]
//! generates villagers, a [`House`] shelters them.

mod buildings;
mod common;
mod people;

pub use buildings::*;
pub use common::*;
pub use people::*;
