//! Generation - turning produced units into villagers in the world

mod names;
mod villagers;

pub use names::*;
pub use villagers::*;
