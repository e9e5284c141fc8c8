//! Villager spawning for generated units

use hecs::{Entity, World};
use monolito_logic::production::{GeneratedUnit, UnitVariant};
use rand::Rng;

use super::names::{generate_epithet, generate_name};
use crate::components::Villager;

/// Spawn a villager entity for a unit a producer just generated.
///
/// Legendary units get an epithet on top of their generated name.
pub fn spawn_villager(
    world: &mut World,
    unit: &GeneratedUnit,
    born_at: f64,
    rng: &mut impl Rng,
) -> Entity {
    let mut name = generate_name(rng);
    if unit.variant == UnitVariant::Legendary {
        name = name.with_epithet(generate_epithet(rng));
    }
    log::info!(
        "{} joins the settlement as {} from {}",
        name.full_name(),
        unit.unit_type,
        unit.building
    );
    world.spawn((Villager::from_unit(unit, born_at), name))
}
