//! Villager components

use monolito_logic::production::{GeneratedUnit, UnitVariant};
use serde::{Deserialize, Serialize};

/// A villager produced by a building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Villager {
    /// Unit type from the producing recipe ("Aldeano", "Profeta", ...)
    pub unit_type: String,
    pub variant: UnitVariant,
    /// Name of the building that generated this villager
    pub origin: String,
    /// Simulation time of generation, in seconds
    pub born_at: f64,
}

impl Villager {
    pub fn from_unit(unit: &GeneratedUnit, born_at: f64) -> Self {
        Self {
            unit_type: unit.unit_type.clone(),
            variant: unit.variant,
            origin: unit.building.clone(),
            born_at,
        }
    }

    pub fn is_legendary(&self) -> bool {
        self.variant == UnitVariant::Legendary
    }
}
