//! Building components: Building, Producer, House

use monolito_logic::production::TieredProductionBuilding;
use serde::{Deserialize, Serialize};

/// Marker for any placed structure, with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Villager-generating capability with tiered progression
#[derive(Debug, Clone)]
pub struct Producer {
    pub progression: TieredProductionBuilding,
}

impl Producer {
    pub fn new(progression: TieredProductionBuilding) -> Self {
        Self { progression }
    }
}

/// Shelter capability. Occupancy lives in the settlement's housing registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub capacity: u32,
}
