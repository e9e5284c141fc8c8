//! Per-level configuration for tier-upgradeable buildings.
//!
//! A building holds an ordered table of [`BuildingTierConfig`], index 0 being
//! tier 1. The config of the *current* tier carries the cost of reaching the
//! next one, so the last entry's upgrade costs are never read.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One item a player must hold (and will spend) for an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRequirement {
    pub item_name: String,
    pub quantity: u32,
}

impl ItemRequirement {
    pub fn new(item_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_name: item_name.into(),
            quantity,
        }
    }

    pub fn amount(&self) -> f32 {
        self.quantity as f32
    }
}

/// Parameters of a single building tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingTierConfig {
    /// 1-based; must match the entry's position in the table.
    pub tier_number: u32,
    pub display_name: String,
    /// Seconds between generations.
    pub generation_interval: f32,
    /// Cap on units generated, counted across the building's lifetime.
    pub max_units_at_tier: u32,
    /// Primary resource spent per normal unit.
    pub normal_generation_cost: f32,
    /// Secondary resource spent per legendary unit.
    pub legendary_generation_cost: f32,
    pub upgrade_cost_primary: f32,
    #[serde(default)]
    pub upgrade_cost_secondary: f32,
    #[serde(default)]
    pub upgrade_tool_requirements: Vec<ItemRequirement>,
    #[serde(default)]
    pub unlocks_profession_requirement: bool,
    #[serde(default)]
    pub unlocks_legendary_generation: bool,
}

impl BuildingTierConfig {
    pub fn new(tier_number: u32, display_name: impl Into<String>) -> Self {
        Self {
            tier_number,
            display_name: display_name.into(),
            generation_interval: 1.0,
            max_units_at_tier: 0,
            normal_generation_cost: 0.0,
            legendary_generation_cost: 0.0,
            upgrade_cost_primary: 0.0,
            upgrade_cost_secondary: 0.0,
            upgrade_tool_requirements: Vec::new(),
            unlocks_profession_requirement: false,
            unlocks_legendary_generation: false,
        }
    }

    pub fn with_generation(mut self, interval: f32, max_units: u32, normal_cost: f32) -> Self {
        self.generation_interval = interval;
        self.max_units_at_tier = max_units;
        self.normal_generation_cost = normal_cost;
        self
    }

    pub fn with_legendary_cost(mut self, cost: f32) -> Self {
        self.legendary_generation_cost = cost;
        self
    }

    pub fn with_upgrade_cost(mut self, primary: f32, secondary: f32) -> Self {
        self.upgrade_cost_primary = primary;
        self.upgrade_cost_secondary = secondary;
        self
    }

    pub fn with_tool(mut self, item_name: impl Into<String>, quantity: u32) -> Self {
        self.upgrade_tool_requirements
            .push(ItemRequirement::new(item_name, quantity));
        self
    }

    pub fn unlocking_profession(mut self) -> Self {
        self.unlocks_profession_requirement = true;
        self
    }

    pub fn unlocking_legendary(mut self) -> Self {
        self.unlocks_legendary_generation = true;
        self
    }
}

/// Why a tier table (or a restored tier index) cannot be used.
#[derive(Debug, Clone, PartialEq)]
pub enum TierConfigError {
    /// No tiers at all.
    Empty,
    /// `tier_number` does not match the entry's position.
    OutOfOrder { index: usize, tier_number: u32 },
    /// `generation_interval` must be strictly positive.
    InvalidInterval { tier_number: u32, interval: f32 },
    /// A restored tier index falls outside the table.
    TierOutOfBounds { tier: u32, tiers: usize },
    /// A cost or requirement names a resource the ledger does not know.
    UnknownResource(String),
    /// Secondary costs or a legendary unit without a secondary resource.
    MissingSecondaryResource,
}

impl fmt::Display for TierConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierConfigError::Empty => write!(f, "tier table is empty"),
            TierConfigError::OutOfOrder { index, tier_number } => write!(
                f,
                "tier at position {} has tier_number {} (expected {})",
                index,
                tier_number,
                index + 1
            ),
            TierConfigError::InvalidInterval {
                tier_number,
                interval,
            } => write!(
                f,
                "tier {} has non-positive generation interval {}",
                tier_number, interval
            ),
            TierConfigError::TierOutOfBounds { tier, tiers } => {
                write!(f, "tier {} is outside 1..={}", tier, tiers)
            }
            TierConfigError::UnknownResource(name) => {
                write!(f, "tier table references unknown resource '{}'", name)
            }
            TierConfigError::MissingSecondaryResource => write!(
                f,
                "secondary or legendary costs are set but no secondary resource is named"
            ),
        }
    }
}

impl std::error::Error for TierConfigError {}

/// Check the shape of a tier table.
pub fn validate_tiers(tiers: &[BuildingTierConfig]) -> Result<(), TierConfigError> {
    if tiers.is_empty() {
        return Err(TierConfigError::Empty);
    }
    for (index, tier) in tiers.iter().enumerate() {
        if tier.tier_number as usize != index + 1 {
            return Err(TierConfigError::OutOfOrder {
                index,
                tier_number: tier.tier_number,
            });
        }
        if !(tier.generation_interval > 0.0) {
            return Err(TierConfigError::InvalidInterval {
                tier_number: tier.tier_number,
                interval: tier.generation_interval,
            });
        }
    }
    Ok(())
}
