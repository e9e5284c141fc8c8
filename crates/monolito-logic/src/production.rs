//! Tiered production buildings: the villager-generating state machine.
//!
//! A [`TieredProductionBuilding`] walks through the tiers of its
//! [`BuildingBlueprint`] (tier 1 → tier N, N terminal). At each tier it can
//! generate units on a cooldown, up to a cap, paying in ledger resources.
//!
//! # Generation
//!
//! | Step | Check | Decline |
//! |------|-------|---------|
//! | 1 | cooldown elapsed | [`GenerationDeclined::CoolingDown`] |
//! | 2 | below unit cap | [`GenerationDeclined::UnitCapReached`] |
//! | 3 | profession items held (once unlocked) | [`GenerationDeclined::MissingProfessionItems`] |
//! | 4 | legendary cost in secondary, else normal cost in primary | [`GenerationDeclined::InsufficientResource`] |
//!
//! A legendary request that cannot be honored falls back to a normal unit.
//! Nothing is spent until every check has passed; profession items are paid
//! before the generation cost.
//!
//! # Upgrades
//!
//! The current tier's config holds the price of the next tier: primary and
//! secondary resources plus a list of tools. Reaching a tier ORs its unlock
//! flags into the building; unlocks are sticky.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ledger::ResourceLedger;
use crate::tiers::{validate_tiers, BuildingTierConfig, ItemRequirement, TierConfigError};

/// What a building consumes and produces, independent of tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecipe {
    /// Paid for normal units and the primary upgrade cost.
    pub primary_resource: String,
    /// Paid for legendary units and the secondary upgrade cost.
    #[serde(default)]
    pub secondary_resource: String,
    pub normal_unit: String,
    #[serde(default)]
    pub legendary_unit: Option<String>,
    /// Items spent per unit once the profession requirement is unlocked.
    #[serde(default)]
    pub profession_requirements: Vec<ItemRequirement>,
}

/// A named building type with its tier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingBlueprint {
    pub name: String,
    pub recipe: ProductionRecipe,
    pub tiers: Vec<BuildingTierConfig>,
}

impl BuildingBlueprint {
    pub fn validate(&self) -> Result<(), TierConfigError> {
        validate_tiers(&self.tiers)
    }

    /// Every resource or item name this blueprint can touch.
    pub fn referenced_resources(&self) -> Vec<&str> {
        let mut names = vec![self.recipe.primary_resource.as_str()];
        if !self.recipe.secondary_resource.is_empty() {
            names.push(&self.recipe.secondary_resource);
        }
        names.extend(
            self.recipe
                .profession_requirements
                .iter()
                .map(|r| r.item_name.as_str()),
        );
        for tier in &self.tiers {
            names.extend(
                tier.upgrade_tool_requirements
                    .iter()
                    .map(|r| r.item_name.as_str()),
            );
        }
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Whether any legendary unit or tier cost draws on the secondary resource.
    fn uses_secondary(&self) -> bool {
        self.recipe.legendary_unit.is_some()
            || self
                .tiers
                .iter()
                .any(|t| t.upgrade_cost_secondary > 0.0 || t.legendary_generation_cost > 0.0)
    }

    /// Shape check plus every referenced name must exist in `ledger`.
    pub fn validate_against(&self, ledger: &ResourceLedger) -> Result<(), TierConfigError> {
        self.validate()?;
        if self.recipe.secondary_resource.is_empty() && self.uses_secondary() {
            return Err(TierConfigError::MissingSecondaryResource);
        }
        match self
            .referenced_resources()
            .into_iter()
            .find(|name| !ledger.contains(name))
        {
            Some(missing) => Err(TierConfigError::UnknownResource(missing.to_string())),
            None => Ok(()),
        }
    }
}

/// Which kind of unit a generation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitVariant {
    Normal,
    Legendary,
}

/// Notification sent to the spawn collaborator after a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedUnit {
    pub building: String,
    pub unit_type: String,
    pub variant: UnitVariant,
    pub tier: u32,
}

/// External collaborator that turns a generated unit into something in the world.
pub trait UnitSpawner {
    fn spawn_unit(&mut self, unit: &GeneratedUnit);
}

/// Queue spawns for the caller to drain later.
impl UnitSpawner for Vec<GeneratedUnit> {
    fn spawn_unit(&mut self, unit: &GeneratedUnit) {
        self.push(unit.clone());
    }
}

/// How far short a check fell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub resource: String,
    pub required: f32,
    pub available: f32,
}

impl Shortfall {
    fn check(ledger: &ResourceLedger, resource: &str, required: f32) -> Option<Shortfall> {
        if ledger.has_at_least(resource, required) {
            None
        } else {
            Some(Shortfall {
                resource: resource.to_string(),
                required,
                available: ledger.quantity(resource),
            })
        }
    }
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (need {}, have {})",
            self.resource, self.required, self.available
        )
    }
}

fn join(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a generation attempt did nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationDeclined {
    /// The building has invalid tier data and refuses to act.
    Disabled,
    CoolingDown { remaining: f32 },
    UnitCapReached { max_units: u32 },
    MissingProfessionItems(Vec<Shortfall>),
    InsufficientResource(Shortfall),
}

impl fmt::Display for GenerationDeclined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationDeclined::Disabled => write!(f, "building is disabled"),
            GenerationDeclined::CoolingDown { remaining } => {
                write!(f, "cooling down ({:.1}s left)", remaining)
            }
            GenerationDeclined::UnitCapReached { max_units } => {
                write!(f, "unit cap of {} reached", max_units)
            }
            GenerationDeclined::MissingProfessionItems(missing) => {
                write!(f, "missing profession items: {}", join(missing))
            }
            GenerationDeclined::InsufficientResource(s) => write!(f, "insufficient {}", s),
        }
    }
}

/// Why an upgrade attempt did nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradeDeclined {
    Disabled,
    MaxTierReached,
    /// Primary or secondary cost not covered. Tool shortfalls are listed too.
    InsufficientResources {
        resources: Vec<Shortfall>,
        tools: Vec<Shortfall>,
    },
    /// Costs covered, tools missing.
    InsufficientTools(Vec<Shortfall>),
}

impl fmt::Display for UpgradeDeclined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeDeclined::Disabled => write!(f, "building is disabled"),
            UpgradeDeclined::MaxTierReached => write!(f, "already at max tier"),
            UpgradeDeclined::InsufficientResources { resources, tools } if tools.is_empty() => {
                write!(f, "insufficient {}", join(resources))
            }
            UpgradeDeclined::InsufficientResources { resources, tools } => write!(
                f,
                "insufficient {}; missing tools {}",
                join(resources),
                join(tools)
            ),
            UpgradeDeclined::InsufficientTools(tools) => {
                write!(f, "missing tools {}", join(tools))
            }
        }
    }
}

/// Serializable runtime state of a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub current_tier: u32,
    pub units_generated: u32,
    pub time_since_last_generation: f32,
    pub profession_requirement_unlocked: bool,
    pub legendary_generation_unlocked: bool,
    pub wants_legendary: bool,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            current_tier: 1,
            units_generated: 0,
            time_since_last_generation: 0.0,
            profession_requirement_unlocked: false,
            legendary_generation_unlocked: false,
            wants_legendary: false,
        }
    }
}

/// Cached enabled/disabled state for the generate and upgrade buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactable {
    pub generate: bool,
    pub upgrade: bool,
}

struct GenerationPlan {
    variant: UnitVariant,
    unit_type: String,
    cost_resource: String,
    cost: f32,
    profession_items: Vec<ItemRequirement>,
}

/// Runtime state machine over a blueprint's tiers.
#[derive(Debug, Clone)]
pub struct TieredProductionBuilding {
    blueprint: Arc<BuildingBlueprint>,
    state: ProgressionState,
    interactable: Interactable,
    disabled: bool,
}

impl TieredProductionBuilding {
    /// A fresh building at tier 1.
    pub fn new(blueprint: Arc<BuildingBlueprint>) -> Result<Self, TierConfigError> {
        Self::restore(blueprint, ProgressionState::default())
    }

    /// Rebuild a building from saved state.
    ///
    /// An invalid blueprint is an error. A saved tier outside the table
    /// yields a *disabled* building that declines every action.
    pub fn restore(
        blueprint: Arc<BuildingBlueprint>,
        mut state: ProgressionState,
    ) -> Result<Self, TierConfigError> {
        if let Err(e) = blueprint.validate() {
            log::error!("Blueprint '{}' rejected: {}", blueprint.name, e);
            return Err(e);
        }
        let elapsed = state.time_since_last_generation;
        if !elapsed.is_finite() || elapsed < 0.0 {
            log::warn!(
                "Blueprint '{}': saved cooldown {} reset to 0",
                blueprint.name,
                elapsed
            );
            state.time_since_last_generation = 0.0;
        }
        let mut building = Self {
            blueprint,
            state,
            interactable: Interactable::default(),
            disabled: false,
        };
        let tiers = building.blueprint.tiers.len();
        let tier = building.state.current_tier;
        if tier == 0 || tier as usize > tiers {
            log::error!(
                "Building '{}' disabled: {}",
                building.blueprint.name,
                TierConfigError::TierOutOfBounds { tier, tiers }
            );
            building.disabled = true;
            return Ok(building);
        }
        // Reaching a tier (including by restore) grants every unlock up to it
        let blueprint = Arc::clone(&building.blueprint);
        for cfg in &blueprint.tiers[..tier as usize] {
            building.apply_unlocks(cfg);
        }
        Ok(building)
    }

    pub fn name(&self) -> &str {
        &self.blueprint.name
    }

    pub fn blueprint(&self) -> &Arc<BuildingBlueprint> {
        &self.blueprint
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn current_tier(&self) -> u32 {
        self.state.current_tier
    }

    pub fn tier_count(&self) -> u32 {
        self.blueprint.tiers.len() as u32
    }

    pub fn is_max_tier(&self) -> bool {
        self.state.current_tier as usize >= self.blueprint.tiers.len()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Config of the current tier, `None` when disabled.
    pub fn current_config(&self) -> Option<&BuildingTierConfig> {
        if self.disabled {
            return None;
        }
        let index = (self.state.current_tier as usize).checked_sub(1)?;
        self.blueprint.tiers.get(index)
    }

    pub fn units_generated(&self) -> u32 {
        self.state.units_generated
    }

    pub fn time_since_last_generation(&self) -> f32 {
        self.state.time_since_last_generation
    }

    pub fn profession_requirement_unlocked(&self) -> bool {
        self.state.profession_requirement_unlocked
    }

    pub fn legendary_generation_unlocked(&self) -> bool {
        self.state.legendary_generation_unlocked
    }

    pub fn wants_legendary(&self) -> bool {
        self.state.wants_legendary
    }

    pub fn set_wants_legendary(&mut self, wants: bool) {
        self.state.wants_legendary = wants;
    }

    /// Seconds until the cooldown allows another generation.
    pub fn cooldown_remaining(&self) -> f32 {
        self.current_config()
            .map(|cfg| (cfg.generation_interval - self.state.time_since_last_generation).max(0.0))
            .unwrap_or(0.0)
    }

    /// Advance the cooldown timer. Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, delta_seconds: f32) {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.state.time_since_last_generation += delta_seconds;
        }
    }

    /// Button state as of the last successful action or refresh.
    pub fn interactable(&self) -> Interactable {
        self.interactable
    }

    pub fn refresh_interactable(&mut self, ledger: &ResourceLedger) {
        self.interactable = Interactable {
            generate: self.can_generate_now(ledger),
            upgrade: self.can_upgrade_now(ledger),
        };
    }

    /// Whether `try_generate` would succeed with the stored legendary preference.
    pub fn can_generate_now(&self, ledger: &ResourceLedger) -> bool {
        self.plan_generation(ledger, self.state.wants_legendary)
            .is_ok()
    }

    pub fn can_upgrade_now(&self, ledger: &ResourceLedger) -> bool {
        self.check_upgrade(ledger).is_ok()
    }

    /// Attempt to generate one unit.
    ///
    /// On success the unit is handed to `spawner` and returned.
    pub fn try_generate(
        &mut self,
        ledger: &mut ResourceLedger,
        spawner: &mut impl UnitSpawner,
        wants_legendary: bool,
    ) -> Result<GeneratedUnit, GenerationDeclined> {
        let plan = match self.plan_generation(ledger, wants_legendary) {
            Ok(plan) => plan,
            Err(reason) => {
                log::info!("{} declined generation: {}", self.blueprint.name, reason);
                return Err(reason);
            }
        };

        for item in &plan.profession_items {
            if item.quantity > 0 {
                debit(ledger, &item.item_name, item.amount());
            }
        }
        debit(ledger, &plan.cost_resource, plan.cost);

        self.state.units_generated += 1;
        self.state.time_since_last_generation = 0.0;
        self.state.wants_legendary = wants_legendary;

        let unit = GeneratedUnit {
            building: self.blueprint.name.clone(),
            unit_type: plan.unit_type,
            variant: plan.variant,
            tier: self.state.current_tier,
        };
        log::info!(
            "{} generated {:?} unit '{}' ({} so far)",
            unit.building,
            unit.variant,
            unit.unit_type,
            self.state.units_generated
        );
        spawner.spawn_unit(&unit);
        self.refresh_interactable(ledger);
        Ok(unit)
    }

    /// Attempt to advance one tier. Returns the new tier.
    pub fn try_upgrade(&mut self, ledger: &mut ResourceLedger) -> Result<u32, UpgradeDeclined> {
        if let Err(reason) = self.check_upgrade(ledger) {
            log::info!("{} declined upgrade: {}", self.blueprint.name, reason);
            return Err(reason);
        }
        let blueprint = Arc::clone(&self.blueprint);
        let recipe = &blueprint.recipe;
        let cfg = &blueprint.tiers[self.state.current_tier as usize - 1];

        debit(ledger, &recipe.primary_resource, cfg.upgrade_cost_primary);
        if cfg.upgrade_cost_secondary > 0.0 {
            debit(ledger, &recipe.secondary_resource, cfg.upgrade_cost_secondary);
        }
        for tool in &cfg.upgrade_tool_requirements {
            if tool.quantity > 0 {
                debit(ledger, &tool.item_name, tool.amount());
            }
        }

        self.state.current_tier += 1;
        let next = &blueprint.tiers[self.state.current_tier as usize - 1];
        self.apply_unlocks(next);
        // Allows an immediate generation at the new tier
        self.state.time_since_last_generation = next.generation_interval;
        log::info!(
            "{} upgraded to tier {} ({})",
            blueprint.name,
            next.tier_number,
            next.display_name
        );
        self.refresh_interactable(ledger);
        Ok(self.state.current_tier)
    }

    /// Run every upgrade precondition without spending.
    pub fn check_upgrade(&self, ledger: &ResourceLedger) -> Result<(), UpgradeDeclined> {
        let cfg = self.current_config().ok_or(UpgradeDeclined::Disabled)?;
        if self.is_max_tier() {
            return Err(UpgradeDeclined::MaxTierReached);
        }
        let recipe = &self.blueprint.recipe;

        let mut resources = Vec::new();
        resources.extend(Shortfall::check(
            ledger,
            &recipe.primary_resource,
            cfg.upgrade_cost_primary,
        ));
        if cfg.upgrade_cost_secondary > 0.0 {
            resources.extend(Shortfall::check(
                ledger,
                &recipe.secondary_resource,
                cfg.upgrade_cost_secondary,
            ));
        }
        let tools: Vec<Shortfall> = cfg
            .upgrade_tool_requirements
            .iter()
            .filter(|t| t.quantity > 0)
            .filter_map(|t| Shortfall::check(ledger, &t.item_name, t.amount()))
            .collect();

        if !resources.is_empty() {
            Err(UpgradeDeclined::InsufficientResources { resources, tools })
        } else if !tools.is_empty() {
            Err(UpgradeDeclined::InsufficientTools(tools))
        } else {
            Ok(())
        }
    }

    fn plan_generation(
        &self,
        ledger: &ResourceLedger,
        wants_legendary: bool,
    ) -> Result<GenerationPlan, GenerationDeclined> {
        let cfg = self.current_config().ok_or(GenerationDeclined::Disabled)?;
        if self.state.time_since_last_generation < cfg.generation_interval {
            return Err(GenerationDeclined::CoolingDown {
                remaining: cfg.generation_interval - self.state.time_since_last_generation,
            });
        }
        if self.state.units_generated >= cfg.max_units_at_tier {
            return Err(GenerationDeclined::UnitCapReached {
                max_units: cfg.max_units_at_tier,
            });
        }

        let recipe = &self.blueprint.recipe;
        let profession_items = if self.state.profession_requirement_unlocked {
            let missing: Vec<Shortfall> = recipe
                .profession_requirements
                .iter()
                .filter_map(|r| Shortfall::check(ledger, &r.item_name, r.amount()))
                .collect();
            if !missing.is_empty() {
                return Err(GenerationDeclined::MissingProfessionItems(missing));
            }
            recipe.profession_requirements.clone()
        } else {
            Vec::new()
        };

        if wants_legendary && self.state.legendary_generation_unlocked {
            if let Some(unit) = &recipe.legendary_unit {
                if ledger.has_at_least(&recipe.secondary_resource, cfg.legendary_generation_cost) {
                    return Ok(GenerationPlan {
                        variant: UnitVariant::Legendary,
                        unit_type: unit.clone(),
                        cost_resource: recipe.secondary_resource.clone(),
                        cost: cfg.legendary_generation_cost,
                        profession_items,
                    });
                }
            }
            log::debug!(
                "{} cannot honor legendary request, trying a normal unit",
                self.blueprint.name
            );
        }

        if let Some(short) =
            Shortfall::check(ledger, &recipe.primary_resource, cfg.normal_generation_cost)
        {
            return Err(GenerationDeclined::InsufficientResource(short));
        }
        Ok(GenerationPlan {
            variant: UnitVariant::Normal,
            unit_type: recipe.normal_unit.clone(),
            cost_resource: recipe.primary_resource.clone(),
            cost: cfg.normal_generation_cost,
            profession_items,
        })
    }

    fn apply_unlocks(&mut self, cfg: &BuildingTierConfig) {
        self.state.profession_requirement_unlocked |= cfg.unlocks_profession_requirement;
        self.state.legendary_generation_unlocked |= cfg.unlocks_legendary_generation;
    }
}

/// Spend an amount whose availability was already verified.
fn debit(ledger: &mut ResourceLedger, resource: &str, amount: f32) {
    match ledger.spend(resource, amount) {
        Ok(true) => {}
        Ok(false) => log::error!(
            "Spend of {} '{}' came up short after passing its check",
            amount,
            resource
        ),
        Err(e) => log::error!("Spend of {} failed: {}", amount, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceDefinition;

    fn ledger_with(stock: &[(&str, f32)]) -> ResourceLedger {
        let defs = ["Fe", "Oro", "Martillo", "Libro"]
            .iter()
            .map(|n| ResourceDefinition::new(*n, 1000.0))
            .collect();
        let mut ledger = ResourceLedger::new(defs).unwrap();
        for (name, amount) in stock {
            ledger.add(name, *amount).unwrap();
        }
        ledger
    }

    fn blueprint() -> Arc<BuildingBlueprint> {
        Arc::new(BuildingBlueprint {
            name: "Altar del Monolito".into(),
            recipe: ProductionRecipe {
                primary_resource: "Fe".into(),
                secondary_resource: "Oro".into(),
                normal_unit: "Aldeano".into(),
                legendary_unit: Some("Profeta".into()),
                profession_requirements: vec![ItemRequirement::new("Libro", 1)],
            },
            tiers: vec![
                BuildingTierConfig::new(1, "Choza")
                    .with_generation(5.0, 2, 10.0)
                    .with_upgrade_cost(20.0, 0.0)
                    .with_tool("Martillo", 2),
                BuildingTierConfig::new(2, "Santuario")
                    .with_generation(4.0, 4, 10.0)
                    .with_legendary_cost(30.0)
                    .with_upgrade_cost(40.0, 15.0)
                    .unlocking_legendary(),
                BuildingTierConfig::new(3, "Templo")
                    .with_generation(3.0, 8, 10.0)
                    .with_legendary_cost(25.0)
                    .unlocking_profession(),
            ],
        })
    }

    fn building() -> TieredProductionBuilding {
        TieredProductionBuilding::new(blueprint()).unwrap()
    }

    fn at_tier(tier: u32) -> TieredProductionBuilding {
        let state = ProgressionState {
            current_tier: tier,
            ..ProgressionState::default()
        };
        TieredProductionBuilding::restore(blueprint(), state).unwrap()
    }

    // ── Construction ───────────────────────────────────────────────────

    #[test]
    fn test_starts_at_tier_one() {
        let b = building();
        assert_eq!(b.current_tier(), 1);
        assert_eq!(b.units_generated(), 0);
        assert_eq!(b.time_since_last_generation(), 0.0);
        assert!(!b.legendary_generation_unlocked());
        assert!(!b.is_disabled());
    }

    #[test]
    fn test_empty_blueprint_rejected() {
        let mut bp = (*blueprint()).clone();
        bp.tiers.clear();
        assert_eq!(
            TieredProductionBuilding::new(Arc::new(bp)).unwrap_err(),
            TierConfigError::Empty
        );
    }

    #[test]
    fn test_restore_out_of_bounds_disables() {
        let mut b = at_tier(7);
        assert!(b.is_disabled());
        assert!(b.current_config().is_none());
        let mut ledger = ledger_with(&[("Fe", 500.0), ("Martillo", 10.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(100.0);
        assert_eq!(
            b.try_generate(&mut ledger, &mut spawned, false),
            Err(GenerationDeclined::Disabled)
        );
        assert_eq!(b.try_upgrade(&mut ledger), Err(UpgradeDeclined::Disabled));
        assert_eq!(ledger.quantity("Fe"), 500.0);
        assert!(spawned.is_empty());
    }

    #[test]
    fn test_restore_resets_bad_cooldown() {
        for elapsed in [f32::NAN, -3.0, f32::INFINITY] {
            let state = ProgressionState {
                time_since_last_generation: elapsed,
                ..ProgressionState::default()
            };
            let mut b = TieredProductionBuilding::restore(blueprint(), state).unwrap();
            assert_eq!(b.time_since_last_generation(), 0.0);
            let mut ledger = ledger_with(&[("Fe", 100.0)]);
            let mut spawned: Vec<GeneratedUnit> = Vec::new();
            assert!(matches!(
                b.try_generate(&mut ledger, &mut spawned, false),
                Err(GenerationDeclined::CoolingDown { .. })
            ));
        }
    }

    #[test]
    fn test_declined_generation_keeps_legendary_toggle() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 100.0), ("Oro", 100.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        assert!(b.try_generate(&mut ledger, &mut spawned, true).is_err());
        assert!(!b.wants_legendary());
        b.advance(5.0);
        b.try_generate(&mut ledger, &mut spawned, true).unwrap();
        assert!(b.wants_legendary());
    }

    #[test]
    fn test_restore_zero_tier_disables() {
        assert!(at_tier(0).is_disabled());
    }

    #[test]
    fn test_validate_against_unknown_resource() {
        let ledger = ResourceLedger::new(vec![ResourceDefinition::new("Fe", 10.0)]).unwrap();
        assert!(matches!(
            blueprint().validate_against(&ledger),
            Err(TierConfigError::UnknownResource(_))
        ));
        let full = ledger_with(&[]);
        assert!(blueprint().validate_against(&full).is_ok());
    }

    // ── Generation ─────────────────────────────────────────────────────

    #[test]
    fn test_generation_cooldown_and_cap() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 25.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();

        b.advance(5.0);
        let unit = b.try_generate(&mut ledger, &mut spawned, false).unwrap();
        assert_eq!(unit.unit_type, "Aldeano");
        assert_eq!(ledger.quantity("Fe"), 15.0);
        assert_eq!(b.units_generated(), 1);

        assert!(matches!(
            b.try_generate(&mut ledger, &mut spawned, false),
            Err(GenerationDeclined::CoolingDown { .. })
        ));

        b.advance(5.0);
        b.try_generate(&mut ledger, &mut spawned, false).unwrap();
        assert_eq!(ledger.quantity("Fe"), 5.0);
        assert_eq!(b.units_generated(), 2);

        b.advance(5.0);
        assert_eq!(
            b.try_generate(&mut ledger, &mut spawned, false),
            Err(GenerationDeclined::UnitCapReached { max_units: 2 })
        );
        assert_eq!(spawned.len(), 2);
        assert_eq!(ledger.quantity("Fe"), 5.0);
    }

    #[test]
    fn test_generation_insufficient_primary() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 9.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(5.0);
        let err = b.try_generate(&mut ledger, &mut spawned, false).unwrap_err();
        assert!(matches!(err, GenerationDeclined::InsufficientResource(ref s) if s.resource == "Fe"));
        assert_eq!(ledger.quantity("Fe"), 9.0);
        assert_eq!(b.units_generated(), 0);
        assert!(spawned.is_empty());
    }

    #[test]
    fn test_legendary_requires_unlock() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 50.0), ("Oro", 100.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(5.0);
        let unit = b.try_generate(&mut ledger, &mut spawned, true).unwrap();
        assert_eq!(unit.variant, UnitVariant::Normal);
        assert_eq!(ledger.quantity("Oro"), 100.0);
        assert_eq!(ledger.quantity("Fe"), 40.0);
    }

    #[test]
    fn test_legendary_spends_secondary() {
        let mut b = at_tier(2);
        let mut ledger = ledger_with(&[("Fe", 50.0), ("Oro", 100.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(4.0);
        let unit = b.try_generate(&mut ledger, &mut spawned, true).unwrap();
        assert_eq!(unit.variant, UnitVariant::Legendary);
        assert_eq!(unit.unit_type, "Profeta");
        assert_eq!(ledger.quantity("Oro"), 70.0);
        assert_eq!(ledger.quantity("Fe"), 50.0);
    }

    #[test]
    fn test_legendary_falls_back_to_normal() {
        let mut b = at_tier(2);
        let mut ledger = ledger_with(&[("Fe", 50.0), ("Oro", 29.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(4.0);
        let unit = b.try_generate(&mut ledger, &mut spawned, true).unwrap();
        assert_eq!(unit.variant, UnitVariant::Normal);
        assert_eq!(ledger.quantity("Oro"), 29.0);
        assert_eq!(ledger.quantity("Fe"), 40.0);
    }

    #[test]
    fn test_legendary_fallback_checks_primary() {
        let mut b = at_tier(2);
        let mut ledger = ledger_with(&[("Fe", 5.0), ("Oro", 10.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(4.0);
        assert!(matches!(
            b.try_generate(&mut ledger, &mut spawned, true),
            Err(GenerationDeclined::InsufficientResource(_))
        ));
        assert_eq!(ledger.quantity("Fe"), 5.0);
        assert_eq!(ledger.quantity("Oro"), 10.0);
    }

    #[test]
    fn test_legendary_without_unit_configured() {
        let mut bp = (*blueprint()).clone();
        bp.recipe.legendary_unit = None;
        let state = ProgressionState {
            current_tier: 2,
            ..ProgressionState::default()
        };
        let mut b = TieredProductionBuilding::restore(Arc::new(bp), state).unwrap();
        let mut ledger = ledger_with(&[("Fe", 50.0), ("Oro", 100.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(4.0);
        let unit = b.try_generate(&mut ledger, &mut spawned, true).unwrap();
        assert_eq!(unit.variant, UnitVariant::Normal);
        assert_eq!(ledger.quantity("Oro"), 100.0);
    }

    #[test]
    fn test_profession_items_required_once_unlocked() {
        let mut b = at_tier(3);
        assert!(b.profession_requirement_unlocked());
        let mut ledger = ledger_with(&[("Fe", 50.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(3.0);
        assert!(matches!(
            b.try_generate(&mut ledger, &mut spawned, false),
            Err(GenerationDeclined::MissingProfessionItems(_))
        ));
        assert_eq!(ledger.quantity("Fe"), 50.0);

        ledger.add("Libro", 1.0).unwrap();
        b.try_generate(&mut ledger, &mut spawned, false).unwrap();
        assert_eq!(ledger.quantity("Libro"), 0.0);
        assert_eq!(ledger.quantity("Fe"), 40.0);
    }

    #[test]
    fn test_profession_items_spent_before_cost() {
        // Recipe where the profession item is the primary resource itself
        let mut bp = (*blueprint()).clone();
        bp.recipe.profession_requirements = vec![ItemRequirement::new("Fe", 5)];
        let state = ProgressionState {
            current_tier: 3,
            ..ProgressionState::default()
        };
        let mut b = TieredProductionBuilding::restore(Arc::new(bp), state).unwrap();
        let mut ledger = ledger_with(&[("Fe", 12.0)]);
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&seen);
        ledger.subscribe(move |c| {
            sink.borrow_mut().push(c.quantity);
            Ok(())
        });
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.advance(3.0);
        b.try_generate(&mut ledger, &mut spawned, false).unwrap();
        // Item first (12 → 7), then the unit cost drains what is left
        assert_eq!(*seen.borrow(), vec![7.0, 0.0]);
    }

    #[test]
    fn test_generation_notifies_spawner() {
        struct Counter(u32);
        impl UnitSpawner for Counter {
            fn spawn_unit(&mut self, _unit: &GeneratedUnit) {
                self.0 += 1;
            }
        }
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 100.0)]);
        let mut counter = Counter(0);
        b.advance(5.0);
        b.try_generate(&mut ledger, &mut counter, false).unwrap();
        assert_eq!(counter.0, 1);
    }

    #[test]
    fn test_advance_ignores_bad_deltas() {
        let mut b = building();
        b.advance(-3.0);
        b.advance(f32::NAN);
        b.advance(f32::INFINITY);
        assert_eq!(b.time_since_last_generation(), 0.0);
        b.advance(2.0);
        assert_eq!(b.cooldown_remaining(), 3.0);
    }

    // ── Upgrades ───────────────────────────────────────────────────────

    #[test]
    fn test_upgrade_missing_tools_spends_nothing() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 20.0)]);
        let err = b.try_upgrade(&mut ledger).unwrap_err();
        assert!(matches!(err, UpgradeDeclined::InsufficientTools(ref t) if t[0].resource == "Martillo"));
        assert_eq!(ledger.quantity("Fe"), 20.0);
        assert_eq!(b.current_tier(), 1);
    }

    #[test]
    fn test_upgrade_missing_primary_spends_nothing() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 19.0), ("Martillo", 2.0)]);
        assert!(matches!(
            b.try_upgrade(&mut ledger),
            Err(UpgradeDeclined::InsufficientResources { .. })
        ));
        assert_eq!(ledger.quantity("Fe"), 19.0);
        assert_eq!(ledger.quantity("Martillo"), 2.0);
    }

    #[test]
    fn test_upgrade_missing_secondary_spends_nothing() {
        let mut b = at_tier(2);
        let mut ledger = ledger_with(&[("Fe", 40.0), ("Oro", 14.0)]);
        assert!(matches!(
            b.try_upgrade(&mut ledger),
            Err(UpgradeDeclined::InsufficientResources { ref resources, .. }) if resources[0].resource == "Oro"
        ));
        assert_eq!(ledger.quantity("Fe"), 40.0);
        assert_eq!(ledger.quantity("Oro"), 14.0);
    }

    #[test]
    fn test_upgrade_spends_and_unlocks() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 25.0), ("Martillo", 3.0), ("Oro", 5.0)]);
        assert!(b.can_upgrade_now(&ledger));
        assert_eq!(b.try_upgrade(&mut ledger), Ok(2));
        assert_eq!(ledger.quantity("Fe"), 5.0);
        assert_eq!(ledger.quantity("Martillo"), 1.0);
        // Secondary cost of tier 1 is zero, untouched
        assert_eq!(ledger.quantity("Oro"), 5.0);
        assert!(b.legendary_generation_unlocked());
        assert!(!b.profession_requirement_unlocked());
        // Timer primed for an immediate generation
        assert_eq!(b.time_since_last_generation(), 4.0);
        assert_eq!(b.cooldown_remaining(), 0.0);
    }

    #[test]
    fn test_upgrade_to_terminal_then_noop() {
        let mut b = at_tier(2);
        let mut ledger = ledger_with(&[("Fe", 100.0), ("Oro", 100.0)]);
        assert_eq!(b.try_upgrade(&mut ledger), Ok(3));
        assert!(b.is_max_tier());
        assert!(b.legendary_generation_unlocked());
        assert!(b.profession_requirement_unlocked());
        assert_eq!(ledger.quantity("Fe"), 60.0);
        assert_eq!(ledger.quantity("Oro"), 85.0);

        assert_eq!(
            b.try_upgrade(&mut ledger),
            Err(UpgradeDeclined::MaxTierReached)
        );
        assert_eq!(ledger.quantity("Fe"), 60.0);
        assert_eq!(b.current_tier(), 3);
    }

    #[test]
    fn test_unlocks_are_sticky_across_blueprint_changes() {
        let b = at_tier(2);
        let mut state = b.state().clone();
        assert!(state.legendary_generation_unlocked);
        // A later blueprint revision drops the unlock from tier 2
        let mut bp = (*blueprint()).clone();
        bp.tiers[1].unlocks_legendary_generation = false;
        state.current_tier = 2;
        let restored = TieredProductionBuilding::restore(Arc::new(bp), state).unwrap();
        assert!(restored.legendary_generation_unlocked());
    }

    #[test]
    fn test_interactable_refresh() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 100.0), ("Martillo", 2.0)]);
        assert_eq!(b.interactable(), Interactable::default());
        b.refresh_interactable(&ledger);
        assert!(!b.interactable().generate); // cooling down
        assert!(b.interactable().upgrade);

        b.advance(5.0);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        b.try_generate(&mut ledger, &mut spawned, false).unwrap();
        assert!(!b.interactable().generate);
        assert!(b.interactable().upgrade);
        assert!(!b.can_generate_now(&ledger));
    }

    #[test]
    fn test_units_generated_carry_across_tiers() {
        let mut b = building();
        let mut ledger = ledger_with(&[("Fe", 200.0), ("Martillo", 2.0)]);
        let mut spawned: Vec<GeneratedUnit> = Vec::new();
        for _ in 0..2 {
            b.advance(5.0);
            b.try_generate(&mut ledger, &mut spawned, false).unwrap();
        }
        b.try_upgrade(&mut ledger).unwrap();
        assert_eq!(b.units_generated(), 2);
        // Tier 2 allows 4 in total, so two more
        b.try_generate(&mut ledger, &mut spawned, false).unwrap();
        assert_eq!(b.units_generated(), 3);
    }
}
