//! Settlement engine - main entry point for running the economy simulation

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hecs::{Entity, World};
use monolito_logic::config::{EconomyConfig, EconomyConfigError};
use monolito_logic::housing::HousingRegistry;
use monolito_logic::ledger::ResourceLedger;
use monolito_logic::production::{
    BuildingBlueprint, GeneratedUnit, GenerationDeclined, Interactable, TieredProductionBuilding,
    UpgradeDeclined,
};
use monolito_logic::tiers::TierConfigError;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::*;
use crate::generation::spawn_villager;

/// Display name given to houses
pub const HOUSE_NAME: &str = "Casa";

/// Main settlement engine
///
/// Owns the ECS world, the resource ledger and the housing registry. Player
/// actions arrive as direct calls ([`generate`](Self::generate),
/// [`upgrade`](Self::upgrade)); the host drives time with [`update`](Self::update).
pub struct Settlement {
    /// ECS world containing buildings and villagers
    pub world: World,
    /// The settlement's resources
    pub ledger: ResourceLedger,
    /// Houses and who lives in them
    pub housing: HousingRegistry<Entity, Entity>,
    /// Blueprints by name, shared read-only with every producer
    pub(crate) blueprints: BTreeMap<String, Arc<BuildingBlueprint>>,
    /// Simulation time in seconds since start
    pub(crate) sim_time: f64,
    pub(crate) time_scale: f32,
    rng: StdRng,
}

/// Errors returned by settlement actions
#[derive(Debug)]
pub enum EngineError {
    Config(EconomyConfigError),
    UnknownBlueprint(String),
    InvalidBlueprint(TierConfigError),
    NotAProducer(Entity),
    NotAVillager(Entity),
    NoSuchEntity(Entity),
    Generation(GenerationDeclined),
    Upgrade(UpgradeDeclined),
}

impl From<EconomyConfigError> for EngineError {
    fn from(e: EconomyConfigError) -> Self {
        EngineError::Config(e)
    }
}

impl From<TierConfigError> for EngineError {
    fn from(e: TierConfigError) -> Self {
        EngineError::InvalidBlueprint(e)
    }
}

impl From<GenerationDeclined> for EngineError {
    fn from(e: GenerationDeclined) -> Self {
        EngineError::Generation(e)
    }
}

impl From<UpgradeDeclined> for EngineError {
    fn from(e: UpgradeDeclined) -> Self {
        EngineError::Upgrade(e)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "Invalid config: {}", e),
            EngineError::UnknownBlueprint(name) => write!(f, "Unknown blueprint '{}'", name),
            EngineError::InvalidBlueprint(e) => write!(f, "Invalid blueprint: {}", e),
            EngineError::NotAProducer(e) => write!(f, "Entity {:?} is not a producer", e),
            EngineError::NotAVillager(e) => write!(f, "Entity {:?} is not a villager", e),
            EngineError::NoSuchEntity(e) => write!(f, "Entity {:?} does not exist", e),
            EngineError::Generation(d) => write!(f, "Generation declined: {}", d),
            EngineError::Upgrade(d) => write!(f, "Upgrade declined: {}", d),
        }
    }
}

impl std::error::Error for EngineError {}

/// Read-only view of a producer for UI binding
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerStatus {
    pub name: String,
    pub tier: u32,
    pub tier_name: String,
    pub units_generated: u32,
    pub cooldown_remaining: f32,
    pub legendary_unlocked: bool,
    pub disabled: bool,
    pub can_generate: bool,
    pub can_upgrade: bool,
}

impl Settlement {
    /// Boot a settlement from a validated config
    pub fn new(config: &EconomyConfig) -> Result<Self, EngineError> {
        let ledger = config.validate()?;
        let blueprints = config
            .blueprints
            .iter()
            .map(|bp| (bp.name.clone(), Arc::new(bp.clone())))
            .collect();
        Ok(Self {
            world: World::new(),
            ledger,
            housing: HousingRegistry::new(),
            blueprints,
            sim_time: 0.0,
            time_scale: 1.0,
            rng: StdRng::from_entropy(),
        })
    }

    /// Use a fixed seed for villager names (reproducible runs)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Place a production building at tier 1
    pub fn place_producer(&mut self, blueprint: &str) -> Result<Entity, EngineError> {
        let bp = self
            .blueprints
            .get(blueprint)
            .cloned()
            .ok_or_else(|| EngineError::UnknownBlueprint(blueprint.to_string()))?;
        let mut progression = TieredProductionBuilding::new(bp)?;
        progression.refresh_interactable(&self.ledger);
        let entity = self
            .world
            .spawn((Building::new(blueprint), Producer::new(progression)));
        log::info!("Placed {} as {:?}", blueprint, entity);
        Ok(entity)
    }

    /// Build a house and move homeless villagers in
    pub fn build_house(&mut self, capacity: u32) -> Entity {
        let entity = self
            .world
            .spawn((Building::new(HOUSE_NAME), House { capacity }));
        self.housing.register(entity, capacity);
        let housed = self.rehouse_homeless();
        log::info!(
            "Built house {:?} (capacity {}), {} villagers moved in",
            entity,
            capacity,
            housed
        );
        entity
    }

    /// Remove a building. Residents of a demolished house look for new homes.
    pub fn demolish(&mut self, building: Entity) -> Result<(), EngineError> {
        if self.world.get::<&Building>(building).is_err() {
            return Err(EngineError::NoSuchEntity(building));
        }
        let evicted = self
            .housing
            .unregister(building)
            .map(|entry| entry.occupants().to_vec())
            .unwrap_or_default();
        self.world
            .despawn(building)
            .map_err(|_| EngineError::NoSuchEntity(building))?;
        if !evicted.is_empty() {
            let housed = self.rehouse_homeless();
            log::info!(
                "Demolished {:?}: {} evicted, {} rehoused",
                building,
                evicted.len(),
                housed
            );
        }
        Ok(())
    }

    /// Advance every producer's cooldown by `delta_seconds` (scaled)
    pub fn update(&mut self, delta_seconds: f32) {
        let scaled = delta_seconds * self.time_scale;
        if scaled <= 0.0 || !scaled.is_finite() {
            return;
        }
        self.sim_time += scaled as f64;
        for (_, producer) in self.world.query_mut::<&mut Producer>() {
            producer.progression.advance(scaled);
            producer.progression.refresh_interactable(&self.ledger);
        }
    }

    /// Player action: try to generate a villager at `building`
    pub fn generate(
        &mut self,
        building: Entity,
        wants_legendary: bool,
    ) -> Result<Entity, EngineError> {
        let mut queue: Vec<GeneratedUnit> = Vec::new();
        {
            let mut producer = self
                .world
                .get::<&mut Producer>(building)
                .map_err(|_| EngineError::NotAProducer(building))?;
            producer
                .progression
                .try_generate(&mut self.ledger, &mut queue, wants_legendary)?;
        }
        // The producer borrow is released, so the world can take new villagers
        let mut villager = None;
        for unit in queue.drain(..) {
            let spawned = spawn_villager(&mut self.world, &unit, self.sim_time, &mut self.rng);
            if self.housing.house(spawned).is_none() {
                log::warn!("No free house for {:?}, villager is homeless", spawned);
            }
            villager = Some(spawned);
        }
        self.refresh_producers();
        villager.ok_or(EngineError::NotAProducer(building))
    }

    /// Player action: try to upgrade `building` one tier. Returns the new tier.
    pub fn upgrade(&mut self, building: Entity) -> Result<u32, EngineError> {
        let tier = {
            let mut producer = self
                .world
                .get::<&mut Producer>(building)
                .map_err(|_| EngineError::NotAProducer(building))?;
            producer.progression.try_upgrade(&mut self.ledger)?
        };
        self.refresh_producers();
        Ok(tier)
    }

    /// Set the legendary toggle a producer's UI shows
    pub fn set_wants_legendary(&mut self, building: Entity, wants: bool) -> Result<(), EngineError> {
        let mut producer = self
            .world
            .get::<&mut Producer>(building)
            .map_err(|_| EngineError::NotAProducer(building))?;
        producer.progression.set_wants_legendary(wants);
        producer.progression.refresh_interactable(&self.ledger);
        Ok(())
    }

    /// A villager died: free their bed and remove them
    pub fn villager_died(&mut self, villager: Entity) -> Result<(), EngineError> {
        if self.world.get::<&Villager>(villager).is_err() {
            return Err(EngineError::NotAVillager(villager));
        }
        self.housing.move_out(villager);
        self.world
            .despawn(villager)
            .map_err(|_| EngineError::NoSuchEntity(villager))?;
        self.rehouse_homeless();
        Ok(())
    }

    /// House every homeless villager that fits. Returns how many moved in.
    pub fn rehouse_homeless(&mut self) -> usize {
        let mut homeless = self.homeless();
        homeless.sort_by(|a, b| a.id().cmp(&b.id()));
        let mut housed = 0;
        for villager in homeless {
            if self.housing.house(villager).is_none() {
                break;
            }
            housed += 1;
        }
        housed
    }

    /// Villagers without a house
    pub fn homeless(&self) -> Vec<Entity> {
        self.world
            .query::<&Villager>()
            .iter()
            .map(|(e, _)| e)
            .filter(|e| self.housing.house_of(*e).is_none())
            .collect()
    }

    /// Recompute every producer's button state against the current ledger
    pub fn refresh_producers(&mut self) {
        for (_, producer) in self.world.query_mut::<&mut Producer>() {
            producer.progression.refresh_interactable(&self.ledger);
        }
    }

    /// Status of one producer, `None` if `building` is not a producer
    pub fn producer_status(&self, building: Entity) -> Option<ProducerStatus> {
        let producer = self.world.get::<&Producer>(building).ok()?;
        let p = &producer.progression;
        Some(ProducerStatus {
            name: p.name().to_string(),
            tier: p.current_tier(),
            tier_name: p
                .current_config()
                .map(|c| c.display_name.clone())
                .unwrap_or_default(),
            units_generated: p.units_generated(),
            cooldown_remaining: p.cooldown_remaining(),
            legendary_unlocked: p.legendary_generation_unlocked(),
            disabled: p.is_disabled(),
            can_generate: p.can_generate_now(&self.ledger),
            can_upgrade: p.can_upgrade_now(&self.ledger),
        })
    }

    /// Cached button state of a producer
    pub fn interactable(&self, building: Entity) -> Option<Interactable> {
        self.world
            .get::<&Producer>(building)
            .ok()
            .map(|p| p.progression.interactable())
    }

    pub fn blueprint(&self, name: &str) -> Option<&Arc<BuildingBlueprint>> {
        self.blueprints.get(name)
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn producer_count(&self) -> usize {
        self.world.query::<&Producer>().iter().count()
    }

    pub fn house_count(&self) -> usize {
        self.world.query::<&House>().iter().count()
    }

    pub fn villager_count(&self) -> usize {
        self.world.query::<&Villager>().iter().count()
    }

    pub fn legendary_count(&self) -> usize {
        self.world
            .query::<&Villager>()
            .iter()
            .filter(|(_, v)| v.is_legendary())
            .count()
    }

    /// Save settlement state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::save_settlement(writer, self)
    }

    /// Load settlement state from a reader, replacing the current world
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::load_settlement(reader, self)
    }
}
