//! Save/Load functionality for persisting settlement state
//!
//! Uses bincode for binary serialization. Components are serialized per
//! entity, producers as their blueprint name plus progression state, and
//! housing as index links into the entity list (entity ids are not stable
//! across worlds).

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use hecs::{Entity, World};
use monolito_logic::housing::HousingRegistry;
use monolito_logic::ledger::{LedgerError, PoolSnapshot};
use monolito_logic::production::{ProgressionState, TieredProductionBuilding};
use monolito_logic::tiers::TierConfigError;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::engine::Settlement;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of a settlement
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Simulation time in seconds
    pub sim_time: f64,
    pub time_scale: f32,
    /// Quantities and levels of every pool
    pub ledger: Vec<PoolSnapshot>,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
    /// Houses in registration order
    pub housing: Vec<SavedHouse>,
}

/// A producer's progression, keyed by blueprint name
#[derive(Serialize, Deserialize, Clone)]
pub struct SavedProducer {
    pub blueprint: String,
    pub state: ProgressionState,
}

/// A house and its residents, as indices into [`SaveData::entities`]
#[derive(Serialize, Deserialize, Clone)]
pub struct SavedHouse {
    pub house: usize,
    pub capacity: u32,
    pub occupants: Vec<usize>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    pub building: Option<Building>,
    pub producer: Option<SavedProducer>,
    pub house: Option<House>,
    pub villager: Option<Villager>,
    pub name: Option<Name>,
}

fn serialize_entities(world: &World) -> (Vec<SerializableEntity>, HashMap<Entity, usize>) {
    let mut entities = Vec::new();
    let mut index = HashMap::new();

    for entity_ref in world.iter() {
        let mut se = SerializableEntity::default();
        if let Some(c) = entity_ref.get::<&Building>() {
            se.building = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Producer>() {
            se.producer = Some(SavedProducer {
                blueprint: c.progression.name().to_string(),
                state: c.progression.state().clone(),
            });
        }
        if let Some(c) = entity_ref.get::<&House>() {
            se.house = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Villager>() {
            se.villager = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Name>() {
            se.name = Some((*c).clone());
        }
        index.insert(entity_ref.entity(), entities.len());
        entities.push(se);
    }

    (entities, index)
}

fn serialize_housing(
    housing: &HousingRegistry<Entity, Entity>,
    index: &HashMap<Entity, usize>,
) -> Vec<SavedHouse> {
    housing
        .iter()
        .filter_map(|(house, entry)| {
            let Some(&house_idx) = index.get(&house) else {
                log::warn!("House {:?} is registered but not in the world, skipped", house);
                return None;
            };
            Some(SavedHouse {
                house: house_idx,
                capacity: entry.capacity(),
                occupants: entry
                    .occupants()
                    .iter()
                    .filter_map(|o| index.get(o).copied())
                    .collect(),
            })
        })
        .collect()
}

/// Save a settlement to a writer
pub fn save_settlement<W: Write>(writer: W, settlement: &Settlement) -> Result<(), SaveError> {
    let (entities, index) = serialize_entities(&settlement.world);
    let housing = serialize_housing(&settlement.housing, &index);

    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time: settlement.sim_time,
        time_scale: settlement.time_scale,
        ledger: settlement.ledger.snapshot(),
        entities,
        housing,
    };

    bincode::serialize_into(writer, &save_data)?;
    log::info!(
        "Saved settlement: {} entities at t={:.1}s",
        save_data.entities.len(),
        save_data.sim_time
    );
    Ok(())
}

/// Load a save into `settlement`, replacing its world, housing and stock.
///
/// The settlement must have been built from a config that knows every saved
/// blueprint and resource. Nothing is replaced if the save is rejected.
pub fn load_settlement<R: Read>(reader: R, settlement: &mut Settlement) -> Result<(), SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    let mut spawned = Vec::with_capacity(save_data.entities.len());
    for se in save_data.entities {
        spawned.push(spawn_entity(&mut world, se, settlement)?);
    }

    let lookup = |idx: usize| {
        spawned
            .get(idx)
            .copied()
            .ok_or(SaveError::DanglingReference(idx))
    };
    let mut housing = HousingRegistry::new();
    for saved in &save_data.housing {
        let house = lookup(saved.house)?;
        housing.register(house, saved.capacity);
        for &idx in &saved.occupants {
            if let Err(e) = housing.move_in(house, lookup(idx)?) {
                log::warn!("Dropped resident {} of house {}: {}", idx, saved.house, e);
            }
        }
    }

    // Last fallible step; the ledger checks every name before applying
    settlement.ledger.restore(&save_data.ledger)?;

    settlement.world = world;
    settlement.housing = housing;
    settlement.sim_time = save_data.sim_time;
    settlement.time_scale = save_data.time_scale;
    settlement.refresh_producers();
    log::info!("Loaded settlement at t={:.1}s", settlement.sim_time);
    Ok(())
}

fn spawn_entity(
    world: &mut World,
    se: SerializableEntity,
    settlement: &Settlement,
) -> Result<Entity, SaveError> {
    let entity = world.spawn(());

    if let Some(c) = se.building {
        let _ = world.insert_one(entity, c);
    }
    if let Some(saved) = se.producer {
        let blueprint = settlement
            .blueprint(&saved.blueprint)
            .map(Arc::clone)
            .ok_or_else(|| SaveError::UnknownBlueprint(saved.blueprint.clone()))?;
        let progression = TieredProductionBuilding::restore(blueprint, saved.state)?;
        let _ = world.insert_one(entity, Producer::new(progression));
    }
    if let Some(c) = se.house {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.villager {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.name {
        let _ = world.insert_one(entity, c);
    }
    Ok(entity)
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
    UnknownBlueprint(String),
    TierConfig(TierConfigError),
    Ledger(LedgerError),
    DanglingReference(usize),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<TierConfigError> for SaveError {
    fn from(e: TierConfigError) -> Self {
        SaveError::TierConfig(e)
    }
}

impl From<LedgerError> for SaveError {
    fn from(e: LedgerError) -> Self {
        SaveError::Ledger(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SaveError::UnknownBlueprint(name) => write!(f, "Unknown blueprint '{}'", name),
            SaveError::TierConfig(e) => write!(f, "Invalid tier table: {}", e),
            SaveError::Ledger(e) => write!(f, "Ledger error: {}", e),
            SaveError::DanglingReference(idx) => {
                write!(f, "Save references missing entity #{}", idx)
            }
        }
    }
}

impl std::error::Error for SaveError {}
