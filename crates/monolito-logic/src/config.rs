//! Economy configuration: the data a settlement is started from.
//!
//! An [`EconomyConfig`] bundles the resource definitions, the starting
//! stockpile and the building blueprints. It is plain serde data; parsing
//! from a file lives in the engine crate.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::{LedgerError, ResourceLedger};
use crate::production::BuildingBlueprint;
use crate::resources::ResourceDefinition;
use crate::tiers::TierConfigError;

/// Everything needed to boot a settlement's economy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    pub resources: Vec<ResourceDefinition>,
    /// Quantities added right after the ledger is created.
    #[serde(default)]
    pub starting_stock: BTreeMap<String, f32>,
    #[serde(default)]
    pub blueprints: Vec<BuildingBlueprint>,
}

/// Why a config cannot be used.
#[derive(Debug, Clone, PartialEq)]
pub enum EconomyConfigError {
    Ledger(LedgerError),
    DuplicateBlueprint(String),
    Blueprint {
        blueprint: String,
        error: TierConfigError,
    },
}

impl fmt::Display for EconomyConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EconomyConfigError::Ledger(e) => write!(f, "{}", e),
            EconomyConfigError::DuplicateBlueprint(name) => {
                write!(f, "blueprint '{}' is defined more than once", name)
            }
            EconomyConfigError::Blueprint { blueprint, error } => {
                write!(f, "blueprint '{}': {}", blueprint, error)
            }
        }
    }
}

impl std::error::Error for EconomyConfigError {}

impl From<LedgerError> for EconomyConfigError {
    fn from(e: LedgerError) -> Self {
        EconomyConfigError::Ledger(e)
    }
}

impl EconomyConfig {
    /// Create the ledger and apply the starting stock.
    pub fn build_ledger(&self) -> Result<ResourceLedger, LedgerError> {
        let mut ledger = ResourceLedger::new(self.resources.clone())?;
        for (name, amount) in &self.starting_stock {
            ledger.add(name, *amount)?;
        }
        Ok(ledger)
    }

    /// Build the ledger and check every blueprint against it.
    pub fn validate(&self) -> Result<ResourceLedger, EconomyConfigError> {
        let ledger = self.build_ledger()?;
        let mut seen = HashSet::new();
        for bp in &self.blueprints {
            if !seen.insert(bp.name.as_str()) {
                return Err(EconomyConfigError::DuplicateBlueprint(bp.name.clone()));
            }
            bp.validate_against(&ledger)
                .map_err(|error| EconomyConfigError::Blueprint {
                    blueprint: bp.name.clone(),
                    error,
                })?;
        }
        Ok(ledger)
    }

    pub fn blueprint(&self, name: &str) -> Option<&BuildingBlueprint> {
        self.blueprints.iter().find(|b| b.name == name)
    }
}
