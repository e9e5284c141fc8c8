//! Loading the economy config from JSON.
//!
//! The config is parsed with `serde_json` and validated before it is handed
//! back, so a settlement never boots from a config with duplicate resources,
//! unknown resource references or a malformed tier table.

use std::io::Read;
use std::path::Path;

use monolito_logic::config::{EconomyConfig, EconomyConfigError};

/// Errors that can occur while loading a config
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(EconomyConfigError),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<EconomyConfigError> for ConfigError {
    fn from(e: EconomyConfigError) -> Self {
        ConfigError::Invalid(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate a config from a JSON string
pub fn load_config_str(json: &str) -> Result<EconomyConfig, ConfigError> {
    checked(serde_json::from_str(json)?)
}

/// Parse and validate a config from a reader
pub fn load_config_reader<R: Read>(reader: R) -> Result<EconomyConfig, ConfigError> {
    checked(serde_json::from_reader(reader)?)
}

/// Parse and validate a config file
pub fn load_config_file(path: impl AsRef<Path>) -> Result<EconomyConfig, ConfigError> {
    let file = std::fs::File::open(path)?;
    load_config_reader(std::io::BufReader::new(file))
}

fn checked(config: EconomyConfig) -> Result<EconomyConfig, ConfigError> {
    config.validate()?;
    log::info!(
        "Loaded economy config: {} resources, {} blueprints",
        config.resources.len(),
        config.blueprints.len()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "resources": [
            { "name": "Fe", "capacity": 100.0 },
            { "name": "Oro", "capacity": 50.0 }
        ],
        "starting_stock": { "Fe": 30.0 },
        "blueprints": [{
            "name": "Altar",
            "recipe": {
                "primary_resource": "Fe",
                "secondary_resource": "Oro",
                "normal_unit": "Aldeano"
            },
            "tiers": [{
                "tier_number": 1,
                "display_name": "Choza",
                "generation_interval": 5.0,
                "max_units_at_tier": 2,
                "normal_generation_cost": 10.0,
                "legendary_generation_cost": 0.0,
                "upgrade_cost_primary": 0.0
            }]
        }]
    }"#;

    #[test]
    fn test_load_minimal() {
        let config = load_config_str(MINIMAL).unwrap();
        assert_eq!(config.resources.len(), 2);
        assert_eq!(config.starting_stock.get("Fe"), Some(&30.0));
        assert!(config.blueprint("Altar").is_some());
    }

    #[test]
    fn test_reader_matches_str() {
        let from_reader = load_config_reader(MINIMAL.as_bytes()).unwrap();
        assert_eq!(from_reader, load_config_str(MINIMAL).unwrap());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            load_config_str("{ \"resources\": ["),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let json = r#"{ "resources": [
            { "name": "Fe", "capacity": 1.0 },
            { "name": "Fe", "capacity": 2.0 }
        ] }"#;
        assert!(matches!(
            load_config_str(json),
            Err(ConfigError::Invalid(EconomyConfigError::Ledger(_)))
        ));
    }

    #[test]
    fn test_reader_validates_like_str() {
        let json = r#"{ "resources": [
            { "name": "Fe", "capacity": 1.0 },
            { "name": "Fe", "capacity": 2.0 }
        ] }"#;
        assert!(matches!(
            load_config_reader(json.as_bytes()),
            Err(ConfigError::Invalid(EconomyConfigError::Ledger(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config_file("/nonexistent/economy.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
