//! Monolito Core - Settlement Simulation Engine
//!
//! An ECS-based settlement where tiered buildings turn stockpiled resources
//! into villagers, and villagers move into the first house with a free bed.
//!
//! # Architecture
//!
//! The economy rules live in `monolito_logic`; this crate binds them to a
//! `hecs` world:
//! - **Entities**: Buildings (producers, houses) and villagers
//! - **Components**: Pure data attached to entities (Building, Producer, Villager, Name)
//! - **Engine**: [`engine::Settlement`] owns the world, the ledger and the housing registry
//!
//! # Example
//!
//! ```rust,no_run
//! use monolito_core::config::load_config_file;
//! use monolito_core::prelude::*;
//!
//! let config = load_config_file("data/economy.json").unwrap();
//! let mut settlement = Settlement::new(&config).unwrap();
//! let altar = settlement.place_producer("Altar del Monolito").unwrap();
//! settlement.build_house(4);
//!
//! loop {
//!     settlement.update(1.0 / 60.0); // 60 FPS
//!     let _ = settlement.generate(altar, false);
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{EngineError, ProducerStatus, Settlement};
}
