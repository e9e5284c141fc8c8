//! Pure economy logic for Culto del Monolito.
//!
//! This crate contains the settlement's economy rules independent of any
//! engine or runtime. Types take plain data and an explicit ledger, making
//! them unit-testable and usable from the ECS engine, the headless harness,
//! or a game client.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Economy config bundle (resources, starting stock, blueprints) |
//! | [`housing`] | First-fit house registry and occupancy |
//! | [`ledger`] | Resource ledger: add/spend/query, leveling, change broadcast |
//! | [`production`] | Tiered production building state machine |
//! | [`resources`] | Resource definitions and capacity-bounded pools |
//! | [`tiers`] | Per-tier building configuration and validation |

pub mod config;
pub mod housing;
pub mod ledger;
pub mod production;
pub mod resources;
pub mod tiers;
