//! The resource ledger: central authority over every resource quantity.
//!
//! All adds and spends in the settlement funnel through [`ResourceLedger`].
//! Each change that actually moves a pool's quantity is broadcast to the
//! subscribed observers as a [`ResourceChange`].
//!
//! Note the spend semantics: an insufficient [`spend`](ResourceLedger::spend)
//! still drains the pool to zero and reports `false`. Callers that need an
//! all-or-nothing debit must check [`has_at_least`](ResourceLedger::has_at_least)
//! first, which is what the production buildings do.
//!
//! ```
//! use monolito_logic::ledger::ResourceLedger;
//! use monolito_logic::resources::ResourceDefinition;
//!
//! let mut ledger = ResourceLedger::new(vec![ResourceDefinition::new("Fe", 100.0)]).unwrap();
//! ledger.add("Fe", 50.0).unwrap();
//! assert!(ledger.spend("Fe", 30.0).unwrap());
//! assert!(!ledger.spend("Fe", 50.0).unwrap());
//! assert_eq!(ledger.quantity("Fe"), 0.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::{ResourceDefinition, ResourcePool};

/// Broadcast payload: a pool's new quantity after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub name: String,
    pub quantity: f32,
    pub capacity: f32,
}

/// Observers may fail; failures are logged and never undo the mutation.
pub type ObserverResult = Result<(), Box<dyn std::error::Error>>;

type Observer = Box<dyn FnMut(&ResourceChange) -> ObserverResult>;

/// Handle returned by [`ResourceLedger::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

/// Saved quantity and level of a single pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub name: String,
    pub quantity: f32,
    pub level: u32,
}

/// Errors raised by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Operation on a name that no pool was created for.
    UnknownResource(String),
    /// Two definitions shared a name during initialization.
    DuplicateResource(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::UnknownResource(name) => write!(f, "unknown resource '{}'", name),
            LedgerError::DuplicateResource(name) => {
                write!(f, "resource '{}' is defined more than once", name)
            }
        }
    }
}

impl std::error::Error for LedgerError {}

/// Owns one [`ResourcePool`] per resource definition.
pub struct ResourceLedger {
    pools: BTreeMap<String, ResourcePool>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u32,
}

impl ResourceLedger {
    /// Build one empty pool per definition.
    pub fn new(definitions: Vec<ResourceDefinition>) -> Result<Self, LedgerError> {
        let mut pools = BTreeMap::new();
        for def in definitions {
            if pools.contains_key(&def.name) {
                log::error!("Duplicate resource definition '{}'", def.name);
                return Err(LedgerError::DuplicateResource(def.name));
            }
            pools.insert(def.name.clone(), ResourcePool::new(def));
        }
        Ok(Self {
            pools,
            observers: Vec::new(),
            next_observer: 0,
        })
    }

    /// Register an observer for every future quantity change.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&ResourceChange) -> ObserverResult + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Add `amount`, clamped to capacity. Negative and non-finite amounts
    /// are ignored.
    pub fn add(&mut self, name: &str, amount: f32) -> Result<(), LedgerError> {
        let pool = self.pool_mut(name)?;
        if !amount.is_finite() || amount < 0.0 {
            log::warn!("Ignoring add of {} to '{}'", amount, name);
            return Ok(());
        }
        let target = pool.current() + amount;
        if pool.set_clamped(target) {
            self.notify(name);
        }
        Ok(())
    }

    /// Spend `amount`. Returns whether the pool held enough *before* the
    /// spend; the pool is drained (clamped at zero) either way.
    pub fn spend(&mut self, name: &str, amount: f32) -> Result<bool, LedgerError> {
        let pool = self.pool_mut(name)?;
        if amount < 0.0 {
            return Ok(true);
        }
        if amount.is_nan() {
            log::warn!("Ignoring NaN spend from '{}'", name);
            return Ok(false);
        }
        let succeeded = pool.current() >= amount;
        let target = pool.current() - amount;
        if pool.set_clamped(target) {
            self.notify(name);
        }
        if !succeeded {
            log::warn!("Insufficient '{}' for spend of {}, drained to zero", name, amount);
        }
        Ok(succeeded)
    }

    /// Whether the pool holds at least `amount`. Non-positive amounts always pass.
    pub fn has_at_least(&self, name: &str, amount: f32) -> bool {
        if amount <= 0.0 {
            return true;
        }
        match self.pools.get(name) {
            Some(pool) => pool.current() >= amount,
            None => {
                log::error!("{}", LedgerError::UnknownResource(name.to_string()));
                false
            }
        }
    }

    /// Current quantity, 0 for unknown names.
    pub fn quantity(&self, name: &str) -> f32 {
        self.pools.get(name).map(|p| p.current()).unwrap_or(0.0)
    }

    /// Capacity, 0 for unknown names.
    pub fn capacity(&self, name: &str) -> f32 {
        self.pools.get(name).map(|p| p.capacity()).unwrap_or(0.0)
    }

    /// Level of a pool, 0 for unknown names.
    pub fn level(&self, name: &str) -> u32 {
        self.pools.get(name).map(|p| p.level()).unwrap_or(0)
    }

    /// `base_value * level`, 0 for unknown names.
    pub fn value(&self, name: &str) -> f32 {
        self.pools.get(name).map(|p| p.value()).unwrap_or(0.0)
    }

    /// Fraction of capacity in use, 0 for unknown names.
    pub fn fill_ratio(&self, name: &str) -> f32 {
        self.pools.get(name).map(|p| p.fill_ratio()).unwrap_or(0.0)
    }

    /// Resources below `threshold` of capacity, in name order.
    pub fn shortages(&self, threshold: f32) -> Vec<(&str, f32)> {
        self.pools
            .values()
            .filter(|p| p.capacity() > 0.0 && p.fill_ratio() < threshold)
            .map(|p| (p.name(), p.fill_ratio()))
            .collect()
    }

    /// Restore every pool to full capacity.
    pub fn reset(&mut self) {
        let names: Vec<String> = self.pools.keys().cloned().collect();
        for name in names {
            let changed = match self.pools.get_mut(&name) {
                Some(pool) => {
                    let cap = pool.capacity();
                    pool.set_clamped(cap)
                }
                None => false,
            };
            if changed {
                self.notify(&name);
            }
        }
    }

    /// Level a resource up by paying its leveling cost.
    ///
    /// Returns `Ok(false)` when the resource is not levelable or the cost
    /// cannot be covered; nothing is spent in that case.
    pub fn level_up(&mut self, name: &str) -> Result<bool, LedgerError> {
        let pool = self.pool(name)?;
        let def = pool.definition();
        if !def.is_levelable() {
            log::warn!("Resource '{}' does not support leveling", name);
            return Ok(false);
        }
        let cost_resource = def.leveling_resource.clone();
        let cost = def.level_cost(pool.level());
        let next_level = pool.level() + 1;

        self.pool(&cost_resource)?;
        if !self.has_at_least(&cost_resource, cost) {
            log::warn!(
                "Cannot level '{}': need {} {}, have {}",
                name,
                cost,
                cost_resource,
                self.quantity(&cost_resource)
            );
            return Ok(false);
        }
        self.spend(&cost_resource, cost)?;
        self.pool_mut(name)?.set_level(next_level);
        log::info!("Resource '{}' reached level {}", name, next_level);
        Ok(true)
    }

    /// Iterate pools in name order.
    pub fn pools(&self) -> impl Iterator<Item = &ResourcePool> {
        self.pools.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Capture quantities and levels for saving.
    pub fn snapshot(&self) -> Vec<PoolSnapshot> {
        self.pools
            .values()
            .map(|p| PoolSnapshot {
                name: p.name().to_string(),
                quantity: p.current(),
                level: p.level(),
            })
            .collect()
    }

    /// Apply a saved snapshot. Every name is checked before anything changes.
    pub fn restore(&mut self, snapshot: &[PoolSnapshot]) -> Result<(), LedgerError> {
        if let Some(missing) = snapshot.iter().find(|s| !self.pools.contains_key(&s.name)) {
            return Err(LedgerError::UnknownResource(missing.name.clone()));
        }
        for saved in snapshot {
            let changed = match self.pools.get_mut(&saved.name) {
                Some(pool) => {
                    pool.set_level(saved.level);
                    pool.set_clamped(saved.quantity)
                }
                None => false,
            };
            if changed {
                self.notify(&saved.name);
            }
        }
        Ok(())
    }

    fn pool(&self, name: &str) -> Result<&ResourcePool, LedgerError> {
        self.pools.get(name).ok_or_else(|| {
            let err = LedgerError::UnknownResource(name.to_string());
            log::error!("{}", err);
            err
        })
    }

    fn pool_mut(&mut self, name: &str) -> Result<&mut ResourcePool, LedgerError> {
        self.pools.get_mut(name).ok_or_else(|| {
            let err = LedgerError::UnknownResource(name.to_string());
            log::error!("{}", err);
            err
        })
    }

    fn notify(&mut self, name: &str) {
        let Some(pool) = self.pools.get(name) else {
            return;
        };
        let change = ResourceChange {
            name: name.to_string(),
            quantity: pool.current(),
            capacity: pool.capacity(),
        };
        log::debug!(
            "Resource '{}' now {}/{}",
            change.name,
            change.quantity,
            change.capacity
        );
        for (id, observer) in self.observers.iter_mut() {
            if let Err(e) = observer(&change) {
                log::error!("Observer {:?} failed on '{}': {}", id, change.name, e);
            }
        }
    }
}

impl fmt::Debug for ResourceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLedger")
            .field("pools", &self.pools)
            .field("observers", &self.observers.len())
            .finish()
    }
}
