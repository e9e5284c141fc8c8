//! Resource definitions and capacity-bounded pools.
//!
//! A [`ResourceDefinition`] is static data describing one resource type.
//! A [`ResourcePool`] holds the live quantity for that type and is only
//! mutated by the [`ResourceLedger`](crate::ledger::ResourceLedger).
//!
//! # Leveling
//!
//! Resources flagged with `requires_leveling` can be leveled up by spending
//! another resource (`leveling_resource`). The cost of going from `level` to
//! `level + 1` is:
//!
//! ```text
//! level_cost_base * level_cost_growth^(level - 1) * level_cost_factor
//! ```
//!
//! ```
//! use monolito_logic::resources::ResourceDefinition;
//!
//! let fe = ResourceDefinition::new("Fe", 100.0)
//!     .with_leveling("Oro", 10.0, 2.0, 1.0);
//! assert_eq!(fe.level_cost(1), 10.0);
//! assert_eq!(fe.level_cost(3), 40.0);
//! ```

use serde::{Deserialize, Serialize};

/// Static description of a resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Unique key within a ledger.
    pub name: String,
    /// Upper bound for the pool's quantity.
    pub capacity: f32,
    /// Worth of one level of this resource (see [`ResourcePool::value`]).
    #[serde(default)]
    pub base_value: f32,
    #[serde(default)]
    pub requires_leveling: bool,
    /// Resource spent to level this one up. Empty when leveling is disabled.
    #[serde(default)]
    pub leveling_resource: String,
    #[serde(default)]
    pub level_cost_base: f32,
    #[serde(default = "default_growth")]
    pub level_cost_growth: f32,
    #[serde(default = "default_factor")]
    pub level_cost_factor: f32,
}

fn default_growth() -> f32 {
    1.0
}

fn default_factor() -> f32 {
    1.0
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>, capacity: f32) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(0.0),
            base_value: 0.0,
            requires_leveling: false,
            leveling_resource: String::new(),
            level_cost_base: 0.0,
            level_cost_growth: default_growth(),
            level_cost_factor: default_factor(),
        }
    }

    pub fn with_base_value(mut self, value: f32) -> Self {
        self.base_value = value;
        self
    }

    pub fn with_leveling(
        mut self,
        leveling_resource: impl Into<String>,
        base: f32,
        growth: f32,
        factor: f32,
    ) -> Self {
        self.requires_leveling = true;
        self.leveling_resource = leveling_resource.into();
        self.level_cost_base = base;
        self.level_cost_growth = growth;
        self.level_cost_factor = factor;
        self
    }

    /// Whether this resource can be leveled at all.
    pub fn is_levelable(&self) -> bool {
        self.requires_leveling && !self.leveling_resource.is_empty()
    }

    /// Cost (in `leveling_resource`) to go from `level` to `level + 1`.
    pub fn level_cost(&self, level: u32) -> f32 {
        let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
        (self.level_cost_base * self.level_cost_growth.powi(exponent) * self.level_cost_factor)
            .max(0.0)
    }
}

/// Live quantity of one resource, bounded by its definition's capacity.
///
/// Fields are private: the only way to change `current` is through the
/// ledger, which clamps on every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePool {
    definition: ResourceDefinition,
    current: f32,
    level: u32,
}

impl ResourcePool {
    pub(crate) fn new(definition: ResourceDefinition) -> Self {
        Self {
            definition,
            current: 0.0,
            level: 1,
        }
    }

    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn capacity(&self) -> f32 {
        self.definition.capacity
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// `base_value * level`.
    pub fn value(&self) -> f32 {
        self.definition.base_value * self.level as f32
    }

    /// Fraction of capacity in use (0.0 when capacity is zero).
    pub fn fill_ratio(&self) -> f32 {
        if self.definition.capacity <= 0.0 {
            0.0
        } else {
            (self.current / self.definition.capacity).clamp(0.0, 1.0)
        }
    }

    /// Clamp and store a new quantity. Returns true if it changed.
    pub(crate) fn set_clamped(&mut self, value: f32) -> bool {
        let clamped = clamp_quantity(value, self.definition.capacity);
        let changed = clamped != self.current;
        self.current = clamped;
        changed
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = level.max(1);
    }
}

/// Clamp into `[0, capacity]`, treating NaN as empty.
pub(crate) fn clamp_quantity(value: f32, capacity: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, capacity.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_definition_clamps_negative_capacity() {
        let def = ResourceDefinition::new("Piedra", -5.0);
        assert_eq!(def.capacity, 0.0);
        assert!(!def.is_levelable());
    }

    #[test]
    fn test_level_cost_curve() {
        let def = ResourceDefinition::new("Fe", 100.0).with_leveling("Oro", 5.0, 3.0, 2.0);
        assert_eq!(def.level_cost(1), 10.0);
        assert_eq!(def.level_cost(2), 30.0);
        assert_eq!(def.level_cost(3), 90.0);
        // Level 0 is treated like level 1
        assert_eq!(def.level_cost(0), 10.0);
    }

    #[test]
    fn test_leveling_requires_resource_name() {
        let mut def = ResourceDefinition::new("Fe", 100.0);
        def.requires_leveling = true;
        assert!(!def.is_levelable());
    }

    #[test]
    fn test_pool_clamps() {
        let mut pool = ResourcePool::new(ResourceDefinition::new("Fe", 100.0));
        assert!(pool.set_clamped(150.0));
        assert_eq!(pool.current(), 100.0);
        assert!(pool.set_clamped(-3.0));
        assert_eq!(pool.current(), 0.0);
        assert!(!pool.set_clamped(f32::NAN));
        assert_eq!(pool.current(), 0.0);
    }

    #[test]
    fn test_fill_ratio_zero_capacity() {
        let pool = ResourcePool::new(ResourceDefinition::new("Nada", 0.0));
        assert_eq!(pool.fill_ratio(), 0.0);
    }

    #[test]
    fn test_value_scales_with_level() {
        let mut pool =
            ResourcePool::new(ResourceDefinition::new("Fe", 100.0).with_base_value(2.5));
        assert_eq!(pool.value(), 2.5);
        pool.set_level(3);
        assert_eq!(pool.value(), 7.5);
    }

    #[test]
    fn test_definition_json_defaults() {
        let def: ResourceDefinition =
            serde_json::from_str(r#"{"name":"Madera","capacity":50.0}"#).unwrap();
        assert_eq!(def.level_cost_growth, 1.0);
        assert_eq!(def.level_cost_factor, 1.0);
        assert!(def.leveling_resource.is_empty());
    }
}
