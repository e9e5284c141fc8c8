//! Monolito Headless Simulation Harness
//!
//! Validates the economy data and rules without a game engine. Runs
//! entirely in-process with no rendering.
//!
//! Usage:
//!   cargo run -p monolito-simtest
//!   cargo run -p monolito-simtest -- --verbose

use std::sync::Arc;

use monolito_core::config::load_config_str;
use monolito_core::prelude::*;
use monolito_logic::config::EconomyConfig;
use monolito_logic::housing::HousingRegistry;
use monolito_logic::ledger::ResourceLedger;
use monolito_logic::production::{
    GeneratedUnit, GenerationDeclined, TieredProductionBuilding, UpgradeDeclined,
};
use monolito_logic::resources::ResourceDefinition;

// ── Economy config (same JSON the game ships) ───────────────────────────
const ECONOMY_JSON: &str = include_str!("../../../data/economy.json");
const ALTAR: &str = "Altar del Monolito";

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Monolito Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Economy config validation
    let config = match load_config_str(ECONOMY_JSON) {
        Ok(config) => {
            results.push(TestResult::new(
                "config_parse",
                true,
                format!(
                    "{} resources, {} blueprints",
                    config.resources.len(),
                    config.blueprints.len()
                ),
            ));
            Some(config)
        }
        Err(e) => {
            results.push(TestResult::new("config_parse", false, e.to_string()));
            None
        }
    };
    if let Some(config) = &config {
        results.extend(validate_config(config, verbose));
    }

    // 2. Ledger bounds and spend semantics
    results.extend(validate_ledger(verbose));

    // 3. Production cooldown and unit cap
    results.extend(validate_production(verbose));

    // 4. Upgrade gating
    results.extend(validate_upgrades(verbose));

    // 5. First-fit housing
    results.extend(validate_housing(verbose));

    // 6. Full settlement run on the shipped config
    if let Some(config) = &config {
        results.extend(validate_settlement_run(config, verbose));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Economy Config ───────────────────────────────────────────────────

fn validate_config(config: &EconomyConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Economy Config ---");
    let mut results = Vec::new();

    // Starting stock never exceeds capacity
    let overfull: Vec<_> = config
        .starting_stock
        .iter()
        .filter(|(name, amount)| {
            config
                .resources
                .iter()
                .find(|r| &r.name == *name)
                .map_or(true, |r| **amount > r.capacity)
        })
        .map(|(name, _)| name.as_str())
        .collect();
    results.push(TestResult::new(
        "config_stock_within_capacity",
        overfull.is_empty(),
        if overfull.is_empty() {
            "all starting stock fits".to_string()
        } else {
            format!("over capacity or unknown: {:?}", overfull)
        },
    ));

    // A tier that unlocks legendary generation needs a legendary unit
    let missing_legendary: Vec<_> = config
        .blueprints
        .iter()
        .filter(|bp| {
            bp.tiers.iter().any(|t| t.unlocks_legendary_generation)
                && bp.recipe.legendary_unit.is_none()
        })
        .map(|bp| bp.name.as_str())
        .collect();
    results.push(TestResult::new(
        "config_legendary_units",
        missing_legendary.is_empty(),
        format!("{} blueprints unlock legendary without a unit", missing_legendary.len()),
    ));

    // Unit caps never shrink when tiering up
    let shrinking: Vec<_> = config
        .blueprints
        .iter()
        .filter(|bp| {
            bp.tiers
                .windows(2)
                .any(|w| w[1].max_units_at_tier < w[0].max_units_at_tier)
        })
        .map(|bp| bp.name.as_str())
        .collect();
    results.push(TestResult::new(
        "config_caps_monotonic",
        shrinking.is_empty(),
        format!("{} blueprints with shrinking caps", shrinking.len()),
    ));

    if verbose {
        for bp in &config.blueprints {
            let tiers: Vec<_> = bp.tiers.iter().map(|t| t.display_name.as_str()).collect();
            println!("  {}: {}", bp.name, tiers.join(" → "));
        }
    }

    results
}

// ── 2. Ledger ───────────────────────────────────────────────────────────

fn iron_ledger(stock: f32) -> ResourceLedger {
    let mut ledger = match ResourceLedger::new(vec![ResourceDefinition::new("Fe", 100.0)]) {
        Ok(ledger) => ledger,
        Err(e) => panic!("single-resource ledger rejected: {}", e),
    };
    let _ = ledger.add("Fe", stock);
    ledger
}

fn validate_ledger(verbose: bool) -> Vec<TestResult> {
    println!("--- Ledger ---");
    let mut results = Vec::new();

    // Spend succeeds, then overspend drains to zero and reports failure
    let mut ledger = iron_ledger(50.0);
    let first = ledger.spend("Fe", 30.0).unwrap_or(false);
    let after_first = ledger.quantity("Fe");
    let second = ledger.spend("Fe", 50.0).unwrap_or(true);
    let after_second = ledger.quantity("Fe");
    results.push(TestResult::new(
        "ledger_spend_drain",
        first && after_first == 20.0 && !second && after_second == 0.0,
        format!(
            "spend 30 → {} ({}), spend 50 → {} ({})",
            after_first, first, after_second, second
        ),
    ));

    // Quantity stays within [0, capacity] across a sweep
    let mut ledger = iron_ledger(0.0);
    let mut in_bounds = true;
    for step in 0..200 {
        let amount = (step % 37) as f32 * 3.5;
        if step % 3 == 0 {
            let _ = ledger.spend("Fe", amount);
        } else {
            let _ = ledger.add("Fe", amount);
        }
        let q = ledger.quantity("Fe");
        in_bounds &= (0.0..=100.0).contains(&q);
    }
    results.push(TestResult::new(
        "ledger_bounds_sweep",
        in_bounds,
        "200 mixed add/spend steps",
    ));

    // Unknown names are errors, not panics
    let ledger = iron_ledger(10.0);
    results.push(TestResult::new(
        "ledger_unknown_resource",
        !ledger.has_at_least("Mithril", 1.0) && ledger.quantity("Mithril") == 0.0,
        "unknown resource reads as empty",
    ));

    if verbose {
        println!("  Fe fill ratio: {:.2}", ledger.fill_ratio("Fe"));
    }

    results
}

// ── 3. Production ───────────────────────────────────────────────────────

fn simple_altar(config_json: &str) -> Option<(ResourceLedger, TieredProductionBuilding)> {
    let config = load_config_str(config_json).ok()?;
    let ledger = config.build_ledger().ok()?;
    let blueprint = Arc::new(config.blueprint(ALTAR)?.clone());
    let building = TieredProductionBuilding::new(blueprint).ok()?;
    Some((ledger, building))
}

fn validate_production(verbose: bool) -> Vec<TestResult> {
    println!("--- Production ---");
    let mut results = Vec::new();

    let Some((mut ledger, mut altar)) = simple_altar(ECONOMY_JSON) else {
        results.push(TestResult::new("production_setup", false, "altar not buildable"));
        return results;
    };
    let mut spawned: Vec<GeneratedUnit> = Vec::new();

    // No generation before a full interval
    let early = altar.try_generate(&mut ledger, &mut spawned, false);
    results.push(TestResult::new(
        "production_initial_cooldown",
        matches!(early, Err(GenerationDeclined::CoolingDown { .. })),
        format!("{:?}", early.err()),
    ));

    // Generate until the tier cap
    let cap = altar.current_config().map_or(0, |c| c.max_units_at_tier);
    let interval = altar.current_config().map_or(0.0, |c| c.generation_interval);
    for _ in 0..cap {
        altar.advance(interval);
        let _ = altar.try_generate(&mut ledger, &mut spawned, false);
    }
    altar.advance(interval);
    let capped = altar.try_generate(&mut ledger, &mut spawned, false);
    results.push(TestResult::new(
        "production_unit_cap",
        spawned.len() as u32 == cap
            && matches!(capped, Err(GenerationDeclined::UnitCapReached { .. })),
        format!("{} units at cap {}", spawned.len(), cap),
    ));

    // The clock restarted at the last generation
    results.push(TestResult::new(
        "production_cooldown_reset",
        altar.time_since_last_generation() == interval,
        format!("{:.1}s since last", altar.time_since_last_generation()),
    ));

    if verbose {
        for unit in &spawned {
            println!("  {} → {} ({:?})", unit.building, unit.unit_type, unit.variant);
        }
    }

    results
}

// ── 4. Upgrades ─────────────────────────────────────────────────────────

fn validate_upgrades(verbose: bool) -> Vec<TestResult> {
    println!("--- Upgrades ---");
    let mut results = Vec::new();

    let Some((mut ledger, mut altar)) = simple_altar(ECONOMY_JSON) else {
        results.push(TestResult::new("upgrade_setup", false, "altar not buildable"));
        return results;
    };

    // Tools missing: declined, nothing spent
    let before = ledger.snapshot();
    let declined = altar.try_upgrade(&mut ledger);
    results.push(TestResult::new(
        "upgrade_needs_tools",
        matches!(declined, Err(UpgradeDeclined::InsufficientTools(_)))
            && ledger.snapshot() == before
            && altar.current_tier() == 1,
        format!("{:?}", declined),
    ));

    // With tools: upgrade and unlock legendary generation
    let _ = ledger.add("Martillo", 2.0);
    let upgraded = altar.try_upgrade(&mut ledger);
    results.push(TestResult::new(
        "upgrade_unlocks_legendary",
        upgraded == Ok(2) && altar.legendary_generation_unlocked(),
        format!("tier {}", altar.current_tier()),
    ));

    // Climb to the top, topping up as needed
    let _ = ledger.add("Fe", 100.0);
    let _ = ledger.add("Oro", 100.0);
    while !altar.is_max_tier() {
        if altar.try_upgrade(&mut ledger).is_err() {
            break;
        }
    }
    let at_max = altar.try_upgrade(&mut ledger);
    results.push(TestResult::new(
        "upgrade_max_tier",
        altar.is_max_tier() && at_max == Err(UpgradeDeclined::MaxTierReached),
        format!("stopped at tier {}/{}", altar.current_tier(), altar.tier_count()),
    ));

    if verbose {
        for pool in ledger.pools() {
            println!("  {}: {}/{}", pool.name(), pool.current(), pool.capacity());
        }
    }

    results
}

// ── 5. Housing ──────────────────────────────────────────────────────────

fn validate_housing(_verbose: bool) -> Vec<TestResult> {
    println!("--- Housing ---");
    let mut results = Vec::new();

    let mut registry: HousingRegistry<u32, u32> = HousingRegistry::new();
    registry.register(1, 1);
    registry.register(2, 2);
    let _ = registry.move_in(1, 100);
    let _ = registry.move_in(2, 101);
    results.push(TestResult::new(
        "housing_first_fit",
        registry.find_available() == Some(2),
        format!("first free: {:?}", registry.find_available()),
    ));

    let _ = registry.house(102);
    results.push(TestResult::new(
        "housing_full",
        registry.find_available().is_none() && registry.house(103).is_none(),
        format!("{} vacancies", registry.total_vacancies()),
    ));

    registry.move_out(100);
    results.push(TestResult::new(
        "housing_move_out_frees_bed",
        registry.find_available() == Some(1),
        "bed in house 1 freed",
    ));

    results
}

// ── 6. Settlement Run ───────────────────────────────────────────────────

fn validate_settlement_run(config: &EconomyConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Settlement Run ---");
    let mut results = Vec::new();

    let mut settlement = match Settlement::new(config) {
        Ok(s) => s.with_seed(1),
        Err(e) => {
            results.push(TestResult::new("settlement_boot", false, e.to_string()));
            return results;
        }
    };
    let producers: Vec<_> = config
        .blueprints
        .iter()
        .filter_map(|bp| settlement.place_producer(&bp.name).ok())
        .collect();
    settlement.build_house(3);
    settlement.build_house(3);

    // Two minutes of play: generate whenever a button lights up
    for _ in 0..120 {
        settlement.update(1.0);
        for &p in &producers {
            if settlement.interactable(p).map_or(false, |i| i.generate) {
                let _ = settlement.generate(p, true);
            }
        }
    }

    let generated: u32 = producers
        .iter()
        .filter_map(|&p| settlement.producer_status(p))
        .map(|s| s.units_generated)
        .sum();
    results.push(TestResult::new(
        "settlement_units_match_villagers",
        generated as usize == settlement.villager_count() && generated > 0,
        format!("{} generated, {} villagers", generated, settlement.villager_count()),
    ));

    let housed: usize = settlement
        .housing
        .iter()
        .map(|(_, entry)| entry.occupants().len())
        .sum();
    results.push(TestResult::new(
        "settlement_housing_accounted",
        housed + settlement.homeless().len() == settlement.villager_count() && housed <= 6,
        format!("{} housed, {} homeless", housed, settlement.homeless().len()),
    ));

    let in_bounds = settlement
        .ledger
        .pools()
        .all(|p| p.current() >= 0.0 && p.current() <= p.capacity());
    results.push(TestResult::new(
        "settlement_ledger_bounds",
        in_bounds,
        "every pool within [0, capacity]",
    ));

    // Save and load into a fresh settlement
    let mut buffer = Vec::new();
    let round_trip = match (settlement.save(&mut buffer), Settlement::new(config)) {
        (Ok(()), Ok(mut restored)) => restored
            .load(&buffer[..])
            .map(|_| restored)
            .map_err(|e| e.to_string()),
        (Err(e), _) => Err(e.to_string()),
        (_, Err(e)) => Err(e.to_string()),
    };
    match round_trip {
        Ok(restored) => results.push(TestResult::new(
            "settlement_save_load",
            restored.villager_count() == settlement.villager_count()
                && restored.ledger.snapshot() == settlement.ledger.snapshot(),
            format!("{} bytes", buffer.len()),
        )),
        Err(e) => results.push(TestResult::new("settlement_save_load", false, e)),
    }

    if verbose {
        match serde_json::to_string_pretty(&settlement.ledger.snapshot()) {
            Ok(json) => println!("  Final ledger:\n{}", json),
            Err(e) => println!("  Final ledger unavailable: {}", e),
        }
        for &p in &producers {
            if let Some(status) = settlement.producer_status(p) {
                println!(
                    "  {} [{}] tier {} ({}), {} units",
                    status.name, status.tier_name, status.tier, p.id(), status.units_generated
                );
            }
        }
        println!("  Legendary villagers: {}", settlement.legendary_count());
    }

    results
}
