//! ColonySim Headless Simulation Harness
//!
//! Drives the scheduler end to end from a scenario file and checks the
//! properties every run must hold. Runs entirely in-process, no rendering.
//!
//! Usage:
//!   cargo run -p colonysim-simtest
//!   cargo run -p colonysim-simtest -- --verbose

use std::collections::BTreeMap;

use colonysim_core::manager::ActivityRecord;
use colonysim_core::meta::{TaskJob, RELAX};
use colonysim_core::prelude::*;
use colonysim_logic::config::SimulationConfig;
use colonysim_logic::maintenance::{score_maintenance, MaintenanceRecord, MaintenanceWeights};
use colonysim_logic::rating::{RatingScore, ZERO_RATING};

// ── Scenario (same JSON a host would load) ──────────────────────────────
const SCENARIO_JSON: &str = include_str!("../../../data/schiaparelli.json");

/// Tick length and run length for the colony checks
const TICK: f64 = 2.0;
const RUN_TICKS: usize = 1500;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== ColonySim Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Scenario data validation
    let scenario = match validate_scenario(&mut results) {
        Some(s) => s,
        None => {
            report(&results, verbose);
            std::process::exit(1);
        }
    };

    // 2. Rating law
    results.extend(validate_rating_law(verbose));

    // 3. Maintenance scoring sweep
    results.extend(validate_maintenance_scoring(verbose));

    // 4. Task execution bounds
    results.extend(validate_task_bounds(&scenario, verbose));

    // 5. Whole-colony run
    results.extend(validate_colony_run(&scenario, verbose));

    // 6. Determinism
    results.extend(validate_determinism(&scenario, verbose));

    if !report(&results, verbose) {
        std::process::exit(1);
    }
}

/// Print the summary. Returns true when everything passed.
fn report(results: &[TestResult], verbose: bool) -> bool {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );
    failed == 0
}

// ── 1. Scenario ─────────────────────────────────────────────────────────

fn validate_scenario(results: &mut Vec<TestResult>) -> Option<ScenarioConfig> {
    println!("--- Scenario ---");

    let scenario = match ScenarioConfig::from_json(SCENARIO_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "scenario_parse".into(),
                passed: false,
                detail: format!("scenario rejected: {}", e),
            });
            return None;
        }
    };

    results.push(TestResult {
        name: "scenario_workers".into(),
        passed: scenario.crew + scenario.robots > 0,
        detail: format!("{} crew, {} robot(s)", scenario.crew, scenario.robots),
    });

    results.push(TestResult {
        name: "scenario_sites".into(),
        passed: !scenario.mining_sites.is_empty(),
        detail: format!(
            "{} mining site(s), {} exploration site(s)",
            scenario.mining_sites.len(),
            scenario.exploration_sites.len()
        ),
    });

    // Hosts save scenarios back out; the saved form must load again
    let reloaded = serde_json::to_string(&scenario)
        .map_err(|e| e.to_string())
        .and_then(|json| ScenarioConfig::from_json(&json).map_err(|e| e.to_string()));
    results.push(TestResult {
        name: "scenario_reload".into(),
        passed: reloaded
            .as_ref()
            .map_or(false, |s| s.crew == scenario.crew && s.mining_sites.len() == scenario.mining_sites.len()),
        detail: match &reloaded {
            Ok(_) => "saved scenario loads again".into(),
            Err(e) => e.clone(),
        },
    });

    let mut bad = scenario.clone();
    bad.oxygen = bad.cargo_capacity * 2.0;
    results.push(TestResult {
        name: "scenario_overfull_rejected".into(),
        passed: bad.validate().is_err(),
        detail: "stores above capacity are refused".into(),
    });

    let mut bad_config = SimulationConfig::default();
    bad_config.scheduler.task_cache_interval = -5.0;
    results.push(TestResult {
        name: "config_negative_interval_rejected".into(),
        passed: bad_config.validate().is_err(),
        detail: "negative cache interval is refused".into(),
    });

    Some(scenario)
}

// ── 2. Rating law ───────────────────────────────────────────────────────

fn validate_rating_law(verbose: bool) -> Vec<TestResult> {
    println!("--- Rating Law ---");
    let mut results = Vec::new();

    let score = RatingScore::new("base", 10.0)
        .with_base("extra", 5.0)
        .with_modifier("skill", 1.2)
        .with_modifier("job", 1.5);
    let expected = 15.0 * 1.2 * 1.5;
    if verbose {
        println!("  {:?} = {:.3}", score.bases(), score.score());
    }
    results.push(TestResult {
        name: "rating_bases_times_modifiers".into(),
        passed: (score.score() - expected).abs() < 1e-9,
        detail: format!("score {:.3}, expected {:.3}", score.score(), expected),
    });

    let negative = RatingScore::new("base", 2.0)
        .with_base("penalty", -5.0)
        .with_modifier("boost", 3.0);
    results.push(TestResult {
        name: "rating_negative_bases_clamp".into(),
        passed: negative.score() == 0.0,
        detail: format!("clamped score {}", negative.score()),
    });

    results.push(TestResult {
        name: "rating_zero_excluded".into(),
        passed: ZERO_RATING.is_zero() && ZERO_RATING.is_excluded(),
        detail: "ZERO_RATING never enters a cache".into(),
    });

    results
}

// ── 3. Maintenance scoring ──────────────────────────────────────────────

struct Record {
    malfunction: bool,
    effective: f64,
    condition: f64,
}

impl MaintenanceRecord for Record {
    fn has_malfunction(&self) -> bool {
        self.malfunction
    }
    fn effective_time_since_last_maintenance(&self) -> f64 {
        self.effective
    }
    fn standard_inspection_window(&self) -> f64 {
        500.0
    }
    fn adjusted_condition(&self) -> f64 {
        self.condition
    }
}

fn validate_maintenance_scoring(verbose: bool) -> Vec<TestResult> {
    println!("--- Maintenance Scoring ---");
    let mut results = Vec::new();
    let weights = MaintenanceWeights::default();
    let rolls: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();

    let fresh = Record {
        malfunction: false,
        effective: 0.0,
        condition: 100.0,
    };
    let fresh_hits = rolls
        .iter()
        .filter(|r| !score_maintenance(&fresh, false, **r, &weights).is_zero())
        .count();
    results.push(TestResult {
        name: "maintenance_fresh_never_due".into(),
        passed: fresh_hits == 0,
        detail: format!("{} of {} rolls qualified", fresh_hits, rolls.len()),
    });

    let overdue = Record {
        malfunction: false,
        effective: 600.0,
        condition: 60.0,
    };
    let overdue_hits = rolls
        .iter()
        .filter(|r| !score_maintenance(&overdue, false, **r, &weights).is_zero())
        .count();
    results.push(TestResult {
        name: "maintenance_overdue_always_due".into(),
        passed: overdue_hits == rolls.len(),
        detail: format!("{} of {} rolls qualified", overdue_hits, rolls.len()),
    });

    // Half the window: qualifies when roll < sqrt(0.5)
    let half = Record {
        malfunction: false,
        effective: 250.0,
        condition: 90.0,
    };
    let half_hits = rolls
        .iter()
        .filter(|r| !score_maintenance(&half, false, **r, &weights).is_zero())
        .count();
    if verbose {
        println!("  half window: {} / {} rolls", half_hits, rolls.len());
    }
    results.push(TestResult {
        name: "maintenance_probability_curve".into(),
        passed: (70..=72).contains(&half_hits),
        detail: format!("{} of {} rolls at half window", half_hits, rolls.len()),
    });

    let broken = Record {
        malfunction: true,
        effective: 600.0,
        condition: 10.0,
    };
    results.push(TestResult {
        name: "maintenance_malfunction_excluded".into(),
        passed: score_maintenance(&broken, true, 0.0, &weights).is_zero(),
        detail: "malfunctioning entities are left to repair".into(),
    });

    let posted = score_maintenance(&fresh, true, 0.99, &weights);
    results.push(TestResult {
        name: "maintenance_parts_posted".into(),
        passed: !posted.is_zero() && posted.modifiers().contains_key("parts"),
        detail: format!("score with parts posted {:.2}", posted.score()),
    });

    results
}

// ── 4. Task execution bounds ────────────────────────────────────────────

fn validate_task_bounds(scenario: &ScenarioConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Task Execution ---");
    let mut results = Vec::new();

    let mut engine = match ColonyEngine::from_scenario(scenario) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult {
                name: "engine_create".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };
    let Some(person) = engine.layout().and_then(|l| l.crew.first().copied()) else {
        results.push(TestResult {
            name: "task_bounds_worker".into(),
            passed: false,
            detail: "scenario has no crew".into(),
        });
        return results;
    };

    let probe = engine.with_context(|ctx| -> Result<Vec<(f64, f64)>, TaskError> {
        let job = TaskJob::new(RELAX, "Probe break", RatingScore::new("probe", 1.0));
        let mut task = job.create_task(person, ctx)?;
        let mut spent = Vec::new();
        for time in [0.0, 0.25, 3.0, 17.5, 40.0, 120.0] {
            spent.push((time, task.perform_task(time, ctx)?));
        }
        task.end_task(TaskOutcome::Cancelled("Probe over".into()), ctx)?;
        Ok(spent)
    });

    match probe {
        Ok(spent) => {
            if verbose {
                for (time, left) in &spent {
                    println!("  perform({:.2}) left {:.3}", time, left);
                }
            }
            let out_of_bounds = spent
                .iter()
                .filter(|(time, left)| *left < 0.0 || *left > *time)
                .count();
            results.push(TestResult {
                name: "task_remaining_time_bounded".into(),
                passed: out_of_bounds == 0,
                detail: format!("{} of {} calls out of [0, time]", out_of_bounds, spent.len()),
            });
        }
        Err(e) => results.push(TestResult {
            name: "task_remaining_time_bounded".into(),
            passed: false,
            detail: format!("probe task failed: {}", e),
        }),
    }

    results
}

// ── 5. Colony run ───────────────────────────────────────────────────────

fn validate_colony_run(scenario: &ScenarioConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Colony Run ---");
    let mut results = Vec::new();

    let mut engine = match ColonyEngine::from_scenario(scenario) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult {
                name: "engine_create".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let mut tick_error = None;
    let mut wrong_owner = 0;
    let mut over_capacity = 0;
    let mut over_demand = 0;

    for tick in 0..RUN_TICKS {
        if let Err(e) = engine.update(TICK) {
            tick_error = Some(format!("tick {}: {}", tick, e));
            break;
        }

        for worker in engine.workers() {
            let Some(manager) = engine.manager(*worker) else {
                continue;
            };
            if let Some(task) = manager.current_task() {
                if task.worker() != *worker {
                    wrong_owner += 1;
                }
            }
        }

        for (_, storage) in engine.world.query::<&Storage>().iter() {
            if storage.stored_mass() > storage.cargo_capacity + 1e-6 {
                over_capacity += 1;
            }
        }

        if let Some(settlement) = engine.layout().and_then(|l| l.settlement) {
            if let Some(cache) = engine.settlements().get(settlement) {
                over_demand += cache
                    .tasks()
                    .iter()
                    .filter_map(|t| t.focus.map(|f| (f, t.demand)))
                    .filter(|(focus, demand)| engine.settlements().claims(*focus) > *demand)
                    .count();
            }
        }
    }

    if verbose {
        let mut by_task: BTreeMap<&str, usize> = BTreeMap::new();
        for worker in engine.workers() {
            if let Some(manager) = engine.manager(*worker) {
                for record in manager.activity_log() {
                    *by_task.entry(record.task.as_str()).or_insert(0) += 1;
                }
            }
        }
        for (name, count) in by_task {
            println!("  {:<24} {} activity record(s)", name, count);
        }
        for worker in engine.workers() {
            if let Ok(summary) = engine.task_summary(*worker) {
                println!("  {}", summary);
            }
        }
    }

    results.push(TestResult {
        name: "colony_run_completes".into(),
        passed: tick_error.is_none(),
        detail: tick_error.unwrap_or_else(|| format!("{} ticks to {}", RUN_TICKS, engine.time())),
    });

    results.push(TestResult {
        name: "colony_one_task_per_worker".into(),
        passed: wrong_owner == 0,
        detail: format!("{} task(s) held by the wrong worker", wrong_owner),
    });

    results.push(TestResult {
        name: "colony_capacity_respected".into(),
        passed: over_capacity == 0,
        detail: format!("{} over-capacity observation(s)", over_capacity),
    });

    results.push(TestResult {
        name: "colony_demand_respected".into(),
        passed: over_demand == 0,
        detail: format!("{} focus(es) over demand", over_demand),
    });

    let inspections: u32 = engine
        .world
        .query::<&MalfunctionManager>()
        .iter()
        .map(|(_, m)| m.num_maintenances())
        .sum();
    results.push(TestResult {
        name: "colony_maintenance_done".into(),
        passed: inspections > 0,
        detail: format!("{} inspection(s) completed", inspections),
    });

    let busy_workers = engine
        .workers()
        .iter()
        .filter(|w| {
            engine
                .manager(**w)
                .map_or(false, |m| m.activity_log().next().is_some())
        })
        .count();
    results.push(TestResult {
        name: "colony_workers_active".into(),
        passed: busy_workers > 0,
        detail: format!("{} of {} worker(s) did something", busy_workers, engine.workers().len()),
    });

    results
}

// ── 6. Determinism ──────────────────────────────────────────────────────

fn run_history(scenario: &ScenarioConfig, ticks: usize) -> Result<Vec<Vec<ActivityRecord>>, EngineError> {
    let mut engine = ColonyEngine::from_scenario(scenario)?;
    for _ in 0..ticks {
        engine.update(TICK)?;
    }
    Ok(engine
        .workers()
        .iter()
        .map(|w| {
            engine
                .manager(*w)
                .map(|m| m.activity_log().cloned().collect())
                .unwrap_or_default()
        })
        .collect())
}

fn validate_determinism(scenario: &ScenarioConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();

    let first = run_history(scenario, RUN_TICKS / 3);
    let second = run_history(scenario, RUN_TICKS / 3);
    match (first, second) {
        (Ok(a), Ok(b)) => {
            let records: usize = a.iter().map(|h| h.len()).sum();
            if verbose {
                println!("  {} activity record(s) compared", records);
            }
            results.push(TestResult {
                name: "determinism_same_seed".into(),
                passed: a == b,
                detail: format!("{} activity record(s) across {} worker(s)", records, a.len()),
            });
        }
        (Err(e), _) | (_, Err(e)) => results.push(TestResult {
            name: "determinism_same_seed".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    let mut reseeded = scenario.clone();
    reseeded.simulation.seed = scenario.simulation.seed.wrapping_add(1);
    match (run_history(scenario, RUN_TICKS / 3), run_history(&reseeded, RUN_TICKS / 3)) {
        (Ok(a), Ok(b)) => results.push(TestResult {
            name: "determinism_seed_matters".into(),
            passed: a != b,
            detail: "a different seed gives a different history".into(),
        }),
        (Err(e), _) | (_, Err(e)) => results.push(TestResult {
            name: "determinism_seed_matters".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    results
}
