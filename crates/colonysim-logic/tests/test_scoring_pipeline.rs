//! Integration tests across the pure scheduling pieces.
//!
//! Exercises: MaintenanceRecord → score_maintenance → RatingScore
//! → weighted_index, the same path the engine's task cache takes.

use colonysim_logic::config::SimulationConfig;
use colonysim_logic::maintenance::{score_maintenance, MaintenanceRecord};
use colonysim_logic::rating::{RatingScore, ZERO_RATING};
use colonysim_logic::selection::weighted_index;

// ── Helpers ────────────────────────────────────────────────────────────

struct Equipment {
    effective: f64,
    condition: f64,
    broken: bool,
}

impl MaintenanceRecord for Equipment {
    fn has_malfunction(&self) -> bool {
        self.broken
    }
    fn effective_time_since_last_maintenance(&self) -> f64 {
        self.effective
    }
    fn standard_inspection_window(&self) -> f64 {
        1000.0
    }
    fn adjusted_condition(&self) -> f64 {
        self.condition
    }
}

fn candidates(roll: f64) -> Vec<RatingScore> {
    let config = SimulationConfig::default();
    let fleet = [
        Equipment { effective: 0.0, condition: 100.0, broken: false },
        Equipment { effective: 2000.0, condition: 90.0, broken: false },
        Equipment { effective: 3000.0, condition: 10.0, broken: true },
        Equipment { effective: 1200.0, condition: 50.0, broken: false },
    ];
    fleet
        .iter()
        .map(|e| score_maintenance(e, false, roll, &config.maintenance.weights))
        .collect()
}

// ── Pipeline tests ─────────────────────────────────────────────────────

#[test]
fn only_due_healthy_equipment_is_selectable() {
    let scores = candidates(0.9);
    assert!(scores[0].is_zero());
    assert!(scores[1].score() > 0.0);
    assert!(scores[2].is_excluded());
    assert!(scores[3].score() > 0.0);

    let weights: Vec<f64> = scores.iter().map(RatingScore::score).collect();
    for i in 0..50 {
        let pick = weighted_index(&weights, i as f64 / 50.0).unwrap();
        assert!(pick == 1 || pick == 3);
    }
}

#[test]
fn selection_follows_score_mass() {
    let scores = candidates(0.0);
    let weights: Vec<f64> = scores.iter().map(RatingScore::score).collect();
    let total: f64 = weights.iter().sum();

    let n = 20_000;
    let mut hits = vec![0usize; weights.len()];
    for i in 0..n {
        let roll = (i as f64 + 0.5) / n as f64;
        hits[weighted_index(&weights, roll).unwrap()] += 1;
    }
    for (w, h) in weights.iter().zip(&hits) {
        let expected = w / total;
        assert!((*h as f64 / n as f64 - expected).abs() < 0.01);
    }
}

#[test]
fn zero_rating_never_wins() {
    let weights = [ZERO_RATING.score(), 0.0, RatingScore::new("x", 1.0).score()];
    assert_eq!(weighted_index(&weights, 0.0), Some(2));
    assert_eq!(weighted_index(&weights, 0.999), Some(2));
}
