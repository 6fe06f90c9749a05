//! Maintenance scoring and wear arithmetic.
//!
//! The scheduler only ever sees equipment through [`MaintenanceRecord`], a
//! read-only view of the malfunction bookkeeping. [`score_maintenance`]
//! turns one record into a candidate rating:
//!
//! * an active malfunction excludes the entity (repair is another task);
//! * `f = effective_time / inspection_window` measures how due it is;
//! * posted parts always qualify and double the score;
//! * otherwise the entity qualifies when `roll < sqrt(min(f, 1))`, so an
//!   overdue entity always qualifies and a freshly inspected one never does.

use serde::{Deserialize, Serialize};

use crate::rating::{RatingScore, ZERO_RATING};

/// Read-only view of an entity's maintenance state.
pub trait MaintenanceRecord {
    fn has_malfunction(&self) -> bool;

    /// Active millisols since the last completed inspection.
    fn effective_time_since_last_maintenance(&self) -> f64;

    /// Millisols between routine inspections.
    fn standard_inspection_window(&self) -> f64;

    /// Condition in percent (100 = as new).
    fn adjusted_condition(&self) -> f64;
}

/// Weights for [`score_maintenance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceWeights {
    /// Flat base every qualifying entity gets.
    pub base: f64,
    /// Per percent of lost condition.
    pub condition_weight: f64,
    /// Per unit of window fraction.
    pub inspection_weight: f64,
    /// Modifier applied when parts are posted.
    pub parts_modifier: f64,
}

impl Default for MaintenanceWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            condition_weight: 0.2,
            inspection_weight: 10.0,
            parts_modifier: 2.0,
        }
    }
}

/// Fraction of the inspection window elapsed. A non-positive window counts as overdue.
pub fn window_fraction(effective_time: f64, window: f64) -> f64 {
    if window <= 0.0 {
        return 1.0;
    }
    (effective_time / window).max(0.0)
}

/// Rate a maintenance candidate. `roll` is uniform in `[0, 1)`.
pub fn score_maintenance(
    record: &dyn MaintenanceRecord,
    parts_posted: bool,
    roll: f64,
    weights: &MaintenanceWeights,
) -> RatingScore {
    if record.has_malfunction() {
        return ZERO_RATING;
    }

    let effective = record.effective_time_since_last_maintenance();
    let f = window_fraction(effective, record.standard_inspection_window());

    if !parts_posted && (effective <= 0.0 || roll >= f.min(1.0).sqrt()) {
        return ZERO_RATING;
    }

    let condition = (100.0 - record.adjusted_condition()).clamp(0.0, 100.0);
    let mut score = RatingScore::new("maintenance", weights.base);
    score.add_base("condition", condition * weights.condition_weight);
    score.add_base("inspection", f * weights.inspection_weight);
    if parts_posted {
        score.add_modifier("parts", weights.parts_modifier);
    }
    score
}

/// Condition in percent: remaining wear life over its nominal span.
pub fn adjusted_condition(current_wear_life: f64, base_wear_life: f64) -> f64 {
    if base_wear_life <= 0.0 {
        return 0.0;
    }
    (current_wear_life / base_wear_life * 100.0).clamp(0.0, 100.0)
}

/// Multiplier for accident chances on worn equipment: `(100 − condition) / 100`.
pub fn wear_accident_modifier(condition_percent: f64) -> f64 {
    ((100.0 - condition_percent) / 100.0).clamp(0.0, 1.0)
}
