//! Weighted random selection over scored candidates.
//!
//! Selection is proportional: a candidate with score `s` out of a total
//! mass `T` is picked with probability `s / T`. Zero (and negative) weights
//! are never picked. The caller supplies the uniform roll so this stays a
//! pure function.

/// Pick an index from `weights` using a uniform `roll` in `[0, 1)`.
///
/// Returns `None` when no weight is positive.
pub fn weighted_index(weights: &[f64], roll: f64) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }

    let mut target = roll.clamp(0.0, 1.0) * total;
    let mut last_positive = None;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        if target < *w {
            return Some(i);
        }
        target -= *w;
        last_positive = Some(i);
    }
    // Floating point leftovers (roll of ~1.0) land on the last positive weight
    last_positive
}
