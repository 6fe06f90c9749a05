//! Composable utility ratings for candidate tasks.
//!
//! A [`RatingScore`] is built from named *base* components and named
//! *modifiers*. The composition law is fixed for the whole engine:
//!
//! ```text
//! score = max(0, Σ bases) × Π modifiers
//! ```
//!
//! Bases accumulate additively (a flat maintenance base plus a condition
//! penalty, for example) and modifiers scale the total (a skill match of
//! `1.4`, a "parts posted" doubling of `2.0`). Negative modifiers are
//! clamped to zero so a score is never negative.
//!
//! [`ZERO_RATING`] marks "not applicable": its score is always zero and any
//! attempt to add components to it is ignored.
//!
//! ```
//! use colonysim_logic::rating::RatingScore;
//!
//! let mut score = RatingScore::new("maintenance", 10.0);
//! score.add_base("condition", 5.0);
//! score.add_modifier("parts", 2.0);
//! assert!((score.score() - 30.0).abs() < 1e-9);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Named base plus named modifiers. See the module docs for the composition law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingScore {
    bases: BTreeMap<String, f64>,
    modifiers: BTreeMap<String, f64>,
    /// Set only on [`ZERO_RATING`] and its clones.
    excluded: bool,
}

/// The "not applicable" rating. Never selected.
pub const ZERO_RATING: RatingScore = RatingScore {
    bases: BTreeMap::new(),
    modifiers: BTreeMap::new(),
    excluded: true,
};

impl RatingScore {
    /// Create a rating with a single named base value.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        let mut bases = BTreeMap::new();
        bases.insert(name.into(), value);
        Self {
            bases,
            modifiers: BTreeMap::new(),
            excluded: false,
        }
    }

    /// An empty, applicable rating (score 0 until a base is added).
    pub fn empty() -> Self {
        Self {
            bases: BTreeMap::new(),
            modifiers: BTreeMap::new(),
            excluded: false,
        }
    }

    /// Add (or replace) a named base component.
    pub fn add_base(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        if !self.excluded && value.is_finite() {
            self.bases.insert(name.into(), value);
        }
        self
    }

    /// Add (or replace) a named multiplicative modifier.
    pub fn add_modifier(&mut self, name: impl Into<String>, factor: f64) -> &mut Self {
        if !self.excluded && factor.is_finite() {
            self.modifiers.insert(name.into(), factor.max(0.0));
        }
        self
    }

    /// Builder-style [`add_base`](Self::add_base).
    pub fn with_base(mut self, name: impl Into<String>, value: f64) -> Self {
        self.add_base(name, value);
        self
    }

    /// Builder-style [`add_modifier`](Self::add_modifier).
    pub fn with_modifier(mut self, name: impl Into<String>, factor: f64) -> Self {
        self.add_modifier(name, factor);
        self
    }

    /// Sum of all base components, before modifiers.
    pub fn base_total(&self) -> f64 {
        self.bases.values().sum()
    }

    /// The combined rating. Always `>= 0`.
    pub fn score(&self) -> f64 {
        if self.excluded {
            return 0.0;
        }
        let base = self.base_total().max(0.0);
        let product: f64 = self.modifiers.values().product();
        base * product
    }

    /// True for [`ZERO_RATING`] and for any rating whose score works out to zero.
    pub fn is_zero(&self) -> bool {
        self.score() <= 0.0
    }

    /// True only for the distinguished "not applicable" rating.
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub fn bases(&self) -> &BTreeMap<String, f64> {
        &self.bases
    }

    pub fn modifiers(&self) -> &BTreeMap<String, f64> {
        &self.modifiers
    }

    /// Apply all modifiers of `other` on top of this rating.
    ///
    /// Used when a worker-specific suitability assessment refines a
    /// settlement-wide candidate score. An excluded `other` excludes the result.
    pub fn merge_modifiers(&self, other: &RatingScore) -> RatingScore {
        if self.excluded || other.excluded {
            return ZERO_RATING;
        }
        let mut merged = self.clone();
        for (name, factor) in &other.modifiers {
            merged.add_modifier(name.clone(), *factor);
        }
        for (name, value) in &other.bases {
            merged.add_base(name.clone(), *value);
        }
        merged
    }
}

impl Default for RatingScore {
    fn default() -> Self {
        ZERO_RATING
    }
}

impl fmt::Display for RatingScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.excluded {
            return write!(f, "0 (n/a)");
        }
        write!(f, "{:.2} (", self.score())?;
        let mut first = true;
        for (name, value) in &self.bases {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:.2}", name, value)?;
            first = false;
        }
        for (name, factor) in &self.modifiers {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: x{:.2}", name, factor)?;
            first = false;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rating_is_zero() {
        assert_eq!(ZERO_RATING.score(), 0.0);
        assert!(ZERO_RATING.is_zero());
        assert!(ZERO_RATING.is_excluded());
    }

    #[test]
    fn zero_rating_ignores_mutation() {
        let mut r = ZERO_RATING;
        r.add_base("base", 100.0);
        r.add_modifier("boost", 5.0);
        assert_eq!(r.score(), 0.0);
        assert!(r.bases().is_empty());
    }

    #[test]
    fn bases_add_modifiers_multiply() {
        let r = RatingScore::new("a", 4.0)
            .with_base("b", 6.0)
            .with_modifier("x", 2.0)
            .with_modifier("y", 0.5);
        assert!((r.score() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn same_name_replaces() {
        let r = RatingScore::new("a", 4.0).with_base("a", 1.0);
        assert!((r.score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn never_negative() {
        let r = RatingScore::new("a", -5.0);
        assert_eq!(r.score(), 0.0);
        let r = RatingScore::new("a", 5.0).with_modifier("neg", -3.0);
        assert_eq!(r.score(), 0.0);
    }

    #[test]
    fn merge_applies_modifiers() {
        let base = RatingScore::new("maint", 10.0);
        let fit = RatingScore::empty().with_modifier("skill", 1.5);
        assert!((base.merge_modifiers(&fit).score() - 15.0).abs() < 1e-9);
        assert!(base.merge_modifiers(&ZERO_RATING).is_excluded());
    }

    #[test]
    fn display_lists_components() {
        let r = RatingScore::new("base", 2.0).with_modifier("parts", 2.0);
        let text = r.to_string();
        assert!(text.starts_with("4.00"));
        assert!(text.contains("parts: x2.00"));
    }
}
