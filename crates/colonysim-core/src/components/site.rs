//! Surface sites worked during EVA.
//!
//! Site entities carry a [`Coordinates`](super::Coordinates), a
//! [`Name`](super::Name) and an [`Associated`](super::Associated) settlement
//! alongside one of the components below.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::storage::Resource;

/// A claimed mining site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiningSite {
    /// Mineral share of excavated material, 0.0-1.0 per mineral.
    pub concentrations: BTreeMap<Resource, f64>,
    /// kg of ore left in the deposit.
    pub remaining: f64,
    /// Mined but not yet collected, kg per mineral.
    pub excavated: BTreeMap<Resource, f64>,
}

impl MiningSite {
    pub fn new(remaining: f64) -> Self {
        Self {
            remaining: remaining.max(0.0),
            ..Default::default()
        }
    }

    pub fn with_mineral(mut self, mineral: Resource, concentration: f64) -> Self {
        self.concentrations.insert(mineral, concentration.clamp(0.0, 1.0));
        self
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn total_excavated(&self) -> f64 {
        self.excavated.values().sum()
    }

    /// Dig up to `mass` kg. Each mineral receives its concentration share.
    /// Returns the ore mass actually removed from the deposit.
    pub fn excavate(&mut self, mass: f64) -> f64 {
        let mass = mass.max(0.0).min(self.remaining);
        self.remaining -= mass;
        for (mineral, share) in &self.concentrations {
            *self.excavated.entry(*mineral).or_insert(0.0) += mass * share;
        }
        mass
    }

    /// Take up to `mass` kg of an excavated mineral off the pile.
    pub fn take_excavated(&mut self, mineral: Resource, mass: f64) -> f64 {
        let Some(pile) = self.excavated.get_mut(&mineral) else {
            return 0.0;
        };
        let taken = mass.max(0.0).min(*pile);
        *pile -= taken;
        if *pile <= f64::EPSILON {
            self.excavated.remove(&mineral);
        }
        taken
    }

    /// The mineral with the largest excavated pile.
    pub fn largest_pile(&self) -> Option<Resource> {
        self.excavated
            .iter()
            .filter(|(_, m)| **m > 0.0)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(r, _)| *r)
    }
}

/// A site waiting to be explored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSite {
    /// Millisols of exploration done.
    pub time_explored: f64,
    /// Millisols needed for a full survey.
    pub survey_time: f64,
    pub explored: bool,
    /// Estimate certainty 0-100 per mineral.
    pub certainty: BTreeMap<Resource, f64>,
}

impl ExplorationSite {
    pub fn new(survey_time: f64, minerals: &[Resource]) -> Self {
        Self {
            survey_time: survey_time.max(1.0),
            certainty: minerals.iter().map(|m| (*m, 0.0)).collect(),
            ..Default::default()
        }
    }

    pub fn progress(&self) -> f64 {
        (self.time_explored / self.survey_time).clamp(0.0, 1.0)
    }

    /// Record `time` millisols of survey work with a skill-driven `quality`
    /// (0.0-1.0). Returns true once the survey completes.
    pub fn survey(&mut self, time: f64, quality: f64) -> bool {
        if self.explored {
            return true;
        }
        self.time_explored += time.max(0.0);
        let gain = time.max(0.0) / self.survey_time * 100.0 * quality.clamp(0.1, 1.0);
        for certainty in self.certainty.values_mut() {
            *certainty = (*certainty + gain).min(100.0);
        }
        if self.time_explored >= self.survey_time {
            self.explored = true;
        }
        self.explored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excavate_splits_by_concentration() {
        let mut site = MiningSite::new(100.0)
            .with_mineral(Resource::Hematite, 0.5)
            .with_mineral(Resource::Olivine, 0.25);
        assert_eq!(site.excavate(40.0), 40.0);
        assert_eq!(site.excavated[&Resource::Hematite], 20.0);
        assert_eq!(site.excavated[&Resource::Olivine], 10.0);
        assert_eq!(site.largest_pile(), Some(Resource::Hematite));
        assert_eq!(site.excavate(100.0), 60.0);
        assert!(site.is_depleted());
    }

    #[test]
    fn test_take_excavated() {
        let mut site = MiningSite::new(10.0).with_mineral(Resource::Gypsum, 1.0);
        site.excavate(10.0);
        assert_eq!(site.take_excavated(Resource::Gypsum, 4.0), 4.0);
        assert_eq!(site.take_excavated(Resource::Gypsum, 40.0), 6.0);
        assert_eq!(site.largest_pile(), None);
    }

    #[test]
    fn test_survey() {
        let mut site = ExplorationSite::new(100.0, &[Resource::Magnetite]);
        assert!(!site.survey(50.0, 1.0));
        assert!((site.progress() - 0.5).abs() < 1e-9);
        assert!(site.survey(50.0, 1.0));
        assert_eq!(site.certainty[&Resource::Magnetite], 100.0);
    }
}
