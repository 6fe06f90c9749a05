//! Skills, natural attributes, and experience gain from task work.
//!
//! Skills are integer levels backed by accumulated experience points. The
//! points required for the next level double with every level, so a worker
//! improves quickly at first and slowly once experienced.
//!
//! Tasks describe how they train a worker with an [`ExperienceImpact`]:
//! which skills are exercised, how many millisols of work make one
//! experience point, which natural attribute governs learning speed and how
//! physically demanding the work is.
//!
//! ```
//! use colonysim_logic::config::SkillConfig;
//! use colonysim_logic::skills::*;
//!
//! let impact = ExperienceImpact::new(100.0, NaturalAttributeType::ExperienceAptitude)
//!     .with_skill(SkillType::EvaOperations);
//! let mut profile = SkillProfile::default();
//! let attrs = NaturalAttributes::default();
//! let gain = impact.apply(&mut profile, &attrs, 50.0, &SkillConfig::default());
//! assert!(gain.points > 0.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SkillConfig;

/// Skill categories used by colony tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillType {
    EvaOperations,
    Mechanics,
    Materials,
    Areology,
    Prospecting,
    Piloting,
}

impl SkillType {
    pub const ALL: [SkillType; 6] = [
        SkillType::EvaOperations,
        SkillType::Mechanics,
        SkillType::Materials,
        SkillType::Areology,
        SkillType::Prospecting,
        SkillType::Piloting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SkillType::EvaOperations => "EVA Operations",
            SkillType::Mechanics => "Mechanics",
            SkillType::Materials => "Materials Science",
            SkillType::Areology => "Areology",
            SkillType::Prospecting => "Prospecting",
            SkillType::Piloting => "Piloting",
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One skill: current level and experience toward the next level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub level: u32,
    pub experience: f64,
}

/// Points required to advance from `level` to `level + 1`.
pub fn points_for_next_level(level: u32, config: &SkillConfig) -> f64 {
    config.base_level_points * 2f64.powi(level.min(30) as i32)
}

/// Skill levels of a worker. Missing skills are level 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    skills: BTreeMap<SkillType, Skill>,
}

impl SkillProfile {
    /// Profile with the given starting levels.
    pub fn with_levels(levels: &[(SkillType, u32)]) -> Self {
        let mut profile = Self::default();
        for (skill, level) in levels {
            profile.set_level(*skill, *level);
        }
        profile
    }

    pub fn level(&self, skill: SkillType) -> u32 {
        self.skills.get(&skill).map(|s| s.level).unwrap_or(0)
    }

    pub fn experience(&self, skill: SkillType) -> f64 {
        self.skills.get(&skill).map(|s| s.experience).unwrap_or(0.0)
    }

    pub fn set_level(&mut self, skill: SkillType, level: u32) {
        let entry = self.skills.entry(skill).or_default();
        entry.level = level;
        entry.experience = 0.0;
    }

    /// Average level over `skills` (0 when `skills` is empty).
    pub fn average_level(&self, skills: &[SkillType]) -> f64 {
        if skills.is_empty() {
            return 0.0;
        }
        let sum: u32 = skills.iter().map(|s| self.level(*s)).sum();
        sum as f64 / skills.len() as f64
    }

    /// Add experience points to a skill, levelling up as thresholds are met.
    ///
    /// Returns the number of levels gained.
    pub fn add_experience(&mut self, skill: SkillType, points: f64, config: &SkillConfig) -> u32 {
        if !points.is_finite() || points <= 0.0 {
            return 0;
        }
        let entry = self.skills.entry(skill).or_default();
        entry.experience += points;
        let mut gained = 0;
        loop {
            let needed = points_for_next_level(entry.level, config);
            if needed <= 0.0 || entry.experience < needed || entry.level >= config.max_level {
                break;
            }
            entry.experience -= needed;
            entry.level += 1;
            gained += 1;
        }
        gained
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillType, &Skill)> {
        self.skills.iter().map(|(k, v)| (*k, v))
    }
}

/// Innate attributes on a 0–100 scale (50 is average).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NaturalAttributeType {
    ExperienceAptitude,
    Strength,
    Agility,
    Endurance,
    StressResilience,
    Teaching,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NaturalAttributes {
    values: BTreeMap<NaturalAttributeType, u32>,
}

impl NaturalAttributes {
    pub const AVERAGE: u32 = 50;

    pub fn with(mut self, attr: NaturalAttributeType, value: u32) -> Self {
        self.values.insert(attr, value.min(100));
        self
    }

    pub fn get(&self, attr: NaturalAttributeType) -> u32 {
        self.values.get(&attr).copied().unwrap_or(Self::AVERAGE)
    }

    /// Modifier in `[-0.5, 0.5]` derived from an attribute.
    pub fn modifier(&self, attr: NaturalAttributeType) -> f64 {
        (self.get(attr) as f64 - Self::AVERAGE as f64) / 100.0
    }
}

/// How physically demanding a piece of work is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicalEffort {
    #[default]
    None,
    Low,
    High,
}

impl PhysicalEffort {
    /// Fatigue added per millisol of work.
    pub fn fatigue_rate(&self) -> f64 {
        match self {
            PhysicalEffort::None => 0.0,
            PhysicalEffort::Low => 0.05,
            PhysicalEffort::High => 0.15,
        }
    }
}

/// How a task trains the worker performing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceImpact {
    pub skills: Vec<SkillType>,
    /// Millisols of work per experience point.
    pub skill_ratio: f64,
    pub aptitude: NaturalAttributeType,
    pub effort: PhysicalEffort,
    /// Stress added per millisol of work.
    pub stress_rate: f64,
}

/// Result of applying an [`ExperienceImpact`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceGain {
    /// Total points distributed over all skills.
    pub points: f64,
    pub levels_gained: u32,
    pub stress: f64,
    pub fatigue: f64,
}

impl ExperienceImpact {
    pub fn new(skill_ratio: f64, aptitude: NaturalAttributeType) -> Self {
        Self {
            skills: Vec::new(),
            skill_ratio,
            aptitude,
            effort: PhysicalEffort::None,
            stress_rate: 0.0,
        }
    }

    /// An impact that trains nothing.
    pub fn none() -> Self {
        Self::new(0.0, NaturalAttributeType::ExperienceAptitude)
    }

    pub fn with_skill(mut self, skill: SkillType) -> Self {
        if !self.skills.contains(&skill) {
            self.skills.push(skill);
        }
        self
    }

    pub fn with_effort(mut self, effort: PhysicalEffort) -> Self {
        self.effort = effort;
        self
    }

    pub fn with_stress(mut self, stress_rate: f64) -> Self {
        self.stress_rate = stress_rate;
        self
    }

    /// Average level of the exercised skills, as an effective task skill.
    pub fn effective_skill(&self, profile: &SkillProfile) -> f64 {
        profile.average_level(&self.skills)
    }

    /// Apply `time` millisols of work to `profile`.
    ///
    /// Points = `time / skill_ratio`, scaled by `1 + aptitude modifier`, split
    /// evenly over the skills and reduced at higher levels.
    pub fn apply(
        &self,
        profile: &mut SkillProfile,
        attributes: &NaturalAttributes,
        time: f64,
        config: &SkillConfig,
    ) -> ExperienceGain {
        let mut gain = ExperienceGain {
            stress: self.stress_rate * time.max(0.0),
            fatigue: self.effort.fatigue_rate() * time.max(0.0),
            ..Default::default()
        };
        if time <= 0.0 || self.skill_ratio <= 0.0 || self.skills.is_empty() {
            return gain;
        }

        let base = time / self.skill_ratio;
        let aptitude = 1.0 + attributes.modifier(self.aptitude);
        let share = base * aptitude / self.skills.len() as f64;

        for skill in &self.skills {
            let level = profile.level(*skill);
            let points = share * diminishing_factor(level, config);
            gain.points += points;
            gain.levels_gained += profile.add_experience(*skill, points, config);
        }
        gain
    }
}

/// Learning slows as a skill improves: `1 / (1 + level × rate)`.
pub fn diminishing_factor(level: u32, config: &SkillConfig) -> f64 {
    1.0 / (1.0 + level as f64 * config.diminishing_per_level.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SkillConfig {
        SkillConfig::default()
    }

    #[test]
    fn level_up_doubles_threshold() {
        let c = config();
        assert!((points_for_next_level(1, &c) - 2.0 * points_for_next_level(0, &c)).abs() < 1e-9);

        let mut p = SkillProfile::default();
        let gained = p.add_experience(SkillType::Mechanics, points_for_next_level(0, &c), &c);
        assert_eq!(gained, 1);
        assert_eq!(p.level(SkillType::Mechanics), 1);
    }

    #[test]
    fn missing_skill_is_zero() {
        let p = SkillProfile::default();
        assert_eq!(p.level(SkillType::Areology), 0);
        assert_eq!(p.average_level(&[]), 0.0);
    }

    #[test]
    fn experience_is_positive() {
        let impact = ExperienceImpact::new(10.0, NaturalAttributeType::ExperienceAptitude)
            .with_skill(SkillType::Prospecting);
        let mut p = SkillProfile::default();
        let gain = impact.apply(&mut p, &NaturalAttributes::default(), 20.0, &config());
        assert!((gain.points - 2.0).abs() < 1e-9);
        assert!(p.experience(SkillType::Prospecting) > 0.0);
    }

    #[test]
    fn aptitude_boosts_gain() {
        let impact = ExperienceImpact::new(10.0, NaturalAttributeType::ExperienceAptitude)
            .with_skill(SkillType::Prospecting);
        let quick = NaturalAttributes::default().with(NaturalAttributeType::ExperienceAptitude, 90);
        let slow = NaturalAttributes::default().with(NaturalAttributeType::ExperienceAptitude, 10);
        let a = impact.apply(&mut SkillProfile::default(), &quick, 10.0, &config());
        let b = impact.apply(&mut SkillProfile::default(), &slow, 10.0, &config());
        assert!(a.points > b.points);
        assert!(b.points > 0.0);
    }

    #[test]
    fn high_skill_learns_slower() {
        let impact = ExperienceImpact::new(10.0, NaturalAttributeType::ExperienceAptitude)
            .with_skill(SkillType::Mechanics);
        let attrs = NaturalAttributes::default();
        let mut novice = SkillProfile::default();
        let mut expert = SkillProfile::with_levels(&[(SkillType::Mechanics, 6)]);
        let a = impact.apply(&mut novice, &attrs, 10.0, &config());
        let b = impact.apply(&mut expert, &attrs, 10.0, &config());
        assert!(a.points > b.points);
    }

    #[test]
    fn no_skills_no_points_but_effort_counts() {
        let impact = ExperienceImpact::none().with_effort(PhysicalEffort::High);
        let gain = impact.apply(
            &mut SkillProfile::default(),
            &NaturalAttributes::default(),
            10.0,
            &config(),
        );
        assert_eq!(gain.points, 0.0);
        assert!(gain.fatigue > 0.0);
    }
}
