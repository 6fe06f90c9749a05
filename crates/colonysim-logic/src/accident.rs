//! Accident-chance arithmetic.
//!
//! Chances are percentages per millisol. Skilled workers have fewer
//! accidents: at skill 3 the base chance applies unchanged, below it the
//! chance grows linearly, above it the chance shrinks hyperbolically. The
//! result is scaled by the equipment's accident modifier (worn equipment
//! fails more often).

/// Skill-adjusted accident chance in percent per millisol.
pub fn accident_chance(base_chance: f64, skill: f64, modifier: f64) -> f64 {
    let skill = skill.max(0.0);
    let mut chance = base_chance.max(0.0);
    if skill <= 3.0 {
        chance *= 4.0 - skill;
    } else {
        chance /= skill - 2.0;
    }
    chance * modifier.max(0.0)
}

/// True when an accident happens over `time` millisols.
///
/// `roll` is uniform in `[0, 1)`.
pub fn accident_occurs(chance: f64, time: f64, roll: f64) -> bool {
    let percent = chance * time.max(0.0);
    percent > 0.0 && roll * 100.0 < percent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_three_is_neutral() {
        assert!((accident_chance(0.01, 3.0, 1.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn chance_decreases_with_skill() {
        let mut last = f64::MAX;
        for skill in 0..10 {
            let c = accident_chance(0.01, skill as f64, 1.0);
            assert!(c < last, "skill {} not safer", skill);
            last = c;
        }
    }

    #[test]
    fn modifier_scales() {
        let a = accident_chance(0.01, 1.0, 1.0);
        let b = accident_chance(0.01, 1.0, 0.5);
        assert!((a - 2.0 * b).abs() < 1e-12);
        assert_eq!(accident_chance(0.01, 1.0, 0.0), 0.0);
    }

    #[test]
    fn occurs_against_roll() {
        // 0.5% chance over 10 millisols = 5%
        assert!(accident_occurs(0.5, 10.0, 0.04));
        assert!(!accident_occurs(0.5, 10.0, 0.06));
        assert!(!accident_occurs(0.0, 10.0, 0.0));
        assert!(!accident_occurs(0.5, 0.0, 0.0));
    }
}
