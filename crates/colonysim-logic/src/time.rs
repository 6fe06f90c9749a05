//! Simulated time — sols and millisols, never wall-clock.
//!
//! One sol is 1000 millisols. Every duration in the engine (task durations,
//! inspection windows, cache intervals) is expressed in millisols.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Millisols in one sol.
pub const MILLISOLS_PER_SOL: f64 = 1000.0;

/// A point in simulated time, counted in millisols since the start of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MarsTime {
    total_millisols: f64,
}

impl MarsTime {
    pub const START: Self = Self {
        total_millisols: 0.0,
    };

    pub fn from_millisols(total_millisols: f64) -> Self {
        Self {
            total_millisols: total_millisols.max(0.0),
        }
    }

    pub fn from_sol(sol: u32, millisol: f64) -> Self {
        Self::from_millisols(sol as f64 * MILLISOLS_PER_SOL + millisol)
    }

    pub fn total_millisols(&self) -> f64 {
        self.total_millisols
    }

    /// Zero-based sol number.
    pub fn sol(&self) -> u32 {
        (self.total_millisols / MILLISOLS_PER_SOL) as u32
    }

    /// Millisol within the current sol (0.0..1000.0).
    pub fn millisol(&self) -> f64 {
        self.total_millisols % MILLISOLS_PER_SOL
    }

    /// Whole millisol within the sol.
    pub fn millisol_int(&self) -> u32 {
        self.millisol() as u32
    }

    pub fn add_millisols(&self, amount: f64) -> Self {
        Self::from_millisols(self.total_millisols + amount.max(0.0))
    }

    /// Millisols elapsed from `earlier` to `self` (0 if `earlier` is later).
    pub fn since(&self, earlier: MarsTime) -> f64 {
        (self.total_millisols - earlier.total_millisols).max(0.0)
    }
}

impl fmt::Display for MarsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sol {} {:07.3}", self.sol() + 1, self.millisol())
    }
}

/// One clock tick delivered to the scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClockPulse {
    /// Millisols elapsed since the previous pulse.
    pub elapsed: f64,
    /// Simulated time at the end of this pulse.
    pub time: MarsTime,
    /// True when this pulse crossed into a new sol.
    pub new_sol: bool,
}

impl ClockPulse {
    /// Advance `previous` by `elapsed` millisols.
    pub fn advance(previous: MarsTime, elapsed: f64) -> Self {
        let elapsed = elapsed.max(0.0);
        let time = previous.add_millisols(elapsed);
        Self {
            elapsed,
            time,
            new_sol: time.sol() != previous.sol(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sol_and_millisol() {
        let t = MarsTime::from_sol(2, 250.5);
        assert_eq!(t.sol(), 2);
        assert!((t.millisol() - 250.5).abs() < 1e-9);
        assert_eq!(t.millisol_int(), 250);
    }

    #[test]
    fn pulse_detects_new_sol() {
        let p = ClockPulse::advance(MarsTime::from_millisols(995.0), 10.0);
        assert!(p.new_sol);
        assert_eq!(p.time.sol(), 1);
        let p = ClockPulse::advance(MarsTime::from_millisols(10.0), 10.0);
        assert!(!p.new_sol);
    }

    #[test]
    fn since_never_negative() {
        let a = MarsTime::from_millisols(10.0);
        let b = MarsTime::from_millisols(30.0);
        assert!((b.since(a) - 20.0).abs() < 1e-9);
        assert_eq!(a.since(b), 0.0);
    }

    #[test]
    fn display_format() {
        assert_eq!(MarsTime::from_sol(0, 12.5).to_string(), "Sol 1 012.500");
    }
}
