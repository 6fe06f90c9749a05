//! Malfunction and wear bookkeeping for maintainable entities.
//!
//! Buildings, robots, vehicles and EVA suits carry a [`MalfunctionManager`].
//! Active use wears the entity down and advances its inspection clock;
//! maintenance work resets the clock once a full inspection is done and
//! restores some wear life.

use std::collections::BTreeMap;

use colonysim_logic::maintenance::{adjusted_condition, wear_accident_modifier, MaintenanceRecord};
use colonysim_logic::time::MarsTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Malfunction {
    pub name: String,
    pub triggered: MarsTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalfunctionManager {
    base_wear_lifetime: f64,
    current_wear_lifetime: f64,
    effective_time_since_last_maintenance: f64,
    standard_inspection_window: f64,
    /// Millisols of work for one full inspection.
    base_maintenance_work_time: f64,
    maintenance_work_completed: f64,
    num_maintenances: u32,
    malfunctions: Vec<Malfunction>,
    /// Parts the next inspection needs.
    parts_needed: BTreeMap<String, u32>,
}

impl MalfunctionManager {
    pub fn new(base_wear_lifetime: f64, inspection_window: f64, maintenance_work_time: f64) -> Self {
        Self {
            base_wear_lifetime: base_wear_lifetime.max(1.0),
            current_wear_lifetime: base_wear_lifetime.max(1.0),
            effective_time_since_last_maintenance: 0.0,
            standard_inspection_window: inspection_window.max(1.0),
            base_maintenance_work_time: maintenance_work_time.max(1.0),
            maintenance_work_completed: 0.0,
            num_maintenances: 0,
            malfunctions: Vec::new(),
            parts_needed: BTreeMap::new(),
        }
    }

    pub fn has_malfunction(&self) -> bool {
        !self.malfunctions.is_empty()
    }

    pub fn malfunctions(&self) -> &[Malfunction] {
        &self.malfunctions
    }

    pub fn trigger_malfunction(&mut self, name: impl Into<String>, now: MarsTime) {
        self.malfunctions.push(Malfunction {
            name: name.into(),
            triggered: now,
        });
    }

    /// Clear all malfunctions. Repair work lives outside the scheduler core.
    pub fn repair_all(&mut self) {
        self.malfunctions.clear();
    }

    pub fn effective_time_since_last_maintenance(&self) -> f64 {
        self.effective_time_since_last_maintenance
    }

    pub fn standard_inspection_window(&self) -> f64 {
        self.standard_inspection_window
    }

    pub fn adjusted_condition(&self) -> f64 {
        adjusted_condition(self.current_wear_lifetime, self.base_wear_lifetime)
    }

    /// Accident multiplier from wear: 0 when new, 1 when worn out.
    pub fn accident_modifier(&self) -> f64 {
        wear_accident_modifier(self.adjusted_condition())
    }

    pub fn num_maintenances(&self) -> u32 {
        self.num_maintenances
    }

    pub fn maintenance_work_completed(&self) -> f64 {
        self.maintenance_work_completed
    }

    pub fn base_maintenance_work_time(&self) -> f64 {
        self.base_maintenance_work_time
    }

    /// Work still needed to finish the current inspection.
    pub fn remaining_maintenance_work(&self) -> f64 {
        (self.base_maintenance_work_time - self.maintenance_work_completed).max(0.0)
    }

    /// Active use: the inspection clock runs and wear life drains.
    pub fn active_time_passing(&mut self, time: f64) {
        let time = time.max(0.0);
        self.effective_time_since_last_maintenance += time;
        self.current_wear_lifetime = (self.current_wear_lifetime - time).max(0.0);
    }

    /// Add inspection work. Returns true when this completes an inspection.
    pub fn add_inspection_maint_work_time(&mut self, time: f64, wear_life_per_work: f64) -> bool {
        let time = time.max(0.0);
        self.maintenance_work_completed += time;
        self.current_wear_lifetime = (self.current_wear_lifetime + time * wear_life_per_work.max(0.0))
            .min(self.base_wear_lifetime);
        if self.maintenance_work_completed >= self.base_maintenance_work_time {
            self.maintenance_work_completed = 0.0;
            self.effective_time_since_last_maintenance = 0.0;
            self.num_maintenances += 1;
            true
        } else {
            false
        }
    }

    pub fn parts_needed(&self) -> &BTreeMap<String, u32> {
        &self.parts_needed
    }

    pub fn set_parts_needed(&mut self, part: impl Into<String>, count: u32) {
        if count == 0 {
            self.parts_needed.remove(&part.into());
        } else {
            self.parts_needed.insert(part.into(), count);
        }
    }

    /// Parts were fitted; the list is emptied.
    pub fn take_parts_needed(&mut self) -> BTreeMap<String, u32> {
        std::mem::take(&mut self.parts_needed)
    }

    /// Drain wear life directly (scenario setup and tests).
    pub fn set_condition(&mut self, percent: f64) {
        self.current_wear_lifetime = self.base_wear_lifetime * percent.clamp(0.0, 100.0) / 100.0;
    }
}

impl MaintenanceRecord for MalfunctionManager {
    fn has_malfunction(&self) -> bool {
        MalfunctionManager::has_malfunction(self)
    }

    fn effective_time_since_last_maintenance(&self) -> f64 {
        self.effective_time_since_last_maintenance
    }

    fn standard_inspection_window(&self) -> f64 {
        self.standard_inspection_window
    }

    fn adjusted_condition(&self) -> f64 {
        MalfunctionManager::adjusted_condition(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> MalfunctionManager {
        MalfunctionManager::new(10_000.0, 1_000.0, 50.0)
    }

    #[test]
    fn test_wear_and_clock() {
        let mut m = manager();
        assert_eq!(m.adjusted_condition(), 100.0);
        assert_eq!(m.accident_modifier(), 0.0);
        m.active_time_passing(2_500.0);
        assert_eq!(m.effective_time_since_last_maintenance(), 2_500.0);
        assert!((m.adjusted_condition() - 75.0).abs() < 1e-9);
        assert!((m.accident_modifier() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_inspection_resets_clock() {
        let mut m = manager();
        m.active_time_passing(1_500.0);
        assert!(!m.add_inspection_maint_work_time(30.0, 2.0));
        assert_eq!(m.effective_time_since_last_maintenance(), 1_500.0);
        assert!(m.add_inspection_maint_work_time(20.0, 2.0));
        assert_eq!(m.effective_time_since_last_maintenance(), 0.0);
        assert_eq!(m.num_maintenances(), 1);
        // 1500 drained, 100 restored
        assert!((m.adjusted_condition() - 86.0).abs() < 1e-9);
    }

    #[test]
    fn test_malfunctions() {
        let mut m = manager();
        m.trigger_malfunction("Suit puncture", MarsTime::START);
        assert!(m.has_malfunction());
        assert_eq!(m.malfunctions()[0].name, "Suit puncture");
        m.repair_all();
        assert!(!m.has_malfunction());
    }

    #[test]
    fn test_parts() {
        let mut m = manager();
        m.set_parts_needed("air filter", 2);
        assert_eq!(m.parts_needed().len(), 1);
        let parts = m.take_parts_needed();
        assert_eq!(parts.get("air filter"), Some(&2));
        assert!(m.parts_needed().is_empty());
    }
}
