//! Personal equipment: EVA suits, containers, and what a person has on.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Life support state of an EVA suit. Suit entities also carry a
/// [`MalfunctionManager`](super::MalfunctionManager) and a [`Name`](super::Name).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaSuit {
    /// kg of oxygen in the tank
    pub oxygen: f64,
    pub oxygen_capacity: f64,
    /// kg of drinking and cooling water
    pub water: f64,
    pub water_capacity: f64,
}

impl EvaSuit {
    /// kg of oxygen consumed per millisol outside.
    pub const OXYGEN_RATE: f64 = 0.0009;
    /// kg of water consumed per millisol outside.
    pub const WATER_RATE: f64 = 0.0012;

    pub fn new(oxygen_capacity: f64, water_capacity: f64) -> Self {
        Self {
            oxygen: oxygen_capacity,
            oxygen_capacity,
            water: water_capacity,
            water_capacity,
        }
    }

    pub fn oxygen_fraction(&self) -> f64 {
        if self.oxygen_capacity <= 0.0 {
            return 0.0;
        }
        self.oxygen / self.oxygen_capacity
    }

    pub fn water_fraction(&self) -> f64 {
        if self.water_capacity <= 0.0 {
            return 0.0;
        }
        self.water / self.water_capacity
    }

    /// Consume life support for `time` millisols outside.
    pub fn consume(&mut self, time: f64) {
        let time = time.max(0.0);
        self.oxygen = (self.oxygen - Self::OXYGEN_RATE * time).max(0.0);
        self.water = (self.water - Self::WATER_RATE * time).max(0.0);
    }

    pub fn refill(&mut self) {
        self.oxygen = self.oxygen_capacity;
        self.water = self.water_capacity;
    }
}

impl Default for EvaSuit {
    fn default() -> Self {
        Self::new(1.0, 4.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Large bag for regolith and minerals.
    LargeBag,
    SpecimenBox,
}

/// A container entity. Its contents live in its own [`Storage`](super::Storage).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub kind: ContainerKind,
}

/// What a person is wearing or carrying on their body.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EquipmentInventory {
    pub suit: Option<Entity>,
    pub wearing_garment: bool,
    pub has_thermal_bottle: bool,
}
