//! Worker components: persons and robots.
//!
//! Every worker entity carries a [`WorkerKind`] plus a
//! [`SkillProfile`](colonysim_logic::skills::SkillProfile),
//! [`NaturalAttributes`](colonysim_logic::skills::NaturalAttributes), a
//! [`Location`](super::Location), a [`Name`](super::Name) and a
//! [`Storage`](super::Storage) for carried equipment. Persons additionally
//! carry [`PhysicalCondition`] and [`EquipmentInventory`](super::EquipmentInventory).

use colonysim_logic::time::MarsTime;
use serde::{Deserialize, Serialize};

/// Person or robot, with the data only that kind has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerKind {
    Person {
        shift: Shift,
        job: Job,
        favorite: FavoriteActivity,
    },
    Robot {
        robot_type: RobotType,
    },
}

impl WorkerKind {
    pub fn is_person(&self) -> bool {
        matches!(self, WorkerKind::Person { .. })
    }

    pub fn is_robot(&self) -> bool {
        matches!(self, WorkerKind::Robot { .. })
    }

    /// Robots never go off duty.
    pub fn is_on_duty(&self, time: MarsTime) -> bool {
        match self {
            WorkerKind::Person { shift, .. } => shift.is_on_duty(time.millisol()),
            WorkerKind::Robot { .. } => true,
        }
    }
}

/// Work shift within a sol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    /// 000-500 millisols
    A,
    /// 500-1000 millisols
    B,
    /// On call all sol
    OnCall,
}

impl Shift {
    pub fn is_on_duty(&self, millisol: f64) -> bool {
        match self {
            Shift::A => millisol < 500.0,
            Shift::B => millisol >= 500.0,
            Shift::OnCall => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Job {
    Engineer,
    Technician,
    Areologist,
    Geologist,
    Botanist,
    Doctor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotType {
    Repairbot,
    Makerbot,
    Deliverybot,
    Gardenbot,
}

/// Broad activity categories a person enjoys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FavoriteActivity {
    FieldWork,
    Tinkering,
    Lounging,
    Operations,
}

/// Fatigue (0-1000) and stress (0-100) of a person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalCondition {
    pub fatigue: f64,
    pub stress: f64,
}

impl PhysicalCondition {
    pub const MAX_FATIGUE: f64 = 1000.0;
    pub const MAX_STRESS: f64 = 100.0;

    pub fn add_fatigue(&mut self, amount: f64) {
        self.fatigue = (self.fatigue + amount).clamp(0.0, Self::MAX_FATIGUE);
    }

    pub fn add_stress(&mut self, amount: f64) {
        self.stress = (self.stress + amount).clamp(0.0, Self::MAX_STRESS);
    }

    /// Work performance 0.0-1.0. Drops once fatigue passes 500 or stress passes 70.
    pub fn performance(&self) -> f64 {
        let tired = ((self.fatigue - 500.0) / 500.0).clamp(0.0, 1.0);
        let stressed = ((self.stress - 70.0) / 30.0).clamp(0.0, 1.0);
        ((1.0 - tired) * (1.0 - stressed)).clamp(0.0, 1.0)
    }

    pub fn is_super_unfit(&self) -> bool {
        self.fatigue >= 900.0 || self.stress >= 95.0
    }
}
