//! Explicit context handed to tasks and meta tasks.
//!
//! There is no global state: the world, clock, surface model, RNG, config
//! and registries reach every task through a [`TaskContext`], and every meta
//! task through a read-only [`SettlementView`].

use colonysim_logic::config::SimulationConfig;
use colonysim_logic::time::MarsTime;
use hecs::{Entity, World};
use rand::rngs::StdRng;

use crate::manager::SettlementCaches;
use crate::meta::MetaTaskRegistry;
use crate::surface::SurfaceFeatures;

/// Mutable access for one worker's turn within a tick.
pub struct TaskContext<'a> {
    pub world: &'a mut World,
    pub registry: &'a MetaTaskRegistry,
    pub settlements: &'a mut SettlementCaches,
    pub surface: &'a dyn SurfaceFeatures,
    pub rng: &'a mut StdRng,
    pub config: &'a SimulationConfig,
    pub now: MarsTime,
}

impl<'a> TaskContext<'a> {
    /// Read-only view plus the RNG, for candidate generation.
    pub fn view_and_rng(&mut self) -> (SettlementView<'_>, &mut StdRng) {
        (
            SettlementView {
                world: &*self.world,
                surface: self.surface,
                config: self.config,
                now: self.now,
            },
            &mut *self.rng,
        )
    }

    pub fn view(&self) -> SettlementView<'_> {
        SettlementView {
            world: &*self.world,
            surface: self.surface,
            config: self.config,
            now: self.now,
        }
    }

    /// A settlement's candidates changed (new malfunction, finished inspection).
    pub fn mark_settlement_dirty(&mut self, settlement: Entity) {
        self.settlements.mark_dirty(settlement);
    }
}

/// Read-only access for meta tasks.
#[derive(Clone, Copy)]
pub struct SettlementView<'a> {
    pub world: &'a World,
    pub surface: &'a dyn SurfaceFeatures,
    pub config: &'a SimulationConfig,
    pub now: MarsTime,
}
