//! Excavating ore at a claimed mining site.

use colonysim_logic::skills::{ExperienceImpact, NaturalAttributeType, PhysicalEffort, SkillType};
use hecs::Entity;
use log::info;

use super::{EvaOperation, EvaWork, Task, TaskOutcome, TaskPhase, TaskState};
use crate::components::{name_of, Coordinates, MiningSite};
use crate::context::TaskContext;
use crate::error::TaskError;

pub const MINING: TaskPhase = TaskPhase::new("Mining");

/// kg of ore per millisol for an unskilled worker.
const BASE_EXCAVATION_RATE: f64 = 0.5;

/// Digs ore out of a [`MiningSite`] onto its excavated piles.
#[derive(Debug)]
pub struct MineSite {
    site: Entity,
    coordinates: Coordinates,
    excavated: f64,
}

impl MineSite {
    pub fn create(worker: Entity, site: Entity, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError> {
        let coordinates = *ctx
            .world
            .get::<&Coordinates>(site)
            .map_err(|_| TaskError::missing(site, "Coordinates"))?;
        let depleted = ctx
            .world
            .get::<&MiningSite>(site)
            .map_err(|_| TaskError::missing(site, "MiningSite"))?
            .is_depleted();
        if depleted {
            return Err(TaskError::precondition("mining site is depleted"));
        }

        let impact = ExperienceImpact::new(10.0, NaturalAttributeType::Strength)
            .with_skill(SkillType::Prospecting)
            .with_effort(PhysicalEffort::High);
        let state = TaskState::new("Mine Site", worker, impact, ctx.world, ctx.now)
            .with_description(format!("Mining at {}", name_of(ctx.world, site)));
        let work = Self {
            site,
            coordinates,
            excavated: 0.0,
        };
        EvaOperation::create(state, work, ctx)
    }

    pub fn site_entity(&self) -> Entity {
        self.site
    }

    /// kg of ore dug so far.
    pub fn excavated(&self) -> f64 {
        self.excavated
    }
}

impl EvaWork for MineSite {
    fn site_phase(&self) -> TaskPhase {
        MINING
    }

    fn site(&self) -> Coordinates {
        self.coordinates
    }

    fn perform_work(
        &mut self,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError> {
        let rate = BASE_EXCAVATION_RATE * (1.0 + 0.25 * state.effective_skill());
        let (mined, depleted) = {
            let mut site = ctx
                .world
                .get::<&mut MiningSite>(self.site)
                .map_err(|_| TaskError::missing(self.site, "MiningSite"))?;
            let mined = site.excavate(rate * time);
            (mined, site.is_depleted())
        };
        self.excavated += mined;

        if depleted {
            info!("{} is worked out", name_of(ctx.world, self.site));
            state.end(TaskOutcome::Completed);
        }
        let used = if rate > 0.0 { (mined / rate).min(time) } else { time };
        Ok(time - used)
    }
}
