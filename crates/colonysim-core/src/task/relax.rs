//! Off-duty downtime.

use std::any::Any;

use colonysim_logic::skills::ExperienceImpact;
use hecs::Entity;
use rand::Rng;

use super::{add_experience, Task, TaskBehavior, TaskPhase, TaskState};
use crate::components::{
    occupy_activity_spot, BuildingFunction, Location, PhysicalCondition,
};
use crate::context::TaskContext;
use crate::error::TaskError;

pub const RELAXING: TaskPhase = TaskPhase::new("Relaxing");

const STRESS_RELIEF_RATE: f64 = 0.1;
const FATIGUE_RELIEF_RATE: f64 = 0.2;

/// Relax for a while, in a lounge when a seat is free.
#[derive(Debug)]
pub struct Relax {
    relief: ExperienceImpact,
}

impl Relax {
    pub fn create(worker: Entity, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError> {
        if ctx.world.get::<&PhysicalCondition>(worker).is_err() {
            return Err(TaskError::precondition("only persons relax"));
        }
        let location = *ctx
            .world
            .get::<&Location>(worker)
            .map_err(|_| TaskError::missing(worker, "Location"))?;
        if location.is_outside() {
            return Err(TaskError::precondition("worker is outside"));
        }
        match occupy_activity_spot(ctx.world, location.settlement, BuildingFunction::Recreation, worker) {
            Ok(_) | Err(TaskError::Precondition(_)) => {}
            Err(e) => return Err(e),
        }

        let duration = ctx.rng.gen_range(20.0..60.0);
        let state = TaskState::new("Relax", worker, ExperienceImpact::none(), ctx.world, ctx.now)
            .with_duration(duration)
            .with_phase(RELAXING);
        let relief = ExperienceImpact::none().with_stress(-STRESS_RELIEF_RATE);
        Ok(Task::new(state, Self { relief }))
    }
}

impl TaskBehavior for Relax {
    fn perform_phase(
        &mut self,
        phase: TaskPhase,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError> {
        if phase != RELAXING {
            return Err(state.unknown_phase(phase));
        }
        let worker = state.worker();
        add_experience(ctx, worker, &self.relief, time)?;
        if let Ok(mut condition) = ctx.world.get::<&mut PhysicalCondition>(worker) {
            condition.add_fatigue(-FATIGUE_RELIEF_RATE * time);
        }
        Ok(0.0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
