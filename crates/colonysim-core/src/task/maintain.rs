//! Preventive maintenance on a building, vehicle or robot.

use std::any::Any;

use colonysim_logic::skills::{ExperienceImpact, NaturalAttributeType, PhysicalEffort, SkillType};
use hecs::Entity;
use log::{debug, info};

use super::{Task, TaskBehavior, TaskOutcome, TaskPhase, TaskState};
use crate::components::{
    name_of, occupy_activity_spot, set_place, Building, BuildingFunction, Location,
    MalfunctionManager, Place, Storage,
};
use crate::context::TaskContext;
use crate::error::TaskError;

pub const MAINTAIN: TaskPhase = TaskPhase::new("Maintain");

/// Inspects an entity's malfunction manager until the inspection is done.
///
/// Buildings are worked on in place; anything else is brought to a free
/// workshop spot. Parts posted for the inspection are fitted first.
#[derive(Debug)]
pub struct MaintainEntity {
    entity: Entity,
    settlement: Entity,
    parts_fitted: bool,
    work_done: f64,
}

impl MaintainEntity {
    pub fn create(worker: Entity, entity: Entity, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError> {
        if worker == entity {
            return Err(TaskError::precondition("cannot maintain itself"));
        }
        let location = *ctx
            .world
            .get::<&Location>(worker)
            .map_err(|_| TaskError::missing(worker, "Location"))?;
        if location.is_outside() {
            return Err(TaskError::precondition("worker is outside"));
        }
        {
            let manager = ctx
                .world
                .get::<&MalfunctionManager>(entity)
                .map_err(|_| TaskError::missing(entity, "MalfunctionManager"))?;
            if manager.has_malfunction() {
                return Err(TaskError::precondition("entity has a malfunction"));
            }
        }

        let is_building = ctx.world.get::<&Building>(entity).is_ok();
        if is_building {
            set_place(ctx.world, worker, Place::Building(entity))?;
        } else {
            occupy_activity_spot(ctx.world, location.settlement, BuildingFunction::Workshop, worker)?;
        }

        let impact = ExperienceImpact::new(100.0, NaturalAttributeType::ExperienceAptitude)
            .with_skill(SkillType::Mechanics)
            .with_effort(PhysicalEffort::Low);
        let state = TaskState::new("Maintenance", worker, impact, ctx.world, ctx.now)
            .with_description(format!("Maintaining {}", name_of(ctx.world, entity)))
            .with_phase(MAINTAIN);
        Ok(Task::new(
            state,
            Self {
                entity,
                settlement: location.settlement,
                parts_fitted: false,
                work_done: 0.0,
            },
        ))
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Millisols of inspection work credited so far.
    pub fn work_done(&self) -> f64 {
        self.work_done
    }

    /// Take the posted parts out of settlement storage. Ends the task if
    /// they are not all there.
    fn fit_parts(&mut self, state: &mut TaskState, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let needed = ctx
            .world
            .get::<&MalfunctionManager>(self.entity)
            .map_err(|_| TaskError::missing(self.entity, "MalfunctionManager"))?
            .parts_needed()
            .clone();
        if !needed.is_empty() {
            let mut storage = ctx
                .world
                .get::<&mut Storage>(self.settlement)
                .map_err(|_| TaskError::missing(self.settlement, "Storage"))?;
            if !storage.has_items(&needed) {
                drop(storage);
                state.end(TaskOutcome::Cancelled("Parts not available".into()));
                return Ok(());
            }
            for (part, count) in &needed {
                storage.retrieve_item(part, *count);
            }
            drop(storage);
            ctx.world
                .get::<&mut MalfunctionManager>(self.entity)
                .map_err(|_| TaskError::missing(self.entity, "MalfunctionManager"))?
                .take_parts_needed();
            debug!(
                "{} fitted {} part type(s) to {}",
                name_of(ctx.world, state.worker()),
                needed.len(),
                name_of(ctx.world, self.entity)
            );
        }
        self.parts_fitted = true;
        Ok(())
    }

    fn maintain(&mut self, state: &mut TaskState, ctx: &mut TaskContext<'_>, time: f64) -> Result<f64, TaskError> {
        let (malfunction, remaining) = {
            let manager = ctx
                .world
                .get::<&MalfunctionManager>(self.entity)
                .map_err(|_| TaskError::missing(self.entity, "MalfunctionManager"))?;
            (manager.has_malfunction(), manager.remaining_maintenance_work())
        };
        if malfunction {
            state.end(TaskOutcome::Cancelled("Malfunction occurred".into()));
            return Ok(time);
        }
        if !self.parts_fitted {
            self.fit_parts(state, ctx)?;
            if state.is_ending() {
                return Ok(time);
            }
        }

        // Unskilled workers go at half speed
        let factor = 0.5 + 0.25 * state.effective_skill();
        let (used, work) = if time * factor >= remaining {
            (remaining / factor, remaining)
        } else {
            (time, time * factor)
        };

        let wear_per_work = ctx.config.maintenance.wear_life_per_work;
        let completed = ctx
            .world
            .get::<&mut MalfunctionManager>(self.entity)
            .map_err(|_| TaskError::missing(self.entity, "MalfunctionManager"))?
            .add_inspection_maint_work_time(work, wear_per_work);
        self.work_done += work;

        state.add_experience(used, ctx)?;
        let base_chance = ctx.config.maintenance.base_accident_chance;
        state.check_for_accident(self.entity, used, base_chance, ctx)?;

        if completed {
            info!(
                "{} finished inspecting {}",
                name_of(ctx.world, state.worker()),
                name_of(ctx.world, self.entity)
            );
            ctx.mark_settlement_dirty(self.settlement);
            state.end(TaskOutcome::Completed);
        }
        Ok(time - used)
    }
}

impl TaskBehavior for MaintainEntity {
    fn perform_phase(
        &mut self,
        phase: TaskPhase,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError> {
        if phase == MAINTAIN {
            self.maintain(state, ctx, time)
        } else {
            Err(state.unknown_phase(phase))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
