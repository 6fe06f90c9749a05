//! Surveying a candidate site for minerals.

use colonysim_logic::skills::{ExperienceImpact, NaturalAttributeType, PhysicalEffort, SkillType};
use hecs::Entity;
use log::info;

use super::{EvaOperation, EvaWork, Task, TaskOutcome, TaskPhase, TaskState};
use crate::components::{name_of, settlement_of, Coordinates, ExplorationSite};
use crate::context::TaskContext;
use crate::error::TaskError;

pub const EXPLORING: TaskPhase = TaskPhase::new("Exploring");

#[derive(Debug)]
pub struct ExploreSite {
    site: Entity,
    coordinates: Coordinates,
}

impl ExploreSite {
    pub fn create(worker: Entity, site: Entity, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError> {
        let coordinates = *ctx
            .world
            .get::<&Coordinates>(site)
            .map_err(|_| TaskError::missing(site, "Coordinates"))?;
        let explored = ctx
            .world
            .get::<&ExplorationSite>(site)
            .map_err(|_| TaskError::missing(site, "ExplorationSite"))?
            .explored;
        if explored {
            return Err(TaskError::precondition("site already explored"));
        }

        let impact = ExperienceImpact::new(10.0, NaturalAttributeType::ExperienceAptitude)
            .with_skill(SkillType::Areology)
            .with_skill(SkillType::Prospecting)
            .with_effort(PhysicalEffort::Low);
        let state = TaskState::new("Explore Site", worker, impact, ctx.world, ctx.now)
            .with_description(format!("Exploring {}", name_of(ctx.world, site)));
        EvaOperation::create(state, Self { site, coordinates }, ctx)
    }

    pub fn site_entity(&self) -> Entity {
        self.site
    }
}

impl EvaWork for ExploreSite {
    fn site_phase(&self) -> TaskPhase {
        EXPLORING
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
        let quality = (0.5 + 0.1 * state.effective_skill()).min(1.0);
        let complete = ctx
            .world
            .get::<&mut ExplorationSite>(self.site)
            .map_err(|_| TaskError::missing(self.site, "ExplorationSite"))?
            .survey(time, quality);

        if complete {
            info!("{} has been surveyed", name_of(ctx.world, self.site));
            if let Some(settlement) = settlement_of(ctx.world, self.site) {
                ctx.mark_settlement_dirty(settlement);
            }
            state.end(TaskOutcome::Completed);
        }
        Ok(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Resource;
    use crate::generation::spawn_exploration_site;
    use crate::testing::TestBed;

    #[test]
    fn test_survey_completes() {
        let mut bed = TestBed::new();
        let (settlement, worker) = bed.settlement_with_person();
        let site = spawn_exploration_site(
            &mut bed.world,
            settlement,
            "Crater rim",
            Coordinates::new(0.2, 0.0),
            ExplorationSite::new(40.0, &[Resource::Gypsum]),
        );
        let mut ctx = bed.ctx();
        let mut task = ExploreSite::create(worker, site, &mut ctx).unwrap();
        for _ in 0..20 {
            task.perform_task(10.0, &mut ctx).unwrap();
        }

        assert_eq!(task.outcome(), Some(&TaskOutcome::Completed));
        let surveyed = bed.world.get::<&ExplorationSite>(site).unwrap();
        assert!(surveyed.explored);
        assert!(surveyed.certainty[&Resource::Gypsum] > 0.0);
        drop(surveyed);
        assert!(bed.settlements.is_dirty(settlement));

        let mut ctx = bed.ctx();
        assert!(ExploreSite::create(worker, site, &mut ctx).is_err());
    }
}
