//! Settlement-wide preventive maintenance.

use colonysim_logic::maintenance::score_maintenance;
use colonysim_logic::skills::SkillType;
use hecs::Entity;
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use super::{MetaTask, MetaTaskTraits, SettlementMetaTask, SettlementTask, TaskJob, TaskScope, WorkerType};
use crate::components::{Associated, FavoriteActivity, Job, MalfunctionManager, Name, RobotType, Storage};
use crate::context::{SettlementView, TaskContext};
use crate::error::TaskError;
use crate::task::{MaintainEntity, Task};

pub const MAINTENANCE: &str = "Maintenance";

/// Proposes an inspection for every building, vehicle and robot of the
/// settlement that is due, or that has its parts posted.
#[derive(Debug)]
pub struct MaintenanceMeta {
    traits: MetaTaskTraits,
}

impl MaintenanceMeta {
    pub fn new() -> Self {
        Self {
            traits: MetaTaskTraits {
                favorites: vec![FavoriteActivity::Tinkering, FavoriteActivity::Operations],
                skills: vec![SkillType::Mechanics],
                preferred_jobs: vec![Job::Engineer, Job::Technician],
                preferred_robots: vec![RobotType::Repairbot, RobotType::Makerbot],
            },
        }
    }
}

impl Default for MaintenanceMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaTask for MaintenanceMeta {
    fn name(&self) -> &'static str {
        MAINTENANCE
    }

    fn worker_type(&self) -> WorkerType {
        WorkerType::Both
    }

    fn scope(&self) -> TaskScope {
        TaskScope::WorkHour
    }

    fn traits(&self) -> &MetaTaskTraits {
        &self.traits
    }

    fn as_settlement_meta(&self) -> Option<&dyn SettlementMetaTask> {
        Some(self)
    }

    fn create_task(&self, worker: Entity, job: &TaskJob, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError> {
        MaintainEntity::create(worker, job.require_focus()?, ctx)
    }
}

impl SettlementMetaTask for MaintenanceMeta {
    fn settlement_tasks(&self, settlement: Entity, view: SettlementView<'_>, rng: &mut StdRng) -> Vec<SettlementTask> {
        let storage = view.world.get::<&Storage>(settlement).ok();
        let weights = &view.config.maintenance.weights;

        let mut query = view.world.query::<(&Name, &MalfunctionManager, &Associated)>();
        let mut tasks = Vec::new();
        for (entity, (name, manager, associated)) in query.iter() {
            if associated.0 != settlement {
                continue;
            }
            let needed = manager.parts_needed();
            let parts_posted = !needed.is_empty()
                && storage.as_ref().map(|s| s.has_items(needed)).unwrap_or(false);
            // One roll per candidate, whether or not it is used
            let roll: f64 = rng.gen();
            let score = score_maintenance(manager, parts_posted, roll, weights);
            if score.is_zero() {
                continue;
            }
            tasks.push(SettlementTask {
                meta: MAINTENANCE,
                focus: Some(entity),
                description: format!("Maintain {}", name),
                demand: 1,
                eva_needed: false,
                score,
            });
        }
        debug!("{} maintenance candidate(s) at {:?}", tasks.len(), settlement);
        tasks
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::components::{buildings_with_function, BuildingFunction};
    use crate::testing::TestBed;

    #[test]
    fn test_fresh_entities_are_not_candidates() {
        let mut bed = TestBed::new();
        let (settlement, _) = bed.settlement_with_person();
        bed.robot(settlement);
        let mut rng = StdRng::seed_from_u64(1);
        let tasks = MaintenanceMeta::new().settlement_tasks(settlement, bed.view(), &mut rng);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_overdue_entity_always_qualifies() {
        let mut bed = TestBed::new();
        let (settlement, _) = bed.settlement_with_person();
        let robot = bed.robot(settlement);
        {
            let mut manager = bed.world.get::<&mut MalfunctionManager>(robot).unwrap();
            manager.set_condition(80.0);
            manager.active_time_passing(600.0);
        }
        let meta = MaintenanceMeta::new();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tasks = meta.settlement_tasks(settlement, bed.view(), &mut rng);
            assert_eq!(tasks.len(), 1);
            assert_eq!(tasks[0].focus, Some(robot));
            assert!(tasks[0].score.score() > 0.0);
            assert_eq!(tasks[0].description, "Maintain Test Bot");
        }
    }

    #[test]
    fn test_malfunction_excludes() {
        let mut bed = TestBed::new();
        let (settlement, _) = bed.settlement_with_person();
        let shop = buildings_with_function(&bed.world, settlement, BuildingFunction::Workshop)[0];
        {
            let mut manager = bed.world.get::<&mut MalfunctionManager>(shop).unwrap();
            manager.active_time_passing(5000.0);
            manager.trigger_malfunction("Leak", bed.now);
        }
        let mut rng = StdRng::seed_from_u64(3);
        let tasks = MaintenanceMeta::new().settlement_tasks(settlement, bed.view(), &mut rng);
        assert!(tasks.iter().all(|t| t.focus != Some(shop)));
    }

    #[test]
    fn test_posted_parts_double_the_score() {
        let mut bed = TestBed::new();
        let (settlement, _) = bed.settlement_with_person();
        let robot = bed.robot(settlement);
        bed.world
            .get::<&mut MalfunctionManager>(robot)
            .unwrap()
            .set_parts_needed("servo", 1);
        bed.world.get::<&mut Storage>(settlement).unwrap().store_item("servo", 1);

        let mut rng = StdRng::seed_from_u64(5);
        let tasks = MaintenanceMeta::new().settlement_tasks(settlement, bed.view(), &mut rng);
        let task = tasks.iter().find(|t| t.focus == Some(robot)).unwrap();
        assert_eq!(task.score.modifiers()["parts"], 2.0);
    }
}
