//! Meta tasks: factories that propose and build tasks.
//!
//! A [`MetaTask`] knows which workers it suits ([`WorkerType`], [`TaskScope`])
//! and how to turn a chosen [`TaskJob`] into a running [`Task`]. Per-worker
//! factories (relaxing) propose jobs directly through
//! [`MetaTask::worker_jobs`]. Settlement-wide factories implement
//! [`SettlementMetaTask`]: they list [`SettlementTask`] candidates once per
//! settlement, and each worker rates every candidate through
//! `assess_person_suitability` / `assess_robot_suitability`.
//!
//! Meta tasks are registered explicitly in a [`MetaTaskRegistry`] owned by
//! the engine.

use std::fmt;

use colonysim_logic::rating::RatingScore;
use colonysim_logic::skills::SkillType;
use hecs::Entity;
use rand::rngs::StdRng;

use crate::components::{FavoriteActivity, Job, RobotType, WorkerKind};
use crate::context::{SettlementView, TaskContext};
use crate::error::TaskError;
use crate::manager::SettlementCaches;
use crate::task::Task;

mod explore;
mod maintenance;
mod mining;
mod relax;
mod suitability;

pub use explore::{ExploreSiteMeta, EXPLORE_SITE};
pub use maintenance::{MaintenanceMeta, MAINTENANCE};
pub use mining::{CollectMinedMineralsMeta, MineSiteMeta, COLLECT_MINED_MINERALS, MINE_SITE};
pub use relax::{RelaxMeta, RELAX};
pub use suitability::*;

/// Which kind of worker a meta task serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerType {
    Person,
    Robot,
    Both,
}

impl WorkerType {
    pub fn accepts(&self, kind: &WorkerKind) -> bool {
        match self {
            WorkerType::Person => kind.is_person(),
            WorkerType::Robot => kind.is_robot(),
            WorkerType::Both => true,
        }
    }
}

/// When in a worker's sol a meta task applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    AnyHour,
    WorkHour,
    NonWorkHour,
}

impl TaskScope {
    pub fn applies(&self, on_duty: bool) -> bool {
        match self {
            TaskScope::AnyHour => true,
            TaskScope::WorkHour => on_duty,
            TaskScope::NonWorkHour => !on_duty,
        }
    }
}

/// What makes a worker a good match for a meta task's work.
#[derive(Debug, Clone, Default)]
pub struct MetaTaskTraits {
    pub favorites: Vec<FavoriteActivity>,
    pub skills: Vec<SkillType>,
    pub preferred_jobs: Vec<Job>,
    pub preferred_robots: Vec<RobotType>,
}

/// A settlement-wide candidate, rated before any worker is considered.
#[derive(Debug, Clone)]
pub struct SettlementTask {
    /// Name of the meta task that proposed it.
    pub meta: &'static str,
    /// The entity the work is about (a building, robot, site).
    pub focus: Option<Entity>,
    pub description: String,
    /// How many workers may take it at once.
    pub demand: u32,
    pub eva_needed: bool,
    pub score: RatingScore,
}

/// A candidate rated for one worker, ready to be turned into a task.
#[derive(Debug, Clone)]
pub struct TaskJob {
    pub meta: &'static str,
    pub description: String,
    pub focus: Option<Entity>,
    /// Worker limit on the focus. `None` for orders and worker-level jobs.
    pub demand: Option<u32>,
    pub score: RatingScore,
    pub eva_needed: bool,
}

impl TaskJob {
    pub fn new(meta: &'static str, description: impl Into<String>, score: RatingScore) -> Self {
        Self {
            meta,
            description: description.into(),
            focus: None,
            demand: None,
            score,
            eva_needed: false,
        }
    }

    /// A settlement candidate with the worker's own rating.
    pub fn from_settlement_task(task: &SettlementTask, score: RatingScore) -> Self {
        Self {
            meta: task.meta,
            description: task.description.clone(),
            focus: task.focus,
            demand: Some(task.demand),
            score,
            eva_needed: task.eva_needed,
        }
    }

    /// True once the focus has as many workers as it allows.
    pub fn is_saturated(&self, settlements: &SettlementCaches) -> bool {
        match (self.focus, self.demand) {
            (Some(focus), Some(demand)) => settlements.claims(focus) >= demand,
            _ => false,
        }
    }

    /// Build the task through the meta task that proposed this job.
    pub fn create_task(&self, worker: Entity, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError> {
        let registry = ctx.registry;
        registry.get(self.meta)?.create_task(worker, self, ctx)
    }

    /// The focus entity, which settlement jobs always carry.
    pub fn require_focus(&self) -> Result<Entity, TaskError> {
        self.focus
            .ok_or_else(|| TaskError::precondition(format!("{} job has no focus", self.meta)))
    }
}

/// A task factory.
pub trait MetaTask {
    fn name(&self) -> &'static str;

    fn worker_type(&self) -> WorkerType;

    fn scope(&self) -> TaskScope {
        TaskScope::AnyHour
    }

    fn traits(&self) -> &MetaTaskTraits;

    fn as_settlement_meta(&self) -> Option<&dyn SettlementMetaTask> {
        None
    }

    /// Jobs only this worker could do, rated for them.
    fn worker_jobs(&self, _worker: Entity, _view: SettlementView<'_>, _rng: &mut StdRng) -> Vec<TaskJob> {
        Vec::new()
    }

    fn create_task(&self, worker: Entity, job: &TaskJob, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError>;
}

/// A factory whose candidates are shared by a whole settlement.
pub trait SettlementMetaTask: MetaTask {
    /// Candidates with a positive score; zero scores are left out.
    fn settlement_tasks(&self, settlement: Entity, view: SettlementView<'_>, rng: &mut StdRng) -> Vec<SettlementTask>;

    fn assess_person_suitability(&self, task: &SettlementTask, person: Entity, view: SettlementView<'_>) -> RatingScore {
        person_suitability(self.traits(), task, person, view)
    }

    fn assess_robot_suitability(&self, task: &SettlementTask, robot: Entity, view: SettlementView<'_>) -> RatingScore {
        robot_suitability(self.traits(), task, robot, view)
    }
}

/// The meta tasks the engine schedules from.
#[derive(Default)]
pub struct MetaTaskRegistry {
    metas: Vec<Box<dyn MetaTask>>,
}

impl fmt::Debug for MetaTaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.metas.iter().map(|m| m.name())).finish()
    }
}

impl MetaTaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every meta task this crate provides.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(MaintenanceMeta::new())
            .register(MineSiteMeta::new())
            .register(CollectMinedMineralsMeta::new())
            .register(ExploreSiteMeta::new())
            .register(RelaxMeta::new());
        registry
    }

    /// Add a meta task, replacing any with the same name.
    pub fn register(&mut self, meta: impl MetaTask + 'static) -> &mut Self {
        self.metas.retain(|m| m.name() != meta.name());
        self.metas.push(Box::new(meta));
        self
    }

    pub fn get(&self, name: &str) -> Result<&dyn MetaTask, TaskError> {
        self.metas
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
            .ok_or_else(|| TaskError::UnknownMetaTask(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn MetaTask> + '_ {
        self.metas.iter().map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Settlement factories, in registration order.
    pub fn settlement_metas(&self) -> impl Iterator<Item = &dyn SettlementMetaTask> + '_ {
        self.iter().filter_map(|m| m.as_settlement_meta())
    }

    /// Meta tasks serving this kind of worker at this point of their sol.
    pub fn applicable<'a>(&'a self, kind: &'a WorkerKind, on_duty: bool) -> impl Iterator<Item = &'a dyn MetaTask> + 'a {
        self.iter()
            .filter(move |m| m.worker_type().accepts(kind) && m.scope().applies(on_duty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Shift;

    #[test]
    fn test_standard_registry() {
        let registry = MetaTaskRegistry::standard();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.settlement_metas().count(), 4);
        assert!(registry.get("Maintenance").is_ok());
        assert!(matches!(
            registry.get("Juggle"),
            Err(TaskError::UnknownMetaTask(_))
        ));
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = MetaTaskRegistry::standard();
        registry.register(RelaxMeta::new());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_applicable_filters_worker_and_scope() {
        let registry = MetaTaskRegistry::standard();
        let robot = WorkerKind::Robot {
            robot_type: RobotType::Repairbot,
        };
        let names: Vec<&str> = registry.applicable(&robot, true).map(|m| m.name()).collect();
        assert_eq!(names, vec!["Maintenance"]);

        let person = WorkerKind::Person {
            shift: Shift::A,
            job: Job::Geologist,
            favorite: FavoriteActivity::FieldWork,
        };
        let off_duty: Vec<&str> = registry.applicable(&person, false).map(|m| m.name()).collect();
        assert_eq!(off_duty, vec!["Relax"]);
        assert_eq!(registry.applicable(&person, true).count(), 5);
    }

    #[test]
    fn test_scope() {
        assert!(TaskScope::AnyHour.applies(false));
        assert!(TaskScope::WorkHour.applies(true));
        assert!(!TaskScope::WorkHour.applies(false));
        assert!(TaskScope::NonWorkHour.applies(false));
    }
}
