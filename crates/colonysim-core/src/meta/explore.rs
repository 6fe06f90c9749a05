use colonysim_logic::rating::RatingScore;
use colonysim_logic::skills::SkillType;
use hecs::Entity;
use rand::rngs::StdRng;

use super::{
    eva_conditions_ok, MetaTask, MetaTaskTraits, SettlementMetaTask, SettlementTask, TaskJob, TaskScope,
    WorkerType,
};
use crate::components::{Associated, Coordinates, ExplorationSite, FavoriteActivity, Job, Name};
use crate::context::{SettlementView, TaskContext};
use crate::error::TaskError;
use crate::task::{ExploreSite, Task};

pub const EXPLORE_SITE: &str = "Explore Site";

const EXPLORATION_BASE: f64 = 12.0;
/// Per mineral the survey is expected to estimate.
const MINERAL_WEIGHT: f64 = 3.0;

/// Proposes surveying every unexplored site of the settlement.
#[derive(Debug)]
pub struct ExploreSiteMeta {
    traits: MetaTaskTraits,
}

impl ExploreSiteMeta {
    pub fn new() -> Self {
        Self {
            traits: MetaTaskTraits {
                favorites: vec![FavoriteActivity::FieldWork],
                skills: vec![SkillType::Areology, SkillType::Prospecting],
                preferred_jobs: vec![Job::Areologist, Job::Geologist],
                preferred_robots: Vec::new(),
            },
        }
    }
}

impl Default for ExploreSiteMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaTask for ExploreSiteMeta {
    fn name(&self) -> &'static str {
        EXPLORE_SITE
    }

    fn worker_type(&self) -> WorkerType {
        WorkerType::Person
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
        ExploreSite::create(worker, job.require_focus()?, ctx)
    }
}

impl SettlementMetaTask for ExploreSiteMeta {
    fn settlement_tasks(&self, settlement: Entity, view: SettlementView<'_>, _rng: &mut StdRng) -> Vec<SettlementTask> {
        let unexplored: Vec<(Entity, String, Coordinates, usize)> = view
            .world
            .query::<(&Name, &Coordinates, &Associated, &ExplorationSite)>()
            .iter()
            .filter(|(_, (_, _, a, site))| a.0 == settlement && !site.explored)
            .map(|(e, (n, c, _, site))| (e, n.0.clone(), *c, site.certainty.len()))
            .collect();

        unexplored
            .into_iter()
            .filter(|(_, _, coordinates, _)| eva_conditions_ok(view, settlement, *coordinates))
            .map(|(site, name, _, minerals)| SettlementTask {
                meta: EXPLORE_SITE,
                focus: Some(site),
                description: format!("Explore {}", name),
                demand: 1,
                eva_needed: true,
                score: RatingScore::new("exploration", EXPLORATION_BASE)
                    .with_base("minerals", minerals as f64 * MINERAL_WEIGHT),
            })
            .collect()
    }
}
