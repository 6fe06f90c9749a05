//! Mining and mineral collection at claimed sites.

use colonysim_logic::rating::RatingScore;
use colonysim_logic::skills::SkillType;
use hecs::{Entity, World};
use rand::rngs::StdRng;

use super::{
    eva_conditions_ok, MetaTask, MetaTaskTraits, SettlementMetaTask, SettlementTask, TaskJob, TaskScope,
    WorkerType,
};
use crate::components::{
    settlement_of, Associated, Coordinates, FavoriteActivity, Job, MiningSite, Name, Vehicle,
};
use crate::context::{SettlementView, TaskContext};
use crate::error::TaskError;
use crate::generation::LARGE_BAG_CAPACITY;
use crate::task::{empty_bag, CollectMinedMinerals, MineSite, Task};

pub const MINE_SITE: &str = "Mine Site";
pub const COLLECT_MINED_MINERALS: &str = "Collect Mined Minerals";

const MINING_BASE: f64 = 15.0;
const CONCENTRATION_WEIGHT: f64 = 20.0;
const COLLECTION_BASE: f64 = 10.0;
const PILE_WEIGHT: f64 = 0.4;

fn field_traits(job: Job) -> MetaTaskTraits {
    MetaTaskTraits {
        favorites: vec![FavoriteActivity::FieldWork],
        skills: vec![SkillType::Prospecting, SkillType::EvaOperations],
        preferred_jobs: vec![job],
        preferred_robots: Vec::new(),
    }
}

/// Settlement sites matching `keep`, with their name and coordinates.
fn sites<F>(world: &World, settlement: Entity, keep: F) -> Vec<(Entity, String, Coordinates, f64)>
where
    F: Fn(&MiningSite) -> Option<f64>,
{
    world
        .query::<(&Name, &Coordinates, &Associated, &MiningSite)>()
        .iter()
        .filter(|(_, (_, _, a, _))| a.0 == settlement)
        .filter_map(|(e, (n, c, _, site))| keep(site).map(|v| (e, n.0.clone(), *c, v)))
        .collect()
}

/// First rover of the settlement holding an empty large bag.
pub fn rover_with_empty_bag(world: &World, settlement: Entity) -> Option<Entity> {
    let rovers: Vec<Entity> = world
        .query::<(&Vehicle, &Associated)>()
        .iter()
        .filter(|(_, (_, a))| a.0 == settlement)
        .map(|(e, _)| e)
        .collect();
    rovers.into_iter().find(|&rover| empty_bag(world, rover).is_some())
}

/// Proposes digging at every claimed site that still has ore.
#[derive(Debug)]
pub struct MineSiteMeta {
    traits: MetaTaskTraits,
}

impl MineSiteMeta {
    pub fn new() -> Self {
        Self {
            traits: field_traits(Job::Geologist),
        }
    }
}

impl Default for MineSiteMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaTask for MineSiteMeta {
    fn name(&self) -> &'static str {
        MINE_SITE
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
        MineSite::create(worker, job.require_focus()?, ctx)
    }
}

impl SettlementMetaTask for MineSiteMeta {
    fn settlement_tasks(&self, settlement: Entity, view: SettlementView<'_>, _rng: &mut StdRng) -> Vec<SettlementTask> {
        let open = sites(view.world, settlement, |site| {
            (!site.is_depleted()).then(|| site.concentrations.values().sum())
        });
        open.into_iter()
            .filter(|(_, _, coordinates, _)| eva_conditions_ok(view, settlement, *coordinates))
            .map(|(site, name, _, concentration)| SettlementTask {
                meta: MINE_SITE,
                focus: Some(site),
                description: format!("Mine {}", name),
                demand: 2,
                eva_needed: true,
                score: RatingScore::new("mining", MINING_BASE)
                    .with_base("concentration", concentration * CONCENTRATION_WEIGHT),
            })
            .collect()
    }
}

/// Proposes bagging excavated minerals while a rover has an empty bag.
#[derive(Debug)]
pub struct CollectMinedMineralsMeta {
    traits: MetaTaskTraits,
}

impl CollectMinedMineralsMeta {
    pub fn new() -> Self {
        Self {
            traits: field_traits(Job::Technician),
        }
    }
}

impl Default for CollectMinedMineralsMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaTask for CollectMinedMineralsMeta {
    fn name(&self) -> &'static str {
        COLLECT_MINED_MINERALS
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
        let site = job.require_focus()?;
        let settlement = settlement_of(ctx.world, worker).ok_or_else(|| TaskError::missing(worker, "Location"))?;
        let rover = rover_with_empty_bag(ctx.world, settlement)
            .ok_or_else(|| TaskError::precondition("no rover with an empty bag"))?;
        CollectMinedMinerals::create(worker, site, rover, ctx)
    }
}

impl SettlementMetaTask for CollectMinedMineralsMeta {
    fn settlement_tasks(&self, settlement: Entity, view: SettlementView<'_>, _rng: &mut StdRng) -> Vec<SettlementTask> {
        if rover_with_empty_bag(view.world, settlement).is_none() {
            return Vec::new();
        }
        let piles = sites(view.world, settlement, |site| {
            let pile = site.total_excavated();
            (pile > 0.0).then_some(pile)
        });
        piles
            .into_iter()
            .filter(|(_, _, coordinates, _)| eva_conditions_ok(view, settlement, *coordinates))
            .map(|(site, name, _, pile)| SettlementTask {
                meta: COLLECT_MINED_MINERALS,
                focus: Some(site),
                description: format!("Collect minerals at {}", name),
                demand: 1,
                eva_needed: true,
                score: RatingScore::new("collection", COLLECTION_BASE)
                    .with_base("pile", pile.min(LARGE_BAG_CAPACITY) * PILE_WEIGHT),
            })
            .collect()
    }
}
