//! Downtime, proposed to each person on their own.

use colonysim_logic::rating::RatingScore;
use hecs::Entity;
use rand::rngs::StdRng;

use super::{MetaTask, MetaTaskTraits, TaskJob, WorkerType};
use crate::components::{FavoriteActivity, PhysicalCondition, WorkerKind};
use crate::context::{SettlementView, TaskContext};
use crate::error::TaskError;
use crate::task::{Relax, Task};

pub const RELAX: &str = "Relax";

const RELAX_BASE: f64 = 10.0;
const STRESS_WEIGHT: f64 = 0.5;
const FATIGUE_WEIGHT: f64 = 0.02;
const ON_DUTY_MODIFIER: f64 = 0.3;
const FAVORITE_MODIFIER: f64 = 1.25;

/// The more stressed and tired a person is, the more they want a break.
/// Rarely chosen on shift.
#[derive(Debug)]
pub struct RelaxMeta {
    traits: MetaTaskTraits,
}

impl RelaxMeta {
    pub fn new() -> Self {
        Self {
            traits: MetaTaskTraits {
                favorites: vec![FavoriteActivity::Lounging],
                ..Default::default()
            },
        }
    }
}

impl Default for RelaxMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaTask for RelaxMeta {
    fn name(&self) -> &'static str {
        RELAX
    }

    fn worker_type(&self) -> WorkerType {
        WorkerType::Person
    }

    fn traits(&self) -> &MetaTaskTraits {
        &self.traits
    }

    fn worker_jobs(&self, worker: Entity, view: SettlementView<'_>, _rng: &mut StdRng) -> Vec<TaskJob> {
        let Ok(kind) = view.world.get::<&WorkerKind>(worker).map(|k| *k) else {
            return Vec::new();
        };
        let WorkerKind::Person { favorite, .. } = kind else {
            return Vec::new();
        };
        let condition = view
            .world
            .get::<&PhysicalCondition>(worker)
            .map(|c| *c)
            .unwrap_or_default();

        let mut score = RatingScore::new("relax", RELAX_BASE);
        score.add_base("stress", condition.stress * STRESS_WEIGHT);
        score.add_base("fatigue", condition.fatigue * FATIGUE_WEIGHT);
        if kind.is_on_duty(view.now) {
            score.add_modifier("on duty", ON_DUTY_MODIFIER);
        }
        if self.traits.favorites.contains(&favorite) {
            score.add_modifier("favorite", FAVORITE_MODIFIER);
        }
        vec![TaskJob::new(RELAX, "Relax", score)]
    }

    fn create_task(&self, worker: Entity, _job: &TaskJob, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError> {
        Relax::create(worker, ctx)
    }
}
