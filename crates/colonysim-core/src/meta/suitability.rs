//! Worker suitability for settlement candidates.
//!
//! A settlement candidate's score is rated once for the whole settlement; the
//! helpers here refine it per worker with multiplicative modifiers, or
//! exclude the pairing outright with [`ZERO_RATING`].

use colonysim_logic::rating::{RatingScore, ZERO_RATING};
use colonysim_logic::skills::SkillProfile;
use hecs::{Entity, World};

use super::{MetaTaskTraits, SettlementTask};
use crate::components::{
    buildings_with_function, BuildingFunction, Coordinates, Location, PhysicalCondition, Place, Settlement, WorkerKind,
};
use crate::context::SettlementView;
use crate::task::{find_available_suit, is_fit_for_eva};

const SKILL_WEIGHT: f64 = 0.1;
const JOB_MODIFIER: f64 = 1.5;
const FAVORITE_MODIFIER: f64 = 1.25;
const ROBOT_TYPE_MODIFIER: f64 = 1.5;
/// Distance at which a site's rating halves.
const DISTANCE_HALF_KM: f64 = 50.0;

/// `1 + 0.1 × average level` over the traits' skills.
pub fn skill_modifier(world: &World, worker: Entity, traits: &MetaTaskTraits) -> f64 {
    if traits.skills.is_empty() {
        return 1.0;
    }
    let level = world
        .get::<&SkillProfile>(worker)
        .map(|p| p.average_level(&traits.skills))
        .unwrap_or(0.0);
    1.0 + SKILL_WEIGHT * level
}

fn worker_position(world: &World, worker: Entity) -> Option<Coordinates> {
    let location = world.get::<&Location>(worker).ok().map(|l| *l)?;
    match location.place {
        Place::Outside(at) => Some(at),
        _ => world.get::<&Settlement>(location.settlement).ok().map(|s| s.coordinates),
    }
}

/// `1 / (1 + km / 50)` from the worker to a focus placed on the surface.
/// `None` when the focus has no coordinates.
pub fn distance_modifier(world: &World, worker: Entity, task: &SettlementTask) -> Option<f64> {
    let site = world.get::<&Coordinates>(task.focus?).ok().map(|c| *c)?;
    let from = worker_position(world, worker)?;
    Some(1.0 / (1.0 + from.distance_km(&site) / DISTANCE_HALF_KM))
}

/// Rate a settlement candidate for a person.
///
/// Excluded for robots, for EVA work the person is not fit for, and when the
/// person is the focus of the work.
pub fn person_suitability(
    traits: &MetaTaskTraits,
    task: &SettlementTask,
    person: Entity,
    view: SettlementView<'_>,
) -> RatingScore {
    let (job, favorite) = match view.world.get::<&WorkerKind>(person).map(|k| *k) {
        Ok(WorkerKind::Person { job, favorite, .. }) => (job, favorite),
        _ => return ZERO_RATING,
    };
    if task.focus == Some(person) {
        return ZERO_RATING;
    }
    if task.eva_needed && !is_fit_for_eva(view.world, person, &view.config.eva) {
        return ZERO_RATING;
    }

    let mut score = task.score.clone();
    score.add_modifier("skill", skill_modifier(view.world, person, traits));
    if traits.preferred_jobs.contains(&job) {
        score.add_modifier("job", JOB_MODIFIER);
    }
    if traits.favorites.contains(&favorite) {
        score.add_modifier("favorite", FAVORITE_MODIFIER);
    }
    let performance = view
        .world
        .get::<&PhysicalCondition>(person)
        .map(|c| c.performance())
        .unwrap_or(1.0);
    score.add_modifier("fitness", performance);
    if let Some(modifier) = distance_modifier(view.world, person, task) {
        score.add_modifier("distance", modifier);
    }
    score
}

/// Rate a settlement candidate for a robot.
///
/// Robots never go on EVA and never work on themselves. Preferred robot
/// types get a bonus.
pub fn robot_suitability(
    traits: &MetaTaskTraits,
    task: &SettlementTask,
    robot: Entity,
    view: SettlementView<'_>,
) -> RatingScore {
    let robot_type = match view.world.get::<&WorkerKind>(robot).map(|k| *k) {
        Ok(WorkerKind::Robot { robot_type }) => robot_type,
        _ => return ZERO_RATING,
    };
    if task.eva_needed || task.focus == Some(robot) {
        return ZERO_RATING;
    }
    let mut score = task.score.clone();
    score.add_modifier("skill", skill_modifier(view.world, robot, traits));
    if traits.preferred_robots.contains(&robot_type) {
        score.add_modifier("robot type", ROBOT_TYPE_MODIFIER);
    }
    if let Some(modifier) = distance_modifier(view.world, robot, task) {
        score.add_modifier("distance", modifier);
    }
    score
}

/// Whether anyone from `settlement` could work at `site` right now: an
/// airlock, a usable suit, enough sunlight and no polar night.
pub fn eva_conditions_ok(view: SettlementView<'_>, settlement: Entity, site: Coordinates) -> bool {
    if buildings_with_function(view.world, settlement, BuildingFunction::Eva).is_empty() {
        return false;
    }
    if find_available_suit(view.world, settlement, &view.config.eva).is_none() {
        return false;
    }
    !view.surface.in_dark_polar_region(site)
        && view.surface.solar_irradiance(site, view.now) >= view.config.eva.min_sunlight
}
