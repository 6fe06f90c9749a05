//! EVA gating shared by every outside task.
//!
//! [`EvaOperation`] wraps an [`EvaWork`] with the suit-up, airlock and
//! safety handling all outside work needs. The worker passes through the
//! airlock in [`WALK_TO_OUTSIDE_SITE`], does the work in the work's site
//! phase and returns in [`WALK_BACK_INSIDE`]. Before every walk-out and site
//! step, `check_readiness` decides whether it is still safe to be outside;
//! when it is not, the worker heads back in (or the task ends if they never
//! left) and the rest of the tick is spent.

use std::any::Any;

use colonysim_logic::config::EvaConfig;
use colonysim_logic::skills::{ExperienceImpact, NaturalAttributeType, SkillProfile, SkillType};
use hecs::{Entity, World};
use log::{debug, info, warn};

use super::{add_experience, check_for_accident, Task, TaskBehavior, TaskOutcome, TaskPhase, TaskState};
use crate::components::{
    buildings_with_function, is_outside, items, name_of, set_place, transfer_container,
    BuildingFunction, Coordinates, EquipmentInventory, EvaSuit, Location, MalfunctionManager,
    PhysicalCondition, Place, Resource, Storage,
};
use crate::context::TaskContext;
use crate::error::TaskError;

pub const WALK_TO_OUTSIDE_SITE: TaskPhase = TaskPhase::new("Walk to Outside Site");
pub const WALK_BACK_INSIDE: TaskPhase = TaskPhase::new("Walk Back Inside");

/// EVA operations experience is a hundredth of the time outside.
const EVA_SKILL_RATIO: f64 = 100.0;

/// Work done at an outside site.
pub trait EvaWork: 'static {
    /// The phase in which the work happens.
    fn site_phase(&self) -> TaskPhase;

    /// Where the work happens.
    fn site(&self) -> Coordinates;

    /// Take hold of anything the work needs once the worker is suited up.
    /// The suit goes back to storage if this fails.
    fn prepare(&mut self, _worker: Entity, _ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        Ok(())
    }

    /// Work for up to `time` millisols and return the time left over. The
    /// work calls [`TaskState::end`] once it is finished; the worker then
    /// walks back in before the task actually ends.
    fn perform_work(
        &mut self,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError>;

    /// Return containers taken in [`EvaWork::prepare`].
    fn clear_down(&mut self, _state: &TaskState, _ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        Ok(())
    }
}

/// An outside task: a suited-up worker doing `W` at a surface site.
pub struct EvaOperation<W: EvaWork> {
    work: W,
    settlement: Entity,
    airlock: Entity,
    suit: Entity,
    airlock_progress: f64,
    time_on_site: f64,
    return_outcome: Option<TaskOutcome>,
    eva_impact: ExperienceImpact,
}

impl<W: EvaWork> EvaOperation<W> {
    /// Suit up the worker and build the task.
    ///
    /// Fails with a precondition error when the worker is already outside
    /// or unfit, the settlement has no airlock, no suit is usable, or the
    /// work cannot be prepared.
    pub fn create(state: TaskState, mut work: W, ctx: &mut TaskContext<'_>) -> Result<Task, TaskError> {
        let worker = state.worker();
        let location = *ctx
            .world
            .get::<&Location>(worker)
            .map_err(|_| TaskError::missing(worker, "Location"))?;
        if location.is_outside() {
            return Err(TaskError::precondition("already outside"));
        }
        let settlement = location.settlement;
        let airlock = buildings_with_function(ctx.world, settlement, BuildingFunction::Eva)
            .first()
            .copied()
            .ok_or_else(|| TaskError::precondition("no airlock"))?;
        if !is_fit_for_eva(ctx.world, worker, &ctx.config.eva) {
            return Err(TaskError::precondition("not fit for EVA"));
        }
        if ctx.world.get::<&EquipmentInventory>(worker).is_err() {
            return Err(TaskError::missing(worker, "EquipmentInventory"));
        }
        let suit = find_available_suit(ctx.world, settlement, &ctx.config.eva)
            .ok_or_else(|| TaskError::precondition("no EVA suit available"))?;

        transfer_container(ctx.world, suit, settlement, worker)?;
        {
            let mut inventory = ctx
                .world
                .get::<&mut EquipmentInventory>(worker)
                .map_err(|_| TaskError::missing(worker, "EquipmentInventory"))?;
            inventory.suit = Some(suit);
            inventory.wearing_garment = false;
        }

        if let Err(e) = work.prepare(worker, ctx) {
            if let Ok(mut inventory) = ctx.world.get::<&mut EquipmentInventory>(worker) {
                inventory.suit = None;
                inventory.wearing_garment = true;
            }
            transfer_container(ctx.world, suit, worker, settlement)?;
            return Err(e);
        }

        debug!(
            "{} suited up in {}",
            name_of(ctx.world, worker),
            name_of(ctx.world, suit)
        );
        let eva_impact = ExperienceImpact::new(EVA_SKILL_RATIO, NaturalAttributeType::ExperienceAptitude)
            .with_skill(SkillType::EvaOperations);
        let behavior = Self {
            work,
            settlement,
            airlock,
            suit,
            airlock_progress: 0.0,
            time_on_site: 0.0,
            return_outcome: None,
            eva_impact,
        };
        Ok(Task::new(state.with_phase(WALK_TO_OUTSIDE_SITE), behavior))
    }

    pub fn work(&self) -> &W {
        &self.work
    }

    pub fn suit(&self) -> Entity {
        self.suit
    }

    /// Millisols spent working on site.
    pub fn time_on_site(&self) -> f64 {
        self.time_on_site
    }

    /// Run the pre-step safety checks. Returns false when the step must not
    /// run; the task has then either ended or turned back.
    fn check_readiness(&mut self, phase: TaskPhase, state: &mut TaskState, ctx: &mut TaskContext<'_>) -> bool {
        if state.is_done() || state.is_ending() {
            return false;
        }
        match self.readiness_problem(phase, state.worker(), ctx) {
            None => true,
            Some(outcome) => {
                self.head_back(state, ctx, outcome);
                false
            }
        }
    }

    fn readiness_problem(&self, phase: TaskPhase, worker: Entity, ctx: &TaskContext<'_>) -> Option<TaskOutcome> {
        let cancel = |reason: &str| Some(TaskOutcome::Cancelled(reason.to_string()));
        let eva = &ctx.config.eva;
        let site = self.work.site();

        if ctx.surface.in_dark_polar_region(site) {
            return cancel("In a dark polar region");
        }
        if ctx.surface.solar_irradiance(site, ctx.now) < eva.min_sunlight {
            return cancel("Insufficient sunlight");
        }
        if phase == self.work.site_phase() && self.time_on_site >= eva.site_duration {
            return Some(TaskOutcome::Completed);
        }
        if !is_fit_for_eva(ctx.world, worker, eva) {
            return cancel("Too fatigued or stressed");
        }
        self.suit_problem(worker, ctx).and_then(cancel)
    }

    fn suit_problem(&self, worker: Entity, ctx: &TaskContext<'_>) -> Option<&'static str> {
        let worn = ctx
            .world
            .get::<&EquipmentInventory>(worker)
            .map(|i| i.suit == Some(self.suit))
            .unwrap_or(false);
        if !worn {
            return Some("No EVA suit");
        }
        let Ok(suit) = ctx.world.get::<&EvaSuit>(self.suit) else {
            return Some("No EVA suit");
        };
        if suit.oxygen_fraction() < ctx.config.eva.min_oxygen_fraction {
            return Some("EVA suit oxygen low");
        }
        let broken = ctx
            .world
            .get::<&MalfunctionManager>(self.suit)
            .map(|m| m.has_malfunction())
            .unwrap_or(false);
        if broken {
            return Some("EVA suit malfunction");
        }
        None
    }

    /// Walk back in when outside, otherwise end right away.
    fn head_back(&mut self, state: &mut TaskState, ctx: &mut TaskContext<'_>, outcome: TaskOutcome) {
        let worker = state.worker();
        if is_outside(ctx.world, worker) {
            debug!(
                "{} heading back inside from {}: {}",
                name_of(ctx.world, worker),
                state.name(),
                outcome.reason().unwrap_or("done")
            );
            self.return_outcome = Some(outcome);
            self.airlock_progress = 0.0;
            state.set_phase(WALK_BACK_INSIDE);
        } else {
            state.end(outcome);
        }
    }

    /// Spend time on the airlock cycle. Returns the time used.
    fn cycle_airlock(&mut self, time: f64, cycle_time: f64) -> f64 {
        let used = time.min((cycle_time - self.airlock_progress).max(0.0));
        self.airlock_progress += used;
        used
    }

    fn walk_to_outside_site(
        &mut self,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError> {
        let cycle_time = ctx.config.eva.airlock_cycle_time;
        let used = self.cycle_airlock(time, cycle_time);
        if self.airlock_progress >= cycle_time {
            self.airlock_progress = 0.0;
            let site = self.work.site();
            set_place(ctx.world, state.worker(), Place::Outside(site))?;
            info!("{} went outside to {}", name_of(ctx.world, state.worker()), site);
            state.set_phase(self.work.site_phase());
        }
        Ok(time - used)
    }

    fn perform_site(
        &mut self,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError> {
        let worker = state.worker();
        if !is_outside(ctx.world, worker) {
            state.set_phase(WALK_TO_OUTSIDE_SITE);
            return Ok(time);
        }

        let site_duration = ctx.config.eva.site_duration;
        let available = time.min((site_duration - self.time_on_site).max(0.0));
        let left = self.work.perform_work(state, ctx, available)?;
        let used = (available - left.clamp(0.0, available)).max(0.0);
        self.time_on_site += used;

        if used > 0.0 {
            if let Ok(mut suit) = ctx.world.get::<&mut EvaSuit>(self.suit) {
                suit.consume(used);
            }
            if let Ok(mut manager) = ctx.world.get::<&mut MalfunctionManager>(self.suit) {
                manager.active_time_passing(used);
            }
            add_experience(ctx, worker, &self.eva_impact, used)?;
            state.add_experience(used, ctx)?;

            let eva_skill = ctx
                .world
                .get::<&SkillProfile>(worker)
                .map(|s| s.level(SkillType::EvaOperations) as f64)
                .unwrap_or(0.0);
            let base_chance = ctx.config.eva.base_accident_chance;
            check_for_accident(ctx, worker, self.suit, used, base_chance, eva_skill)?;
        }

        if let Some(outcome) = state.take_end_request() {
            self.head_back(state, ctx, outcome);
        } else if self.time_on_site >= site_duration {
            self.head_back(state, ctx, TaskOutcome::Completed);
        }
        Ok(time - used)
    }

    fn walk_back_inside(
        &mut self,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError> {
        let worker = state.worker();
        let mut used = 0.0;
        if is_outside(ctx.world, worker) {
            let cycle_time = ctx.config.eva.airlock_cycle_time;
            used = self.cycle_airlock(time, cycle_time);
            if self.airlock_progress < cycle_time {
                return Ok(time - used);
            }
            self.airlock_progress = 0.0;
            set_place(ctx.world, worker, Place::Building(self.airlock))?;
            info!("{} came back inside", name_of(ctx.world, worker));
        }
        state.end(self.return_outcome.take().unwrap_or(TaskOutcome::Completed));
        Ok(time - used)
    }

    /// Put the suit back in settlement storage, topped up from its stores.
    fn return_suit(&self, worker: Entity, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        if let Ok(mut inventory) = ctx.world.get::<&mut EquipmentInventory>(worker) {
            if inventory.suit == Some(self.suit) {
                inventory.suit = None;
            }
            inventory.wearing_garment = true;
        }

        let deficit = ctx
            .world
            .get::<&EvaSuit>(self.suit)
            .map(|s| (s.oxygen_capacity - s.oxygen, s.water_capacity - s.water))
            .ok();
        if let Some((oxygen_needed, water_needed)) = deficit {
            let (oxygen, water) = match ctx.world.get::<&mut Storage>(self.settlement) {
                Ok(mut stores) => (
                    stores.retrieve_amount_resource(Resource::Oxygen, oxygen_needed),
                    stores.retrieve_amount_resource(Resource::Water, water_needed),
                ),
                Err(_) => (0.0, 0.0),
            };
            if let Ok(mut suit) = ctx.world.get::<&mut EvaSuit>(self.suit) {
                suit.oxygen += oxygen;
                suit.water += water;
            }
        }

        let held = ctx
            .world
            .get::<&Storage>(worker)
            .map(|s| s.contains_equipment(self.suit))
            .unwrap_or(false);
        if held {
            transfer_container(ctx.world, self.suit, worker, self.settlement)?;
        }
        Ok(())
    }

    fn assign_thermal_bottle(&self, worker: Entity, ctx: &mut TaskContext<'_>) {
        let has_bottle = ctx
            .world
            .get::<&EquipmentInventory>(worker)
            .map(|i| i.has_thermal_bottle)
            .unwrap_or(true);
        if has_bottle {
            return;
        }
        let taken = ctx
            .world
            .get::<&mut Storage>(self.settlement)
            .map(|mut s| s.retrieve_item(items::THERMAL_BOTTLE, 1))
            .unwrap_or(false);
        if taken {
            if let Ok(mut inventory) = ctx.world.get::<&mut EquipmentInventory>(worker) {
                inventory.has_thermal_bottle = true;
            }
        }
    }
}

impl<W: EvaWork> TaskBehavior for EvaOperation<W> {
    fn perform_phase(
        &mut self,
        phase: TaskPhase,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError> {
        if phase == WALK_BACK_INSIDE {
            return self.walk_back_inside(state, ctx, time);
        }
        if phase != WALK_TO_OUTSIDE_SITE && phase != self.work.site_phase() {
            return Err(state.unknown_phase(phase));
        }
        if !self.check_readiness(phase, state, ctx) {
            return Ok(0.0);
        }
        if phase == WALK_TO_OUTSIDE_SITE {
            self.walk_to_outside_site(state, ctx, time)
        } else {
            self.perform_site(state, ctx, time)
        }
    }

    fn clear_down(&mut self, state: &TaskState, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let worker = state.worker();
        let suit = self.return_suit(worker, ctx);
        self.assign_thermal_bottle(worker, ctx);
        let work = self.work.clear_down(state, ctx);

        let mut inside = Ok(());
        if is_outside(ctx.world, worker) {
            warn!(
                "{} ended {} outside; bringing them in",
                name_of(ctx.world, worker),
                state.name()
            );
            inside = set_place(ctx.world, worker, Place::Building(self.airlock));
        }
        suit.and(work).and(inside)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A person able to go outside: not exhausted, not overstressed. Robots
/// never go on EVA.
pub fn is_fit_for_eva(world: &World, worker: Entity, config: &EvaConfig) -> bool {
    match world.get::<&PhysicalCondition>(worker) {
        Ok(condition) => !condition.is_super_unfit() && condition.performance() >= config.min_performance,
        Err(_) => false,
    }
}

/// First suit in settlement storage with enough oxygen and no malfunction.
pub fn find_available_suit(world: &World, settlement: Entity, config: &EvaConfig) -> Option<Entity> {
    let storage = world.get::<&Storage>(settlement).ok()?;
    storage.equipment().iter().copied().find(|&item| {
        let usable = world
            .get::<&EvaSuit>(item)
            .map(|s| s.oxygen_fraction() >= config.min_oxygen_fraction)
            .unwrap_or(false);
        let broken = world
            .get::<&MalfunctionManager>(item)
            .map(|m| m.has_malfunction())
            .unwrap_or(false);
        usable && !broken
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::surface::FixedSurface;
    use crate::testing::TestBed;

    const SURVEY: TaskPhase = TaskPhase::new("Survey");

    /// Uses all the time it gets and finishes after `finish_after` millisols.
    struct Survey {
        site: Coordinates,
        finish_after: f64,
        done: f64,
        calls: Rc<Cell<u32>>,
        clear_downs: Rc<Cell<u32>>,
    }

    impl EvaWork for Survey {
        fn site_phase(&self) -> TaskPhase {
            SURVEY
        }

        fn site(&self) -> Coordinates {
            self.site
        }

        fn perform_work(
            &mut self,
            state: &mut TaskState,
            _ctx: &mut TaskContext<'_>,
            time: f64,
        ) -> Result<f64, TaskError> {
            self.calls.set(self.calls.get() + 1);
            let used = time.min(self.finish_after - self.done);
            self.done += used;
            if self.done >= self.finish_after {
                state.end(TaskOutcome::Completed);
            }
            Ok(time - used)
        }

        fn clear_down(&mut self, _state: &TaskState, _ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
            self.clear_downs.set(self.clear_downs.get() + 1);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Counters {
        calls: Rc<Cell<u32>>,
        clear_downs: Rc<Cell<u32>>,
    }

    fn survey_task(bed: &mut TestBed, worker: Entity, finish_after: f64) -> Result<(Task, Counters), TaskError> {
        let counters = Counters {
            calls: Rc::new(Cell::new(0)),
            clear_downs: Rc::new(Cell::new(0)),
        };
        let work = Survey {
            site: Coordinates::new(0.0, 0.0),
            finish_after,
            done: 0.0,
            calls: counters.calls.clone(),
            clear_downs: counters.clear_downs.clone(),
        };
        let impact = ExperienceImpact::new(10.0, NaturalAttributeType::ExperienceAptitude)
            .with_skill(SkillType::Areology);
        let state = TaskState::new("Survey", worker, impact, &bed.world, bed.now);
        let mut ctx = bed.ctx();
        let task = EvaOperation::create(state, work, &mut ctx)?;
        Ok((task, counters))
    }

    fn run(bed: &mut TestBed, task: &mut Task, ticks: usize, time: f64) {
        for _ in 0..ticks {
            let mut ctx = bed.ctx();
            let left = task.perform_task(time, &mut ctx).unwrap();
            assert!(left >= 0.0 && left <= time);
            if task.is_done() {
                break;
            }
        }
    }

    fn suit_in_storage(bed: &TestBed, settlement: Entity, suit: Entity) -> bool {
        bed.world
            .get::<&Storage>(settlement)
            .unwrap()
            .contains_equipment(suit)
    }

    #[test]
    fn test_insufficient_sunlight_never_reaches_site() {
        let mut bed = TestBed::new();
        bed.surface = FixedSurface::night();
        let (settlement, worker) = bed.settlement_with_person();
        let (mut task, counters) = survey_task(&mut bed, worker, 50.0).unwrap();
        let suit = task.behavior::<EvaOperation<Survey>>().unwrap().suit();

        run(&mut bed, &mut task, 5, 20.0);

        assert!(task.is_done());
        assert_eq!(
            task.outcome(),
            Some(&TaskOutcome::Cancelled("Insufficient sunlight".into()))
        );
        assert_eq!(counters.calls.get(), 0);
        assert_eq!(counters.clear_downs.get(), 1);
        assert!(!is_outside(&bed.world, worker));
        assert!(suit_in_storage(&bed, settlement, suit));
        assert_eq!(bed.world.get::<&EquipmentInventory>(worker).unwrap().suit, None);
    }

    #[test]
    fn test_full_trip_outside_and_back() {
        let mut bed = TestBed::new();
        let (settlement, worker) = bed.settlement_with_person();
        let (mut task, counters) = survey_task(&mut bed, worker, 30.0).unwrap();
        let suit = task.behavior::<EvaOperation<Survey>>().unwrap().suit();
        assert_eq!(task.phase(), Some(WALK_TO_OUTSIDE_SITE));
        assert!(!suit_in_storage(&bed, settlement, suit));

        // Half an airlock cycle: still inside
        run(&mut bed, &mut task, 1, 5.0);
        assert!(!is_outside(&bed.world, worker));

        run(&mut bed, &mut task, 1, 10.0);
        assert!(is_outside(&bed.world, worker));
        assert_eq!(task.phase(), Some(SURVEY));

        run(&mut bed, &mut task, 20, 10.0);
        assert_eq!(task.outcome(), Some(&TaskOutcome::Completed));
        assert!(counters.calls.get() > 0);
        assert_eq!(counters.clear_downs.get(), 1);
        assert!(!is_outside(&bed.world, worker));
        assert!(suit_in_storage(&bed, settlement, suit));

        let inventory = *bed.world.get::<&EquipmentInventory>(worker).unwrap();
        assert!(inventory.wearing_garment);
        assert!(inventory.has_thermal_bottle);
        let eva = bed.world.get::<&SkillProfile>(worker).unwrap().experience(SkillType::EvaOperations);
        assert!(eva > 0.0);
    }

    #[test]
    fn test_site_time_expiry_walks_back() {
        let mut bed = TestBed::new();
        bed.config.eva.site_duration = 20.0;
        let (_, worker) = bed.settlement_with_person();
        let (mut task, _) = survey_task(&mut bed, worker, 1000.0).unwrap();
        run(&mut bed, &mut task, 20, 10.0);
        assert_eq!(task.outcome(), Some(&TaskOutcome::Completed));
        let time_on_site = task.behavior::<EvaOperation<Survey>>().unwrap().time_on_site();
        assert!((time_on_site - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_suit_malfunction_outside_turns_back() {
        let mut bed = TestBed::new();
        let (_, worker) = bed.settlement_with_person();
        let (mut task, counters) = survey_task(&mut bed, worker, 1000.0).unwrap();
        let suit = task.behavior::<EvaOperation<Survey>>().unwrap().suit();
        run(&mut bed, &mut task, 2, 10.0);
        assert!(is_outside(&bed.world, worker));

        let now = bed.now;
        bed.world
            .get::<&mut MalfunctionManager>(suit)
            .unwrap()
            .trigger_malfunction("Torn glove", now);
        let calls_before = counters.calls.get();
        run(&mut bed, &mut task, 1, 10.0);
        assert_eq!(task.phase(), Some(WALK_BACK_INSIDE));
        assert_eq!(counters.calls.get(), calls_before);

        run(&mut bed, &mut task, 5, 10.0);
        assert_eq!(
            task.outcome(),
            Some(&TaskOutcome::Cancelled("EVA suit malfunction".into()))
        );
        assert!(!is_outside(&bed.world, worker));
    }

    #[test]
    fn test_no_suit_is_a_precondition_failure() {
        let mut bed = TestBed::new();
        let (settlement, worker) = bed.settlement_with_person();
        let suits: Vec<Entity> = bed.world.get::<&Storage>(settlement).unwrap().equipment().to_vec();
        for suit in suits {
            bed.world.get::<&mut Storage>(settlement).unwrap().remove_equipment(suit);
        }
        let err = survey_task(&mut bed, worker, 10.0).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_robots_are_never_fit() {
        let mut bed = TestBed::new();
        let (settlement, _) = bed.settlement_with_person();
        let robot = bed.robot(settlement);
        assert!(!is_fit_for_eva(&bed.world, robot, &bed.config.eva));
    }
}
