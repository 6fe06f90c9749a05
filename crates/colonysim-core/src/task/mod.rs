//! The generic task state machine.
//!
//! A [`Task`] is split into two halves:
//!
//! - [`TaskState`]: the bookkeeping every task shares (worker, phase, status,
//!   time completed, duration, experience impact, effective skill);
//! - a boxed [`TaskBehavior`]: the task kind's own phase handlers and
//!   clear-down hook.
//!
//! [`Task::perform_task`] drives phases until the tick's time is used up,
//! the task ends, or a phase makes no progress. [`Task::perform_mapped_phase`]
//! is the single dispatch point, and [`Task::end_task`] the single
//! finalization point: it runs [`TaskBehavior::clear_down`] exactly once,
//! whichever way the task ends.
//!
//! Behaviors never finalize a task themselves. They call
//! [`TaskState::end`] and the task finalizes as soon as the phase handler
//! returns.

use std::any::Any;
use std::fmt;

use colonysim_logic::accident::{accident_chance, accident_occurs};
use colonysim_logic::skills::{ExperienceGain, ExperienceImpact, NaturalAttributes, SkillProfile};
use colonysim_logic::time::MarsTime;
use hecs::{Entity, World};
use log::{info, warn};
use rand::Rng;

use crate::components::{
    name_of, release_activity_spot, settlement_of, MalfunctionManager, PhysicalCondition,
};
use crate::context::TaskContext;
use crate::error::TaskError;

mod collect_minerals;
mod eva;
mod explore_site;
mod maintain;
mod mine_site;
mod relax;

pub use collect_minerals::{empty_bag, CollectMinedMinerals, COLLECT_MINERALS};
pub use eva::{
    find_available_suit, is_fit_for_eva, EvaOperation, EvaWork, WALK_BACK_INSIDE,
    WALK_TO_OUTSIDE_SITE,
};
pub use explore_site::{ExploreSite, EXPLORING};
pub use maintain::{MaintainEntity, MAINTAIN};
pub use mine_site::{MineSite, MINING};
pub use relax::{Relax, RELAXING};

/// Named state within a task's private state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskPhase(&'static str);

impl TaskPhase {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Cancelled(String),
    Failed(String),
}

impl TaskOutcome {
    pub fn reason(&self) -> Option<&str> {
        match self {
            TaskOutcome::Completed => None,
            TaskOutcome::Cancelled(r) | TaskOutcome::Failed(r) => Some(r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Active,
    Done(TaskOutcome),
}

/// Bookkeeping shared by every task kind.
#[derive(Debug, Clone)]
pub struct TaskState {
    worker: Entity,
    name: String,
    description: String,
    phase: Option<TaskPhase>,
    status: TaskStatus,
    time_completed: f64,
    duration: Option<f64>,
    impact: ExperienceImpact,
    effective_skill: f64,
    end_request: Option<TaskOutcome>,
    started: MarsTime,
}

impl TaskState {
    /// New task state. The effective skill is the worker's average level
    /// in the impact's skills, scaled by current performance.
    pub fn new(
        name: impl Into<String>,
        worker: Entity,
        impact: ExperienceImpact,
        world: &World,
        now: MarsTime,
    ) -> Self {
        let name = name.into();
        let level = world
            .get::<&SkillProfile>(worker)
            .map(|p| impact.effective_skill(&p))
            .unwrap_or(0.0);
        let performance = world
            .get::<&PhysicalCondition>(worker)
            .map(|c| c.performance())
            .unwrap_or(1.0);
        Self {
            worker,
            description: name.clone(),
            name,
            phase: None,
            status: TaskStatus::Active,
            time_completed: 0.0,
            duration: None,
            impact,
            effective_skill: level * performance,
            end_request: None,
            started: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration.max(0.0));
        self
    }

    pub fn with_phase(mut self, phase: TaskPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn worker(&self) -> Entity {
        self.worker
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn phase(&self) -> Option<TaskPhase> {
        self.phase
    }

    pub fn set_phase(&mut self, phase: TaskPhase) {
        if !self.is_done() {
            self.phase = Some(phase);
        }
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status, TaskStatus::Done(_))
    }

    pub fn outcome(&self) -> Option<&TaskOutcome> {
        match &self.status {
            TaskStatus::Done(outcome) => Some(outcome),
            TaskStatus::Active => None,
        }
    }

    pub fn time_completed(&self) -> f64 {
        self.time_completed
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn started(&self) -> MarsTime {
        self.started
    }

    pub fn impact(&self) -> &ExperienceImpact {
        &self.impact
    }

    pub fn effective_skill(&self) -> f64 {
        self.effective_skill
    }

    /// Ask for the task to end once the current phase handler returns.
    /// The first request wins.
    pub fn end(&mut self, outcome: TaskOutcome) {
        if self.end_request.is_none() && !self.is_done() {
            self.end_request = Some(outcome);
        }
    }

    pub fn is_ending(&self) -> bool {
        self.end_request.is_some()
    }

    /// Withdraw a pending end request so a wrapper can act on it first.
    pub(crate) fn take_end_request(&mut self) -> Option<TaskOutcome> {
        self.end_request.take()
    }

    pub(crate) fn unknown_phase(&self, phase: TaskPhase) -> TaskError {
        TaskError::UnknownPhase {
            task: self.name.clone(),
            phase: phase.name(),
        }
    }

    /// Grant experience from the task's own impact.
    pub fn add_experience(
        &self,
        time: f64,
        ctx: &mut TaskContext<'_>,
    ) -> Result<ExperienceGain, TaskError> {
        add_experience(ctx, self.worker, &self.impact, time)
    }

    /// Accident check on `entity` using this task's effective skill.
    pub fn check_for_accident(
        &self,
        entity: Entity,
        time: f64,
        base_chance: f64,
        ctx: &mut TaskContext<'_>,
    ) -> Result<bool, TaskError> {
        check_for_accident(ctx, self.worker, entity, time, base_chance, self.effective_skill)
    }
}

/// Phase handlers and clean-up of one task kind.
pub trait TaskBehavior: Any {
    /// Run `phase` for up to `time` millisols and return the time left over.
    fn perform_phase(
        &mut self,
        phase: TaskPhase,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError>;

    /// Return borrowed equipment and containers. Called exactly once.
    fn clear_down(&mut self, _state: &TaskState, _ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
}

/// A running activity bound to one worker.
pub struct Task {
    state: TaskState,
    behavior: Box<dyn TaskBehavior>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("state", &self.state).finish()
    }
}

impl Task {
    pub fn new(state: TaskState, behavior: impl TaskBehavior) -> Self {
        Self {
            state,
            behavior: Box::new(behavior),
        }
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn name(&self) -> &str {
        self.state.name()
    }

    pub fn description(&self) -> &str {
        self.state.description()
    }

    pub fn phase(&self) -> Option<TaskPhase> {
        self.state.phase()
    }

    pub fn worker(&self) -> Entity {
        self.state.worker()
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn outcome(&self) -> Option<&TaskOutcome> {
        self.state.outcome()
    }

    /// Inspect the concrete behavior.
    pub fn behavior<T: TaskBehavior>(&self) -> Option<&T> {
        self.behavior.as_any().downcast_ref::<T>()
    }

    /// Spend up to `time` millisols on the task. Returns the unused time,
    /// always within `[0, time]`.
    pub fn perform_task(&mut self, time: f64, ctx: &mut TaskContext<'_>) -> Result<f64, TaskError> {
        if !time.is_finite() || time <= 0.0 {
            return Ok(0.0);
        }
        if self.is_done() {
            return Ok(time);
        }

        let max_steps = ctx.config.scheduler.max_phase_steps.max(1);
        let mut remaining = time;
        let mut steps = 0;

        while remaining > 0.0 && !self.is_done() && steps < max_steps {
            steps += 1;
            let phase_before = self.state.phase;

            let available = match self.state.duration {
                Some(duration) => remaining.min((duration - self.state.time_completed).max(0.0)),
                None => remaining,
            };

            let left = self.perform_mapped_phase(available, ctx)?;
            let used = available - left;
            self.state.time_completed += used;
            remaining = (remaining - used).max(0.0);

            if let Some(outcome) = self.state.end_request.take() {
                self.end_task(outcome, ctx)?;
                break;
            }
            if let Some(duration) = self.state.duration {
                if self.state.time_completed >= duration {
                    self.end_task(TaskOutcome::Completed, ctx)?;
                    break;
                }
            }
            if used <= 0.0 && self.state.phase == phase_before {
                break;
            }
        }

        Ok(remaining.clamp(0.0, time))
    }

    /// Dispatch `time` to the current phase's handler.
    pub fn perform_mapped_phase(
        &mut self,
        time: f64,
        ctx: &mut TaskContext<'_>,
    ) -> Result<f64, TaskError> {
        let phase = self.state.phase.ok_or_else(|| TaskError::MissingPhase {
            task: self.state.name.clone(),
        })?;
        let left = self.behavior.perform_phase(phase, &mut self.state, ctx, time)?;
        Ok(if left.is_finite() { left.clamp(0.0, time) } else { 0.0 })
    }

    /// Finalize the task. Safe to call more than once; only the first call
    /// has any effect.
    pub fn end_task(&mut self, outcome: TaskOutcome, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        if self.is_done() {
            return Ok(());
        }
        let worker = self.state.worker;
        let who = name_of(ctx.world, worker);
        match &outcome {
            TaskOutcome::Completed => info!("{} completed {}", who, self.state.name),
            TaskOutcome::Cancelled(reason) => {
                info!("{} ended {} early: {}", who, self.state.name, reason)
            }
            TaskOutcome::Failed(reason) => warn!("{} failed {}: {}", who, self.state.name, reason),
        }

        self.state.end_request = None;
        self.state.status = TaskStatus::Done(outcome);
        let cleared = self.behavior.clear_down(&self.state, ctx);
        self.state.phase = None;
        release_activity_spot(ctx.world, worker);
        cleared
    }

    /// End the task because something went wrong.
    pub fn clear_task(&mut self, reason: impl Into<String>, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        if self.is_done() {
            return Ok(());
        }
        let reason = reason.into();
        warn!(
            "Clearing {} for {}: {}",
            self.state.name,
            name_of(ctx.world, self.state.worker),
            reason
        );
        self.end_task(TaskOutcome::Failed(reason), ctx)
    }
}

/// Apply an experience impact to a worker's skills and condition.
pub fn add_experience(
    ctx: &mut TaskContext<'_>,
    worker: Entity,
    impact: &ExperienceImpact,
    time: f64,
) -> Result<ExperienceGain, TaskError> {
    let attributes = ctx
        .world
        .get::<&NaturalAttributes>(worker)
        .map(|a| (*a).clone())
        .unwrap_or_default();
    let gain = {
        let mut skills = ctx
            .world
            .get::<&mut SkillProfile>(worker)
            .map_err(|_| TaskError::missing(worker, "SkillProfile"))?;
        impact.apply(&mut skills, &attributes, time, &ctx.config.skills)
    };
    if let Ok(mut condition) = ctx.world.get::<&mut PhysicalCondition>(worker) {
        condition.add_stress(gain.stress);
        condition.add_fatigue(gain.fatigue);
    }
    if gain.levels_gained > 0 {
        info!(
            "{} gained {} skill level(s)",
            name_of(ctx.world, worker),
            gain.levels_gained
        );
    }
    Ok(gain)
}

/// Stochastic hazard check over `time` millisols. On an accident the
/// entity gets a malfunction and the settlement's candidates are refreshed.
pub fn check_for_accident(
    ctx: &mut TaskContext<'_>,
    worker: Entity,
    entity: Entity,
    time: f64,
    base_chance: f64,
    skill: f64,
) -> Result<bool, TaskError> {
    let modifier = ctx
        .world
        .get::<&MalfunctionManager>(entity)
        .map_err(|_| TaskError::missing(entity, "MalfunctionManager"))?
        .accident_modifier();
    let chance = accident_chance(base_chance, skill, modifier);
    let roll: f64 = ctx.rng.gen();
    if !accident_occurs(chance, time, roll) {
        return Ok(false);
    }

    ctx.world
        .get::<&mut MalfunctionManager>(entity)
        .map_err(|_| TaskError::missing(entity, "MalfunctionManager"))?
        .trigger_malfunction("Accident", ctx.now);
    warn!(
        "{} had an accident with {}",
        name_of(ctx.world, worker),
        name_of(ctx.world, entity)
    );
    if let Some(settlement) = settlement_of(ctx.world, worker) {
        ctx.mark_settlement_dirty(settlement);
    }
    Ok(true)
}
