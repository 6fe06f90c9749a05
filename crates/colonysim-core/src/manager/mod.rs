//! Per-worker scheduling.
//!
//! Each worker owns a [`TaskManager`]. On every clock pulse the manager
//! either feeds the elapsed time to the worker's active task, or picks a new
//! one: a due [`PendingTask`] first, otherwise a weighted random draw from
//! the worker's [`TaskCache`]. The cache holds every candidate the worker's
//! applicable meta tasks proposed, rated for that worker, and is rebuilt
//! when it expires, when the worker goes on or off duty, or when the
//! settlement's own candidates change.

use std::collections::VecDeque;
use std::fmt;

use colonysim_logic::config::SchedulerConfig;
use colonysim_logic::selection::weighted_index;
use colonysim_logic::time::MarsTime;
use hecs::Entity;
use log::{debug, info, warn};
use rand::Rng;

use crate::components::{name_of, release_activity_spot, settlement_of, WorkerKind};
use crate::context::{SettlementView, TaskContext};
use crate::error::TaskError;
use crate::meta::TaskJob;
use crate::task::{Task, TaskOutcome};

mod settlement;

pub use settlement::{SettlementCaches, SettlementTaskCache};

/// A job ordered for a worker, to run once `due` has passed.
#[derive(Debug, Clone)]
pub struct PendingTask {
    pub job: TaskJob,
    pub due: MarsTime,
}

/// Whether a worker was on shift when its cache was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyContext {
    OnDuty,
    OffDuty,
}

impl DutyContext {
    pub fn is_on_duty(self) -> bool {
        self == DutyContext::OnDuty
    }
}

impl fmt::Display for DutyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyContext::OnDuty => write!(f, "on duty"),
            DutyContext::OffDuty => write!(f, "off duty"),
        }
    }
}

/// A worker's rated candidates.
#[derive(Debug, Clone)]
pub struct TaskCache {
    pub context: DutyContext,
    jobs: Vec<TaskJob>,
    total: f64,
    created: MarsTime,
    settlement_generation: u64,
    last_selection: Option<String>,
    last_probability: Option<f64>,
}

impl TaskCache {
    fn new(context: DutyContext, jobs: Vec<TaskJob>, created: MarsTime, settlement_generation: u64) -> Self {
        let total = jobs.iter().map(|j| j.score.score()).sum();
        Self {
            context,
            jobs,
            total,
            created,
            settlement_generation,
            last_selection: None,
            last_probability: None,
        }
    }

    pub fn jobs(&self) -> &[TaskJob] {
        &self.jobs
    }

    /// Sum of all candidate scores.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn created(&self) -> MarsTime {
        self.created
    }

    pub fn last_selection(&self) -> Option<&str> {
        self.last_selection.as_deref()
    }

    /// Draw a job with probability proportional to its score. Jobs whose
    /// focus is already fully claimed weigh nothing, however fresh the cache.
    fn select(&mut self, roll: f64, settlements: &SettlementCaches) -> Option<usize> {
        let weights: Vec<f64> = self
            .jobs
            .iter()
            .map(|j| if j.is_saturated(settlements) { 0.0 } else { j.score.score() })
            .collect();
        let index = weighted_index(&weights, roll)?;
        let available: f64 = weights.iter().sum();
        self.last_selection = Some(self.jobs[index].description.clone());
        self.last_probability = Some(weights[index] / available);
        Some(index)
    }

    /// Drop a job that failed to start. It stays out until the next rebuild.
    fn remove(&mut self, index: usize) {
        if index < self.jobs.len() {
            let job = self.jobs.remove(index);
            self.total = (self.total - job.score.score()).max(0.0);
        }
    }
}

/// One line of a worker's activity history.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub time: MarsTime,
    pub task: String,
    pub phase: Option<&'static str>,
    pub description: String,
}

/// Scheduler state for one worker.
#[derive(Debug)]
pub struct TaskManager {
    worker: Entity,
    current: Option<Task>,
    current_focus: Option<Entity>,
    last_task: Option<Task>,
    pending: VecDeque<PendingTask>,
    cache: Option<TaskCache>,
    activity_log: VecDeque<ActivityRecord>,
    max_pending: usize,
    log_len: usize,
}

impl TaskManager {
    pub fn new(worker: Entity, config: &SchedulerConfig) -> Self {
        Self {
            worker,
            current: None,
            current_focus: None,
            last_task: None,
            pending: VecDeque::new(),
            cache: None,
            activity_log: VecDeque::new(),
            max_pending: config.max_pending_tasks,
            log_len: config.activity_log_len.max(1),
        }
    }

    pub fn worker(&self) -> Entity {
        self.worker
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current.as_ref()
    }

    pub fn has_active_task(&self) -> bool {
        self.current.as_ref().map_or(false, |t| !t.is_done())
    }

    pub fn last_task(&self) -> Option<&Task> {
        self.last_task.as_ref()
    }

    pub fn last_task_name(&self) -> Option<&str> {
        self.last_task.as_ref().map(|t| t.name())
    }

    pub fn cache(&self) -> Option<&TaskCache> {
        self.cache.as_ref()
    }

    /// Probability the most recent cache draw had.
    pub fn latest_task_probability(&self) -> Option<f64> {
        self.cache.as_ref().and_then(|c| c.last_probability)
    }

    pub fn pending_tasks(&self) -> impl Iterator<Item = &PendingTask> {
        self.pending.iter()
    }

    pub fn activity_log(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.activity_log.iter()
    }

    /// Queue a job. Refused when the queue is full, or when an equal job is
    /// already queued and duplicates are not allowed.
    pub fn add_pending_task(&mut self, job: TaskJob, due: MarsTime, allow_duplicate: bool) -> bool {
        if self.pending.len() >= self.max_pending {
            return false;
        }
        let duplicate = self
            .pending
            .iter()
            .any(|p| p.job.meta == job.meta && p.job.focus == job.focus);
        if duplicate && !allow_duplicate {
            return false;
        }
        self.pending.push_back(PendingTask { job, due });
        true
    }

    /// Remove the first queued job with this description.
    pub fn delete_pending_task(&mut self, description: &str) -> bool {
        match self.pending.iter().position(|p| p.job.description == description) {
            Some(index) => self.pending.remove(index).is_some(),
            None => false,
        }
    }

    /// Stop the active task now.
    pub fn end_current_task(&mut self, reason: impl Into<String>, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let ended = match self.current.as_mut() {
            Some(task) => task.end_task(TaskOutcome::Cancelled(reason.into()), ctx),
            None => Ok(()),
        };
        self.retire_task(ctx);
        ended
    }

    /// Spend one pulse of `time` millisols. At most one new task starts.
    pub fn time_passing(&mut self, time: f64, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        if !time.is_finite() || time <= 0.0 {
            return Ok(());
        }

        if let Some(task) = self.current.as_mut() {
            if !task.is_done() {
                task.perform_task(time, ctx)?;
                self.record_activity(ctx.now);
                self.retire_task(ctx);
                return Ok(());
            }
        }
        self.retire_task(ctx);

        let (job, cache_index) = match self.take_due_pending(ctx.now) {
            Some(job) => (job, None),
            None => {
                if self.cache_is_stale(ctx)? {
                    self.rebuild_cache(ctx)?;
                }
                let roll: f64 = ctx.rng.gen();
                let Some(cache) = self.cache.as_mut() else {
                    return Ok(());
                };
                let Some(index) = cache.select(roll, ctx.settlements) else {
                    return Ok(());
                };
                (cache.jobs[index].clone(), Some(index))
            }
        };

        let mut task = match job.create_task(self.worker, ctx) {
            Ok(task) => task,
            Err(TaskError::Precondition(reason)) => {
                warn!(
                    "{} could not start {}: {}",
                    name_of(ctx.world, self.worker),
                    job.description,
                    reason
                );
                if let (Some(cache), Some(index)) = (self.cache.as_mut(), cache_index) {
                    cache.remove(index);
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        info!(
            "{} started {} at {}",
            name_of(ctx.world, self.worker),
            task.description(),
            ctx.now
        );
        if let Some(focus) = job.focus {
            ctx.settlements.claim(focus);
            self.current_focus = Some(focus);
        }
        if let Err(e) = task.perform_task(time, ctx) {
            self.abandon_start(ctx);
            return Err(e);
        }
        self.current = Some(task);
        self.record_activity(ctx.now);
        self.retire_task(ctx);
        Ok(())
    }

    /// Move a finished task to `last_task` and release its focus.
    fn retire_task(&mut self, ctx: &mut TaskContext<'_>) {
        if !self.current.as_ref().map_or(false, |t| t.is_done()) {
            return;
        }
        self.last_task = self.current.take();
        if let Some(focus) = self.current_focus.take() {
            ctx.settlements.release(focus);
        }
    }

    /// Undo the claims of a task that failed on its first pulse.
    fn abandon_start(&mut self, ctx: &mut TaskContext<'_>) {
        if let Some(focus) = self.current_focus.take() {
            ctx.settlements.release(focus);
        }
        release_activity_spot(ctx.world, self.worker);
    }

    fn take_due_pending(&mut self, now: MarsTime) -> Option<TaskJob> {
        let index = self.pending.iter().position(|p| p.due <= now)?;
        self.pending.remove(index).map(|p| p.job)
    }

    fn duty_context(&self, ctx: &TaskContext<'_>) -> Result<DutyContext, TaskError> {
        let kind = *ctx
            .world
            .get::<&WorkerKind>(self.worker)
            .map_err(|_| TaskError::missing(self.worker, "WorkerKind"))?;
        Ok(if kind.is_on_duty(ctx.now) {
            DutyContext::OnDuty
        } else {
            DutyContext::OffDuty
        })
    }

    fn cache_is_stale(&self, ctx: &TaskContext<'_>) -> Result<bool, TaskError> {
        let Some(cache) = self.cache.as_ref() else {
            return Ok(true);
        };
        let settlement = settlement_of(ctx.world, self.worker)
            .ok_or_else(|| TaskError::missing(self.worker, "Location"))?;
        Ok(ctx.now.since(cache.created) >= ctx.config.scheduler.task_cache_interval
            || cache.context != self.duty_context(ctx)?
            || ctx.settlements.is_dirty(settlement)
            || ctx.settlements.generation(settlement) != cache.settlement_generation)
    }

    /// Rate every candidate the worker's applicable meta tasks offer.
    fn rebuild_cache(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let worker = self.worker;
        let kind = *ctx
            .world
            .get::<&WorkerKind>(worker)
            .map_err(|_| TaskError::missing(worker, "WorkerKind"))?;
        let settlement = settlement_of(ctx.world, worker).ok_or_else(|| TaskError::missing(worker, "Location"))?;
        let context = self.duty_context(ctx)?;
        let on_duty = context.is_on_duty();
        let registry = ctx.registry;

        let view = SettlementView {
            world: &*ctx.world,
            surface: ctx.surface,
            config: ctx.config,
            now: ctx.now,
        };
        ctx.settlements.refresh(settlement, registry, view, &mut *ctx.rng);
        let caches = &*ctx.settlements;
        let candidates = caches.get(settlement).map(|c| c.tasks()).unwrap_or(&[]);

        let mut jobs = Vec::new();
        for meta in registry.applicable(&kind, on_duty) {
            if let Some(settlement_meta) = meta.as_settlement_meta() {
                for task in candidates.iter().filter(|t| t.meta == meta.name()) {
                    if task.focus.map_or(false, |f| caches.claims(f) >= task.demand) {
                        continue;
                    }
                    let score = match kind {
                        WorkerKind::Person { .. } => settlement_meta.assess_person_suitability(task, worker, view),
                        WorkerKind::Robot { .. } => settlement_meta.assess_robot_suitability(task, worker, view),
                    };
                    if !score.is_zero() {
                        jobs.push(TaskJob::from_settlement_task(task, score));
                    }
                }
            }
            jobs.extend(
                meta.worker_jobs(worker, view, &mut *ctx.rng)
                    .into_iter()
                    .filter(|j| !j.score.is_zero()),
            );
        }

        debug!(
            "{} has {} candidate(s) ({})",
            name_of(ctx.world, worker),
            jobs.len(),
            context
        );
        let generation = caches.generation(settlement);
        self.cache = Some(TaskCache::new(context, jobs, ctx.now, generation));
        Ok(())
    }

    fn record_activity(&mut self, now: MarsTime) {
        let Some(task) = self.current.as_ref() else {
            return;
        };
        let record = ActivityRecord {
            time: now,
            task: task.name().to_string(),
            phase: task.phase().map(|p| p.name()),
            description: task.description().to_string(),
        };
        let unchanged = self
            .activity_log
            .back()
            .map_or(false, |r| r.task == record.task && r.phase == record.phase && r.description == record.description);
        if unchanged {
            return;
        }
        self.activity_log.push_back(record);
        while self.activity_log.len() > self.log_len {
            self.activity_log.pop_front();
        }
    }
}
