//! Colony engine - main entry point for running the simulation

use std::collections::HashMap;

use colonysim_logic::config::SimulationConfig;
use colonysim_logic::time::{ClockPulse, MarsTime};
use hecs::{Entity, World};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::{name_of, WorkerKind};
use crate::context::TaskContext;
use crate::error::EngineError;
use crate::generation::{generate_colony, ColonyLayout, ScenarioConfig};
use crate::manager::{SettlementCaches, TaskManager};
use crate::meta::{MetaTaskRegistry, TaskJob};
use crate::surface::{MarsSurface, SurfaceFeatures};
use crate::systems::{condition_system, overdue_for_inspection, wear_system};

/// Owns the world and everything the scheduler needs between ticks.
pub struct ColonyEngine {
    /// ECS world containing all entities
    pub world: World,
    config: SimulationConfig,
    registry: MetaTaskRegistry,
    surface: Box<dyn SurfaceFeatures>,
    rng: StdRng,
    time: MarsTime,
    /// Workers in registration order; managers run in this order every tick
    workers: Vec<Entity>,
    managers: HashMap<Entity, TaskManager>,
    settlements: SettlementCaches,
    layout: Option<ColonyLayout>,
}

impl ColonyEngine {
    /// Empty world with the standard meta tasks and the diurnal surface model.
    pub fn new(config: SimulationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            world: World::new(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            registry: MetaTaskRegistry::standard(),
            surface: Box::new(MarsSurface::default()),
            time: MarsTime::START,
            workers: Vec::new(),
            managers: HashMap::new(),
            settlements: SettlementCaches::default(),
            layout: None,
        })
    }

    /// Generate a colony from a scenario and register its crew and robots.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self, EngineError> {
        scenario.validate()?;
        let mut engine = Self::new(scenario.simulation.clone())?;
        let layout = generate_colony(&mut engine.world, scenario, &mut engine.rng);
        for worker in layout.crew.iter().chain(layout.robots.iter()) {
            engine.add_worker(*worker)?;
        }
        info!(
            "Generated {} with {} crew and {} robot(s)",
            scenario.settlement_name,
            layout.crew.len(),
            layout.robots.len()
        );
        engine.layout = Some(layout);
        Ok(engine)
    }

    pub fn with_surface(mut self, surface: impl SurfaceFeatures + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    /// Start scheduling an existing worker entity.
    pub fn add_worker(&mut self, worker: Entity) -> Result<(), EngineError> {
        if self.world.get::<&WorkerKind>(worker).is_err() {
            return Err(EngineError::UnknownWorker(worker));
        }
        if !self.managers.contains_key(&worker) {
            self.workers.push(worker);
            self.managers
                .insert(worker, TaskManager::new(worker, &self.config.scheduler));
        }
        Ok(())
    }

    /// Advance the clock by `elapsed` millisols and give every worker its turn.
    pub fn update(&mut self, elapsed: f64) -> Result<ClockPulse, EngineError> {
        let pulse = ClockPulse::advance(self.time, elapsed);
        self.time = pulse.time;
        if pulse.elapsed <= 0.0 {
            return Ok(pulse);
        }
        if pulse.new_sol {
            info!(
                "{}: {} item(s) overdue for inspection",
                pulse.time,
                overdue_for_inspection(&self.world).len()
            );
        }

        wear_system(&mut self.world, pulse.elapsed);
        condition_system(&mut self.world, pulse.elapsed);

        let mut ctx = TaskContext {
            world: &mut self.world,
            registry: &self.registry,
            settlements: &mut self.settlements,
            surface: self.surface.as_ref(),
            rng: &mut self.rng,
            config: &self.config,
            now: pulse.time,
        };
        for worker in &self.workers {
            let manager = self
                .managers
                .get_mut(worker)
                .ok_or(EngineError::UnknownWorker(*worker))?;
            manager.time_passing(pulse.elapsed, &mut ctx)?;
        }
        debug!("Tick done at {}", pulse.time);
        Ok(pulse)
    }

    /// Run `f` with a context over the engine's state, at the current time.
    pub fn with_context<R>(&mut self, f: impl FnOnce(&mut TaskContext<'_>) -> R) -> R {
        let mut ctx = TaskContext {
            world: &mut self.world,
            registry: &self.registry,
            settlements: &mut self.settlements,
            surface: self.surface.as_ref(),
            rng: &mut self.rng,
            config: &self.config,
            now: self.time,
        };
        f(&mut ctx)
    }

    /// Order a job for a worker; see [`TaskManager::add_pending_task`].
    pub fn add_pending_task(
        &mut self,
        worker: Entity,
        job: TaskJob,
        due: MarsTime,
        allow_duplicate: bool,
    ) -> Result<bool, EngineError> {
        let manager = self
            .managers
            .get_mut(&worker)
            .ok_or(EngineError::UnknownWorker(worker))?;
        Ok(manager.add_pending_task(job, due, allow_duplicate))
    }

    /// Stop a worker's active task.
    pub fn end_current_task(&mut self, worker: Entity, reason: &str) -> Result<(), EngineError> {
        let mut manager = self
            .managers
            .remove(&worker)
            .ok_or(EngineError::UnknownWorker(worker))?;
        let ended = self.with_context(|ctx| manager.end_current_task(reason, ctx));
        self.managers.insert(worker, manager);
        Ok(ended?)
    }

    /// One line describing what a worker is doing.
    pub fn task_summary(&self, worker: Entity) -> Result<String, EngineError> {
        let manager = self.manager(worker).ok_or(EngineError::UnknownWorker(worker))?;
        let name = name_of(&self.world, worker);
        Ok(match manager.current_task() {
            Some(task) => match task.phase() {
                Some(phase) => format!("{}: {} ({})", name, task.description(), phase),
                None => format!("{}: {}", name, task.description()),
            },
            None => format!("{}: idle", name),
        })
    }

    pub fn manager(&self, worker: Entity) -> Option<&TaskManager> {
        self.managers.get(&worker)
    }

    pub fn workers(&self) -> &[Entity] {
        &self.workers
    }

    pub fn time(&self) -> MarsTime {
        self.time
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &MetaTaskRegistry {
        &self.registry
    }

    /// Register additional meta tasks.
    pub fn registry_mut(&mut self) -> &mut MetaTaskRegistry {
        &mut self.registry
    }

    pub fn settlements(&self) -> &SettlementCaches {
        &self.settlements
    }

    pub fn layout(&self) -> Option<&ColonyLayout> {
        self.layout.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::FixedSurface;

    fn small_scenario() -> ScenarioConfig {
        ScenarioConfig {
            crew: 2,
            robots: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_engine_creation() {
        let engine = ColonyEngine::new(SimulationConfig::default()).unwrap();
        assert!(engine.workers().is_empty());
        assert_eq!(engine.time(), MarsTime::START);
        assert_eq!(engine.registry().len(), 5);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = SimulationConfig::default();
        config.scheduler.task_cache_interval = -1.0;
        assert!(ColonyEngine::new(config).is_err());
    }

    #[test]
    fn test_from_scenario() {
        let engine = ColonyEngine::from_scenario(&small_scenario()).unwrap();
        assert_eq!(engine.workers().len(), 3);
        assert!(engine.layout().unwrap().settlement.is_some());
    }

    #[test]
    fn test_engine_update() {
        let mut engine = ColonyEngine::from_scenario(&small_scenario())
            .unwrap()
            .with_surface(FixedSurface::daylight());
        for _ in 0..200 {
            engine.update(5.0).unwrap();
        }
        assert!((engine.time().total_millisols() - 1000.0).abs() < 1e-6);
        for worker in engine.workers().to_vec() {
            let summary = engine.task_summary(worker).unwrap();
            assert!(!summary.is_empty());
        }
    }

    #[test]
    fn test_non_workers_are_refused() {
        let mut engine = ColonyEngine::new(SimulationConfig::default()).unwrap();
        let rock = engine.world.spawn(());
        assert!(matches!(
            engine.add_worker(rock),
            Err(EngineError::UnknownWorker(_))
        ));
        assert!(engine.task_summary(rock).is_err());
    }
}
