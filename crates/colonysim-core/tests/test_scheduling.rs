//! Scheduler behavior across meta tasks, task managers and settlement caches.

use colonysim_core::generation::{spawn_building, spawn_person, spawn_robot, spawn_settlement};
use colonysim_core::manager::{SettlementCaches, TaskManager};
use colonysim_core::meta::{MetaTaskRegistry, TaskJob, MAINTENANCE, RELAX};
use colonysim_core::prelude::*;
use colonysim_core::surface::FixedSurface;
use colonysim_core::task::MaintainEntity;
use colonysim_logic::config::SimulationConfig;
use colonysim_logic::rating::RatingScore;
use colonysim_logic::skills::{NaturalAttributes, SkillProfile, SkillType};
use colonysim_logic::time::MarsTime;
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A settlement with one workshop and nothing else that can wear.
struct Colony {
    world: World,
    registry: MetaTaskRegistry,
    settlements: SettlementCaches,
    surface: FixedSurface,
    rng: StdRng,
    config: SimulationConfig,
    now: MarsTime,
    settlement: Entity,
}

impl Colony {
    fn new(seed: u64) -> Self {
        let mut world = World::new();
        let settlement = spawn_settlement(&mut world, "Test Base", Coordinates::new(0.0, 0.0), 5000.0);
        spawn_building(
            &mut world,
            settlement,
            "Workshop",
            Building::new(&[]).with_spots(BuildingFunction::Workshop, 4),
        );
        spawn_building(
            &mut world,
            settlement,
            "Lounge",
            Building::new(&[]).with_spots(BuildingFunction::Recreation, 4),
        );
        Self {
            world,
            registry: MetaTaskRegistry::standard(),
            settlements: SettlementCaches::default(),
            surface: FixedSurface::daylight(),
            rng: StdRng::seed_from_u64(seed),
            config: SimulationConfig::default(),
            now: MarsTime::from_sol(1, 100.0),
            settlement,
        }
    }

    fn ctx(&mut self) -> TaskContext<'_> {
        TaskContext {
            world: &mut self.world,
            registry: &self.registry,
            settlements: &mut self.settlements,
            surface: &self.surface,
            rng: &mut self.rng,
            config: &self.config,
            now: self.now,
        }
    }

    fn view(&self) -> SettlementView<'_> {
        SettlementView {
            world: &self.world,
            surface: &self.surface,
            config: &self.config,
            now: self.now,
        }
    }

    fn robot(&mut self, name: &str) -> Entity {
        spawn_robot(
            &mut self.world,
            self.settlement,
            Name::new(name),
            RobotType::Repairbot,
            SkillProfile::with_levels(&[(SkillType::Mechanics, 2)]),
        )
    }

    fn person(&mut self, name: &str) -> Entity {
        spawn_person(
            &mut self.world,
            self.settlement,
            Name::new(name),
            WorkerKind::Person {
                shift: Shift::OnCall,
                job: Job::Engineer,
                favorite: FavoriteActivity::Tinkering,
            },
            SkillProfile::default(),
            NaturalAttributes::default(),
        )
    }

    /// Run `entity` past its inspection window with `condition` percent left.
    fn wear(&mut self, entity: Entity, condition: f64) {
        let mut manager = self.world.get::<&mut MalfunctionManager>(entity).unwrap();
        manager.set_condition(condition);
        manager.active_time_passing(600.0);
    }

    fn manager(&self, worker: Entity) -> TaskManager {
        TaskManager::new(worker, &self.config.scheduler)
    }

    fn maintained_entity(manager: &TaskManager) -> Option<Entity> {
        manager
            .current_task()
            .and_then(|t| t.behavior::<MaintainEntity>())
            .map(|m| m.entity())
    }
}

#[test]
fn maintenance_candidates_follow_wear() {
    let mut colony = Colony::new(1);
    let robot = colony.robot("Bot A");
    let mut caches = SettlementCaches::default();
    let mut rng = StdRng::seed_from_u64(11);

    caches.refresh(colony.settlement, &colony.registry, colony.view(), &mut rng);
    assert!(caches.get(colony.settlement).unwrap().tasks().is_empty());

    colony.wear(robot, 50.0);
    caches.mark_dirty(colony.settlement);
    caches.refresh(colony.settlement, &colony.registry, colony.view(), &mut rng);

    let tasks = caches.get(colony.settlement).unwrap().tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].meta, MAINTENANCE);
    assert_eq!(tasks[0].focus, Some(robot));
    // 1 + 50 * 0.2 + 1.2 * 10
    assert!((tasks[0].score.score() - 23.0).abs() < 1e-9);
}

#[test]
fn one_task_at_a_time() {
    let mut colony = Colony::new(2);
    let worn = colony.robot("Bot A");
    let other = colony.robot("Bot C");
    let worker = colony.robot("Bot B");
    colony.wear(worn, 50.0);
    colony.wear(other, 50.0);
    let mut manager = colony.manager(worker);

    manager.time_passing(1.0, &mut colony.ctx()).unwrap();
    let first = Colony::maintained_entity(&manager).expect("maintenance started");
    assert_eq!(manager.current_task().unwrap().name(), "Maintenance");
    assert_eq!(colony.settlements.claims(first), 1);

    for _ in 0..5 {
        colony.now = colony.now.add_millisols(1.0);
        manager.time_passing(1.0, &mut colony.ctx()).unwrap();
        assert_eq!(Colony::maintained_entity(&manager), Some(first));
    }
    assert_eq!(manager.activity_log().count(), 1);
}

#[test]
fn selection_is_proportional_to_score() {
    // Scores 33 (worn out) and about 13 (nearly new): 72% for the worn robot
    let runs = 400;
    let mut worn_picks = 0;
    let mut picks = 0;
    for seed in 0..runs {
        let mut colony = Colony::new(seed);
        let worn = colony.robot("Bot A");
        let fresh = colony.robot("Bot C");
        let worker = colony.robot("Bot B");
        colony.wear(worn, 0.0);
        colony.wear(fresh, 100.0);
        let mut manager = colony.manager(worker);
        manager.time_passing(1.0, &mut colony.ctx()).unwrap();
        match Colony::maintained_entity(&manager) {
            Some(e) if e == worn => {
                worn_picks += 1;
                picks += 1;
            }
            Some(e) if e == fresh => picks += 1,
            _ => {}
        }
    }
    assert_eq!(picks, runs);
    let share = worn_picks as f64 / picks as f64;
    assert!(share > 0.62 && share < 0.81, "worn share {}", share);
}

#[test]
fn demand_limits_workers_per_focus() {
    let mut colony = Colony::new(3);
    let worn = colony.robot("Bot A");
    let first = colony.robot("Bot B");
    let second = colony.robot("Bot C");
    colony.wear(worn, 50.0);
    let mut managers = [colony.manager(first), colony.manager(second)];

    for manager in managers.iter_mut() {
        manager.time_passing(1.0, &mut colony.ctx()).unwrap();
    }
    assert_eq!(Colony::maintained_entity(&managers[0]), Some(worn));
    assert!(managers[1].current_task().is_none());
    assert_eq!(colony.settlements.claims(worn), 1);
}

#[test]
fn pending_tasks_run_before_the_cache() {
    let mut colony = Colony::new(4);
    let person = colony.person("Ada");
    let mut manager = colony.manager(person);
    let job = TaskJob::new(RELAX, "Ordered break", RatingScore::new("order", 1.0));
    assert!(manager.add_pending_task(job.clone(), colony.now, false));
    assert!(!manager.add_pending_task(job, colony.now, false));

    manager.time_passing(1.0, &mut colony.ctx()).unwrap();
    assert_eq!(manager.current_task().unwrap().name(), "Relax");
    assert!(manager.cache().is_none());
    assert_eq!(manager.pending_tasks().count(), 0);
}

#[test]
fn future_pending_tasks_wait() {
    let mut colony = Colony::new(5);
    let person = colony.person("Ada");
    let mut manager = colony.manager(person);
    let job = TaskJob::new(RELAX, "Later break", RatingScore::new("order", 1.0));
    manager.add_pending_task(job, colony.now.add_millisols(100.0), false);

    manager.time_passing(1.0, &mut colony.ctx()).unwrap();
    assert_eq!(manager.pending_tasks().count(), 1);
    assert!(manager.cache().is_some());
}

#[test]
fn failed_start_leaves_worker_idle() {
    let mut colony = Colony::new(6);
    let person = colony.person("Ada");
    set_place(&mut colony.world, person, Place::Outside(Coordinates::default())).unwrap();
    let mut manager = colony.manager(person);

    manager.time_passing(1.0, &mut colony.ctx()).unwrap();
    assert!(manager.current_task().is_none());
    assert!(manager.last_task().is_none());
    assert!(manager.activity_log().next().is_none());
}
