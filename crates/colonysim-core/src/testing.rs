//! Shared fixture for unit tests.

use colonysim_logic::config::SimulationConfig;
use colonysim_logic::skills::{NaturalAttributes, SkillProfile, SkillType};
use colonysim_logic::time::MarsTime;
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::*;
use crate::context::{SettlementView, TaskContext};
use crate::generation::{spawn_eva_suit, spawn_person, spawn_robot, spawn_rover, spawn_settlement, standard_buildings};
use crate::manager::SettlementCaches;
use crate::meta::MetaTaskRegistry;
use crate::surface::FixedSurface;

/// Everything a [`TaskContext`] borrows, owned in one place.
pub(crate) struct TestBed {
    pub world: World,
    pub registry: MetaTaskRegistry,
    pub settlements: SettlementCaches,
    pub surface: FixedSurface,
    pub rng: StdRng,
    pub config: SimulationConfig,
    pub now: MarsTime,
}

impl TestBed {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            registry: MetaTaskRegistry::standard(),
            settlements: SettlementCaches::default(),
            surface: FixedSurface::daylight(),
            rng: StdRng::seed_from_u64(7),
            config: SimulationConfig::default(),
            now: MarsTime::from_sol(1, 300.0),
        }
    }

    pub fn ctx(&mut self) -> TaskContext<'_> {
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

    pub fn view(&self) -> SettlementView<'_> {
        SettlementView {
            world: &self.world,
            surface: &self.surface,
            config: &self.config,
            now: self.now,
        }
    }

    /// Settlement with the standard buildings, two suits and basic stores.
    pub fn settlement(&mut self) -> Entity {
        let settlement = spawn_settlement(&mut self.world, "Test Base", Coordinates::new(0.0, 0.0), 5000.0);
        standard_buildings(&mut self.world, settlement);
        spawn_eva_suit(&mut self.world, settlement, "Suit A");
        spawn_eva_suit(&mut self.world, settlement, "Suit B");
        if let Ok(mut storage) = self.world.get::<&mut Storage>(settlement) {
            storage.store_amount_resource(Resource::Oxygen, 500.0);
            storage.store_amount_resource(Resource::Water, 500.0);
            storage.store_item(items::THERMAL_BOTTLE, 4);
        }
        settlement
    }

    /// An on-call engineer with modest skills.
    pub fn person(&mut self, settlement: Entity) -> Entity {
        let kind = WorkerKind::Person {
            shift: Shift::OnCall,
            job: Job::Engineer,
            favorite: FavoriteActivity::Tinkering,
        };
        let skills = SkillProfile::with_levels(&[
            (SkillType::EvaOperations, 2),
            (SkillType::Mechanics, 2),
            (SkillType::Prospecting, 1),
            (SkillType::Areology, 1),
        ]);
        spawn_person(
            &mut self.world,
            settlement,
            Name::new("Test Person"),
            kind,
            skills,
            NaturalAttributes::default(),
        )
    }

    pub fn settlement_with_person(&mut self) -> (Entity, Entity) {
        let settlement = self.settlement();
        let person = self.person(settlement);
        (settlement, person)
    }

    pub fn robot(&mut self, settlement: Entity) -> Entity {
        spawn_robot(
            &mut self.world,
            settlement,
            Name::new("Test Bot"),
            RobotType::Repairbot,
            SkillProfile::with_levels(&[(SkillType::Mechanics, 2)]),
        )
    }

    pub fn rover(&mut self, settlement: Entity, bags: u32) -> Entity {
        spawn_rover(&mut self.world, settlement, "Test Rover", 800.0, bags)
    }
}
