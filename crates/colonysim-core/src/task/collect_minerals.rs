//! Bagging excavated minerals and bringing them back to a rover.

use colonysim_logic::skills::{ExperienceImpact, NaturalAttributeType, PhysicalEffort, SkillType};
use hecs::{Entity, World};
use log::{debug, info, warn};

use super::{EvaOperation, EvaWork, Task, TaskOutcome, TaskPhase, TaskState};
use crate::components::{
    name_of, transfer_container, transfer_resource, Container, ContainerKind, Coordinates,
    MiningSite, Resource, Storage,
};
use crate::context::TaskContext;
use crate::error::TaskError;

pub const COLLECT_MINERALS: TaskPhase = TaskPhase::new("Collect Minerals");

/// kg per millisol for an unskilled worker.
const BASE_COLLECTION_RATE: f64 = 1.0;

/// Bags one mineral from a mining site's excavated pile.
///
/// An empty large bag is taken from the rover when the worker suits up. The
/// amount collected is clamped to what the bag holds and what the rover has
/// room for; the work ends when either is full or the pile is gone. On clear
/// down the bag is emptied into the rover and put back.
#[derive(Debug)]
pub struct CollectMinedMinerals {
    site: Entity,
    coordinates: Coordinates,
    rover: Entity,
    mineral: Resource,
    bag: Option<Entity>,
    total_collected: f64,
}

impl CollectMinedMinerals {
    pub fn create(
        worker: Entity,
        site: Entity,
        rover: Entity,
        ctx: &mut TaskContext<'_>,
    ) -> Result<Task, TaskError> {
        let coordinates = *ctx
            .world
            .get::<&Coordinates>(site)
            .map_err(|_| TaskError::missing(site, "Coordinates"))?;
        let mineral = ctx
            .world
            .get::<&MiningSite>(site)
            .map_err(|_| TaskError::missing(site, "MiningSite"))?
            .largest_pile()
            .ok_or_else(|| TaskError::precondition("no excavated minerals to collect"))?;
        if empty_bag(ctx.world, rover).is_none() {
            return Err(TaskError::precondition("no empty bag in the rover"));
        }

        let impact = ExperienceImpact::new(10.0, NaturalAttributeType::Strength)
            .with_skill(SkillType::Areology)
            .with_effort(PhysicalEffort::High);
        let state = TaskState::new("Collect Mined Minerals", worker, impact, ctx.world, ctx.now)
            .with_description(format!(
                "Collecting {} at {}",
                mineral,
                name_of(ctx.world, site)
            ));
        let work = Self {
            site,
            coordinates,
            rover,
            mineral,
            bag: None,
            total_collected: 0.0,
        };
        EvaOperation::create(state, work, ctx)
    }

    pub fn mineral(&self) -> Resource {
        self.mineral
    }

    /// kg bagged over the whole task.
    pub fn total_collected(&self) -> f64 {
        self.total_collected
    }

    /// Room left for this load: bag space, limited by rover space.
    fn room(&self, world: &World, bag: Entity) -> Result<f64, TaskError> {
        let bag_storage = world
            .get::<&Storage>(bag)
            .map_err(|_| TaskError::missing(bag, "Storage"))?;
        let rover_room = world
            .get::<&Storage>(self.rover)
            .map_err(|_| TaskError::missing(self.rover, "Storage"))?
            .remaining_cargo_capacity();
        Ok(bag_storage
            .remaining_cargo_capacity()
            .min(rover_room - bag_storage.stored_mass())
            .max(0.0))
    }
}

impl EvaWork for CollectMinedMinerals {
    fn site_phase(&self) -> TaskPhase {
        COLLECT_MINERALS
    }

    fn site(&self) -> Coordinates {
        self.coordinates
    }

    fn prepare(&mut self, worker: Entity, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let bag = empty_bag(ctx.world, self.rover)
            .ok_or_else(|| TaskError::precondition("no empty bag in the rover"))?;
        transfer_container(ctx.world, bag, self.rover, worker)?;
        self.bag = Some(bag);
        Ok(())
    }

    fn perform_work(
        &mut self,
        state: &mut TaskState,
        ctx: &mut TaskContext<'_>,
        time: f64,
    ) -> Result<f64, TaskError> {
        let bag = self
            .bag
            .ok_or_else(|| TaskError::missing(state.worker(), "collection bag"))?;
        let room = self.room(ctx.world, bag)?;
        if room <= 0.0 {
            state.end(TaskOutcome::Completed);
            return Ok(time);
        }

        let rate = BASE_COLLECTION_RATE * (1.0 + 0.1 * state.effective_skill());
        let wanted = (rate * time).min(room);
        let (taken, pile_empty) = {
            let mut site = ctx
                .world
                .get::<&mut MiningSite>(self.site)
                .map_err(|_| TaskError::missing(self.site, "MiningSite"))?;
            let taken = site.take_excavated(self.mineral, wanted);
            let left = site.excavated.get(&self.mineral).copied().unwrap_or(0.0);
            (taken, left <= 0.0)
        };
        let stored = ctx
            .world
            .get::<&mut Storage>(bag)
            .map_err(|_| TaskError::missing(bag, "Storage"))?
            .store_amount_resource(self.mineral, taken);
        self.total_collected += stored;

        if stored >= room {
            debug!("{} is full", name_of(ctx.world, bag));
            state.end(TaskOutcome::Completed);
        } else if pile_empty {
            state.end(TaskOutcome::Completed);
        }
        let used = if rate > 0.0 { (stored / rate).min(time) } else { time };
        Ok(time - used)
    }

    fn clear_down(&mut self, state: &TaskState, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let Some(bag) = self.bag.take() else {
            return Ok(());
        };
        let contents: Vec<(Resource, f64)> = ctx
            .world
            .get::<&Storage>(bag)
            .map(|s| s.resources().collect())
            .unwrap_or_default();
        let mut unloaded = 0.0;
        for (resource, amount) in contents {
            unloaded += transfer_resource(ctx.world, resource, amount, bag, self.rover)?;
        }
        let left_in_bag = ctx
            .world
            .get::<&Storage>(bag)
            .map(|s| s.stored_mass())
            .unwrap_or(0.0);
        if left_in_bag > 0.0 {
            warn!(
                "{} is full; {:.1} kg stays in {}",
                name_of(ctx.world, self.rover),
                left_in_bag,
                name_of(ctx.world, bag)
            );
        }
        if unloaded > 0.0 {
            info!(
                "{} unloaded {:.1} kg of {} into {}",
                name_of(ctx.world, state.worker()),
                unloaded,
                self.mineral,
                name_of(ctx.world, self.rover)
            );
        }
        transfer_container(ctx.world, bag, state.worker(), self.rover)
    }
}

/// An empty large bag held by `holder`.
pub fn empty_bag(world: &World, holder: Entity) -> Option<Entity> {
    let storage = world.get::<&Storage>(holder).ok()?;
    storage.equipment().iter().copied().find(|&item| {
        let is_bag = world
            .get::<&Container>(item)
            .map(|c| c.kind == ContainerKind::LargeBag)
            .unwrap_or(false);
        let empty = world
            .get::<&Storage>(item)
            .map(|s| s.stored_mass() <= 0.0)
            .unwrap_or(false);
        is_bag && empty
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{spawn_mining_site, LARGE_BAG_CAPACITY};
    use crate::surface::FixedSurface;
    use crate::task::EvaOperation;
    use crate::testing::TestBed;

    fn site_with_pile(bed: &mut TestBed, settlement: Entity, hematite: f64) -> Entity {
        let mut mining = MiningSite::new(0.0);
        mining.excavated.insert(Resource::Hematite, hematite);
        spawn_mining_site(
            &mut bed.world,
            settlement,
            "Pit",
            Coordinates::new(0.0, 0.1),
            mining,
        )
    }

    fn run(bed: &mut TestBed, task: &mut Task) {
        let mut ctx = bed.ctx();
        for _ in 0..100 {
            task.perform_task(10.0, &mut ctx).unwrap();
            if task.is_done() {
                break;
            }
        }
    }

    #[test]
    fn test_collection_clamped_to_bag() {
        let mut bed = TestBed::new();
        let (settlement, worker) = bed.settlement_with_person();
        let rover = bed.rover(settlement, 1);
        let site = site_with_pile(&mut bed, settlement, 500.0);

        let mut ctx = bed.ctx();
        let mut task = CollectMinedMinerals::create(worker, site, rover, &mut ctx).unwrap();
        drop(ctx);
        run(&mut bed, &mut task);

        assert_eq!(task.outcome(), Some(&TaskOutcome::Completed));
        let collected = task
            .behavior::<EvaOperation<CollectMinedMinerals>>()
            .unwrap()
            .work()
            .total_collected();
        assert!((collected - LARGE_BAG_CAPACITY).abs() < 1e-9);

        let rover_storage = bed.world.get::<&Storage>(rover).unwrap();
        assert!((rover_storage.amount(Resource::Hematite) - LARGE_BAG_CAPACITY).abs() < 1e-9);
        // Bag is back in the rover, empty
        assert_eq!(rover_storage.equipment().len(), 1);
        let bag = rover_storage.equipment()[0];
        drop(rover_storage);
        assert_eq!(bed.world.get::<&Storage>(bag).unwrap().stored_mass(), 0.0);
    }

    #[test]
    fn test_small_pile_ends_when_empty() {
        let mut bed = TestBed::new();
        let (settlement, worker) = bed.settlement_with_person();
        let rover = bed.rover(settlement, 1);
        let site = site_with_pile(&mut bed, settlement, 12.0);

        let mut ctx = bed.ctx();
        let mut task = CollectMinedMinerals::create(worker, site, rover, &mut ctx).unwrap();
        drop(ctx);
        run(&mut bed, &mut task);

        let work = task.behavior::<EvaOperation<CollectMinedMinerals>>().unwrap().work();
        assert!((work.total_collected() - 12.0).abs() < 1e-9);
        assert!(bed.world.get::<&MiningSite>(site).unwrap().largest_pile().is_none());
    }

    #[test]
    fn test_dark_site_collects_nothing_and_returns_bag() {
        let mut bed = TestBed::new();
        bed.surface = FixedSurface::night();
        let (settlement, worker) = bed.settlement_with_person();
        let rover = bed.rover(settlement, 1);
        let site = site_with_pile(&mut bed, settlement, 100.0);

        let mut ctx = bed.ctx();
        let mut task = CollectMinedMinerals::create(worker, site, rover, &mut ctx).unwrap();
        // The bag left the rover with the worker
        assert!(empty_bag(ctx.world, rover).is_none());
        drop(ctx);
        run(&mut bed, &mut task);

        assert!(task.is_done());
        let work = task.behavior::<EvaOperation<CollectMinedMinerals>>().unwrap().work();
        assert_eq!(work.total_collected(), 0.0);
        assert!(empty_bag(&bed.world, rover).is_some());
        assert!(bed.world.get::<&Storage>(worker).unwrap().equipment().is_empty());
    }

    #[test]
    fn test_no_bag_no_task() {
        let mut bed = TestBed::new();
        let (settlement, worker) = bed.settlement_with_person();
        let rover = bed.rover(settlement, 0);
        let site = site_with_pile(&mut bed, settlement, 100.0);
        let mut ctx = bed.ctx();
        let err = CollectMinedMinerals::create(worker, site, rover, &mut ctx).unwrap_err();
        assert!(matches!(err, TaskError::Precondition(_)));
    }
}
