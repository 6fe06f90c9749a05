//! Settlement generation - buildings, vehicles, equipment and surface sites

use hecs::{Entity, World};

use crate::components::*;

/// Wear life, inspection window and inspection work time per kind of
/// maintainable entity, in millisols.
pub const BUILDING_MAINTENANCE: (f64, f64, f64) = (668_000.0, 1000.0, 50.0);
pub const VEHICLE_MAINTENANCE: (f64, f64, f64) = (668_000.0, 800.0, 40.0);
pub const SUIT_MAINTENANCE: (f64, f64, f64) = (334_000.0, 300.0, 10.0);

/// Capacity of a large bag in kg
pub const LARGE_BAG_CAPACITY: f64 = 50.0;

fn malfunction_manager((wear, window, work): (f64, f64, f64)) -> MalfunctionManager {
    MalfunctionManager::new(wear, window, work)
}

/// Entities making up a generated settlement
#[derive(Debug, Clone, Default)]
pub struct ColonyLayout {
    pub settlement: Option<Entity>,
    pub buildings: Vec<Entity>,
    pub suits: Vec<Entity>,
    pub rovers: Vec<Entity>,
    pub crew: Vec<Entity>,
    pub robots: Vec<Entity>,
    pub mining_sites: Vec<Entity>,
    pub exploration_sites: Vec<Entity>,
}

pub fn spawn_settlement(
    world: &mut World,
    name: &str,
    coordinates: Coordinates,
    cargo_capacity: f64,
) -> Entity {
    world.spawn((
        Name::new(name),
        Settlement { coordinates },
        Storage::new(cargo_capacity),
    ))
}

pub fn spawn_building(
    world: &mut World,
    settlement: Entity,
    name: &str,
    building: Building,
) -> Entity {
    world.spawn((
        Name::new(name),
        building,
        Associated(settlement),
        malfunction_manager(BUILDING_MAINTENANCE),
    ))
}

/// The buildings every settlement starts with: an airlock, a workshop, a
/// lounge, quarters and a storage hub.
pub fn standard_buildings(world: &mut World, settlement: Entity) -> Vec<Entity> {
    vec![
        spawn_building(
            world,
            settlement,
            "Airlock 1",
            Building::new(&[]).with_spots(BuildingFunction::Eva, 2),
        ),
        spawn_building(
            world,
            settlement,
            "Workshop 1",
            Building::new(&[]).with_spots(BuildingFunction::Workshop, 2),
        ),
        spawn_building(
            world,
            settlement,
            "Lounge 1",
            Building::new(&[]).with_spots(BuildingFunction::Recreation, 3),
        ),
        spawn_building(
            world,
            settlement,
            "Lander Hab 1",
            Building::new(&[]).with_spots(BuildingFunction::LivingAccommodation, 4),
        ),
        spawn_building(
            world,
            settlement,
            "Storage Hub 1",
            Building::new(&[BuildingFunction::Storage]),
        ),
    ]
}

/// Spawn a suit and put it in the settlement's storage
pub fn spawn_eva_suit(world: &mut World, settlement: Entity, name: &str) -> Entity {
    let suit = world.spawn((
        Name::new(name),
        EvaSuit::default(),
        malfunction_manager(SUIT_MAINTENANCE),
    ));
    if let Ok(mut storage) = world.get::<&mut Storage>(settlement) {
        storage.add_equipment(suit);
    }
    suit
}

/// Spawn a rover carrying `bags` empty large bags
pub fn spawn_rover(
    world: &mut World,
    settlement: Entity,
    name: &str,
    cargo_capacity: f64,
    bags: u32,
) -> Entity {
    let mut storage = Storage::new(cargo_capacity);
    for i in 0..bags {
        let bag = world.spawn((
            Name::new(format!("{} bag {}", name, i + 1)),
            Container {
                kind: ContainerKind::LargeBag,
            },
            Storage::new(LARGE_BAG_CAPACITY),
        ));
        storage.add_equipment(bag);
    }
    world.spawn((
        Name::new(name),
        Vehicle {
            vehicle_type: VehicleType::Rover,
        },
        storage,
        Associated(settlement),
        malfunction_manager(VEHICLE_MAINTENANCE),
    ))
}

pub fn spawn_mining_site(
    world: &mut World,
    settlement: Entity,
    name: &str,
    coordinates: Coordinates,
    site: MiningSite,
) -> Entity {
    world.spawn((Name::new(name), coordinates, Associated(settlement), site))
}

pub fn spawn_exploration_site(
    world: &mut World,
    settlement: Entity,
    name: &str,
    coordinates: Coordinates,
    site: ExplorationSite,
) -> Entity {
    world.spawn((Name::new(name), coordinates, Associated(settlement), site))
}
