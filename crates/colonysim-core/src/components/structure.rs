//! Settlement structure: settlements, buildings with activity spots, vehicles.
//!
//! Also hosts the building lookup the tasks use to find a workplace:
//! [`buildings_with_function`], [`find_empty_activity_spot`],
//! [`claim_activity_spot`], [`occupy_activity_spot`] and [`release_activity_spot`].

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use super::common::{set_place, Associated, Coordinates, Place};
use crate::error::TaskError;

/// Settlement component. Settlement entities also carry a `Name` and a `Storage`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingFunction {
    /// Airlock access to the surface.
    Eva,
    Workshop,
    Recreation,
    LivingAccommodation,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivitySpot {
    pub function: BuildingFunction,
    pub occupant: Option<Entity>,
}

/// Building component; the settlement link is the entity's [`Associated`].
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub functions: Vec<BuildingFunction>,
    pub spots: Vec<ActivitySpot>,
}

impl Building {
    pub fn new(functions: &[BuildingFunction]) -> Self {
        Self {
            functions: functions.to_vec(),
            spots: Vec::new(),
        }
    }

    /// Add `count` activity spots for a function.
    pub fn with_spots(mut self, function: BuildingFunction, count: usize) -> Self {
        if !self.functions.contains(&function) {
            self.functions.push(function);
        }
        self.spots.extend((0..count).map(|_| ActivitySpot {
            function,
            occupant: None,
        }));
        self
    }

    pub fn has_function(&self, function: BuildingFunction) -> bool {
        self.functions.contains(&function)
    }

    pub fn free_spot(&self, function: BuildingFunction) -> Option<usize> {
        self.spots
            .iter()
            .position(|s| s.function == function && s.occupant.is_none())
    }

    pub fn occupants(&self) -> impl Iterator<Item = Entity> + '_ {
        self.spots.iter().filter_map(|s| s.occupant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Rover,
    LightUtilityVehicle,
}

/// Vehicle component. Vehicles also carry `Name`, `Storage`, `MalfunctionManager`
/// and `Associated`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_type: VehicleType,
}

/// Buildings of `settlement` supporting `function`, in spawn order.
pub fn buildings_with_function(
    world: &World,
    settlement: Entity,
    function: BuildingFunction,
) -> Vec<Entity> {
    world
        .query::<(&Building, &Associated)>()
        .iter()
        .filter(|(_, (b, a))| a.0 == settlement && b.has_function(function))
        .map(|(e, _)| e)
        .collect()
}

/// First free activity spot for `function` in any building of the settlement.
pub fn find_empty_activity_spot(
    world: &World,
    settlement: Entity,
    function: BuildingFunction,
) -> Option<(Entity, usize)> {
    world
        .query::<(&Building, &Associated)>()
        .iter()
        .filter(|(_, (_, a))| a.0 == settlement)
        .find_map(|(e, (b, _))| b.free_spot(function).map(|i| (e, i)))
}

/// Occupy a spot. Any spot the worker already holds is released first.
pub fn claim_activity_spot(
    world: &mut World,
    building: Entity,
    index: usize,
    worker: Entity,
) -> Result<(), TaskError> {
    release_activity_spot(world, worker);
    let mut b = world
        .get::<&mut Building>(building)
        .map_err(|_| TaskError::missing(building, "Building"))?;
    match b.spots.get_mut(index) {
        Some(spot) if spot.occupant.is_none() => {
            spot.occupant = Some(worker);
            Ok(())
        }
        Some(_) => Err(TaskError::Precondition(format!(
            "activity spot {} is taken",
            index
        ))),
        None => Err(TaskError::Precondition(format!(
            "no activity spot {}",
            index
        ))),
    }
}

/// Find a free spot for `function` and claim it. Returns the building.
pub fn claim_any_activity_spot(
    world: &mut World,
    settlement: Entity,
    function: BuildingFunction,
    worker: Entity,
) -> Result<Entity, TaskError> {
    let (building, index) = find_empty_activity_spot(world, settlement, function).ok_or_else(|| {
        TaskError::Precondition(format!("no free {:?} activity spot", function))
    })?;
    claim_activity_spot(world, building, index, worker)?;
    Ok(building)
}

/// Claim a spot and move the worker into its building. Nothing stays
/// claimed when the move fails.
pub fn occupy_activity_spot(
    world: &mut World,
    settlement: Entity,
    function: BuildingFunction,
    worker: Entity,
) -> Result<Entity, TaskError> {
    let building = claim_any_activity_spot(world, settlement, function, worker)?;
    if let Err(e) = set_place(world, worker, Place::Building(building)) {
        release_activity_spot(world, worker);
        return Err(e);
    }
    Ok(building)
}

/// Free whatever spot `worker` holds. Returns true if one was held.
pub fn release_activity_spot(world: &mut World, worker: Entity) -> bool {
    let mut released = false;
    for (_, building) in world.query_mut::<&mut Building>() {
        for spot in building.spots.iter_mut() {
            if spot.occupant == Some(worker) {
                spot.occupant = None;
                released = true;
            }
        }
    }
    released
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Location;

    fn settlement_with_workshop(world: &mut World, spots: usize) -> (Entity, Entity) {
        let settlement = world.spawn((Settlement {
            coordinates: Coordinates::default(),
        },));
        let shop = world.spawn((
            Building::new(&[]).with_spots(BuildingFunction::Workshop, spots),
            Associated(settlement),
        ));
        (settlement, shop)
    }

    #[test]
    fn test_lookup_by_function() {
        let mut world = World::new();
        let (settlement, shop) = settlement_with_workshop(&mut world, 1);
        world.spawn((Building::new(&[BuildingFunction::Eva]), Associated(settlement)));
        assert_eq!(
            buildings_with_function(&world, settlement, BuildingFunction::Workshop),
            vec![shop]
        );
        assert_eq!(
            buildings_with_function(&world, settlement, BuildingFunction::Eva).len(),
            1
        );
    }

    #[test]
    fn test_claim_and_release() {
        let mut world = World::new();
        let (settlement, shop) = settlement_with_workshop(&mut world, 1);
        let a = world.spawn(());
        let b = world.spawn(());

        let claimed = claim_any_activity_spot(&mut world, settlement, BuildingFunction::Workshop, a);
        assert_eq!(claimed.unwrap(), shop);
        assert!(find_empty_activity_spot(&world, settlement, BuildingFunction::Workshop).is_none());
        assert!(matches!(
            claim_any_activity_spot(&mut world, settlement, BuildingFunction::Workshop, b),
            Err(TaskError::Precondition(_))
        ));

        assert!(release_activity_spot(&mut world, a));
        assert!(!release_activity_spot(&mut world, a));
        assert!(claim_any_activity_spot(&mut world, settlement, BuildingFunction::Workshop, b).is_ok());
    }

    #[test]
    fn test_occupy_moves_the_worker() {
        let mut world = World::new();
        let (settlement, shop) = settlement_with_workshop(&mut world, 1);
        let worker = world.spawn((Location::inside(settlement),));

        let building = occupy_activity_spot(&mut world, settlement, BuildingFunction::Workshop, worker).unwrap();
        assert_eq!(building, shop);
        assert_eq!(world.get::<&Location>(worker).unwrap().place, Place::Building(shop));
    }

    #[test]
    fn test_occupy_without_location_keeps_spot_free() {
        let mut world = World::new();
        let (settlement, _) = settlement_with_workshop(&mut world, 1);
        let drifter = world.spawn(());

        assert!(matches!(
            occupy_activity_spot(&mut world, settlement, BuildingFunction::Workshop, drifter),
            Err(TaskError::MissingComponent { .. })
        ));
        assert!(find_empty_activity_spot(&world, settlement, BuildingFunction::Workshop).is_some());
    }
}
