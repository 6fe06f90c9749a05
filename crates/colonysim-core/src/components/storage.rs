//! Resource and equipment holders.
//!
//! A [`Storage`] holds bulk resources by mass, countable items (spare parts,
//! thermal bottles) and equipment entities (suits, bags). Settlements,
//! vehicles, containers and workers all carry one. Tasks move material
//! through the methods here without knowing what kind of holder they touch.

use std::collections::BTreeMap;
use std::fmt;

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Bulk resources, measured in kg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Oxygen,
    Water,
    Food,
    Regolith,
    Hematite,
    Olivine,
    Magnetite,
    Gypsum,
}

impl Resource {
    pub const MINERALS: [Resource; 4] = [
        Resource::Hematite,
        Resource::Olivine,
        Resource::Magnetite,
        Resource::Gypsum,
    ];

    pub fn is_mineral(&self) -> bool {
        Self::MINERALS.contains(self)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Oxygen => "oxygen",
            Resource::Water => "water",
            Resource::Food => "food",
            Resource::Regolith => "regolith",
            Resource::Hematite => "hematite",
            Resource::Olivine => "olivine",
            Resource::Magnetite => "magnetite",
            Resource::Gypsum => "gypsum",
        };
        f.write_str(name)
    }
}

/// Items every settlement stocks.
pub mod items {
    pub const THERMAL_BOTTLE: &str = "thermal bottle";
    pub const GARMENT: &str = "eva garment";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    /// Maximum resource mass in kg.
    pub cargo_capacity: f64,
    resources: BTreeMap<Resource, f64>,
    items: BTreeMap<String, u32>,
    #[serde(skip)]
    equipment: Vec<Entity>,
}

impl Storage {
    pub fn new(cargo_capacity: f64) -> Self {
        Self {
            cargo_capacity: cargo_capacity.max(0.0),
            ..Default::default()
        }
    }

    pub fn amount(&self, resource: Resource) -> f64 {
        self.resources.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn stored_mass(&self) -> f64 {
        self.resources.values().sum()
    }

    pub fn remaining_cargo_capacity(&self) -> f64 {
        (self.cargo_capacity - self.stored_mass()).max(0.0)
    }

    /// Store up to `amount` kg. Returns the mass actually stored.
    pub fn store_amount_resource(&mut self, resource: Resource, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let stored = amount.min(self.remaining_cargo_capacity());
        if stored > 0.0 {
            *self.resources.entry(resource).or_insert(0.0) += stored;
        }
        stored
    }

    /// Retrieve up to `amount` kg. Returns the mass actually retrieved.
    pub fn retrieve_amount_resource(&mut self, resource: Resource, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let Some(held) = self.resources.get_mut(&resource) else {
            return 0.0;
        };
        let taken = amount.min(*held);
        *held -= taken;
        if *held <= f64::EPSILON {
            self.resources.remove(&resource);
        }
        taken
    }

    pub fn resources(&self) -> impl Iterator<Item = (Resource, f64)> + '_ {
        self.resources.iter().map(|(r, a)| (*r, *a))
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    pub fn store_item(&mut self, item: impl Into<String>, count: u32) {
        if count > 0 {
            *self.items.entry(item.into()).or_insert(0) += count;
        }
    }

    /// Remove `count` of an item. Fails without change if fewer are held.
    pub fn retrieve_item(&mut self, item: &str, count: u32) -> bool {
        match self.items.get_mut(item) {
            Some(held) if *held >= count => {
                *held -= count;
                if *held == 0 {
                    self.items.remove(item);
                }
                true
            }
            _ => count == 0,
        }
    }

    pub fn has_items(&self, wanted: &BTreeMap<String, u32>) -> bool {
        wanted
            .iter()
            .all(|(item, count)| self.item_count(item) >= *count)
    }

    pub fn equipment(&self) -> &[Entity] {
        &self.equipment
    }

    pub fn contains_equipment(&self, item: Entity) -> bool {
        self.equipment.contains(&item)
    }

    pub fn add_equipment(&mut self, item: Entity) {
        if !self.equipment.contains(&item) {
            self.equipment.push(item);
        }
    }

    pub fn remove_equipment(&mut self, item: Entity) -> bool {
        let before = self.equipment.len();
        self.equipment.retain(|e| *e != item);
        self.equipment.len() != before
    }
}

/// Move a container (or any equipment entity) from one holder to another.
pub fn transfer_container(
    world: &mut World,
    container: Entity,
    from: Entity,
    to: Entity,
) -> Result<(), TaskError> {
    if from == to {
        return Ok(());
    }
    if world.get::<&Storage>(to).is_err() {
        return Err(TaskError::missing(to, "Storage"));
    }
    let removed = world
        .get::<&mut Storage>(from)
        .map_err(|_| TaskError::missing(from, "Storage"))?
        .remove_equipment(container);
    if !removed {
        return Err(TaskError::Precondition(format!(
            "{:?} is not held by {:?}",
            container, from
        )));
    }
    world
        .get::<&mut Storage>(to)
        .map_err(|_| TaskError::missing(to, "Storage"))?
        .add_equipment(container);
    Ok(())
}

/// Move up to `amount` kg of a resource between holders. Returns the mass moved.
pub fn transfer_resource(
    world: &mut World,
    resource: Resource,
    amount: f64,
    from: Entity,
    to: Entity,
) -> Result<f64, TaskError> {
    let room = world
        .get::<&Storage>(to)
        .map_err(|_| TaskError::missing(to, "Storage"))?
        .remaining_cargo_capacity();
    let taken = world
        .get::<&mut Storage>(from)
        .map_err(|_| TaskError::missing(from, "Storage"))?
        .retrieve_amount_resource(resource, amount.min(room));
    let stored = world
        .get::<&mut Storage>(to)
        .map_err(|_| TaskError::missing(to, "Storage"))?
        .store_amount_resource(resource, taken);
    Ok(stored)
}
