//! Common components used across multiple entity types.

use std::fmt;

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Display name of any named entity (worker, building, site, equipment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mean radius of Mars in km.
pub const MARS_RADIUS_KM: f64 = 3389.5;

/// Surface coordinates in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// -90 (south pole) to 90 (north pole)
    pub latitude: f64,
    /// -180 to 180, 0 at the prime meridian
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude,
        }
    }

    /// Great-circle distance to `other` along the surface, in km.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * MARS_RADIUS_KM * h.sqrt().min(1.0).asin()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.2}{} {:.2}{}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew
        )
    }
}

/// The settlement an entity belongs to.
///
/// Attached to buildings, workers, vehicles and sites. Equipment such as
/// suits and bags does not carry it; it lives in a holder's [`Storage`](super::Storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Associated(pub Entity);

/// Where a worker currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Place {
    /// Inside the settlement, not at any particular building.
    Settlement,
    Building(Entity),
    /// On the surface, suited up.
    Outside(Coordinates),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub settlement: Entity,
    pub place: Place,
}

impl Location {
    pub fn inside(settlement: Entity) -> Self {
        Self {
            settlement,
            place: Place::Settlement,
        }
    }

    pub fn is_outside(&self) -> bool {
        matches!(self.place, Place::Outside(_))
    }

    pub fn is_inside(&self) -> bool {
        !self.is_outside()
    }

    pub fn building(&self) -> Option<Entity> {
        match self.place {
            Place::Building(b) => Some(b),
            _ => None,
        }
    }
}

/// Display name of an entity, or its id when it has no [`Name`].
pub fn name_of(world: &World, entity: Entity) -> String {
    world
        .get::<&Name>(entity)
        .map(|n| n.0.clone())
        .unwrap_or_else(|_| format!("{:?}", entity))
}

/// The settlement a worker is at, or an entity belongs to.
pub fn settlement_of(world: &World, entity: Entity) -> Option<Entity> {
    if let Ok(location) = world.get::<&Location>(entity) {
        return Some(location.settlement);
    }
    world.get::<&Associated>(entity).ok().map(|a| a.0)
}

pub fn is_outside(world: &World, worker: Entity) -> bool {
    world
        .get::<&Location>(worker)
        .map(|l| l.is_outside())
        .unwrap_or(false)
}

/// Move a worker within its settlement, or out onto the surface.
pub fn set_place(world: &mut World, worker: Entity, place: Place) -> Result<(), TaskError> {
    world
        .get::<&mut Location>(worker)
        .map_err(|_| TaskError::missing(worker, "Location"))?
        .place = place;
    Ok(())
}
