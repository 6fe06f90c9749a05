//! Condition system - fatigue builds up while awake

use crate::components::PhysicalCondition;
use hecs::World;

/// Fatigue gained per millisol, whatever the person is doing.
pub const FATIGUE_PER_MILLISOL: f64 = 0.1;

pub fn condition_system(world: &mut World, elapsed: f64) {
    for (_, condition) in world.query_mut::<&mut PhysicalCondition>() {
        condition.add_fatigue(FATIGUE_PER_MILLISOL * elapsed.max(0.0));
    }
}

/// People too tired or stressed to go outside
pub fn find_super_unfit(world: &World) -> Vec<hecs::Entity> {
    world
        .query::<&PhysicalCondition>()
        .iter()
        .filter(|(_, c)| c.is_super_unfit())
        .map(|(entity, _)| entity)
        .collect()
}
