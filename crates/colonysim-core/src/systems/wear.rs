//! Wear system - active use of settlement equipment

use crate::components::{Associated, MalfunctionManager};
use hecs::World;

/// Run the inspection clock of every building, vehicle and robot.
///
/// Suits only wear while worn, which the EVA task accounts for.
pub fn wear_system(world: &mut World, elapsed: f64) {
    for (_, (manager, _)) in world.query_mut::<(&mut MalfunctionManager, &Associated)>() {
        manager.active_time_passing(elapsed);
    }
}

/// Entities past their inspection window
pub fn overdue_for_inspection(world: &World) -> Vec<hecs::Entity> {
    world
        .query::<(&MalfunctionManager, &Associated)>()
        .iter()
        .filter(|(_, (m, _))| {
            m.effective_time_since_last_maintenance() >= m.standard_inspection_window()
        })
        .map(|(entity, _)| entity)
        .collect()
}
