//! Settlement-wide candidate caches and focus claims.

use std::collections::HashMap;

use colonysim_logic::time::MarsTime;
use hecs::Entity;
use log::debug;
use rand::rngs::StdRng;

use crate::components::name_of;
use crate::context::SettlementView;
use crate::meta::{MetaTaskRegistry, SettlementTask};

/// The raw candidates of one settlement, before any worker rates them.
#[derive(Debug, Clone)]
pub struct SettlementTaskCache {
    tasks: Vec<SettlementTask>,
    created: MarsTime,
    /// Bumped on every rebuild; worker caches built from an older
    /// generation are stale.
    generation: u64,
    dirty: bool,
}

impl Default for SettlementTaskCache {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            created: MarsTime::START,
            generation: 0,
            dirty: true,
        }
    }
}

impl SettlementTaskCache {
    pub fn tasks(&self) -> &[SettlementTask] {
        &self.tasks
    }

    pub fn created(&self) -> MarsTime {
        self.created
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Every settlement's candidate cache, plus how many workers are busy on
/// each focus entity.
#[derive(Debug, Default)]
pub struct SettlementCaches {
    caches: HashMap<Entity, SettlementTaskCache>,
    claims: HashMap<Entity, u32>,
}

impl SettlementCaches {
    /// Force a rebuild of the settlement's candidates on next use.
    pub fn mark_dirty(&mut self, settlement: Entity) {
        self.caches.entry(settlement).or_default().dirty = true;
    }

    /// True when the settlement has no cache yet, or it was marked dirty.
    pub fn is_dirty(&self, settlement: Entity) -> bool {
        self.caches.get(&settlement).map_or(true, |c| c.dirty)
    }

    pub fn get(&self, settlement: Entity) -> Option<&SettlementTaskCache> {
        self.caches.get(&settlement)
    }

    pub fn generation(&self, settlement: Entity) -> u64 {
        self.caches.get(&settlement).map_or(0, |c| c.generation)
    }

    /// Rebuild the settlement's candidates when dirty or older than the
    /// configured interval. Zero-score candidates are dropped.
    pub fn refresh(
        &mut self,
        settlement: Entity,
        registry: &MetaTaskRegistry,
        view: SettlementView<'_>,
        rng: &mut StdRng,
    ) {
        let interval = view.config.scheduler.settlement_cache_interval;
        let cache = self.caches.entry(settlement).or_default();
        if !cache.dirty && view.now.since(cache.created) < interval {
            return;
        }

        let mut tasks = Vec::new();
        for meta in registry.settlement_metas() {
            tasks.extend(
                meta.settlement_tasks(settlement, view, rng)
                    .into_iter()
                    .filter(|t| !t.score.is_zero()),
            );
        }
        debug!(
            "Rebuilt {} settlement candidate(s) for {} at {}",
            tasks.len(),
            name_of(view.world, settlement),
            view.now
        );
        cache.tasks = tasks;
        cache.created = view.now;
        cache.generation += 1;
        cache.dirty = false;
    }

    /// Workers currently busy on `focus`.
    pub fn claims(&self, focus: Entity) -> u32 {
        self.claims.get(&focus).copied().unwrap_or(0)
    }

    pub fn claim(&mut self, focus: Entity) {
        *self.claims.entry(focus).or_insert(0) += 1;
    }

    pub fn release(&mut self, focus: Entity) {
        if let Some(count) = self.claims.get_mut(&focus) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.claims.remove(&focus);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::components::MalfunctionManager;
    use crate::testing::TestBed;

    #[test]
    fn test_refresh_policy() {
        let mut bed = TestBed::new();
        let (settlement, _) = bed.settlement_with_person();
        let robot = bed.robot(settlement);
        let mut caches = SettlementCaches::default();
        let mut rng = StdRng::seed_from_u64(9);
        assert!(caches.is_dirty(settlement));

        caches.refresh(settlement, &bed.registry, bed.view(), &mut rng);
        assert!(!caches.is_dirty(settlement));
        assert_eq!(caches.generation(settlement), 1);
        assert!(caches.get(settlement).unwrap().tasks().is_empty());

        // Overdue robot, but the cache is fresh
        bed.world
            .get::<&mut MalfunctionManager>(robot)
            .unwrap()
            .active_time_passing(1000.0);
        caches.refresh(settlement, &bed.registry, bed.view(), &mut rng);
        assert_eq!(caches.generation(settlement), 1);

        caches.mark_dirty(settlement);
        caches.refresh(settlement, &bed.registry, bed.view(), &mut rng);
        assert_eq!(caches.generation(settlement), 2);
        assert!(caches
            .get(settlement)
            .unwrap()
            .tasks()
            .iter()
            .any(|t| t.focus == Some(robot)));
    }

    #[test]
    fn test_cache_expires() {
        let mut bed = TestBed::new();
        let (settlement, _) = bed.settlement_with_person();
        let mut caches = SettlementCaches::default();
        let mut rng = StdRng::seed_from_u64(9);
        caches.refresh(settlement, &bed.registry, bed.view(), &mut rng);
        bed.now = bed.now.add_millisols(bed.config.scheduler.settlement_cache_interval);
        caches.refresh(settlement, &bed.registry, bed.view(), &mut rng);
        assert_eq!(caches.generation(settlement), 2);
    }

    #[test]
    fn test_claims() {
        let mut world = hecs::World::new();
        let focus = world.spawn(());
        let mut caches = SettlementCaches::default();
        caches.claim(focus);
        caches.claim(focus);
        assert_eq!(caches.claims(focus), 2);
        caches.release(focus);
        caches.release(focus);
        caches.release(focus);
        assert_eq!(caches.claims(focus), 0);
    }
}
