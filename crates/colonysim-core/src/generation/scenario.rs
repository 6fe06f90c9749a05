//! Scenario description loaded from JSON and turned into a populated world.

use std::collections::BTreeMap;

use colonysim_logic::config::SimulationConfig;
use hecs::World;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::colony::*;
use super::crew::{generate_crew, generate_robots};
use crate::components::*;
use crate::error::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningSiteConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// kg of ore in the deposit
    pub ore: f64,
    /// Mineral share of the ore, 0.0-1.0
    pub minerals: BTreeMap<Resource, f64>,
}

impl Default for MiningSiteConfig {
    fn default() -> Self {
        Self {
            name: "Mining Site".to_string(),
            latitude: -4.6,
            longitude: 137.5,
            ore: 2000.0,
            minerals: [(Resource::Hematite, 0.3), (Resource::Olivine, 0.2)]
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationSiteConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Millisols for a full survey
    pub survey_time: f64,
}

impl Default for ExplorationSiteConfig {
    fn default() -> Self {
        Self {
            name: "Exploration Site".to_string(),
            latitude: -4.4,
            longitude: 137.3,
            survey_time: 300.0,
        }
    }
}

/// A settlement and its people, equipment and nearby sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub settlement_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Settlement storage capacity in kg
    pub cargo_capacity: f64,
    pub crew: u32,
    pub robots: u32,
    pub suits: u32,
    pub rovers: u32,
    pub bags_per_rover: u32,
    pub rover_cargo_capacity: f64,
    /// Starting oxygen and water stores in kg
    pub oxygen: f64,
    pub water: f64,
    pub thermal_bottles: u32,
    /// Spare parts stocked at start, by part name
    pub spare_parts: BTreeMap<String, u32>,
    pub mining_sites: Vec<MiningSiteConfig>,
    pub exploration_sites: Vec<ExplorationSiteConfig>,
    pub simulation: SimulationConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            settlement_name: "Schiaparelli Point".to_string(),
            latitude: -4.5,
            longitude: 137.4,
            cargo_capacity: 10_000.0,
            crew: 4,
            robots: 2,
            suits: 4,
            rovers: 1,
            bags_per_rover: 2,
            rover_cargo_capacity: 800.0,
            oxygen: 1000.0,
            water: 1000.0,
            thermal_bottles: 8,
            spare_parts: BTreeMap::new(),
            mining_sites: vec![MiningSiteConfig::default()],
            exploration_sites: vec![ExplorationSiteConfig::default()],
            simulation: SimulationConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let scenario: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Scenario(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.simulation.validate()?;
        if self.crew + self.robots == 0 {
            return Err(EngineError::Scenario("no workers".to_string()));
        }
        if self.cargo_capacity <= 0.0 {
            return Err(EngineError::Scenario(
                "cargo_capacity must be positive".to_string(),
            ));
        }
        let stores = self.oxygen.max(0.0) + self.water.max(0.0);
        if stores > self.cargo_capacity {
            return Err(EngineError::Scenario(format!(
                "starting stores of {} kg exceed capacity {} kg",
                stores, self.cargo_capacity
            )));
        }
        Ok(())
    }
}

/// Populate `world` from a scenario.
pub fn generate_colony(world: &mut World, scenario: &ScenarioConfig, rng: &mut impl Rng) -> ColonyLayout {
    let coordinates = Coordinates::new(scenario.latitude, scenario.longitude);
    let settlement = spawn_settlement(
        world,
        &scenario.settlement_name,
        coordinates,
        scenario.cargo_capacity,
    );
    if let Ok(mut storage) = world.get::<&mut Storage>(settlement) {
        storage.store_amount_resource(Resource::Oxygen, scenario.oxygen);
        storage.store_amount_resource(Resource::Water, scenario.water);
        storage.store_item(items::THERMAL_BOTTLE, scenario.thermal_bottles);
        for (part, count) in &scenario.spare_parts {
            storage.store_item(part.clone(), *count);
        }
    }

    let buildings = standard_buildings(world, settlement);
    let suits = (0..scenario.suits)
        .map(|i| spawn_eva_suit(world, settlement, &format!("EVA Suit {}", i + 1)))
        .collect();
    let rovers = (0..scenario.rovers)
        .map(|i| {
            spawn_rover(
                world,
                settlement,
                &format!("Rover {}", i + 1),
                scenario.rover_cargo_capacity,
                scenario.bags_per_rover,
            )
        })
        .collect();
    let mining_sites = scenario
        .mining_sites
        .iter()
        .map(|cfg| {
            let site = cfg
                .minerals
                .iter()
                .fold(MiningSite::new(cfg.ore), |site, (mineral, share)| {
                    site.with_mineral(*mineral, *share)
                });
            let at = Coordinates::new(cfg.latitude, cfg.longitude);
            spawn_mining_site(world, settlement, &cfg.name, at, site)
        })
        .collect();
    let exploration_sites = scenario
        .exploration_sites
        .iter()
        .map(|cfg| {
            let site = ExplorationSite::new(cfg.survey_time, &Resource::MINERALS);
            let at = Coordinates::new(cfg.latitude, cfg.longitude);
            spawn_exploration_site(world, settlement, &cfg.name, at, site)
        })
        .collect();

    let crew = generate_crew(world, settlement, scenario.crew, rng);
    let robots = generate_robots(world, settlement, scenario.robots);

    ColonyLayout {
        settlement: Some(settlement),
        buildings,
        suits,
        rovers,
        crew,
        robots,
        mining_sites,
        exploration_sites,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_partial_json_over_defaults() {
        let scenario = ScenarioConfig::from_json(
            r#"{ "crew": 6, "mining_sites": [], "simulation": { "seed": 9 } }"#,
        )
        .unwrap();
        assert_eq!(scenario.crew, 6);
        assert_eq!(scenario.robots, 2);
        assert!(scenario.mining_sites.is_empty());
        assert_eq!(scenario.simulation.seed, 9);
    }

    #[test]
    fn test_minerals_as_map_keys() {
        let scenario = ScenarioConfig::from_json(
            r#"{ "mining_sites": [{ "name": "Ridge", "minerals": { "Magnetite": 0.4 } }] }"#,
        )
        .unwrap();
        let site = &scenario.mining_sites[0];
        assert_eq!(site.name, "Ridge");
        assert_eq!(site.minerals.get(&Resource::Magnetite), Some(&0.4));
    }

    #[test]
    fn test_invalid_scenarios() {
        assert!(ScenarioConfig::from_json("{ not json").is_err());
        assert!(ScenarioConfig::from_json(r#"{ "crew": 0, "robots": 0 }"#).is_err());
        assert!(ScenarioConfig::from_json(r#"{ "oxygen": 20000 }"#).is_err());
    }

    #[test]
    fn test_generate_colony() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(5);
        let scenario = ScenarioConfig::default();
        let layout = generate_colony(&mut world, &scenario, &mut rng);

        let settlement = layout.settlement.unwrap();
        assert_eq!(layout.crew.len(), 4);
        assert_eq!(layout.robots.len(), 2);
        assert_eq!(layout.suits.len(), 4);
        assert_eq!(layout.mining_sites.len(), 1);

        let storage = world.get::<&Storage>(settlement).unwrap();
        assert_eq!(storage.amount(Resource::Oxygen), 1000.0);
        assert_eq!(storage.item_count(items::THERMAL_BOTTLE), 8);
        assert_eq!(storage.equipment().len(), 4);
    }
}
