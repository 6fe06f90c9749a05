//! Crew and robot generation

use colonysim_logic::skills::{NaturalAttributeType, NaturalAttributes, SkillProfile, SkillType};
use hecs::{Entity, World};
use rand::Rng;

use super::names::{generate_name, robot_name};
use crate::components::*;

/// Wear life (millisols of use) and inspection needs of a robot
pub const ROBOT_WEAR_LIFETIME: f64 = 334_000.0;
pub const ROBOT_INSPECTION_WINDOW: f64 = 500.0;
pub const ROBOT_MAINTENANCE_TIME: f64 = 20.0;

/// Spawn a person living in `settlement`
pub fn spawn_person(
    world: &mut World,
    settlement: Entity,
    name: Name,
    kind: WorkerKind,
    skills: SkillProfile,
    attributes: NaturalAttributes,
) -> Entity {
    world.spawn((
        name,
        kind,
        skills,
        attributes,
        Location::inside(settlement),
        Storage::new(0.0),
        PhysicalCondition::default(),
        EquipmentInventory {
            suit: None,
            wearing_garment: true,
            has_thermal_bottle: false,
        },
    ))
}

/// Spawn a robot. Robots are themselves maintainable, so they also carry a
/// malfunction manager and the settlement link.
pub fn spawn_robot(
    world: &mut World,
    settlement: Entity,
    name: Name,
    robot_type: RobotType,
    skills: SkillProfile,
) -> Entity {
    world.spawn((
        name,
        WorkerKind::Robot { robot_type },
        skills,
        NaturalAttributes::default(),
        Location::inside(settlement),
        Storage::new(0.0),
        Associated(settlement),
        MalfunctionManager::new(
            ROBOT_WEAR_LIFETIME,
            ROBOT_INSPECTION_WINDOW,
            ROBOT_MAINTENANCE_TIME,
        ),
    ))
}

/// Generate `count` colonists with random jobs, shifts and skills
pub fn generate_crew(
    world: &mut World,
    settlement: Entity,
    count: u32,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let mut crew = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let name = generate_name(rng);
        let job = random_job(rng);
        let kind = WorkerKind::Person {
            shift: random_shift(rng),
            job,
            favorite: random_favorite(rng),
        };

        let mut skills = SkillProfile::default();
        for skill in SkillType::ALL {
            skills.set_level(skill, rng.gen_range(0..3));
        }
        let primary = primary_skill(job);
        skills.set_level(primary, rng.gen_range(2..6));

        let mut attributes = NaturalAttributes::default();
        for attr in [
            NaturalAttributeType::ExperienceAptitude,
            NaturalAttributeType::Strength,
            NaturalAttributeType::Agility,
            NaturalAttributeType::Endurance,
            NaturalAttributeType::StressResilience,
            NaturalAttributeType::Teaching,
        ] {
            attributes = attributes.with(attr, rng.gen_range(30..80));
        }

        crew.push(spawn_person(world, settlement, name, kind, skills, attributes));
    }

    crew
}

/// Generate `count` robots, cycling through the robot types
pub fn generate_robots(world: &mut World, settlement: Entity, count: u32) -> Vec<Entity> {
    const TYPES: [RobotType; 4] = [
        RobotType::Repairbot,
        RobotType::Makerbot,
        RobotType::Deliverybot,
        RobotType::Gardenbot,
    ];

    (0..count)
        .map(|i| {
            let robot_type = TYPES[i as usize % TYPES.len()];
            let skills = match robot_type {
                RobotType::Repairbot => SkillProfile::with_levels(&[(SkillType::Mechanics, 3)]),
                RobotType::Makerbot => SkillProfile::with_levels(&[(SkillType::Materials, 3)]),
                _ => SkillProfile::default(),
            };
            spawn_robot(world, settlement, robot_name(robot_type, i + 1), robot_type, skills)
        })
        .collect()
}

/// The skill a job trains most
pub fn primary_skill(job: Job) -> SkillType {
    match job {
        Job::Engineer | Job::Technician => SkillType::Mechanics,
        Job::Areologist => SkillType::Areology,
        Job::Geologist => SkillType::Prospecting,
        Job::Botanist => SkillType::Materials,
        Job::Doctor => SkillType::EvaOperations,
    }
}

fn random_job(rng: &mut impl Rng) -> Job {
    // Engineering-heavy crew, as early settlements are
    match rng.gen_range(0..100) {
        0..=24 => Job::Engineer,
        25..=44 => Job::Technician,
        45..=59 => Job::Areologist,
        60..=74 => Job::Geologist,
        75..=89 => Job::Botanist,
        _ => Job::Doctor,
    }
}

fn random_shift(rng: &mut impl Rng) -> Shift {
    match rng.gen_range(0..5) {
        0 | 1 => Shift::A,
        2 | 3 => Shift::B,
        _ => Shift::OnCall,
    }
}

fn random_favorite(rng: &mut impl Rng) -> FavoriteActivity {
    match rng.gen_range(0..4) {
        0 => FavoriteActivity::FieldWork,
        1 => FavoriteActivity::Tinkering,
        2 => FavoriteActivity::Lounging,
        _ => FavoriteActivity::Operations,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_generate_crew() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(11);
        let settlement = world.spawn(());

        let crew = generate_crew(&mut world, settlement, 20, &mut rng);
        assert_eq!(crew.len(), 20);

        for entity in &crew {
            let kind = *world.get::<&WorkerKind>(*entity).unwrap();
            assert!(kind.is_person());
            assert!(world.get::<&PhysicalCondition>(*entity).is_ok());
            assert!(world.get::<&EquipmentInventory>(*entity).is_ok());
            assert_eq!(world.get::<&Location>(*entity).unwrap().settlement, settlement);
            // Persons are not maintainable
            assert!(world.get::<&MalfunctionManager>(*entity).is_err());
            if let WorkerKind::Person { job, .. } = kind {
                let level = world.get::<&SkillProfile>(*entity).unwrap().level(primary_skill(job));
                assert!(level >= 2);
            }
        }
    }

    #[test]
    fn test_generate_robots() {
        let mut world = World::new();
        let settlement = world.spawn(());

        let robots = generate_robots(&mut world, settlement, 5);
        assert_eq!(robots.len(), 5);
        for entity in &robots {
            assert!(world.get::<&WorkerKind>(*entity).unwrap().is_robot());
            assert!(world.get::<&PhysicalCondition>(*entity).is_err());
            assert_eq!(world.get::<&Associated>(*entity).unwrap().0, settlement);
            assert!(world.get::<&MalfunctionManager>(*entity).is_ok());
        }
        let first = *world.get::<&WorkerKind>(robots[0]).unwrap();
        assert_eq!(
            first,
            WorkerKind::Robot {
                robot_type: RobotType::Repairbot
            }
        );
    }
}
