//! Name generation utilities

use rand::Rng;

use crate::components::{Name, RobotType};

/// Generate a random person name
pub fn generate_name(rng: &mut impl Rng) -> Name {
    let given = GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())];
    let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];

    Name::new(format!("{} {}", given, family))
}

/// Robots are named after their type and a serial number
pub fn robot_name(robot_type: RobotType, serial: u32) -> Name {
    let prefix = match robot_type {
        RobotType::Repairbot => "RepairBot",
        RobotType::Makerbot => "MakerBot",
        RobotType::Deliverybot => "DeliveryBot",
        RobotType::Gardenbot => "GardenBot",
    };
    Name::new(format!("{} {:03}", prefix, serial))
}

static GIVEN_NAMES: &[&str] = &[
    "Anika", "Bruno", "Chiara", "Desmond", "Esther", "Farid", "Greta", "Hamza", "Ilse", "Joaquin",
    "Keiko", "Lars", "Mireille", "Nikolai", "Odette", "Pablo", "Qiu", "Rosalind", "Stellan", "Tova",
    "Umar", "Vesna", "Wendell", "Ximena", "Yaroslav", "Zainab", "Ansel", "Beatriz", "Cyrus", "Dagny",
];

static FAMILY_NAMES: &[&str] = &[
    "Albrecht", "Banerjee", "Castellanos", "Dubois", "Eriksen", "Fujimoto", "Gallagher", "Haddad",
    "Iwasaki", "Jovanovic", "Karlsson", "Lindqvist", "Moreau", "Nwosu", "Oyelaran", "Pereira",
    "Quintero", "Rahimi", "Sokolova", "Takahashi", "Urquhart", "Vasquez", "Whitlock", "Xu",
    "Yilmaz", "Zielinski", "Achterberg", "Brennan", "Cardoso", "Dhillon",
];
