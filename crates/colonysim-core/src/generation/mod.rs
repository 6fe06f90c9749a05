//! Generation - procedural creation of settlements, crew, equipment and sites.

mod colony;
mod crew;
mod names;
mod scenario;

pub use colony::*;
pub use crew::*;
pub use names::*;
pub use scenario::*;
