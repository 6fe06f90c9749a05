//! ColonySim Core - Colony Task Scheduling Engine
//!
//! An ECS-based simulation of a Mars settlement whose persons and robots
//! choose their work by utility: every candidate task is scored, and each
//! idle worker draws one at random in proportion to its score.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Workers, buildings, vehicles, suits, bags, surface sites
//! - **Components**: Pure data attached to entities (Location, Storage, MalfunctionManager, etc.)
//! - **Meta tasks**: Factories that propose rated candidates (`meta`)
//! - **Tasks**: Per-worker phase state machines, with EVA gating (`task`)
//! - **Task managers**: One per worker, picking and running tasks (`manager`)
//! - **Systems**: Per-tick wear and fatigue bookkeeping (`systems`)
//!
//! # Example
//!
//! ```rust,no_run
//! use colonysim_core::prelude::*;
//!
//! let mut engine = ColonyEngine::from_scenario(&ScenarioConfig::default())?;
//!
//! // One sol in 10-millisol ticks
//! for _ in 0..100 {
//!     engine.update(10.0)?;
//! }
//! # Ok::<(), colonysim_core::error::EngineError>(())
//! ```

pub mod components;
pub mod context;
pub mod engine;
pub mod error;
pub mod generation;
pub mod manager;
pub mod meta;
pub mod surface;
pub mod systems;
pub mod task;

#[cfg(test)]
mod testing;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::context::{SettlementView, TaskContext};
    pub use crate::engine::ColonyEngine;
    pub use crate::error::{EngineError, TaskError};
    pub use crate::generation::ScenarioConfig;
    pub use crate::manager::TaskManager;
    pub use crate::meta::{MetaTask, MetaTaskRegistry, SettlementMetaTask, TaskJob};
    pub use crate::task::{Task, TaskOutcome, TaskPhase};
}
