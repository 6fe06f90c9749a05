//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities. Behavior lives in
//! tasks, meta tasks and systems; the small helpers here only keep each
//! component's own bookkeeping consistent.

mod common;
mod equipment;
mod malfunction;
mod site;
mod storage;
mod structure;
mod worker;

pub use common::*;
pub use equipment::*;
pub use malfunction::*;
pub use site::*;
pub use storage::*;
pub use structure::*;
pub use worker::*;
