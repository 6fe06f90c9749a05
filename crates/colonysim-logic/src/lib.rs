//! Pure scheduling logic for ColonySim.
//!
//! This crate contains the parts of the task scheduler that are independent
//! of the ECS world: plain data in, plain data out. The engine crate
//! (`colonysim-core`) builds on these to score, select and run tasks.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`accident`] | Skill- and wear-adjusted accident chances |
//! | [`config`] | Tunable parameters with serde defaults and JSON loading |
//! | [`maintenance`] | Maintenance candidate scoring, wear condition |
//! | [`rating`] | `RatingScore`: named bases × named modifiers |
//! | [`selection`] | Weighted random pick over scored candidates |
//! | [`skills`] | Skill levels, natural attributes, experience gain |
//! | [`time`] | Sols, millisols and clock pulses |

pub mod accident;
pub mod config;
pub mod maintenance;
pub mod rating;
pub mod selection;
pub mod skills;
pub mod time;
