//! Systems - per-tick bookkeeping that is not owned by any task

mod condition;
mod wear;

pub use condition::*;
pub use wear::*;
