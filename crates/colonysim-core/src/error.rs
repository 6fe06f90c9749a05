//! Error types for the scheduler and engine.

use colonysim_logic::config::ConfigError;
use hecs::Entity;
use thiserror::Error;

/// Errors raised while building or running a task.
///
/// Only [`TaskError::Precondition`] is recoverable: the scheduler logs it and
/// leaves the worker idle. Everything else is a bug in task wiring and stops
/// the tick.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("task '{task}' has no phase while active")]
    MissingPhase { task: String },
    #[error("task '{task}' has no handler for phase '{phase}'")]
    UnknownPhase { task: String, phase: &'static str },
    #[error("entity {entity:?} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },
    #[error("unknown meta task '{0}'")]
    UnknownMetaTask(String),
}

impl TaskError {
    pub fn missing(entity: Entity, component: &'static str) -> Self {
        TaskError::MissingComponent { entity, component }
    }

    pub fn precondition(reason: impl Into<String>) -> Self {
        TaskError::Precondition(reason.into())
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, TaskError::Precondition(_))
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0:?} is not a registered worker")]
    UnknownWorker(Entity),
    #[error("invalid scenario: {0}")]
    Scenario(String),
}
