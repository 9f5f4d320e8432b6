use super::SubspeciesId;

use thiserror::Error;

/// An error type indicating an invalid population
/// or genetic configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A probability lies outside [0, 1].
    #[error("`{name}` must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f32 },
    /// A threshold or multiplier is negative.
    #[error("`{name}` must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    /// The genome implementation rejected the
    /// genetic configuration.
    #[error("invalid genetic configuration: {0}")]
    Genetic(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// An error type indicating broken population bookkeeping
/// during reproduction. The population is left in an
/// unspecified state, and the run should be aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreedError {
    #[error("subspecies {id} has no members to produce {expected} offspring from")]
    EmptySubspecies { id: SubspeciesId, expected: usize },
    #[error("subspecies {id} expects {expected} offspring, exceeding the population size of {capacity}")]
    CapacityExceeded {
        id: SubspeciesId,
        expected: usize,
        capacity: usize,
    },
}
