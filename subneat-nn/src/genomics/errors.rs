use crate::{Innovation, NodeId};

use thiserror::Error;

/// An error type indicating an invalid genetic configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A probability lies outside [0, 1].
    #[error("`{name}` must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f32 },
    /// A magnitude or coefficient is negative.
    #[error("`{name}` must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    /// A budget that must allow at least one attempt is zero.
    #[error("`{name}` must be at least 1")]
    ZeroBudget { name: &'static str },
}

/// An error type indicating the gene being
/// added by hand is invalid.
#[derive(Debug, Error)]
pub(crate) enum GeneValidityError {
    #[error("duplicate gene innovation number {0}")]
    DuplicateGeneId(Innovation),
    #[error("gene endpoints {0} -> {1} are not both present in the genome")]
    NonexistantEndpoints(NodeId, NodeId),
    #[error("gene {0} duplicates the link {1:?} of another gene")]
    DuplicateGeneWithEndpoints(Innovation, (NodeId, NodeId)),
    #[error("gene {0} would feed into sensor node {1}")]
    SensorEndpoint(Innovation, NodeId),
}

/// An error type indicating the node being
/// added by hand is invalid.
#[derive(Debug, Error)]
pub(crate) enum NodeValidityError {
    #[error("duplicate node id {0}")]
    DuplicateNodeId(NodeId),
}
