use thiserror::Error;

/// An error type indicating a network whose outputs could
/// not all be activated. This happens when some output is
/// unreachable from every sensor, and is a sign of a
/// malformed genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("outputs still inactive after {passes} activation passes")]
    OutputsUnreachable { passes: usize },
}
