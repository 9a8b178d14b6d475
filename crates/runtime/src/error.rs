use domain::TripError;
use thiserror::Error;

/// Outcome of asking a trip instance for a reply.
///
/// `Domain` carries the typed rejection computed by the command
/// processor. The other variants are transport-level: the command may or
/// may not have been applied, and callers must treat them as "unknown
/// outcome", not as failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AskError {
    /// The command was processed and rejected with a domain error.
    #[error(transparent)]
    Domain(#[from] TripError),

    /// No reply arrived within the ask timeout. Outcome unknown.
    #[error("timed out waiting for a reply")]
    Timeout,

    /// The trip instance terminated before replying. Outcome unknown.
    #[error("trip instance terminated before replying")]
    Terminated,
}
