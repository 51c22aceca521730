/// Errors produced while building or issuing a game launch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    /// The assignment lacks a field the game process cannot start without.
    #[error("assignment is missing {0}")]
    MissingField(&'static str),

    /// The assignment has no player slots, so no host can be chosen.
    #[error("assignment has no player slots")]
    NoSlots,

    /// The launch process refused the request.
    #[error("launch rejected: {0}")]
    Rejected(String),

    /// The launch process could not be reached.
    #[error("launch process unavailable: {0}")]
    Unavailable(String),
}
