//! Conditions the state machine reports.
//!
//! Nothing here is fatal. An [`Anomaly`] means the input was ignored and
//! only needs a diagnostic log; a [`MatchFailure`] ends an attempt and is
//! shown to the user.

use matchline_launch::LaunchError;

use crate::{Epoch, MatchPhase};

/// Text shown when the server cancels loading without a reason.
pub const LOAD_FAILED_NOTICE: &str = "The game has failed to load.";

/// An input the machine ignored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Anomaly {
    /// The input is not valid in the current phase. Protocol events may
    /// race local timing, so this is expected now and then.
    #[error("unexpected {input} in phase {phase}")]
    ProtocolOrdering { phase: MatchPhase, input: &'static str },

    /// The input's payload breaks an invariant (e.g. acceptance going
    /// backwards, or a start for a different game).
    #[error("invalid {input}: {reason}")]
    InvalidPayload { input: &'static str, reason: String },

    /// A completion for a session that was destroyed or replaced.
    #[error("stale completion from {epoch} (current {current})")]
    StaleCompletion { epoch: Epoch, current: Epoch },
}

/// Why a matchmaking attempt ended without a game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchFailure {
    /// Someone (possibly this client) did not accept in time.
    #[error("Failed to accept the match in time.")]
    AcceptTimeout,

    /// The game process could not be launched. Not retried.
    #[error("The game failed to launch: {0}")]
    LaunchFailed(LaunchError),

    /// The server canceled loading.
    #[error("{}", canceled_text(.0))]
    Canceled(Option<String>),
}

fn canceled_text(reason: &Option<String>) -> &str {
    reason.as_deref().unwrap_or(LOAD_FAILED_NOTICE)
}

/// The chosen map could not be made available locally. Logged only; the
/// countdown carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("map {hash} unavailable: {reason}")]
pub struct MapUnavailable {
    pub hash: String,
    pub reason: String,
}
