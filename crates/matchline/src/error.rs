//! Unified error type for Matchline.

use matchline_launch::LaunchError;
use matchline_protocol::ProtocolError;

/// Errors from the server link.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// There is no connection to the matchmaking server.
    #[error("not connected: {0}")]
    Disconnected(String),

    /// The server answered the request with an error.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MatchlineError {
    /// A protocol-level error (encode, decode, invalid message, route).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A launch-process error.
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// A server link error.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The coordinator task has stopped.
    #[error("matchmaking coordinator is unavailable")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownRoute("/lobbies/1".into());
        let matchline_err: MatchlineError = err.into();
        assert!(matches!(matchline_err, MatchlineError::Protocol(_)));
        assert!(matchline_err.to_string().contains("/lobbies/1"));
    }

    #[test]
    fn test_from_launch_error() {
        let err = LaunchError::NoSlots;
        let matchline_err: MatchlineError = err.into();
        assert!(matches!(matchline_err, MatchlineError::Launch(_)));
    }

    #[test]
    fn test_from_link_error() {
        let err = LinkError::Disconnected("socket closed".into());
        let matchline_err: MatchlineError = err.into();
        assert!(matches!(matchline_err, MatchlineError::Link(_)));
        assert!(matchline_err.to_string().contains("socket closed"));
    }
}
