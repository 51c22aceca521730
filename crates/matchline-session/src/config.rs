//! Match configuration and the phase state machine.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Seconds every matched player has to accept. Fixed by the protocol.
pub const ACCEPT_MATCH_TIME_SECS: u32 = 15;

/// Timing settings for a matchmaking session.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Length of the accept window, in countdown ticks.
    pub accept_window_secs: u32,

    /// How long the failed-to-accept notice stays up before the client
    /// returns to the idle screen on its own.
    pub requeue_delay: Duration,

    /// Length of the pre-game countdown, in countdown ticks.
    pub countdown_secs: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            accept_window_secs: ACCEPT_MATCH_TIME_SECS,
            requeue_delay: Duration::from_secs(5),
            countdown_secs: 5,
        }
    }
}

impl MatchConfig {
    /// Longest accept window accepted.
    pub const MAX_ACCEPT_WINDOW_SECS: u32 = 120;
    /// Longest countdown accepted.
    pub const MAX_COUNTDOWN_SECS: u32 = 60;
    /// Shortest requeue fallback accepted.
    pub const MIN_REQUEUE_DELAY: Duration = Duration::from_secs(1);
    /// Longest requeue fallback accepted.
    pub const MAX_REQUEUE_DELAY: Duration = Duration::from_secs(60);

    /// Clamp out-of-range values. Tick counts of zero are raised to one
    /// tick; the requeue delay is held between [`Self::MIN_REQUEUE_DELAY`]
    /// and [`Self::MAX_REQUEUE_DELAY`].
    pub fn validated(mut self) -> Self {
        self.accept_window_secs = self.accept_window_secs.clamp(1, Self::MAX_ACCEPT_WINDOW_SECS);
        self.countdown_secs = self.countdown_secs.clamp(1, Self::MAX_COUNTDOWN_SECS);
        self.requeue_delay = self
            .requeue_delay
            .clamp(Self::MIN_REQUEUE_DELAY, Self::MAX_REQUEUE_DELAY);
        self
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// Sub-state of [`MatchPhase::Ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyStage {
    /// Pre-game countdown is running; the launch is not authorized yet.
    Countdown,
    /// The server said start; the launch request has been issued.
    Launching,
}

/// Where a matchmaking attempt currently stands.
///
/// Happy path:
///
/// ```text
/// Idle → Finding → MatchFound → Accepting → AwaitingOthers
///      → Ready(Countdown) → Ready(Launching) → Active
/// ```
///
/// `FailedToAccept` is reachable from the three accept phases; `Canceled`
/// from those and from both `Ready` stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPhase {
    Idle,
    Finding,
    MatchFound,
    Accepting,
    AwaitingOthers,
    Ready(ReadyStage),
    Active,
    FailedToAccept,
    Canceled,
}

impl MatchPhase {
    /// Returns `true` while the acceptance prompt is showing.
    pub fn is_accepting(&self) -> bool {
        matches!(self, Self::MatchFound | Self::Accepting | Self::AwaitingOthers)
    }

    /// Returns `true` in either `Ready` stage.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns `true` for phases a new search may start from.
    pub fn can_search(&self) -> bool {
        matches!(self, Self::Idle | Self::Canceled | Self::FailedToAccept | Self::Active)
    }

    /// Returns `true` if a `cancelLoading` may move this phase to `Canceled`.
    pub fn is_cancelable(&self) -> bool {
        self.is_accepting() || self.is_ready() || matches!(self, Self::FailedToAccept)
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Finding => write!(f, "Finding"),
            Self::MatchFound => write!(f, "MatchFound"),
            Self::Accepting => write!(f, "Accepting"),
            Self::AwaitingOthers => write!(f, "AwaitingOthers"),
            Self::Ready(ReadyStage::Countdown) => write!(f, "Ready(Countdown)"),
            Self::Ready(ReadyStage::Launching) => write!(f, "Ready(Launching)"),
            Self::Active => write!(f, "Active"),
            Self::FailedToAccept => write!(f, "FailedToAccept"),
            Self::Canceled => write!(f, "Canceled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_config_default() {
        let config = MatchConfig::default();
        assert_eq!(config.accept_window_secs, 15);
        assert_eq!(config.countdown_secs, 5);
        assert_eq!(config.requeue_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_match_config_validated_clamps() {
        let config = MatchConfig {
            accept_window_secs: 0,
            requeue_delay: Duration::from_secs(600),
            countdown_secs: 1000,
        }
        .validated();
        assert_eq!(config.accept_window_secs, 1);
        assert_eq!(config.countdown_secs, MatchConfig::MAX_COUNTDOWN_SECS);
        assert_eq!(config.requeue_delay, MatchConfig::MAX_REQUEUE_DELAY);
    }

    #[test]
    fn test_zero_requeue_delay_is_raised() {
        let config = MatchConfig {
            requeue_delay: Duration::ZERO,
            ..MatchConfig::default()
        }
        .validated();
        assert_eq!(config.requeue_delay, MatchConfig::MIN_REQUEUE_DELAY);
    }

    #[test]
    fn test_phase_predicates() {
        assert!(MatchPhase::MatchFound.is_accepting());
        assert!(MatchPhase::AwaitingOthers.is_accepting());
        assert!(!MatchPhase::Ready(ReadyStage::Countdown).is_accepting());

        assert!(MatchPhase::Ready(ReadyStage::Launching).is_cancelable());
        assert!(!MatchPhase::Active.is_cancelable());
        assert!(!MatchPhase::Finding.is_cancelable());

        assert!(MatchPhase::FailedToAccept.can_search());
        assert!(!MatchPhase::Finding.can_search());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(MatchPhase::Ready(ReadyStage::Countdown).to_string(), "Ready(Countdown)");
        assert_eq!(MatchPhase::FailedToAccept.to_string(), "FailedToAccept");
    }
}
