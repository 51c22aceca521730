//! The per-attempt aggregate: [`MatchSession`].

use std::fmt;

use matchline_launch::Assignment;
use matchline_protocol::{GameId, MatchmakingType, TimerName};

/// Generation token of a search or session.
///
/// Every async call made on behalf of a session carries the epoch that was
/// current when it started. A completion whose epoch is no longer current
/// belongs to a destroyed session and is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(pub u64);

impl Epoch {
    pub(crate) fn next(self) -> Self {
        Epoch(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

/// The one-shot launch guard of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStatus {
    NotIssued,
    Issued { game_id: GameId },
}

impl LaunchStatus {
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued { .. })
    }
}

/// Timers the machine believes are running for a session, in a fixed order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TimerSet {
    accept: bool,
    requeue: bool,
    countdown: bool,
}

impl TimerSet {
    fn slot(&mut self, name: TimerName) -> &mut bool {
        match name {
            TimerName::Accept => &mut self.accept,
            TimerName::Requeue => &mut self.requeue,
            TimerName::Countdown => &mut self.countdown,
        }
    }

    pub(crate) fn insert(&mut self, name: TimerName) {
        *self.slot(name) = true;
    }

    /// Returns whether `name` was running.
    pub(crate) fn remove(&mut self, name: TimerName) -> bool {
        std::mem::take(self.slot(name))
    }

    pub(crate) fn contains(&self, name: TimerName) -> bool {
        match name {
            TimerName::Accept => self.accept,
            TimerName::Requeue => self.requeue,
            TimerName::Countdown => self.countdown,
        }
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = TimerName> + '_ {
        [TimerName::Accept, TimerName::Requeue, TimerName::Countdown]
            .into_iter()
            .filter(|name| self.contains(*name))
    }
}

/// One matchmaking attempt, from `matchFound` until it is destroyed.
///
/// Fields only change through the state machine's transitions; callers get
/// read access through the getters.
#[derive(Debug, Clone)]
pub struct MatchSession {
    pub(crate) epoch: Epoch,
    pub(crate) matchmaking_type: MatchmakingType,
    pub(crate) phase: crate::MatchPhase,
    pub(crate) num_players: u32,
    pub(crate) accepted_players: u32,
    pub(crate) accept_confirmed: bool,
    pub(crate) accept_ticks_remaining: u32,
    pub(crate) countdown_ticks_remaining: u32,
    pub(crate) assignment: Option<Assignment>,
    pub(crate) failure_reason: Option<String>,
    pub(crate) launch: LaunchStatus,
    pub(crate) timers: TimerSet,
}

impl MatchSession {
    pub(crate) fn new(
        epoch: Epoch,
        matchmaking_type: MatchmakingType,
        num_players: u32,
        accept_window_secs: u32,
    ) -> Self {
        Self {
            epoch,
            matchmaking_type,
            phase: crate::MatchPhase::MatchFound,
            num_players,
            accepted_players: 0,
            accept_confirmed: false,
            accept_ticks_remaining: accept_window_secs,
            countdown_ticks_remaining: 0,
            assignment: None,
            failure_reason: None,
            launch: LaunchStatus::NotIssued,
            timers: TimerSet::default(),
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn matchmaking_type(&self) -> MatchmakingType {
        self.matchmaking_type
    }

    pub fn phase(&self) -> crate::MatchPhase {
        self.phase
    }

    pub fn num_players(&self) -> u32 {
        self.num_players
    }

    pub fn accepted_players(&self) -> u32 {
        self.accepted_players
    }

    /// Whether the server confirmed this client's accept.
    pub fn accept_confirmed(&self) -> bool {
        self.accept_confirmed
    }

    pub fn accept_ticks_remaining(&self) -> u32 {
        self.accept_ticks_remaining
    }

    pub fn countdown_ticks_remaining(&self) -> u32 {
        self.countdown_ticks_remaining
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn launch(&self) -> &LaunchStatus {
        &self.launch
    }

    /// Whether the machine has `name` running for this session.
    pub fn timer_active(&self, name: TimerName) -> bool {
        self.timers.contains(name)
    }
}
