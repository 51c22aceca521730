//! Everything that can drive the state machine.

use matchline_launch::LaunchError;
use matchline_protocol::{GameId, MatchmakingEvent, MatchmakingStatus, MatchmakingType, ServerRequest};

use crate::Epoch;

/// One input to [`MatchStateMachine::apply`](crate::MatchStateMachine::apply).
#[derive(Debug, Clone)]
pub enum Input {
    /// An event the server published on this client's matchmaking route.
    Event(MatchmakingEvent),
    /// A queue availability broadcast.
    Status(Vec<MatchmakingStatus>),
    /// Something the user did.
    Local(LocalAction),
    /// A signal from a live session timer.
    Timer(TimerSignal),
    /// The result of an async call started earlier.
    Completion(Completion),
}

impl Input {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Input::Event(ev) => ev.tag(),
            Input::Status(_) => "statusUpdate",
            Input::Local(action) => action.name(),
            Input::Timer(signal) => signal.name(),
            Input::Completion(completion) => completion.name(),
        }
    }
}

impl From<MatchmakingEvent> for Input {
    fn from(ev: MatchmakingEvent) -> Self {
        Input::Event(ev)
    }
}

impl From<LocalAction> for Input {
    fn from(action: LocalAction) -> Self {
        Input::Local(action)
    }
}

impl From<TimerSignal> for Input {
    fn from(signal: TimerSignal) -> Self {
        Input::Timer(signal)
    }
}

impl From<Completion> for Input {
    fn from(completion: Completion) -> Self {
        Input::Completion(completion)
    }
}

/// User actions that enter the machine directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAction {
    /// Enter a queue (also the retry after a failed accept).
    FindMatch { matchmaking_type: MatchmakingType },
    /// Leave the queue, or dismiss a failed accept.
    CancelSearch,
    /// Accept the proposed match.
    AcceptMatch,
    /// The connection to the server is gone.
    Disconnect,
}

impl LocalAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FindMatch { .. } => "findMatchRequested",
            Self::CancelSearch => "cancelSearch",
            Self::AcceptMatch => "localAcceptClick",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Signals posted by session timers, already checked against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    AcceptTick { remaining: u32 },
    AcceptExpired,
    CountdownTick { remaining: u32 },
    CountdownFinished,
    RequeueElapsed,
}

impl TimerSignal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AcceptTick { .. } => "acceptTick",
            Self::AcceptExpired => "acceptExpired",
            Self::CountdownTick { .. } => "countdownTick",
            Self::CountdownFinished => "countdownFinished",
            Self::RequeueElapsed => "requeueElapsed",
        }
    }
}

/// Results of async calls, stamped with the epoch they were started in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A request to the matchmaking server finished.
    Request {
        epoch: Epoch,
        request: ServerRequest,
        result: Result<(), String>,
    },
    /// The map availability check finished.
    MapVerified {
        epoch: Epoch,
        hash: String,
        result: Result<(), String>,
    },
    /// The launch request finished.
    Launch {
        epoch: Epoch,
        result: Result<GameId, LaunchError>,
    },
}

impl Completion {
    pub fn epoch(&self) -> Epoch {
        match self {
            Self::Request { epoch, .. } | Self::MapVerified { epoch, .. } | Self::Launch { epoch, .. } => *epoch,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Request { .. } => "requestCompleted",
            Self::MapVerified { .. } => "mapVerified",
            Self::Launch { .. } => "launchCompleted",
        }
    }
}
