//! Side effects the state machine asks its owner to carry out.
//!
//! The machine itself never touches timers, the network, or the game
//! process. It returns [`Effect`]s in the order they must run.

use std::time::Duration;

use matchline_launch::LaunchRequest;
use matchline_protocol::{GameId, MatchmakingStatus, MatchmakingType, ServerRequest, TimerName};
use serde_json::Value;

use crate::{Epoch, MatchPhase};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A session was created; its timers are scoped to `epoch`.
    OpenSession { epoch: Epoch },
    /// The session was destroyed. All of its timers must stop.
    CloseSession { epoch: Epoch },
    /// Start a countdown of `ticks` intervals under `timer`.
    StartTimer { timer: TimerName, ticks: u32 },
    /// Start the one-shot requeue fallback.
    StartRequeueFallback { delay: Duration },
    /// Stop `timer`.
    CancelTimer(TimerName),
    /// Send a request to the matchmaking server.
    Send { epoch: Epoch, request: ServerRequest },
    /// Make sure the chosen map is available; failure is only logged.
    VerifyMap {
        epoch: Epoch,
        hash: String,
        format: String,
        url: String,
    },
    /// Issue the launch request.
    Launch { epoch: Epoch, request: LaunchRequest },
    /// Forward game routes to the launch process.
    SetRoutes { game_id: GameId, routes: Vec<Value> },
    /// Tear down an issued launch. Best effort, not awaited.
    TeardownLaunch,
    /// Output for the rendering layer.
    Ui(UiEvent),
}

/// Screens the client navigates between while matchmaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Countdown,
    GameStarting,
    ActiveGame,
}

/// Audio cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    MatchFound,
    /// Countdown sound plus background atmosphere.
    CountdownStarted,
    /// Countdown sound ends; atmosphere keeps playing.
    CountdownStopped,
    /// Atmosphere fades out as the game goes live.
    AtmosphereFaded,
}

/// Record of the game this client is now playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveGame {
    pub game_id: GameId,
    pub matchmaking_type: MatchmakingType,
}

/// UI-facing view of the matchmaking state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSnapshot {
    pub phase: MatchPhase,
    pub matchmaking_type: Option<MatchmakingType>,
    pub accept_ticks_remaining: u32,
    pub accepted_players: u32,
    pub num_players: u32,
    pub accept_confirmed: bool,
    pub countdown_ticks_remaining: u32,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// State changed; render this.
    Snapshot(MatchSnapshot),
    OpenAcceptPrompt,
    CloseDialog,
    Navigate(View),
    /// A short message for the user.
    Notice(String),
    /// Ask the OS to flag the window.
    AttentionRequired,
    Cue(Cue),
    GameActive(ActiveGame),
    /// A queue was enabled or disabled.
    QueueAvailability(MatchmakingStatus),
}
