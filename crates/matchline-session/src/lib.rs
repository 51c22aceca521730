//! Matchmaking state machine for Matchline.
//!
//! - [`MatchStateMachine`] applies [`Input`]s and returns [`Effect`]s.
//! - [`MatchSession`] is the state of one matchmaking attempt.
//! - [`MatchPhase`] and [`MatchConfig`] describe where an attempt stands
//!   and how long its windows last.
//!
//! Nothing in this crate spawns tasks or performs I/O. The caller runs the
//! effects and feeds timer signals and async completions back in as inputs.

mod config;
mod effect;
mod error;
mod input;
mod machine;
mod session;

pub use config::{ACCEPT_MATCH_TIME_SECS, MatchConfig, MatchPhase, ReadyStage};
pub use effect::{ActiveGame, Cue, Effect, MatchSnapshot, UiEvent, View};
pub use error::{Anomaly, LOAD_FAILED_NOTICE, MapUnavailable, MatchFailure};
pub use input::{Completion, Input, LocalAction, TimerSignal};
pub use machine::MatchStateMachine;
pub use session::{Epoch, LaunchStatus, MatchSession};
