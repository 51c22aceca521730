//! Game launch requests for Matchline.
//!
//! Once a match is ready the server's [`Assignment`] is turned into a
//! [`LaunchRequest`] by the [`LaunchRequestBuilder`] and handed across the
//! [`GameLauncher`] boundary to the process that runs the game.
//!
//! ```text
//! matchReady ──→ Assignment ──(startWhenReady)──→ LaunchRequest ──→ GameLauncher
//! ```

mod error;
mod launcher;
mod request;

pub use error::LaunchError;
pub use launcher::{launch, teardown, GameLauncher};
pub use request::{
    Assignment, GameLaunchConfig, GameSetup, GameType, LaunchRequest, LaunchRequestBuilder,
    LocalUser, PlayerInfo, MATCHMAKING_GAME_NAME,
};
