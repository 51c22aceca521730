//! # Matchline
//!
//! Client-side coordinator for a matchmaking protocol.
//!
//! Once a player enters a queue, the server proposes matches, counts down
//! an accept window, reports acceptance, assigns the game, counts down to
//! the start, and finally tells the client to launch or to give up.
//! Matchline follows that sequence with one actor task per client:
//!
//! - [`MatchCoordinator`] owns the state machine and the session timers and
//!   turns inbound messages into state changes.
//! - [`ServerLink`] and [`GameLauncher`](matchline_launch::GameLauncher)
//!   are the two outside collaborators the coordinator calls.
//! - [`UiEvent`](matchline_session::UiEvent)s come out the other end for
//!   whatever renders the client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use matchline::prelude::*;
//!
//! # async fn run(link: impl ServerLink, launcher: impl GameLauncher) -> Result<(), MatchlineError> {
//! let identity = LocalIdentity::new(UserId(7), "alice");
//! let (handle, mut ui) = MatchCoordinator::spawn(MatchmakingConfig::default(), identity, link, launcher);
//!
//! handle.find_match(MatchmakingType::Match1v1).await?;
//! while let Some(event) = ui.recv().await {
//!     if let UiEvent::OpenAcceptPrompt = event {
//!         handle.accept_match().await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod coordinator;
mod error;
mod link;

pub use config::{LocalIdentity, MatchmakingConfig};
pub use coordinator::{CoordinatorHandle, MatchCoordinator, UiEvents};
pub use error::{LinkError, MatchlineError};
pub use link::ServerLink;

pub use matchline_launch as launch;
pub use matchline_protocol as protocol;
pub use matchline_session as session;
pub use matchline_timer as timer;

pub mod prelude {
    //! Everything needed to run a coordinator.

    pub use crate::{
        CoordinatorHandle, LinkError, LocalIdentity, MatchCoordinator, MatchlineError,
        MatchmakingConfig, ServerLink, UiEvents,
    };
    pub use matchline_launch::{GameLaunchConfig, GameLauncher, LaunchError};
    pub use matchline_protocol::{
        ClientId, GameId, InboundMessage, MatchmakingEvent, MatchmakingType, Route, ServerRequest,
        UserId,
    };
    pub use matchline_session::{Cue, MatchPhase, MatchSnapshot, ReadyStage, UiEvent, View};
}
