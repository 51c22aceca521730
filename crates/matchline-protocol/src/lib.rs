//! Wire protocol for Matchline.
//!
//! This crate defines what the matchmaking server and this client say to
//! each other:
//!
//! - **Types** ([`UserId`], [`ClientId`], [`GameId`], [`MatchmakingType`],
//!   [`Route`]): identity and addressing. [`TimerName`] is shared
//!   vocabulary for the session timers.
//! - **Events** ([`MatchmakingEvent`] and its payloads): what the server
//!   publishes; [`ServerRequest`] is what the client sends back.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in and out.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about matchmaking state; it only describes messages.

mod codec;
mod error;
mod event;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use event::{
    CancelLoading, InboundMessage, MapData, MapInfo, MatchFound, MatchReady, MatchSetup,
    MatchmakingEvent, MatchmakingStatus, PlayerAccepted, QueueStatus, QueuedMatchmaking, Race,
    ServerRequest, SetRoutes, Slot, StartWhenReady,
};
pub use types::{ClientId, GameId, MatchmakingType, Route, TimerName, UserId};
