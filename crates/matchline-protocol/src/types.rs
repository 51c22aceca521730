//! Identity and routing types shared by every Matchline layer.
//!
//! These are the small value types that show up everywhere: who the local
//! user is, which queue a search targets, and which transport route an
//! inbound message was addressed to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Numeric account identifier assigned by the server.
///
/// Serialized as the bare number (`#[serde(transparent)]`), so `UserId(7)`
/// is just `7` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Identifies one running client of a user.
///
/// A user may have several clients connected at once; matchmaking events
/// for a search are addressed to the client that started it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned identifier of a game instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// MatchmakingType
// ---------------------------------------------------------------------------

/// The queue a search is made in. Fixed for the lifetime of a match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MatchmakingType {
    /// Ranked one-versus-one.
    #[serde(rename = "1v1")]
    Match1v1,
    /// One-versus-one on the fastest map set.
    #[serde(rename = "1v1fastest")]
    Match1v1Fastest,
    /// Two-versus-two teams.
    #[serde(rename = "2v2")]
    Match2v2,
}

impl MatchmakingType {
    /// All queue types, in display order.
    pub const ALL: [MatchmakingType; 3] = [
        MatchmakingType::Match1v1,
        MatchmakingType::Match1v1Fastest,
        MatchmakingType::Match2v2,
    ];

    /// The wire name of this type (`"1v1"`, `"2v2"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match1v1 => "1v1",
            Self::Match1v1Fastest => "1v1fastest",
            Self::Match2v2 => "2v2",
        }
    }
}

impl fmt::Display for MatchmakingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TimerName
// ---------------------------------------------------------------------------

/// The concerns a matchmaking session runs timers for. Never on the wire;
/// it lives here so the state machine and the timer registry share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerName {
    /// Accept window countdown.
    Accept,
    /// Fallback that returns to the idle screen after a failed accept.
    Requeue,
    /// Pre-game countdown.
    Countdown,
}

impl TimerName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Requeue => "requeue",
            Self::Countdown => "countdown",
        }
    }
}

impl fmt::Display for TimerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// A transport address that inbound matchmaking messages are published to.
///
/// The server publishes to three kinds of paths:
///
/// ```text
/// /matchmaking/:userName             user-scoped events
/// /matchmaking/:userId/:clientId     events for the client that queued
/// /matchmakingStatus                 queue availability broadcasts
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Events scoped to the user, regardless of client.
    User { user_name: String },
    /// Events scoped to one client of a user.
    Client { user_id: UserId, client_id: ClientId },
    /// Broadcast of which queues are enabled.
    Status,
}

impl Route {
    /// Renders the route back into its path form.
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::User { user_name } => write!(f, "/matchmaking/{user_name}"),
            Route::Client { user_id, client_id } => {
                write!(f, "/matchmaking/{}/{client_id}", user_id.0)
            }
            Route::Status => f.write_str("/matchmakingStatus"),
        }
    }
}

impl FromStr for Route {
    type Err = ProtocolError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if path == "/matchmakingStatus" {
            return Ok(Route::Status);
        }

        let rest = path
            .strip_prefix("/matchmaking/")
            .ok_or_else(|| ProtocolError::UnknownRoute(path.to_string()))?;
        let segments: Vec<&str> = rest.split('/').collect();

        match segments.as_slice() {
            [user_name] if !user_name.is_empty() => Ok(Route::User {
                user_name: (*user_name).to_string(),
            }),
            [user_id, client_id] if !client_id.is_empty() => {
                let user_id = user_id
                    .parse::<u64>()
                    .map_err(|_| ProtocolError::UnknownRoute(path.to_string()))?;
                Ok(Route::Client {
                    user_id: UserId(user_id),
                    client_id: ClientId((*client_id).to_string()),
                })
            }
            _ => Err(ProtocolError::UnknownRoute(path.to_string())),
        }
    }
}
